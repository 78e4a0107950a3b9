#![allow(missing_docs)]
use core::fmt;

use bilge::prelude::*;

/// Register addresses
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Reserved FRU register address.
    Fru,

    /// Configuration register address.
    Configuration,

    /// Alert upper boundary register address.
    UpperLimit,

    /// Alert lower boundary register address.
    LowerLimit,

    /// Critical temperature register address.
    CriticalLimit,

    /// Ambient temperature register address.
    Temperature,

    /// Manufacturer ID register address.
    ManufacturerId,

    /// Device ID and revision register address.
    DeviceId,

    /// Resolution register address.
    Resolution,
}

impl From<Register> for u8 {
    fn from(reg: Register) -> Self {
        match reg {
            Register::Fru => 0x00,
            Register::Configuration => 0x01,
            Register::UpperLimit => 0x02,
            Register::LowerLimit => 0x03,
            Register::CriticalLimit => 0x04,
            Register::Temperature => 0x05,
            Register::ManufacturerId => 0x06,
            Register::DeviceId => 0x07,
            Register::Resolution => 0x08,
        }
    }
}

/// Configuration register.
#[bitsize(16)]
#[derive(Clone, Copy, DebugBits, FromBits, PartialEq)]
pub struct Configuration {
    /// Alert output mode
    pub alert_mode: AlertMode,

    /// Alert output polarity
    pub polarity: Polarity,

    /// Alert output select
    pub response: AlertResponse,

    /// Alert output control
    pub alert_enabled: bool,

    /// Alert output status, read-only
    pub alert_status: bool,

    /// Interrupt clear, always reads as zero
    pub interrupt_clear: bool,

    /// Window and critical lock bits
    pub lock: LockState,

    /// Shutdown mode
    pub power_mode: PowerMode,

    /// Upper, lower and critical limit hysteresis
    pub hysteresis: Hysteresis,

    reserved11_15: u5,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::from(0x0000)
    }
}

impl Configuration {
    /// Decode the register from its wire representation.
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        Self::from(u16::from_be_bytes(bytes))
    }

    /// Encode the register into its wire representation.
    pub fn to_bytes(self) -> [u8; 2] {
        u16::from(self).to_be_bytes()
    }

    /// Configure alert output mode.
    #[must_use]
    pub fn with_alert_mode(mut self, mode: AlertMode) -> Self {
        self.set_alert_mode(mode);
        self
    }

    /// Configure alert polarity.
    #[must_use]
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.set_polarity(polarity);
        self
    }

    /// Configure which limits drive the alert output.
    #[must_use]
    pub fn with_response(mut self, response: AlertResponse) -> Self {
        self.set_response(response);
        self
    }

    /// Enable or disable the alert output.
    #[must_use]
    pub fn with_alert_enabled(mut self, enabled: bool) -> Self {
        self.set_alert_enabled(enabled);
        self
    }

    /// Request an interrupt clear.
    #[must_use]
    pub fn with_interrupt_clear(mut self, clear: bool) -> Self {
        self.set_interrupt_clear(clear);
        self
    }

    /// Configure lock bits.
    #[must_use]
    pub fn with_lock(mut self, lock: LockState) -> Self {
        self.set_lock(lock);
        self
    }

    /// Configure power mode.
    #[must_use]
    pub fn with_power_mode(mut self, mode: PowerMode) -> Self {
        self.set_power_mode(mode);
        self
    }

    /// Configure hysteresis.
    #[must_use]
    pub fn with_hysteresis(mut self, hyst: Hysteresis) -> Self {
        self.set_hysteresis(hyst);
        self
    }
}

/// Alert output mode.
#[bitsize(1)]
#[derive(Debug, Clone, Copy, FromBits, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertMode {
    /// The alert output follows the threshold comparison continuously.
    Comparator,

    /// The alert output latches on a threshold crossing until cleared.
    Interrupt,
}

/// Alert output polarity.
#[bitsize(1)]
#[derive(Debug, Clone, Copy, FromBits, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Active low (default).
    ActiveLow,

    /// Active high.
    ActiveHigh,
}

/// Alert output select.
#[bitsize(1)]
#[derive(Debug, Clone, Copy, FromBits, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertResponse {
    /// Alert on upper, lower and critical limits (default).
    UpperLowerCrit,

    /// Alert only when TA >= TCRIT; upper and lower limits are ignored.
    CritOnly,
}

/// Register lock bits. Once set they can only be cleared by a power cycle.
#[bitsize(2)]
#[derive(Debug, Clone, Copy, FromBits, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockState {
    /// Nothing locked (default).
    Unlocked,

    /// Upper and lower limits locked.
    Window,

    /// Critical limit locked.
    Crit,

    /// Both the window and the critical limit locked.
    CritAndWindow,
}

impl LockState {
    /// Whether any lock bit is set.
    pub fn is_locked(self) -> bool {
        self != Self::Unlocked
    }
}

/// Power mode.
#[bitsize(1)]
#[derive(Debug, Clone, Copy, FromBits, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    /// Continuous conversion (default).
    Continuous,

    /// Shutdown, conversions stop while registers stay accessible.
    Shutdown,
}

/// Limit hysteresis.
#[bitsize(2)]
#[derive(Debug, Clone, Copy, FromBits, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hysteresis {
    /// 0℃ Hysteresis (default)
    ZeroCelsius,

    /// 1.5℃ Hysteresis
    OneAndHalfCelsius,

    /// 3℃ Hysteresis
    ThreeCelsius,

    /// 6℃ Hysteresis
    SixCelsius,
}

/// Alert output mode as seen by callers. The device stores it as the
/// [`AlertMode`] bit plus the alert enable bit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertOutputMode {
    /// Alerts enabled in comparator mode.
    Comparator,

    /// Alerts enabled in interrupt mode.
    Interrupt,

    /// Alerts disabled.
    Disabled,
}

/// Ambient temperature register.
#[bitsize(16)]
#[derive(Clone, Copy, DebugBits, FromBits, PartialEq)]
pub struct AmbientTemperature {
    /// Magnitude in sixteenths of a degree.
    pub magnitude: u12,

    /// Sign bit
    pub sign: bool,

    /// Limit comparison flags
    pub status: AlertStatus,
}

impl AmbientTemperature {
    /// Decode the register from its wire representation.
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        Self::from(u16::from_be_bytes(bytes))
    }
}

/// Comparison of the ambient temperature against the three limits.
#[bitsize(3)]
#[derive(Clone, Copy, DebugBits, FromBits, PartialEq)]
pub struct AlertStatus {
    /// TA < TLOWER
    pub below_lower: bool,

    /// TA > TUPPER
    pub above_upper: bool,

    /// TA >= TCRIT
    pub at_or_above_crit: bool,
}

impl AlertStatus {
    /// Flags packed as `0b<crit><upper><lower>`, matching bits 15..13 of the register.
    pub fn bits(&self) -> u8 {
        (u8::from(self.at_or_above_crit()) << 2) | (u8::from(self.above_upper()) << 1) | u8::from(self.below_lower())
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.at_or_above_crit() {
            "TA >= TCRIT"
        } else {
            "TA < TCRIT"
        })?;
        f.write_str(if self.above_upper() {
            ", TA > TUPPER"
        } else {
            ", TA <= TUPPER"
        })?;
        f.write_str(if self.below_lower() {
            ", TA < TLOWER"
        } else {
            ", TA >= TLOWER"
        })
    }
}

/// Resolution register.
#[bitsize(8)]
#[derive(Clone, Copy, DebugBits, FromBits, PartialEq)]
pub struct ResolutionRegister {
    /// Temperature resolution
    pub resolution: Resolution,

    reserved2_7: u6,
}

/// Temperature resolution.
#[bitsize(2)]
#[derive(Debug, Clone, Copy, FromBits, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// 0.5℃ steps, about 30ms per conversion.
    HalfCelsius,

    /// 0.25℃ steps, about 65ms per conversion.
    QuarterCelsius,

    /// 0.125℃ steps, about 130ms per conversion.
    EighthCelsius,

    /// 0.0625℃ steps, about 250ms per conversion (power-up default).
    SixteenthCelsius,
}

impl Resolution {
    /// Size of one temperature step in degrees Celsius.
    pub fn celsius_per_bit(self) -> f32 {
        match self {
            Self::HalfCelsius => 0.5,
            Self::QuarterCelsius => 0.25,
            Self::EighthCelsius => 0.125,
            Self::SixteenthCelsius => 0.0625,
        }
    }
}

/// Device ID and revision register.
#[bitsize(16)]
#[derive(Clone, Copy, DebugBits, FromBits, PartialEq)]
pub struct DeviceId {
    /// Silicon revision
    pub revision: u8,

    /// Device ID
    pub id: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_addresses() {
        assert_eq!(u8::from(Register::Fru), 0x00);
        assert_eq!(u8::from(Register::Configuration), 0x01);
        assert_eq!(u8::from(Register::UpperLimit), 0x02);
        assert_eq!(u8::from(Register::LowerLimit), 0x03);
        assert_eq!(u8::from(Register::CriticalLimit), 0x04);
        assert_eq!(u8::from(Register::Temperature), 0x05);
        assert_eq!(u8::from(Register::ManufacturerId), 0x06);
        assert_eq!(u8::from(Register::DeviceId), 0x07);
        assert_eq!(u8::from(Register::Resolution), 0x08);
    }

    #[test]
    fn default_configuration() {
        let cfg = Configuration::default();
        assert_eq!(cfg.value, 0x0000);
        assert_eq!(cfg.lock(), LockState::Unlocked);
        assert_eq!(cfg.power_mode(), PowerMode::Continuous);
    }

    #[test]
    fn modify_alert_mode() {
        let cfg = Configuration::default().with_alert_mode(AlertMode::Interrupt);
        assert_eq!(cfg.to_bytes(), [0x00, 0x01]);
    }

    #[test]
    fn modify_polarity() {
        let cfg = Configuration::default().with_polarity(Polarity::ActiveHigh);
        assert_eq!(cfg.to_bytes(), [0x00, 0x02]);
    }

    #[test]
    fn modify_response() {
        let cfg = Configuration::default().with_response(AlertResponse::CritOnly);
        assert_eq!(cfg.to_bytes(), [0x00, 0x04]);
    }

    #[test]
    fn modify_alert_enabled() {
        let cfg = Configuration::default().with_alert_enabled(true);
        assert_eq!(cfg.to_bytes(), [0x00, 0x08]);
    }

    #[test]
    fn modify_interrupt_clear() {
        let cfg = Configuration::default().with_interrupt_clear(true);
        assert_eq!(cfg.to_bytes(), [0x00, 0x20]);
    }

    #[test]
    fn modify_lock() {
        let cfg = Configuration::default().with_lock(LockState::Window);
        assert_eq!(cfg.to_bytes(), [0x00, 0x40]);
        let cfg = Configuration::default().with_lock(LockState::Crit);
        assert_eq!(cfg.to_bytes(), [0x00, 0x80]);
        let cfg = Configuration::default().with_lock(LockState::CritAndWindow);
        assert_eq!(cfg.to_bytes(), [0x00, 0xc0]);
    }

    #[test]
    fn modify_power_mode() {
        let cfg = Configuration::default().with_power_mode(PowerMode::Shutdown);
        assert_eq!(cfg.to_bytes(), [0x01, 0x00]);
    }

    #[test]
    fn modify_hysteresis() {
        let cfg = Configuration::default().with_hysteresis(Hysteresis::OneAndHalfCelsius);
        assert_eq!(cfg.to_bytes(), [0x02, 0x00]);
        let cfg = Configuration::default().with_hysteresis(Hysteresis::SixCelsius);
        assert_eq!(cfg.to_bytes(), [0x06, 0x00]);
    }

    #[test]
    fn field_update_preserves_reserved_bits() {
        let cfg = Configuration::from_bytes([0xf8, 0x00]).with_hysteresis(Hysteresis::ThreeCelsius);
        assert_eq!(cfg.to_bytes(), [0xfc, 0x00]);
    }

    #[test]
    fn decode_configuration_fields() {
        let cfg = Configuration::from_bytes([0x05, 0xcb]);
        assert_eq!(cfg.power_mode(), PowerMode::Shutdown);
        assert_eq!(cfg.hysteresis(), Hysteresis::ThreeCelsius);
        assert_eq!(cfg.lock(), LockState::CritAndWindow);
        assert!(cfg.alert_enabled());
        assert_eq!(cfg.alert_mode(), AlertMode::Interrupt);
        assert_eq!(cfg.polarity(), Polarity::ActiveHigh);
        assert_eq!(cfg.response(), AlertResponse::UpperLowerCrit);
        assert!(!cfg.interrupt_clear());
    }

    #[test]
    fn ambient_temperature_status_bits() {
        let reg = AmbientTemperature::from_bytes([0xa1, 0x90]);
        assert!(reg.status().at_or_above_crit());
        assert!(!reg.status().above_upper());
        assert!(reg.status().below_lower());
        assert!(!reg.sign());
        assert_eq!(reg.magnitude(), u12::new(0x190));
    }

    #[test]
    fn resolution_register() {
        let reg = ResolutionRegister::from(0x03);
        assert_eq!(reg.resolution(), Resolution::SixteenthCelsius);
        let reg = ResolutionRegister::from(0xfd);
        assert_eq!(reg.resolution(), Resolution::QuarterCelsius);
        assert_eq!(Resolution::EighthCelsius.celsius_per_bit(), 0.125);
    }

    #[test]
    fn device_id_register() {
        let reg = DeviceId::from(u16::from_be_bytes([0x04, 0x01]));
        assert_eq!(reg.id(), 0x04);
        assert_eq!(reg.revision(), 0x01);
    }
}
