//! MCP9808 Blocking API
//!
//! Every getter reads the device; nothing is cached between calls. The driver
//! takes `&mut self` everywhere, so read-modify-write sequences on the
//! configuration register are only safe while a single owner holds the handle.

use core::fmt;

#[cfg(feature = "embedded-sensors-hal")]
use embedded_sensors_hal::sensor;
#[cfg(feature = "embedded-sensors-hal")]
use embedded_sensors_hal::temperature::{DegreesCelsius, TemperatureSensor};

use super::codec;
use super::{
    Address, AlertMode, AlertOutputMode, AlertResponse, AlertStatus, AmbientTemperature, Configuration, DeviceId,
    Hysteresis, LockState, Polarity, PowerMode, Register, Resolution, ResolutionRegister, DEVICE_ID, MANUFACTURER_ID,
};

/// Minimum distance between the upper and lower limits, in degrees Celsius.
pub const MIN_WINDOW_CELSIUS: f32 = 2.0;

/// MCP9808 blocking device driver
pub struct Mcp9808<I2C: embedded_hal::i2c::I2c> {
    /// The concrete I2C bus implementation
    i2c: I2C,

    /// The I2C address.
    pub(crate) addr: u8,
}

impl<I2C: embedded_hal::i2c::I2c> Mcp9808<I2C> {
    /// Create a new MCP9808 instance.
    pub fn new(i2c: I2C, address: Address) -> Self {
        Self {
            i2c,
            addr: address.into(),
        }
    }

    /// Create a new MCP9808 instance with A2, A1 and A0 tied to GND,
    /// resulting in an instance responding to address `0x18`.
    pub fn new_with_default_address(i2c: I2C) -> Self {
        Self::new(i2c, Address::default())
    }

    /// Destroy the driver instance, return the I2C bus instance.
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    /// Check that the device on the bus is an MCP9808.
    ///
    /// This is a presence probe only, the device is not reset.
    ///
    /// # Errors
    ///
    /// `Error::IdentityMismatch` when either ID register holds an unexpected
    /// value, `Error::Bus` when the I2C transaction fails
    pub fn sensor_init(&mut self) -> Result<(), Error<I2C::Error>> {
        let device = self.device_id()?;
        let manufacturer_id = self.manufacturer_id()?;

        if device.id() == DEVICE_ID && manufacturer_id.to_be_bytes()[1] == MANUFACTURER_ID {
            debug!("mcp9808 found at {:#x}, revision {}", self.addr, device.revision());
            Ok(())
        } else {
            warn!(
                "unexpected identity at {:#x}: manufacturer {:#x}, device {:#x}",
                self.addr,
                manufacturer_id,
                device.id()
            );
            Err(Error::IdentityMismatch {
                manufacturer_id,
                device_id: device.id(),
            })
        }
    }

    /// Read manufacturer ID register
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn manufacturer_id(&mut self) -> Result<u16, Error<I2C::Error>> {
        let data = self.read(Register::ManufacturerId)?;
        Ok(u16::from_be_bytes(data))
    }

    /// Read device ID and revision register
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn device_id(&mut self) -> Result<DeviceId, Error<I2C::Error>> {
        let data = self.read(Register::DeviceId)?;
        Ok(DeviceId::from(u16::from_be_bytes(data)))
    }

    /// Read configuration register
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn configuration(&mut self) -> Result<Configuration, Error<I2C::Error>> {
        let data = self.read(Register::Configuration)?;
        Ok(Configuration::from_bytes(data))
    }

    /// Read ambient temperature register
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn temperature(&mut self) -> Result<f32, Error<I2C::Error>> {
        let [msb, lsb] = self.read(Register::Temperature)?;
        Ok(codec::decode_temperature(msb, lsb))
    }

    /// Read the ambient temperature together with the limit comparison flags,
    /// both taken from a single register read.
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn comparator_state(&mut self) -> Result<ComparatorState, Error<I2C::Error>> {
        let raw: [u8; 2] = self.read(Register::Temperature)?;

        Ok(ComparatorState {
            temperature: codec::decode_temperature(raw[0], raw[1]),
            status: AmbientTemperature::from_bytes(raw).status(),
        })
    }

    /// Set power mode
    ///
    /// # Errors
    ///
    /// `Error::Locked` when the configuration register is locked,
    /// `Error::Bus` when the I2C transaction fails
    pub fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), Error<I2C::Error>> {
        self.update_configuration(|config| config.with_power_mode(mode))
    }

    /// Read power mode
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn power_mode(&mut self) -> Result<PowerMode, Error<I2C::Error>> {
        Ok(self.configuration()?.power_mode())
    }

    /// Place device in Shutdown mode
    ///
    /// # Errors
    ///
    /// `Error::Locked` when the configuration register is locked,
    /// `Error::Bus` when the I2C transaction fails
    pub fn sleep(&mut self) -> Result<(), Error<I2C::Error>> {
        self.set_power_mode(PowerMode::Shutdown)
    }

    /// Resume continuous conversions
    ///
    /// # Errors
    ///
    /// `Error::Locked` when the configuration register is locked,
    /// `Error::Bus` when the I2C transaction fails
    pub fn wake_up(&mut self) -> Result<(), Error<I2C::Error>> {
        self.set_power_mode(PowerMode::Continuous)
    }

    /// Set resolution register. The resolution register is not covered by
    /// the configuration lock bits.
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), Error<I2C::Error>> {
        let mut reg = ResolutionRegister::from(0u8);
        reg.set_resolution(resolution);
        self.write(Register::Resolution, [u8::from(reg)])
    }

    /// Read resolution register
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn resolution(&mut self) -> Result<Resolution, Error<I2C::Error>> {
        let [data] = self.read(Register::Resolution)?;
        Ok(ResolutionRegister::from(data).resolution())
    }

    /// Set lock bits.
    ///
    /// The write is issued whatever the current lock state is. The device
    /// itself only releases a lock on power cycle.
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn set_lock_state(&mut self, lock: LockState) -> Result<(), Error<I2C::Error>> {
        let config = self.configuration()?;
        self.write_configuration(config.with_lock(lock))
    }

    /// Read lock bits
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn lock_state(&mut self) -> Result<LockState, Error<I2C::Error>> {
        Ok(self.configuration()?.lock())
    }

    /// Set limit hysteresis
    ///
    /// # Errors
    ///
    /// `Error::Locked` when the configuration register is locked,
    /// `Error::Bus` when the I2C transaction fails
    pub fn set_alert_hysteresis(&mut self, hysteresis: Hysteresis) -> Result<(), Error<I2C::Error>> {
        self.update_configuration(|config| config.with_hysteresis(hysteresis))
    }

    /// Read limit hysteresis
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn alert_hysteresis(&mut self) -> Result<Hysteresis, Error<I2C::Error>> {
        Ok(self.configuration()?.hysteresis())
    }

    /// Set alert output polarity
    ///
    /// # Errors
    ///
    /// `Error::Locked` when the configuration register is locked,
    /// `Error::Bus` when the I2C transaction fails
    pub fn set_polarity(&mut self, polarity: Polarity) -> Result<(), Error<I2C::Error>> {
        self.update_configuration(|config| config.with_polarity(polarity))
    }

    /// Read alert output polarity
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn polarity(&mut self) -> Result<Polarity, Error<I2C::Error>> {
        Ok(self.configuration()?.polarity())
    }

    /// Enable or disable the alert output
    ///
    /// # Errors
    ///
    /// `Error::Locked` when the configuration register is locked,
    /// `Error::Bus` when the I2C transaction fails
    pub fn set_alert_enable(&mut self, enabled: bool) -> Result<(), Error<I2C::Error>> {
        self.update_configuration(|config| config.with_alert_enabled(enabled))
    }

    /// Read alert output enable bit
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn alert_enabled(&mut self) -> Result<bool, Error<I2C::Error>> {
        Ok(self.configuration()?.alert_enabled())
    }

    /// Select which limits drive the alert output
    ///
    /// # Errors
    ///
    /// `Error::Locked` when the configuration register is locked,
    /// `Error::Bus` when the I2C transaction fails
    pub fn set_alert_response_mode(&mut self, response: AlertResponse) -> Result<(), Error<I2C::Error>> {
        self.update_configuration(|config| config.with_response(response))
    }

    /// Read which limits drive the alert output
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn alert_response_mode(&mut self) -> Result<AlertResponse, Error<I2C::Error>> {
        Ok(self.configuration()?.response())
    }

    /// Set alert output mode.
    ///
    /// `Comparator` and `Interrupt` write the mode bit and enable the alert
    /// output. `Disabled` only clears the enable bit, so the previous mode
    /// comes back when alerts are enabled again.
    ///
    /// # Errors
    ///
    /// `Error::Locked` when the configuration register is locked,
    /// `Error::Bus` when the I2C transaction fails
    pub fn set_alert_output_mode(&mut self, mode: AlertOutputMode) -> Result<(), Error<I2C::Error>> {
        let alert_mode = match mode {
            AlertOutputMode::Comparator => AlertMode::Comparator,
            AlertOutputMode::Interrupt => AlertMode::Interrupt,
            AlertOutputMode::Disabled => return self.set_alert_enable(false),
        };

        self.update_configuration(|config| config.with_alert_mode(alert_mode).with_alert_enabled(true))
    }

    /// Read alert output mode, `Disabled` whenever the alert output is off.
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn alert_output_mode(&mut self) -> Result<AlertOutputMode, Error<I2C::Error>> {
        let config = self.configuration()?;

        if !config.alert_enabled() {
            return Ok(AlertOutputMode::Disabled);
        }

        Ok(match config.alert_mode() {
            AlertMode::Comparator => AlertOutputMode::Comparator,
            AlertMode::Interrupt => AlertOutputMode::Interrupt,
        })
    }

    /// Set the critical, upper and lower limits.
    ///
    /// Limits are stored with quarter-degree precision, see
    /// [`codec::quantize_fraction`]. The three registers are written in the
    /// order upper, lower, critical. A bus error part way through leaves the
    /// earlier registers updated.
    ///
    /// # Errors
    ///
    /// `Error::InvalidParameter` when a limit is out of range, `crit` is not
    /// above `upper` or `upper - lower` is below [`MIN_WINDOW_CELSIUS`],
    /// `Error::Locked` when the configuration register is locked,
    /// `Error::Bus` when the I2C transaction fails
    pub fn set_threshold(&mut self, crit: f32, upper: f32, lower: f32) -> Result<(), Error<I2C::Error>> {
        if ![crit, upper, lower].into_iter().all(codec::is_valid_threshold) {
            return Err(Error::InvalidParameter(ParameterError::OutOfRange));
        }
        if crit <= upper {
            return Err(Error::InvalidParameter(ParameterError::CritNotAboveUpper));
        }
        if upper - lower < MIN_WINDOW_CELSIUS {
            return Err(Error::InvalidParameter(ParameterError::WindowTooNarrow));
        }

        let lock = self.lock_state()?;
        if lock.is_locked() {
            warn!("limits locked ({:?}), write rejected", lock);
            return Err(Error::Locked(lock));
        }

        for (reg, limit) in [
            (Register::UpperLimit, upper),
            (Register::LowerLimit, lower),
            (Register::CriticalLimit, crit),
        ] {
            self.write(reg, codec::encode_threshold(limit))?;
        }

        Ok(())
    }

    /// Read the critical, upper and lower limit registers
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn thresholds(&mut self) -> Result<Thresholds, Error<I2C::Error>> {
        let upper = self.read_limit(Register::UpperLimit)?;
        let lower = self.read_limit(Register::LowerLimit)?;
        let crit = self.read_limit(Register::CriticalLimit)?;

        Ok(Thresholds { crit, upper, lower })
    }

    /// Release a latched interrupt. Has no effect in comparator mode.
    ///
    /// # Errors
    ///
    /// `Error::Bus` when the I2C transaction fails
    pub fn clear_interrupt(&mut self) -> Result<(), Error<I2C::Error>> {
        let config = self.configuration()?;
        self.write_configuration(config.with_interrupt_clear(true))
    }

    fn update_configuration<F>(&mut self, f: F) -> Result<(), Error<I2C::Error>>
    where
        F: FnOnce(Configuration) -> Configuration,
    {
        let config = self.configuration()?;

        match config.lock() {
            LockState::Unlocked => self.write_configuration(f(config)),
            lock => {
                warn!("configuration locked ({:?}), write rejected", lock);
                Err(Error::Locked(lock))
            }
        }
    }

    fn write_configuration(&mut self, config: Configuration) -> Result<(), Error<I2C::Error>> {
        self.write(Register::Configuration, config.to_bytes())
    }

    fn read_limit(&mut self, reg: Register) -> Result<f32, Error<I2C::Error>> {
        let [msb, lsb] = self.read(reg)?;
        Ok(codec::decode_threshold(msb, lsb))
    }

    fn read<const N: usize>(&mut self, reg: Register) -> Result<[u8; N], Error<I2C::Error>> {
        let mut bytes = [0; N];
        self.i2c
            .write_read(self.addr, &[reg.into()], &mut bytes)
            .map_err(Error::Bus)?;
        trace!("read {:?}: {:?}", reg, bytes);
        Ok(bytes)
    }

    fn write<const N: usize>(&mut self, reg: Register, value: [u8; N]) -> Result<(), Error<I2C::Error>> {
        let mut data = [0; 3];

        data[0] = reg.into();
        data[1..=N].copy_from_slice(&value);

        trace!("write {:?}: {:?}", reg, value);
        self.i2c.write(self.addr, &data[..=N]).map_err(Error::Bus)
    }
}

/// Ambient temperature and limit comparison flags from one register read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparatorState {
    /// Decoded ambient temperature in degrees Celsius.
    pub temperature: f32,

    /// Limit comparison flags.
    pub status: AlertStatus,
}

impl fmt::Display for ComparatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} °C, {}", self.temperature, self.status)
    }
}

/// Alert limits in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Thresholds {
    /// Critical limit.
    pub crit: f32,

    /// Upper limit.
    pub upper: f32,

    /// Lower limit.
    pub lower: f32,
}

/// Rejected limit arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParameterError {
    /// Not finite, or magnitude of 256℃ or more.
    OutOfRange,

    /// The critical limit is not above the upper limit.
    CritNotAboveUpper,

    /// The upper limit is less than 2℃ above the lower limit.
    WindowTooNarrow,
}

/// MCP9808 Errors
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E: embedded_hal::i2c::Error> {
    /// I2C Bus Error
    Bus(E),

    /// The ID registers do not identify an MCP9808
    IdentityMismatch {
        /// Manufacturer ID register content
        manufacturer_id: u16,
        /// Device ID
        device_id: u8,
    },

    /// Mutation rejected because of the lock bits
    Locked(LockState),

    /// Invalid Input Error
    InvalidParameter(ParameterError),
}

impl<E: embedded_hal::i2c::Error> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "I2C bus error: {e:?}"),
            Self::IdentityMismatch {
                manufacturer_id,
                device_id,
            } => write!(
                f,
                "not an MCP9808: manufacturer id {manufacturer_id:#06x}, device id {device_id:#04x}"
            ),
            Self::Locked(lock) => write!(f, "configuration locked: {lock:?}"),
            Self::InvalidParameter(e) => write!(f, "invalid parameter: {e:?}"),
        }
    }
}

impl<E: embedded_hal::i2c::Error> core::error::Error for Error<E> {}

#[cfg(feature = "embedded-sensors-hal")]
impl<E: embedded_hal::i2c::Error> sensor::Error for Error<E> {
    fn kind(&self) -> sensor::ErrorKind {
        match *self {
            Self::Bus(_) => sensor::ErrorKind::Peripheral,
            Self::InvalidParameter(_) => sensor::ErrorKind::InvalidInput,
            Self::IdentityMismatch { .. } | Self::Locked(_) => sensor::ErrorKind::Other,
        }
    }
}

#[cfg(feature = "embedded-sensors-hal")]
impl<I2C: embedded_hal::i2c::I2c> sensor::ErrorType for Mcp9808<I2C> {
    type Error = Error<I2C::Error>;
}

#[cfg(feature = "embedded-sensors-hal")]
impl<I2C: embedded_hal::i2c::I2c> TemperatureSensor for Mcp9808<I2C> {
    fn temperature(&mut self) -> Result<DegreesCelsius, Self::Error> {
        self.temperature()
    }
}
