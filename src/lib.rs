//! This is a platform-agnostic Rust driver for the MCP9808 temperature sensor
//! based on the [`embedded-hal`] traits.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//!
//! For further details of the device architecture and operation, please refer
//! to the official [`Datasheet`].
//!
//! [`Datasheet`]: https://ww1.microchip.com/downloads/en/DeviceDoc/25095A.pdf

#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

#[macro_use]
mod fmt;

mod registers;
pub use registers::*;

pub mod blocking;
pub mod codec;

/// Expected content of the manufacturer ID register.
pub const MANUFACTURER_ID: u8 = 0x54;

/// Expected content of the device ID register.
pub const DEVICE_ID: u8 = 0x04;

/// I2C address, selected by the logic levels of pins A2, A1 and A0.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(u8);

impl Address {
    const BASE: u8 = 0x18;

    /// Address for the given pin levels, `true` meaning tied high.
    pub fn from_pins(a2: bool, a1: bool, a0: bool) -> Self {
        Self(Self::BASE | (u8::from(a2) << 2) | (u8::from(a1) << 1) | u8::from(a0))
    }
}

impl Default for Address {
    fn default() -> Self {
        Self(Self::BASE)
    }
}

impl From<Address> for u8 {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

/// A raw address outside `0x18..=0x1f`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidAddress(pub u8);

impl core::fmt::Display for InvalidAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid MCP9808 address {:#04x}, expected 0x18..=0x1f", self.0)
    }
}

impl core::error::Error for InvalidAddress {}

impl TryFrom<u8> for Address {
    type Error = InvalidAddress;

    fn try_from(addr: u8) -> Result<Self, Self::Error> {
        if addr & !0x07 == Self::BASE {
            Ok(Self(addr))
        } else {
            Err(InvalidAddress(addr))
        }
    }
}
