//! Peripheral initialization errors
//!
//! Bring-up has exactly one failure kind: the platform refused to initialize
//! a peripheral. The cause is kept for diagnostics only.

use core::fmt;

use crate::i2c::I2cInstance;
use crate::timer::TimerInstance;
use crate::uart::UartInstance;

/// Identifies one initialized peripheral instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralId {
    /// Serial port
    Uart(UartInstance),
    /// I2C controller
    I2c(I2cInstance),
    /// Base timer
    Timer(TimerInstance),
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeripheralId::Uart(u) => f.write_str(u.name()),
            PeripheralId::I2c(i) => f.write_str(i.name()),
            PeripheralId::Timer(t) => f.write_str(t.name()),
        }
    }
}

/// Why the platform rejected an initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitCause {
    /// The configuration cannot be expressed by the hardware
    InvalidConfig,
    /// The hardware did not respond
    NotResponding,
}

/// Peripheral initialization rejected by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitError {
    /// The peripheral that failed
    pub peripheral: PeripheralId,
    /// Reported cause
    pub cause: InitCause,
}

impl InitError {
    /// Configuration not expressible on this hardware
    pub const fn invalid_config(peripheral: PeripheralId) -> Self {
        Self {
            peripheral,
            cause: InitCause::InvalidConfig,
        }
    }

    /// Hardware did not respond
    pub const fn not_responding(peripheral: PeripheralId) -> Self {
        Self {
            peripheral,
            cause: InitCause::NotResponding,
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cause = match self.cause {
            InitCause::InvalidConfig => "invalid configuration",
            InitCause::NotResponding => "not responding",
        };
        write!(f, "{} initialization rejected: {}", self.peripheral, cause)
    }
}
