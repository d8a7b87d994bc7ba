//! I2C controller descriptors
//!
//! Field-for-field description of an I2C controller setup and the trait a
//! platform implements to apply it.

use crate::error::InitError;
use crate::gpio::PinId;

/// Standard mode clock (100 kHz)
pub const STANDARD_MODE_HZ: u32 = 100_000;

/// Fast mode clock (400 kHz)
pub const FAST_MODE_HZ: u32 = 400_000;

/// I2C controller instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cInstance {
    I2c1,
    I2c2,
    I2c3,
}

impl I2cInstance {
    /// Peripheral name as printed in reference manuals
    pub const fn name(self) -> &'static str {
        match self {
            I2cInstance::I2c1 => "I2C1",
            I2cInstance::I2c2 => "I2C2",
            I2cInstance::I2c3 => "I2C3",
        }
    }

    /// Parse a peripheral name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        [I2cInstance::I2c1, I2cInstance::I2c2, I2cInstance::I2c3]
            .into_iter()
            .find(|i| i.name().eq_ignore_ascii_case(name))
    }
}

/// Fast-mode SCL low/high ratio
///
/// Ignored in standard mode, where the ratio is always 1:1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DutyCycle {
    /// Tlow/Thigh = 2
    #[default]
    Two,
    /// Tlow/Thigh = 16/9
    SixteenNine,
}

/// Own-address width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressingMode {
    #[default]
    SevenBit,
    TenBit,
}

/// Second own-address acknowledge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DualAddress {
    #[default]
    Disabled,
    Enabled,
}

/// General-call address acknowledge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeneralCall {
    #[default]
    Disabled,
    Enabled,
}

/// The controller's no-stretch switch
///
/// `Disabled` switches the no-stretch feature off, which leaves clock
/// stretching active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoStretch {
    #[default]
    Disabled,
    Enabled,
}

impl NoStretch {
    /// Whether devices may hold SCL low to slow the controller
    pub const fn clock_stretching(self) -> bool {
        matches!(self, NoStretch::Disabled)
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Which controller
    pub instance: I2cInstance,
    /// Pin carrying SCL
    pub scl_pin: PinId,
    /// Pin carrying SDA
    pub sda_pin: PinId,
    /// SCL frequency in Hz
    pub clock_speed: u32,
    /// Fast-mode duty cycle
    pub duty_cycle: DutyCycle,
    /// Primary own address (0 when only used as controller)
    pub own_address1: u16,
    /// Width of `own_address1`
    pub addressing_mode: AddressingMode,
    /// Dual-address mode
    pub dual_address: DualAddress,
    /// Secondary 7-bit own address
    pub own_address2: u8,
    /// General-call mode
    pub general_call: GeneralCall,
    /// No-stretch mode
    pub no_stretch: NoStretch,
    /// Skipped by bring-up when false
    pub enabled: bool,
}

impl I2cConfig {
    /// Standard-mode controller with no own address claimed
    pub const fn new(instance: I2cInstance, scl_pin: PinId, sda_pin: PinId) -> Self {
        Self {
            instance,
            scl_pin,
            sda_pin,
            clock_speed: STANDARD_MODE_HZ,
            duty_cycle: DutyCycle::Two,
            own_address1: 0,
            addressing_mode: AddressingMode::SevenBit,
            dual_address: DualAddress::Disabled,
            own_address2: 0,
            general_call: GeneralCall::Disabled,
            no_stretch: NoStretch::Disabled,
            enabled: true,
        }
    }

    /// Replace the clock speed
    pub const fn with_clock_speed(mut self, hz: u32) -> Self {
        self.clock_speed = hz;
        self
    }

    /// Whether `own_address1` fits the configured addressing mode
    pub const fn own_address_fits(&self) -> bool {
        match self.addressing_mode {
            AddressingMode::SevenBit => self.own_address1 <= 0x7F,
            AddressingMode::TenBit => self.own_address1 <= 0x3FF,
        }
    }
}

/// I2C controller bring-up
pub trait I2cInit {
    /// Handle to an initialized controller
    type I2c;

    /// Apply the configuration and return the live handle
    ///
    /// The bus pins must already be configured for this instance.
    fn init_i2c(&mut self, config: &I2cConfig) -> Result<Self::I2c, InitError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::Port;

    fn bus() -> I2cConfig {
        I2cConfig::new(
            I2cInstance::I2c1,
            PinId::new(Port::B, 6),
            PinId::new(Port::B, 7),
        )
    }

    #[test]
    fn test_default_config() {
        let config = bus();
        assert_eq!(config.clock_speed, 100_000);
        assert_eq!(config.duty_cycle, DutyCycle::Two);
        assert_eq!(config.own_address1, 0);
        assert_eq!(config.addressing_mode, AddressingMode::SevenBit);
        assert_eq!(config.dual_address, DualAddress::Disabled);
        assert_eq!(config.general_call, GeneralCall::Disabled);
        assert_eq!(config.no_stretch, NoStretch::Disabled);
    }

    #[test]
    fn test_no_stretch_sense() {
        // Switching no-stretch off keeps clock stretching on
        assert!(NoStretch::Disabled.clock_stretching());
        assert!(!NoStretch::Enabled.clock_stretching());
    }

    #[test]
    fn test_own_address_width() {
        let mut config = bus();
        config.own_address1 = 0x7F;
        assert!(config.own_address_fits());

        config.own_address1 = 0x80;
        assert!(!config.own_address_fits());

        config.addressing_mode = AddressingMode::TenBit;
        assert!(config.own_address_fits());
    }
}
