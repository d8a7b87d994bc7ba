//! STM32F4 platform for Primer board bring-up
//!
//! Implements the `primer-hal` platform traits for STM32F405/407 parts by
//! writing the peripheral registers directly through embassy's re-exported
//! PAC. Register-level access lets the board manifest decide pin routing at
//! runtime instead of through typed pin singletons.
//!
//! # Features
//!
//! - `stm32f407vg` - Enable support for STM32F407VG (STM32F4-Discovery)
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! ```ignore
//! let _p = embassy_stm32::init(config);
//! let mut platform = Stm32f4::new(Clocks::DISCOVERY);
//! let peripherals = primer_core::bring_up(&mut platform, &mut Halt);
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod timer;
pub mod uart;

pub use i2c::I2c;
pub use timer::Timer;
pub use uart::Uart;

/// Bus clock frequencies the peripherals run from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    /// APB1 peripheral clock (USART2/3, I2C)
    pub pclk1_hz: u32,
    /// APB2 peripheral clock (USART1/6)
    pub pclk2_hz: u32,
    /// Timer kernel clock on APB1 (TIM2-5)
    pub apb1_timer_hz: u32,
}

impl Clocks {
    /// 168 MHz SYSCLK from the 8 MHz crystal, APB1 /4, APB2 /2
    pub const DISCOVERY: Self = Self {
        pclk1_hz: 42_000_000,
        pclk2_hz: 84_000_000,
        apb1_timer_hz: 84_000_000,
    };
}

/// STM32F4 platform
///
/// Owns nothing but the clock figures; the registers are reached through
/// the PAC. Only one instance should exist, created after
/// `embassy_stm32::init`.
pub struct Stm32f4 {
    clocks: Clocks,
}

impl Stm32f4 {
    /// Create the platform for the given clock tree
    pub const fn new(clocks: Clocks) -> Self {
        Self { clocks }
    }

    /// Clock tree in use
    pub fn clocks(&self) -> Clocks {
        self.clocks
    }
}
