//! Primer Hardware Abstraction Layer
//!
//! This crate defines the configuration descriptors applied during board
//! bring-up and the traits a chip-specific platform implements to apply them.
//! The bring-up sequencer in `primer-core` only talks to these traits, so the
//! same startup plan runs against real silicon or a recording mock.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  primer-firmware (boot entry point)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  primer-core (manifest, plan, sequencer)│
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  primer-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ primer-hal-   │       │ test mocks    │
//! │   stm32f4     │       │ (host)        │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::GpioControl`] - Port clocks and pin configuration
//! - [`uart::UartInit`] - Serial port bring-up
//! - [`i2c::I2cInit`] - I2C controller bring-up
//! - [`timer::TimerInit`] - Base timer bring-up
//! - [`Platform`] - Everything above

#![no_std]
#![deny(unsafe_code)]

pub mod error;
pub mod gpio;
pub mod i2c;
pub mod timer;
pub mod uart;

// Re-export key types at crate root for convenience
pub use error::{InitCause, InitError, PeripheralId};
pub use gpio::{GpioControl, PinConfig, PinId, PinMode, Port, Pull, Signal, Speed};
pub use i2c::{I2cConfig, I2cInit, I2cInstance};
pub use timer::{TimerConfig, TimerInit, TimerInstance};
pub use uart::{UartConfig, UartInit, UartInstance};

/// A complete bring-up platform
///
/// Anything that can switch on port clocks, configure pins and initialize
/// every peripheral kind the sequencer knows about.
pub trait Platform: GpioControl + UartInit + I2cInit + TimerInit {}

// Blanket implementation for types that implement all the pieces
impl<T: GpioControl + UartInit + I2cInit + TimerInit> Platform for T {}
