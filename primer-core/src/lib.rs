//! Board-agnostic bring-up logic for Primer firmware
//!
//! This crate contains everything about peripheral bring-up that does not
//! touch registers:
//!
//! - The board manifest (pin, serial, I2C and timer tables)
//! - Manifest validation
//! - The startup plan, with per-step preconditions
//! - The sequencer that applies a plan to a [`primer_hal::Platform`]
//! - The [`Peripherals`] startup context holding the live handles

#![no_std]
#![deny(unsafe_code)]

pub mod board;
pub mod plan;
pub mod sequencer;

pub use board::{BoardManifest, ManifestError, ManifestWarning, STM32F4_DISCOVERY};
pub use plan::{PlanError, Requirement, StartupPlan, Step};
pub use sequencer::{
    bring_up, bring_up_board, execute, try_bring_up, BringUpError, FatalHandler, Peripherals,
};
