//! Base timer descriptors
//!
//! A free-running periodic timer: prescaler, counting direction and
//! auto-reload period. No output channels are routed.
//!
//! `prescaler` and `period` hold register values, so the input clock is
//! divided by `prescaler + 1` and the counter wraps every `period + 1` ticks.

use crate::error::InitError;

/// Nanoseconds per second
const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Timer instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerInstance {
    Tim2,
    Tim3,
    Tim4,
    Tim5,
}

impl TimerInstance {
    /// Peripheral name as printed in reference manuals
    pub const fn name(self) -> &'static str {
        match self {
            TimerInstance::Tim2 => "TIM2",
            TimerInstance::Tim3 => "TIM3",
            TimerInstance::Tim4 => "TIM4",
            TimerInstance::Tim5 => "TIM5",
        }
    }

    /// Parse a peripheral name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        [
            TimerInstance::Tim2,
            TimerInstance::Tim3,
            TimerInstance::Tim4,
            TimerInstance::Tim5,
        ]
        .into_iter()
        .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// Whether the counter and auto-reload register are 32 bits wide
    pub const fn is_32bit(self) -> bool {
        matches!(self, TimerInstance::Tim2 | TimerInstance::Tim5)
    }
}

/// Counting direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterMode {
    #[default]
    Up,
    Down,
    CenterAligned1,
    CenterAligned2,
    CenterAligned3,
}

/// Dead-time and digital filter clock division
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDivision {
    #[default]
    Div1,
    Div2,
    Div4,
}

/// Timer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    /// Which timer
    pub instance: TimerInstance,
    /// Prescaler register value (divider minus one)
    pub prescaler: u32,
    /// Counting direction
    pub counter_mode: CounterMode,
    /// Auto-reload register value (counts minus one)
    pub period: u32,
    /// Clock division
    pub clock_division: ClockDivision,
    /// Input clock the prescaler was chosen for
    ///
    /// Design intent only. It is not applied to the clock tree.
    pub assumed_clock_hz: u32,
    /// Skipped by bring-up when false
    pub enabled: bool,
}

impl TimerConfig {
    /// Up-counting timer dividing by `divider` and wrapping after `counts`
    ///
    /// Both arguments are the human-facing values; the stored register
    /// values are one less. Zero is treated as one.
    pub const fn from_divider(
        instance: TimerInstance,
        divider: u32,
        counts: u32,
        assumed_clock_hz: u32,
    ) -> Self {
        Self {
            instance,
            prescaler: divider.saturating_sub(1),
            counter_mode: CounterMode::Up,
            period: counts.saturating_sub(1),
            clock_division: ClockDivision::Div1,
            assumed_clock_hz,
            enabled: true,
        }
    }

    /// Actual input clock divider
    pub const fn divider(&self) -> u64 {
        self.prescaler as u64 + 1
    }

    /// Counter ticks per update event
    pub const fn counts(&self) -> u64 {
        self.period as u64 + 1
    }

    /// Counter clock in Hz for the given input clock
    pub const fn counter_hz(&self, input_hz: u32) -> u64 {
        input_hz as u64 / self.divider()
    }

    /// Whether the prescaler fits the 16-bit PSC register
    pub const fn prescaler_fits(&self) -> bool {
        self.prescaler <= u16::MAX as u32
    }

    /// Value the 16-bit PSC register keeps when `prescaler` is written
    ///
    /// Bits above 15 are dropped, as the register write does on silicon.
    pub const fn prescaler_register(&self) -> u16 {
        (self.prescaler & 0xFFFF) as u16
    }

    /// Divider the hardware applies after the PSC write
    pub const fn effective_divider(&self) -> u64 {
        self.prescaler_register() as u64 + 1
    }

    /// Duration of one counter tick in nanoseconds
    ///
    /// Returns `None` for a zero input clock.
    pub const fn tick_period_ns(&self, input_hz: u32) -> Option<u64> {
        if input_hz == 0 {
            return None;
        }
        Some(self.divider() * NANOS_PER_SEC / input_hz as u64)
    }

    /// Time between update events (counter wrap) in nanoseconds
    ///
    /// Returns `None` for a zero input clock, or when the period does not
    /// fit in a `u64` of nanoseconds.
    pub const fn update_period_ns(&self, input_hz: u32) -> Option<u64> {
        if input_hz == 0 {
            return None;
        }
        // Up to 2^32 * 2^32 * 1e9 before the division
        let ns = self.divider() as u128 * self.counts() as u128 * NANOS_PER_SEC as u128
            / input_hz as u128;
        if ns > u64::MAX as u128 {
            return None;
        }
        Some(ns as u64)
    }
}

/// Base timer bring-up
pub trait TimerInit {
    /// Handle to an initialized timer
    type Timer;

    /// Apply the configuration and return the live handle
    ///
    /// The timer is configured but not started.
    fn init_timer(&mut self, config: &TimerConfig) -> Result<Self::Timer, InitError>;
}
