//! Startup plan
//!
//! An explicit, ordered list of bring-up steps. Each step declares what must
//! already have happened before it runs (a port clock switched on, a pin
//! routed to a peripheral signal), so ordering mistakes are caught by
//! [`StartupPlan::check`] instead of showing up as a silent bus on hardware.

use core::fmt;

use heapless::Vec;
use primer_hal::error::PeripheralId;
use primer_hal::gpio::{PinConfig, PinId, Port, Signal};
use primer_hal::i2c::I2cConfig;
use primer_hal::timer::TimerConfig;
use primer_hal::uart::UartConfig;

use crate::board::BoardManifest;

/// Maximum steps in a plan
pub const MAX_STEPS: usize = 48;

/// Maximum requirements declared by a single step
pub const MAX_REQUIREMENTS: usize = 2;

/// Something that must be true before a step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Requirement {
    /// The port's clock domain is on
    PortClock(Port),
    /// The pin is configured as the alternate function carrying `signal`
    PinRouted { pin: PinId, signal: Signal },
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::PortClock(port) => write!(f, "GPIO{} clock on", port.letter()),
            Requirement::PinRouted { pin, signal } => {
                write!(f, "{} routed to {}", pin, signal.name())
            }
        }
    }
}

/// Hardware resource a step takes ownership of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resource {
    PortClock(Port),
    Pin(PinId),
    Peripheral(PeripheralId),
}

/// One bring-up step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Switch on a GPIO port clock
    EnablePortClock(Port),
    /// Apply one pin configuration
    ConfigurePin(PinConfig),
    /// Bring up a serial port
    InitUart(UartConfig),
    /// Bring up an I2C controller
    InitI2c(I2cConfig),
    /// Bring up a timer
    InitTimer(TimerConfig),
}

impl Step {
    /// Preconditions of this step
    pub fn requirements(&self) -> Vec<Requirement, MAX_REQUIREMENTS> {
        let mut reqs = Vec::new();
        // At most two requirements per step, matching MAX_REQUIREMENTS
        match self {
            Step::EnablePortClock(_) | Step::InitTimer(_) => {}
            Step::ConfigurePin(config) => {
                let _ = reqs.push(Requirement::PortClock(config.pin.port));
            }
            Step::InitUart(uart) => {
                if uart.direction.has_tx() {
                    let _ = reqs.push(Requirement::PinRouted {
                        pin: uart.tx_pin,
                        signal: Signal::UartTx(uart.instance),
                    });
                }
                if uart.direction.has_rx() {
                    let _ = reqs.push(Requirement::PinRouted {
                        pin: uart.rx_pin,
                        signal: Signal::UartRx(uart.instance),
                    });
                }
            }
            Step::InitI2c(i2c) => {
                let _ = reqs.push(Requirement::PinRouted {
                    pin: i2c.scl_pin,
                    signal: Signal::I2cScl(i2c.instance),
                });
                let _ = reqs.push(Requirement::PinRouted {
                    pin: i2c.sda_pin,
                    signal: Signal::I2cSda(i2c.instance),
                });
            }
        }
        reqs
    }

    /// Whether completing this step fulfils `requirement`
    pub fn satisfies(&self, requirement: &Requirement) -> bool {
        match (self, requirement) {
            (Step::EnablePortClock(port), Requirement::PortClock(needed)) => port == needed,
            (Step::ConfigurePin(config), Requirement::PinRouted { pin, signal }) => {
                config.pin == *pin && config.carries(*signal)
            }
            _ => false,
        }
    }

    /// Peripheral brought up by this step, if any
    pub fn peripheral(&self) -> Option<PeripheralId> {
        match self {
            Step::InitUart(uart) => Some(PeripheralId::Uart(uart.instance)),
            Step::InitI2c(i2c) => Some(PeripheralId::I2c(i2c.instance)),
            Step::InitTimer(timer) => Some(PeripheralId::Timer(timer.instance)),
            Step::EnablePortClock(_) | Step::ConfigurePin(_) => None,
        }
    }

    fn resource(&self) -> Resource {
        match self {
            Step::EnablePortClock(port) => Resource::PortClock(*port),
            Step::ConfigurePin(config) => Resource::Pin(config.pin),
            Step::InitUart(uart) => Resource::Peripheral(PeripheralId::Uart(uart.instance)),
            Step::InitI2c(i2c) => Resource::Peripheral(PeripheralId::I2c(i2c.instance)),
            Step::InitTimer(timer) => Resource::Peripheral(PeripheralId::Timer(timer.instance)),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::EnablePortClock(port) => write!(f, "enable GPIO{} clock", port.letter()),
            Step::ConfigurePin(config) => write!(f, "configure {} as {}", config.pin, config.mode),
            Step::InitUart(uart) => write!(f, "init {}", uart.instance.name()),
            Step::InitI2c(i2c) => write!(f, "init {}", i2c.instance.name()),
            Step::InitTimer(timer) => write!(f, "init {}", timer.instance.name()),
        }
    }
}

/// Reasons a plan cannot be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanError {
    /// Step `step` runs before anything satisfies `requirement`
    Unsatisfied {
        step: usize,
        requirement: Requirement,
    },
    /// Step `step` touches a resource an earlier step already configured
    DuplicateStep { step: usize },
    /// More than [`MAX_STEPS`] steps
    CapacityExceeded,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::Unsatisfied { step, requirement } => {
                write!(f, "step {} needs {} first", step, requirement)
            }
            PlanError::DuplicateStep { step } => {
                write!(f, "step {} configures a resource twice", step)
            }
            PlanError::CapacityExceeded => write!(f, "plan exceeds {} steps", MAX_STEPS),
        }
    }
}

/// Ordered bring-up steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupPlan {
    steps: Vec<Step, MAX_STEPS>,
}

impl StartupPlan {
    /// Create an empty plan
    pub const fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Build the plan for a board
    ///
    /// Pins come first in table order, each port clock switched on just
    /// before the first pin of that port. Then serial ports, I2C controllers
    /// and timers, in table order. Disabled peripherals are left out.
    pub fn from_manifest(board: &BoardManifest<'_>) -> Result<Self, PlanError> {
        let mut plan = Self::new();
        let mut clocked: Vec<Port, { crate::board::MAX_PORTS }> = Vec::new();

        for pin in board.pins {
            if !clocked.contains(&pin.pin.port) {
                // Port has only MAX_PORTS variants
                let _ = clocked.push(pin.pin.port);
                plan.push(Step::EnablePortClock(pin.pin.port))?;
            }
            plan.push(Step::ConfigurePin(*pin))?;
        }

        for uart in board.enabled_uarts() {
            plan.push(Step::InitUart(*uart))?;
        }
        for i2c in board.enabled_i2cs() {
            plan.push(Step::InitI2c(*i2c))?;
        }
        for timer in board.enabled_timers() {
            plan.push(Step::InitTimer(*timer))?;
        }

        Ok(plan)
    }

    /// Append a step
    pub fn push(&mut self, step: Step) -> Result<(), PlanError> {
        self.steps
            .push(step)
            .map_err(|_| PlanError::CapacityExceeded)
    }

    /// Verify ordering and uniqueness
    ///
    /// Every requirement of a step must be satisfied by an earlier step, and
    /// no port clock, pin or peripheral may appear twice. Reports the first
    /// violation found.
    pub fn check(&self) -> Result<(), PlanError> {
        for (idx, step) in self.steps.iter().enumerate() {
            let earlier = &self.steps[..idx];

            if earlier.iter().any(|s| s.resource() == step.resource()) {
                return Err(PlanError::DuplicateStep { step: idx });
            }

            for requirement in step.requirements() {
                if !earlier.iter().any(|s| s.satisfies(&requirement)) {
                    return Err(PlanError::Unsatisfied {
                        step: idx,
                        requirement,
                    });
                }
            }
        }
        Ok(())
    }

    /// Steps in execution order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of peripheral steps (serial, I2C, timers)
    pub fn peripheral_count(&self) -> usize {
        self.steps.iter().filter(|s| s.peripheral().is_some()).count()
    }
}
