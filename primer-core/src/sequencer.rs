//! Bring-up sequencer
//!
//! Runs a [`StartupPlan`] against a [`Platform`] exactly once, synchronously,
//! stopping at the first rejected step. The handles produced along the way
//! are collected into a [`Peripherals`] context that the caller owns for the
//! rest of the program.

use core::fmt;

use heapless::Vec;
use primer_hal::error::InitError;
use primer_hal::i2c::I2cInstance;
use primer_hal::timer::TimerInstance;
use primer_hal::uart::UartInstance;
use primer_hal::Platform;

use crate::board::{BoardManifest, STM32F4_DISCOVERY};
use crate::plan::{PlanError, StartupPlan, Step};

#[cfg(feature = "defmt")]
use defmt::{debug, error, info};

// Stub macros when defmt is not available
#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "defmt"))]
macro_rules! error {
    ($($arg:tt)*) => {{}};
}

/// Serial port handle slots (one per instance)
pub const MAX_UARTS: usize = 4;
/// I2C handle slots (one per instance)
pub const MAX_I2CS: usize = 3;
/// Timer handle slots (one per instance)
pub const MAX_TIMERS: usize = 4;

/// Why bring-up stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringUpError {
    /// The platform rejected a peripheral configuration
    Init(InitError),
    /// The plan was inconsistent; no hardware was touched
    Plan(PlanError),
}

impl From<InitError> for BringUpError {
    fn from(e: InitError) -> Self {
        BringUpError::Init(e)
    }
}

impl From<PlanError> for BringUpError {
    fn from(e: PlanError) -> Self {
        BringUpError::Plan(e)
    }
}

impl fmt::Display for BringUpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BringUpError::Init(e) => write!(f, "{}", e),
            BringUpError::Plan(e) => write!(f, "invalid startup plan: {}", e),
        }
    }
}

/// Terminal error path
///
/// Called at most once, with the error that stopped bring-up. Never returns:
/// implementations halt or reset the system.
pub trait FatalHandler {
    fn fatal(&mut self, error: BringUpError) -> !;
}

/// Live peripheral handles produced by bring-up
///
/// Each instance appears at most once. Application code looks handles up by
/// instance, or takes ownership to hand them to a task.
pub struct Peripherals<P: Platform> {
    uarts: Vec<(UartInstance, P::Uart), MAX_UARTS>,
    i2cs: Vec<(I2cInstance, P::I2c), MAX_I2CS>,
    timers: Vec<(TimerInstance, P::Timer), MAX_TIMERS>,
}

impl<P: Platform> Peripherals<P> {
    const fn new() -> Self {
        Self {
            uarts: Vec::new(),
            i2cs: Vec::new(),
            timers: Vec::new(),
        }
    }

    /// Serial port handle
    pub fn uart(&mut self, instance: UartInstance) -> Option<&mut P::Uart> {
        self.uarts
            .iter_mut()
            .find(|(i, _)| *i == instance)
            .map(|(_, h)| h)
    }

    /// I2C controller handle
    pub fn i2c(&mut self, instance: I2cInstance) -> Option<&mut P::I2c> {
        self.i2cs
            .iter_mut()
            .find(|(i, _)| *i == instance)
            .map(|(_, h)| h)
    }

    /// Timer handle
    pub fn timer(&mut self, instance: TimerInstance) -> Option<&mut P::Timer> {
        self.timers
            .iter_mut()
            .find(|(i, _)| *i == instance)
            .map(|(_, h)| h)
    }

    /// Remove a serial port handle from the context
    pub fn take_uart(&mut self, instance: UartInstance) -> Option<P::Uart> {
        let idx = self.uarts.iter().position(|(i, _)| *i == instance)?;
        Some(self.uarts.swap_remove(idx).1)
    }

    /// Remove an I2C controller handle from the context
    pub fn take_i2c(&mut self, instance: I2cInstance) -> Option<P::I2c> {
        let idx = self.i2cs.iter().position(|(i, _)| *i == instance)?;
        Some(self.i2cs.swap_remove(idx).1)
    }

    /// Remove a timer handle from the context
    pub fn take_timer(&mut self, instance: TimerInstance) -> Option<P::Timer> {
        let idx = self.timers.iter().position(|(i, _)| *i == instance)?;
        Some(self.timers.swap_remove(idx).1)
    }

    /// Number of handles held
    pub fn len(&self) -> usize {
        self.uarts.len() + self.i2cs.len() + self.timers.len()
    }

    /// Whether no handles are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run a checked plan
///
/// Steps run in order. The first rejected step ends the run; later steps are
/// never attempted.
pub fn execute<P: Platform>(
    plan: &StartupPlan,
    platform: &mut P,
) -> Result<Peripherals<P>, BringUpError> {
    let mut peripherals = Peripherals::new();

    for step in plan.steps() {
        debug!("bring-up step: {}", step);

        match step {
            Step::EnablePortClock(port) => platform.enable_port_clock(*port),
            Step::ConfigurePin(config) => platform.configure_pin(config),
            Step::InitUart(config) => {
                let handle = platform.init_uart(config)?;
                peripherals
                    .uarts
                    .push((config.instance, handle))
                    .map_err(|_| PlanError::CapacityExceeded)?;
                info!("{} up at {} baud", config.instance, config.baudrate);
            }
            Step::InitI2c(config) => {
                let handle = platform.init_i2c(config)?;
                peripherals
                    .i2cs
                    .push((config.instance, handle))
                    .map_err(|_| PlanError::CapacityExceeded)?;
                info!("{} up at {} Hz", config.instance, config.clock_speed);
            }
            Step::InitTimer(config) => {
                let handle = platform.init_timer(config)?;
                peripherals
                    .timers
                    .push((config.instance, handle))
                    .map_err(|_| PlanError::CapacityExceeded)?;
                info!(
                    "{} up, divider {} counts {}",
                    config.instance,
                    config.divider(),
                    config.counts()
                );
            }
        }
    }

    Ok(peripherals)
}

/// Bring up a board, returning the first error
///
/// The plan is built and checked before any hardware is touched.
pub fn try_bring_up<P: Platform>(
    board: &BoardManifest<'_>,
    platform: &mut P,
) -> Result<Peripherals<P>, BringUpError> {
    let plan = StartupPlan::from_manifest(board)?;
    plan.check()?;

    info!("bringing up {} ({} steps)", board.name, plan.len());
    execute(&plan, platform)
}

/// Bring up a board, diverting any error to `fatal`
pub fn bring_up_board<P: Platform, F: FatalHandler>(
    board: &BoardManifest<'_>,
    platform: &mut P,
    fatal: &mut F,
) -> Peripherals<P> {
    match try_bring_up(board, platform) {
        Ok(peripherals) => {
            info!("bring-up complete, {} peripherals", peripherals.len());
            peripherals
        }
        Err(e) => {
            error!("bring-up failed: {}", e);
            fatal.fatal(e)
        }
    }
}

/// Bring up the STM32F4-Discovery peripherals
///
/// Call exactly once, early in `main`, before anything touches the
/// peripherals.
pub fn bring_up<P: Platform, F: FatalHandler>(platform: &mut P, fatal: &mut F) -> Peripherals<P> {
    bring_up_board(&STM32F4_DISCOVERY, platform, fatal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use primer_hal::error::{InitCause, PeripheralId};
    use primer_hal::gpio::{GpioControl, PinConfig, Port};
    use primer_hal::i2c::{I2cConfig, I2cInit};
    use primer_hal::timer::{TimerConfig, TimerInit};
    use primer_hal::uart::{UartConfig, UartInit};

    /// Platform that accepts everything and counts calls
    #[derive(Default)]
    struct Counting {
        clocks: usize,
        pins: usize,
        peripherals: usize,
    }

    impl GpioControl for Counting {
        fn enable_port_clock(&mut self, _port: Port) {
            self.clocks += 1;
        }

        fn configure_pin(&mut self, _config: &PinConfig) {
            self.pins += 1;
        }
    }

    impl UartInit for Counting {
        type Uart = UartInstance;

        fn init_uart(&mut self, config: &UartConfig) -> Result<UartInstance, InitError> {
            self.peripherals += 1;
            Ok(config.instance)
        }
    }

    impl I2cInit for Counting {
        type I2c = I2cInstance;

        fn init_i2c(&mut self, config: &I2cConfig) -> Result<I2cInstance, InitError> {
            self.peripherals += 1;
            Ok(config.instance)
        }
    }

    impl TimerInit for Counting {
        type Timer = TimerInstance;

        fn init_timer(&mut self, config: &TimerConfig) -> Result<TimerInstance, InitError> {
            self.peripherals += 1;
            if config.instance == TimerInstance::Tim5 {
                return Err(InitError::not_responding(PeripheralId::Timer(
                    config.instance,
                )));
            }
            Ok(config.instance)
        }
    }

    #[test]
    fn test_discovery_handles() {
        let mut platform = Counting::default();
        let mut p = try_bring_up(&STM32F4_DISCOVERY, &mut platform).unwrap();

        assert_eq!(platform.clocks, 3);
        assert_eq!(platform.pins, 6);
        assert_eq!(platform.peripherals, 4);
        assert_eq!(p.len(), 4);

        assert_eq!(p.uart(UartInstance::Usart1), Some(&mut UartInstance::Usart1));
        assert_eq!(p.i2c(I2cInstance::I2c1), Some(&mut I2cInstance::I2c1));
        assert_eq!(p.timer(TimerInstance::Tim2), Some(&mut TimerInstance::Tim2));
        assert_eq!(p.timer(TimerInstance::Tim3), Some(&mut TimerInstance::Tim3));
        assert_eq!(p.uart(UartInstance::Usart2), None);
        assert_eq!(p.timer(TimerInstance::Tim4), None);
    }

    #[test]
    fn test_take_handle() {
        let mut platform = Counting::default();
        let mut p = try_bring_up(&STM32F4_DISCOVERY, &mut platform).unwrap();

        assert_eq!(p.take_timer(TimerInstance::Tim2), Some(TimerInstance::Tim2));
        assert_eq!(p.take_timer(TimerInstance::Tim2), None);
        assert_eq!(p.timer(TimerInstance::Tim3), Some(&mut TimerInstance::Tim3));
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_init_error_stops_run() {
        let timers = [TimerConfig::from_divider(TimerInstance::Tim5, 1, 10, 1_000)];
        let board = BoardManifest {
            timers: &timers,
            ..STM32F4_DISCOVERY
        };

        let mut platform = Counting::default();
        let err = try_bring_up(&board, &mut platform).err();
        assert_eq!(
            err,
            Some(BringUpError::Init(InitError {
                peripheral: PeripheralId::Timer(TimerInstance::Tim5),
                cause: InitCause::NotResponding,
            }))
        );
    }

    #[test]
    fn test_plan_error_touches_nothing() {
        // USART1 enabled but its pins are missing from the table
        let board = BoardManifest {
            pins: &[],
            ..STM32F4_DISCOVERY
        };

        let mut platform = Counting::default();
        let err = try_bring_up(&board, &mut platform).err();
        assert!(matches!(
            err,
            Some(BringUpError::Plan(PlanError::Unsatisfied { step: 0, .. }))
        ));
        assert_eq!(platform.clocks + platform.pins + platform.peripherals, 0);
    }
}
