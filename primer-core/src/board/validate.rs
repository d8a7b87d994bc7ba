//! Manifest validation
//!
//! Checks a board table for mistakes that would otherwise only show up as a
//! dead peripheral on the bench. Every problem is reported, not just the
//! first one.
//!
//! Warnings cover tables the hardware accepts but applies differently from
//! what is written; bring-up still runs them.

use core::fmt;

use heapless::Vec;
use primer_hal::error::PeripheralId;
use primer_hal::gpio::{PinId, Signal};
use primer_hal::i2c::I2cInstance;
use primer_hal::timer::TimerInstance;
use primer_hal::uart::UartInstance;

use super::BoardManifest;

/// Maximum number of errors collected; later errors are dropped
pub const MAX_MANIFEST_ERRORS: usize = 16;

/// Maximum number of warnings collected
pub const MAX_MANIFEST_WARNINGS: usize = 8;

/// A problem found in a board table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ManifestError {
    /// Pin number outside 0-15
    InvalidPin(PinId),
    /// Pin appears more than once in the pin table
    DuplicatePin(PinId),
    /// Peripheral instance listed more than once
    DuplicateInstance(PeripheralId),
    /// Serial port with a zero baud rate
    ZeroBaudRate(UartInstance),
    /// I2C controller with a zero clock speed
    ZeroClockSpeed(I2cInstance),
    /// Own address does not fit the addressing mode
    OwnAddressOutOfRange(I2cInstance),
    /// Auto-reload of zero (a single count) blocks the counter
    ZeroPeriod(TimerInstance),
    /// Auto-reload does not fit a 16-bit counter
    PeriodTooWide(TimerInstance),
    /// Peripheral signal pin is not in the pin table
    MissingSignalPin { pin: PinId, signal: Signal },
    /// Pin is in the table but not routed to the expected signal
    SignalMismatch { pin: PinId, signal: Signal },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::InvalidPin(pin) => write!(f, "{} pin number out of range", pin),
            ManifestError::DuplicatePin(pin) => write!(f, "duplicate pin {}", pin),
            ManifestError::DuplicateInstance(id) => write!(f, "duplicate instance {}", id),
            ManifestError::ZeroBaudRate(u) => write!(f, "{} invalid baudrate", u.name()),
            ManifestError::ZeroClockSpeed(i) => write!(f, "{} invalid speed", i.name()),
            ManifestError::OwnAddressOutOfRange(i) => {
                write!(f, "{} own address does not fit addressing mode", i.name())
            }
            ManifestError::ZeroPeriod(t) => {
                write!(f, "{} invalid period (needs at least 2 counts)", t.name())
            }
            ManifestError::PeriodTooWide(t) => {
                write!(f, "{} period exceeds the 16-bit counter", t.name())
            }
            ManifestError::MissingSignalPin { pin, signal } => {
                write!(f, "{} needs {} but it is not in the pin table", signal.name(), pin)
            }
            ManifestError::SignalMismatch { pin, signal } => {
                write!(f, "{} must be alternate function {}", pin, signal.name())
            }
        }
    }
}

/// A table entry the hardware applies differently from how it is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ManifestWarning {
    /// Prescaler wider than PSC; the register keeps the low 16 bits
    PrescalerTruncated {
        timer: TimerInstance,
        prescaler: u32,
        register: u16,
    },
}

impl fmt::Display for ManifestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestWarning::PrescalerTruncated {
                timer,
                prescaler,
                register,
            } => write!(
                f,
                "{} prescaler {} exceeds the 16-bit PSC register, hardware keeps {} (divide by {})",
                timer.name(),
                prescaler,
                register,
                u32::from(*register) + 1
            ),
        }
    }
}

/// Error collector that keeps the first `MAX_MANIFEST_ERRORS`
struct Errors(Vec<ManifestError, MAX_MANIFEST_ERRORS>);

impl Errors {
    fn push(&mut self, error: ManifestError) {
        // Overflow drops the error; the first ones are the useful ones
        let _ = self.0.push(error);
    }
}

impl BoardManifest<'_> {
    /// Validate the whole table
    ///
    /// Disabled peripherals are only checked for duplicates.
    pub fn validate(&self) -> Result<(), Vec<ManifestError, MAX_MANIFEST_ERRORS>> {
        let mut errors = Errors(Vec::new());

        self.validate_pins(&mut errors);
        self.validate_uarts(&mut errors);
        self.validate_i2cs(&mut errors);
        self.validate_timers(&mut errors);

        if errors.0.is_empty() {
            Ok(())
        } else {
            Err(errors.0)
        }
    }

    /// Entries that bring up but not as written
    ///
    /// Only enabled peripherals are considered.
    pub fn warnings(&self) -> Vec<ManifestWarning, MAX_MANIFEST_WARNINGS> {
        let mut warnings = Vec::new();
        for timer in self.enabled_timers() {
            if !timer.prescaler_fits() {
                // Overflow drops the warning, as for errors
                let _ = warnings.push(ManifestWarning::PrescalerTruncated {
                    timer: timer.instance,
                    prescaler: timer.prescaler,
                    register: timer.prescaler_register(),
                });
            }
        }
        warnings
    }

    fn validate_pins(&self, errors: &mut Errors) {
        for (idx, pin) in self.pins.iter().enumerate() {
            if !pin.pin.is_valid() {
                errors.push(ManifestError::InvalidPin(pin.pin));
            }
            if self.pins[..idx].iter().any(|p| p.pin == pin.pin) {
                errors.push(ManifestError::DuplicatePin(pin.pin));
            }
        }
    }

    /// Check that `pin` is routed to `signal`
    fn validate_signal_pin(&self, pin: PinId, signal: Signal, errors: &mut Errors) {
        match self.find_pin(pin) {
            None => errors.push(ManifestError::MissingSignalPin { pin, signal }),
            Some(config) if !config.carries(signal) => {
                errors.push(ManifestError::SignalMismatch { pin, signal })
            }
            Some(_) => {}
        }
    }

    fn validate_uarts(&self, errors: &mut Errors) {
        for (idx, uart) in self.uarts.iter().enumerate() {
            if self.uarts[..idx].iter().any(|u| u.instance == uart.instance) {
                errors.push(ManifestError::DuplicateInstance(PeripheralId::Uart(
                    uart.instance,
                )));
            }
            if !uart.enabled {
                continue;
            }
            if uart.baudrate == 0 {
                errors.push(ManifestError::ZeroBaudRate(uart.instance));
            }
            if uart.direction.has_tx() {
                self.validate_signal_pin(uart.tx_pin, Signal::UartTx(uart.instance), errors);
            }
            if uart.direction.has_rx() {
                self.validate_signal_pin(uart.rx_pin, Signal::UartRx(uart.instance), errors);
            }
        }
    }

    fn validate_i2cs(&self, errors: &mut Errors) {
        for (idx, i2c) in self.i2cs.iter().enumerate() {
            if self.i2cs[..idx].iter().any(|i| i.instance == i2c.instance) {
                errors.push(ManifestError::DuplicateInstance(PeripheralId::I2c(i2c.instance)));
            }
            if !i2c.enabled {
                continue;
            }
            if i2c.clock_speed == 0 {
                errors.push(ManifestError::ZeroClockSpeed(i2c.instance));
            }
            if !i2c.own_address_fits() {
                errors.push(ManifestError::OwnAddressOutOfRange(i2c.instance));
            }
            self.validate_signal_pin(i2c.scl_pin, Signal::I2cScl(i2c.instance), errors);
            self.validate_signal_pin(i2c.sda_pin, Signal::I2cSda(i2c.instance), errors);
        }
    }

    fn validate_timers(&self, errors: &mut Errors) {
        for (idx, timer) in self.timers.iter().enumerate() {
            if self.timers[..idx].iter().any(|t| t.instance == timer.instance) {
                errors.push(ManifestError::DuplicateInstance(PeripheralId::Timer(
                    timer.instance,
                )));
            }
            if !timer.enabled {
                continue;
            }
            if timer.period == 0 {
                errors.push(ManifestError::ZeroPeriod(timer.instance));
            }
            if !timer.instance.is_32bit() && timer.period > u32::from(u16::MAX) {
                errors.push(ManifestError::PeriodTooWide(timer.instance));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::STM32F4_DISCOVERY;
    use primer_hal::gpio::{PinConfig, Port};

    #[test]
    fn test_discovery_is_valid() {
        assert!(STM32F4_DISCOVERY.validate().is_ok());
    }

    #[test]
    fn test_discovery_tim2_prescaler_warning() {
        let warnings = STM32F4_DISCOVERY.warnings();
        assert_eq!(
            warnings.as_slice(),
            &[ManifestWarning::PrescalerTruncated {
                timer: TimerInstance::Tim2,
                prescaler: 83_999,
                register: 18_463,
            }]
        );

        let mut out: heapless::String<128> = heapless::String::new();
        core::fmt::Write::write_fmt(&mut out, format_args!("{}", warnings[0])).unwrap();
        assert_eq!(
            out.as_str(),
            "TIM2 prescaler 83999 exceeds the 16-bit PSC register, hardware keeps 18463 (divide by 18464)"
        );
    }

    #[test]
    fn test_disabled_timer_has_no_warning() {
        let mut timers = [STM32F4_DISCOVERY.timers[0]];
        timers[0].enabled = false;
        let board = BoardManifest {
            timers: &timers,
            ..STM32F4_DISCOVERY
        };
        assert!(board.warnings().is_empty());
    }

    #[test]
    fn test_period_width() {
        let mut timers = [
            primer_hal::timer::TimerConfig::from_divider(TimerInstance::Tim3, 1, 70_000, 84_000_000),
            primer_hal::timer::TimerConfig::from_divider(TimerInstance::Tim5, 1, 70_000, 84_000_000),
        ];
        let board = BoardManifest {
            timers: &timers,
            ..STM32F4_DISCOVERY
        };
        let errors = board.validate().unwrap_err();
        assert_eq!(
            errors.as_slice(),
            &[ManifestError::PeriodTooWide(TimerInstance::Tim3)]
        );

        // A single count leaves the auto-reload at zero
        timers[0] = primer_hal::timer::TimerConfig::from_divider(TimerInstance::Tim3, 1, 1, 84_000_000);
        let board = BoardManifest {
            timers: &timers,
            ..STM32F4_DISCOVERY
        };
        let errors = board.validate().unwrap_err();
        assert_eq!(errors.as_slice(), &[ManifestError::ZeroPeriod(TimerInstance::Tim3)]);
    }

    #[test]
    fn test_duplicate_pin() {
        let mut pins = [STM32F4_DISCOVERY.pins[0]; 2];
        pins[1].pull = primer_hal::gpio::Pull::Down;
        let board = BoardManifest {
            pins: &pins,
            uarts: &[],
            i2cs: &[],
            ..STM32F4_DISCOVERY
        };

        let errors = board.validate().unwrap_err();
        assert_eq!(
            errors.as_slice(),
            &[ManifestError::DuplicatePin(PinId::new(Port::A, 0))]
        );
    }

    #[test]
    fn test_signal_pin_checks() {
        // PA10 demoted to a plain input, PA9 missing entirely
        let pins = [PinConfig::input(PinId::new(Port::A, 10))];
        let board = BoardManifest {
            pins: &pins,
            i2cs: &[],
            ..STM32F4_DISCOVERY
        };

        let errors = board.validate().unwrap_err();
        assert_eq!(
            errors.as_slice(),
            &[
                ManifestError::MissingSignalPin {
                    pin: PinId::new(Port::A, 9),
                    signal: Signal::UartTx(UartInstance::Usart1),
                },
                ManifestError::SignalMismatch {
                    pin: PinId::new(Port::A, 10),
                    signal: Signal::UartRx(UartInstance::Usart1),
                },
            ]
        );
    }

    #[test]
    fn test_swapped_i2c_pins() {
        let mut i2cs = [STM32F4_DISCOVERY.i2cs[0]];
        core::mem::swap(&mut i2cs[0].scl_pin, &mut i2cs[0].sda_pin);
        let board = BoardManifest {
            i2cs: &i2cs,
            ..STM32F4_DISCOVERY
        };

        let errors = board.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ManifestError::SignalMismatch { .. })));
    }

    #[test]
    fn test_zero_values() {
        let mut uarts = [STM32F4_DISCOVERY.uarts[0]];
        uarts[0].baudrate = 0;
        let mut i2cs = [STM32F4_DISCOVERY.i2cs[0]];
        i2cs[0].clock_speed = 0;
        let mut timers = [STM32F4_DISCOVERY.timers[0]];
        timers[0].period = 0;

        let board = BoardManifest {
            uarts: &uarts,
            i2cs: &i2cs,
            timers: &timers,
            ..STM32F4_DISCOVERY
        };

        let errors = board.validate().unwrap_err();
        assert!(errors.contains(&ManifestError::ZeroBaudRate(UartInstance::Usart1)));
        assert!(errors.contains(&ManifestError::ZeroClockSpeed(I2cInstance::I2c1)));
        assert!(errors.contains(&ManifestError::ZeroPeriod(TimerInstance::Tim2)));
    }

    #[test]
    fn test_disabled_peripheral_skips_checks() {
        let mut uarts = [STM32F4_DISCOVERY.uarts[0]];
        uarts[0].baudrate = 0;
        uarts[0].enabled = false;
        let board = BoardManifest {
            uarts: &uarts,
            ..STM32F4_DISCOVERY
        };
        assert!(board.validate().is_ok());
    }

    #[test]
    fn test_duplicate_instance() {
        let timers = [STM32F4_DISCOVERY.timers[1]; 2];
        let board = BoardManifest {
            timers: &timers,
            ..STM32F4_DISCOVERY
        };

        let errors = board.validate().unwrap_err();
        assert_eq!(
            errors.as_slice(),
            &[ManifestError::DuplicateInstance(PeripheralId::Timer(
                TimerInstance::Tim3
            ))]
        );
    }
}
