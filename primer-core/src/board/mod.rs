//! Board manifest
//!
//! The complete peripheral table of a board: which pins are used and how,
//! and which serial, I2C and timer instances are brought up. Table order is
//! bring-up order.

pub mod discovery;
pub mod validate;

use core::fmt;

use heapless::Vec;
use primer_hal::gpio::{PinConfig, PinId, Port};
use primer_hal::i2c::I2cConfig;
use primer_hal::timer::TimerConfig;
use primer_hal::uart::UartConfig;

pub use discovery::STM32F4_DISCOVERY;
pub use validate::{ManifestError, ManifestWarning, MAX_MANIFEST_ERRORS, MAX_MANIFEST_WARNINGS};

/// Maximum number of GPIO ports on supported chips
pub const MAX_PORTS: usize = 9;

/// Complete board bring-up table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardManifest<'a> {
    /// Board name
    pub name: &'a str,
    /// Microcontroller part number
    pub mcu: &'a str,
    /// System clock the table was written for, in Hz
    pub sysclk_hz: u32,
    /// Pin table, in configuration order
    pub pins: &'a [PinConfig],
    /// Serial ports, in bring-up order
    pub uarts: &'a [UartConfig],
    /// I2C controllers, in bring-up order
    pub i2cs: &'a [I2cConfig],
    /// Timers, in bring-up order
    pub timers: &'a [TimerConfig],
}

impl<'a> BoardManifest<'a> {
    /// Find the table entry for a pin
    pub fn find_pin(&self, pin: PinId) -> Option<&'a PinConfig> {
        self.pins.iter().find(|p| p.pin == pin)
    }

    /// Ports in the order their clocks are first needed
    pub fn port_clock_order(&self) -> Vec<Port, MAX_PORTS> {
        let mut ports: Vec<Port, MAX_PORTS> = Vec::new();
        for pin in self.pins {
            if !ports.contains(&pin.pin.port) {
                // Port enum has MAX_PORTS variants, so this cannot overflow
                let _ = ports.push(pin.pin.port);
            }
        }
        ports
    }

    /// Serial ports that will be brought up
    pub fn enabled_uarts(&self) -> impl Iterator<Item = &'a UartConfig> {
        self.uarts.iter().filter(|u| u.enabled)
    }

    /// I2C controllers that will be brought up
    pub fn enabled_i2cs(&self) -> impl Iterator<Item = &'a I2cConfig> {
        self.i2cs.iter().filter(|i| i.enabled)
    }

    /// Timers that will be brought up
    pub fn enabled_timers(&self) -> impl Iterator<Item = &'a TimerConfig> {
        self.timers.iter().filter(|t| t.enabled)
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Human-readable summary of the whole table
impl fmt::Display for BoardManifest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- board summary ---")?;
        writeln!(f, "board     : {}", self.name)?;
        writeln!(f, "mcu       : {}", self.mcu)?;
        writeln!(f, "sysclock  : {} hz", self.sysclk_hz)?;

        writeln!(f)?;
        writeln!(f, "gpio pins ({})", self.pins.len())?;
        for p in self.pins {
            writeln!(
                f,
                "  {:<5} | pull: {:<9} | speed: {:<9} | mode: {}",
                p.pin,
                p.pull.name(),
                p.speed.name(),
                p.mode
            )?;
        }

        if !self.uarts.is_empty() {
            writeln!(f)?;
            writeln!(f, "uart ({})", self.uarts.len())?;
            for u in self.uarts {
                writeln!(
                    f,
                    "  {}: {}, baud {}, parity {}, tx {}, rx {}",
                    u.instance.name(),
                    on_off(u.enabled),
                    u.baudrate,
                    u.parity.name(),
                    u.tx_pin,
                    u.rx_pin
                )?;
            }
        }

        if !self.i2cs.is_empty() {
            writeln!(f)?;
            writeln!(f, "i2c ({})", self.i2cs.len())?;
            for i in self.i2cs {
                writeln!(
                    f,
                    "  {}: {}, speed {} hz, scl {}, sda {}",
                    i.instance.name(),
                    on_off(i.enabled),
                    i.clock_speed,
                    i.scl_pin,
                    i.sda_pin
                )?;
            }
        }

        if !self.timers.is_empty() {
            writeln!(f)?;
            writeln!(f, "timers ({})", self.timers.len())?;
            for t in self.timers {
                writeln!(
                    f,
                    "  {}: {}, presc {}, period {}, clock {} hz",
                    t.instance.name(),
                    on_off(t.enabled),
                    t.divider(),
                    t.counts(),
                    t.assumed_clock_hz
                )?;
            }
        }

        writeln!(f, "--- end summary ---")
    }
}
