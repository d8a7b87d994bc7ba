//! Rust board table generation
//!
//! Renders [`BoardTables`] as a source file holding a `BOARD` manifest
//! constant, ready to be included by firmware. Register values are written
//! as stored (divider and count minus one).

use std::fmt;

use primer_hal::gpio::{PinConfig, PinId, PinMode, Signal};
use primer_hal::i2c::I2cConfig;
use primer_hal::timer::TimerConfig;
use primer_hal::uart::UartConfig;

use crate::board_file::BoardTables;

/// Generated source for a board table
pub struct RustSource<'a> {
    tables: &'a BoardTables,
    origin: &'a str,
}

impl<'a> RustSource<'a> {
    /// `origin` names the description file in the header comment
    pub fn new(tables: &'a BoardTables, origin: &'a str) -> Self {
        Self { tables, origin }
    }
}

fn signal(s: Signal) -> String {
    match s {
        Signal::UartTx(u) => format!("Signal::UartTx(UartInstance::{:?})", u),
        Signal::UartRx(u) => format!("Signal::UartRx(UartInstance::{:?})", u),
        Signal::I2cScl(i) => format!("Signal::I2cScl(I2cInstance::{:?})", i),
        Signal::I2cSda(i) => format!("Signal::I2cSda(I2cInstance::{:?})", i),
    }
}

fn mode(m: PinMode) -> String {
    match m {
        PinMode::Alternate(s) => format!("PinMode::Alternate({})", signal(s)),
        other => format!("PinMode::{:?}", other),
    }
}

fn pin_id(pin: PinId) -> String {
    format!("PinId::new(Port::{:?}, {})", pin.port, pin.number)
}

fn write_pin(f: &mut fmt::Formatter<'_>, pin: &PinConfig, comment: Option<&str>) -> fmt::Result {
    match comment.and_then(|c| c.lines().next()) {
        Some(text) => writeln!(f, "    // {}: {}", pin.pin, text)?,
        None => writeln!(f, "    // {}", pin.pin)?,
    }
    writeln!(f, "    PinConfig {{")?;
    writeln!(f, "        pin: {},", pin_id(pin.pin))?;
    writeln!(f, "        mode: {},", mode(pin.mode))?;
    writeln!(f, "        pull: Pull::{:?},", pin.pull)?;
    writeln!(f, "        speed: Speed::{:?},", pin.speed)?;
    writeln!(f, "    }},")
}

fn write_uart(f: &mut fmt::Formatter<'_>, uart: &UartConfig) -> fmt::Result {
    writeln!(f, "    UartConfig {{")?;
    writeln!(f, "        instance: UartInstance::{:?},", uart.instance)?;
    writeln!(f, "        tx_pin: {},", pin_id(uart.tx_pin))?;
    writeln!(f, "        rx_pin: {},", pin_id(uart.rx_pin))?;
    writeln!(f, "        baudrate: {},", uart.baudrate)?;
    writeln!(f, "        word_length: WordLength::{:?},", uart.word_length)?;
    writeln!(f, "        parity: Parity::{:?},", uart.parity)?;
    writeln!(f, "        stop_bits: StopBits::{:?},", uart.stop_bits)?;
    writeln!(f, "        direction: Direction::{:?},", uart.direction)?;
    writeln!(f, "        flow_control: FlowControl::{:?},", uart.flow_control)?;
    writeln!(f, "        oversampling: Oversampling::{:?},", uart.oversampling)?;
    writeln!(f, "        enabled: {},", uart.enabled)?;
    writeln!(f, "    }},")
}

fn write_i2c(f: &mut fmt::Formatter<'_>, i2c: &I2cConfig) -> fmt::Result {
    writeln!(f, "    I2cConfig {{")?;
    writeln!(f, "        instance: I2cInstance::{:?},", i2c.instance)?;
    writeln!(f, "        scl_pin: {},", pin_id(i2c.scl_pin))?;
    writeln!(f, "        sda_pin: {},", pin_id(i2c.sda_pin))?;
    writeln!(f, "        clock_speed: {},", i2c.clock_speed)?;
    writeln!(f, "        duty_cycle: DutyCycle::{:?},", i2c.duty_cycle)?;
    writeln!(f, "        own_address1: {:#x},", i2c.own_address1)?;
    writeln!(f, "        addressing_mode: AddressingMode::{:?},", i2c.addressing_mode)?;
    writeln!(f, "        dual_address: DualAddress::{:?},", i2c.dual_address)?;
    writeln!(f, "        own_address2: {:#x},", i2c.own_address2)?;
    writeln!(f, "        general_call: GeneralCall::{:?},", i2c.general_call)?;
    writeln!(f, "        no_stretch: NoStretch::{:?},", i2c.no_stretch)?;
    writeln!(f, "        enabled: {},", i2c.enabled)?;
    writeln!(f, "    }},")
}

fn write_timer(f: &mut fmt::Formatter<'_>, timer: &TimerConfig) -> fmt::Result {
    writeln!(f, "    TimerConfig {{")?;
    writeln!(f, "        instance: TimerInstance::{:?},", timer.instance)?;
    writeln!(f, "        prescaler: {},", timer.prescaler)?;
    writeln!(f, "        counter_mode: CounterMode::{:?},", timer.counter_mode)?;
    writeln!(f, "        period: {},", timer.period)?;
    writeln!(f, "        clock_division: ClockDivision::{:?},", timer.clock_division)?;
    writeln!(f, "        assumed_clock_hz: {},", timer.assumed_clock_hz)?;
    writeln!(f, "        enabled: {},", timer.enabled)?;
    writeln!(f, "    }},")
}

/// Emit `const NAME: [Ty; N] = [ ... ];`
fn write_table<T>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    ty: &str,
    items: &[T],
    mut item: impl FnMut(&mut fmt::Formatter<'_>, usize, &T) -> fmt::Result,
) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "const {}: [{}; {}] = [", name, ty, items.len())?;
    for (idx, entry) in items.iter().enumerate() {
        item(f, idx, entry)?;
    }
    writeln!(f, "];")
}

impl fmt::Display for RustSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.tables;

        writeln!(f, "// Generated by primer-manifest from {}.", self.origin)?;
        writeln!(f, "// Do not edit; regenerate from the board description.")?;
        writeln!(f)?;
        writeln!(f, "#[allow(unused_imports)]")?;
        writeln!(f, "use primer_hal::gpio::{{PinConfig, PinId, PinMode, Port, Pull, Signal, Speed}};")?;
        writeln!(f, "#[allow(unused_imports)]")?;
        writeln!(f, "use primer_hal::i2c::{{AddressingMode, DualAddress, DutyCycle, GeneralCall, I2cConfig, I2cInstance, NoStretch}};")?;
        writeln!(f, "#[allow(unused_imports)]")?;
        writeln!(f, "use primer_hal::timer::{{ClockDivision, CounterMode, TimerConfig, TimerInstance}};")?;
        writeln!(f, "#[allow(unused_imports)]")?;
        writeln!(f, "use primer_hal::uart::{{Direction, FlowControl, Oversampling, Parity, StopBits, UartConfig, UartInstance, WordLength}};")?;

        write_table(f, "PINS", "PinConfig", &t.pins, |f, idx, pin| {
            let comment = t.pin_comments.get(idx).and_then(|c| c.as_deref());
            write_pin(f, pin, comment)
        })?;
        write_table(f, "UARTS", "UartConfig", &t.uarts, |f, _, u| write_uart(f, u))?;
        write_table(f, "I2CS", "I2cConfig", &t.i2cs, |f, _, i| write_i2c(f, i))?;
        write_table(f, "TIMERS", "TimerConfig", &t.timers, |f, _, tm| write_timer(f, tm))?;

        writeln!(f)?;
        writeln!(f, "pub const BOARD: primer_core::BoardManifest<'static> = primer_core::BoardManifest {{")?;
        writeln!(f, "    name: {:?},", t.name)?;
        writeln!(f, "    mcu: {:?},", t.mcu)?;
        writeln!(f, "    sysclk_hz: {},", t.sysclk_hz)?;
        writeln!(f, "    pins: &PINS,")?;
        writeln!(f, "    uarts: &UARTS,")?;
        writeln!(f, "    i2cs: &I2CS,")?;
        writeln!(f, "    timers: &TIMERS,")?;
        writeln!(f, "}};")
    }
}

/// Render to a string
pub fn render(tables: &BoardTables, origin: &str) -> String {
    RustSource::new(tables, origin).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_file::BoardFile;

    const BOARD: &str = r#"
        [board]
        name = "bench"
        mcu = "STM32F407VG"
        clock_freq = 168000000

        [[gpio.pins]]
        pin = "PD12"
        direction = "output"
        comment = "green LED"

        [[gpio.pins]]
        pin = "PB6"
        alt_function = "i2c1_scl"

        [[gpio.pins]]
        pin = "PB7"
        alt_function = "i2c1_sda"

        [[communication.i2c]]
        instance = "I2C1"
        speed = 400000
        scl_pin = "PB6"
        sda_pin = "PB7"

        [[timers]]
        instance = "TIM3"
        prescaler = 168
        period = 1000
    "#;

    fn rendered() -> String {
        let tables = BoardFile::parse(BOARD).unwrap().to_tables().unwrap();
        render(&tables, "bench.toml")
    }

    #[test]
    fn test_header_names_origin() {
        assert!(rendered().starts_with("// Generated by primer-manifest from bench.toml."));
    }

    #[test]
    fn test_pin_entries() {
        let out = rendered();
        assert!(out.contains("const PINS: [PinConfig; 3] = ["));
        assert!(out.contains("    // PD12: green LED\n"));
        assert!(out.contains("    // PB6\n"));
        assert!(out.contains("pin: PinId::new(Port::D, 12),"));
        assert!(out.contains("mode: PinMode::OutputPushPull,"));
        assert!(out.contains("mode: PinMode::Alternate(Signal::I2cScl(I2cInstance::I2c1)),"));
    }

    #[test]
    fn test_register_values() {
        let out = rendered();
        assert!(out.contains("prescaler: 167,"));
        assert!(out.contains("period: 999,"));
        assert!(out.contains("clock_speed: 400000,"));
    }

    #[test]
    fn test_empty_tables() {
        let out = rendered();
        assert!(out.contains("const UARTS: [UartConfig; 0] = [\n];"));
        assert!(out.contains("pub const BOARD: primer_core::BoardManifest<'static>"));
        assert!(out.contains("    name: \"bench\","));
    }
}
