//! Board description files
//!
//! The TOML schema, default filling, and conversion into the descriptor
//! tables the bring-up sequencer consumes. Problems are collected rather
//! than reported one at a time, so a single run lists everything wrong
//! with a file.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use primer_core::BoardManifest;
use primer_hal::gpio::{PinConfig, PinId, PinMode, Pull, Signal, Speed};
use primer_hal::i2c::{I2cConfig, I2cInstance, STANDARD_MODE_HZ};
use primer_hal::timer::{TimerConfig, TimerInstance};
use primer_hal::uart::{Parity, StopBits, UartConfig, UartInstance, WordLength};

/// Pin direction when none is given
pub const DEFAULT_DIRECTION: &str = "input";
/// Pull setting when none is given
pub const DEFAULT_PULL: &str = "none";
/// Output speed when none is given
pub const DEFAULT_SPEED: &str = "medium";
/// Serial parity when none is given
pub const DEFAULT_PARITY: &str = "none";
/// Serial stop bits when none are given
pub const DEFAULT_STOP_BITS: u8 = 1;
/// Serial data bits when none are given
pub const DEFAULT_DATA_BITS: u8 = 8;
/// Timer mode when none is given
pub const DEFAULT_TIMER_MODE: &str = "timer";

/// Whole board description
#[derive(Debug, Clone, Deserialize)]
pub struct BoardFile {
    pub board: BoardSection,
    #[serde(default)]
    pub gpio: GpioSection,
    #[serde(default)]
    pub communication: CommunicationSection,
    #[serde(default)]
    pub timers: Vec<TimerEntry>,
}

/// `[board]`
#[derive(Debug, Clone, Deserialize)]
pub struct BoardSection {
    pub name: String,
    pub mcu: String,
    /// System clock in Hz
    pub clock_freq: u32,
}

/// `[gpio]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GpioSection {
    #[serde(default)]
    pub pins: Vec<PinEntry>,
}

/// `[[gpio.pins]]`
#[derive(Debug, Clone, Deserialize)]
pub struct PinEntry {
    /// Pin name, e.g. "PA9"
    pub pin: String,
    /// `input`, `output` or `output_open_drain`
    pub direction: Option<String>,
    /// `none`, `pull_up` or `pull_down`
    pub pull: Option<String>,
    /// `low`, `medium`, `high` or `very_high`
    pub speed: Option<String>,
    /// Peripheral signal, e.g. "usart1_tx"; makes the pin alternate-function
    pub alt_function: Option<String>,
    pub comment: Option<String>,
}

/// `[communication]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommunicationSection {
    #[serde(default)]
    pub uart: Vec<UartEntry>,
    #[serde(default)]
    pub i2c: Vec<I2cEntry>,
}

/// `[[communication.uart]]`
#[derive(Debug, Clone, Deserialize)]
pub struct UartEntry {
    pub instance: String,
    pub baudrate: u32,
    pub tx_pin: String,
    pub rx_pin: String,
    pub parity: Option<String>,
    pub stop_bits: Option<u8>,
    pub data_bits: Option<u8>,
    pub enabled: Option<bool>,
}

/// `[[communication.i2c]]`
#[derive(Debug, Clone, Deserialize)]
pub struct I2cEntry {
    pub instance: String,
    /// Bus clock in Hz
    pub speed: Option<u32>,
    pub scl_pin: String,
    pub sda_pin: String,
    pub enabled: Option<bool>,
}

/// `[[timers]]`
#[derive(Debug, Clone, Deserialize)]
pub struct TimerEntry {
    pub instance: String,
    /// Clock divider (register value plus one)
    pub prescaler: u32,
    /// Counts per update (register value plus one)
    pub period: u32,
    /// Timer input clock the values were chosen for
    pub clock_hz: Option<u32>,
    /// Only `timer` (free-running base timer) is supported
    pub mode: Option<String>,
    pub enabled: Option<bool>,
}

/// Everything wrong with a board description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issues(pub Vec<String>);

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration validation failed")?;
        for issue in &self.0 {
            write!(f, "\n - {}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for Issues {}

/// Fill an unset value, logging what was chosen
fn fill<T: fmt::Display>(slot: &mut Option<T>, default: T, key: &str, owner: &str) -> usize {
    if slot.is_some() {
        return 0;
    }
    info!("applied default {}='{}' to {}", key, default, owner);
    *slot = Some(default);
    1
}

impl BoardFile {
    /// Parse a board description
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid board description")
    }

    /// Read and parse a board description file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("config file not found {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("error parsing {}", path.display()))
    }

    /// Fill every missing optional value with its default
    ///
    /// Returns the number of values filled in.
    pub fn apply_defaults(&mut self) -> usize {
        let mut applied = 0;
        let clock_freq = self.board.clock_freq;

        for pin in &mut self.gpio.pins {
            let owner = format!("pin {}", pin.pin);
            applied += fill(&mut pin.pull, DEFAULT_PULL.to_string(), "pull", &owner);
            applied += fill(&mut pin.speed, DEFAULT_SPEED.to_string(), "speed", &owner);
            applied += fill(
                &mut pin.direction,
                DEFAULT_DIRECTION.to_string(),
                "direction",
                &owner,
            );
        }

        for uart in &mut self.communication.uart {
            let owner = uart.instance.clone();
            applied += fill(&mut uart.parity, DEFAULT_PARITY.to_string(), "parity", &owner);
            applied += fill(&mut uart.stop_bits, DEFAULT_STOP_BITS, "stop_bits", &owner);
            applied += fill(&mut uart.data_bits, DEFAULT_DATA_BITS, "data_bits", &owner);
            applied += fill(&mut uart.enabled, true, "enabled", &owner);
        }

        for i2c in &mut self.communication.i2c {
            let owner = i2c.instance.clone();
            applied += fill(&mut i2c.speed, STANDARD_MODE_HZ, "speed", &owner);
            applied += fill(&mut i2c.enabled, true, "enabled", &owner);
        }

        for timer in &mut self.timers {
            let owner = timer.instance.clone();
            applied += fill(&mut timer.enabled, true, "enabled", &owner);
            applied += fill(&mut timer.mode, DEFAULT_TIMER_MODE.to_string(), "mode", &owner);
            applied += fill(&mut timer.clock_hz, clock_freq, "clock_hz", &owner);
        }

        applied
    }

    /// Convert into descriptor tables
    ///
    /// Unset optional values take their defaults whether or not
    /// [`apply_defaults`](Self::apply_defaults) ran.
    pub fn to_tables(&self) -> std::result::Result<BoardTables, Issues> {
        let mut issues = Vec::new();

        let mut pins = Vec::new();
        let mut pin_comments = Vec::new();
        for (idx, entry) in self.gpio.pins.iter().enumerate() {
            if entry.pin.trim().is_empty() {
                issues.push(format!("gpio {} missing pin", idx));
                continue;
            }
            if let Some(pin) = convert_pin(entry, &mut issues) {
                pins.push(pin);
                pin_comments.push(entry.comment.clone());
            }
        }

        let uarts = self
            .communication
            .uart
            .iter()
            .filter_map(|entry| convert_uart(entry, &mut issues))
            .collect();
        let i2cs = self
            .communication
            .i2c
            .iter()
            .filter_map(|entry| convert_i2c(entry, &mut issues))
            .collect();
        let timers = self
            .timers
            .iter()
            .filter_map(|entry| convert_timer(entry, self.board.clock_freq, &mut issues))
            .collect();

        if !issues.is_empty() {
            return Err(Issues(issues));
        }

        Ok(BoardTables {
            name: self.board.name.clone(),
            mcu: self.board.mcu.clone(),
            sysclk_hz: self.board.clock_freq,
            pins,
            pin_comments,
            uarts,
            i2cs,
            timers,
        })
    }
}

fn parse_pin(name: &str, owner: &str, issues: &mut Vec<String>) -> Option<PinId> {
    let pin = PinId::parse(name);
    if pin.is_none() {
        issues.push(format!("{} invalid pin name '{}'", owner, name));
    }
    pin
}

fn convert_pin(entry: &PinEntry, issues: &mut Vec<String>) -> Option<PinConfig> {
    let name = entry.pin.as_str();
    let pin = parse_pin(name, "gpio", issues);

    let direction = entry.direction.as_deref().unwrap_or(DEFAULT_DIRECTION);
    let plain_mode = match direction {
        "input" => Some(PinMode::Input),
        "output" => Some(PinMode::OutputPushPull),
        "output_open_drain" => Some(PinMode::OutputOpenDrain),
        other => {
            issues.push(format!(
                "{} direction must be one of input, output, output_open_drain (got '{}')",
                name, other
            ));
            None
        }
    };

    let mode = match &entry.alt_function {
        Some(af) => match Signal::from_name(af) {
            Some(signal) => Some(PinMode::Alternate(signal)),
            None => {
                issues.push(format!("{} unknown alt_function '{}'", name, af));
                None
            }
        },
        None => plain_mode,
    };

    let pull_name = entry.pull.as_deref().unwrap_or(DEFAULT_PULL);
    let pull = Pull::from_name(pull_name);
    if pull.is_none() {
        issues.push(format!(
            "{} pull must be one of none, pull_up, pull_down (got '{}')",
            name, pull_name
        ));
    }

    let speed_name = entry.speed.as_deref().unwrap_or(DEFAULT_SPEED);
    let speed = Speed::from_name(speed_name);
    if speed.is_none() {
        issues.push(format!(
            "{} speed must be one of low, medium, high, very_high (got '{}')",
            name, speed_name
        ));
    }

    Some(PinConfig {
        pin: pin?,
        mode: mode?,
        pull: pull?,
        speed: speed?,
    })
}

/// Register word length for a data/parity combination
///
/// The word length counts the parity bit, so 8 data bits with parity is a
/// 9-bit word.
fn word_length(data_bits: u8, parity: Parity) -> Option<WordLength> {
    match (data_bits, parity == Parity::None) {
        (8, true) | (7, false) => Some(WordLength::Eight),
        (9, true) | (8, false) => Some(WordLength::Nine),
        _ => None,
    }
}

fn convert_uart(entry: &UartEntry, issues: &mut Vec<String>) -> Option<UartConfig> {
    let owner = entry.instance.as_str();
    let instance = UartInstance::from_name(owner);
    if instance.is_none() {
        issues.push(format!("unknown uart instance '{}'", owner));
    }
    let tx_pin = parse_pin(&entry.tx_pin, owner, issues);
    let rx_pin = parse_pin(&entry.rx_pin, owner, issues);

    let parity_name = entry.parity.as_deref().unwrap_or(DEFAULT_PARITY);
    let parity = Parity::from_name(parity_name);
    if parity.is_none() {
        issues.push(format!(
            "{} parity must be one of none, even, odd (got '{}')",
            owner, parity_name
        ));
    }

    let stop_bits = match entry.stop_bits.unwrap_or(DEFAULT_STOP_BITS) {
        1 => Some(StopBits::One),
        2 => Some(StopBits::Two),
        other => {
            issues.push(format!("{} stop_bits must be 1 or 2 (got {})", owner, other));
            None
        }
    };

    let data_bits = entry.data_bits.unwrap_or(DEFAULT_DATA_BITS);
    let word_length = parity.and_then(|p| {
        let wl = word_length(data_bits, p);
        if wl.is_none() {
            issues.push(format!(
                "{} {} data bits with parity {} not supported",
                owner,
                data_bits,
                p.name()
            ));
        }
        wl
    });

    Some(UartConfig {
        baudrate: entry.baudrate,
        word_length: word_length?,
        parity: parity?,
        stop_bits: stop_bits?,
        enabled: entry.enabled.unwrap_or(true),
        ..UartConfig::new(instance?, tx_pin?, rx_pin?)
    })
}

fn convert_i2c(entry: &I2cEntry, issues: &mut Vec<String>) -> Option<I2cConfig> {
    let owner = entry.instance.as_str();
    let instance = I2cInstance::from_name(owner);
    if instance.is_none() {
        issues.push(format!("unknown i2c instance '{}'", owner));
    }
    let scl_pin = parse_pin(&entry.scl_pin, owner, issues);
    let sda_pin = parse_pin(&entry.sda_pin, owner, issues);

    Some(I2cConfig {
        clock_speed: entry.speed.unwrap_or(STANDARD_MODE_HZ),
        enabled: entry.enabled.unwrap_or(true),
        ..I2cConfig::new(instance?, scl_pin?, sda_pin?)
    })
}

fn convert_timer(entry: &TimerEntry, clock_freq: u32, issues: &mut Vec<String>) -> Option<TimerConfig> {
    let owner = entry.instance.as_str();
    let enabled = entry.enabled.unwrap_or(true);
    let instance = TimerInstance::from_name(owner);
    if instance.is_none() {
        issues.push(format!("unknown timer instance '{}'", owner));
    }

    let mut valid = instance.is_some();
    if enabled {
        if entry.prescaler == 0 {
            issues.push(format!("{} invalid prescaler", owner));
            valid = false;
        }
        if entry.period == 0 {
            issues.push(format!("{} invalid period", owner));
            valid = false;
        }
    }

    match entry.mode.as_deref().unwrap_or(DEFAULT_TIMER_MODE) {
        "timer" => {}
        "pwm" => {
            issues.push(format!("{} pwm output is not supported", owner));
            valid = false;
        }
        other => {
            issues.push(format!("{} unknown mode '{}'", owner, other));
            valid = false;
        }
    }

    if !valid {
        return None;
    }

    Some(TimerConfig {
        enabled,
        ..TimerConfig::from_divider(
            instance?,
            entry.prescaler,
            entry.period,
            entry.clock_hz.unwrap_or(clock_freq),
        )
    })
}

/// Owned descriptor tables built from a board description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardTables {
    pub name: String,
    pub mcu: String,
    pub sysclk_hz: u32,
    pub pins: Vec<PinConfig>,
    /// Comment of each pin in `pins`, by index
    pub pin_comments: Vec<Option<String>>,
    pub uarts: Vec<UartConfig>,
    pub i2cs: Vec<I2cConfig>,
    pub timers: Vec<TimerConfig>,
}

impl BoardTables {
    /// Borrow as a board manifest
    pub fn manifest(&self) -> BoardManifest<'_> {
        BoardManifest {
            name: &self.name,
            mcu: &self.mcu,
            sysclk_hz: self.sysclk_hz,
            pins: &self.pins,
            uarts: &self.uarts,
            i2cs: &self.i2cs,
            timers: &self.timers,
        }
    }

    /// Run the manifest checks
    pub fn validate(&self) -> std::result::Result<(), Issues> {
        self.manifest()
            .validate()
            .map_err(|errors| Issues(errors.iter().map(ToString::to_string).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [board]
        name = "test"
        mcu = "STM32F407VG"
        clock_freq = 168000000

        [[gpio.pins]]
        pin = "PA9"
        alt_function = "usart1_tx"

        [[gpio.pins]]
        pin = "PA10"
        alt_function = "usart1_rx"

        [[communication.uart]]
        instance = "USART1"
        baudrate = 9600
        tx_pin = "PA9"
        rx_pin = "PA10"

        [[timers]]
        instance = "TIM4"
        prescaler = 42
        period = 500
    "#;

    #[test]
    fn test_defaults_applied() {
        let mut file = BoardFile::parse(MINIMAL).unwrap();
        // 3 per pin, 4 on the uart, 3 on the timer
        assert_eq!(file.apply_defaults(), 2 * 3 + 4 + 3);

        let pin = &file.gpio.pins[0];
        assert_eq!(pin.pull.as_deref(), Some("none"));
        assert_eq!(pin.speed.as_deref(), Some("medium"));
        assert_eq!(pin.direction.as_deref(), Some("input"));

        let uart = &file.communication.uart[0];
        assert_eq!(uart.parity.as_deref(), Some("none"));
        assert_eq!(uart.stop_bits, Some(1));
        assert_eq!(uart.data_bits, Some(8));
        assert_eq!(uart.enabled, Some(true));

        let timer = &file.timers[0];
        assert_eq!(timer.clock_hz, Some(168_000_000));
        assert_eq!(timer.mode.as_deref(), Some("timer"));

        // Second pass has nothing left to fill
        assert_eq!(file.apply_defaults(), 0);
    }

    #[test]
    fn test_minimal_tables() {
        let tables = BoardFile::parse(MINIMAL).unwrap().to_tables().unwrap();

        assert_eq!(tables.pins.len(), 2);
        assert_eq!(
            tables.pins[0].mode,
            PinMode::Alternate(Signal::UartTx(UartInstance::Usart1))
        );
        assert_eq!(tables.pins[0].pull, Pull::None);
        assert_eq!(tables.pins[0].speed, Speed::Medium);

        let uart = &tables.uarts[0];
        assert_eq!(uart.baudrate, 9600);
        assert_eq!(uart.word_length, WordLength::Eight);
        assert!(uart.enabled);

        let timer = &tables.timers[0];
        assert_eq!(timer.instance, TimerInstance::Tim4);
        assert_eq!(timer.prescaler, 41);
        assert_eq!(timer.period, 499);

        assert!(tables.validate().is_ok());
    }

    #[test]
    fn test_word_length() {
        assert_eq!(word_length(8, Parity::None), Some(WordLength::Eight));
        assert_eq!(word_length(8, Parity::Even), Some(WordLength::Nine));
        assert_eq!(word_length(7, Parity::Odd), Some(WordLength::Eight));
        assert_eq!(word_length(9, Parity::None), Some(WordLength::Nine));
        assert_eq!(word_length(9, Parity::Even), None);
        assert_eq!(word_length(7, Parity::None), None);
    }

    #[test]
    fn test_all_issues_reported() {
        let text = r#"
            [board]
            name = "broken"
            mcu = "STM32F407VG"
            clock_freq = 168000000

            [[gpio.pins]]
            pin = "PZ3"

            [[gpio.pins]]
            pin = "PA1"
            direction = "sideways"
            pull = "maybe"

            [[communication.uart]]
            instance = "USART9"
            baudrate = 115200
            tx_pin = "PA9"
            rx_pin = "PA10"
            stop_bits = 3

            [[timers]]
            instance = "TIM2"
            prescaler = 0
            period = 1000
            mode = "pwm"
        "#;

        let issues = BoardFile::parse(text).unwrap().to_tables().unwrap_err();
        let has = |needle: &str| issues.0.iter().any(|i| i.contains(needle));

        assert!(has("invalid pin name 'PZ3'"));
        assert!(has("PA1 direction must be one of"));
        assert!(has("PA1 pull must be one of"));
        assert!(has("unknown uart instance 'USART9'"));
        assert!(has("stop_bits must be 1 or 2"));
        assert!(has("TIM2 invalid prescaler"));
        assert!(has("TIM2 pwm output is not supported"));
        assert_eq!(issues.0.len(), 7);
    }

    #[test]
    fn test_disabled_timer_skips_range_checks() {
        let text = r#"
            [board]
            name = "t"
            mcu = "STM32F407VG"
            clock_freq = 168000000

            [[timers]]
            instance = "TIM5"
            prescaler = 0
            period = 0
            enabled = false
        "#;
        let tables = BoardFile::parse(text).unwrap().to_tables().unwrap();
        assert!(!tables.timers[0].enabled);
    }

    #[test]
    fn test_missing_board_section() {
        let err = BoardFile::parse("[gpio]\npins = []\n").unwrap_err();
        assert!(format!("{:#}", err).contains("board"));
    }

    #[test]
    fn test_issues_display() {
        let issues = Issues(vec!["duplicate pin PA0".into(), "USART1 invalid baudrate".into()]);
        assert_eq!(
            issues.to_string(),
            "configuration validation failed\n - duplicate pin PA0\n - USART1 invalid baudrate"
        );
    }
}
