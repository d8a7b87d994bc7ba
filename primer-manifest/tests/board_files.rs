//! Board description files end to end: load from disk, validate, generate.

use std::fs;
use std::path::{Path, PathBuf};

use primer_core::STM32F4_DISCOVERY;
use primer_manifest::{emit, Issues};
use tempfile::TempDir;

fn repo_board() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../boards/stm32f4-discovery.toml")
}

fn write_board(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("board.toml");
    fs::write(&path, text).unwrap();
    path
}

fn issues_of(err: anyhow::Error) -> Vec<String> {
    err.downcast::<Issues>().expect("validation issues").0
}

const HEADER: &str = r#"
[board]
name = "bench"
mcu = "STM32F407VG"
clock_freq = 168000000
"#;

#[test]
fn repo_board_matches_compiled_table() {
    let tables = primer_manifest::load(&repo_board()).unwrap();
    assert_eq!(tables.manifest(), STM32F4_DISCOVERY);
}

#[test]
fn repo_board_keeps_pin_comments() {
    let tables = primer_manifest::load(&repo_board()).unwrap();
    assert_eq!(tables.pin_comments.len(), tables.pins.len());
    assert_eq!(tables.pin_comments[0].as_deref(), Some("user button"));
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = primer_manifest::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("config file not found"));
}

#[test]
fn syntax_error_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_board(&dir, "[board\nname = 1\n");
    let err = primer_manifest::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("error parsing"));
}

#[test]
fn defaults_fill_a_sparse_file() {
    let dir = TempDir::new().unwrap();
    let text = format!(
        "{}{}",
        HEADER,
        r#"
[[gpio.pins]]
pin = "PC13"

[[gpio.pins]]
pin = "PB10"
alt_function = "i2c2_scl"

[[gpio.pins]]
pin = "PB11"
alt_function = "i2c2_sda"

[[communication.i2c]]
instance = "I2C2"
scl_pin = "PB10"
sda_pin = "PB11"

[[timers]]
instance = "TIM5"
prescaler = 84
period = 1000
"#
    );
    let tables = primer_manifest::load(&write_board(&dir, &text)).unwrap();

    let pin = &tables.pins[0];
    assert_eq!(pin.mode, primer_hal::gpio::PinMode::Input);
    assert_eq!(pin.pull, primer_hal::gpio::Pull::None);
    assert_eq!(pin.speed, primer_hal::gpio::Speed::Medium);

    assert_eq!(tables.i2cs[0].clock_speed, primer_hal::i2c::STANDARD_MODE_HZ);
    assert!(tables.i2cs[0].enabled);

    // Timer clock falls back to the system clock
    assert_eq!(tables.timers[0].assumed_clock_hz, 168_000_000);
}

#[test]
fn manifest_rules_are_reported_together() {
    let dir = TempDir::new().unwrap();
    let text = format!(
        "{}{}",
        HEADER,
        r#"
[[gpio.pins]]
pin = "PA0"

[[gpio.pins]]
pin = "PA0"
direction = "output"

[[communication.uart]]
instance = "USART2"
baudrate = 0
tx_pin = "PA2"
rx_pin = "PA3"
"#
    );
    let issues = issues_of(primer_manifest::load(&write_board(&dir, &text)).unwrap_err());

    assert!(issues.iter().any(|i| i == "duplicate pin PA0"));
    assert!(issues.iter().any(|i| i == "USART2 invalid baudrate"));
    assert!(issues
        .iter()
        .any(|i| i == "usart2_tx needs PA2 but it is not in the pin table"));
}

#[test]
fn disabled_peripheral_needs_no_pins() {
    let dir = TempDir::new().unwrap();
    let text = format!(
        "{}{}",
        HEADER,
        r#"
[[communication.uart]]
instance = "USART3"
baudrate = 9600
tx_pin = "PD8"
rx_pin = "PD9"
enabled = false
"#
    );
    let tables = primer_manifest::load(&write_board(&dir, &text)).unwrap();
    assert!(!tables.uarts[0].enabled);
    assert_eq!(tables.manifest().enabled_uarts().count(), 0);
}

#[test]
fn generated_table_for_repo_board() {
    let tables = primer_manifest::load(&repo_board()).unwrap();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("board_manifest.rs");
    fs::write(&out, emit::render(&tables, "stm32f4-discovery.toml")).unwrap();

    let source = fs::read_to_string(&out).unwrap();
    assert!(source.contains("const PINS: [PinConfig; 6] = ["));
    assert!(source.contains("    // PA9: console TX\n"));
    assert!(source.contains("mode: PinMode::Alternate(Signal::UartTx(UartInstance::Usart1)),"));
    assert!(source.contains("const TIMERS: [TimerConfig; 2] = ["));
    assert!(source.contains("prescaler: 83999,"));
    assert!(source.contains("prescaler: 167,"));
    assert!(source.contains("period: 999,"));
    assert!(source.contains("    name: \"STM32F4-Discovery\","));
}

#[test]
fn plan_capacity_is_checked() {
    let dir = TempDir::new().unwrap();
    let mut text = HEADER.to_string();
    // 46 pins on three ports plus three clock steps
    for (port, count) in [('A', 16), ('B', 15), ('C', 15)] {
        for n in 0..count {
            text.push_str(&format!("\n[[gpio.pins]]\npin = \"P{}{}\"\n", port, n));
        }
    }
    let issues = issues_of(primer_manifest::load(&write_board(&dir, &text)).unwrap_err());
    assert_eq!(issues, vec!["startup plan: plan exceeds 48 steps".to_string()]);
}

#[test]
fn single_count_period_is_rejected() {
    let dir = TempDir::new().unwrap();
    let text = format!(
        "{}{}",
        HEADER,
        r#"
[[timers]]
instance = "TIM4"
prescaler = 84
period = 1
"#
    );
    let issues = issues_of(primer_manifest::load(&write_board(&dir, &text)).unwrap_err());
    assert_eq!(issues, vec!["TIM4 invalid period (needs at least 2 counts)".to_string()]);
}

#[test]
fn repo_board_reports_tim2_prescaler() {
    let tables = primer_manifest::load(&repo_board()).unwrap();
    let warnings: Vec<String> = tables
        .manifest()
        .warnings()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        warnings,
        vec!["TIM2 prescaler 83999 exceeds the 16-bit PSC register, hardware keeps 18463 (divide by 18464)"
            .to_string()]
    );
}

#[test]
fn repo_board_plan_fits() {
    let tables = primer_manifest::load(&repo_board()).unwrap();
    // 3 clocks, 6 pins, serial, I2C, two timers
    assert_eq!(primer_manifest::check_plan(&tables), Ok(13));
}

#[test]
fn signed_pin_number_is_rejected() {
    let dir = TempDir::new().unwrap();
    let text = format!("{}\n[[gpio.pins]]\npin = \"PA+5\"\n", HEADER);
    let issues = issues_of(primer_manifest::load(&write_board(&dir, &text)).unwrap_err());
    assert_eq!(issues, vec!["gpio invalid pin name 'PA+5'".to_string()]);
}
