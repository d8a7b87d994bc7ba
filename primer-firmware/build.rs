//! Build script for primer-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Passes the cortex-m-rt and defmt linker scripts
//! - Checks the board description at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Board description the compiled-in table is kept in sync with
const BOARD_FILE: &str = "../boards/stm32f4-discovery.toml";

fn main() {
    setup_linker();
    check_board_file();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x in OUT_DIR");
    f.write_all(memory_x).expect("write memory.x");

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Check the board description parses and has the sections bring-up needs
///
/// Full validation lives in `primer-manifest check`; this only catches a
/// broken file early.
fn check_board_file() {
    println!("cargo:rerun-if-changed={}", BOARD_FILE);

    let path = Path::new(BOARD_FILE);
    if !path.exists() {
        println!("cargo:warning={} not found, skipping board check", BOARD_FILE);
        return;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Failed to read board description                         ║\n\
            ║                                                                  ║\n\
            ║  Error: {:<56} ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            e
        ),
    };

    let board: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid TOML syntax in board description                 ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            format_error_lines(&e.to_string())
        ),
    };

    let mut errors = Vec::new();
    if board.get("board").is_none() {
        errors.push("Missing [board] section".to_string());
    }
    match board.get("gpio").and_then(|g| g.get("pins")) {
        Some(toml::Value::Array(pins)) => {
            for (idx, pin) in pins.iter().enumerate() {
                if pin.get("pin").and_then(|p| p.as_str()).is_none() {
                    errors.push(format!("[[gpio.pins]] entry {} missing 'pin'", idx));
                }
            }
        }
        _ => errors.push("Missing [[gpio.pins]] entries".to_string()),
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Incomplete board description                             ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
