//! Primer board description tooling
//!
//! Loads a board description file, fills defaults, validates it against the
//! same rules the firmware's bring-up plan relies on, and renders it as a
//! Rust board table.

pub mod board_file;
pub mod emit;

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

use primer_core::StartupPlan;

pub use board_file::{BoardFile, BoardTables, Issues};
pub use emit::RustSource;

/// Build and check the startup plan the firmware would run
///
/// Catches tables that validate entry by entry but cannot be sequenced,
/// such as one with more steps than the plan holds.
pub fn check_plan(tables: &BoardTables) -> std::result::Result<usize, Issues> {
    let manifest = tables.manifest();
    let plan = StartupPlan::from_manifest(&manifest)
        .and_then(|plan| plan.check().map(|()| plan))
        .map_err(|e| Issues(vec![format!("startup plan: {}", e)]))?;
    Ok(plan.len())
}

/// Load, default, convert and validate a board description
pub fn load(path: &Path) -> Result<BoardTables> {
    info!("loading board description from {}", path.display());

    let mut file = BoardFile::load(path)?;
    let applied = file.apply_defaults();
    debug!(applied, "defaults filled");

    let tables = file.to_tables()?;
    tables.validate()?;
    let steps = check_plan(&tables)?;
    debug!(steps, "startup plan checked");

    for warning in tables.manifest().warnings() {
        warn!("{}", warning);
    }
    info!("configuration validated successfully");

    Ok(tables)
}
