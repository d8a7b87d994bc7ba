use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use primer_manifest::RustSource;

#[derive(Parser)]
#[command(name = "primer-manifest")]
#[command(about = "Primer board description tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a board description
    Check {
        /// Board description (TOML)
        file: PathBuf,
    },
    /// Print the peripheral summary of a board description
    Summary {
        /// Board description (TOML)
        file: PathBuf,
    },
    /// Write the board table as Rust source
    Generate {
        /// Board description (TOML)
        file: PathBuf,
        /// Output file
        #[arg(short, long, default_value = "board_manifest.rs")]
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn generate(file: &Path, output: &Path) -> Result<()> {
    let tables = primer_manifest::load(file)?;
    let origin = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    fs::write(output, RustSource::new(&tables, &origin).to_string())
        .with_context(|| format!("writing {}", output.display()))?;
    info!("generated code written to {}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check { file } => {
            let tables = primer_manifest::load(&file)?;
            println!(
                "{}: {} pins, {} serial, {} i2c, {} timers",
                tables.name,
                tables.pins.len(),
                tables.uarts.len(),
                tables.i2cs.len(),
                tables.timers.len()
            );
            for warning in tables.manifest().warnings() {
                println!("warning: {}", warning);
            }
            Ok(())
        }
        Commands::Summary { file } => {
            let tables = primer_manifest::load(&file)?;
            print!("{}", tables.manifest());
            Ok(())
        }
        Commands::Generate { file, output } => generate(&file, &output),
    }
}
