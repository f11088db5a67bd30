//! ivory - terminal piano
//!
//! Run with: cargo run -- [--config ivory.toml] [--log-file ivory.log]

mod app;
mod loader;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use ivory::{notes::MAX_OCTAVE, EngineConfig, Topology};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ivory", about = "Play a piano in the terminal")]
struct Cli {
    /// TOML engine configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs here (RUST_LOG filters them). Nothing is logged otherwise.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Lowest octave shown on the keyboard
    #[arg(short, long, default_value_t = 4)]
    octave: i32,

    /// Reverb and delay only, no filter or distortion branches
    #[arg(long)]
    minimal: bool,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if cli.minimal {
        config.topology = Topology::Minimal;
    }
    let octave = cli.octave.clamp(0, MAX_OCTAVE as i32 - 1);

    let terminal = ratatui::init();
    let res = app::run(terminal, config, octave);
    ratatui::restore();
    res
}

fn init_logging(path: &PathBuf) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
