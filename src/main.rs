//! Impact Synth binary.

use anyhow::{Context, Result};
use clap::Parser;

use impact_synth::cli::Args;
use impact_synth::{app, SynthConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = SynthConfig::discover().context("Failed to load configuration")?;
    log::info!(
        "Starting {}x{} at {} fps ({:?})",
        config.width,
        config.height,
        config.target_fps,
        args.presentation()
    );

    app::run(config, args.presentation()).context("Synth failed to start")?;
    Ok(())
}
