//! Horadric launcher.
//!
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Checks that the game data is present
//! 4. Indexes the archives and runs the front end on the headless platform
//!
//! Exits with a failure status when the sanity-check archive (`d2data.mpq`
//! by default) is missing or unreadable.

use anyhow::{Context, Result};
use horadric_data::{DataManager, verify_sanity_archive};
use horadric_engine::scenes::MainMenu;
use horadric_engine::{Cli, Engine, HeadlessPlatform};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::from_args();
    let config = cli.resolve().context("invalid configuration")?;

    tracing::info!(
        "Horadric starting: data={}, language={}",
        config.data.base_path.display(),
        config.data.language
    );

    if let Err(e) = verify_sanity_archive(&config.data) {
        tracing::error!(
            "Game data not usable at {}: {e}",
            config.data.base_path.display()
        );
        return Ok(ExitCode::FAILURE);
    }

    let data = DataManager::open(config.data.clone()).context("failed to index game data")?;
    let report = data.scan_report();
    tracing::info!(
        "{} assets from {} archives ({} skipped)",
        data.index().len(),
        report.indexed_count(),
        report.skipped_count()
    );

    let mut engine = Engine::new(data, config.window);
    let mut platform = HeadlessPlatform::new(cli.frames);
    let summary = engine.run(&mut platform, Box::new(MainMenu::new()))?;

    tracing::info!("Exited after {} frames: {:?}", summary.frames, summary.reason);
    Ok(ExitCode::SUCCESS)
}
