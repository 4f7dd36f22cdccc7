// Entrypoint for the CLI application.
// - Keeps `main` small: load config, start logging, hand over to the UI loop.

use anyhow::Context;
use ptrac_migrate::{config::Config, logging, ui};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let (config, source) = Config::load().context("Failed to load configuration")?;

    // Held until exit so buffered log lines reach the file.
    let _log_guard = logging::init(&config)?;
    match &source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No config.yaml found, using defaults"),
    }

    let mut app = ui::App::new(config);
    ui::start(&mut app)
}
