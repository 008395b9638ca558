use anyhow::{Context, Result};
use ap_core::config::PlaybackSettings;
use clap::Parser;

pub mod cli;
pub mod display;
pub mod pipeline;
pub mod player;
pub mod staging;
pub mod still;
pub mod stop;

#[cfg(test)]
mod testing;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config + overrides CLI
    let config = cli.resolve_config()?;
    config.validate().context("Configuration rejetée")?;

    // 4. Paramètres de session
    let settings = PlaybackSettings::from_config(&cli.source, &config)?;
    log::info!(
        "source {} @ {} fps (couleur: {}, plein: {})",
        settings.source_path.display(),
        settings.target_frame_rate,
        settings.color_enabled,
        settings.fully_filled
    );

    // 5. Lecture ; le terminal est restauré avant tout retour d'erreur
    pipeline::play(&settings, &config)
}
