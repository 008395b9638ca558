use std::path::PathBuf;

use anyhow::Result;
use ap_core::config::{self, PlayerConfig};
use clap::Parser;

/// asciiplay: lecteur d'images et de vidéos en ASCII dans le terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Image (PNG, JPEG, BMP, GIF, WebP) ou vidéo (tout format lisible par ffmpeg).
    pub source: PathBuf,

    /// FPS cible du ticker et du transcodage. Défaut : config, sinon 30.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Couleur truecolor 24 bits.
    #[arg(long, default_value_t = false)]
    pub color: bool,

    /// Glyphe plein constant : la couleur seule porte la luminance.
    /// Exige `--color` ou `color_enabled = true` dans la config.
    #[arg(long, default_value_t = false)]
    pub fully_filled: bool,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Charge la config (défauts si le fichier est absent) puis applique les flags.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn resolve_config(&self) -> Result<PlayerConfig> {
        let mut config = if self.config.exists() {
            config::load_config(&self.config)?
        } else {
            log::warn!(
                "Config introuvable : {}. Utilisation des défauts.",
                self.config.display()
            );
            PlayerConfig::default()
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Flags CLI > fichier > défauts. Un flag booléen absent ne désactive rien.
    pub fn apply_overrides(&self, config: &mut PlayerConfig) {
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        if self.color {
            config.color_enabled = true;
        }
        if self.fully_filled {
            config.fully_filled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("asciiplay").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = parse(&["clip.mp4"]).unwrap();
        assert_eq!(cli.source, PathBuf::from("clip.mp4"));
        assert_eq!(cli.fps, None);
        assert!(!cli.color);
        assert!(!cli.fully_filled);
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn fully_filled_parses_alone() {
        let cli = parse(&["clip.mp4", "--fully-filled", "--fps", "24"]).unwrap();
        assert!(cli.fully_filled);
        assert!(!cli.color);
        assert_eq!(cli.fps, Some(24));
    }

    #[test]
    fn fully_filled_accepts_color_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.toml");
        std::fs::write(&path, "[render]\ncolor_enabled = true\n").unwrap();
        let cli = parse(&["a.mp4", "--config", path.to_str().unwrap(), "--fully-filled"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert!(config.color_enabled && config.fully_filled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn fully_filled_without_any_color_is_rejected_after_merge() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let cli = parse(&["a.mp4", "--config", missing.to_str().unwrap(), "--fully-filled"]).unwrap();
        assert!(cli.resolve_config().unwrap().validate().is_err());
    }

    #[test]
    fn source_is_required() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let cli = parse(&["a.png", "--config", missing.to_str().unwrap(), "--fps", "12"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.target_fps, 12);
        assert_eq!(config.buffer_size, PlayerConfig::default().buffer_size);
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.toml");
        std::fs::write(&path, "[playback]\ntarget_fps = 15\nbuffer_size = 8\n").unwrap();
        let cli = parse(&["a.mp4", "--config", path.to_str().unwrap(), "--color"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.target_fps, 15);
        assert_eq!(config.buffer_size, 8);
        assert!(config.color_enabled);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[playback]\ntarget_fps = \"vite\"\n").unwrap();
        let cli = parse(&["a.mp4", "--config", path.to_str().unwrap()]).unwrap();
        assert!(cli.resolve_config().is_err());
    }
}
