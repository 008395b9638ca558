use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{PALETTE_BLOCKS, PALETTE_COMPACT, PALETTE_DEFAULT, Palette};
use crate::error::PlayerError;
use crate::sizing::DEFAULT_ASPECT_CORRECTION;

/// Capacité par défaut du tampon de préchargement (FRAME_BUFFER_SIZE).
pub const DEFAULT_BUFFER_SIZE: usize = 50;

/// FPS cible par défaut.
pub const DEFAULT_FPS: u32 = 30;

/// Configuration complète du lecteur.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine ; le
/// fichier puis la CLI surchargent ces valeurs.
///
/// # Example
/// ```
/// use ap_core::config::PlayerConfig;
/// let config = PlayerConfig::default();
/// assert_eq!(config.target_fps, 30);
/// assert!(!config.color_enabled);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PlayerConfig {
    // === Lecture ===
    /// FPS cible du ticker (et du transcodage ffmpeg).
    pub target_fps: u32,
    /// Capacité du tampon producteur→consommateur, aussi seuil de préchargement.
    pub buffer_size: usize,

    // === Rendu ===
    /// Rampe de glyphes (du plus clair au plus dense) ou nom de preset.
    pub palette: String,
    /// Ratio largeur/hauteur d'une cellule terminal.
    pub aspect_correction: f64,
    /// Couleur truecolor 24 bits.
    pub color_enabled: bool,
    /// Glyphe plein constant, la couleur seule porte la luminance.
    pub fully_filled: bool,

    // === Vidéo ===
    /// Largeur max des frames décodées par ffmpeg.
    pub max_decode_width: u32,
    /// Hauteur max des frames décodées par ffmpeg.
    pub max_decode_height: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_FPS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            palette: "default".to_string(),
            aspect_correction: DEFAULT_ASPECT_CORRECTION,
            color_enabled: false,
            fully_filled: false,
            max_decode_width: 640,
            max_decode_height: 360,
        }
    }
}

impl PlayerConfig {
    /// Resolve the `palette` field: a preset name or a literal glyph ramp.
    ///
    /// # Example
    /// ```
    /// use ap_core::config::PlayerConfig;
    /// let mut config = PlayerConfig::default();
    /// config.palette = "compact".into();
    /// assert_eq!(config.palette_ramp(), " .:-=+*#%@");
    /// config.palette = " .#".into();
    /// assert_eq!(config.palette_ramp(), " .#");
    /// ```
    #[must_use]
    pub fn palette_ramp(&self) -> &str {
        match self.palette.as_str() {
            "default" => PALETTE_DEFAULT,
            "compact" => PALETTE_COMPACT,
            "blocks" => PALETTE_BLOCKS,
            ramp => ramp,
        }
    }

    /// Build the luminance palette described by this config.
    ///
    /// # Errors
    /// Returns [`PlayerError::Config`] if the ramp is empty.
    pub fn build_palette(&self) -> Result<Palette, PlayerError> {
        Palette::new(self.palette_ramp())
    }

    /// Check value ranges and flag combinations.
    ///
    /// # Errors
    /// Returns [`PlayerError::Config`] describing the first violation.
    ///
    /// # Example
    /// ```
    /// use ap_core::config::PlayerConfig;
    /// let mut config = PlayerConfig::default();
    /// config.fully_filled = true;
    /// assert!(config.validate().is_err());
    /// config.color_enabled = true;
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), PlayerError> {
        if self.target_fps == 0 {
            return Err(PlayerError::Config("target_fps doit être > 0".into()));
        }
        if self.buffer_size == 0 {
            return Err(PlayerError::Config("buffer_size doit être ≥ 1".into()));
        }
        if self.palette_ramp().is_empty() {
            return Err(PlayerError::Config("palette vide".into()));
        }
        if !(self.aspect_correction.is_finite()
            && self.aspect_correction > 0.0
            && self.aspect_correction <= 4.0)
        {
            return Err(PlayerError::Config(format!(
                "aspect_correction hors de ]0, 4] : {}",
                self.aspect_correction
            )));
        }
        if self.fully_filled && !self.color_enabled {
            return Err(PlayerError::Config(
                "fully_filled exige color_enabled".into(),
            ));
        }
        if self.max_decode_width == 0 || self.max_decode_height == 0 {
            return Err(PlayerError::Config(
                "max_decode_width/max_decode_height doivent être > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Paramètres immuables d'une session de lecture.
///
/// # Example
/// ```
/// use ap_core::config::PlaybackSettings;
/// let settings = PlaybackSettings::new("clip.mp4", 24, true, true).unwrap();
/// assert_eq!(settings.target_frame_rate, 24);
/// assert!(PlaybackSettings::new("clip.mp4", 24, false, true).is_err());
/// assert!(PlaybackSettings::new("clip.mp4", 0, false, false).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// Image or video to play.
    pub source_path: PathBuf,
    /// Frames per second, always > 0.
    pub target_frame_rate: u32,
    /// Emit 24-bit foreground colour.
    pub color_enabled: bool,
    /// Draw every cell with the solid block glyph. Only set together with colour.
    pub fully_filled: bool,
}

impl PlaybackSettings {
    /// Validate and build the settings.
    ///
    /// # Errors
    /// Returns [`PlayerError::Config`] if the frame rate is zero or if
    /// fully-filled mode is requested without colour.
    pub fn new(
        source_path: impl Into<PathBuf>,
        target_frame_rate: u32,
        color_enabled: bool,
        fully_filled: bool,
    ) -> Result<Self, PlayerError> {
        if target_frame_rate == 0 {
            return Err(PlayerError::Config("le framerate doit être > 0".into()));
        }
        if fully_filled && !color_enabled {
            return Err(PlayerError::Config(
                "le mode plein n'est valide qu'avec la couleur".into(),
            ));
        }
        Ok(Self {
            source_path: source_path.into(),
            target_frame_rate,
            color_enabled,
            fully_filled,
        })
    }

    /// Build settings from a validated config.
    ///
    /// # Errors
    /// See [`PlaybackSettings::new`].
    pub fn from_config(source_path: &Path, config: &PlayerConfig) -> Result<Self, PlayerError> {
        Self::new(
            source_path,
            config.target_fps,
            config.color_enabled,
            config.fully_filled,
        )
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    playback: Option<PlaybackSection>,
    render: Option<RenderSection>,
    video: Option<VideoSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PlaybackSection {
    target_fps: Option<u32>,
    buffer_size: Option<usize>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RenderSection {
    palette: Option<String>,
    aspect_correction: Option<f64>,
    color_enabled: Option<bool>,
    fully_filled: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VideoSection {
    max_width: Option<u32>,
    max_height: Option<u32>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for this schema.
///
/// # Example
/// ```
/// use ap_core::config::parse_config;
/// let config = parse_config("[playback]\ntarget_fps = 12\n").unwrap();
/// assert_eq!(config.target_fps, 12);
/// assert_eq!(config.buffer_size, 50);
/// ```
pub fn parse_config(content: &str) -> Result<PlayerConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = PlayerConfig::default();

    if let Some(p) = file.playback {
        if let Some(v) = p.target_fps {
            config.target_fps = v;
        }
        if let Some(v) = p.buffer_size {
            config.buffer_size = v;
        }
    }
    if let Some(r) = file.render {
        if let Some(v) = r.palette {
            config.palette = v;
        }
        if let Some(v) = r.aspect_correction {
            config.aspect_correction = v;
        }
        if let Some(v) = r.color_enabled {
            config.color_enabled = v;
        }
        if let Some(v) = r.fully_filled {
            config.fully_filled = v;
        }
    }
    if let Some(v) = file.video {
        if let Some(w) = v.max_width {
            config.max_decode_width = w;
        }
        if let Some(h) = v.max_height {
            config.max_decode_height = h;
        }
    }

    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// La validation croisée est faite après les surcharges CLI, pas ici.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use ap_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<PlayerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config =
        parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))?;
    log::info!("config chargée : {}", path.display());
    Ok(config)
}
