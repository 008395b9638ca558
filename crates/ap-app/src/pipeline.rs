use std::path::Path;

use anyhow::{Context, Result};
use ap_ascii::Rasterizer;
use ap_core::config::{PlaybackSettings, PlayerConfig};
use ap_core::error::PlayerError;
use ap_core::traits::Source;
use ap_render::{CrosstermInput, TerminalSurface};
use ap_source::image::ImageSource;
use ap_source::video::VideoSource;

use crate::display::{Display, StatusLine};
use crate::player::Scheduler;
use crate::still;

/// Catégorie de média, déterminée par l'extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Still,
    Video,
}

/// Extensions d'images fixes ; tout le reste est confié à ffmpeg.
///
/// Les GIF sont traités comme des images fixes (première frame).
pub fn classify_media(path: &Path) -> MediaKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png" | "jpg" | "jpeg" | "bmp" | "gif" | "webp") => MediaKind::Still,
        _ => MediaKind::Video,
    }
}

/// Lance la lecture adaptée au média.
///
/// La source est ouverte avant le terminal : une erreur d'entrée est
/// signalée sur un terminal intact.
///
/// # Errors
/// Any fatal error of the session.
pub fn play(settings: &PlaybackSettings, config: &PlayerConfig) -> Result<()> {
    let rasterizer = Rasterizer::from_config(config)?;
    match classify_media(&settings.source_path) {
        MediaKind::Still => play_still(settings, &rasterizer),
        MediaKind::Video => play_video(settings, config, rasterizer),
    }
}

fn play_still(settings: &PlaybackSettings, rasterizer: &Rasterizer) -> Result<()> {
    let mut source = ImageSource::open(&settings.source_path)?;
    log::info!("image : natif {:?}", source.native_size());
    let bitmap = source.next_bitmap()?.ok_or_else(|| {
        PlayerError::DecodeCorrupt(format!("{} : aucune image", settings.source_path.display()))
    })?;

    let surface = TerminalSurface::init().context("Initialisation du terminal")?;
    let display = Display::new(surface, settings.color_enabled, StatusLine::Still);
    let mut input = CrosstermInput::new();
    let result = still::view(
        &bitmap,
        rasterizer,
        settings.fully_filled,
        &display,
        &mut input,
    );
    // Restaure le terminal avant de remonter l'erreur.
    drop(display.into_surface());
    result.context("Affichage de l'image")
}

fn play_video(
    settings: &PlaybackSettings,
    config: &PlayerConfig,
    rasterizer: Rasterizer,
) -> Result<()> {
    let source = VideoSource::open(
        &settings.source_path,
        settings.target_frame_rate,
        (config.max_decode_width, config.max_decode_height),
    )?;
    log::info!(
        "vidéo : natif {:?} à {:.3} fps, décodage {:?} à {} fps",
        source.native_size(),
        source.info().fps,
        source.decode_size(),
        settings.target_frame_rate
    );

    let scheduler = Scheduler::new(rasterizer, config, settings);
    let surface = TerminalSurface::init().context("Initialisation du terminal")?;
    let display = Display::new(surface, settings.color_enabled, StatusLine::Playback);
    let report = scheduler.run(source, &display, CrosstermInput::new());
    drop(display.into_surface());

    let report = report?;
    log::debug!(
        "états : {:?} (final {:?})",
        report.transitions,
        report.final_state
    );
    let frames = report.into_result().context("Lecture interrompue")?;
    log::info!("{frames} frames affichées");
    Ok(())
}
