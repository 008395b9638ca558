use std::sync::{Mutex, PoisonError};

use ap_core::error::PlayerError;
use ap_core::frame::Frame;
use ap_core::traits::Surface;
use ap_render::fps::{FpsCounter, FrameTimer};

/// Fenêtre de la moyenne FPS affichée en ligne de statut.
const FPS_WINDOW: usize = 30;

/// Texte de la ligne 0, au-dessus de l'image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusLine {
    /// Stop hint plus instantaneous and averaged rate.
    Playback,
    /// Exit hint only.
    Still,
}

struct DisplayState<S> {
    surface: S,
    timer: FrameTimer,
    average: FpsCounter,
}

/// Surface + mesure FPS, sérialisées par un seul verrou.
///
/// Un appel à [`show`](Display::show) tient le verrou pendant tout le
/// dessin et la mesure du taux : deux frames ne s'entrelacent jamais.
pub struct Display<S: Surface> {
    state: Mutex<DisplayState<S>>,
    color_enabled: bool,
    status: StatusLine,
}

impl<S: Surface> Display<S> {
    pub fn new(surface: S, color_enabled: bool, status: StatusLine) -> Self {
        Self {
            state: Mutex::new(DisplayState {
                surface,
                timer: FrameTimer::new(),
                average: FpsCounter::new(FPS_WINDOW),
            }),
            color_enabled,
            status,
        }
    }

    /// Taille disponible pour l'image : le terminal moins la ligne de statut.
    ///
    /// # Errors
    /// Propagates the surface geometry error.
    pub fn canvas_size(&self) -> Result<(u16, u16), PlayerError> {
        let state = self.lock()?;
        let (cols, rows) = state.surface.size()?;
        Ok((cols, rows.saturating_sub(1)))
    }

    /// Dessine une frame complète sous la ligne de statut et mesure le taux.
    ///
    /// Retourne le taux instantané, `None` pour la première frame.
    ///
    /// # Errors
    /// [`PlayerError::TerminalUnavailable`] if the flush fails.
    pub fn show(&self, frame: &Frame) -> Result<Option<f64>, PlayerError> {
        let mut state = self.lock()?;
        let state = &mut *state;
        state.surface.clear();

        for (row, (pixels, glyphs)) in (1u16..).zip(frame.row_iter()) {
            for (col, (pixel, &glyph)) in (0u16..).zip(pixels.iter().zip(glyphs)) {
                let fg = self.color_enabled.then_some(pixel.rgb());
                state.surface.set_cell(col, row, glyph, fg);
            }
        }

        let rate = match self.status {
            StatusLine::Playback => {
                let rate = state.timer.record_frame();
                state.average.tick();
                rate
            }
            StatusLine::Still => None,
        };
        let line = self.status_text(rate, state.average.fps());
        for (col, ch) in (0u16..).zip(line.chars()) {
            state.surface.set_cell(col, 0, ch, None);
        }

        state.surface.flush()?;
        Ok(rate)
    }

    fn status_text(&self, rate: Option<f64>, average: f64) -> String {
        match (self.status, rate) {
            (StatusLine::Still, _) => "[Press any key to exit]".to_string(),
            (StatusLine::Playback, None) => "[Press ENTER to stop] FPS: --".to_string(),
            (StatusLine::Playback, Some(r)) => {
                format!("[Press ENTER to stop] FPS: {r:.1} (avg {average:.1})")
            }
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, DisplayState<S>>, PlayerError> {
        self.state
            .lock()
            .map_err(|_| PlayerError::InternalConsistency("verrou d'affichage empoisonné".into()))
    }

    /// Rend la surface (pour la libérer explicitement).
    pub fn into_surface(self) -> S {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .surface
    }
}
