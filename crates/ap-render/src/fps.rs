use std::collections::VecDeque;
use std::time::Instant;

/// Taux instantané entre deux frames consécutives.
///
/// Le premier appel n'a pas de référence et retourne `None`, les suivants
/// retournent `1 / (now - last)`.
///
/// # Example
/// ```
/// use ap_render::fps::FrameTimer;
/// use std::time::{Duration, Instant};
/// let mut timer = FrameTimer::new();
/// let t0 = Instant::now();
/// assert!(timer.record_frame_at(t0).is_none());
/// let rate = timer.record_frame_at(t0 + Duration::from_millis(40)).unwrap();
/// assert!((rate - 25.0).abs() < 1e-6);
/// ```
#[derive(Debug, Default)]
pub struct FrameTimer {
    last: Option<Instant>,
}

impl FrameTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre une frame maintenant.
    pub fn record_frame(&mut self) -> Option<f64> {
        self.record_frame_at(Instant::now())
    }

    /// Enregistre une frame à l'instant `now`.
    ///
    /// Un intervalle nul (horloge trop grossière) ne produit pas de taux,
    /// mais `now` devient quand même la nouvelle référence.
    pub fn record_frame_at(&mut self, now: Instant) -> Option<f64> {
        let previous = self.last.replace(now)?;
        let secs = now.saturating_duration_since(previous).as_secs_f64();
        (secs > 0.0).then_some(1.0 / secs)
    }
}

/// Compteur FPS par fenêtre glissante. Zéro allocation après init.
///
/// # Example
/// ```
/// use ap_render::fps::FpsCounter;
/// let mut counter = FpsCounter::new(30);
/// counter.tick();
/// assert!(counter.fps() >= 0.0);
/// ```
pub struct FpsCounter {
    /// Timestamps des dernières N frames.
    timestamps: VecDeque<Instant>,
    /// Taille de la fenêtre (nombre de frames à moyenner).
    window: usize,
    /// FPS calculé, mis à jour à chaque tick.
    fps: f64,
    /// Temps de la dernière frame en ms.
    pub frame_time_ms: f64,
}

impl FpsCounter {
    /// Create a new FPS counter with the given averaging window size.
    #[must_use]
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            timestamps: VecDeque::with_capacity(window + 1),
            window,
            fps: 0.0,
            frame_time_ms: 0.0,
        }
    }

    /// Appeler une fois par frame, APRÈS le rendu.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Variante horodatée de [`tick`](Self::tick).
    pub fn tick_at(&mut self, now: Instant) {
        if let Some(&last) = self.timestamps.back() {
            self.frame_time_ms = now.saturating_duration_since(last).as_secs_f64() * 1000.0;
        }
        self.timestamps.push_back(now);
        if self.timestamps.len() > self.window {
            self.timestamps.pop_front();
        }
        if let Some(&first) = self.timestamps.front() {
            let secs = now.saturating_duration_since(first).as_secs_f64();
            if self.timestamps.len() >= 2 && secs > 0.0 {
                self.fps = (self.timestamps.len() - 1) as f64 / secs;
            }
        }
    }

    /// FPS moyen sur la fenêtre.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}
