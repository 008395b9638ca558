// Ordonnanceur de lecture : producteur → tampon borné → consommateur cadencé.
//
// Trois threads partagent un même `StopSignal` :
//   - producteur : décode et pousse dans le tampon (bloque quand plein)
//   - écoute     : lit le clavier, déclenche l'arrêt sur Enter/q/Esc/Ctrl-C
//   - consommateur (thread appelant) : préchargement, puis une frame par tick

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ap_ascii::Rasterizer;
use ap_core::config::{PlaybackSettings, PlayerConfig};
use ap_core::error::PlayerError;
use ap_core::traits::{InputSource, Source, Surface, UserEvent};

use crate::display::Display;
use crate::staging::{FrameReceiver, FrameSender, Pull, Push, staging_buffer};
use crate::stop::{StopReason, StopSignal};

/// Délai max d'une attente clavier : borne la réactivité à l'arrêt.
const LISTEN_POLL: Duration = Duration::from_millis(50);

/// État de la session. `Stopped` est terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// Waiting for the buffer to reach its watermark.
    Priming,
    /// One frame per tick.
    Streaming,
    /// Teardown: stop broadcast, ticker stopped, buffer released.
    Draining,
    Stopped,
}

/// Bilan d'une session de lecture.
#[derive(Clone, Debug)]
pub struct PlaybackReport {
    pub frames_displayed: u64,
    pub stop_reason: StopReason,
    /// Decoder failure; frames already buffered were still shown.
    pub source_error: Option<PlayerError>,
    pub final_state: PlaybackState,
    /// Every state entered, in order.
    pub transitions: Vec<PlaybackState>,
}

impl PlaybackReport {
    /// Convertit le bilan en résultat : un arrêt utilisateur ou une fin de
    /// flux est un succès, toute erreur est fatale.
    ///
    /// # Errors
    /// The failure that stopped playback, or the decoder error.
    pub fn into_result(self) -> Result<u64, PlayerError> {
        if let StopReason::Failed(e) = self.stop_reason {
            return Err(e);
        }
        match self.source_error {
            Some(e) => Err(e),
            None => Ok(self.frames_displayed),
        }
    }
}

/// Ordonnanceur d'une session de lecture.
pub struct Scheduler {
    rasterizer: Rasterizer,
    buffer_size: usize,
    frame_interval: Duration,
    fully_filled: bool,
}

impl Scheduler {
    pub fn new(rasterizer: Rasterizer, config: &PlayerConfig, settings: &PlaybackSettings) -> Self {
        Self {
            rasterizer,
            buffer_size: config.buffer_size.max(1),
            frame_interval: Duration::from_secs_f64(
                1.0 / f64::from(settings.target_frame_rate.max(1)),
            ),
            fully_filled: settings.fully_filled,
        }
    }

    /// Joue `source` jusqu'à épuisement, arrêt utilisateur ou erreur.
    ///
    /// # Errors
    /// Only thread spawn or join failures; playback failures are in the report.
    pub fn run<Src, Sfc, In>(
        &self,
        source: Src,
        display: &Display<Sfc>,
        input: In,
    ) -> Result<PlaybackReport>
    where
        Src: Source,
        Sfc: Surface,
        In: InputSource,
    {
        let stop = StopSignal::new();
        let (tx, rx) = staging_buffer(self.buffer_size);

        thread::scope(|scope| -> Result<PlaybackReport> {
            let producer_stop = stop.clone();
            let producer = thread::Builder::new()
                .name("ap-producer".into())
                .spawn_scoped(scope, move || produce(source, tx, &producer_stop))
                .context("Impossible de lancer le thread producteur")?;

            let listener_stop = stop.clone();
            let listener = match thread::Builder::new()
                .name("ap-listener".into())
                .spawn_scoped(scope, move || listen(input, &listener_stop))
            {
                Ok(handle) => handle,
                Err(e) => {
                    stop.trip(StopReason::Failed(PlayerError::InternalConsistency(
                        "thread d'écoute".into(),
                    )));
                    return Err(e).context("Impossible de lancer le thread d'écoute");
                }
            };

            let mut session = Session::new();
            self.consume(&rx, display, &stop, &mut session);
            // Buffer released: a producer blocked on a full buffer sees `Closed`.
            drop(rx);

            let source_error = match producer.join() {
                Ok(Ok(pushed)) => {
                    log::debug!("producteur terminé : {pushed} frames poussées");
                    None
                }
                Ok(Err(e)) => Some(e),
                Err(_) => anyhow::bail!("Le thread producteur a paniqué"),
            };
            if listener.join().is_err() {
                anyhow::bail!("Le thread d'écoute a paniqué");
            }

            session.enter(PlaybackState::Stopped);
            let stop_reason = stop.reason().unwrap_or(StopReason::SourceExhausted);
            log::info!(
                "lecture terminée : {} frames, arrêt {stop_reason:?}",
                session.frames
            );
            Ok(PlaybackReport {
                frames_displayed: session.frames,
                stop_reason,
                source_error,
                final_state: session.state,
                transitions: session.transitions,
            })
        })
    }

    /// Boucle du consommateur : Priming → Streaming → Draining.
    fn consume<Sfc: Surface>(
        &self,
        rx: &FrameReceiver,
        display: &Display<Sfc>,
        stop: &StopSignal,
        session: &mut Session,
    ) {
        if rx.wait_primed(stop) {
            log::debug!("préchargé : {} frames en tampon", rx.len());
            session.enter(PlaybackState::Streaming);
            self.stream(rx, display, stop, session);
        }

        session.enter(PlaybackState::Draining);
        // No-op if a user stop or a failure already tripped it.
        stop.trip(StopReason::SourceExhausted);
    }

    fn stream<Sfc: Surface>(
        &self,
        rx: &FrameReceiver,
        display: &Display<Sfc>,
        stop: &StopSignal,
        session: &mut Session,
    ) {
        let mut next_tick = Instant::now() + self.frame_interval;
        loop {
            if stop.wait_until(next_tick) {
                return;
            }
            // Late ticks are dropped, never queued.
            next_tick = (next_tick + self.frame_interval).max(Instant::now());

            let bitmap = match rx.pull(stop) {
                Pull::Frame(bitmap) => bitmap,
                Pull::Closed => {
                    log::debug!("tampon fermé et vide");
                    return;
                }
                Pull::Stopped => return,
            };

            let shown = display.canvas_size().and_then(|(cols, rows)| {
                let frame = self
                    .rasterizer
                    .rasterize(&bitmap, cols, rows, self.fully_filled)?;
                display.show(&frame)
            });
            match shown {
                Ok(rate) => {
                    session.frames += 1;
                    if let Some(rate) = rate {
                        log::trace!("frame {} : {rate:.1} fps", session.frames);
                    }
                }
                Err(e) => {
                    log::error!("affichage impossible : {e}");
                    stop.trip(StopReason::Failed(e));
                    return;
                }
            }
        }
    }
}

struct Session {
    state: PlaybackState,
    transitions: Vec<PlaybackState>,
    frames: u64,
}

impl Session {
    fn new() -> Self {
        Self {
            state: PlaybackState::Priming,
            transitions: vec![PlaybackState::Priming],
            frames: 0,
        }
    }

    fn enter(&mut self, next: PlaybackState) {
        log::debug!("état : {:?} → {next:?}", self.state);
        self.state = next;
        self.transitions.push(next);
    }
}

/// Thread producteur. Le drop de `tx` en sortie ferme le tampon.
fn produce<Src: Source>(
    mut source: Src,
    mut tx: FrameSender,
    stop: &StopSignal,
) -> Result<usize, PlayerError> {
    loop {
        if stop.is_tripped() {
            return Ok(tx.pushed());
        }
        match source.next_bitmap() {
            Ok(Some(bitmap)) => match tx.push(bitmap, stop) {
                Push::Accepted => {}
                Push::Stopped | Push::Closed => return Ok(tx.pushed()),
            },
            Ok(None) => {
                log::info!("source épuisée après {} frames", tx.pushed());
                return Ok(tx.pushed());
            }
            Err(e) => {
                log::warn!("erreur de décodage, fin du flux : {e}");
                return Err(e);
            }
        }
    }
}

/// Thread d'écoute clavier.
fn listen<In: InputSource>(mut input: In, stop: &StopSignal) {
    while !stop.is_tripped() {
        match input.poll_event(LISTEN_POLL) {
            Ok(Some(UserEvent::StopRequested)) => {
                log::info!("arrêt demandé par l'utilisateur");
                stop.trip(StopReason::UserRequested);
            }
            Ok(Some(UserEvent::Resized)) => log::debug!("terminal redimensionné"),
            Ok(Some(UserEvent::Key) | None) => {}
            Err(e) => {
                log::error!("lecture clavier impossible : {e}");
                stop.trip(StopReason::Failed(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::StatusLine;
    use crate::testing::{
        EndlessSource, RecordingSurface, ScriptedInput, VecSource, gray,
    };
    use ap_core::charset::Palette;

    const FAST_FPS: u32 = 500;

    fn scheduler(buffer_size: usize) -> Scheduler {
        let config = PlayerConfig {
            buffer_size,
            ..PlayerConfig::default()
        };
        let settings = PlaybackSettings::new("test", FAST_FPS, true, false).unwrap();
        let rasterizer = Rasterizer::new(Palette::new(" .#").unwrap(), 0.5);
        Scheduler::new(rasterizer, &config, &settings)
    }

    fn display() -> Display<RecordingSurface> {
        // 8×4 canvas under the status line: an 8×8 bitmap maps 1:1 on columns.
        Display::new(RecordingSurface::new(8, 5), true, StatusLine::Playback)
    }

    /// Gris de la cellule (0, 1) à chaque flush.
    fn shown_values(surface: &RecordingSurface) -> Vec<u8> {
        surface
            .flushes()
            .iter()
            .filter_map(|s| s.cell(0, 1).and_then(|(_, fg)| fg).map(|(r, _, _)| r))
            .collect()
    }

    #[test]
    fn finite_source_displays_every_frame_in_order() {
        for n in [0u8, 1, 5] {
            let display = display();
            let report = scheduler(3)
                .run(VecSource::numbered(n), &display, ScriptedInput::idle())
                .unwrap();
            assert_eq!(report.frames_displayed, u64::from(n));
            assert_eq!(report.stop_reason, StopReason::SourceExhausted);
            assert_eq!(report.final_state, PlaybackState::Stopped);
            assert!(report.source_error.is_none());
            let expected: Vec<u8> = (1..=n).collect();
            assert_eq!(shown_values(&display.into_surface()), expected);
        }
    }

    #[test]
    fn buffer_primed_to_capacity_drains_without_blocking() {
        let display = display();
        let report = scheduler(3)
            .run(VecSource::numbered(3), &display, ScriptedInput::idle())
            .unwrap();
        assert_eq!(
            report.transitions,
            vec![
                PlaybackState::Priming,
                PlaybackState::Streaming,
                PlaybackState::Draining,
                PlaybackState::Stopped,
            ]
        );
        assert_eq!(shown_values(&display.into_surface()), vec![1, 2, 3]);
    }

    #[test]
    fn user_stop_ends_endless_playback() {
        let display = display();
        let mut script: Vec<_> = (0..10).map(|_| Ok(None)).collect();
        script.push(Ok(Some(UserEvent::Key)));
        script.push(Ok(Some(UserEvent::StopRequested)));
        let input = ScriptedInput::new(script, Duration::from_millis(5));

        let report = scheduler(4)
            .run(EndlessSource::new(), &display, input)
            .unwrap();
        assert_eq!(report.stop_reason, StopReason::UserRequested);
        assert_eq!(report.final_state, PlaybackState::Stopped);
        let shown = display.into_surface().flush_count();
        assert_eq!(report.frames_displayed, shown as u64);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn decode_error_drains_buffered_frames_then_fails() {
        let display = display();
        let source = VecSource::new(vec![
            Ok(gray(10)),
            Ok(gray(20)),
            Err(PlayerError::DecodeCorrupt("frame tronquée".into())),
            Ok(gray(30)),
        ]);
        let report = scheduler(8)
            .run(source, &display, ScriptedInput::idle())
            .unwrap();
        assert_eq!(report.frames_displayed, 2);
        assert_eq!(report.stop_reason, StopReason::SourceExhausted);
        assert!(matches!(
            report.source_error,
            Some(PlayerError::DecodeCorrupt(_))
        ));
        assert_eq!(shown_values(&display.into_surface()), vec![10, 20]);
        assert!(report.into_result().is_err());
    }

    #[test]
    fn surface_failure_stops_playback() {
        let mut surface = RecordingSurface::new(8, 5);
        surface.fail_flush = true;
        let display = Display::new(surface, false, StatusLine::Playback);
        let report = scheduler(2)
            .run(EndlessSource::new(), &display, ScriptedInput::idle())
            .unwrap();
        assert!(matches!(
            report.stop_reason,
            StopReason::Failed(PlayerError::TerminalUnavailable(_))
        ));
        assert_eq!(report.frames_displayed, 0);
    }

    #[test]
    fn input_failure_stops_playback() {
        let display = display();
        let input = ScriptedInput::new(
            vec![Err(PlayerError::TerminalUnavailable("stdin fermé".into()))],
            Duration::from_millis(1),
        );
        let report = scheduler(2)
            .run(EndlessSource::new(), &display, input)
            .unwrap();
        assert!(matches!(report.stop_reason, StopReason::Failed(_)));
        assert!(report.into_result().is_err());
    }

    #[test]
    fn tiny_terminal_is_invalid_dimensions() {
        let display = Display::new(RecordingSurface::new(8, 1), false, StatusLine::Playback);
        let report = scheduler(1)
            .run(VecSource::numbered(2), &display, ScriptedInput::idle())
            .unwrap();
        assert!(matches!(
            report.stop_reason,
            StopReason::Failed(PlayerError::InvalidDimensions { .. })
        ));
    }
}
