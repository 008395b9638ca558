use std::time::Duration;

use ap_core::error::PlayerError;
use ap_core::traits::{InputSource, UserEvent};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Événements clavier/terminal lus via crossterm.
#[derive(Debug, Default)]
pub struct CrosstermInput;

impl CrosstermInput {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl InputSource for CrosstermInput {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<UserEvent>, PlayerError> {
        let ready =
            event::poll(timeout).map_err(|e| PlayerError::TerminalUnavailable(e.to_string()))?;
        if !ready {
            return Ok(None);
        }
        let ev = event::read().map_err(|e| PlayerError::TerminalUnavailable(e.to_string()))?;
        Ok(map_event(&ev))
    }
}

/// Traduit un événement crossterm en événement de lecture.
///
/// Seuls les appuis (`KeyEventKind::Press`) comptent : Enter, `q`, Esc et
/// Ctrl-C demandent l'arrêt, toute autre touche donne [`UserEvent::Key`].
///
/// # Example
/// ```
/// use ap_render::input::map_event;
/// use ap_core::traits::UserEvent;
/// use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
/// let ev = Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
/// assert_eq!(map_event(&ev), Some(UserEvent::StopRequested));
/// ```
#[must_use]
pub fn map_event(ev: &Event) -> Option<UserEvent> {
    match ev {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(map_key(key)),
        Event::Resize(..) => Some(UserEvent::Resized),
        _ => None,
    }
}

fn map_key(key: &KeyEvent) -> UserEvent {
    match key.code {
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => UserEvent::StopRequested,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            UserEvent::StopRequested
        }
        _ => UserEvent::Key,
    }
}
