use std::time::Duration;

use crate::error::PlayerError;
use crate::frame::Bitmap;

/// Fournit des bitmaps décodés au producteur.
///
/// Implémenté par : `ImageSource`, `VideoSource`.
///
/// # Example
/// ```
/// use ap_core::traits::Source;
/// use ap_core::frame::Bitmap;
/// use ap_core::error::PlayerError;
///
/// struct Empty;
/// impl Source for Empty {
///     fn next_bitmap(&mut self) -> Result<Option<Bitmap>, PlayerError> { Ok(None) }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
/// }
/// ```
pub trait Source: Send {
    /// Décode le bitmap suivant. Peut bloquer le temps du décodage.
    ///
    /// Retourne `Ok(None)` quand la source est épuisée.
    ///
    /// # Errors
    /// [`PlayerError::DecodeCorrupt`] on a malformed frame or broken stream,
    /// [`PlayerError::InputUnavailable`] if the source vanished.
    fn next_bitmap(&mut self) -> Result<Option<Bitmap>, PlayerError>;

    /// Dimensions natives de la source (avant tout redimensionnement).
    fn native_size(&self) -> (u32, u32);
}

/// Foreground colour of a drawn cell. `None` = terminal default attribute.
pub type CellColor = Option<(u8, u8, u8)>;

/// Surface de dessin en grille de cellules.
///
/// L'initialisation est faite par le constructeur de l'implémentation, la
/// libération par son `Drop`.
pub trait Surface: Send {
    /// Current terminal size as (cols, rows).
    ///
    /// # Errors
    /// [`PlayerError::TerminalUnavailable`] if the geometry cannot be read.
    fn size(&self) -> Result<(u16, u16), PlayerError>;

    /// Reset every staged cell to blank.
    fn clear(&mut self);

    /// Stage one cell. Out-of-bounds coordinates are ignored.
    fn set_cell(&mut self, col: u16, row: u16, glyph: char, fg: CellColor);

    /// Push staged cells to the screen.
    ///
    /// # Errors
    /// [`PlayerError::TerminalUnavailable`] if the write fails.
    fn flush(&mut self) -> Result<(), PlayerError>;
}

/// Événement utilisateur pertinent pour la lecture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserEvent {
    /// Enter, q, Esc ou Ctrl-C.
    StopRequested,
    /// The terminal was resized.
    Resized,
    /// Any other key press.
    Key,
}

/// Source d'événements clavier, lue par le thread d'écoute.
pub trait InputSource: Send {
    /// Attend un événement au plus `timeout`.
    ///
    /// # Errors
    /// [`PlayerError::TerminalUnavailable`] if the terminal event stream fails.
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<UserEvent>, PlayerError>;
}
