/// Terminal rendering for asciiplay.
///
/// Provides the ratatui drawing surface, crossterm input, and frame-rate tracking.
pub mod canvas;
pub mod fps;
pub mod input;
pub mod surface;

pub use input::CrosstermInput;
pub use surface::TerminalSurface;
