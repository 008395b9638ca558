use ap_core::error::PlayerError;
use ap_core::traits::{CellColor, Surface};
use ratatui::DefaultTerminal;

use crate::canvas::{self, CellGrid};

/// Surface terminal ratatui (écran alternatif, mode raw).
///
/// Le terminal est restauré au `Drop`, y compris lors d'un unwinding.
pub struct TerminalSurface {
    terminal: DefaultTerminal,
    grid: CellGrid,
}

impl TerminalSurface {
    /// Passe le terminal en écran alternatif + mode raw.
    ///
    /// # Errors
    /// [`PlayerError::TerminalUnavailable`] if stdout is not a usable terminal.
    pub fn init() -> Result<Self, PlayerError> {
        let terminal = ratatui::try_init()
            .map_err(|e| PlayerError::TerminalUnavailable(e.to_string()))?;
        let mut surface = Self {
            terminal,
            grid: CellGrid::new(0, 0),
        };
        let (cols, rows) = surface.size()?;
        surface.grid.reset(cols, rows);
        log::debug!("terminal initialisé : {cols}x{rows}");
        Ok(surface)
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> Result<(u16, u16), PlayerError> {
        let size = self
            .terminal
            .size()
            .map_err(|e| PlayerError::TerminalUnavailable(e.to_string()))?;
        Ok((size.width, size.height))
    }

    fn clear(&mut self) {
        match self.size() {
            Ok((cols, rows)) => self.grid.reset(cols, rows),
            Err(e) => {
                log::warn!("taille terminal illisible, grille conservée : {e}");
                self.grid.reset(self.grid.width(), self.grid.height());
            }
        }
    }

    fn set_cell(&mut self, col: u16, row: u16, glyph: char, fg: CellColor) {
        self.grid.set(col, row, glyph, fg);
    }

    fn flush(&mut self) -> Result<(), PlayerError> {
        let grid = &self.grid;
        self.terminal
            .draw(|frame| {
                let area = frame.area();
                canvas::render_grid(frame.buffer_mut(), area, grid);
            })
            .map_err(|e| PlayerError::TerminalUnavailable(e.to_string()))?;
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        ratatui::restore();
        log::debug!("terminal restauré");
    }
}
