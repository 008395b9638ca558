use ap_core::traits::CellColor;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

/// Cellule en attente d'affichage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StagedCell {
    pub ch: char,
    pub fg: CellColor,
}

impl Default for StagedCell {
    fn default() -> Self {
        Self { ch: ' ', fg: None }
    }
}

/// Grille de cellules préparée entre deux `flush`.
///
/// # Example
/// ```
/// use ap_render::canvas::CellGrid;
/// let mut grid = CellGrid::new(4, 2);
/// grid.set(1, 1, '#', Some((255, 0, 0)));
/// assert_eq!(grid.get(1, 1).map(|c| c.ch), Some('#'));
/// assert!(grid.get(4, 0).is_none());
/// ```
#[derive(Clone, Debug)]
pub struct CellGrid {
    width: u16,
    height: u16,
    cells: Vec<StagedCell>,
}

impl CellGrid {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![StagedCell::default(); usize::from(width) * usize::from(height)],
        }
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Vide la grille et adopte la taille donnée.
    pub fn reset(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize(usize::from(width) * usize::from(height), StagedCell::default());
    }

    /// Écrit une cellule. Hors limites : ignoré.
    pub fn set(&mut self, x: u16, y: u16, ch: char, fg: CellColor) {
        if x < self.width && y < self.height {
            let idx = usize::from(y) * usize::from(self.width) + usize::from(x);
            self.cells[idx] = StagedCell { ch, fg };
        }
    }

    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&StagedCell> {
        if x < self.width && y < self.height {
            self.cells
                .get(usize::from(y) * usize::from(self.width) + usize::from(x))
        } else {
            None
        }
    }
}

/// Écrit directement une `CellGrid` dans un `ratatui::Buffer`.
///
/// Pas de widget ratatui, écriture directe cellule par cellule.
/// Une cellule sans couleur garde l'attribut par défaut du terminal.
pub fn render_grid(buf: &mut Buffer, area: Rect, grid: &CellGrid) {
    for cy in 0..grid.height().min(area.height) {
        for cx in 0..grid.width().min(area.width) {
            let Some(cell) = grid.get(cx, cy) else {
                continue;
            };
            if let Some(buf_cell) = buf.cell_mut((area.x + cx, area.y + cy)) {
                buf_cell.set_char(cell.ch);
                buf_cell.set_fg(match cell.fg {
                    Some((r, g, b)) => Color::Rgb(r, g, b),
                    None => Color::Reset,
                });
            }
        }
    }
}
