// Doubles de test : source en mémoire, surface enregistreuse, entrée scriptée.

use std::collections::{HashMap, VecDeque};
use std::thread;
use std::time::Duration;

use ap_core::error::PlayerError;
use ap_core::frame::Bitmap;
use ap_core::traits::{CellColor, InputSource, Source, Surface, UserEvent};

type Cells = HashMap<(u16, u16), (char, CellColor)>;

/// Contenu d'un `flush`.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    cells: Cells,
    cols: u16,
}

impl Snapshot {
    pub fn cell(&self, col: u16, row: u16) -> Option<(char, CellColor)> {
        self.cells.get(&(col, row)).copied()
    }

    pub fn row_text(&self, row: u16) -> String {
        (0..self.cols)
            .map(|col| self.cells.get(&(col, row)).map_or(' ', |c| c.0))
            .collect::<String>()
            .trim_end()
            .to_string()
    }
}

pub struct RecordingSurface {
    size: (u16, u16),
    staged: Cells,
    flushes: Vec<Snapshot>,
    pub fail_flush: bool,
}

impl RecordingSurface {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            size: (cols, rows),
            staged: HashMap::new(),
            flushes: Vec::new(),
            fail_flush: false,
        }
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.len()
    }

    pub fn flushes(&self) -> &[Snapshot] {
        &self.flushes
    }

    pub fn last_flush(&self) -> Option<&Snapshot> {
        self.flushes.last()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Result<(u16, u16), PlayerError> {
        Ok(self.size)
    }

    fn clear(&mut self) {
        self.staged.clear();
    }

    fn set_cell(&mut self, col: u16, row: u16, glyph: char, fg: CellColor) {
        if col < self.size.0 && row < self.size.1 {
            self.staged.insert((col, row), (glyph, fg));
        }
    }

    fn flush(&mut self) -> Result<(), PlayerError> {
        if self.fail_flush {
            return Err(PlayerError::TerminalUnavailable("flush refusé".into()));
        }
        self.flushes.push(Snapshot {
            cells: self.staged.clone(),
            cols: self.size.0,
        });
        Ok(())
    }
}

/// Bitmap 8×8 uniforme de gris `v`.
pub fn gray(v: u8) -> Bitmap {
    Bitmap::filled(8, 8, (v, v, v))
}

/// Source finie, éventuellement terminée par une erreur.
pub struct VecSource {
    items: VecDeque<Result<Bitmap, PlayerError>>,
}

impl VecSource {
    pub fn new(items: Vec<Result<Bitmap, PlayerError>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// `n` frames de gris 1, 2, ..., n.
    pub fn numbered(n: u8) -> Self {
        Self::new((1..=n).map(|v| Ok(gray(v))).collect())
    }
}

impl Source for VecSource {
    fn next_bitmap(&mut self) -> Result<Option<Bitmap>, PlayerError> {
        self.items.pop_front().transpose()
    }

    fn native_size(&self) -> (u32, u32) {
        (8, 8)
    }
}

/// Source infinie.
pub struct EndlessSource {
    next: u8,
}

impl EndlessSource {
    pub fn new() -> Self {
        Self { next: 0 }
    }
}

impl Source for EndlessSource {
    fn next_bitmap(&mut self) -> Result<Option<Bitmap>, PlayerError> {
        self.next = self.next.wrapping_add(1);
        Ok(Some(gray(self.next)))
    }

    fn native_size(&self) -> (u32, u32) {
        (8, 8)
    }
}

/// Rejoue un script d'événements, puis reste silencieux.
pub struct ScriptedInput {
    script: VecDeque<Result<Option<UserEvent>, PlayerError>>,
    step: Duration,
}

impl ScriptedInput {
    pub fn new(script: Vec<Result<Option<UserEvent>, PlayerError>>, step: Duration) -> Self {
        Self {
            script: script.into(),
            step,
        }
    }

    pub fn idle() -> Self {
        Self::new(Vec::new(), Duration::from_millis(2))
    }
}

impl InputSource for ScriptedInput {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<UserEvent>, PlayerError> {
        thread::sleep(self.step.min(timeout));
        self.script.pop_front().unwrap_or(Ok(None))
    }
}
