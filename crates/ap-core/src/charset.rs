use crate::error::PlayerError;

/// 127 glyphes: rampe par défaut, 36 espaces en tête pour garder les zones sombres vides.
pub const PALETTE_DEFAULT: &str = concat!(
    "                                    ",
    "`.-':_,^=;><+!rc*/z?sLTv)J7(|Fi{C}fI31tlu[neoZ5Yxjya]2ESwqkP6h9d4VpOGbUAKXHm8RD#$Bg0MNWQ%&@"
);

/// 10 caractères: compact, bon contraste.
pub const PALETTE_COMPACT: &str = " .:-=+*#%@";

/// Blocs Unicode: pseudo-pixels.
pub const PALETTE_BLOCKS: &str = " ░▒▓█";

/// Glyph used for every cell in fully-filled mode.
pub const SOLID_BLOCK: char = '█';

/// Ordered glyph ramp, lightest → densest, with a precomputed luminance lookup.
///
/// A luminance `l` maps to `glyphs[floor(l / 255 × (len − 1))]`. The table is
/// built once, so mapping costs a single index per cell.
///
/// # Example
/// ```
/// use ap_core::charset::Palette;
/// let palette = Palette::new(" .:#@").unwrap();
/// assert_eq!(palette.map(0), ' ');
/// assert_eq!(palette.map(255), '@');
/// ```
#[derive(Clone, Debug)]
pub struct Palette {
    glyphs: Vec<char>,
    lut: [char; 256],
}

impl Palette {
    /// Build a palette from a glyph ramp ordered lightest→densest.
    ///
    /// # Errors
    /// Returns [`PlayerError::Config`] if the ramp is empty.
    pub fn new(ramp: &str) -> Result<Self, PlayerError> {
        let glyphs: Vec<char> = ramp.chars().collect();
        if glyphs.is_empty() {
            return Err(PlayerError::Config("palette vide".to_string()));
        }
        Ok(Self::from_glyphs(glyphs))
    }

    /// `glyphs` must be non-empty.
    fn from_glyphs(glyphs: Vec<char>) -> Self {
        let last = glyphs.len() - 1;
        let mut lut = [' '; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            *slot = glyphs[i * last / 255];
        }
        Self { glyphs, lut }
    }

    /// Map a luminance value [0..255] to a glyph.
    ///
    /// # Example
    /// ```
    /// use ap_core::charset::Palette;
    /// let palette = Palette::new(" .#").unwrap();
    /// assert_eq!(palette.map(127), ' ');
    /// assert_eq!(palette.map(128), '.');
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn map(&self, luminance: u8) -> char {
        self.lut[luminance as usize]
    }

    /// Number of glyphs in the ramp, never zero.
    #[must_use]
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_glyphs(PALETTE_DEFAULT.chars().collect())
    }
}
