use crate::error::PlayerError;

/// Bitmap décodé, immuable une fois produit par le décodeur.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel. L'alpha est ignoré
/// par la rasterisation.
///
/// # Example
/// ```
/// use ap_core::frame::Bitmap;
/// let bmp = Bitmap::new(10, 10);
/// assert_eq!(bmp.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Bitmap {
    /// Crée un bitmap noir transparent aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wrap raw RGBA bytes handed over by a decoder.
    ///
    /// # Errors
    /// Returns [`PlayerError::DecodeCorrupt`] if `data` is not exactly
    /// `width × height × 4` bytes long.
    ///
    /// # Example
    /// ```
    /// use ap_core::frame::Bitmap;
    /// assert!(Bitmap::from_rgba(2, 1, vec![0; 8]).is_ok());
    /// assert!(Bitmap::from_rgba(2, 1, vec![0; 7]).is_err());
    /// ```
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PlayerError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(PlayerError::DecodeCorrupt(format!(
                "bitmap {width}×{height} : {} bytes reçus, {expected} attendus",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Bitmap rempli d'une couleur unie (alpha opaque).
    ///
    /// # Example
    /// ```
    /// use ap_core::frame::Bitmap;
    /// let bmp = Bitmap::filled(3, 2, (10, 20, 30));
    /// assert_eq!(bmp.pixel(2, 1), (10, 20, 30));
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: (u8, u8, u8)) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Accès au pixel (x, y) → (r, g, b).
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }

    /// Overwrite the colour of pixel (x, y), alpha set opaque.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: (u8, u8, u8)) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.data[idx..idx + 4].copy_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
    }

    /// One row of RGBA bytes.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }
}

/// Couleur moyenne d'un bloc, avec sa luminance dérivée.
///
/// La luminance n'est pas modifiable indépendamment : elle est toujours
/// recalculée depuis le triplet (r, g, b) du constructeur.
///
/// # Example
/// ```
/// use ap_core::frame::RepresentativePixel;
/// let px = RepresentativePixel::new(255, 255, 255);
/// assert_eq!(px.luminance(), 255);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RepresentativePixel {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
    luminance: u8,
}

impl RepresentativePixel {
    /// Luma BT.601 : `round(0.299·R + 0.587·G + 0.114·B)`.
    #[inline(always)]
    #[must_use]
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            luminance: luma_601(red, green, blue),
        }
    }

    /// Derived luminance [0..255].
    #[inline(always)]
    #[must_use]
    pub fn luminance(&self) -> u8 {
        self.luminance
    }

    /// (r, g, b) tuple, as drawn in colour mode.
    #[inline]
    #[must_use]
    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }
}

/// Integer BT.601 luma, rounded half-up. Weights sum to 1000 so white maps to 255.
///
/// # Example
/// ```
/// use ap_core::frame::luma_601;
/// assert_eq!(luma_601(0, 0, 0), 0);
/// assert_eq!(luma_601(255, 0, 0), 76);
/// assert_eq!(luma_601(0, 255, 0), 150);
/// ```
#[inline(always)]
#[must_use]
pub fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000) as u8
}

/// Résultat d'une rasterisation : grille de pixels représentatifs et grille
/// parallèle de glyphes, mêmes dimensions, row-major (haut→bas, gauche→droite).
///
/// Créée à chaque appel, jamais mutée après construction.
///
/// # Example
/// ```
/// use ap_core::frame::{Frame, RepresentativePixel};
/// let px = RepresentativePixel::new(0, 0, 0);
/// let frame = Frame::from_parts(2, 1, vec![px; 2], vec![' '; 2]).unwrap();
/// assert_eq!(frame.glyph(1, 0), ' ');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    cols: u16,
    rows: u16,
    pixels: Vec<RepresentativePixel>,
    glyphs: Vec<char>,
}

impl Frame {
    /// Assemble a frame from flat row-major grids.
    ///
    /// # Errors
    /// Returns [`PlayerError::InternalConsistency`] if either grid does not
    /// hold exactly `cols × rows` entries.
    pub fn from_parts(
        cols: u16,
        rows: u16,
        pixels: Vec<RepresentativePixel>,
        glyphs: Vec<char>,
    ) -> Result<Self, PlayerError> {
        let cells = usize::from(cols) * usize::from(rows);
        if pixels.len() != cells || glyphs.len() != cells {
            return Err(PlayerError::InternalConsistency(format!(
                "grille {cols}×{rows} : {} pixels, {} glyphes",
                pixels.len(),
                glyphs.len()
            )));
        }
        Ok(Self {
            cols,
            rows,
            pixels,
            glyphs,
        })
    }

    /// Width in cells.
    #[must_use]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Height in cells.
    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Representative pixel at (col, row).
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, col: u16, row: u16) -> RepresentativePixel {
        self.pixels[usize::from(row) * usize::from(self.cols) + usize::from(col)]
    }

    /// Glyph at (col, row).
    #[inline(always)]
    #[must_use]
    pub fn glyph(&self, col: u16, row: u16) -> char {
        self.glyphs[usize::from(row) * usize::from(self.cols) + usize::from(col)]
    }

    /// Flat row-major pixel grid.
    #[must_use]
    pub fn pixels(&self) -> &[RepresentativePixel] {
        &self.pixels
    }

    /// Flat row-major glyph grid.
    #[must_use]
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    /// Iterate rows as `(pixels, glyphs)` slice pairs, top to bottom.
    pub fn row_iter(&self) -> impl Iterator<Item = (&[RepresentativePixel], &[char])> {
        let width = usize::from(self.cols).max(1);
        self.pixels
            .chunks(width)
            .zip(self.glyphs.chunks(width))
    }
}
