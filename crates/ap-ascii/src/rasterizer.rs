use ap_core::charset::{Palette, SOLID_BLOCK};
use ap_core::config::PlayerConfig;
use ap_core::error::PlayerError;
use ap_core::frame::{Bitmap, Frame, RepresentativePixel};
use ap_core::sizing::{GridSize, compute_grid_size};
use rayon::prelude::*;

/// Réduit un bitmap en grille de blocs : couleur moyenne + glyphe par bloc.
///
/// Les lignes de blocs sont calculées en parallèle (rayon), chaque ligne
/// n'écrivant que sa propre tranche de la grille de sortie. Le résultat est
/// identique quel que soit le nombre de threads.
///
/// # Example
/// ```
/// use ap_ascii::rasterizer::Rasterizer;
/// use ap_core::charset::Palette;
/// use ap_core::frame::Bitmap;
///
/// let rasterizer = Rasterizer::new(Palette::new(" .#").unwrap(), 0.5);
/// let frame = rasterizer.rasterize(&Bitmap::filled(64, 48, (255, 255, 255)), 80, 24, false).unwrap();
/// assert!(frame.glyphs().iter().all(|&g| g == '#'));
/// ```
#[derive(Clone, Debug)]
pub struct Rasterizer {
    palette: Palette,
    aspect_correction: f64,
}

impl Rasterizer {
    /// Create a rasterizer with a palette and a cell aspect correction `k`.
    #[must_use]
    pub fn new(palette: Palette, aspect_correction: f64) -> Self {
        Self {
            palette,
            aspect_correction,
        }
    }

    /// Build from the `[render]` part of a config.
    ///
    /// # Errors
    /// Returns [`PlayerError::Config`] if the palette is empty.
    pub fn from_config(config: &PlayerConfig) -> Result<Self, PlayerError> {
        let palette = config.build_palette()?;
        log::debug!(
            "palette : {} glyphes, k = {}",
            palette.glyph_count(),
            config.aspect_correction
        );
        Ok(Self::new(palette, config.aspect_correction))
    }

    /// Fit the bitmap into `desired_cols × desired_rows` and rasterize it.
    ///
    /// # Errors
    /// [`PlayerError::InvalidDimensions`] for a zero-sized bitmap or bound,
    /// [`PlayerError::InternalConsistency`] if a block ends up with no pixels.
    pub fn rasterize(
        &self,
        bitmap: &Bitmap,
        desired_cols: u16,
        desired_rows: u16,
        fully_filled: bool,
    ) -> Result<Frame, PlayerError> {
        let grid = compute_grid_size(
            desired_cols,
            desired_rows,
            bitmap.width,
            bitmap.height,
            self.aspect_correction,
        )?;
        log::trace!(
            "rasterize {}x{} -> {}x{} (borne {desired_cols}x{desired_rows})",
            bitmap.width,
            bitmap.height,
            grid.cols,
            grid.rows
        );
        self.rasterize_to_grid(bitmap, grid, fully_filled)
    }

    /// Rasterize onto an explicit grid, skipping the sizer.
    ///
    /// Block `i` of `n` along an axis of `extent` pixels covers
    /// `[i·extent/n, (i+1)·extent/n)`: every block is `floor` or `ceil` of
    /// `extent / n` wide, the remainder is spread over the grid and no source
    /// pixel is skipped. Every mean divides by the block's actual pixel count.
    ///
    /// # Errors
    /// [`PlayerError::InvalidDimensions`] for a zero-sized bitmap or grid,
    /// [`PlayerError::InternalConsistency`] if the grid is finer than the
    /// bitmap (a block would cover no pixels) or the bitmap buffer is short.
    pub fn rasterize_to_grid(
        &self,
        bitmap: &Bitmap,
        grid: GridSize,
        fully_filled: bool,
    ) -> Result<Frame, PlayerError> {
        if grid.cols == 0 || grid.rows == 0 {
            return Err(PlayerError::InvalidDimensions {
                width: u32::from(grid.cols),
                height: u32::from(grid.rows),
            });
        }
        if bitmap.width == 0 || bitmap.height == 0 {
            return Err(PlayerError::InvalidDimensions {
                width: bitmap.width,
                height: bitmap.height,
            });
        }
        if bitmap.data.len() < bitmap.width as usize * bitmap.height as usize * 4 {
            return Err(PlayerError::InternalConsistency(format!(
                "bitmap {}×{} tronqué ({} bytes)",
                bitmap.width,
                bitmap.height,
                bitmap.data.len()
            )));
        }

        let layout = BlockLayout {
            cols: u32::from(grid.cols),
            rows: u32::from(grid.rows),
            width: bitmap.width,
            height: bitmap.height,
        };

        let cols = usize::from(grid.cols);
        let cells = cols * usize::from(grid.rows);
        let mut pixels = vec![RepresentativePixel::default(); cells];
        let mut glyphs = vec![' '; cells];

        pixels
            .par_chunks_mut(cols)
            .zip(glyphs.par_chunks_mut(cols))
            .enumerate()
            .try_for_each(|(row, (pixel_row, glyph_row))| {
                let (y0, y1) = layout.row_span(row as u32);
                for (col, (pixel, glyph)) in
                    pixel_row.iter_mut().zip(glyph_row.iter_mut()).enumerate()
                {
                    let (x0, x1) = layout.col_span(col as u32);
                    let mean = mean_color(bitmap, x0, x1, y0, y1).ok_or_else(|| {
                        PlayerError::InternalConsistency(format!(
                            "bloc ({col}, {row}) vide : x {x0}..{x1}, y {y0}..{y1}"
                        ))
                    })?;
                    *pixel = mean;
                    *glyph = if fully_filled {
                        SOLID_BLOCK
                    } else {
                        self.palette.map(mean.luminance())
                    };
                }
                Ok::<(), PlayerError>(())
            })?;

        Frame::from_parts(grid.cols, grid.rows, pixels, glyphs)
    }
}

/// Partition of the bitmap into `cols × rows` blocks.
#[derive(Clone, Copy)]
struct BlockLayout {
    cols: u32,
    rows: u32,
    width: u32,
    height: u32,
}

impl BlockLayout {
    #[inline]
    fn col_span(&self, col: u32) -> (u32, u32) {
        span(col, self.cols, self.width)
    }

    #[inline]
    fn row_span(&self, row: u32) -> (u32, u32) {
        span(row, self.rows, self.height)
    }
}

/// Half-open pixel range of block `index` out of `count` over `extent` pixels.
///
/// Empty only when `count > extent`.
#[inline]
fn span(index: u32, count: u32, extent: u32) -> (u32, u32) {
    let at = |i: u32| {
        u32::try_from(u64::from(i) * u64::from(extent) / u64::from(count)).unwrap_or(extent)
    };
    (at(index), at(index + 1))
}

/// Mean colour of `[x0, x1) × [y0, y1)`, `None` if the rectangle is empty.
///
/// Sums are kept in u64 and the mean is rounded to nearest.
fn mean_color(bitmap: &Bitmap, x0: u32, x1: u32, y0: u32, y1: u32) -> Option<RepresentativePixel> {
    let count = u64::from(x1.saturating_sub(x0)) * u64::from(y1.saturating_sub(y0));
    if count == 0 {
        return None;
    }
    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for y in y0..y1 {
        let row = bitmap.row(y);
        for px in row[x0 as usize * 4..x1 as usize * 4].chunks_exact(4) {
            r += u64::from(px[0]);
            g += u64::from(px[1]);
            b += u64::from(px[2]);
        }
    }
    let half = count / 2;
    Some(RepresentativePixel::new(
        ((r + half) / count) as u8,
        ((g + half) / count) as u8,
        ((b + half) / count) as u8,
    ))
}
