use crate::error::PlayerError;

/// Ratio largeur/hauteur d'une cellule terminal (polices usuelles ≈ 1:2).
pub const DEFAULT_ASPECT_CORRECTION: f64 = 0.5;

/// Target character grid for one rasterization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSize {
    /// Columns (cells per row).
    pub cols: u16,
    /// Rows.
    pub rows: u16,
}

/// Which scale factor dominated the fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FitAxis {
    /// Height is the constraint: all desired rows are used.
    Height,
    /// Width is the constraint: all desired columns are used.
    Width,
}

/// Compute the grid that fits `source` inside `desired` while preserving the
/// source aspect under the cell correction factor `k` (cell width / height).
///
/// `heightFactor = H / (rows / k)`, `widthFactor = W / cols`; the larger factor
/// wins. The result is clamped to `1 ≤ cols ≤ min(desired_cols, W)` and
/// `1 ≤ rows ≤ min(desired_rows, H)` so every block covers at least one pixel.
///
/// # Errors
/// Returns [`PlayerError::InvalidDimensions`] if a desired or source dimension
/// is zero, or [`PlayerError::Config`] if `k` is not a positive finite number.
///
/// # Example
/// ```
/// use ap_core::sizing::{compute_grid_size, GridSize};
/// let grid = compute_grid_size(80, 24, 640, 480, 0.5).unwrap();
/// assert_eq!(grid, GridSize { cols: 64, rows: 24 });
/// ```
pub fn compute_grid_size(
    desired_cols: u16,
    desired_rows: u16,
    source_width: u32,
    source_height: u32,
    k: f64,
) -> Result<GridSize, PlayerError> {
    fit(desired_cols, desired_rows, source_width, source_height, k).map(|(grid, _)| grid)
}

/// Same as [`compute_grid_size`], also reporting the dominant axis.
pub(crate) fn fit(
    desired_cols: u16,
    desired_rows: u16,
    source_width: u32,
    source_height: u32,
    k: f64,
) -> Result<(GridSize, FitAxis), PlayerError> {
    if desired_cols == 0 || desired_rows == 0 {
        return Err(PlayerError::InvalidDimensions {
            width: u32::from(desired_cols),
            height: u32::from(desired_rows),
        });
    }
    if source_width == 0 || source_height == 0 {
        return Err(PlayerError::InvalidDimensions {
            width: source_width,
            height: source_height,
        });
    }
    if !(k.is_finite() && k > 0.0) {
        return Err(PlayerError::Config(format!(
            "correction d'aspect invalide : {k}"
        )));
    }

    let src_w = f64::from(source_width);
    let src_h = f64::from(source_height);
    let height_factor = src_h / (f64::from(desired_rows) / k);
    let width_factor = src_w / f64::from(desired_cols);

    let (cols, rows, axis) = if height_factor > width_factor {
        let cols = (src_w / height_factor).floor();
        (cols, f64::from(desired_rows), FitAxis::Height)
    } else {
        let rows = ((src_h / width_factor) * k).floor();
        (f64::from(desired_cols), rows, FitAxis::Width)
    };

    let max_cols = u32::from(desired_cols).min(source_width);
    let max_rows = u32::from(desired_rows).min(source_height);
    let grid = GridSize {
        cols: (cols as u32).clamp(1, max_cols) as u16,
        rows: (rows as u32).clamp(1, max_rows) as u16,
    };
    Ok((grid, axis))
}
