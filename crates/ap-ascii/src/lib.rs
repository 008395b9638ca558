/// ASCII conversion engine for asciiplay.
///
/// Reduces decoded bitmaps to block grids of representative colours and glyphs.
pub mod rasterizer;

pub use rasterizer::Rasterizer;
