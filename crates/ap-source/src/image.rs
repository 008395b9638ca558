use std::path::Path;

use ap_core::error::PlayerError;
use ap_core::frame::Bitmap;
use ap_core::traits::Source;

/// Source d'image statique. Produit son unique bitmap une fois, puis s'épuise.
///
/// # Example
/// ```no_run
/// use ap_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::open(Path::new("photo.jpg")).unwrap();
/// ```
pub struct ImageSource {
    bitmap: Option<Bitmap>,
    size: (u32, u32),
}

impl ImageSource {
    /// Load an image from disk and create a source.
    ///
    /// # Errors
    /// See [`load_bitmap`].
    pub fn open(path: &Path) -> Result<Self, PlayerError> {
        let bitmap = load_bitmap(path)?;
        Ok(Self::from_bitmap(bitmap))
    }

    /// Wrap an already decoded bitmap.
    #[must_use]
    pub fn from_bitmap(bitmap: Bitmap) -> Self {
        let size = (bitmap.width, bitmap.height);
        Self {
            bitmap: Some(bitmap),
            size,
        }
    }
}

impl Source for ImageSource {
    fn next_bitmap(&mut self) -> Result<Option<Bitmap>, PlayerError> {
        Ok(self.bitmap.take())
    }

    fn native_size(&self) -> (u32, u32) {
        self.size
    }
}

/// Décode une image fixe (PNG, JPEG, BMP, GIF, WebP) en bitmap RGBA.
///
/// # Errors
/// [`PlayerError::InputUnavailable`] if the file cannot be opened,
/// [`PlayerError::DecodeCorrupt`] if its content cannot be decoded.
pub fn load_bitmap(path: &Path) -> Result<Bitmap, PlayerError> {
    let img = ::image::open(path).map_err(|e| match e {
        ::image::ImageError::IoError(io) => {
            log::debug!("load_bitmap: {}: {io}", path.display());
            PlayerError::InputUnavailable {
                path: path.display().to_string(),
            }
        }
        other => PlayerError::DecodeCorrupt(format!("{}: {other}", path.display())),
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    log::info!("image chargée : {width}x{height}, {}", path.display());
    Bitmap::from_rgba(width, height, rgba.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{Rgb, RgbImage};

    #[test]
    fn loads_png_and_yields_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        RgbImage::from_pixel(6, 4, Rgb([200, 10, 10])).save(&path).unwrap();

        let mut source = ImageSource::open(&path).unwrap();
        assert_eq!(source.native_size(), (6, 4));
        let bmp = source.next_bitmap().unwrap().unwrap();
        assert_eq!(bmp.pixel(5, 3), (200, 10, 10));
        assert!(source.next_bitmap().unwrap().is_none());
    }

    #[test]
    fn missing_file_is_input_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_bitmap(&dir.path().join("absent.png")).unwrap_err();
        assert!(matches!(err, PlayerError::InputUnavailable { .. }));
    }

    #[test]
    fn garbage_file_is_decode_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = load_bitmap(&path).unwrap_err();
        assert!(matches!(err, PlayerError::DecodeCorrupt(_)));
    }
}
