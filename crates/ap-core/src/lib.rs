/// Configuration, types, and shared structures for asciiplay.
///
/// This crate contains all shared types, traits, and configuration logic
/// used across the asciiplay workspace.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod sizing;
pub mod traits;

pub use charset::Palette;
pub use config::{PlaybackSettings, PlayerConfig};
pub use error::PlayerError;
pub use frame::{Bitmap, Frame, RepresentativePixel};
pub use sizing::GridSize;
