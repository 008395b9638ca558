/// Decoder collaborators for asciiplay: still images and ffmpeg-piped video.

pub mod image;
pub mod video;
