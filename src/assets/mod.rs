//! Static overlay resources: fonts, images and source media.

/// Image decoding.
pub mod decode;
/// `ffprobe`/`ffmpeg` helpers for source media.
pub mod media;
/// Loaded fonts and images, plus text shaping.
pub mod store;
