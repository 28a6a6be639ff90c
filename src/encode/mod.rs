//! Encoding sinks.
//!
//! Sinks consume composited frames in sampling order. The capture pipeline owns exactly one sink
//! per capture and turns the [`sink::EncodedStream`] it returns into the delivered artifact.

/// `ffmpeg`-based sink (WebM or fragmented MP4 streamed from the encoder's stdout).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
