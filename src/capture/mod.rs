//! Realtime capture: play a source, sample composited frames at a fixed rate and encode them
//! together with the source's audio.
//!
//! [`pipeline::CaptureController`] runs each capture on its own worker thread through the states
//! of [`pipeline::CaptureState`]. Resources acquired along the way (encoder session, audio tap)
//! are owned by guards and released on every exit path.

/// Audio routed from the source into the encoder.
pub mod audio;
/// Time sources.
pub mod clock;
/// `ffmpeg`-decoded video file source.
#[cfg(feature = "media-ffmpeg")]
pub mod ffmpeg_source;
/// Artifact delivery.
pub mod output;
/// Capture state machine.
pub mod pipeline;
/// Playable frame sources.
pub mod source;
