//! typereel composites timed overlays onto video frames and captures the result.
//!
//! Overlays are typewriter-revealed, multi-segment captions and one fading, rounded-corner image.
//! The crate is organized around a pure core and thin collaborators:
//!
//! - [`reveal`] computes visible characters and image opacity for a time `t`
//! - [`compile`] turns `(t, overlays)` into a backend-agnostic [`compile::plan::FramePlan`]
//! - [`CpuCompositor`] executes plans on a `vello_cpu` surface
//! - [`CaptureController`] samples composited frames at a fixed rate and encodes them with the
//!   source audio through `ffmpeg`
//! - [`PreviewSession`] redraws the same composition in a cooperative playback loop
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Fonts, images and source media.
pub mod assets;
/// Realtime capture pipeline.
pub mod capture;
/// Frame plan compiler.
pub mod compile;
/// Encoding sinks.
pub mod encode;
/// Tracing subscriber setup.
pub mod logging;
/// Overlay model and documents.
pub mod overlay;
/// Live preview loop.
pub mod preview;
/// Raster backend.
pub mod render;
/// Temporal reveal engine.
pub mod reveal;

pub use crate::foundation::core::{
    Affine, Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{ErrorKind, ReelError, ReelResult};

pub use crate::assets::store::{OverlayAssets, PreparedImage};
pub use crate::capture::clock::{Clock, ManualClock, SystemClock};
pub use crate::capture::output::{ArtifactOutput, CaptureArtifact, FileOutput, MemoryOutput};
pub use crate::capture::pipeline::{
    CaptureController, CaptureFailure, CaptureHandle, CaptureJob, CaptureOpts, CaptureState,
};
pub use crate::capture::source::{FrameSource, SyntheticSource};
pub use crate::encode::ffmpeg::{Container, FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{EncodedStream, FrameSink, InMemorySink, SinkConfig};
pub use crate::overlay::document::{LiveOverlays, OverlayDocument, OverlaySnapshots};
pub use crate::overlay::font::FontSpec;
pub use crate::overlay::model::{ColorToken, ImageOverlay, OverlaySet, TextSegment, TitleOverlay};
pub use crate::preview::{PlaybackSignal, PreviewSession, SignalState};
pub use crate::render::backend::FrameRGBA;
pub use crate::render::cpu::CpuCompositor;
