use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::FrameRGBA;

/// Configuration provided to a [`FrameSink`] at the start of a capture.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Sampling rate of the synthetic video track.
    pub fps: Fps,
    /// Optional raw PCM audio file muxed alongside the video track.
    pub audio: Option<AudioInputConfig>,
}

/// Raw PCM audio input for sinks that mux an audio track.
#[derive(Debug, Clone)]
pub struct AudioInputConfig {
    /// Path to interleaved `f32le` PCM data.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// Encoded output of a finished sink: the container bytes in the order the encoder produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedStream {
    /// Encoded chunks in arrival order.
    pub chunks: Vec<Vec<u8>>,
    /// MIME type of the assembled stream.
    pub mime: &'static str,
    /// File extension (without dot) matching `mime`.
    pub extension: &'static str,
}

impl EncodedStream {
    /// Total size in bytes.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// `true` when no bytes were produced.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenate every chunk into one buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for chunk in self.chunks {
            out.extend_from_slice(&chunk);
        }
        out
    }
}

/// Sink contract for consuming composited frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order between one
/// `begin` and the matching `end`. After `abort` the sink holds no external resources and may be
/// dropped or restarted with `begin`.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()>;
    /// Flush the encoder and return everything it produced.
    fn end(&mut self) -> ReelResult<EncodedStream>;
    /// Tear the session down without producing output.
    fn abort(&mut self);
}

/// In-memory sink for tests and debugging.
///
/// `end` returns the raw frame bytes, one chunk per frame.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    /// Frames in sampling order.
    pub(crate) frames: Vec<(FrameIndex, FrameRGBA)>,
    aborted: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// `true` once `abort` was called.
    pub fn was_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        if self.cfg.is_none() {
            return Err(ReelError::encoding("in-memory sink not started"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(ReelError::encoding(
                "in-memory sink received out-of-order frame index",
            ));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ReelResult<EncodedStream> {
        if self.cfg.is_none() {
            return Err(ReelError::encoding("in-memory sink not started"));
        }
        Ok(EncodedStream {
            chunks: self.frames.iter().map(|(_, f)| f.data.clone()).collect(),
            mime: "application/octet-stream",
            extension: "rgba",
        })
    }

    fn abort(&mut self) {
        self.aborted = true;
        self.cfg = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
