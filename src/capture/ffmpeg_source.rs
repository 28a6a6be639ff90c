use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::media::{
    TAP_SAMPLE_RATE, VideoFrameStream, VideoSourceInfo, decode_audio_f32_stereo, probe_video,
};
use crate::capture::audio::AudioTap;
use crate::capture::clock::Clock;
use crate::capture::source::{FrameSource, Playback};
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::FrameRGBA;

/// Video file source decoded through `ffmpeg`.
///
/// Frames are decoded sequentially; seeking backwards (a rewind) restarts the decoder. When the
/// container reports no duration, playback ends when the decoder runs dry.
pub struct FfmpegSource {
    info: VideoSourceInfo,
    playback: Playback,
    stream: Option<VideoFrameStream>,
    frame: FrameRGBA,
    scratch: Vec<u8>,
    exhausted: bool,
}

impl FfmpegSource {
    /// Probe `path` and prepare a paused source at time zero.
    #[tracing::instrument(skip(clock))]
    pub fn open(path: &Path, clock: Arc<dyn Clock>) -> ReelResult<Self> {
        let info = probe_video(path)?;
        if info.width == 0 || info.height == 0 {
            return Err(ReelError::resource(format!(
                "'{}' reports an empty video frame",
                path.display()
            )));
        }
        let duration = if info.duration_sec > 0.0 {
            info.duration_sec
        } else {
            f64::INFINITY
        };
        tracing::info!(
            w = info.width,
            h = info.height,
            fps = info.fps.as_f64(),
            secs = info.duration_sec,
            audio = info.has_audio,
            "video source opened"
        );
        Ok(Self {
            frame: FrameRGBA::black(info.width, info.height),
            playback: Playback::new(clock, duration),
            info,
            stream: None,
            scratch: Vec::new(),
            exhausted: false,
        })
    }

    /// Probed metadata.
    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    /// File being played.
    pub fn path(&self) -> &PathBuf {
        &self.info.source_path
    }

    fn decode_until(&mut self, slot: u64) -> ReelResult<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };
        while stream.frames_read() <= slot {
            if !stream.next_into(&mut self.scratch)? {
                self.exhausted = true;
                break;
            }
            if stream.frames_read() > slot {
                self.frame.data.copy_from_slice(&self.scratch);
            }
        }
        Ok(())
    }
}

impl FrameSource for FfmpegSource {
    fn canvas(&self) -> Canvas {
        Canvas {
            width: self.info.width,
            height: self.info.height,
        }
    }

    fn duration_secs(&self) -> f64 {
        self.playback.duration()
    }

    fn rewind(&mut self) -> ReelResult<()> {
        self.playback.pause();
        self.playback.seek(0.0);
        self.stream = None;
        self.exhausted = false;
        self.stream = Some(VideoFrameStream::open(&self.info)?);
        Ok(())
    }

    fn is_ready(&mut self) -> bool {
        self.stream.is_some()
    }

    fn play(&mut self) {
        self.playback.play();
    }

    fn pause(&mut self) {
        self.playback.pause();
    }

    fn is_playing(&self) -> bool {
        self.playback.is_playing() && !self.exhausted
    }

    fn is_ended(&self) -> bool {
        self.playback.is_ended() || self.exhausted
    }

    fn current_time(&self) -> f64 {
        self.playback.position()
    }

    fn current_frame(&mut self) -> ReelResult<&FrameRGBA> {
        if self.stream.is_none() {
            return Err(ReelError::source_not_ready(
                "video source must be rewound before frames are read",
            ));
        }
        let slot = (self.playback.position() * self.info.fps.as_f64()).floor();
        let slot = if slot.is_finite() && slot >= 0.0 {
            slot as u64
        } else {
            0
        };
        self.decode_until(slot)?;
        Ok(&self.frame)
    }

    fn open_audio_tap(&mut self) -> ReelResult<Option<AudioTap>> {
        if !self.info.has_audio {
            return Ok(None);
        }
        let pcm = decode_audio_f32_stereo(&self.info.source_path, TAP_SAMPLE_RATE)?;
        if pcm.interleaved_f32.is_empty() {
            return Ok(None);
        }
        AudioTap::from_pcm(&pcm).map(Some)
    }
}
