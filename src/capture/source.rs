use std::sync::Arc;
use std::time::Duration;

use crate::assets::media::{AudioPcm, TAP_CHANNELS, TAP_SAMPLE_RATE};
use crate::capture::audio::AudioTap;
use crate::capture::clock::Clock;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::FrameRGBA;

/// A playable video source: the base layer of every composited frame.
///
/// Playback time advances against a [`Clock`] while playing. `current_frame` returns the frame
/// displayed at the current playback time.
pub trait FrameSource: Send {
    /// Native frame size.
    fn canvas(&self) -> Canvas;
    /// Total playback duration in seconds.
    fn duration_secs(&self) -> f64;
    /// Seek to time zero and pause.
    fn rewind(&mut self) -> ReelResult<()>;
    /// Whether frames can be read at the current position.
    fn is_ready(&mut self) -> bool;
    /// Start or resume playback.
    fn play(&mut self);
    /// Pause playback, keeping the position.
    fn pause(&mut self);
    /// `true` while playing and not yet ended.
    fn is_playing(&self) -> bool;
    /// `true` once playback reached the end.
    fn is_ended(&self) -> bool;
    /// Current playback time in seconds.
    fn current_time(&self) -> f64;
    /// Frame at the current playback time (straight alpha).
    fn current_frame(&mut self) -> ReelResult<&FrameRGBA>;
    /// Decode the source's audio track into a tap, or `None` when there is no audio.
    fn open_audio_tap(&mut self) -> ReelResult<Option<AudioTap>>;
}

/// Playback position driven by a [`Clock`].
#[derive(Debug, Clone)]
pub struct Playback {
    clock: Arc<dyn Clock>,
    duration: f64,
    base: f64,
    started: Option<Duration>,
}

impl Playback {
    /// Paused playback at time zero. A NaN or negative duration is treated as zero.
    pub fn new(clock: Arc<dyn Clock>, duration_secs: f64) -> Self {
        let duration = if duration_secs.is_nan() {
            0.0
        } else {
            duration_secs.max(0.0)
        };
        Self {
            clock,
            duration,
            base: 0.0,
            started: None,
        }
    }

    /// Clock this playback runs against.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Total duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Current position in seconds, clamped to the duration.
    pub fn position(&self) -> f64 {
        let t = match self.started {
            Some(s) => self.base + self.clock.now().saturating_sub(s).as_secs_f64(),
            None => self.base,
        };
        t.min(self.duration)
    }

    /// Start or resume. No-op once ended.
    pub fn play(&mut self) {
        if self.started.is_none() && !self.is_ended() {
            self.started = Some(self.clock.now());
        }
    }

    /// Pause at the current position.
    pub fn pause(&mut self) {
        self.base = self.position();
        self.started = None;
    }

    /// Jump to `t` (clamped to `[0, duration]`), keeping the play state.
    pub fn seek(&mut self, t: f64) {
        self.base = if t.is_finite() {
            t.clamp(0.0, self.duration)
        } else {
            0.0
        };
        if self.started.is_some() {
            self.started = Some(self.clock.now());
        }
    }

    /// `true` while playing and not ended.
    pub fn is_playing(&self) -> bool {
        self.started.is_some() && !self.is_ended()
    }

    /// `true` once the position reached the duration.
    pub fn is_ended(&self) -> bool {
        self.position() >= self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Immediate,
    After(Duration),
    Never,
}

/// Generated video source for tests and demos.
///
/// Each frame is a solid color derived from its frame slot at `fps`, so consecutive slots are
/// distinguishable. An optional sine tone provides an audio track.
#[derive(Debug)]
pub struct SyntheticSource {
    canvas: Canvas,
    fps: Fps,
    playback: Playback,
    readiness: Readiness,
    rewound_at: Duration,
    tone_hz: Option<f32>,
    frame: FrameRGBA,
    frame_slot: Option<u64>,
}

impl SyntheticSource {
    /// A silent source of `canvas` size lasting `duration_secs`, ready immediately.
    pub fn new(canvas: Canvas, duration_secs: f64, clock: Arc<dyn Clock>) -> Self {
        Self {
            canvas,
            fps: Fps::default(),
            playback: Playback::new(clock, duration_secs),
            readiness: Readiness::Immediate,
            rewound_at: Duration::ZERO,
            tone_hz: None,
            frame: FrameRGBA::black(canvas.width, canvas.height),
            frame_slot: None,
        }
    }

    /// Rate at which the generated picture changes.
    pub fn with_fps(mut self, fps: Fps) -> Self {
        self.fps = fps;
        self
    }

    /// Add a sine tone audio track.
    pub fn with_tone(mut self, hz: f32) -> Self {
        self.tone_hz = Some(hz);
        self
    }

    /// Become ready `d` after each rewind.
    pub fn with_ready_delay(mut self, d: Duration) -> Self {
        self.readiness = Readiness::After(d);
        self
    }

    /// Never become ready.
    pub fn never_ready(mut self) -> Self {
        self.readiness = Readiness::Never;
        self
    }

    /// Color of the frame shown during `slot`.
    pub fn slot_rgb(slot: u64) -> [u8; 3] {
        [
            (slot.wrapping_mul(7) % 256) as u8,
            (slot.wrapping_mul(13) % 256) as u8,
            96,
        ]
    }

    fn tone_pcm(&self, hz: f32) -> ReelResult<AudioPcm> {
        let duration = self.playback.duration();
        if !duration.is_finite() {
            return Err(ReelError::resource(
                "cannot synthesize a tone for a source without a finite duration",
            ));
        }
        let frames = (duration * f64::from(TAP_SAMPLE_RATE)).round() as usize;
        let mut interleaved = Vec::with_capacity(frames * usize::from(TAP_CHANNELS));
        let step = std::f64::consts::TAU * f64::from(hz) / f64::from(TAP_SAMPLE_RATE);
        for i in 0..frames {
            let s = (0.2 * (step * i as f64).sin()) as f32;
            for _ in 0..TAP_CHANNELS {
                interleaved.push(s);
            }
        }
        Ok(AudioPcm {
            sample_rate: TAP_SAMPLE_RATE,
            channels: TAP_CHANNELS,
            interleaved_f32: interleaved,
        })
    }
}

impl FrameSource for SyntheticSource {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn duration_secs(&self) -> f64 {
        self.playback.duration()
    }

    fn rewind(&mut self) -> ReelResult<()> {
        self.playback.pause();
        self.playback.seek(0.0);
        self.rewound_at = self.playback.clock().now();
        Ok(())
    }

    fn is_ready(&mut self) -> bool {
        match self.readiness {
            Readiness::Immediate => true,
            Readiness::After(d) => {
                self.playback.clock().now().saturating_sub(self.rewound_at) >= d
            }
            Readiness::Never => false,
        }
    }

    fn play(&mut self) {
        self.playback.play();
    }

    fn pause(&mut self) {
        self.playback.pause();
    }

    fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    fn is_ended(&self) -> bool {
        self.playback.is_ended()
    }

    fn current_time(&self) -> f64 {
        self.playback.position()
    }

    fn current_frame(&mut self) -> ReelResult<&FrameRGBA> {
        let slot = (self.playback.position() * self.fps.as_f64()).floor() as u64;
        if self.frame_slot != Some(slot) {
            let rgb = Self::slot_rgb(slot);
            for px in self.frame.data.chunks_exact_mut(4) {
                px[..3].copy_from_slice(&rgb);
                px[3] = 255;
            }
            self.frame_slot = Some(slot);
        }
        Ok(&self.frame)
    }

    fn open_audio_tap(&mut self) -> ReelResult<Option<AudioTap>> {
        match self.tone_hz {
            Some(hz) => AudioTap::from_pcm(&self.tone_pcm(hz)?).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/source.rs"]
mod tests;
