//! Live preview: a cooperative redraw loop over a playing source.

use std::ops::ControlFlow;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::assets::store::OverlayAssets;
use crate::capture::clock::Clock;
use crate::capture::source::FrameSource;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::ReelResult;
use crate::overlay::document::OverlaySnapshots;
use crate::overlay::model::OverlaySet;
use crate::render::backend::FrameRGBA;
use crate::render::cpu::CpuCompositor;

/// What the preview loop should be doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalState {
    /// Advance playback and redraw.
    Playing,
    /// Hold the current frame.
    Paused,
    /// Leave the loop.
    Stopped,
}

/// Play/pause/stop control shared between a UI and [`PreviewSession::run`].
///
/// Every `play` bumps an epoch so the loop can tell a fresh play request from the one it is
/// already serving.
#[derive(Debug)]
pub struct PlaybackSignal {
    inner: Mutex<SignalInner>,
    changed: Condvar,
}

#[derive(Debug, Clone, Copy)]
struct SignalInner {
    state: SignalState,
    epoch: u64,
}

impl Default for PlaybackSignal {
    fn default() -> Self {
        Self::new(SignalState::Paused)
    }
}

impl PlaybackSignal {
    /// A signal starting in `state`.
    pub fn new(state: SignalState) -> Self {
        Self {
            inner: Mutex::new(SignalInner { state, epoch: 0 }),
            changed: Condvar::new(),
        }
    }

    /// Resume playback, restarting from zero if playback had ended. Ignored once stopped.
    pub fn play(&self) {
        self.update(|s| {
            s.state = SignalState::Playing;
            s.epoch += 1;
        });
    }

    /// Pause playback. Ignored once stopped.
    pub fn pause(&self) {
        self.update(|s| s.state = SignalState::Paused);
    }

    /// Stop the loop for good.
    pub fn stop(&self) {
        self.update(|s| s.state = SignalState::Stopped);
    }

    /// Current state.
    pub fn state(&self) -> SignalState {
        self.lock().state
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SignalInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> SignalInner {
        *self.lock()
    }

    /// Pause unless a play request newer than `epoch` arrived.
    fn suspend(&self, epoch: u64) -> bool {
        let mut st = self.lock();
        if st.state != SignalState::Playing || st.epoch != epoch {
            return false;
        }
        st.state = SignalState::Paused;
        drop(st);
        self.changed.notify_all();
        true
    }

    fn wait_while_paused(&self) -> SignalState {
        let st = self.lock();
        self.changed
            .wait_while(st, |s| s.state == SignalState::Paused)
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    fn update(&self, f: impl FnOnce(&mut SignalInner)) {
        let mut st = self.lock();
        if st.state == SignalState::Stopped {
            return;
        }
        f(&mut st);
        drop(st);
        self.changed.notify_all();
    }
}

/// A source, an overlay feed and a compositor of their own.
///
/// Preview and capture never share a compositor; each session owns its surface.
pub struct PreviewSession {
    source: Box<dyn FrameSource>,
    overlays: Arc<dyn OverlaySnapshots>,
    compositor: CpuCompositor,
    clock: Arc<dyn Clock>,
    refresh: Fps,
}

impl PreviewSession {
    /// Build a session whose surface matches the source's native size.
    pub fn new(
        source: Box<dyn FrameSource>,
        overlays: Arc<dyn OverlaySnapshots>,
        assets: Arc<OverlayAssets>,
        clock: Arc<dyn Clock>,
    ) -> ReelResult<Self> {
        let compositor = CpuCompositor::new(source.canvas(), assets)?;
        Ok(Self {
            source,
            overlays,
            compositor,
            clock,
            refresh: Fps { num: 60, den: 1 },
        })
    }

    /// Redraw rate of [`Self::run`] (default 60 fps).
    pub fn with_refresh(mut self, refresh: Fps) -> Self {
        self.refresh = refresh;
        self
    }

    /// The compositor, e.g. to tune the image fade-in.
    pub fn compositor_mut(&mut self) -> &mut CpuCompositor {
        &mut self.compositor
    }

    /// The source being previewed.
    pub fn source_mut(&mut self) -> &mut dyn FrameSource {
        self.source.as_mut()
    }

    /// Composite `overlays` at time `t` over the source's current frame.
    pub fn render_frame(
        &mut self,
        t: f64,
        overlays: &OverlaySet,
        diagnostics: bool,
    ) -> ReelResult<&FrameRGBA> {
        let base = self.source.current_frame()?;
        self.compositor
            .composite_frame(base, overlays, t, diagnostics)
    }

    /// Composite the live overlay snapshot at the source's playback time.
    pub fn render_current(&mut self) -> ReelResult<(f64, &FrameRGBA)> {
        let t = self.source.current_time();
        let snapshot = self.overlays.snapshot();
        let diagnostics = self.overlays.diagnostics_enabled();
        let frame = self.render_frame(t, &snapshot, diagnostics)?;
        Ok((t, frame))
    }

    /// Redraw at the refresh rate while `signal` is playing, handing each frame to `present`.
    ///
    /// The loop suspends (pausing the source) while the signal is paused or once playback ends,
    /// and returns when the signal stops or `present` breaks. A play signal after the end restarts
    /// from time zero. Returns the number of frames presented.
    #[tracing::instrument(skip_all)]
    pub fn run(
        &mut self,
        signal: &PlaybackSignal,
        mut present: impl FnMut(f64, &FrameRGBA) -> ControlFlow<()>,
    ) -> ReelResult<u64> {
        let interval = self.refresh.frame_offset(FrameIndex(1));
        if !self.source.is_ready() {
            self.source.rewind()?;
        }
        let mut epoch = signal.snapshot().epoch;
        let mut presented = 0u64;
        loop {
            let now = signal.snapshot();
            match now.state {
                SignalState::Stopped => break,
                SignalState::Paused => {
                    self.source.pause();
                    if signal.wait_while_paused() == SignalState::Stopped {
                        break;
                    }
                    continue;
                }
                SignalState::Playing => {}
            }
            if now.epoch != epoch {
                epoch = now.epoch;
                if self.source.is_ended() {
                    self.source.rewind()?;
                }
            }

            if !self.source.is_playing() {
                if self.source.is_ended() {
                    if signal.suspend(epoch) {
                        tracing::debug!(presented, "preview reached the end; suspending");
                    }
                    continue;
                }
                self.source.play();
            }

            let (t, frame) = self.render_current()?;
            presented += 1;
            if present(t, frame).is_break() {
                break;
            }
            self.clock.sleep(interval);
        }
        self.source.pause();
        Ok(presented)
    }
}

#[cfg(test)]
#[path = "../tests/unit/preview.rs"]
mod tests;
