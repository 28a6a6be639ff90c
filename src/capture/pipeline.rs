use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::assets::store::OverlayAssets;
use crate::capture::clock::Clock;
use crate::capture::output::{ArtifactOutput, CaptureArtifact, DEFAULT_ARTIFACT_STEM, FileOutput};
use crate::capture::source::FrameSource;
use crate::encode::ffmpeg::{Container, FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{EncodedStream, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ErrorKind, ReelError, ReelResult};
use crate::overlay::document::OverlaySnapshots;
use crate::overlay::model::DEFAULT_FADE_IN_SECS;
use crate::render::backend::FrameRGBA;
use crate::render::cpu::CpuCompositor;

/// Lifecycle of one capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureState {
    /// Not started.
    Idle,
    /// Rewinding the source and waiting for it to become ready.
    Priming,
    /// Sampling composited frames into the encoder.
    Recording,
    /// Flushing the encoder.
    Finalizing,
    /// Artifact handed to the output.
    Delivered,
    /// Stopped by an error or cancellation.
    Errored,
}

impl CaptureState {
    /// `true` for `Delivered` and `Errored`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Errored)
    }
}

/// Capture options.
#[derive(Clone, Debug)]
pub struct CaptureOpts {
    /// Sampling rate of the synthetic video track.
    pub fps: Fps,
    /// Bound on the wait for the source to become ready.
    pub priming_timeout: Duration,
    /// Interval between readiness polls while priming.
    pub priming_poll: Duration,
    /// Image overlay fade-in duration in seconds.
    pub fade_in_secs: f64,
    /// Container produced by the default `ffmpeg` sink.
    pub container: Container,
    /// Background the encoder flattens transparent pixels onto.
    pub bg_rgba: [u8; 4],
    /// Whether [`CaptureOpts::file_output`] may replace existing files.
    pub overwrite: bool,
    /// File stem of the delivered artifact.
    pub artifact_stem: String,
}

impl Default for CaptureOpts {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            priming_timeout: Duration::from_secs(5),
            priming_poll: Duration::from_millis(10),
            fade_in_secs: DEFAULT_FADE_IN_SECS,
            container: Container::default(),
            bg_rgba: [0, 0, 0, 255],
            overwrite: true,
            artifact_stem: DEFAULT_ARTIFACT_STEM.to_owned(),
        }
    }
}

impl CaptureOpts {
    /// The sink used when a job does not bring its own.
    pub fn default_sink(&self) -> Box<dyn FrameSink> {
        Box::new(FfmpegSink::new(FfmpegSinkOpts {
            container: self.container,
            bg_rgba: self.bg_rgba,
        }))
    }

    /// A file output at `path` honoring `overwrite`.
    pub fn file_output(&self, path: impl Into<PathBuf>) -> FileOutput {
        FileOutput::at(path).overwrite(self.overwrite)
    }
}

/// Everything one capture consumes.
pub struct CaptureJob {
    source: Box<dyn FrameSource>,
    overlays: Arc<dyn OverlaySnapshots>,
    output: Box<dyn ArtifactOutput>,
    sink: Option<Box<dyn FrameSink>>,
}

impl CaptureJob {
    /// A job encoding with the controller's default sink.
    pub fn new(
        source: Box<dyn FrameSource>,
        overlays: Arc<dyn OverlaySnapshots>,
        output: Box<dyn ArtifactOutput>,
    ) -> Self {
        Self {
            source,
            overlays,
            output,
            sink: None,
        }
    }

    /// Encode into `sink` instead.
    pub fn with_sink(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.sink = Some(sink);
        self
    }
}

/// Structured, cloneable copy of the error that ended a capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureFailure {
    /// Error category.
    pub kind: ErrorKind,
    /// Rendered error message.
    pub message: String,
}

impl From<&ReelError> for CaptureFailure {
    fn from(e: &ReelError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug)]
struct Status {
    state: CaptureState,
    transitions: Vec<CaptureState>,
    artifact: Option<CaptureArtifact>,
    saved_to: Option<PathBuf>,
    failure: Option<CaptureFailure>,
}

#[derive(Debug)]
struct Shared {
    status: Mutex<Status>,
    changed: Condvar,
    cancel: AtomicBool,
    frames: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            status: Mutex::new(Status {
                state: CaptureState::Idle,
                transitions: vec![CaptureState::Idle],
                artifact: None,
                saved_to: None,
                failure: None,
            }),
            changed: Condvar::new(),
            cancel: AtomicBool::new(false),
            frames: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, state: CaptureState) {
        let mut st = self.lock();
        st.state = state;
        st.transitions.push(state);
        drop(st);
        tracing::info!(?state, "capture state");
        self.changed.notify_all();
    }

    /// Publish a terminal state and release the controller in the same critical section, so
    /// `is_busy() == false` implies the terminal state is visible and vice versa.
    fn conclude(&self, state: CaptureState, busy: BusyGuard, fill: impl FnOnce(&mut Status)) {
        let mut st = self.lock();
        fill(&mut st);
        st.state = state;
        st.transitions.push(state);
        drop(busy);
        drop(st);
        tracing::info!(?state, "capture state");
        self.changed.notify_all();
    }

    fn deliver(&self, artifact: CaptureArtifact, saved_to: Option<PathBuf>, busy: BusyGuard) {
        self.conclude(CaptureState::Delivered, busy, |st| {
            st.artifact = Some(artifact);
            st.saved_to = saved_to;
        });
    }

    fn fail(&self, e: &ReelError, busy: BusyGuard) {
        if matches!(e, ReelError::Cancelled) {
            tracing::info!("capture cancelled");
        } else {
            tracing::error!(error = %e, "capture failed");
        }
        self.conclude(CaptureState::Errored, busy, |st| {
            st.failure = Some(CaptureFailure::from(e));
        });
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

/// Starts captures, at most one at a time.
#[derive(Clone)]
pub struct CaptureController {
    busy: Arc<AtomicBool>,
    assets: Arc<OverlayAssets>,
    clock: Arc<dyn Clock>,
    opts: CaptureOpts,
}

impl CaptureController {
    /// Controller drawing overlays with `assets` and pacing ticks with `clock`.
    pub fn new(assets: Arc<OverlayAssets>, clock: Arc<dyn Clock>, opts: CaptureOpts) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            assets,
            clock,
            opts,
        }
    }

    /// Options applied to new captures.
    pub fn opts(&self) -> &CaptureOpts {
        &self.opts
    }

    /// `true` while a capture is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start capturing `job` on a worker thread.
    ///
    /// Fails with [`ReelError::CaptureInProgress`] without touching `job` when another capture is
    /// in flight.
    #[tracing::instrument(skip(self, job), fields(fps = self.opts.fps.as_f64(), container = ?self.opts.container))]
    pub fn start_capture(&self, job: CaptureJob) -> ReelResult<CaptureHandle> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("capture request rejected: another capture is in flight");
            return Err(ReelError::CaptureInProgress);
        }
        let busy = BusyGuard(Arc::clone(&self.busy));

        let shared = Arc::new(Shared::new());
        let worker = Worker {
            shared: Arc::clone(&shared),
            assets: Arc::clone(&self.assets),
            clock: Arc::clone(&self.clock),
            opts: self.opts.clone(),
        };
        let handle = std::thread::Builder::new()
            .name("typereel-capture".to_owned())
            .spawn(move || {
                let res = worker.run(job);
                match &res {
                    Ok((artifact, saved_to)) => {
                        worker
                            .shared
                            .deliver(artifact.clone(), saved_to.clone(), busy)
                    }
                    Err(e) => worker.shared.fail(e, busy),
                }
                res.map(|(artifact, _)| artifact)
            })
            .map_err(|e| ReelError::resource(format!("failed to spawn capture worker: {e}")))?;

        Ok(CaptureHandle {
            shared,
            worker: Some(handle),
        })
    }
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Observer and control for one in-flight capture.
///
/// Dropping the handle cancels a capture that has not finished and waits for the worker.
pub struct CaptureHandle {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<ReelResult<CaptureArtifact>>>,
}

impl CaptureHandle {
    /// Current state.
    pub fn state(&self) -> CaptureState {
        self.shared.lock().state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn transitions(&self) -> Vec<CaptureState> {
        self.shared.lock().transitions.clone()
    }

    /// Frames pushed to the encoder so far.
    pub fn frames_pushed(&self) -> u64 {
        self.shared.frames.load(Ordering::Acquire)
    }

    /// The artifact, once `Delivered`.
    pub fn result(&self) -> Option<CaptureArtifact> {
        self.shared.lock().artifact.clone()
    }

    /// Where the output saved the artifact, when it reported a path.
    pub fn saved_to(&self) -> Option<PathBuf> {
        self.shared.lock().saved_to.clone()
    }

    /// The failure, once `Errored`.
    pub fn error(&self) -> Option<CaptureFailure> {
        self.shared.lock().failure.clone()
    }

    /// Ask the worker to stop at its next tick. The capture ends `Errored` with `Cancelled`.
    pub fn cancel(&self) {
        self.shared.cancel.store(true, Ordering::Release);
    }

    /// Block until the state is terminal or `timeout` elapses; returns the state seen last.
    pub fn wait_timeout(&self, timeout: Duration) -> CaptureState {
        let st = self.shared.lock();
        let (st, _) = self
            .shared
            .changed
            .wait_timeout_while(st, timeout, |s| !s.state.is_terminal())
            .unwrap_or_else(PoisonError::into_inner);
        st.state
    }

    /// Block until the capture finishes and return its outcome.
    pub fn wait(mut self) -> ReelResult<CaptureArtifact> {
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| ReelError::encoding("capture worker panicked"))?,
            None => Err(ReelError::encoding("capture worker already joined")),
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            if !self.state().is_terminal() {
                self.cancel();
            }
            let _ = worker.join();
        }
    }
}

/// Owns a started sink; aborts it unless finished.
pub struct EncoderGuard {
    sink: Option<Box<dyn FrameSink>>,
    frames: u64,
}

impl EncoderGuard {
    /// Begin `sink` with `cfg`. A sink that fails to begin is aborted before the error returns.
    pub fn begin(mut sink: Box<dyn FrameSink>, cfg: SinkConfig) -> ReelResult<Self> {
        if let Err(e) = sink.begin(cfg) {
            sink.abort();
            return Err(e);
        }
        Ok(Self {
            sink: Some(sink),
            frames: 0,
        })
    }

    /// Push one frame.
    pub fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| ReelError::encoding("encoder already finished"))?;
        sink.push_frame(idx, frame)?;
        self.frames += 1;
        Ok(())
    }

    /// Frames pushed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Finish the session and return the encoded stream.
    pub fn finish(mut self) -> ReelResult<EncodedStream> {
        let mut sink = self
            .sink
            .take()
            .ok_or_else(|| ReelError::encoding("encoder already finished"))?;
        sink.end().inspect_err(|_| sink.abort())
    }
}

impl Drop for EncoderGuard {
    fn drop(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.abort();
        }
    }
}

struct Worker {
    shared: Arc<Shared>,
    assets: Arc<OverlayAssets>,
    clock: Arc<dyn Clock>,
    opts: CaptureOpts,
}

impl Worker {
    fn run(&self, job: CaptureJob) -> ReelResult<(CaptureArtifact, Option<PathBuf>)> {
        let CaptureJob {
            mut source,
            overlays,
            mut output,
            sink,
        } = job;

        self.shared.transition(CaptureState::Priming);
        self.prime(source.as_mut())?;

        let canvas = source.canvas();
        let mut compositor = CpuCompositor::new(canvas, Arc::clone(&self.assets))?;
        compositor.set_fade_in_secs(self.opts.fade_in_secs);
        let tap = source.open_audio_tap()?;
        let cfg = SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: self.opts.fps,
            audio: tap.as_ref().map(|t| t.input_config()),
        };
        let sink = sink.unwrap_or_else(|| self.opts.default_sink());
        let mut encoder = EncoderGuard::begin(sink, cfg)?;
        tracing::debug!(
            w = canvas.width,
            h = canvas.height,
            audio = tap.is_some(),
            "encoder session opened"
        );

        self.shared.transition(CaptureState::Recording);
        let recorded = self.record(source.as_mut(), overlays.as_ref(), &mut compositor, &mut encoder);
        source.pause();
        recorded?;

        self.shared.transition(CaptureState::Finalizing);
        let frames = encoder.frames();
        let stream = encoder.finish()?;
        drop(tap);
        let artifact = CaptureArtifact::from_stream(stream, &self.opts.artifact_stem);
        tracing::info!(frames, bytes = artifact.bytes.len(), mime = %artifact.mime, "capture encoded");
        let saved_to = output.deliver(&artifact)?;
        Ok((artifact, saved_to))
    }

    fn prime(&self, source: &mut dyn FrameSource) -> ReelResult<()> {
        source.rewind()?;
        let deadline = self.clock.now() + self.opts.priming_timeout;
        loop {
            if self.shared.cancelled() {
                return Err(ReelError::Cancelled);
            }
            if source.is_ready() {
                return Ok(());
            }
            let now = self.clock.now();
            if now >= deadline {
                return Err(ReelError::source_not_ready(format!(
                    "source not ready after {:?}",
                    self.opts.priming_timeout
                )));
            }
            self.clock
                .sleep(self.opts.priming_poll.min(deadline - now).max(Duration::from_micros(1)));
        }
    }

    fn record(
        &self,
        source: &mut dyn FrameSource,
        overlays: &dyn OverlaySnapshots,
        compositor: &mut CpuCompositor,
        encoder: &mut EncoderGuard,
    ) -> ReelResult<()> {
        let fps = self.opts.fps;
        source.play();
        let start = self.clock.now();
        let mut next = 0u64;
        loop {
            if self.shared.cancelled() {
                return Err(ReelError::Cancelled);
            }
            if source.is_ended() && next > 0 {
                return Ok(());
            }

            let due = fps.slot_at(self.clock.now().saturating_sub(start)).0;
            if due >= next {
                let t = source.current_time();
                let snapshot = overlays.snapshot();
                let diagnostics = overlays.diagnostics_enabled();
                let base = source.current_frame()?;
                let frame = compositor.composite_frame(base, &snapshot, t, diagnostics)?;
                if due > next {
                    tracing::debug!(skipped = due - next, "late tick; repeating frame");
                }
                for idx in next..=due {
                    encoder.push_frame(FrameIndex(idx), frame)?;
                }
                self.shared.frames.store(encoder.frames(), Ordering::Release);
                next = due + 1;
            }

            let next_at = start + fps.frame_offset(FrameIndex(next));
            self.clock.sleep(next_at.saturating_sub(self.clock.now()));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/pipeline.rs"]
mod tests;
