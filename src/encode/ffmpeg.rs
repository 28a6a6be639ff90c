use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::str::FromStr;
use std::thread::JoinHandle;

use crate::encode::sink::{EncodedStream, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Environment variable overriding the `ffmpeg` binary.
pub const FFMPEG_ENV: &str = "TYPEREEL_FFMPEG";

const STDOUT_CHUNK_LEN: usize = 64 * 1024;

/// Output container of an encoded capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// VP9 video + Opus audio in WebM.
    #[default]
    WebM,
    /// H.264 video + AAC audio in fragmented MP4.
    Mp4,
}

impl Container {
    /// MIME type of the muxed stream.
    pub fn mime(self) -> &'static str {
        match self {
            Self::WebM => "video/webm",
            Self::Mp4 => "video/mp4",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebM => "webm",
            Self::Mp4 => "mp4",
        }
    }

    fn codec_args(self, with_audio: bool) -> &'static [&'static str] {
        match (self, with_audio) {
            (Self::WebM, true) => &[
                "-c:v",
                "libvpx-vp9",
                "-deadline",
                "realtime",
                "-cpu-used",
                "8",
                "-pix_fmt",
                "yuv420p",
                "-c:a",
                "libopus",
                "-f",
                "webm",
            ],
            (Self::WebM, false) => &[
                "-an",
                "-c:v",
                "libvpx-vp9",
                "-deadline",
                "realtime",
                "-cpu-used",
                "8",
                "-pix_fmt",
                "yuv420p",
                "-f",
                "webm",
            ],
            (Self::Mp4, true) => &[
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-pix_fmt",
                "yuv420p",
                "-c:a",
                "aac",
                "-movflags",
                "frag_keyframe+empty_moov",
                "-f",
                "mp4",
            ],
            (Self::Mp4, false) => &[
                "-an",
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "frag_keyframe+empty_moov",
                "-f",
                "mp4",
            ],
        }
    }
}

impl FromStr for Container {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webm" => Ok(Self::WebM),
            "mp4" => Ok(Self::Mp4),
            other => Err(ReelError::validation(format!(
                "unknown container '{other}' (expected 'webm' or 'mp4')"
            ))),
        }
    }
}

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output container.
    pub container: Container,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Create options for `container` over an opaque black background.
    pub fn new(container: Container) -> Self {
        Self {
            container,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Sink that spawns `ffmpeg`, streams raw frames to its stdin and collects the muxed container
/// from its stdout.
///
/// Audio is optional and provided through `SinkConfig.audio`. Dropping a started sink kills the
/// child process.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<JoinHandle<std::io::Result<Vec<Vec<u8>>>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stdout_drain: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    /// Output container of this sink.
    pub fn container(&self) -> Container {
        self.opts.container
    }

    fn build_command(&self, cfg: &SinkConfig) -> ReelResult<Command> {
        let mut cmd = Command::new(ffmpeg_program());
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input: opaque RGBA8 frames; alpha is flattened in `push_frame`.
        cmd.args([
            "-loglevel",
            "error",
            "-nostdin",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        if let Some(audio) = cfg.audio.as_ref() {
            if audio.sample_rate == 0 {
                return Err(ReelError::validation(
                    "audio sample_rate must be non-zero when audio is enabled",
                ));
            }
            if audio.channels == 0 {
                return Err(ReelError::validation(
                    "audio channels must be non-zero when audio is enabled",
                ));
            }
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio.path)
            .args(["-map", "0:v:0", "-map", "1:a:0", "-shortest"]);
        }

        // yuv420p needs even dimensions.
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            cmd.args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"]);
        }
        cmd.args(self.opts.container.codec_args(cfg.audio.is_some()));
        cmd.arg("pipe:1");
        Ok(cmd)
    }

    fn join_drains(&mut self) -> ReelResult<(Vec<Vec<u8>>, Vec<u8>)> {
        let chunks = match self.stdout_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::encoding("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| ReelError::encoding(format!("ffmpeg stdout read failed: {e}")))?,
            None => Vec::new(),
        };
        let stderr = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::encoding("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ReelError::encoding(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        Ok((chunks, stderr))
    }
}

impl FrameSink for FfmpegSink {
    #[tracing::instrument(skip(self, cfg), fields(container = ?self.opts.container, w = cfg.width, h = cfg.height))]
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        if self.child.is_some() {
            return Err(ReelError::encoding("ffmpeg sink already started"));
        }
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ReelError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }

        let mut cmd = self.build_command(&cfg)?;
        tracing::debug!(program = ?cmd.get_program(), args = ?cmd.get_args().collect::<Vec<_>>(), "spawning encoder");
        let mut child = cmd.spawn().map_err(|e| {
            ReelError::resource(format!(
                "failed to spawn ffmpeg (is it installed and on PATH, or set {FFMPEG_ENV}?): {e}"
            ))
        })?;

        let (Some(stdin), Some(mut stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReelError::resource(
                "failed to open ffmpeg stdio pipes (unexpected)",
            ));
        };
        let stdout_drain = std::thread::spawn(move || {
            let mut chunks = Vec::new();
            loop {
                let mut buf = vec![0u8; STDOUT_CHUNK_LEN];
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                buf.truncate(n);
                chunks.push(buf);
            }
            Ok(chunks)
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout_drain = Some(stdout_drain);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::encoding("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ReelError::encoding(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(ReelError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        if frame.premultiplied {
            flatten_premul_over_bg_to_opaque_rgba8(
                &mut self.scratch,
                &frame.data,
                self.opts.bg_rgba,
            )?;
        } else {
            self.scratch.copy_from_slice(&frame.data);
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::encoding("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            ReelError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(container = ?self.opts.container))]
    fn end(&mut self) -> ReelResult<EncodedStream> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ReelError::encoding("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            ReelError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let (chunks, stderr_bytes) = self.join_drains()?;
        self.cfg = None;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ReelError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let stream = EncodedStream {
            chunks,
            mime: self.opts.container.mime(),
            extension: self.opts.container.extension(),
        };
        tracing::debug!(bytes = stream.len(), chunks = stream.chunks.len(), "encoder finished");
        Ok(stream)
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::debug!("encoder aborted");
        }
        let _ = self.join_drains();
        self.cfg = None;
        self.last_idx = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.abort();
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` goes before `-i`.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> ReelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (s[0] as u16 + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (s[1] as u16 + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (s[2] as u16 + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// The `ffmpeg` binary: `$TYPEREEL_FFMPEG` when set, else `ffmpeg` from `PATH`.
pub fn ffmpeg_program() -> OsString {
    std::env::var_os(FFMPEG_ENV)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| OsString::from("ffmpeg"))
}

/// The `ffprobe` binary: a sibling of `$TYPEREEL_FFMPEG` when one exists, else `ffprobe` from
/// `PATH`.
pub fn ffprobe_program() -> OsString {
    std::env::var_os(FFMPEG_ENV)
        .filter(|v| !v.is_empty())
        .and_then(|ffmpeg| sibling_ffprobe(Path::new(&ffmpeg)))
        .map(PathBuf::into_os_string)
        .unwrap_or_else(|| OsString::from("ffprobe"))
}

fn sibling_ffprobe(ffmpeg: &Path) -> Option<PathBuf> {
    let dir = ffmpeg.parent().filter(|d| !d.as_os_str().is_empty())?;
    let mut name = OsString::from("ffprobe");
    if let Some(ext) = ffmpeg.extension() {
        name.push(".");
        name.push(ext);
    }
    let candidate = dir.join(name);
    candidate.is_file().then_some(candidate)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when the configured `ffmpeg` can be invoked.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new(ffmpeg_program())
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
