use std::path::{Path, PathBuf};

use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};

/// Sample rate of the PCM the audio tap hands to the encoder.
pub const TAP_SAMPLE_RATE: u32 = 48_000;
/// Channel count of the PCM the audio tap hands to the encoder.
pub const TAP_CHANNELS: u16 = 2;

#[derive(Clone, Debug)]
/// Basic metadata about a source video file.
pub struct VideoSourceInfo {
    /// Source path used for probing/decoding.
    #[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
    pub source_path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Native frame rate of the video stream.
    pub fps: Fps,
    /// Container duration in seconds (0 when unknown).
    pub duration_sec: f64,
    /// Whether ffprobe detected at least one audio stream.
    pub has_audio: bool,
}

#[derive(Clone, Debug)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Serialize the samples as little-endian `f32` bytes.
    pub fn to_f32le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.interleaved_f32.len() * 4);
        for s in &self.interleaved_f32 {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    /// Duration in seconds.
    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.interleaved_f32.len() as f64 / f64::from(self.channels) / f64::from(self.sample_rate)
    }
}

/// Probe source video metadata through `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> ReelResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new(crate::encode::ffmpeg::ffprobe_program())
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::resource(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::resource(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReelError::serde(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::resource("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| ReelError::resource("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ReelError::resource("missing video height from ffprobe"))?;
    let fps = video_stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_ff_ratio)
        .and_then(|(num, den)| Fps::new(num, den).ok())
        .unwrap_or_default();
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps,
        duration_sec,
        has_audio,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Probe source video metadata through `ffprobe`.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn probe_video(_source_path: &Path) -> ReelResult<VideoSourceInfo> {
    Err(ReelError::resource(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
/// Decode audio from a media file to stereo interleaved `f32` PCM.
///
/// A file without an audio stream decodes to empty PCM.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> ReelResult<AudioPcm> {
    let out = std::process::Command::new(crate::encode::ffmpeg::ffmpeg_program())
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::resource(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        if msg.contains("Stream specifier")
            || msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
            || msg.contains("does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                channels: TAP_CHANNELS,
                interleaved_f32: Vec::new(),
            });
        }
        return Err(ReelError::resource(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(ReelError::resource(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let mut pcm = Vec::<f32>::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: TAP_CHANNELS,
        interleaved_f32: pcm,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Decode audio from a media file to stereo interleaved `f32` PCM.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn decode_audio_f32_stereo(_path: &Path, _sample_rate: u32) -> ReelResult<AudioPcm> {
    Err(ReelError::resource(
        "audio decoding requires the 'media-ffmpeg' feature",
    ))
}

/// Sequential RGBA8 frame reader over an `ffmpeg` decode of a whole file.
///
/// Frames arrive in presentation order at the source's native rate; the child process is killed
/// when the stream is dropped.
#[cfg(feature = "media-ffmpeg")]
pub struct VideoFrameStream {
    child: std::process::Child,
    stdout: std::process::ChildStdout,
    frame_len: usize,
    frames_read: u64,
    eof: bool,
}

#[cfg(feature = "media-ffmpeg")]
impl VideoFrameStream {
    /// Spawn the decoder for `info`.
    pub fn open(info: &VideoSourceInfo) -> ReelResult<Self> {
        use std::process::{Command, Stdio};

        let frame_len = (info.width as usize)
            .saturating_mul(info.height as usize)
            .saturating_mul(4);
        if frame_len == 0 {
            return Err(ReelError::resource(
                "decoded video frame size is zero (invalid source dimensions)",
            ));
        }
        let mut child = Command::new(crate::encode::ffmpeg::ffmpeg_program())
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(&info.source_path)
            .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ReelError::resource(format!("failed to spawn ffmpeg decoder: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::resource("failed to open ffmpeg stdout (unexpected)"))?;
        Ok(Self {
            child,
            stdout,
            frame_len,
            frames_read: 0,
            eof: false,
        })
    }

    /// Read the next frame into `dst` (resized to one frame). Returns `false` at end of stream.
    pub fn next_into(&mut self, dst: &mut Vec<u8>) -> ReelResult<bool> {
        use std::io::Read as _;

        if self.eof {
            return Ok(false);
        }
        dst.resize(self.frame_len, 0);
        let mut filled = 0usize;
        while filled < self.frame_len {
            let n = self
                .stdout
                .read(&mut dst[filled..])
                .map_err(|e| ReelError::resource(format!("ffmpeg decoder read failed: {e}")))?;
            if n == 0 {
                self.eof = true;
                return Ok(false);
            }
            filled += n;
        }
        self.frames_read += 1;
        Ok(true)
    }

    /// Number of complete frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

#[cfg(feature = "media-ffmpeg")]
impl Drop for VideoFrameStream {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.trim().parse::<u32>().ok()?;
    let b = match parts.next() {
        Some(b) => b.trim().parse::<u32>().ok()?,
        None => 1,
    };
    if a == 0 || b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
