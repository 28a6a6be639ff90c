use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::assets::media::AudioPcm;
use crate::encode::sink::AudioInputConfig;
use crate::foundation::error::{ReelError, ReelResult};

static TAP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Audio routed from the source into the encoder session.
///
/// Holds the source's decoded PCM in a temp file that `ffmpeg` reads as its second input. The file
/// is removed when the tap is dropped, on every capture exit path.
#[derive(Debug)]
pub struct AudioTap {
    file: TempFileGuard,
    sample_rate: u32,
    channels: u16,
    duration_sec: f64,
}

impl AudioTap {
    /// Write `pcm` to a fresh file under the system temp directory.
    pub fn from_pcm(pcm: &AudioPcm) -> ReelResult<Self> {
        Self::from_pcm_in(&std::env::temp_dir(), pcm)
    }

    /// Write `pcm` to a fresh file under `dir`.
    pub fn from_pcm_in(dir: &Path, pcm: &AudioPcm) -> ReelResult<Self> {
        if pcm.sample_rate == 0 || pcm.channels == 0 {
            return Err(ReelError::resource(
                "audio tap needs a non-zero sample rate and channel count",
            ));
        }
        let path = dir.join(format!(
            "typereel_tap_{}_{}.f32le",
            std::process::id(),
            TAP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::write(&path, pcm.to_f32le_bytes()).map_err(|e| {
            ReelError::resource(format!(
                "failed to write audio tap file '{}': {e}",
                path.display()
            ))
        })?;
        tracing::debug!(path = %path.display(), secs = pcm.duration_sec(), "audio tap opened");
        Ok(Self {
            file: TempFileGuard(Some(path)),
            sample_rate: pcm.sample_rate,
            channels: pcm.channels,
            duration_sec: pcm.duration_sec(),
        })
    }

    /// Location of the PCM file.
    pub fn path(&self) -> &Path {
        self.file.0.as_deref().unwrap_or(Path::new(""))
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Length of the tapped audio in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.duration_sec
    }

    /// Encoder input describing this tap.
    pub fn input_config(&self) -> AudioInputConfig {
        AudioInputConfig {
            path: self.path().to_path_buf(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

#[derive(Debug)]
struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(&path);
            tracing::debug!(path = %path.display(), "audio tap released");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/audio.rs"]
mod tests;
