use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::encode::ffmpeg::ensure_parent_dir;
use crate::encode::sink::EncodedStream;
use crate::foundation::error::{ReelError, ReelResult};

/// Default file stem of a delivered capture.
pub const DEFAULT_ARTIFACT_STEM: &str = "processed_video";

/// The finished, muxed recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureArtifact {
    /// Container bytes.
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `video/webm`.
    pub mime: String,
    /// Suggested file name, e.g. `processed_video.webm`.
    pub file_name: String,
}

impl CaptureArtifact {
    /// Assemble the encoder's chunks into one artifact named `<stem>.<extension>`.
    pub fn from_stream(stream: EncodedStream, stem: &str) -> Self {
        let file_name = format!("{stem}.{}", stream.extension);
        let mime = stream.mime.to_owned();
        Self {
            bytes: stream.into_bytes(),
            mime,
            file_name,
        }
    }
}

/// Receiver of a delivered artifact (download, file save, upload, ...).
pub trait ArtifactOutput: Send {
    /// Take ownership of the artifact. Returns where it went, when that is a path.
    fn deliver(&mut self, artifact: &CaptureArtifact) -> ReelResult<Option<PathBuf>>;
}

/// Saves artifacts into a directory, or to one fixed path.
#[derive(Clone, Debug)]
pub struct FileOutput {
    target: FileTarget,
    overwrite: bool,
}

#[derive(Clone, Debug)]
enum FileTarget {
    Dir(PathBuf),
    Exact(PathBuf),
}

impl FileOutput {
    /// Save under `dir` using the artifact's suggested file name.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            target: FileTarget::Dir(dir.into()),
            overwrite: true,
        }
    }

    /// Save to exactly `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            target: FileTarget::Exact(path.into()),
            overwrite: true,
        }
    }

    /// Refuse to replace an existing file when `false`.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    fn path_for(&self, artifact: &CaptureArtifact) -> PathBuf {
        match &self.target {
            FileTarget::Dir(dir) => dir.join(&artifact.file_name),
            FileTarget::Exact(path) => path.clone(),
        }
    }
}

impl ArtifactOutput for FileOutput {
    fn deliver(&mut self, artifact: &CaptureArtifact) -> ReelResult<Option<PathBuf>> {
        let path = self.path_for(artifact);
        write_artifact(&path, &artifact.bytes, self.overwrite)?;
        tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "artifact saved");
        Ok(Some(path))
    }
}

fn write_artifact(path: &Path, bytes: &[u8], overwrite: bool) -> ReelResult<()> {
    ensure_parent_dir(path)?;
    if !overwrite && path.exists() {
        return Err(ReelError::validation(format!(
            "output file '{}' already exists",
            path.display()
        )));
    }
    use anyhow::Context as _;
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write artifact '{}'", path.display()))?;
    Ok(())
}

/// Keeps delivered artifacts in memory; clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryOutput {
    slot: Arc<Mutex<Vec<CaptureArtifact>>>,
}

impl MemoryOutput {
    /// Create an empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifacts delivered so far, oldest first.
    pub fn artifacts(&self) -> Vec<CaptureArtifact> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return the most recent artifact.
    pub fn take_last(&self) -> Option<CaptureArtifact> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
    }
}

impl ArtifactOutput for MemoryOutput {
    fn deliver(&mut self, artifact: &CaptureArtifact) -> ReelResult<Option<PathBuf>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(artifact.clone());
        Ok(None)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/output.rs"]
mod tests;
