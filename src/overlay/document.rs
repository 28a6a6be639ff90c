use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::model::OverlaySet;

/// On-disk overlay configuration: the overlays plus the font files they need.
///
/// Relative paths (`fonts`, `image.url`) resolve against the document's directory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayDocument {
    /// Font files to register, in fallback order (the first one is the default face).
    #[serde(default)]
    pub fonts: Vec<String>,
    /// The overlays.
    #[serde(flatten)]
    pub overlays: OverlaySet,
    #[serde(skip)]
    root: Option<PathBuf>,
}

impl OverlayDocument {
    /// Wrap an overlay set with no fonts.
    pub fn new(overlays: OverlaySet) -> Self {
        Self {
            fonts: Vec::new(),
            overlays,
            root: None,
        }
    }

    /// Parse a document from JSON text.
    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        serde_json::from_str(s).map_err(|e| ReelError::serde(e.to_string()))
    }

    /// Read and parse a document; asset paths will resolve relative to its directory.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read overlay document '{}'", path.display()))?;
        let mut doc = Self::from_json_str(&text)?;
        doc.root = Some(
            path.parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        );
        Ok(doc)
    }

    /// Directory that relative asset paths resolve against.
    pub fn assets_root(&self) -> &Path {
        self.root.as_deref().unwrap_or_else(|| Path::new("."))
    }

    /// Override the asset root.
    pub fn with_assets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
}

/// Read side of the overlay configuration collaborator.
///
/// Each render call takes one snapshot and renders exclusively from it, so edits made while a
/// frame is being composited land on the next frame.
pub trait OverlaySnapshots: Send + Sync {
    /// The current overlay set.
    fn snapshot(&self) -> Arc<OverlaySet>;
    /// Whether the diagnostic grid is currently toggled on.
    fn diagnostics_enabled(&self) -> bool;
}

/// Copy-on-write overlay store shared between an editor, the preview loop and captures.
#[derive(Debug, Default)]
pub struct LiveOverlays {
    current: RwLock<Arc<OverlaySet>>,
    diagnostics: AtomicBool,
}

impl LiveOverlays {
    /// Create a store holding `set`.
    pub fn new(set: OverlaySet) -> Self {
        Self {
            current: RwLock::new(Arc::new(set)),
            diagnostics: AtomicBool::new(false),
        }
    }

    /// Replace the whole overlay set. In-flight renders keep the snapshot they started with.
    pub fn replace(&self, set: OverlaySet) {
        let next = Arc::new(set);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Apply an edit to the current set and publish the result.
    ///
    /// The write lock is held for the whole edit, so concurrent edits serialize. Outstanding
    /// snapshots keep the set they were taken from.
    pub fn update(&self, edit: impl FnOnce(&mut OverlaySet)) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        edit(Arc::make_mut(&mut guard));
    }

    /// Toggle the diagnostic grid.
    pub fn set_diagnostics(&self, enabled: bool) {
        self.diagnostics.store(enabled, Ordering::Relaxed);
    }
}

impl OverlaySnapshots for LiveOverlays {
    fn snapshot(&self) -> Arc<OverlaySet> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    fn diagnostics_enabled(&self) -> bool {
        self.diagnostics.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/document.rs"]
mod tests;
