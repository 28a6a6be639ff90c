/// Convenience result type used across typereel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by the compositor and capture pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// A drawing context, encoder session or audio tap could not be acquired.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The frame source never signalled readiness within the priming window.
    #[error("source not ready: {0}")]
    SourceNotReady(String),

    /// Malformed overlay data. Rendering never raises this; it is reported by diagnostics.
    #[error("invalid overlay: {0}")]
    InvalidOverlay(String),

    /// The encoding backend failed mid-capture or while finalizing.
    #[error("encoding failure: {0}")]
    EncodingFailure(String),

    /// A capture was requested while another one is still in flight.
    #[error("capture already in progress")]
    CaptureInProgress,

    /// The capture was cancelled before it could be delivered.
    #[error("capture cancelled")]
    Cancelled,

    /// Invalid user-provided configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of a [`ReelError`], cheap to copy and compare.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`ReelError::ResourceUnavailable`].
    ResourceUnavailable,
    /// See [`ReelError::SourceNotReady`].
    SourceNotReady,
    /// See [`ReelError::InvalidOverlay`].
    InvalidOverlay,
    /// See [`ReelError::EncodingFailure`].
    EncodingFailure,
    /// See [`ReelError::CaptureInProgress`].
    CaptureInProgress,
    /// See [`ReelError::Cancelled`].
    Cancelled,
    /// See [`ReelError::Validation`].
    Validation,
    /// See [`ReelError::Serde`].
    Serde,
    /// See [`ReelError::Other`].
    Other,
}

impl ReelError {
    /// Build a [`ReelError::ResourceUnavailable`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::ResourceUnavailable(msg.into())
    }

    /// Build a [`ReelError::SourceNotReady`] value.
    pub fn source_not_ready(msg: impl Into<String>) -> Self {
        Self::SourceNotReady(msg.into())
    }

    /// Build a [`ReelError::InvalidOverlay`] value.
    pub fn invalid_overlay(msg: impl Into<String>) -> Self {
        Self::InvalidOverlay(msg.into())
    }

    /// Build a [`ReelError::EncodingFailure`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::EncodingFailure(msg.into())
    }

    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ResourceUnavailable(_) => ErrorKind::ResourceUnavailable,
            Self::SourceNotReady(_) => ErrorKind::SourceNotReady,
            Self::InvalidOverlay(_) => ErrorKind::InvalidOverlay,
            Self::EncodingFailure(_) => ErrorKind::EncodingFailure,
            Self::CaptureInProgress => ErrorKind::CaptureInProgress,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Serde(_) => ErrorKind::Serde,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
