//! Temporal reveal engine.
//!
//! Pure functions of `(overlay, time)`: which caption characters are visible and how opaque the
//! image overlay is. Nothing in here touches a drawing surface.

/// Image overlay fade-in.
pub mod image;
/// Typewriter caption reveal.
pub mod text;
