//! Overlay model: what to draw on top of the base frame, and when.
//!
//! Overlay values are owned by the configuration collaborator. The compositor and reveal engine
//! only ever borrow them for the duration of one render call.

/// Authoring documents and the live snapshot store.
pub mod document;
/// Font descriptors (`"50px Arial"`).
pub mod font;
/// Caption and image overlay types.
pub mod model;
