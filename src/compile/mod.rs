//! Frame plan compiler.
//!
//! Turns `(time, overlay snapshot)` into a backend-agnostic [`plan::FramePlan`]. No pixels are
//! touched here; the raster backend executes the plan.

/// Diagnostic coordinate grid.
pub mod guides;
/// Caption cursor layout.
pub mod layout;
/// Draw plan types and the per-frame compiler.
pub mod plan;
