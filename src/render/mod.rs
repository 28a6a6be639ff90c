//! Raster backend: executes frame plans on a `vello_cpu` surface.

/// Frame buffers exchanged with sources and sinks.
pub mod backend;
/// CSS color token resolution.
pub mod color;
/// The CPU compositor.
pub mod cpu;
