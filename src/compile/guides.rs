use crate::compile::plan::DrawOp;
use crate::foundation::core::{Canvas, Point, Rect};
use crate::overlay::font::FontSpec;

/// Distance between grid lines, in pixels.
pub const GRID_SPACING_PX: u32 = 50;
/// Grid line color (white, 20% alpha), straight RGBA8.
pub const GRID_LINE_RGBA: [u8; 4] = [255, 255, 255, 51];
/// Grid label color (white, 50% alpha), straight RGBA8.
pub const GRID_LABEL_RGBA: [u8; 4] = [255, 255, 255, 128];
/// Baseline y of the labels along the top edge.
pub const X_LABEL_BASELINE_Y: f64 = 15.0;
/// Left x of the labels along the left edge.
pub const Y_LABEL_X: f64 = 5.0;

/// Font used for grid labels.
pub fn label_font() -> FontSpec {
    FontSpec::new("Arial", 40.0)
}

/// Append the coordinate grid for `canvas` to `ops`.
///
/// For every multiple of the spacing up to and including the canvas edge, a label then a 1px
/// line is emitted: first along x (vertical lines), then along y (horizontal lines).
pub(crate) fn push_grid(canvas: Canvas, ops: &mut Vec<DrawOp>) {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);

    for x in (0..=canvas.width).step_by(GRID_SPACING_PX as usize) {
        let xf = f64::from(x);
        ops.push(DrawOp::GridLabel {
            value: x,
            origin: Point::new(xf, X_LABEL_BASELINE_Y),
        });
        ops.push(DrawOp::GridLine {
            rect: Rect::new(xf, 0.0, xf + 1.0, h),
        });
    }

    for y in (0..=canvas.height).step_by(GRID_SPACING_PX as usize) {
        let yf = f64::from(y);
        ops.push(DrawOp::GridLabel {
            value: y,
            origin: Point::new(Y_LABEL_X, yf),
        });
        ops.push(DrawOp::GridLine {
            rect: Rect::new(0.0, yf, w, yf + 1.0),
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/guides.rs"]
mod tests;
