use std::ops::Range;

use crate::foundation::core::Point;
use crate::overlay::font::FontSpec;
use crate::overlay::model::TitleOverlay;
use crate::reveal::text::TitleReveal;

/// Horizontal text measurement used to advance the caption cursor.
///
/// The CPU compositor implements this with shaped glyph advances; tests use fixed-width fakes.
pub trait TextMeasure {
    /// Advance width of `text` (a single line) in pixels under `font`.
    fn advance(&mut self, text: &str, font: &FontSpec) -> f64;
}

/// One line of visible caption text placed on the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LineRun {
    /// Index into [`TitleOverlay::segments`].
    pub segment: usize,
    /// Byte range of the line inside the segment text.
    pub range: Range<usize>,
    /// Left end of the alphabetic baseline.
    pub origin: Point,
}

/// Lay out the visible prefix of a caption, calling `emit` for every non-empty line.
///
/// Cursor rules:
/// - every line of a segment starts at the current cursor x, line `i` at `y + i * pitch`;
/// - after a segment with embedded newlines, x returns to the caption's base x and y moves down
///   by `(lines - 1) * pitch`;
/// - after a single-line segment, x advances by its measured width.
pub fn layout_title(
    overlay: &TitleOverlay,
    reveal: &TitleReveal<'_>,
    measure: &mut dyn TextMeasure,
    mut emit: impl FnMut(LineRun),
) {
    let base = overlay.position;
    if !base.x.is_finite() || !base.y.is_finite() {
        return;
    }
    let pitch = overlay.style.line_pitch();
    let mut x = base.x;
    let mut y = base.y;

    for seg in &reveal.segments {
        let mut line_count = 0usize;
        let mut offset = 0usize;
        for line in seg.text.split('\n') {
            let start = offset;
            let end = start + line.len();
            offset = end + 1;
            if !line.is_empty() {
                emit(LineRun {
                    segment: seg.segment,
                    range: start..end,
                    origin: Point::new(x, y + line_count as f64 * pitch),
                });
            }
            line_count += 1;
        }

        if line_count > 1 {
            x = base.x;
            y += (line_count - 1) as f64 * pitch;
        } else {
            x += measure.advance(seg.text, &overlay.style);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/layout.rs"]
mod tests;
