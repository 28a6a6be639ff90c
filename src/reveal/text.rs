use smallvec::SmallVec;

use crate::overlay::model::{ColorToken, TitleOverlay};

/// The visible prefix of one caption segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentReveal<'a> {
    /// Index into [`TitleOverlay::segments`].
    pub segment: usize,
    /// Visible prefix of the segment text, cut on a `char` boundary.
    pub text: &'a str,
    /// Segment color, passed through untouched.
    pub color: &'a ColorToken,
    /// Whether the whole segment is visible.
    pub complete: bool,
}

/// Visible state of a caption at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct TitleReveal<'a> {
    /// `floor(elapsed * typeSpeed)`, before clamping to the caption length.
    pub chars_visible: u64,
    /// Visible segment prefixes in reveal order. Only the last entry can be incomplete.
    pub segments: SmallVec<[SegmentReveal<'a>; 4]>,
}

/// Number of characters the caption has typed out at time `t`.
///
/// `None` when the caption is outside its window. A non-positive or non-finite type speed
/// yields `Some(0)`: the caption is active but reveals nothing.
pub fn chars_visible(overlay: &TitleOverlay, t: f64) -> Option<u64> {
    if !overlay.is_active_at(t) {
        return None;
    }
    let speed = overlay.type_speed;
    if !speed.is_finite() || speed <= 0.0 {
        return Some(0);
    }
    let n = ((t - overlay.start_time) * speed).floor();
    if !n.is_finite() || n <= 0.0 {
        return Some(0);
    }
    // Saturating float->int cast.
    Some(n as u64)
}

/// Compute the visible segment prefixes of `overlay` at time `t`.
///
/// Segments are consumed strictly in order; segment `k` shows nothing until segment `k - 1` is
/// fully visible. The walk stops after the first partially visible segment.
pub fn reveal_title(overlay: &TitleOverlay, t: f64) -> Option<TitleReveal<'_>> {
    let budget = chars_visible(overlay, t)?;
    let mut segments = SmallVec::new();
    let mut consumed = 0u64;

    for (i, seg) in overlay.segments.iter().enumerate() {
        if consumed >= budget {
            break;
        }
        let remaining = budget - consumed;
        let (text, n) = char_prefix(&seg.text, remaining);
        let complete = text.len() == seg.text.len();
        segments.push(SegmentReveal {
            segment: i,
            text,
            color: &seg.color,
            complete,
        });
        consumed += n;
        if !complete {
            break;
        }
    }

    Some(TitleReveal {
        chars_visible: budget,
        segments,
    })
}

/// Longest prefix of `s` with at most `max_chars` chars, plus its char count.
fn char_prefix(s: &str, max_chars: u64) -> (&str, u64) {
    let mut count = 0u64;
    for (byte_idx, _) in s.char_indices() {
        if count == max_chars {
            return (&s[..byte_idx], count);
        }
        count += 1;
    }
    (s, count)
}

#[cfg(test)]
#[path = "../../tests/unit/reveal/text.rs"]
mod tests;
