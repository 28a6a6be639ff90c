use serde::{Deserialize, Serialize};

use crate::foundation::core::Point;
use crate::foundation::error::ReelError;
use crate::overlay::font::FontSpec;

/// Edge length of the square image overlay, in pixels.
pub const IMAGE_SIZE_PX: f64 = 400.0;
/// Corner radius of the image overlay clip, in pixels.
pub const IMAGE_CORNER_RADIUS_PX: f64 = 20.0;
/// Default fade-in duration of the image overlay, in seconds.
pub const DEFAULT_FADE_IN_SECS: f64 = 1.0;

/// Opaque color value attached to a caption segment.
///
/// The model never interprets it; the raster backend resolves it when drawing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorToken {
    /// CSS-style color string (`"#ff0000"`, `"yellow"`, `"rgba(0,0,0,0.5)"`).
    Css(String),
    /// Straight-alpha RGBA tuple.
    Rgba([u8; 4]),
}

impl ColorToken {
    /// Build a CSS-style token.
    pub fn css(s: impl Into<String>) -> Self {
        Self::Css(s.into())
    }
}

impl Default for ColorToken {
    fn default() -> Self {
        Self::Css("#FFFFFF".to_owned())
    }
}

/// One colored run of caption text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    /// UTF-8 text; may contain `\n` line breaks.
    pub text: String,
    /// Fill color.
    #[serde(default)]
    pub color: ColorToken,
}

impl TextSegment {
    /// Create a segment.
    pub fn new(text: impl Into<String>, color: ColorToken) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }

    /// Length in characters (Unicode scalar values).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A typewriter caption made of colored segments revealed in order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleOverlay {
    /// Segments in reveal order.
    pub segments: Vec<TextSegment>,
    /// Baseline origin of the first line in frame pixel space.
    pub position: Point,
    /// First second at which the caption is visible.
    pub start_time: f64,
    /// Last second at which the caption is visible (inclusive).
    pub end_time: f64,
    /// Font family and size.
    pub style: FontSpec,
    /// Characters revealed per second.
    pub type_speed: f64,
}

impl TitleOverlay {
    /// Return `true` when `t` is inside `[start_time, end_time]`.
    ///
    /// An inverted window (`end_time < start_time`) or non-finite `t` is never active.
    pub fn is_active_at(&self, t: f64) -> bool {
        window_contains(self.start_time, self.end_time, t)
    }

    /// Total length of all segments in characters.
    pub fn total_chars(&self) -> usize {
        self.segments.iter().map(TextSegment::char_len).sum()
    }
}

/// A single image drawn into a fixed-size rounded rectangle with a fade-in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOverlay {
    /// Image resource reference, resolved by the asset collaborator.
    pub url: String,
    /// Top-left corner in frame pixel space.
    pub position: Point,
    /// First second at which the image is visible (fade starts here).
    pub start_time: f64,
    /// Last second at which the image is visible (inclusive).
    pub end_time: f64,
}

impl ImageOverlay {
    /// Return `true` when `t` is inside `[start_time, end_time]`.
    pub fn is_active_at(&self, t: f64) -> bool {
        window_contains(self.start_time, self.end_time, t)
    }
}

/// The full overlay configuration rendered onto every frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlaySet {
    /// Captions, drawn in list order (later entries on top).
    #[serde(default)]
    pub titles: Vec<TitleOverlay>,
    /// Optional image overlay, drawn above all captions.
    #[serde(default)]
    pub image: Option<ImageOverlay>,
}

/// Which overlay an [`ReelError::InvalidOverlay`] diagnostic refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayRef {
    /// Index into [`OverlaySet::titles`].
    Title(usize),
    /// The image overlay.
    Image,
}

impl OverlaySet {
    /// Report overlays that will be sanitized to "never visible" or "never reveals".
    ///
    /// Rendering does not depend on this; it exists so collaborators can surface problems.
    pub fn diagnose(&self) -> Vec<(OverlayRef, ReelError)> {
        let mut out = Vec::new();
        for (i, t) in self.titles.iter().enumerate() {
            let who = OverlayRef::Title(i);
            if let Some(msg) = window_problem(t.start_time, t.end_time) {
                out.push((who, ReelError::invalid_overlay(format!("title {i}: {msg}"))));
            }
            if !t.type_speed.is_finite() || t.type_speed <= 0.0 {
                out.push((
                    who,
                    ReelError::invalid_overlay(format!(
                        "title {i}: typeSpeed {} never reveals any character",
                        t.type_speed
                    )),
                ));
            }
            if !t.position.x.is_finite() || !t.position.y.is_finite() {
                out.push((
                    who,
                    ReelError::invalid_overlay(format!("title {i}: position is not finite")),
                ));
            }
        }
        if let Some(img) = &self.image {
            if let Some(msg) = window_problem(img.start_time, img.end_time) {
                out.push((
                    OverlayRef::Image,
                    ReelError::invalid_overlay(format!("image: {msg}")),
                ));
            }
            if img.url.trim().is_empty() {
                out.push((
                    OverlayRef::Image,
                    ReelError::invalid_overlay("image: url is empty"),
                ));
            }
        }
        out
    }
}

fn window_contains(start: f64, end: f64, t: f64) -> bool {
    t.is_finite() && t >= start && t <= end
}

fn window_problem(start: f64, end: f64) -> Option<String> {
    if !start.is_finite() || !end.is_finite() {
        return Some("startTime/endTime must be finite".to_owned());
    }
    if end < start {
        return Some(format!(
            "endTime {end} is before startTime {start}; overlay never renders"
        ));
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/model.rs"]
mod tests;
