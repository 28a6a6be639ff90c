use std::ops::Range;

use crate::compile::guides::push_grid;
use crate::compile::layout::{TextMeasure, layout_title};
use crate::foundation::core::{Canvas, Point, Rect};
use crate::overlay::model::{IMAGE_CORNER_RADIUS_PX, IMAGE_SIZE_PX, OverlaySet};
use crate::reveal::image::reveal_image;
use crate::reveal::text::reveal_title;

/// Compositing layer an op belongs to. Layers are drawn in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// The source video frame.
    Base,
    /// Caption at this index of [`OverlaySet::titles`].
    Title(usize),
    /// The image overlay.
    Image,
    /// The coordinate grid.
    Diagnostics,
}

#[derive(Clone, Debug, PartialEq)]
/// Draw operation emitted by the compiler.
pub enum DrawOp {
    /// Draw the base frame scaled to fill the canvas.
    Base,
    /// Stroke then fill one line of caption text.
    TextLine {
        /// Index into [`OverlaySet::titles`].
        title: usize,
        /// Index into the caption's segments; selects text and color.
        segment: usize,
        /// Byte range of the line within the segment text.
        range: Range<usize>,
        /// Left end of the alphabetic baseline.
        origin: Point,
    },
    /// Draw the image overlay clipped to a rounded rectangle.
    Image {
        /// Destination rectangle; the image is scaled to fill it.
        rect: Rect,
        /// Corner radius of the clip.
        radius: f64,
        /// Opacity in `[0, 1]`.
        opacity: f32,
    },
    /// Fill a 1px grid line.
    GridLine {
        /// Line geometry.
        rect: Rect,
    },
    /// Draw a pixel-coordinate label.
    GridLabel {
        /// Coordinate value printed as decimal text.
        value: u32,
        /// Left end of the alphabetic baseline.
        origin: Point,
    },
}

impl DrawOp {
    /// Layer this op is composited in.
    pub fn layer(&self) -> Layer {
        match self {
            Self::Base => Layer::Base,
            Self::TextLine { title, .. } => Layer::Title(*title),
            Self::Image { .. } => Layer::Image,
            Self::GridLine { .. } | Self::GridLabel { .. } => Layer::Diagnostics,
        }
    }
}

/// Backend-agnostic draw plan for a single frame.
///
/// Ops are in painter order. A plan is meant to be recompiled in place every frame so its
/// buffer is reused.
#[derive(Clone, Debug)]
pub struct FramePlan {
    /// Target canvas.
    pub canvas: Canvas,
    ops: Vec<DrawOp>,
}

impl FramePlan {
    /// Create an empty plan for `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            ops: Vec::new(),
        }
    }

    /// Ops in painter order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Ops belonging to `layer`.
    pub fn layer_ops(&self, layer: Layer) -> impl Iterator<Item = &DrawOp> + '_ {
        self.ops.iter().filter(move |op| op.layer() == layer)
    }
}

/// Inputs for compiling one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameRequest<'a> {
    /// Playback time in seconds.
    pub time: f64,
    /// Overlay snapshot rendered by this frame.
    pub overlays: &'a OverlaySet,
    /// Draw the coordinate grid.
    pub diagnostics: bool,
    /// Image fade-in duration in seconds.
    pub fade_in_secs: f64,
    /// Whether the image overlay's resource is loaded and drawable.
    pub image_loaded: bool,
}

/// Compile `req` into `plan`, replacing its previous contents.
pub fn compile_frame_into(
    plan: &mut FramePlan,
    req: &FrameRequest<'_>,
    measure: &mut dyn TextMeasure,
) {
    plan.ops.clear();
    plan.ops.push(DrawOp::Base);

    for (i, title) in req.overlays.titles.iter().enumerate() {
        let Some(reveal) = reveal_title(title, req.time) else {
            continue;
        };
        let ops = &mut plan.ops;
        layout_title(title, &reveal, measure, |run| {
            ops.push(DrawOp::TextLine {
                title: i,
                segment: run.segment,
                range: run.range,
                origin: run.origin,
            });
        });
    }

    if let Some(image) = req.overlays.image.as_ref()
        && image.position.x.is_finite()
        && image.position.y.is_finite()
        && let Some(r) = reveal_image(image, req.time, req.image_loaded, req.fade_in_secs)
    {
        let origin = image.position;
        plan.ops.push(DrawOp::Image {
            rect: Rect::new(
                origin.x,
                origin.y,
                origin.x + IMAGE_SIZE_PX,
                origin.y + IMAGE_SIZE_PX,
            ),
            radius: IMAGE_CORNER_RADIUS_PX,
            opacity: r.opacity,
        });
    }

    if req.diagnostics {
        push_grid(plan.canvas, &mut plan.ops);
    }
}

/// Compile `req` into a fresh plan.
pub fn compile_frame(
    canvas: Canvas,
    req: &FrameRequest<'_>,
    measure: &mut dyn TextMeasure,
) -> FramePlan {
    let mut plan = FramePlan::new(canvas);
    compile_frame_into(&mut plan, req, measure);
    plan
}

#[cfg(test)]
#[path = "../../tests/unit/compile/plan.rs"]
mod tests;
