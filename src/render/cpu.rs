use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use vello_cpu::kurbo::{Affine, BezPath, Rect as CpuRect, Stroke};
use vello_cpu::peniko::Color;

use crate::assets::store::{OverlayAssets, PreparedImage, ShapedLine, TextLayoutEngine};
use crate::compile::guides::{GRID_LABEL_RGBA, GRID_LINE_RGBA, label_font};
use crate::compile::layout::TextMeasure;
use crate::compile::plan::{DrawOp, FramePlan, FrameRequest, compile_frame_into};
use crate::foundation::core::{Canvas, Point, Rect};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::premultiply_rgba8_into;
use crate::overlay::font::FontSpec;
use crate::overlay::model::{DEFAULT_FADE_IN_SECS, OverlaySet};
use crate::render::backend::FrameRGBA;
use crate::render::color::resolve_color;

/// Caption outline width in pixels.
pub const TEXT_STROKE_WIDTH_PX: f64 = 2.0;
/// Caption outline color.
pub const TEXT_STROKE_RGBA: [u8; 4] = [0, 0, 0, 255];

#[derive(Clone)]
struct ImagePaint {
    paint: vello_cpu::Image,
    w: u32,
    h: u32,
}

struct BaseSurface {
    w: u32,
    h: u32,
    pixmap: Arc<vello_cpu::Pixmap>,
}

/// CPU frame compositor powered by `vello_cpu`.
///
/// Owns its raster context, target pixmap, plan buffer and output frame, all reused across
/// calls. Each instance is single-threaded; preview and capture each own one.
pub struct CpuCompositor {
    canvas: Canvas,
    assets: Arc<OverlayAssets>,
    text: TextLayoutEngine,
    fonts: Vec<vello_cpu::peniko::FontData>,
    ctx: Option<vello_cpu::RenderContext>,
    target: vello_cpu::Pixmap,
    base: Option<BaseSurface>,
    image_cache: HashMap<String, ImagePaint>,
    broken_images: HashSet<String>,
    plan: FramePlan,
    frame: FrameRGBA,
    fade_in_secs: f64,
    warned_no_font: bool,
}

impl CpuCompositor {
    /// Acquire a drawing surface of `canvas` size.
    ///
    /// Fails with [`ReelError::ResourceUnavailable`] when the size is zero or exceeds the raster
    /// backend's limits.
    pub fn new(canvas: Canvas, assets: Arc<OverlayAssets>) -> ReelResult<Self> {
        let (w, h) = surface_dims(canvas)?;
        let text = TextLayoutEngine::new(&assets);
        let fonts = font_data_for(&assets);
        Ok(Self {
            canvas,
            text,
            fonts,
            assets,
            ctx: Some(vello_cpu::RenderContext::new(w, h)),
            target: vello_cpu::Pixmap::new(w, h),
            base: None,
            image_cache: HashMap::new(),
            broken_images: HashSet::new(),
            plan: FramePlan::new(canvas),
            frame: FrameRGBA {
                width: canvas.width,
                height: canvas.height,
                data: vec![0u8; canvas.rgba_len()],
                premultiplied: true,
            },
            fade_in_secs: DEFAULT_FADE_IN_SECS,
            warned_no_font: false,
        })
    }

    /// Target surface size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Assets currently used for fonts and images.
    pub fn assets(&self) -> &Arc<OverlayAssets> {
        &self.assets
    }

    /// Swap the asset store, dropping every cached shaping and image paint.
    pub fn set_assets(&mut self, assets: Arc<OverlayAssets>) {
        self.text = TextLayoutEngine::new(&assets);
        self.fonts = font_data_for(&assets);
        self.image_cache.clear();
        self.broken_images.clear();
        self.assets = assets;
        self.warned_no_font = false;
    }

    /// Image fade-in duration in seconds.
    pub fn set_fade_in_secs(&mut self, secs: f64) {
        self.fade_in_secs = secs;
    }

    /// The plan compiled by the last [`Self::composite_frame`] call.
    pub fn last_plan(&self) -> &FramePlan {
        &self.plan
    }

    /// Composite `overlays` at playback time `t` onto `base`.
    ///
    /// `base` is straight-alpha RGBA8 of any size; it is scaled to fill the target. The returned
    /// frame is premultiplied and borrowed from the compositor until the next call.
    pub fn composite_frame(
        &mut self,
        base: &FrameRGBA,
        overlays: &OverlaySet,
        t: f64,
        diagnostics: bool,
    ) -> ReelResult<&FrameRGBA> {
        let image_loaded = overlays
            .image
            .as_ref()
            .is_some_and(|img| self.assets.image(&img.url).is_some());
        let req = FrameRequest {
            time: t,
            overlays,
            diagnostics,
            fade_in_secs: self.fade_in_secs,
            image_loaded,
        };
        let mut measure = EngineMeasure {
            engine: &mut self.text,
            assets: &self.assets,
        };
        compile_frame_into(&mut self.plan, &req, &mut measure);

        let plan = std::mem::replace(&mut self.plan, FramePlan::new(self.canvas));
        let res = self.run_plan(&plan, base, overlays);
        self.plan = plan;
        res?;
        Ok(&self.frame)
    }

    /// Execute a compiled plan against `base` and `overlays` (the snapshot it was compiled from).
    pub fn execute(
        &mut self,
        plan: &FramePlan,
        base: &FrameRGBA,
        overlays: &OverlaySet,
    ) -> ReelResult<&FrameRGBA> {
        self.run_plan(plan, base, overlays)?;
        Ok(&self.frame)
    }

    fn run_plan(
        &mut self,
        plan: &FramePlan,
        base: &FrameRGBA,
        overlays: &OverlaySet,
    ) -> ReelResult<()> {
        if plan.canvas != self.canvas {
            return Err(ReelError::validation(format!(
                "plan canvas {}x{} does not match compositor canvas {}x{}",
                plan.canvas.width, plan.canvas.height, self.canvas.width, self.canvas.height
            )));
        }
        self.upload_base(base)?;

        let (w, h) = surface_dims(self.canvas)?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        let res = self.draw_ops(&mut ctx, plan, overlays);
        if res.is_ok() {
            ctx.flush();
            ctx.render_to_pixmap(&mut self.target);
        }
        // Release image paints so the next base upload can reuse its pixmap in place.
        ctx.set_paint(Color::from_rgba8(0, 0, 0, 0));
        ctx.reset();
        self.ctx = Some(ctx);
        res?;

        self.frame
            .data
            .copy_from_slice(self.target.data_as_u8_slice());
        Ok(())
    }

    fn draw_ops(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        plan: &FramePlan,
        overlays: &OverlaySet,
    ) -> ReelResult<()> {
        for op in plan.ops() {
            ctx.set_transform(Affine::IDENTITY);
            ctx.set_paint_transform(Affine::IDENTITY);
            match op {
                DrawOp::Base => self.draw_base(ctx),
                DrawOp::TextLine {
                    title,
                    segment,
                    range,
                    origin,
                } => {
                    let Some(t) = overlays.titles.get(*title) else {
                        continue;
                    };
                    let Some(seg) = t.segments.get(*segment) else {
                        continue;
                    };
                    let Some(text) = seg.text.get(range.clone()) else {
                        continue;
                    };
                    let Some(rgba) = resolve_color(&seg.color) else {
                        tracing::debug!(title, segment, color = ?seg.color, "unresolvable caption color; run skipped");
                        continue;
                    };
                    self.draw_text(ctx, text, &t.style, *origin, rgba, true);
                }
                DrawOp::Image {
                    rect,
                    radius,
                    opacity,
                } => {
                    let Some(img) = overlays.image.as_ref() else {
                        continue;
                    };
                    let Some(paint) = self.image_paint_for(&img.url) else {
                        continue;
                    };
                    draw_rounded_image(ctx, &paint, *rect, *radius, *opacity);
                }
                DrawOp::GridLine { rect } => {
                    let [r, g, b, a] = GRID_LINE_RGBA;
                    ctx.set_paint(Color::from_rgba8(r, g, b, a));
                    ctx.fill_rect(&to_cpu_rect(*rect));
                }
                DrawOp::GridLabel { value, origin } => {
                    let label = value.to_string();
                    self.draw_text(ctx, &label, &label_font(), *origin, GRID_LABEL_RGBA, false);
                }
            }
        }
        Ok(())
    }

    fn upload_base(&mut self, base: &FrameRGBA) -> ReelResult<()> {
        if base.width == 0 || base.height == 0 || !base.is_well_formed() {
            return Err(ReelError::validation(format!(
                "base frame {}x{} with {} bytes is malformed",
                base.width,
                base.height,
                base.data.len()
            )));
        }
        let (w, h) = surface_dims(Canvas {
            width: base.width,
            height: base.height,
        })?;

        let reusable = self.base.as_mut().is_some_and(|s| {
            s.w == base.width && s.h == base.height && Arc::get_mut(&mut s.pixmap).is_some()
        });
        if !reusable {
            self.base = Some(BaseSurface {
                w: base.width,
                h: base.height,
                pixmap: Arc::new(vello_cpu::Pixmap::new(w, h)),
            });
        }
        let pixmap = self
            .base
            .as_mut()
            .and_then(|s| Arc::get_mut(&mut s.pixmap))
            .ok_or_else(|| ReelError::resource("base surface is still borrowed"))?;
        let dst = pixmap.data_as_u8_slice_mut();
        if base.premultiplied {
            dst.copy_from_slice(&base.data);
        } else {
            premultiply_rgba8_into(dst, &base.data);
        }
        Ok(())
    }

    fn draw_base(&self, ctx: &mut vello_cpu::RenderContext) {
        let Some(base) = self.base.as_ref() else {
            return;
        };
        let sx = f64::from(self.canvas.width) / f64::from(base.w);
        let sy = f64::from(self.canvas.height) / f64::from(base.h);
        ctx.set_transform(Affine::scale_non_uniform(sx, sy));
        ctx.set_paint(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::clone(&base.pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        });
        ctx.fill_rect(&CpuRect::new(0.0, 0.0, f64::from(base.w), f64::from(base.h)));
    }

    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        font: &FontSpec,
        origin: Point,
        rgba: [u8; 4],
        outlined: bool,
    ) {
        let Some(face) = self.assets.resolve_face(&font.family) else {
            if !self.warned_no_font {
                tracing::warn!("no font registered; caption and label text is not drawn");
                self.warned_no_font = true;
            }
            return;
        };
        let line = match self.text.shape_line(text, face, font) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, family = %font.family, "text shaping failed; line skipped");
                return;
            }
        };
        let Some(font_data) = self.fonts.get(line.face) else {
            return;
        };

        ctx.set_transform(Affine::translate((
            origin.x,
            origin.y - f64::from(line.baseline),
        )));
        if outlined {
            let [r, g, b, a] = TEXT_STROKE_RGBA;
            ctx.set_stroke(Stroke::new(TEXT_STROKE_WIDTH_PX));
            ctx.set_paint(Color::from_rgba8(r, g, b, a));
            ctx.glyph_run(font_data)
                .font_size(line.font_size)
                .stroke_glyphs(cpu_glyphs(&line));
        }
        let [r, g, b, a] = rgba;
        ctx.set_paint(Color::from_rgba8(r, g, b, a));
        ctx.glyph_run(font_data)
            .font_size(line.font_size)
            .fill_glyphs(cpu_glyphs(&line));
    }

    /// Paint for `url`, or `None` when it is not loaded or cannot be rasterized.
    ///
    /// A conversion failure is logged once and remembered until the assets change.
    fn image_paint_for(&mut self, url: &str) -> Option<ImagePaint> {
        if let Some(p) = self.image_cache.get(url) {
            return Some(p.clone());
        }
        if self.broken_images.contains(url) {
            return None;
        }
        let prepared = self.assets.image(url)?;
        match image_paint(prepared) {
            Ok(paint) => {
                self.image_cache.insert(url.to_owned(), paint.clone());
                Some(paint)
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "image overlay cannot be drawn; skipped");
                self.broken_images.insert(url.to_owned());
                None
            }
        }
    }
}

struct EngineMeasure<'a> {
    engine: &'a mut TextLayoutEngine,
    assets: &'a OverlayAssets,
}

impl TextMeasure for EngineMeasure<'_> {
    fn advance(&mut self, text: &str, font: &FontSpec) -> f64 {
        let Some(face) = self.assets.resolve_face(&font.family) else {
            return 0.0;
        };
        self.engine
            .shape_line(text, face, font)
            .map(|l| l.advance)
            .unwrap_or(0.0)
    }
}

fn draw_rounded_image(
    ctx: &mut vello_cpu::RenderContext,
    paint: &ImagePaint,
    rect: Rect,
    radius: f64,
    opacity: f32,
) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }
    ctx.set_transform(Affine::IDENTITY);
    ctx.push_clip_layer(&rounded_rect_path(rect, radius));
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    let sx = rect.width() / f64::from(paint.w.max(1));
    let sy = rect.height() / f64::from(paint.h.max(1));
    ctx.set_transform(Affine::translate((rect.x0, rect.y0)) * Affine::scale_non_uniform(sx, sy));
    ctx.set_paint(paint.paint.clone());
    ctx.fill_rect(&CpuRect::new(0.0, 0.0, f64::from(paint.w), f64::from(paint.h)));
    if opacity < 1.0 {
        ctx.pop_layer();
    }
    ctx.pop_layer();
}

/// Rounded rectangle with quadratic corners.
fn rounded_rect_path(rect: Rect, radius: f64) -> BezPath {
    let r = radius.clamp(0.0, rect.width().min(rect.height()) / 2.0);
    let (x0, y0, x1, y1) = (rect.x0, rect.y0, rect.x1, rect.y1);
    let mut p = BezPath::new();
    p.move_to((x0 + r, y0));
    p.line_to((x1 - r, y0));
    p.quad_to((x1, y0), (x1, y0 + r));
    p.line_to((x1, y1 - r));
    p.quad_to((x1, y1), (x1 - r, y1));
    p.line_to((x0 + r, y1));
    p.quad_to((x0, y1), (x0, y1 - r));
    p.line_to((x0, y0 + r));
    p.quad_to((x0, y0), (x0 + r, y0));
    p.close_path();
    p
}

fn cpu_glyphs(line: &ShapedLine) -> impl Iterator<Item = vello_cpu::Glyph> + '_ {
    line.glyphs.iter().map(|g| vello_cpu::Glyph {
        id: g.id,
        x: g.x,
        y: g.y,
    })
}

fn to_cpu_rect(r: Rect) -> CpuRect {
    CpuRect::new(r.x0, r.y0, r.x1, r.y1)
}

fn surface_dims(canvas: Canvas) -> ReelResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| ReelError::resource("surface width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| ReelError::resource("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(ReelError::resource(format!(
            "cannot acquire a {}x{} drawing surface",
            canvas.width, canvas.height
        )));
    }
    Ok((w, h))
}

fn font_data_for(assets: &OverlayAssets) -> Vec<vello_cpu::peniko::FontData> {
    assets
        .fonts()
        .iter()
        .map(|f| {
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(f.bytes.to_vec()), 0)
        })
        .collect()
}

fn image_paint(prepared: &PreparedImage) -> ReelResult<ImagePaint> {
    let pixmap =
        pixmap_from_premul_bytes(&prepared.rgba8_premul, prepared.width, prepared.height)?;
    Ok(ImagePaint {
        paint: vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        },
        w: prepared.width,
        h: prepared.height,
    })
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Pixmap> {
    let (w, h) = surface_dims(Canvas { width, height })?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(ReelError::validation("pixmap byte len mismatch"));
    }
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    pixmap.data_as_u8_slice_mut().copy_from_slice(bytes);
    Ok(pixmap)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
