use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::assets::decode::decode_image;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::premultiply_rgba8_into;
use crate::overlay::document::OverlayDocument;
use crate::overlay::font::FontSpec;

#[derive(Clone, Debug)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Build an image from straight-alpha RGBA8 pixels.
    pub fn from_straight_rgba8(width: u32, height: u32, rgba: &[u8]) -> ReelResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba.len() != expected {
            return Err(ReelError::validation(format!(
                "image byte len {} does not match {width}x{height} RGBA8",
                rgba.len()
            )));
        }
        let mut premul = vec![0u8; expected];
        premultiply_rgba8_into(&mut premul, rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(premul),
        })
    }
}

/// A registered font face.
#[derive(Clone, Debug)]
pub struct FontFace {
    /// Family name read from the font's name table.
    pub family: String,
    /// Raw font file bytes.
    pub bytes: Arc<Vec<u8>>,
}

/// Fonts and images available to overlays.
///
/// Fonts are kept in registration order; the first one is the fallback for captions whose family
/// is not registered. Images are keyed by the overlay `url` that references them.
#[derive(Clone, Debug, Default)]
pub struct OverlayAssets {
    fonts: Vec<FontFace>,
    images: HashMap<String, PreparedImage>,
}

impl OverlayAssets {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every font listed by `doc` and the image its overlay references.
    ///
    /// Failures are logged and skipped: a missing font falls back to the default face and a
    /// missing image keeps the image overlay hidden.
    #[tracing::instrument(skip(doc), fields(root = %doc.assets_root().display()))]
    pub fn load(doc: &OverlayDocument) -> Self {
        let mut assets = Self::new();
        let root = doc.assets_root();
        for font in &doc.fonts {
            match assets.load_font_file(root, font) {
                Ok(family) => tracing::debug!(font = %font, family = %family, "font registered"),
                Err(e) => tracing::warn!(font = %font, error = %e, "font not loaded"),
            }
        }
        if let Some(img) = doc.overlays.image.as_ref() {
            if let Err(e) = assets.load_image_file(root, &img.url) {
                tracing::warn!(url = %img.url, error = %e, "image overlay resource not loaded");
            }
        }
        assets
    }

    /// Register a font from raw bytes and return its family name.
    pub fn register_font(&mut self, bytes: Vec<u8>) -> ReelResult<String> {
        let family = family_name_of(&bytes)?;
        self.fonts.push(FontFace {
            family: family.clone(),
            bytes: Arc::new(bytes),
        });
        Ok(family)
    }

    /// Read a font file relative to `root` and register it.
    pub fn load_font_file(&mut self, root: &Path, rel: &str) -> ReelResult<String> {
        let bytes = read_rel(root, rel)?;
        self.register_font(bytes)
    }

    /// Decode an image file relative to `root` and store it under `url`.
    pub fn load_image_file(&mut self, root: &Path, url: &str) -> ReelResult<()> {
        let bytes = read_rel(root, url)?;
        let prepared = decode_image(&bytes)?;
        self.insert_image(url, prepared);
        Ok(())
    }

    /// Store an already decoded image under `url`, replacing any previous one.
    pub fn insert_image(&mut self, url: impl Into<String>, image: PreparedImage) {
        self.images.insert(url.into(), image);
    }

    /// Image stored under `url`.
    pub fn image(&self, url: &str) -> Option<&PreparedImage> {
        self.images.get(url)
    }

    /// Registered fonts in fallback order.
    pub fn fonts(&self) -> &[FontFace] {
        &self.fonts
    }

    /// Index of the face used for `family`: a case-insensitive match, else the default face.
    ///
    /// `None` only when no font is registered.
    pub fn resolve_face(&self, family: &str) -> Option<usize> {
        if self.fonts.is_empty() {
            return None;
        }
        let wanted = family.trim();
        Some(
            self.fonts
                .iter()
                .position(|f| f.family.eq_ignore_ascii_case(wanted))
                .unwrap_or(0),
        )
    }
}

fn read_rel(root: &Path, rel: &str) -> ReelResult<Vec<u8>> {
    let norm = normalize_rel_path(rel)?;
    let p = root.join(Path::new(&norm));
    let bytes =
        std::fs::read(&p).with_context(|| format!("failed to read asset '{}'", p.display()))?;
    Ok(bytes)
}

fn family_name_of(bytes: &[u8]) -> ReelResult<String> {
    let mut font_ctx = parley::FontContext::default();
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| ReelError::validation("no font families registered from font bytes"))?;
    let name = font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| ReelError::validation("registered font family has no name"))?;
    Ok(name.to_string())
}

/// Normalize and validate document-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> ReelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ReelError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(ReelError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ReelError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ReelError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ShapedGlyph {
    pub(crate) id: u32,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

/// One line of text shaped with a single face.
#[derive(Clone, Debug)]
pub(crate) struct ShapedLine {
    /// Index into [`OverlayAssets::fonts`].
    pub(crate) face: usize,
    pub(crate) font_size: f32,
    /// Glyph positions relative to the layout's top-left corner.
    pub(crate) glyphs: Vec<ShapedGlyph>,
    /// Distance from the layout top to the first baseline.
    pub(crate) baseline: f32,
    /// Horizontal advance including trailing whitespace.
    pub(crate) advance: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct LineKey {
    face: usize,
    size_bits: u32,
    text: String,
}

const LINE_CACHE_LIMIT: usize = 1024;

/// Stateful helper that shapes caption lines with Parley against the registered fonts.
///
/// Shaped lines are cached by `(face, size, text)`; the cache is dropped wholesale once it grows
/// past a fixed bound, since typewriter reveal produces a new prefix almost every frame.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    families: Vec<String>,
    lines: HashMap<LineKey, Arc<ShapedLine>>,
}

impl TextLayoutEngine {
    /// Construct an engine with every font of `assets` registered.
    pub(crate) fn new(assets: &OverlayAssets) -> Self {
        let mut font_ctx = parley::FontContext::default();
        let mut families = Vec::with_capacity(assets.fonts().len());
        for face in assets.fonts() {
            let registered = font_ctx
                .collection
                .register_fonts(parley::fontique::Blob::from(face.bytes.to_vec()), None);
            let name = registered
                .first()
                .and_then(|(id, _)| font_ctx.collection.family_name(*id))
                .map(str::to_owned)
                .unwrap_or_else(|| face.family.clone());
            families.push(name);
        }
        Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            families,
            lines: HashMap::new(),
        }
    }

    /// Shape `text` as a single line with face `face` at `font.size_px`.
    pub(crate) fn shape_line(
        &mut self,
        text: &str,
        face: usize,
        font: &FontSpec,
    ) -> ReelResult<Arc<ShapedLine>> {
        let size_px = font.size_px;
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family_name = self
            .families
            .get(face)
            .cloned()
            .ok_or_else(|| ReelError::resource(format!("font face {face} is not registered")))?;

        let key = LineKey {
            face,
            size_bits: font.size_key(),
            text: text.to_owned(),
        };
        if let Some(line) = self.lines.get(&key) {
            return Ok(Arc::clone(line));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        let mut baseline = 0.0f32;
        for (i, line) in layout.lines().enumerate() {
            if i == 0 {
                baseline = line.metrics().baseline;
            }
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| ShapedGlyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }

        let shaped = Arc::new(ShapedLine {
            face,
            font_size: size_px,
            glyphs,
            baseline,
            advance: f64::from(layout.full_width()),
        });
        if self.lines.len() >= LINE_CACHE_LIMIT {
            self.lines.clear();
        }
        self.lines.insert(key, Arc::clone(&shaped));
        Ok(shaped)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
