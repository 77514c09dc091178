//! Font and asset collaborators consumed by layout.
//!
//! Layout never rasterises anything. It asks a [`FontProvider`] for metrics
//! and glyph quads and an [`AssetProvider`] for icons and textures, then
//! emits quads referencing whatever [`TextureRef`] those providers returned.

pub mod monospace;

use crate::geometry::{Point, Size, point};
use crate::glyph_id::GlyphId;
use crate::style::{FontId, TextStyle};

/// Face and pixel size a glyph is requested at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontRequest {
    /// `None` selects the provider's default face.
    pub face: Option<FontId>,
    pub size: f32,
}

/// Vertical metrics in pixels at the requested size. Both values are
/// positive distances from the baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceMetrics {
    pub ascent: f32,
    pub descent: f32,
}

/// Texture a quad samples from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureRef {
    /// Solid fill.
    #[default]
    None,
    /// Host texture handle.
    Handle(u64),
    /// Glyph the host rasterises on demand, e.g. through [`crate::FontSystem::rasterize`].
    Glyph(GlyphId),
}

/// A positioned glyph quad.
///
/// Coordinates are relative to the pen, with `y = 0` at the top of the em box
/// and the baseline at `y = ascent`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    pub codepoint: char,
    pub xy0: Point,
    pub xy1: Point,
    pub advance: f32,
    pub uv0: Point,
    pub uv1: Point,
    pub texture: TextureRef,
    /// `false` for glyphs without ink.
    pub visible: bool,
}

impl Glyph {
    /// Zero-width glyph used when neither the codepoint nor the fallback
    /// character resolves.
    pub fn invisible(codepoint: char) -> Self {
        Self {
            codepoint,
            xy0: point(0.0, 0.0),
            xy1: point(0.0, 0.0),
            advance: 0.0,
            uv0: point(0.0, 0.0),
            uv1: point(0.0, 0.0),
            texture: TextureRef::None,
            visible: false,
        }
    }
}

pub trait FontProvider {
    /// Size used when a style leaves the font size at `0`.
    fn default_font_size(&self) -> f32;

    fn face_metrics(&self, request: &FontRequest) -> Option<FaceMetrics>;

    /// `None` when the face has no glyph for `c`.
    fn glyph(&self, request: &FontRequest, c: char) -> Option<Glyph>;

    fn kerning(&self, _request: &FontRequest, _left: char, _right: char) -> f32 {
        0.0
    }

    fn fallback_char(&self) -> char {
        char::REPLACEMENT_CHARACTER
    }
}

/// Icon region with its natural size; only the aspect ratio is used.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IconEntry {
    pub texture: TextureRef,
    pub size: Size,
    pub uv0: Point,
    pub uv1: Point,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureInfo {
    pub texture: TextureRef,
    pub size: Size,
}

/// Resolves inline icons and textures. Both default to "not found".
pub trait AssetProvider {
    fn resolve_icon(&self, _id: u32, _font_size: f32) -> Option<IconEntry> {
        None
    }

    fn resolve_texture(&self, _handle: u64) -> Option<TextureInfo> {
        None
    }
}

/// Provider with no assets; inline icons and textures render nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAssets;

impl AssetProvider for NoAssets {}

/// Collaborators threaded through measure and draw.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub fonts: &'a dyn FontProvider,
    pub assets: &'a dyn AssetProvider,
}

impl<'a> RenderContext<'a> {
    pub fn new(fonts: &'a dyn FontProvider) -> Self {
        Self {
            fonts,
            assets: &NoAssets,
        }
    }

    pub fn with_assets(mut self, assets: &'a dyn AssetProvider) -> Self {
        self.assets = assets;
        self
    }
}

const FAKE_ITALIC_DIVISOR: f32 = 6.0;

/// Metrics of the face selected by a style, resolved once per style change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FontInfo {
    pub request: FontRequest,
    pub size: f32,
    pub ascent: f32,
    /// Line box height in pixels.
    pub line_height: f32,
    /// Line box relative to the baseline: `[-(ascent + gap), descent + gap]`.
    pub bbox_vertical: [f32; 2],
    /// Extra width of synthesised bold.
    pub bold_extra: f32,
    pub fake_italic: bool,
    /// Style horizontal offset in pixels.
    pub horizontal_offset: f32,
    pub decoration_thickness: f32,
    /// Tab stop distance; `0` measures tabs as ordinary characters.
    pub tab_width: f32,
}

impl FontInfo {
    pub fn resolve(ctx: RenderContext<'_>, style: &TextStyle, tab_width: f32) -> Self {
        let default_size = ctx.fonts.default_font_size();
        let size = if style.font_size > 0.0 {
            style.font_size
        } else if style.font_size < 0.0 {
            -style.font_size * default_size
        } else {
            default_size
        };

        let (face, synth_bold, synth_italic) = style.font_set.select(style.bold, style.italic);
        let request = FontRequest { face, size };

        let FaceMetrics { ascent, descent } = ctx.fonts.face_metrics(&request).unwrap_or_else(|| {
            log::warn!("No face metrics for {request:?}; synthesising them.");
            FaceMetrics {
                ascent: size * 0.8,
                descent: size * 0.2,
            }
        });

        let multiplier = if style.line_height > 0.0 {
            style.line_height
        } else {
            1.0
        };
        let line_height = (ascent + descent) * multiplier;
        let gap = (line_height - ascent - descent) / 2.0;

        let mut info = Self {
            request,
            size,
            ascent,
            line_height,
            bbox_vertical: [-(ascent + gap), descent + gap],
            bold_extra: if synth_bold { 1.0 } else { 0.0 },
            fake_italic: synth_italic,
            horizontal_offset: style.horizontal_offset * size,
            decoration_thickness: style.text_decoration_thickness * size,
            tab_width: 0.0,
        };

        info.tab_width = if tab_width > 0.0 {
            tab_width
        } else if tab_width < 0.0 {
            -tab_width * info.glyph(ctx, ' ').advance.round()
        } else {
            0.0
        };

        info
    }

    /// Horizontal shear of a synthesised italic at height `y` of the em box.
    pub fn top_skew(&self, y: f32) -> f32 {
        if self.fake_italic {
            (self.ascent - y) / FAKE_ITALIC_DIVISOR
        } else {
            0.0
        }
    }

    /// Resolves `c`, falling back to the provider's replacement character and
    /// then to an invisible zero-width glyph.
    pub fn glyph(&self, ctx: RenderContext<'_>, c: char) -> Glyph {
        if let Some(glyph) = ctx.fonts.glyph(&self.request, c) {
            return glyph;
        }

        log::debug!("No glyph for {c:?} in {:?}; using fallback.", self.request);
        ctx.fonts
            .glyph(&self.request, ctx.fonts.fallback_char())
            .map(|g| Glyph { codepoint: c, ..g })
            .unwrap_or_else(|| Glyph::invisible(c))
    }

    pub fn kerning(&self, ctx: RenderContext<'_>, left: char, right: char) -> f32 {
        ctx.fonts.kerning(&self.request, left, right)
    }

    /// Sum of rounded advances, used to size control character labels.
    pub fn text_width(&self, ctx: RenderContext<'_>, text: &str) -> f32 {
        text.chars()
            .map(|c| self.glyph(ctx, c).advance.round())
            .sum()
    }
}
