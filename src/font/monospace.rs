use crate::font::{FaceMetrics, FontProvider, FontRequest, Glyph, TextureRef};
use crate::geometry::point;

/// Deterministic fixed-advance font.
///
/// Every printable character advances by `size * advance_ratio` and fills
/// the whole em box. Control and zero-width characters have no advance. Used
/// for headless layout and in tests, where exact pixel positions matter more
/// than glyph shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceFont {
    pub default_size: f32,
    pub advance_ratio: f32,
    pub ascent_ratio: f32,
    pub descent_ratio: f32,
}

impl Default for MonospaceFont {
    fn default() -> Self {
        Self::new(16.0)
    }
}

impl MonospaceFont {
    pub fn new(default_size: f32) -> Self {
        Self {
            default_size,
            advance_ratio: 1.0,
            ascent_ratio: 0.8,
            descent_ratio: 0.2,
        }
    }

    pub fn with_advance_ratio(mut self, advance_ratio: f32) -> Self {
        self.advance_ratio = advance_ratio;
        self
    }

    fn is_zero_width(c: char) -> bool {
        c.is_control() || matches!(c, '\u{AD}' | '\u{200B}'..='\u{200D}' | '\u{FEFF}')
    }
}

impl FontProvider for MonospaceFont {
    fn default_font_size(&self) -> f32 {
        self.default_size
    }

    fn face_metrics(&self, request: &FontRequest) -> Option<FaceMetrics> {
        Some(FaceMetrics {
            ascent: request.size * self.ascent_ratio,
            descent: request.size * self.descent_ratio,
        })
    }

    fn glyph(&self, request: &FontRequest, c: char) -> Option<Glyph> {
        let advance = if Self::is_zero_width(c) {
            0.0
        } else {
            request.size * self.advance_ratio
        };

        Some(Glyph {
            codepoint: c,
            xy0: point(0.0, 0.0),
            xy1: point(advance, request.size),
            advance,
            uv0: point(0.0, 0.0),
            uv1: point(1.0, 1.0),
            texture: TextureRef::None,
            visible: advance > 0.0 && !c.is_whitespace(),
        })
    }
}
