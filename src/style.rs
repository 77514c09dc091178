//! Style state folded from the token stream.
//!
//! A [`TextStyle`] is a flat value holding every visual attribute that a
//! record may change. Layout starts from an initial style and folds each
//! record into a running copy with [`TextStyle::update_from`]; revert records
//! restore the corresponding field from the initial style.

use crate::geometry::{Vector, vector};
use crate::record::{Payload, Record, RecordType};

/// Color packed as `0xAARRGGBB`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba32(pub u32);

impl Rgba32 {
    pub const TRANSPARENT: Self = Self(0);
    pub const BLACK: Self = Self(0xFF00_0000);
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Fully transparent colors are skipped when emitting primitives.
    pub const fn is_visible(self) -> bool {
        self.a() != 0
    }
}

/// Four-way value for boolean style axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BoolOrToggle {
    /// Keep the initial value.
    #[default]
    NoChange = 0,
    On = 1,
    Off = 2,
    /// Invert the initial value.
    Change = 3,
}

impl BoolOrToggle {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NoChange),
            1 => Some(Self::On),
            2 => Some(Self::Off),
            3 => Some(Self::Change),
            _ => None,
        }
    }

    /// Resolves a requested toggle against the current top of an axis stack.
    ///
    /// Only `Change` depends on the stack; it flips whatever the stack
    /// currently asserts so nested toggles alternate.
    pub fn resolve(top: Option<Self>, requested: Self) -> Self {
        match (requested, top) {
            (Self::Change, None) => Self::Change,
            (Self::Change, Some(Self::On)) => Self::Off,
            (Self::Change, Some(Self::Off)) => Self::On,
            (Self::Change, Some(Self::NoChange)) => Self::Change,
            (Self::Change, Some(Self::Change)) => Self::NoChange,
            (other, _) => other,
        }
    }

    /// Applies this value to the initial state of the axis.
    pub fn apply(self, initial: bool) -> bool {
        match self {
            Self::NoChange => initial,
            Self::On => true,
            Self::Off => false,
            Self::Change => !initial,
        }
    }
}

bitflags::bitflags! {
    /// Lines drawn along the glyph run.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TextDecoration: u8 {
        const UNDERLINE = 1;
        const OVERLINE = 2;
        const LINE_THROUGH = 4;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TextDecorationStyle {
    #[default]
    Solid = 0,
    Double = 1,
}

impl TextDecorationStyle {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Solid),
            1 => Some(Self::Double),
            _ => None,
        }
    }
}

/// Host-assigned identifier of a font face.
///
/// [`crate::FontSystem`] hands these out when faces are registered; other
/// providers are free to use any numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(pub u32);

/// Face variants that a `FontSet` record switches to.
///
/// Missing variants are synthesised from `regular`: bold by drawing twice
/// with a one pixel shift, italic by skewing the top of each glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontSet {
    /// `None` selects the provider's default face.
    pub regular: Option<FontId>,
    pub bold: Option<FontId>,
    pub italic: Option<FontId>,
    pub bold_italic: Option<FontId>,
}

impl FontSet {
    pub fn new(regular: FontId) -> Self {
        Self {
            regular: Some(regular),
            ..Self::default()
        }
    }

    /// Picks the face for the requested weight and slant.
    ///
    /// Returns the face and whether bold and italic still have to be
    /// synthesised.
    pub fn select(&self, bold: bool, italic: bool) -> (Option<FontId>, bool, bool) {
        match (bold, italic) {
            (true, true) => {
                if let Some(face) = self.bold_italic {
                    (Some(face), false, false)
                } else if let Some(face) = self.bold {
                    (Some(face), false, true)
                } else if let Some(face) = self.italic {
                    (Some(face), true, false)
                } else {
                    (self.regular, true, true)
                }
            }
            (true, false) => match self.bold {
                Some(face) => (Some(face), false, false),
                None => (self.regular, true, false),
            },
            (false, true) => match self.italic {
                Some(face) => (Some(face), false, false),
                None => (self.regular, false, true),
            },
            (false, false) => (self.regular, false, false),
        }
    }
}

/// Every visual attribute that records can change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font_set: FontSet,
    /// Pixels. `0` uses the provider default; negative values multiply it.
    pub font_size: f32,
    /// Multiplier of the font's natural line box; `<= 0` means `1`.
    pub line_height: f32,
    /// Horizontal shift, in multiples of the font size.
    pub horizontal_offset: f32,
    /// `0` left, `0.5` center, `1` right. A line uses the value in effect where
    /// it starts.
    pub horizontal_alignment: f32,
    /// Vertical shift, in multiples of the line height.
    pub vertical_offset: f32,
    /// Position inside the line box in `[0, 1]`; negative aligns baselines.
    pub vertical_alignment: f32,
    pub italic: bool,
    pub bold: bool,
    pub text_decoration: TextDecoration,
    pub text_decoration_style: TextDecorationStyle,
    pub back_color: Rgba32,
    pub shadow_color: Rgba32,
    pub edge_color: Rgba32,
    pub text_decoration_color: Rgba32,
    pub fore_color: Rgba32,
    /// Border radius in whole pixels; below `1` disables the border.
    pub edge_width: f32,
    /// Zero disables the shadow.
    pub shadow_offset: Vector,
    /// Multiple of the font size.
    pub text_decoration_thickness: f32,
    /// Index of the link record currently in effect.
    pub link: Option<usize>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_set: FontSet::default(),
            font_size: 0.0,
            line_height: 1.0,
            horizontal_offset: 0.0,
            horizontal_alignment: 0.0,
            vertical_offset: 0.0,
            vertical_alignment: -1.0,
            italic: false,
            bold: false,
            text_decoration: TextDecoration::empty(),
            text_decoration_style: TextDecorationStyle::Solid,
            back_color: Rgba32::TRANSPARENT,
            shadow_color: Rgba32::TRANSPARENT,
            edge_color: Rgba32::TRANSPARENT,
            text_decoration_color: Rgba32::WHITE,
            fore_color: Rgba32::WHITE,
            edge_width: 0.0,
            shadow_offset: vector(0.0, 0.0),
            text_decoration_thickness: 1.0 / 16.0,
            link: None,
        }
    }
}

/// Which derived state has to be recomputed after folding a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StyleUpdate {
    /// Font metrics or line placement changed.
    pub font: bool,
    /// Only colors or decorations changed.
    pub draw: bool,
}

impl StyleUpdate {
    const FONT: Self = Self {
        font: true,
        draw: false,
    };
    const DRAW: Self = Self {
        font: false,
        draw: true,
    };
    const NONE: Self = Self {
        font: false,
        draw: false,
    };
}

impl TextStyle {
    /// Folds one record into this style.
    ///
    /// A record whose payload fails to decode leaves the style untouched. An
    /// out-of-range font set index falls back to the initial font set.
    pub fn update_from(
        &mut self,
        record: &Record,
        record_index: usize,
        data: &[u8],
        initial: &TextStyle,
        font_sets: &[FontSet],
    ) -> StyleUpdate {
        if record.is_revert {
            return self.revert(record.ty, initial);
        }

        let Some(payload) = Payload::decode(record.ty, data) else {
            return StyleUpdate::NONE;
        };

        match payload {
            Payload::Link(link) => {
                self.link = if link.is_empty() {
                    None
                } else {
                    Some(record_index)
                };
                StyleUpdate::NONE
            }
            Payload::FontSet(index) => {
                self.font_set = font_sets
                    .get(index as usize)
                    .copied()
                    .unwrap_or(initial.font_set);
                StyleUpdate::FONT
            }
            Payload::FontSize(v) => {
                self.font_size = v;
                StyleUpdate::FONT
            }
            Payload::LineHeight(v) => {
                self.line_height = v;
                StyleUpdate::FONT
            }
            Payload::HorizontalOffset(v) => {
                self.horizontal_offset = v;
                StyleUpdate::FONT
            }
            Payload::HorizontalAlignment(v) => {
                self.horizontal_alignment = v;
                StyleUpdate::FONT
            }
            Payload::VerticalOffset(v) => {
                self.vertical_offset = v;
                StyleUpdate::FONT
            }
            Payload::VerticalAlignment(v) => {
                self.vertical_alignment = v;
                StyleUpdate::FONT
            }
            Payload::Italic(v) => {
                self.italic = v.apply(initial.italic);
                StyleUpdate::FONT
            }
            Payload::Bold(v) => {
                self.bold = v.apply(initial.bold);
                StyleUpdate::FONT
            }
            Payload::TextDecoration(v) => {
                self.text_decoration = v;
                StyleUpdate::DRAW
            }
            Payload::TextDecorationStyle(v) => {
                self.text_decoration_style = v;
                StyleUpdate::DRAW
            }
            Payload::BackColor(v) => {
                self.back_color = v;
                StyleUpdate::DRAW
            }
            Payload::ShadowColor(v) => {
                self.shadow_color = v;
                StyleUpdate::DRAW
            }
            Payload::EdgeColor(v) => {
                self.edge_color = v;
                StyleUpdate::DRAW
            }
            Payload::TextDecorationColor(v) => {
                self.text_decoration_color = v;
                StyleUpdate::DRAW
            }
            Payload::ForeColor(v) => {
                self.fore_color = v;
                StyleUpdate::DRAW
            }
            Payload::EdgeWidth(v) => {
                self.edge_width = v;
                StyleUpdate::DRAW
            }
            Payload::ShadowOffset(v) => {
                self.shadow_offset = v;
                StyleUpdate::DRAW
            }
            Payload::TextDecorationThickness(v) => {
                self.text_decoration_thickness = v;
                StyleUpdate::FONT
            }
            Payload::ObjectIcon(_)
            | Payload::ObjectTexture { .. }
            | Payload::ObjectSpannable(_)
            | Payload::ObjectNewLine => StyleUpdate::NONE,
        }
    }

    fn revert(&mut self, ty: RecordType, initial: &TextStyle) -> StyleUpdate {
        match ty {
            RecordType::Link => {
                self.link = None;
                StyleUpdate::NONE
            }
            RecordType::FontSet => {
                self.font_set = initial.font_set;
                StyleUpdate::FONT
            }
            RecordType::FontSize => {
                self.font_size = initial.font_size;
                StyleUpdate::FONT
            }
            RecordType::LineHeight => {
                self.line_height = initial.line_height;
                StyleUpdate::FONT
            }
            RecordType::HorizontalOffset => {
                self.horizontal_offset = initial.horizontal_offset;
                StyleUpdate::FONT
            }
            RecordType::HorizontalAlignment => {
                self.horizontal_alignment = initial.horizontal_alignment;
                StyleUpdate::FONT
            }
            RecordType::VerticalOffset => {
                self.vertical_offset = initial.vertical_offset;
                StyleUpdate::FONT
            }
            RecordType::VerticalAlignment => {
                self.vertical_alignment = initial.vertical_alignment;
                StyleUpdate::FONT
            }
            RecordType::Italic => {
                self.italic = initial.italic;
                StyleUpdate::FONT
            }
            RecordType::Bold => {
                self.bold = initial.bold;
                StyleUpdate::FONT
            }
            RecordType::TextDecoration => {
                self.text_decoration = initial.text_decoration;
                StyleUpdate::DRAW
            }
            RecordType::TextDecorationStyle => {
                self.text_decoration_style = initial.text_decoration_style;
                StyleUpdate::DRAW
            }
            RecordType::BackColor => {
                self.back_color = initial.back_color;
                StyleUpdate::DRAW
            }
            RecordType::ShadowColor => {
                self.shadow_color = initial.shadow_color;
                StyleUpdate::DRAW
            }
            RecordType::EdgeColor => {
                self.edge_color = initial.edge_color;
                StyleUpdate::DRAW
            }
            RecordType::TextDecorationColor => {
                self.text_decoration_color = initial.text_decoration_color;
                StyleUpdate::DRAW
            }
            RecordType::ForeColor => {
                self.fore_color = initial.fore_color;
                StyleUpdate::DRAW
            }
            RecordType::EdgeWidth => {
                self.edge_width = initial.edge_width;
                StyleUpdate::DRAW
            }
            RecordType::ShadowOffset => {
                self.shadow_offset = initial.shadow_offset;
                StyleUpdate::DRAW
            }
            RecordType::TextDecorationThickness => {
                self.text_decoration_thickness = initial.text_decoration_thickness;
                StyleUpdate::FONT
            }
            RecordType::None
            | RecordType::ObjectIcon
            | RecordType::ObjectTexture
            | RecordType::ObjectSpannable
            | RecordType::ObjectNewLine => StyleUpdate::NONE,
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(ty: RecordType, payload: &Payload<'_>, buf: &mut Vec<u8>) -> Record {
        let start = buf.len();
        let len = payload.encode(buf);
        Record::new(0, start as u32, len as u32, ty, false)
    }

    #[test]
    fn test_toggle_resolution() {
        use BoolOrToggle::*;
        assert_eq!(BoolOrToggle::resolve(None, Change), Change);
        assert_eq!(BoolOrToggle::resolve(Some(On), Change), Off);
        assert_eq!(BoolOrToggle::resolve(Some(Off), Change), On);
        assert_eq!(BoolOrToggle::resolve(Some(NoChange), Change), Change);
        assert_eq!(BoolOrToggle::resolve(Some(Change), Change), NoChange);
        assert_eq!(BoolOrToggle::resolve(Some(Change), On), On);
        assert_eq!(BoolOrToggle::resolve(None, NoChange), NoChange);
    }

    #[test]
    fn test_toggle_apply() {
        assert!(BoolOrToggle::On.apply(false));
        assert!(!BoolOrToggle::Off.apply(true));
        assert!(BoolOrToggle::NoChange.apply(true));
        assert!(BoolOrToggle::Change.apply(false));
        assert!(!BoolOrToggle::Change.apply(true));
    }

    #[test]
    fn test_update_and_revert_round_trip() {
        let initial = TextStyle::default();
        let mut style = initial;
        let mut data = Vec::new();

        let rec = record_with(RecordType::FontSize, &Payload::FontSize(24.0), &mut data);
        let update = style.update_from(
            &rec,
            0,
            &data[rec.data_range()],
            &initial,
            &[],
        );
        assert!(update.font);
        assert_eq!(style.font_size, 24.0);

        let revert = Record::new(0, 0, 0, RecordType::FontSize, true);
        style.update_from(&revert, 1, &[], &initial, &[]);
        assert_eq!(style, initial);
    }

    #[test]
    fn test_colors_are_draw_updates() {
        let initial = TextStyle::default();
        let mut style = initial;
        let mut data = Vec::new();
        let color = Rgba32::from_rgba(1, 2, 3, 255);
        let rec = record_with(RecordType::ForeColor, &Payload::ForeColor(color), &mut data);
        let update = style.update_from(&rec, 0, &data, &initial, &[]);
        assert_eq!(update, StyleUpdate::DRAW);
        assert_eq!(style.fore_color, color);
        assert_eq!(color.r(), 1);
        assert_eq!(color.g(), 2);
        assert_eq!(color.b(), 3);
    }

    #[test]
    fn test_font_set_out_of_range_uses_initial() {
        let initial = TextStyle {
            font_set: FontSet::new(FontId(7)),
            ..TextStyle::default()
        };
        let mut style = initial;
        let mut data = Vec::new();
        let rec = record_with(RecordType::FontSet, &Payload::FontSet(5), &mut data);
        style.update_from(&rec, 0, &data, &initial, &[FontSet::new(FontId(1))]);
        assert_eq!(style.font_set.regular, Some(FontId(7)));

        let mut data = Vec::new();
        let rec = record_with(RecordType::FontSet, &Payload::FontSet(0), &mut data);
        style.update_from(&rec, 0, &data, &initial, &[FontSet::new(FontId(1))]);
        assert_eq!(style.font_set.regular, Some(FontId(1)));
    }

    #[test]
    fn test_undecodable_payload_is_ignored() {
        let initial = TextStyle::default();
        let mut style = initial;
        let rec = Record::new(0, 0, 1, RecordType::FontSize, false);
        let update = style.update_from(&rec, 0, &[0xFF], &initial, &[]);
        assert_eq!(update, StyleUpdate::default());
        assert_eq!(style, initial);
    }

    #[test]
    fn test_link_tracks_record_index() {
        let initial = TextStyle::default();
        let mut style = initial;
        let mut data = Vec::new();
        let rec = record_with(RecordType::Link, &Payload::Link(b"https://a"), &mut data);
        style.update_from(&rec, 4, &data, &initial, &[]);
        assert_eq!(style.link, Some(4));

        let mut data = Vec::new();
        let rec = record_with(RecordType::Link, &Payload::Link(b""), &mut data);
        style.update_from(&rec, 5, &data, &initial, &[]);
        assert_eq!(style.link, None);
    }

    #[test]
    fn test_font_set_selection_synthesises_missing_variants() {
        let set = FontSet {
            regular: Some(FontId(1)),
            bold: Some(FontId(2)),
            italic: None,
            bold_italic: None,
        };
        assert_eq!(set.select(true, false), (Some(FontId(2)), false, false));
        assert_eq!(set.select(false, true), (Some(FontId(1)), false, true));
        assert_eq!(set.select(true, true), (Some(FontId(2)), false, true));
    }
}
