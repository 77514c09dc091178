use crate::font::{FontInfo, Glyph, RenderContext};
use crate::text::data::CompositeOffset;

/// What the pen passed last, used for kerning and soft hyphen detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LastThing {
    #[default]
    None,
    Codepoint(char),
    /// Index of a record.
    Record(usize),
}

/// One line produced by measurement.
///
/// Horizontal extents are rounded to whole pixels. The vertical box is
/// relative to the baseline, so its first value is the negated ascent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasuredLine {
    /// Where the line starts.
    pub first_offset: CompositeOffset,
    /// Where the line ends; the next line starts here.
    pub offset: CompositeOffset,
    /// Units at or past this offset are consumed but not drawn.
    pub omit_offset: CompositeOffset,
    /// Pen position relative to the line start.
    pub x: f32,
    pub bbox_horizontal: [f32; 2],
    pub bbox_vertical: [f32; 2],
    pub last_thing: LastThing,
    /// The line ended because it ran out of width.
    pub is_wrapped: bool,
    /// The line ended at a line terminator.
    pub has_new_line_at_end: bool,
}

impl MeasuredLine {
    /// A line with no content that starts at `first_offset`.
    pub fn empty(first_offset: CompositeOffset) -> Self {
        Self {
            first_offset,
            offset: CompositeOffset::INVALID,
            omit_offset: CompositeOffset::INVALID,
            x: 0.0,
            bbox_horizontal: [f32::MAX, f32::MIN],
            bbox_vertical: [f32::MAX, f32::MIN],
            last_thing: LastThing::None,
            is_wrapped: false,
            has_new_line_at_end: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.offset.is_valid()
    }

    pub fn width(&self) -> f32 {
        let [left, right] = self.bbox_horizontal;
        if left <= right { right - left } else { 0.0 }
    }

    pub fn height(&self) -> f32 {
        let [top, bottom] = self.bbox_vertical;
        if top <= bottom { bottom - top } else { 0.0 }
    }

    pub(crate) fn union_bbox_horizontal(&mut self, left: f32, right: f32) {
        self.bbox_horizontal[0] = self.bbox_horizontal[0].min(left.round());
        self.bbox_horizontal[1] = self.bbox_horizontal[1].max(right.round());
    }

    pub(crate) fn union_bbox_vertical(&mut self, [top, bottom]: [f32; 2]) {
        self.bbox_vertical[0] = self.bbox_vertical[0].min(top.round());
        self.bbox_vertical[1] = self.bbox_vertical[1].max(bottom.round());
    }

    pub(crate) fn contained_in_bounds(&self, width: f32) -> bool {
        self.bbox_horizontal[1].round() <= width
    }

    /// Whether an object `object_width` wide still fits after the pen.
    pub(crate) fn contained_in_bounds_with_object(
        &self,
        object_width: f32,
        width: f32,
        horizontal_offset: f32,
    ) -> bool {
        let right = self.bbox_horizontal[1].max(self.x + object_width + horizontal_offset);
        right.round() <= width
    }

    pub(crate) fn set_offset(&mut self, offset: CompositeOffset) {
        self.offset = offset;
    }

    /// Advances the pen by a label drawn in front of the next unit.
    pub(crate) fn add_padding(&mut self, pad: f32) {
        if pad != 0.0 {
            self.last_thing = LastThing::None;
            self.x += pad.round();
            self.union_bbox_horizontal(self.x, self.x);
        }
    }

    pub(crate) fn add_object(
        &mut self,
        record_index: usize,
        left: f32,
        right: f32,
        font: &FontInfo,
    ) {
        let xoff = self.x + font.horizontal_offset;
        self.union_bbox_horizontal(xoff + left, xoff + right);
        self.x += right.round();
        self.last_thing = LastThing::Record(record_index);
    }

    fn add_glyph(&mut self, font: &FontInfo, glyph: &Glyph, advance: f32) {
        let xoff = self.x + font.horizontal_offset;
        self.union_bbox_horizontal(
            xoff + glyph.xy0.x,
            xoff + glyph.xy1.x + font.top_skew(glyph.xy0.y) + font.bold_extra,
        );
        self.union_bbox_vertical(font.bbox_vertical);
        self.x += advance.round();
    }

    /// Adds `c` with kerning against the previous codepoint.
    pub(crate) fn add_standard_character(
        &mut self,
        ctx: RenderContext<'_>,
        font: &FontInfo,
        c: char,
    ) {
        if let LastThing::Codepoint(last) = self.last_thing {
            self.x += font.kerning(ctx, last, c);
        }
        let glyph = font.glyph(ctx, c);
        self.add_glyph(font, &glyph, glyph.advance);
        self.last_thing = LastThing::Codepoint(c);
    }

    /// Snaps the pen to the next tab stop.
    pub(crate) fn add_tab_character(&mut self, font: &FontInfo) {
        let tab = font.tab_width;
        self.x = ((self.x + tab) / tab).floor() * tab;
        self.union_bbox_horizontal(self.x, self.x);
        self.union_bbox_vertical(font.bbox_vertical);
        self.last_thing = LastThing::Codepoint('\t');
    }

    /// Reserves room for the hyphen drawn if the line breaks here.
    pub(crate) fn add_soft_hyphen_character(&mut self, ctx: RenderContext<'_>, font: &FontInfo) {
        let glyph = font.glyph(ctx, '-');
        self.add_glyph(font, &glyph, 0.0);
        self.last_thing = LastThing::Codepoint('\u{AD}');
    }
}
