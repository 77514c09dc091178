use crate::font::{FontInfo, RenderContext};
use crate::geometry::{RectExt, Size};
use crate::record::{Payload, Record, RecordType};
use crate::spannable::{Child, Children};
use crate::style::TextStyle;
use crate::text::builder::NewLineType;
use crate::text::char_renderer::{resolve_icon, resolve_texture};
use crate::text::control_chars;
use crate::text::data::{CompositeOffset, DataView};
use crate::text::layout::{Options, WordBreak};
use crate::text::measured_line::{LastThing, MeasuredLine};

/// Whitespace and the CJK/Hangul blocks where a line may break between
/// any two characters.
pub(crate) fn is_breakable(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{0B}'
            | '\u{0C}'
            | '\r'
            | ' '
            | '\u{85}'
            | '\u{1680}'
            | '\u{2000}'..='\u{2006}'
            | '\u{2008}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200D}'
            // Hangul Jamo
            | '\u{1100}'..='\u{11FF}'
            // Hangul Syllables
            | '\u{AC00}'..='\u{D7AF}'
            // Hangul Compatibility Jamo
            | '\u{3130}'..='\u{318F}'
            // Hangul Jamo Extended-A and -B
            | '\u{A960}'..='\u{A97F}'
            | '\u{D7B0}'..='\u{D7FF}'
            // CJK Compatibility, Compatibility Forms, Compatibility Ideographs
            | '\u{3300}'..='\u{33FF}'
            | '\u{FE30}'..='\u{FE4F}'
            | '\u{F900}'..='\u{FAFF}'
            // CJK Radicals Supplement, Symbols and Punctuation, Strokes
            | '\u{2E80}'..='\u{2EFF}'
            | '\u{3000}'..='\u{303F}'
            | '\u{31C0}'..='\u{31EF}'
            // CJK Unified Ideographs and Extension A
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            // Hiragana, Katakana, Katakana Phonetic Extensions
            | '\u{3040}'..='\u{309F}'
            | '\u{30A0}'..='\u{30FF}'
            | '\u{31F0}'..='\u{31FF}'
    )
}

/// Unit of measurement.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Unit {
    Char(char),
    /// A line terminator that is not accepted; takes no room.
    Opaque(char),
    Object {
        record_index: usize,
        left: f32,
        right: f32,
        height: f32,
    },
}

/// Decides where one line ends.
///
/// Units are fed in order. The breaker keeps the line state after the last
/// unit (`prev`) together with a few candidate states a wrap may fall back
/// to, and returns the finished line once a unit no longer fits.
pub(crate) struct WordBreaker<'a> {
    ctx: RenderContext<'a>,
    data: &'a DataView,
    options: &'a Options,
    control_font: Option<&'a FontInfo>,
    max_size: Size,
    wrap_marker_width: Option<f32>,

    style: TextStyle,
    font: FontInfo,

    prev: MeasuredLine,
    first: Option<MeasuredLine>,
    normal_break: Option<MeasuredLine>,
    wrap_marker_break: Option<MeasuredLine>,
    break_on_first_normal_breakable: bool,
}

impl<'a> WordBreaker<'a> {
    pub fn new(
        ctx: RenderContext<'a>,
        data: &'a DataView,
        options: &'a Options,
        control_font: Option<&'a FontInfo>,
        wrap_marker_width: Option<f32>,
        style: TextStyle,
        font: FontInfo,
        start: CompositeOffset,
    ) -> Self {
        Self {
            ctx,
            data,
            options,
            control_font,
            max_size: options.max_size,
            wrap_marker_width,
            style,
            font,
            prev: MeasuredLine::empty(start),
            first: None,
            normal_break: None,
            wrap_marker_break: None,
            break_on_first_normal_breakable: false,
        }
    }

    pub fn font(&self) -> &FontInfo {
        &self.font
    }

    fn control_pad(&self, c: char) -> f32 {
        match (self.control_font, control_chars::short_name(c)) {
            (Some(font), Some(name)) => font.text_width(self.ctx, name),
            _ => 0.0,
        }
    }

    /// Feeds one unit. Returns the finished line when the unit forces a wrap.
    pub fn add_codepoint_and_measure(
        &mut self,
        unit: Unit,
        after: CompositeOffset,
    ) -> Option<MeasuredLine> {
        let mut current = self.prev;
        let width = self.max_size.width;
        let marker_width = self.wrap_marker_width.unwrap_or(0.0);

        let (mut breakable, last) = match unit {
            Unit::Object {
                record_index,
                left,
                right,
                height,
            } => {
                current.add_object(record_index, left, right, &self.font);
                current.set_offset(after);
                let mut bbox = self.font.bbox_vertical;
                if self.font.line_height > 0.0 && self.font.line_height < height {
                    let scale = height / self.font.line_height;
                    bbox = [bbox[0] * scale, bbox[1] * scale];
                }
                current.union_bbox_vertical(bbox);
                (false, LastThing::Record(record_index))
            }
            Unit::Char('\t') if self.font.tab_width > 0.0 => {
                current.add_padding(self.control_pad('\t'));
                current.set_offset(after);
                current.add_tab_character(&self.font);
                (true, LastThing::Codepoint('\t'))
            }
            Unit::Char('\u{AD}') => {
                current.add_padding(self.control_pad('\u{AD}'));
                current.add_soft_hyphen_character(self.ctx, &self.font);
                current.set_offset(after);
                if current.contained_in_bounds_with_object(
                    marker_width,
                    width,
                    self.font.horizontal_offset,
                ) {
                    self.wrap_marker_break = Some(current);
                    self.normal_break = Some(current);
                }
                (false, LastThing::Codepoint('\u{AD}'))
            }
            Unit::Char(c) => {
                current.add_padding(self.control_pad(c));
                current.add_standard_character(self.ctx, &self.font, c);
                current.set_offset(after);
                (is_breakable(c), LastThing::Codepoint(c))
            }
            Unit::Opaque(c) => {
                current.add_padding(self.control_pad(c));
                current.set_offset(after);
                current.last_thing = LastThing::Codepoint(c);
                (false, LastThing::Codepoint(c))
            }
        };

        if self.break_on_first_normal_breakable && breakable {
            let mut line = self.prev;
            line.last_thing = last;
            line.set_offset(after);
            line.is_wrapped = true;
            return Some(line);
        }

        current.union_bbox_vertical(self.font.bbox_vertical);
        if self.first.is_none() {
            self.first = Some(current);
        }

        if current.contained_in_bounds(width) {
            if self.wrap_marker_width.is_some() {
                if current.contained_in_bounds_with_object(
                    marker_width,
                    width,
                    self.font.horizontal_offset,
                ) {
                    self.wrap_marker_break = Some(current);
                } else {
                    breakable = false;
                }
            }
        } else {
            let has_marker = self.wrap_marker_width.is_some();
            let prev = (!self.prev.is_empty()).then_some(self.prev);
            let resolved = match self.options.word_break {
                WordBreak::Normal => {
                    self.break_on_first_normal_breakable = true;
                    self.normal_break
                }
                WordBreak::BreakAll if has_marker => self.wrap_marker_break.or(self.first),
                WordBreak::BreakAll => prev.or(self.first),
                WordBreak::BreakWord if has_marker => self
                    .normal_break
                    .or(self.wrap_marker_break)
                    .or(self.first),
                WordBreak::BreakWord => self.normal_break.or(prev).or(self.first),
                WordBreak::KeepAll => None,
            };

            if let Some(mut line) = resolved {
                line.is_wrapped = true;
                return Some(line);
            }
        }

        self.prev = current;
        if breakable {
            self.normal_break = Some(current);
        }
        None
    }

    /// Folds a record into the style. Objects are measured as single units and
    /// an accepted `ObjectNewLine` ends the line.
    pub fn handle_span(
        &mut self,
        record_index: usize,
        record: &Record,
        bytes: &[u8],
        after: CompositeOffset,
        children: &mut Children,
        pen_y: f32,
    ) -> Option<MeasuredLine> {
        let update = self.style.update_from(
            record,
            record_index,
            bytes,
            &self.options.style,
            self.data.font_sets(),
        );
        if update.font {
            self.font = FontInfo::resolve(self.ctx, &self.style, self.options.tab_width);
        }

        if record.is_revert {
            self.prev.last_thing = LastThing::Record(record_index);
            return None;
        }

        match record.ty {
            RecordType::ObjectIcon | RecordType::ObjectTexture | RecordType::ObjectSpannable => {
                let (left, right, height) = self
                    .measure_object(record_index, record.ty, bytes, children, pen_y)
                    .unwrap_or((0.0, 0.0, 0.0));
                self.add_codepoint_and_measure(
                    Unit::Object {
                        record_index,
                        left,
                        right,
                        height,
                    },
                    after,
                )
            }
            RecordType::ObjectNewLine
                if self.options.accepted_new_lines.contains(NewLineType::MANUAL) =>
            {
                let mut line = self.prev;
                line.last_thing = LastThing::Record(record_index);
                line.set_offset(after);
                line.union_bbox_vertical(self.font.bbox_vertical);
                line.has_new_line_at_end = true;
                Some(line)
            }
            _ => {
                self.prev.last_thing = LastThing::Record(record_index);
                None
            }
        }
    }

    /// Horizontal extent and height of an inline object.
    fn measure_object(
        &self,
        record_index: usize,
        ty: RecordType,
        bytes: &[u8],
        children: &mut Children,
        pen_y: f32,
    ) -> Option<(f32, f32, f32)> {
        let size = self.font.size;
        match Payload::decode(ty, bytes)? {
            Payload::ObjectIcon(id) => {
                let image = resolve_icon(self.ctx, size, id)?;
                Some((0.0, image.width, size))
            }
            Payload::ObjectTexture { index, uv0, uv1 } => {
                let image = resolve_texture(self.ctx, self.data, size, index, uv0, uv1)?;
                Some((0.0, image.width, size))
            }
            Payload::ObjectSpannable(index) => {
                let spannable = self.data.spannable_at(index as usize)?;
                let child = children
                    .entry(record_index)
                    .or_insert_with(|| Child::rent(spannable));
                // room left on the line
                let max_width = if self.max_size.width.is_finite() {
                    (self.max_size.width - self.prev.x).max(0.0)
                } else {
                    f32::INFINITY
                };
                let max_height = (self.max_size.height - pen_y).min(size);
                let boundary = child.measure(self.ctx, Size::new(max_width, max_height));
                if !boundary.is_valid() {
                    log::warn!("Inline object {record_index} measured to an invalid boundary.");
                    return None;
                }
                Some((boundary.min.x, boundary.max.x, boundary.valid_height()))
            }
            _ => None,
        }
    }

    /// The line so far, ended by `terminator` (`"\r"`, `"\n"` or `"\r\n"`).
    pub fn finish_with_new_line(&self, terminator: &str, after: CompositeOffset) -> MeasuredLine {
        let mut line = self.prev;
        for c in terminator.chars() {
            line.add_padding(self.control_pad(c));
            line.last_thing = LastThing::Codepoint(c);
        }
        line.set_offset(after);
        line.union_bbox_vertical(self.font.bbox_vertical);
        line.has_new_line_at_end = true;
        line
    }

    /// The line so far, ended by the end of the stream.
    pub fn last(&self, end: CompositeOffset) -> MeasuredLine {
        let mut line = self.prev;
        line.set_offset(end);
        line
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::monospace::MonospaceFont;

    struct Fixture {
        font: MonospaceFont,
        data: DataView,
        options: Options,
    }

    impl Fixture {
        fn new(text: &str, width: f32, word_break: WordBreak) -> Self {
            let mut builder = crate::text::builder::TextBuilder::new();
            builder.append_str(text);
            Self {
                font: MonospaceFont::new(10.0),
                data: builder.compile(),
                options: Options {
                    word_break,
                    max_size: Size::new(width, f32::INFINITY),
                    ..Options::default()
                },
            }
        }

        /// Feeds the whole text and returns the first line that ends.
        fn first_line(&self, wrap_marker_width: Option<f32>) -> Option<MeasuredLine> {
            let ctx = RenderContext::new(&self.font);
            let style = self.options.style;
            let font = FontInfo::resolve(ctx, &style, self.options.tab_width);
            let mut breaker = WordBreaker::new(
                ctx,
                &self.data,
                &self.options,
                None,
                wrap_marker_width,
                style,
                font,
                CompositeOffset::default(),
            );

            let text = std::str::from_utf8(self.data.text()).unwrap();
            for (i, c) in text.char_indices() {
                let after = CompositeOffset::new(i + c.len_utf8(), 0);
                if let Some(line) = breaker.add_codepoint_and_measure(Unit::Char(c), after) {
                    return Some(line);
                }
            }
            None
        }
    }

    #[test]
    fn test_breakable_set() {
        for c in [' ', '\t', '\u{3000}', '가', '漢', 'あ', 'カ', '\u{200B}'] {
            assert!(is_breakable(c), "{c:?}");
        }
        for c in ['a', '-', '\u{A0}', '\u{2007}', 'é'] {
            assert!(!is_breakable(c), "{c:?}");
        }
    }

    #[test]
    fn test_normal_breaks_after_trailing_space() {
        let f = Fixture::new("Hello world", 45.0, WordBreak::Normal);
        let line = f.first_line(None).unwrap();
        assert!(line.is_wrapped);
        assert_eq!(line.offset, CompositeOffset::new(6, 0));
        // the overflowing word stays on the line
        assert_eq!(line.bbox_horizontal[1], 50.0);
    }

    #[test]
    fn test_normal_snaps_to_earlier_space() {
        let f = Fixture::new("ab cdef", 45.0, WordBreak::Normal);
        let line = f.first_line(None).unwrap();
        assert_eq!(line.offset, CompositeOffset::new(3, 0));
        assert!(line.width() <= 45.0);
    }

    #[test]
    fn test_break_all_splits_words() {
        let f = Fixture::new("Hello world", 45.0, WordBreak::BreakAll);
        let line = f.first_line(None).unwrap();
        assert_eq!(line.offset, CompositeOffset::new(4, 0));
        assert_eq!(line.width(), 40.0);
    }

    #[test]
    fn test_break_word_prefers_word_boundary() {
        let f = Fixture::new("ab cdef", 45.0, WordBreak::BreakWord);
        assert_eq!(
            f.first_line(None).unwrap().offset,
            CompositeOffset::new(3, 0)
        );

        let f = Fixture::new("abcdefg", 45.0, WordBreak::BreakWord);
        assert_eq!(
            f.first_line(None).unwrap().offset,
            CompositeOffset::new(4, 0)
        );
    }

    #[test]
    fn test_keep_all_never_breaks() {
        let f = Fixture::new("Hello world", 45.0, WordBreak::KeepAll);
        assert!(f.first_line(None).is_none());
    }

    #[test]
    fn test_wrap_marker_reserves_room() {
        let f = Fixture::new("abcdefg", 45.0, WordBreak::BreakAll);
        let line = f.first_line(Some(10.0)).unwrap();
        // "abc" plus a 10px marker is the widest prefix that fits
        assert_eq!(line.offset, CompositeOffset::new(3, 0));
    }

    #[test]
    fn test_single_oversized_unit_still_progresses() {
        let f = Fixture::new("ab", 5.0, WordBreak::BreakAll);
        let line = f.first_line(None).unwrap();
        assert_eq!(line.offset, CompositeOffset::new(1, 0));
    }

    #[test]
    fn test_soft_hyphen_is_a_break_candidate() {
        let f = Fixture::new("ab\u{AD}cdef", 45.0, WordBreak::BreakWord);
        let line = f.first_line(None).unwrap();
        assert_eq!(line.offset, CompositeOffset::new(4, 0));
        assert_eq!(line.last_thing, LastThing::Codepoint('\u{AD}'));
    }
}
