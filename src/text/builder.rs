//! Incremental construction of a token stream.

use std::sync::Arc;

use crate::geometry::{Point, Vector};
use crate::pool::Reset;
use crate::record::{Payload, Record, RecordType};
use crate::spannable::Spannable;
use crate::style::{BoolOrToggle, FontSet, Rgba32, TextDecoration, TextDecorationStyle};
use crate::text::data::DataView;

bitflags::bitflags! {
    /// Line terminators, used both to append a line and to choose which
    /// terminators end a line during layout.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NewLineType: u8 {
        /// An `ObjectNewLine` record.
        const MANUAL = 1;
        const CR = 2;
        const LF = 4;
        const CR_LF = 8;
        const ALL = Self::MANUAL.bits() | Self::CR.bits() | Self::LF.bits() | Self::CR_LF.bits();
    }
}

impl Default for NewLineType {
    fn default() -> Self {
        Self::ALL
    }
}

/// Builds a token stream from text and nested style changes.
///
/// Every style axis keeps its own stack. Pushing writes a record at the
/// current end of the text; popping re-asserts whatever is left on the stack,
/// or writes a revert record once the stack is empty. Nesting different axes
/// in any order is therefore safe.
///
/// ```
/// use kasane::text::builder::TextBuilder;
/// use kasane::style::Rgba32;
///
/// let mut builder = TextBuilder::new();
/// builder
///     .append_str("plain ")
///     .push_fore_color(Rgba32::from_rgba(255, 0, 0, 255))
///     .append_str("red")
///     .pop_fore_color();
/// let data = builder.compile();
/// assert_eq!(data.text(), b"plain red");
/// assert_eq!(data.records().len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct TextBuilder {
    text: Vec<u8>,
    data: Vec<u8>,
    records: Vec<Record>,

    font_sets: Vec<FontSet>,
    textures: Vec<u64>,
    spannables: Vec<Arc<dyn Spannable>>,

    /// Record indices of pushed values, one stack per record type.
    stacks: Vec<Vec<usize>>,
    italic: Vec<BoolOrToggle>,
    bold: Vec<BoolOrToggle>,
}

impl Default for TextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! value_axis {
    ($(#[$doc:meta])* $push:ident, $pop:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $push(&mut self, value: $ty) -> &mut Self {
            self.push_value(Payload::$variant(value))
        }

        pub fn $pop(&mut self) -> &mut Self {
            self.pop_value(RecordType::$variant)
        }
    };
}

impl TextBuilder {
    pub fn new() -> Self {
        Self {
            text: Vec::new(),
            data: Vec::new(),
            records: Vec::new(),
            font_sets: Vec::new(),
            textures: Vec::new(),
            spannables: Vec::new(),
            stacks: vec![Vec::new(); RecordType::COUNT],
            italic: Vec::new(),
            bold: Vec::new(),
        }
    }

    /// Snapshot of everything written so far. The builder stays usable.
    pub fn compile(&self) -> DataView {
        DataView::new(
            self.text.clone(),
            self.data.clone(),
            self.records.clone(),
            self.font_sets.clone(),
            self.textures.clone(),
            self.spannables.clone(),
        )
    }

    /// Discards text, records and open stacks but keeps the side tables, so
    /// previously returned indices stay valid.
    pub fn clear(&mut self) {
        self.text.clear();
        self.data.clear();
        self.records.clear();
        self.stacks.iter_mut().for_each(Vec::clear);
        self.italic.clear();
        self.bold.clear();
    }

    /// Byte length of the text written so far.
    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    fn write_record(&mut self, payload: Payload<'_>) -> usize {
        let data_start = self.data.len();
        let data_len = payload.encode(&mut self.data);
        self.records.push(Record::new(
            self.text.len() as u32,
            data_start as u32,
            data_len as u32,
            payload.record_type(),
            false,
        ));
        self.records.len() - 1
    }

    fn write_revert(&mut self, ty: RecordType) {
        self.records
            .push(Record::new(self.text.len() as u32, 0, 0, ty, true));
    }

    fn push_value(&mut self, payload: Payload<'_>) -> &mut Self {
        let ty = payload.record_type();
        let index = self.write_record(payload);
        self.stacks[ty as usize].push(index);
        self
    }

    fn pop_value(&mut self, ty: RecordType) -> &mut Self {
        let stack = &mut self.stacks[ty as usize];
        stack.pop();
        let top = stack.last().copied();
        match top {
            Some(top) => {
                // same payload bytes, new position
                let source = self.records[top];
                self.records.push(Record::new(
                    self.text.len() as u32,
                    source.data_start,
                    source.data_len,
                    ty,
                    false,
                ));
            }
            None => self.write_revert(ty),
        }
        self
    }

    fn push_toggle(&mut self, ty: RecordType, requested: BoolOrToggle) -> &mut Self {
        let stack = if ty == RecordType::Italic {
            &mut self.italic
        } else {
            &mut self.bold
        };
        let value = BoolOrToggle::resolve(stack.last().copied(), requested);
        stack.push(value);
        self.write_toggle(ty, value);
        self
    }

    fn pop_toggle(&mut self, ty: RecordType) -> &mut Self {
        let stack = if ty == RecordType::Italic {
            &mut self.italic
        } else {
            &mut self.bold
        };
        stack.pop();
        match stack.last().copied() {
            Some(top) => self.write_toggle(ty, top),
            None => self.write_revert(ty),
        }
        self
    }

    fn write_toggle(&mut self, ty: RecordType, value: BoolOrToggle) {
        let payload = if ty == RecordType::Italic {
            Payload::Italic(value)
        } else {
            Payload::Bold(value)
        };
        self.write_record(payload);
    }
}

/// Style axes.
impl TextBuilder {
    /// Opens a link. An empty target closes the current link until popped.
    pub fn push_link(&mut self, target: &[u8]) -> &mut Self {
        self.push_value(Payload::Link(target))
    }

    pub fn pop_link(&mut self) -> &mut Self {
        self.pop_value(RecordType::Link)
    }

    /// Registers `font_set` and switches to it.
    pub fn push_font_set(&mut self, font_set: FontSet) -> &mut Self {
        let index = self.add_font_set(font_set);
        self.push_font_set_index(index)
    }

    /// Switches to a font set previously returned by [`Self::add_font_set`].
    pub fn push_font_set_index(&mut self, index: usize) -> &mut Self {
        self.push_value(Payload::FontSet(index as u32))
    }

    pub fn pop_font_set(&mut self) -> &mut Self {
        self.pop_value(RecordType::FontSet)
    }

    value_axis!(
        /// Pixels; `0` selects the provider default and negative values
        /// multiply it.
        push_font_size, pop_font_size, FontSize, f32
    );
    value_axis!(push_line_height, pop_line_height, LineHeight, f32);
    value_axis!(
        push_horizontal_offset,
        pop_horizontal_offset,
        HorizontalOffset,
        f32
    );
    value_axis!(
        push_horizontal_alignment,
        pop_horizontal_alignment,
        HorizontalAlignment,
        f32
    );
    value_axis!(push_vertical_offset, pop_vertical_offset, VerticalOffset, f32);
    value_axis!(
        push_vertical_alignment,
        pop_vertical_alignment,
        VerticalAlignment,
        f32
    );

    /// `Change` flips whatever the enclosing pushes asserted.
    pub fn push_italic(&mut self, value: BoolOrToggle) -> &mut Self {
        self.push_toggle(RecordType::Italic, value)
    }

    pub fn pop_italic(&mut self) -> &mut Self {
        self.pop_toggle(RecordType::Italic)
    }

    /// `Change` flips whatever the enclosing pushes asserted.
    pub fn push_bold(&mut self, value: BoolOrToggle) -> &mut Self {
        self.push_toggle(RecordType::Bold, value)
    }

    pub fn pop_bold(&mut self) -> &mut Self {
        self.pop_toggle(RecordType::Bold)
    }

    value_axis!(
        push_text_decoration,
        pop_text_decoration,
        TextDecoration,
        TextDecoration
    );
    value_axis!(
        push_text_decoration_style,
        pop_text_decoration_style,
        TextDecorationStyle,
        TextDecorationStyle
    );
    value_axis!(push_back_color, pop_back_color, BackColor, Rgba32);
    value_axis!(push_shadow_color, pop_shadow_color, ShadowColor, Rgba32);
    value_axis!(push_edge_color, pop_edge_color, EdgeColor, Rgba32);
    value_axis!(
        push_text_decoration_color,
        pop_text_decoration_color,
        TextDecorationColor,
        Rgba32
    );
    value_axis!(push_fore_color, pop_fore_color, ForeColor, Rgba32);
    value_axis!(push_edge_width, pop_edge_width, EdgeWidth, f32);
    value_axis!(push_shadow_offset, pop_shadow_offset, ShadowOffset, Vector);
    value_axis!(
        push_text_decoration_thickness,
        pop_text_decoration_thickness,
        TextDecorationThickness,
        f32
    );
}

/// Content.
impl TextBuilder {
    pub fn append_str(&mut self, s: &str) -> &mut Self {
        self.text.extend_from_slice(s.as_bytes());
        self
    }

    pub fn append_str_repeat(&mut self, s: &str, repeat: usize) -> &mut Self {
        for _ in 0..repeat {
            self.text.extend_from_slice(s.as_bytes());
        }
        self
    }

    pub fn append_char(&mut self, c: char, repeat: usize) -> &mut Self {
        let mut buf = [0u8; 4];
        let encoded = c.encode_utf8(&mut buf);
        self.append_str_repeat(encoded, repeat)
    }

    /// Ends the current line.
    ///
    /// `MANUAL` writes an `ObjectNewLine` record; the others write their byte
    /// sequence. When several flags are set the first of `MANUAL`, `CR_LF`,
    /// `CR`, `LF` wins, and an empty set writes `LF`.
    pub fn append_line(&mut self, kind: NewLineType) -> &mut Self {
        if kind.contains(NewLineType::MANUAL) {
            self.write_record(Payload::ObjectNewLine);
        } else if kind.contains(NewLineType::CR_LF) {
            self.text.extend_from_slice(b"\r\n");
        } else if kind.contains(NewLineType::CR) {
            self.text.push(b'\r');
        } else {
            self.text.push(b'\n');
        }
        self
    }

    /// Inserts a host icon sized to the current font size.
    pub fn append_icon(&mut self, id: u32) -> &mut Self {
        self.write_record(Payload::ObjectIcon(id));
        self
    }

    /// Inserts the `uv0..uv1` region of a host texture.
    ///
    /// Returns the texture's index in the side table.
    pub fn append_texture(&mut self, handle: u64, uv0: Point, uv1: Point) -> usize {
        let index = match self.textures.iter().position(|&t| t == handle) {
            Some(index) => index,
            None => {
                self.textures.push(handle);
                self.textures.len() - 1
            }
        };
        self.write_record(Payload::ObjectTexture {
            index: index as u32,
            uv0,
            uv1,
        });
        index
    }

    /// Inserts a nested object. Returns its index in the side table.
    pub fn append_spannable(&mut self, spannable: Arc<dyn Spannable>) -> usize {
        let index = match self
            .spannables
            .iter()
            .position(|s| Arc::ptr_eq(s, &spannable))
        {
            Some(index) => index,
            None => {
                self.spannables.push(spannable);
                self.spannables.len() - 1
            }
        };
        self.write_record(Payload::ObjectSpannable(index as u32));
        index
    }

    /// Registers a font set without switching to it.
    pub fn add_font_set(&mut self, font_set: FontSet) -> usize {
        match self.font_sets.iter().position(|f| *f == font_set) {
            Some(index) => index,
            None => {
                self.font_sets.push(font_set);
                self.font_sets.len() - 1
            }
        }
    }
}

impl Reset for TextBuilder {
    fn reset(&mut self) {
        self.clear();
        self.font_sets.clear();
        self.textures.clear();
        self.spannables.clear();
    }

    fn is_reset(&self) -> bool {
        self.text.is_empty()
            && self.records.is_empty()
            && self.font_sets.is_empty()
            && self.textures.is_empty()
            && self.spannables.is_empty()
            && self.stacks.iter().all(Vec::is_empty)
            && self.italic.is_empty()
            && self.bold.is_empty()
    }
}
