use std::sync::Arc;

use crate::record::codec::decode_varint;
use crate::record::{Record, decode_records, encode_records};
use crate::spannable::Spannable;
use crate::style::FontSet;

/// Immutable snapshot of a token stream.
///
/// Produced by [`crate::text::builder::TextBuilder::compile`] or decoded from
/// raw buffers with [`DataView::from_encoded`]. Layout shares it through an
/// `Arc`, so one compiled stream can back any number of measurements.
#[derive(Clone, Debug, Default)]
pub struct DataView {
    text: Vec<u8>,
    data: Vec<u8>,
    records: Vec<Record>,
    font_sets: Vec<FontSet>,
    textures: Vec<u64>,
    spannables: Vec<Arc<dyn Spannable>>,
}

impl DataView {
    pub(crate) fn new(
        text: Vec<u8>,
        data: Vec<u8>,
        records: Vec<Record>,
        font_sets: Vec<FontSet>,
        textures: Vec<u64>,
        spannables: Vec<Arc<dyn Spannable>>,
    ) -> Self {
        Self {
            text,
            data,
            records,
            font_sets,
            textures,
            spannables,
        }
    }

    /// Builds a view from serialized buffers.
    ///
    /// Records are read up to the first malformed one. Record positions past
    /// the end of the text are clamped to it, and records are stably ordered
    /// by position. Side tables start out empty.
    pub fn from_encoded(text: Vec<u8>, data: Vec<u8>, encoded_records: &[u8]) -> Self {
        let mut records = decode_records(encoded_records);
        let text_len = text.len() as u32;
        for record in &mut records {
            record.text_start = record.text_start.min(text_len);
        }
        records.sort_by_key(|r| r.text_start);

        Self {
            text,
            data,
            records,
            ..Self::default()
        }
    }

    pub fn with_font_sets(mut self, font_sets: Vec<FontSet>) -> Self {
        self.font_sets = font_sets;
        self
    }

    pub fn with_textures(mut self, textures: Vec<u64>) -> Self {
        self.textures = textures;
        self
    }

    pub fn with_spannables(mut self, spannables: Vec<Arc<dyn Spannable>>) -> Self {
        self.spannables = spannables;
        self
    }

    /// Serialized record table, readable by [`DataView::from_encoded`].
    pub fn encoded_records(&self) -> Vec<u8> {
        encode_records(&self.records)
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn font_sets(&self) -> &[FontSet] {
        &self.font_sets
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.records.is_empty()
    }

    /// Payload bytes of `record`; empty when the range is out of bounds.
    pub fn record_data(&self, record: &Record) -> &[u8] {
        self.data.get(record.data_range()).unwrap_or(&[])
    }

    pub fn texture_at(&self, index: usize) -> Option<u64> {
        self.textures.get(index).copied()
    }

    pub fn spannable_at(&self, index: usize) -> Option<&Arc<dyn Spannable>> {
        self.spannables.get(index)
    }

    /// Target bytes of the link opened by the record at `record_index`.
    pub fn link_at(&self, record_index: usize) -> Option<&[u8]> {
        let record = self.records.get(record_index)?;
        match crate::record::Payload::decode(record.ty, self.record_data(record))? {
            crate::record::Payload::Link(target) if !target.is_empty() => Some(target),
            _ => None,
        }
    }

    pub fn end_offset(&self) -> CompositeOffset {
        CompositeOffset {
            text: self.text.len(),
            record: self.records.len(),
        }
    }

    /// The first segment, or `None` for an empty stream.
    pub fn first_segment(&self) -> Option<Segment<'_>> {
        self.segment_at(CompositeOffset::default())
    }

    /// A cursor restarted at `offset`, or `None` at or past the end.
    pub fn segment_at(&self, offset: CompositeOffset) -> Option<Segment<'_>> {
        (offset < self.end_offset()).then_some(Segment { data: self, offset })
    }

    /// Decodes the codepoint at byte `offset` of the text.
    pub fn codepoint_at(&self, offset: usize) -> Option<(char, usize)> {
        let bytes = self.text.get(offset..).filter(|b| !b.is_empty())?;
        Some(decode_char(bytes))
    }
}

/// Decodes one codepoint from non-empty `bytes`.
///
/// Invalid sequences yield U+FFFD and consume a single byte.
pub(crate) fn decode_char(bytes: &[u8]) -> (char, usize) {
    match decode_varint(bytes) {
        Some((v, n)) if n <= 4 => match char::from_u32(v) {
            Some(c) => (c, n),
            None => (char::REPLACEMENT_CHARACTER, 1),
        },
        _ => (char::REPLACEMENT_CHARACTER, 1),
    }
}

/// Decodes the codepoint ending at `end`, never reading before `floor`.
pub(crate) fn decode_char_before(bytes: &[u8], end: usize, floor: usize) -> Option<(char, usize)> {
    if end <= floor || end > bytes.len() {
        return None;
    }

    let mut start = end - 1;
    while start > floor && end - start < 4 && bytes[start] & 0xC0 == 0x80 {
        start -= 1;
    }

    match decode_char(&bytes[start..end]) {
        (c, n) if n == end - start => Some((c, n)),
        _ => Some((char::REPLACEMENT_CHARACTER, 1)),
    }
}

/// Position in the interleaved text and record sequence.
///
/// Ordered by text position first, so a record sorts before the text that
/// starts at the same byte once `record` has advanced past it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeOffset {
    pub text: usize,
    pub record: usize,
}

impl CompositeOffset {
    pub const INVALID: Self = Self {
        text: usize::MAX,
        record: usize::MAX,
    };

    pub fn new(text: usize, record: usize) -> Self {
        Self { text, record }
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

/// Cursor over a [`DataView`] that alternates between text runs and records.
///
/// A segment is either a run of text up to the next record, or a single
/// record. Records that share a position with text come first.
#[derive(Clone, Copy, Debug)]
pub struct Segment<'a> {
    data: &'a DataView,
    offset: CompositeOffset,
}

impl<'a> Segment<'a> {
    pub fn new(data: &'a DataView, offset: CompositeOffset) -> Self {
        Self { data, offset }
    }

    pub fn offset(&self) -> CompositeOffset {
        self.offset
    }

    pub fn data(&self) -> &'a DataView {
        self.data
    }

    pub fn is_end(&self) -> bool {
        self.offset >= self.data.end_offset()
    }

    pub fn is_text(&self) -> bool {
        match self.data.records.get(self.offset.record) {
            Some(record) => {
                (record.text_start as usize).min(self.data.text.len()) > self.offset.text
            }
            None => true,
        }
    }

    /// Byte position where the text run starting here ends.
    fn text_end(&self) -> usize {
        self.data
            .records
            .get(self.offset.record)
            .map_or(self.data.text.len(), |r| r.text_start as usize)
            .min(self.data.text.len())
    }

    pub fn next(&self) -> Option<Segment<'a>> {
        if self.is_end() {
            return None;
        }

        let CompositeOffset { text, record } = self.offset;
        let offset = if self.is_text() {
            CompositeOffset::new(self.text_end().max(text), record)
        } else {
            CompositeOffset::new(text, record + 1)
        };
        self.data.segment_at(offset)
    }

    pub fn previous(&self) -> Option<Segment<'a>> {
        let CompositeOffset { text, record } = self.offset;
        let records = &self.data.records;

        if record > 0 && records.get(record - 1)?.text_start as usize >= text {
            return Some(Self::new(self.data, CompositeOffset::new(text, record - 1)));
        }

        let start = match record.checked_sub(1) {
            Some(i) => records.get(i)?.text_start as usize,
            None => 0,
        };
        (start < text).then(|| Self::new(self.data, CompositeOffset::new(start, record)))
    }

    /// Text bytes from this position up to the next record.
    ///
    /// Empty for record segments.
    pub fn raw_text(&self) -> &'a [u8] {
        if !self.is_text() {
            return &[];
        }
        self.data
            .text
            .get(self.offset.text..self.text_end())
            .unwrap_or(&[])
    }

    /// The record at this position with its index and payload bytes.
    pub fn record(&self) -> Option<(usize, &'a Record, &'a [u8])> {
        if self.is_text() {
            return None;
        }
        let index = self.offset.record;
        let record = self.data.records.get(index)?;
        Some((index, record, self.data.record_data(record)))
    }
}
