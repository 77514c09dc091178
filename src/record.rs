//! Records interleaved with the text of a token stream.
//!
//! A record marks a style change, a link, or an inline object at a byte
//! position of the text. Its payload lives in a separate data buffer so the
//! record itself stays a fixed set of integers.

pub mod codec;

use std::ops::Range;

use crate::geometry::{Point, Vector};
use crate::style::{BoolOrToggle, Rgba32, TextDecoration, TextDecorationStyle};

use codec::{RecordValue, decode_bytes, decode_varint, encode_bytes, encode_varint};

/// Kind of a record. The discriminants are part of the wire format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    /// Invalid; skipped during playback.
    #[default]
    None = 0,
    Link = 1,
    FontSet = 2,
    FontSize = 3,
    LineHeight = 4,
    HorizontalOffset = 5,
    HorizontalAlignment = 6,
    VerticalOffset = 7,
    VerticalAlignment = 8,
    Italic = 9,
    Bold = 10,
    TextDecoration = 11,
    TextDecorationStyle = 12,
    BackColor = 13,
    ShadowColor = 14,
    EdgeColor = 15,
    TextDecorationColor = 16,
    ForeColor = 17,
    EdgeWidth = 18,
    ShadowOffset = 19,
    TextDecorationThickness = 20,
    ObjectIcon = 21,
    ObjectTexture = 22,
    ObjectSpannable = 23,
    ObjectNewLine = 24,
}

impl RecordType {
    pub const COUNT: usize = 25;

    /// Unknown values map to [`RecordType::None`].
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Link,
            2 => Self::FontSet,
            3 => Self::FontSize,
            4 => Self::LineHeight,
            5 => Self::HorizontalOffset,
            6 => Self::HorizontalAlignment,
            7 => Self::VerticalOffset,
            8 => Self::VerticalAlignment,
            9 => Self::Italic,
            10 => Self::Bold,
            11 => Self::TextDecoration,
            12 => Self::TextDecorationStyle,
            13 => Self::BackColor,
            14 => Self::ShadowColor,
            15 => Self::EdgeColor,
            16 => Self::TextDecorationColor,
            17 => Self::ForeColor,
            18 => Self::EdgeWidth,
            19 => Self::ShadowOffset,
            20 => Self::TextDecorationThickness,
            21 => Self::ObjectIcon,
            22 => Self::ObjectTexture,
            23 => Self::ObjectSpannable,
            24 => Self::ObjectNewLine,
            _ => Self::None,
        }
    }

    /// Object records occupy space in the line instead of changing style.
    pub fn is_object(self) -> bool {
        matches!(
            self,
            Self::ObjectIcon | Self::ObjectTexture | Self::ObjectSpannable | Self::ObjectNewLine
        )
    }
}

/// One entry of the record table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Record {
    /// Byte offset into the text where the record takes effect.
    pub text_start: u32,
    /// Byte offset of the payload in the data buffer.
    pub data_start: u32,
    pub data_len: u32,
    pub ty: RecordType,
    /// Restores the initial value of the axis; carries no payload.
    pub is_revert: bool,
}

impl Record {
    pub fn new(
        text_start: u32,
        data_start: u32,
        data_len: u32,
        ty: RecordType,
        is_revert: bool,
    ) -> Self {
        debug_assert!(
            !is_revert || data_len == 0,
            "revert records carry no payload"
        );
        Self {
            text_start,
            data_start,
            data_len,
            ty,
            is_revert,
        }
    }

    pub fn data_range(&self) -> Range<usize> {
        let start = self.data_start as usize;
        start..start + self.data_len as usize
    }

    pub fn encoded_len(&self) -> usize {
        codec::encoded_len(self.text_start)
            + codec::encoded_len(self.data_start)
            + codec::encoded_len(self.data_len)
            + 2
    }

    pub fn encode(&self, buf: &mut Vec<u8>) -> usize {
        encode_varint(buf, self.text_start)
            + encode_varint(buf, self.data_start)
            + encode_varint(buf, self.data_len)
            + encode_varint(buf, self.ty as u32)
            + encode_varint(buf, u32::from(self.is_revert))
    }

    pub fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        let mut at = 0;
        let mut next = || -> Option<u32> {
            let (v, n) = decode_varint(bytes.get(at..)?)?;
            at += n;
            Some(v)
        };

        let text_start = next()?;
        let data_start = next()?;
        let data_len = next()?;
        let ty = RecordType::from_u8(u8::try_from(next()?).unwrap_or(0));
        let is_revert = next()? != 0;

        let record = Self {
            text_start,
            data_start,
            data_len,
            ty,
            is_revert,
        };
        Some((record, at))
    }
}

/// Writes every record back to back.
pub fn encode_records(records: &[Record]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(records.iter().map(Record::encoded_len).sum());
    for record in records {
        record.encode(&mut buf);
    }
    buf
}

/// Reads records until the buffer ends or a record fails to decode.
pub fn decode_records(mut bytes: &[u8]) -> Vec<Record> {
    let mut records = Vec::new();
    while !bytes.is_empty() {
        let Some((record, n)) = Record::decode(bytes) else {
            break;
        };
        records.push(record);
        bytes = &bytes[n..];
    }
    records
}

/// Typed view of a record payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Payload<'a> {
    /// Opaque link target. Empty closes the current link.
    Link(&'a [u8]),
    /// Index into the font set table of the data view.
    FontSet(u32),
    FontSize(f32),
    LineHeight(f32),
    HorizontalOffset(f32),
    HorizontalAlignment(f32),
    VerticalOffset(f32),
    VerticalAlignment(f32),
    Italic(BoolOrToggle),
    Bold(BoolOrToggle),
    TextDecoration(TextDecoration),
    TextDecorationStyle(TextDecorationStyle),
    BackColor(Rgba32),
    ShadowColor(Rgba32),
    EdgeColor(Rgba32),
    TextDecorationColor(Rgba32),
    ForeColor(Rgba32),
    EdgeWidth(f32),
    ShadowOffset(Vector),
    TextDecorationThickness(f32),
    /// Host icon id, resolved through the asset provider.
    ObjectIcon(u32),
    /// Index into the texture table with the sampled region.
    ObjectTexture { index: u32, uv0: Point, uv1: Point },
    /// Index into the spannable table.
    ObjectSpannable(u32),
    ObjectNewLine,
}

impl Payload<'_> {
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::Link(_) => RecordType::Link,
            Self::FontSet(_) => RecordType::FontSet,
            Self::FontSize(_) => RecordType::FontSize,
            Self::LineHeight(_) => RecordType::LineHeight,
            Self::HorizontalOffset(_) => RecordType::HorizontalOffset,
            Self::HorizontalAlignment(_) => RecordType::HorizontalAlignment,
            Self::VerticalOffset(_) => RecordType::VerticalOffset,
            Self::VerticalAlignment(_) => RecordType::VerticalAlignment,
            Self::Italic(_) => RecordType::Italic,
            Self::Bold(_) => RecordType::Bold,
            Self::TextDecoration(_) => RecordType::TextDecoration,
            Self::TextDecorationStyle(_) => RecordType::TextDecorationStyle,
            Self::BackColor(_) => RecordType::BackColor,
            Self::ShadowColor(_) => RecordType::ShadowColor,
            Self::EdgeColor(_) => RecordType::EdgeColor,
            Self::TextDecorationColor(_) => RecordType::TextDecorationColor,
            Self::ForeColor(_) => RecordType::ForeColor,
            Self::EdgeWidth(_) => RecordType::EdgeWidth,
            Self::ShadowOffset(_) => RecordType::ShadowOffset,
            Self::TextDecorationThickness(_) => RecordType::TextDecorationThickness,
            Self::ObjectIcon(_) => RecordType::ObjectIcon,
            Self::ObjectTexture { .. } => RecordType::ObjectTexture,
            Self::ObjectSpannable(_) => RecordType::ObjectSpannable,
            Self::ObjectNewLine => RecordType::ObjectNewLine,
        }
    }

    /// Appends the payload bytes and returns how many were written.
    pub fn encode(&self, buf: &mut Vec<u8>) -> usize {
        match self {
            Self::Link(bytes) => encode_bytes(buf, bytes),
            Self::FontSet(v) | Self::ObjectIcon(v) | Self::ObjectSpannable(v) => v.encode(buf),
            Self::FontSize(v)
            | Self::LineHeight(v)
            | Self::HorizontalOffset(v)
            | Self::HorizontalAlignment(v)
            | Self::VerticalOffset(v)
            | Self::VerticalAlignment(v)
            | Self::EdgeWidth(v)
            | Self::TextDecorationThickness(v) => v.encode(buf),
            Self::Italic(v) | Self::Bold(v) => v.encode(buf),
            Self::TextDecoration(v) => v.encode(buf),
            Self::TextDecorationStyle(v) => v.encode(buf),
            Self::BackColor(v)
            | Self::ShadowColor(v)
            | Self::EdgeColor(v)
            | Self::TextDecorationColor(v)
            | Self::ForeColor(v) => v.encode(buf),
            Self::ShadowOffset(v) => v.encode(buf),
            Self::ObjectTexture { index, uv0, uv1 } => {
                index.encode(buf) + uv0.encode(buf) + uv1.encode(buf)
            }
            Self::ObjectNewLine => 0,
        }
    }
}

impl<'a> Payload<'a> {
    /// Decodes the payload of a record of type `ty`.
    ///
    /// Returns `None` for [`RecordType::None`] and for malformed data.
    pub fn decode(ty: RecordType, bytes: &'a [u8]) -> Option<Self> {
        fn value<T: RecordValue>(bytes: &[u8]) -> Option<T> {
            T::decode(bytes).map(|(v, _)| v)
        }

        let payload = match ty {
            RecordType::None => return None,
            RecordType::Link => Self::Link(decode_bytes(bytes)?.0),
            RecordType::FontSet => Self::FontSet(value(bytes)?),
            RecordType::FontSize => Self::FontSize(value(bytes)?),
            RecordType::LineHeight => Self::LineHeight(value(bytes)?),
            RecordType::HorizontalOffset => Self::HorizontalOffset(value(bytes)?),
            RecordType::HorizontalAlignment => Self::HorizontalAlignment(value(bytes)?),
            RecordType::VerticalOffset => Self::VerticalOffset(value(bytes)?),
            RecordType::VerticalAlignment => Self::VerticalAlignment(value(bytes)?),
            RecordType::Italic => Self::Italic(value(bytes)?),
            RecordType::Bold => Self::Bold(value(bytes)?),
            RecordType::TextDecoration => Self::TextDecoration(value(bytes)?),
            RecordType::TextDecorationStyle => Self::TextDecorationStyle(value(bytes)?),
            RecordType::BackColor => Self::BackColor(value(bytes)?),
            RecordType::ShadowColor => Self::ShadowColor(value(bytes)?),
            RecordType::EdgeColor => Self::EdgeColor(value(bytes)?),
            RecordType::TextDecorationColor => Self::TextDecorationColor(value(bytes)?),
            RecordType::ForeColor => Self::ForeColor(value(bytes)?),
            RecordType::EdgeWidth => Self::EdgeWidth(value(bytes)?),
            RecordType::ShadowOffset => Self::ShadowOffset(value(bytes)?),
            RecordType::TextDecorationThickness => Self::TextDecorationThickness(value(bytes)?),
            RecordType::ObjectIcon => Self::ObjectIcon(value(bytes)?),
            RecordType::ObjectTexture => {
                let (index, a) = u32::decode(bytes)?;
                let (uv0, b) = Point::decode(&bytes[a..])?;
                let (uv1, _) = Point::decode(&bytes[a + b..])?;
                Self::ObjectTexture { index, uv0, uv1 }
            }
            RecordType::ObjectSpannable => Self::ObjectSpannable(value(bytes)?),
            RecordType::ObjectNewLine => Self::ObjectNewLine,
        };
        Some(payload)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{point, vector};

    #[test]
    fn test_record_type_from_u8() {
        for v in 0..RecordType::COUNT as u8 {
            assert_eq!(RecordType::from_u8(v) as u8, v);
        }
        assert_eq!(RecordType::from_u8(200), RecordType::None);
        assert!(RecordType::ObjectIcon.is_object());
        assert!(RecordType::ObjectNewLine.is_object());
        assert!(!RecordType::ForeColor.is_object());
    }

    #[test]
    fn test_record_wire_format() {
        let record = Record::new(300, 5, 2, RecordType::ForeColor, false);
        let mut buf = Vec::new();
        let n = record.encode(&mut buf);
        assert_eq!(n, record.encoded_len());
        // text_start takes two bytes, the other four fields one each
        assert_eq!(buf.len(), 6);
        assert_eq!(buf[2..], [5, 2, RecordType::ForeColor as u8, 0]);
        assert_eq!(Record::decode(&buf), Some((record, 6)));
    }

    #[test]
    fn test_decode_records_stops_at_truncation() {
        let records = [
            Record::new(0, 0, 1, RecordType::Bold, false),
            Record::new(4, 0, 0, RecordType::Bold, true),
            Record::new(9, 1, 3, RecordType::Link, false),
        ];
        let mut buf = encode_records(&records);
        assert_eq!(decode_records(&buf), records);

        buf.pop();
        assert_eq!(decode_records(&buf), records[..2]);
    }

    #[test]
    fn test_unknown_type_decodes_as_none() {
        let mut buf = Vec::new();
        for v in [1u32, 0, 0, 99, 0] {
            encode_varint(&mut buf, v);
        }
        let (record, _) = Record::decode(&buf).unwrap();
        assert_eq!(record.ty, RecordType::None);
        assert_eq!(Payload::decode(record.ty, &[]), None);
    }

    #[test]
    fn test_payloads_decode_what_they_encode() {
        let payloads = [
            Payload::Link(b"https://example.com"),
            Payload::FontSet(3),
            Payload::FontSize(-2.0),
            Payload::HorizontalAlignment(0.5),
            Payload::Bold(BoolOrToggle::Change),
            Payload::TextDecoration(TextDecoration::OVERLINE),
            Payload::TextDecorationStyle(TextDecorationStyle::Double),
            Payload::EdgeColor(Rgba32::from_rgba(0, 0, 0, 128)),
            Payload::ShadowOffset(vector(1.0, 1.0)),
            Payload::ObjectIcon(60_000),
            Payload::ObjectTexture {
                index: 2,
                uv0: point(0.0, 0.25),
                uv1: point(1.0, 0.75),
            },
            Payload::ObjectSpannable(0),
            Payload::ObjectNewLine,
        ];

        for payload in payloads {
            let mut buf = Vec::new();
            let n = payload.encode(&mut buf);
            assert_eq!(n, buf.len());
            assert_eq!(
                Payload::decode(payload.record_type(), &buf),
                Some(payload),
                "{payload:?}"
            );
        }
    }

    #[test]
    fn test_truncated_texture_payload() {
        let mut buf = Vec::new();
        Payload::ObjectTexture {
            index: 1,
            uv0: point(0.0, 0.0),
            uv1: point(1.0, 1.0),
        }
        .encode(&mut buf);
        buf.truncate(buf.len() - 1);
        assert_eq!(Payload::decode(RecordType::ObjectTexture, &buf), None);
    }
}
