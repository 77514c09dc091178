//! Variable-length integer and attribute encoding.
//!
//! Integers use an extended UTF-8 layout: values below `0x80` take a single
//! byte, larger values take a lead byte announcing the length followed by
//! `0b10xxxxxx` continuation bytes. Lengths continue past the four bytes
//! UTF-8 allows, up to seven bytes, so every `u32` is representable:
//!
//! | value below | bytes | lead       |
//! |-------------|-------|------------|
//! | `1 << 7`    | 1     | `0xxxxxxx` |
//! | `1 << 11`   | 2     | `110xxxxx` |
//! | `1 << 16`   | 3     | `1110xxxx` |
//! | `1 << 21`   | 4     | `11110xxx` |
//! | `1 << 26`   | 5     | `111110xx` |
//! | `1 << 31`   | 6     | `1111110x` |
//! | otherwise   | 7     | `11111110` |
//!
//! Every decoder returns `None` instead of panicking on truncated or
//! malformed input and never looks past the slice it is given.

use crate::geometry::{Point, Vector, point, vector};
use crate::style::{BoolOrToggle, Rgba32, TextDecoration, TextDecorationStyle};

/// Number of bytes [`encode_varint`] writes for `value`.
pub fn encoded_len(value: u32) -> usize {
    match value {
        0..0x80 => 1,
        0x80..0x800 => 2,
        0x800..0x1_0000 => 3,
        0x1_0000..0x20_0000 => 4,
        0x20_0000..0x400_0000 => 5,
        0x400_0000..0x8000_0000 => 6,
        _ => 7,
    }
}

/// Appends `value` to `buf` and returns the number of bytes written.
pub fn encode_varint(buf: &mut Vec<u8>, value: u32) -> usize {
    let len = encoded_len(value);
    if len == 1 {
        buf.push(value as u8);
        return 1;
    }

    let continuation = len - 1;
    let lead = match len {
        2 => 0xC0 | (value >> 6) as u8,
        3 => 0xE0 | (value >> 12) as u8,
        4 => 0xF0 | (value >> 18) as u8,
        5 => 0xF8 | (value >> 24) as u8,
        6 => 0xFC | (value >> 30) as u8,
        // seven bytes: the lead carries no payload bits
        _ => 0xFE,
    };
    buf.push(lead);

    let wide = value as u64;
    for i in (0..continuation).rev() {
        buf.push(0x80 | ((wide >> (6 * i)) & 0x3F) as u8);
    }

    len
}

/// Decodes one varint from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_varint(bytes: &[u8]) -> Option<(u32, usize)> {
    let lead = *bytes.first()?;
    let (len, bits) = match lead {
        0x00..=0x7F => return Some((lead as u32, 1)),
        0xC0..=0xDF => (2, lead & 0x1F),
        0xE0..=0xEF => (3, lead & 0x0F),
        0xF0..=0xF7 => (4, lead & 0x07),
        0xF8..=0xFB => (5, lead & 0x03),
        0xFC..=0xFD => (6, lead & 0x01),
        0xFE => (7, 0),
        // stray continuation byte or 0xFF
        _ => return None,
    };

    let tail = bytes.get(1..len)?;
    let mut value = bits as u64;
    for &b in tail {
        if b & 0xC0 != 0x80 {
            return None;
        }
        value = (value << 6) | (b & 0x3F) as u64;
    }

    u32::try_from(value).ok().map(|v| (v, len))
}

/// Appends a byte span: `varint(len + 1)`, the bytes, then a zero terminator.
pub fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> usize {
    let prefix = encode_varint(buf, bytes.len() as u32 + 1);
    buf.extend_from_slice(bytes);
    buf.push(0);
    prefix + bytes.len() + 1
}

/// Decodes a byte span written by [`encode_bytes`].
///
/// The terminator is consumed when present but not required.
pub fn decode_bytes(bytes: &[u8]) -> Option<(&[u8], usize)> {
    let (prefixed, n) = decode_varint(bytes)?;
    let len = prefixed.checked_sub(1)? as usize;
    let rest = &bytes[n..];
    let span = rest.get(..len)?;
    let terminator = usize::from(rest.get(len) == Some(&0));
    Some((span, n + len + terminator))
}

/// Symmetric encoding for a single attribute value.
pub trait RecordValue: Sized {
    fn encode(&self, buf: &mut Vec<u8>) -> usize;

    fn decode(bytes: &[u8]) -> Option<(Self, usize)>;
}

impl RecordValue for u32 {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        encode_varint(buf, *self)
    }

    fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        decode_varint(bytes)
    }
}

impl RecordValue for i32 {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        encode_varint(buf, *self as u32)
    }

    fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        decode_varint(bytes).map(|(v, n)| (v as i32, n))
    }
}

impl RecordValue for f32 {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        encode_varint(buf, self.to_bits())
    }

    fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        decode_varint(bytes).map(|(v, n)| (f32::from_bits(v), n))
    }
}

impl RecordValue for bool {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        encode_varint(buf, u32::from(*self))
    }

    fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        decode_varint(bytes).map(|(v, n)| (v != 0, n))
    }
}

impl RecordValue for BoolOrToggle {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        encode_varint(buf, *self as u32)
    }

    fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        let (v, n) = decode_varint(bytes)?;
        let value = BoolOrToggle::from_u8(u8::try_from(v).ok()?)?;
        Some((value, n))
    }
}

impl RecordValue for TextDecoration {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        encode_varint(buf, self.bits() as u32)
    }

    fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        let (v, n) = decode_varint(bytes)?;
        let value = TextDecoration::from_bits(u8::try_from(v).ok()?)?;
        Some((value, n))
    }
}

impl RecordValue for TextDecorationStyle {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        encode_varint(buf, *self as u32)
    }

    fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        let (v, n) = decode_varint(bytes)?;
        let value = TextDecorationStyle::from_u8(u8::try_from(v).ok()?)?;
        Some((value, n))
    }
}

impl RecordValue for Rgba32 {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        encode_varint(buf, self.0)
    }

    fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        decode_varint(bytes).map(|(v, n)| (Rgba32(v), n))
    }
}

impl RecordValue for Vector {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        self.x.encode(buf) + self.y.encode(buf)
    }

    fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        let (x, a) = f32::decode(bytes)?;
        let (y, b) = f32::decode(&bytes[a..])?;
        Some((vector(x, y), a + b))
    }
}

impl RecordValue for Point {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        self.x.encode(buf) + self.y.encode(buf)
    }

    fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        let (x, a) = f32::decode(bytes)?;
        let (y, b) = f32::decode(&bytes[a..])?;
        Some((point(x, y), a + b))
    }
}
