//! Typed property records and the cursor that walks a node's property list.
//!
//! A property is a one-byte type tag followed by a payload whose length is
//! fully determined by the tag (and, for arrays and strings, by length fields
//! inside the payload). That makes the list walkable forward with nothing but
//! the current offset and the offset where the list ends.
//!
//! # Layout
//!
//! - scalars `Y C I F D L`: fixed payload of 2, 1, 4, 4, 8, 8 bytes
//! - arrays `f d l i b`: `array_length:u32, encoding:u32, compressed_length:u32`,
//!   then `array_length * element_width` bytes when `encoding == 0`, otherwise
//!   `compressed_length` opaque bytes
//! - `S R`: `length:u32` then `length` bytes

use std::fmt;
use std::iter::FusedIterator;

use serde::{Serialize, Serializer};

use crate::bytes::{read_bytes, read_len, read_u16_le, read_u32_le, read_u64_le, read_u8};
use crate::error::{Error, Result};
use crate::node::NODE_HEADER_LEN;

/// Size of the `array_length, encoding, compressed_length` header of array properties.
pub const ARRAY_HEADER_LEN: usize = 12;

/// Property type, decoded from the tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PropertyType {
    Int16,
    Bool,
    Int32,
    Float32,
    Float64,
    Int64,
    Float32Array,
    Float64Array,
    Int64Array,
    Int32Array,
    BoolArray,
    String,
    Raw,
}

impl PropertyType {
    /// Parse a tag byte. Returns `None` for tags outside the format.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            b'Y' => PropertyType::Int16,
            b'C' => PropertyType::Bool,
            b'I' => PropertyType::Int32,
            b'F' => PropertyType::Float32,
            b'D' => PropertyType::Float64,
            b'L' => PropertyType::Int64,
            b'f' => PropertyType::Float32Array,
            b'd' => PropertyType::Float64Array,
            b'l' => PropertyType::Int64Array,
            b'i' => PropertyType::Int32Array,
            b'b' => PropertyType::BoolArray,
            b'S' => PropertyType::String,
            b'R' => PropertyType::Raw,
            _ => return None,
        })
    }

    /// The tag byte as stored in the file.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            PropertyType::Int16 => b'Y',
            PropertyType::Bool => b'C',
            PropertyType::Int32 => b'I',
            PropertyType::Float32 => b'F',
            PropertyType::Float64 => b'D',
            PropertyType::Int64 => b'L',
            PropertyType::Float32Array => b'f',
            PropertyType::Float64Array => b'd',
            PropertyType::Int64Array => b'l',
            PropertyType::Int32Array => b'i',
            PropertyType::BoolArray => b'b',
            PropertyType::String => b'S',
            PropertyType::Raw => b'R',
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PropertyType::Int16 => "int16",
            PropertyType::Bool => "bool",
            PropertyType::Int32 => "int32",
            PropertyType::Float32 => "float32",
            PropertyType::Float64 => "float64",
            PropertyType::Int64 => "int64",
            PropertyType::Float32Array => "float32[]",
            PropertyType::Float64Array => "float64[]",
            PropertyType::Int64Array => "int64[]",
            PropertyType::Int32Array => "int32[]",
            PropertyType::BoolArray => "bool[]",
            PropertyType::String => "string",
            PropertyType::Raw => "raw",
        }
    }

    /// Payload width of scalar types.
    #[must_use]
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            PropertyType::Int16 => Some(2),
            PropertyType::Bool => Some(1),
            PropertyType::Int32 | PropertyType::Float32 => Some(4),
            PropertyType::Float64 | PropertyType::Int64 => Some(8),
            _ => None,
        }
    }

    /// Element width of array types.
    #[must_use]
    pub fn element_width(self) -> Option<usize> {
        match self {
            PropertyType::Float32Array | PropertyType::Int32Array => Some(4),
            PropertyType::Float64Array | PropertyType::Int64Array => Some(8),
            PropertyType::BoolArray => Some(1),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_array(self) -> bool {
        self.element_width().is_some()
    }
}

/// Header shared by all array properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArrayHeader {
    pub array_length: u32,
    pub encoding: u32,
    pub compressed_length: u32,
}

impl ArrayHeader {
    /// Nonzero encoding means the payload is compressed (opaque to this crate).
    pub fn is_compressed(&self) -> bool {
        self.encoding != 0
    }

    /// Bytes following the header for elements of `element_width` bytes.
    /// `None` if the element block size overflows `usize`.
    pub fn payload_len(&self, element_width: usize) -> Option<usize> {
        if self.is_compressed() {
            return Some(self.compressed_length as usize);
        }
        (self.array_length as usize).checked_mul(element_width)
    }
}

/// Inspection value of a single property.
///
/// Arrays and raw blobs are reported as opaque markers; their bytes are
/// available through [`PropertyCursor::raw_bytes`]. `Text` holds the string
/// bytes as stored, which need not be UTF-8.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PropertyValue<'a> {
    Int16(i16),
    Bool(bool),
    Int32(i32),
    Float32(f32),
    Float64(f64),
    Int64(i64),
    ArrayOpaque,
    RawOpaque,
    Text(#[serde(serialize_with = "serialize_text")] &'a [u8]),
}

impl fmt::Display for PropertyValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Int16(v) => write!(f, "{v}"),
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::Int32(v) => write!(f, "{v}"),
            PropertyValue::Float32(v) => write_float(f, *v as f64, 8),
            PropertyValue::Float64(v) => write_float(f, *v, 10),
            PropertyValue::Int64(v) => write!(f, "{v}"),
            PropertyValue::ArrayOpaque => f.write_str("<array>"),
            PropertyValue::RawOpaque => f.write_str("<raw>"),
            PropertyValue::Text(s) => f.write_str(&String::from_utf8_lossy(s)),
        }
    }
}

/// Six decimals right-aligned to `width`, with NaN spelled like printf's `%f`.
fn write_float(f: &mut fmt::Formatter<'_>, v: f64, width: usize) -> fmt::Result {
    if v.is_nan() {
        let s = if v.is_sign_negative() { "-nan" } else { "nan" };
        return write!(f, "{s:>width$}");
    }
    write!(f, "{v:width$.6}")
}

/// Valid UTF-8 serializes as a string, anything else as a byte sequence.
fn serialize_text<S: Serializer>(bytes: &&[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match std::str::from_utf8(bytes) {
        Ok(s) => serializer.serialize_str(s),
        Err(_) => serializer.serialize_bytes(bytes),
    }
}

/// Position of one property inside a document buffer.
///
/// The tag is validated when the cursor is created, so [`kind`](Self::kind)
/// never fails. Equality compares offsets only.
#[derive(Clone, Copy)]
pub struct PropertyCursor<'a> {
    buf: &'a [u8],
    offset: usize,
    ty: PropertyType,
}

impl<'a> PropertyCursor<'a> {
    /// Create a cursor at the tag byte at `offset`.
    pub fn new(buf: &'a [u8], offset: usize) -> Result<Self> {
        let tag = read_u8(buf, offset)?;
        let ty = PropertyType::from_tag(tag).ok_or(Error::UnknownPropertyTag { tag, offset })?;
        Ok(Self { buf, offset, ty })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The raw tag byte.
    pub fn kind(&self) -> u8 {
        self.ty.tag()
    }

    pub fn property_type(&self) -> PropertyType {
        self.ty
    }

    fn payload_offset(&self) -> usize {
        self.offset + 1
    }

    /// Header of an array property.
    pub fn array_header(&self) -> Result<ArrayHeader> {
        if !self.ty.is_array() {
            return Err(Error::InvalidCursor {
                offset: self.offset,
                expected: "array property",
            });
        }
        let p = self.payload_offset();
        Ok(ArrayHeader {
            array_length: read_u32_le(self.buf, p)?,
            encoding: read_u32_le(self.buf, p + 4)?,
            compressed_length: read_u32_le(self.buf, p + 8)?,
        })
    }

    /// Number of bytes after the tag byte.
    pub fn payload_len(&self) -> Result<usize> {
        if let Some(width) = self.ty.fixed_width() {
            return Ok(width);
        }
        if let Some(width) = self.ty.element_width() {
            let header = self.array_header()?;
            let body = header
                .payload_len(width)
                .ok_or_else(|| Error::malformed(self.offset, "array payload length overflows"))?;
            return Ok(ARRAY_HEADER_LEN + body);
        }
        // String and Raw
        Ok(4 + read_len(self.buf, self.payload_offset())?)
    }

    /// Offset of the next property: `offset + 1 + payload_len`.
    ///
    /// Fails with `Truncated` if the payload would run past the buffer.
    pub fn next_offset(&self) -> Result<usize> {
        let len = self.payload_len()?;
        let next = self
            .payload_offset()
            .checked_add(len)
            .ok_or_else(|| Error::malformed(self.offset, "property length overflows"))?;
        if next > self.buf.len() {
            return Err(Error::Truncated {
                offset: self.offset,
                width: 1 + len,
                limit: self.buf.len(),
            });
        }
        Ok(next)
    }

    /// Payload bytes without their length prefix or array header.
    ///
    /// Strings and raw blobs return exactly `length` bytes; arrays return the
    /// (possibly compressed) element block.
    pub fn raw_bytes(&self) -> Result<&'a [u8]> {
        let p = self.payload_offset();
        if let Some(width) = self.ty.fixed_width() {
            return read_bytes(self.buf, p, width);
        }
        if self.ty.is_array() {
            let len = self.payload_len()? - ARRAY_HEADER_LEN;
            return read_bytes(self.buf, p + ARRAY_HEADER_LEN, len);
        }
        let len = read_len(self.buf, p)?;
        read_bytes(self.buf, p + 4, len)
    }

    /// Decode the property under the cursor. Does not move the cursor.
    pub fn render(&self) -> Result<PropertyValue<'a>> {
        let p = self.payload_offset();
        let value = match self.ty {
            PropertyType::Int16 => PropertyValue::Int16(read_u16_le(self.buf, p)? as i16),
            PropertyType::Bool => PropertyValue::Bool(read_u8(self.buf, p)? != 0),
            PropertyType::Int32 => PropertyValue::Int32(read_u32_le(self.buf, p)? as i32),
            PropertyType::Float32 => PropertyValue::Float32(f32::from_bits(read_u32_le(self.buf, p)?)),
            PropertyType::Float64 => PropertyValue::Float64(f64::from_bits(read_u64_le(self.buf, p)?)),
            PropertyType::Int64 => PropertyValue::Int64(read_u64_le(self.buf, p)? as i64),
            PropertyType::Float32Array
            | PropertyType::Float64Array
            | PropertyType::Int64Array
            | PropertyType::Int32Array
            | PropertyType::BoolArray => PropertyValue::ArrayOpaque,
            PropertyType::String => PropertyValue::Text(self.raw_bytes()?),
            PropertyType::Raw => PropertyValue::RawOpaque,
        };
        Ok(value)
    }
}

impl PartialEq for PropertyCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl Eq for PropertyCursor<'_> {}

impl fmt::Debug for PropertyCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyCursor")
            .field("offset", &self.offset)
            .field("kind", &(self.kind() as char))
            .finish()
    }
}

/// The property list of one node, as a lazy sequence of cursors.
///
/// Iteration stops when the next offset reaches the end of the list. A
/// property that runs past the end, or a bad tag, is yielded as an error and
/// ends the iteration.
#[derive(Debug, Clone)]
pub struct PropertyRange<'a> {
    buf: &'a [u8],
    next: usize,
    end: usize,
    failed: bool,
}

impl<'a> PropertyRange<'a> {
    pub fn new(buf: &'a [u8], start: usize, end: usize) -> Self {
        Self {
            buf,
            next: start,
            end,
            failed: false,
        }
    }

    /// Bounds of the property list of the node record at `node_offset`.
    pub fn for_node(buf: &'a [u8], node_offset: usize) -> Result<Self> {
        let list_len = read_len(buf, node_offset + 8)?;
        let name_len = read_u8(buf, node_offset + 12)? as usize;
        let start = node_offset + NODE_HEADER_LEN + name_len;
        Ok(Self::new(buf, start, start + list_len))
    }

    pub fn start(&self) -> usize {
        self.next
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.next >= self.end
    }
}

impl<'a> Iterator for PropertyRange<'a> {
    type Item = Result<PropertyCursor<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.is_empty() {
            return None;
        }
        let step = PropertyCursor::new(self.buf, self.next).and_then(|cursor| {
            let next = cursor.next_offset()?;
            if next > self.end {
                return Err(Error::Truncated {
                    offset: cursor.offset,
                    width: next - cursor.offset,
                    limit: self.end,
                });
            }
            Ok((cursor, next))
        });
        match step {
            Ok((cursor, next)) => {
                self.next = next;
                Some(Ok(cursor))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for PropertyRange<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_util::*;

    fn list(props: &[Vec<u8>]) -> Vec<u8> {
        props.concat()
    }

    fn render_all(buf: &[u8]) -> Vec<PropertyValue<'_>> {
        PropertyRange::new(buf, 0, buf.len())
            .map(|p| p.and_then(|p| p.render()).unwrap())
            .collect()
    }

    #[test]
    fn test_scalar_advance_is_tag_plus_width() {
        let cases = [
            (i16_prop(-5), 2),
            (bool_prop(true), 1),
            (i32_prop(42), 4),
            (f32_prop(1.5), 4),
            (f64_prop(3.5), 8),
            (i64_prop(-1), 8),
        ];
        for (bytes, width) in cases {
            let cursor = PropertyCursor::new(&bytes, 0).unwrap();
            assert_eq!(cursor.property_type().fixed_width(), Some(width));
            assert_eq!(cursor.next_offset().unwrap(), 1 + width);
        }
    }

    #[test]
    fn test_uncompressed_array_advance() {
        let bytes = f64_array_prop(&[1.0, 2.0, 3.0]);
        let cursor = PropertyCursor::new(&bytes, 0).unwrap();
        let header = cursor.array_header().unwrap();
        assert_eq!(header.array_length, 3);
        assert!(!header.is_compressed());
        assert_eq!(cursor.next_offset().unwrap(), 1 + 12 + 3 * 8);
        assert_eq!(cursor.raw_bytes().unwrap().len(), 24);
    }

    #[test]
    fn test_compressed_array_advance_uses_compressed_length() {
        // 100 elements claimed, but only 7 compressed bytes follow.
        let bytes = array_prop(b'i', 100, 1, &[0x78, 0x9C, 1, 2, 3, 4, 5]);
        let cursor = PropertyCursor::new(&bytes, 0).unwrap();
        assert!(cursor.array_header().unwrap().is_compressed());
        assert_eq!(cursor.next_offset().unwrap(), 1 + 12 + 7);
        assert_eq!(cursor.render().unwrap(), PropertyValue::ArrayOpaque);
    }

    #[test]
    fn test_bool_array_element_width() {
        let bytes = array_prop(b'b', 5, 0, &[1, 0, 1, 1, 0]);
        let cursor = PropertyCursor::new(&bytes, 0).unwrap();
        assert_eq!(cursor.next_offset().unwrap(), 1 + 12 + 5);
    }

    #[test]
    fn test_string_with_embedded_nulls_keeps_length() {
        let text = b"Cube\x00\x01Model";
        let bytes = string_prop(text);
        let cursor = PropertyCursor::new(&bytes, 0).unwrap();

        assert_eq!(cursor.next_offset().unwrap(), 1 + 4 + text.len());
        assert_eq!(cursor.raw_bytes().unwrap(), text);
        match cursor.render().unwrap() {
            PropertyValue::Text(s) => assert_eq!(s, &text[..]),
            other => panic!("Expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_is_opaque() {
        let bytes = raw_prop(&[0xFF, 0xFE, 0x00]);
        let cursor = PropertyCursor::new(&bytes, 0).unwrap();
        assert_eq!(cursor.render().unwrap(), PropertyValue::RawOpaque);
        assert_eq!(cursor.raw_bytes().unwrap(), &[0xFFu8, 0xFE, 0x00][..]);
        assert_eq!(cursor.next_offset().unwrap(), 8);
    }

    #[test]
    fn test_render_scalars() {
        let buf = list(&[
            i16_prop(-5),
            bool_prop(true),
            i32_prop(-42),
            f32_prop(0.25),
            f64_prop(3.5),
            i64_prop(1 << 40),
        ]);
        assert_eq!(
            render_all(&buf),
            vec![
                PropertyValue::Int16(-5),
                PropertyValue::Bool(true),
                PropertyValue::Int32(-42),
                PropertyValue::Float32(0.25),
                PropertyValue::Float64(3.5),
                PropertyValue::Int64(1 << 40),
            ]
        );
    }

    #[test]
    fn test_render_does_not_move_cursor() {
        let buf = list(&[i32_prop(7), i32_prop(8)]);
        let cursor = PropertyCursor::new(&buf, 0).unwrap();
        assert_eq!(cursor.render().unwrap(), PropertyValue::Int32(7));
        assert_eq!(cursor.render().unwrap(), PropertyValue::Int32(7));
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_display_matches_dump_format() {
        assert_eq!(PropertyValue::Int16(-5).to_string(), "-5");
        assert_eq!(PropertyValue::Bool(false).to_string(), "false");
        assert_eq!(PropertyValue::Float32(1.5).to_string(), "1.500000");
        assert_eq!(PropertyValue::Float32(0.5).to_string(), "0.500000");
        assert_eq!(PropertyValue::Float64(3.5).to_string(), "  3.500000");
        assert_eq!(PropertyValue::ArrayOpaque.to_string(), "<array>");
        assert_eq!(PropertyValue::RawOpaque.to_string(), "<raw>");
        assert_eq!(PropertyValue::Text(b"Model").to_string(), "Model");
    }

    #[test]
    fn test_display_non_finite_floats_like_printf() {
        assert_eq!(PropertyValue::Float32(f32::NAN).to_string(), "     nan");
        assert_eq!(PropertyValue::Float32(f32::NEG_INFINITY).to_string(), "    -inf");
        assert_eq!(PropertyValue::Float64(f64::INFINITY).to_string(), "       inf");
        assert_eq!(PropertyValue::Float64(-f64::NAN).to_string(), "      -nan");
    }

    #[test]
    fn test_array_payload_len() {
        let header = ArrayHeader {
            array_length: 3,
            encoding: 0,
            compressed_length: 7,
        };
        assert_eq!(header.payload_len(8), Some(24));
        assert_eq!(header.payload_len(usize::MAX), None);

        let compressed = ArrayHeader { encoding: 1, ..header };
        assert_eq!(compressed.payload_len(usize::MAX), Some(7));
    }

    #[test]
    fn test_non_utf8_string_keeps_every_byte() {
        let text = b"Caf\xe9";
        let bytes = string_prop(text);
        let cursor = PropertyCursor::new(&bytes, 0).unwrap();

        let value = cursor.render().unwrap();
        assert_eq!(value, PropertyValue::Text(&text[..]));
        assert_eq!(value.to_string(), "Caf\u{FFFD}");

        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!({ "Text": [0x43, 0x61, 0x66, 0xE9] }));
        let json = serde_json::to_value(PropertyValue::Text(b"Cube")).unwrap();
        assert_eq!(json, serde_json::json!({ "Text": "Cube" }));
    }

    #[test]
    fn test_unknown_tag() {
        let buf = [b'Z', 0, 0, 0, 0];
        let err = PropertyCursor::new(&buf, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownPropertyTag);

        let mut props = PropertyRange::new(&buf, 0, buf.len());
        assert_eq!(
            props.next().unwrap().unwrap_err().kind(),
            ErrorKind::UnknownPropertyTag
        );
        assert!(props.next().is_none());
    }

    #[test]
    fn test_property_past_list_end_is_truncated() {
        let buf = list(&[i32_prop(1), f64_prop(2.0)]);
        // List claims to end in the middle of the second property.
        let mut props = PropertyRange::new(&buf, 0, 8);
        assert!(props.next().unwrap().is_ok());
        assert_eq!(props.next().unwrap().unwrap_err().kind(), ErrorKind::Truncated);
        assert!(props.next().is_none());
    }

    #[test]
    fn test_string_length_past_buffer_is_truncated() {
        let mut buf = vec![b'S'];
        buf.extend_from_slice(&1000u32.to_le_bytes());
        buf.extend_from_slice(b"short");
        let cursor = PropertyCursor::new(&buf, 0).unwrap();
        assert_eq!(cursor.next_offset().unwrap_err().kind(), ErrorKind::Truncated);
        assert_eq!(cursor.render().unwrap_err().kind(), ErrorKind::Truncated);
    }

    #[test]
    fn test_array_header_on_scalar_is_invalid() {
        let buf = i32_prop(1);
        let cursor = PropertyCursor::new(&buf, 0).unwrap();
        assert_eq!(
            cursor.array_header().unwrap_err().kind(),
            ErrorKind::InvalidCursor
        );
    }

    #[test]
    fn test_cursor_equality_is_by_offset() {
        let buf = list(&[i32_prop(1), i32_prop(1)]);
        let a = PropertyCursor::new(&buf, 0).unwrap();
        let b = PropertyCursor::new(&buf, 0).unwrap();
        let c = PropertyCursor::new(&buf, 5).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.render().unwrap(), c.render().unwrap());
    }

    #[test]
    fn test_property_type_roundtrips_tag() {
        for tag in *b"YCIFDLfdlibSR" {
            let ty = PropertyType::from_tag(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
        assert_eq!(PropertyType::from_tag(b'x'), None);
    }
}
