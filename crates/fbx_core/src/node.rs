//! Node records and sibling ranges.
//!
//! A node record starts with a 13-byte header
//! (`end_offset:u32, num_properties:u32, property_list_len:u32, name_len:u8`),
//! followed by the name, the property list, and optionally a run of nested
//! records closed by a 13-byte zero sentinel. `end_offset` is absolute and
//! points at the next sibling (or at the sentinel closing the run).

use std::fmt;
use std::iter::FusedIterator;

use crate::bytes::{read_bytes, read_len, read_u32_le, read_u8};
use crate::error::{Error, Result};
use crate::property::PropertyRange;

/// Size of the fixed record header, which is also the size of a null sentinel.
pub const NODE_HEADER_LEN: usize = 13;

/// Position of one node record inside a document buffer.
///
/// Cursors are cheap `Copy` values. Equality compares offsets only.
#[derive(Clone, Copy)]
pub struct NodeCursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> NodeCursor<'a> {
    pub fn new(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn end_offset_field(&self) -> Result<usize> {
        read_len(self.buf, self.offset)
    }

    pub fn num_properties(&self) -> Result<u32> {
        read_u32_le(self.buf, self.offset + 4)
    }

    pub fn property_list_len(&self) -> Result<usize> {
        read_len(self.buf, self.offset + 8)
    }

    pub fn name_len(&self) -> Result<u8> {
        read_u8(self.buf, self.offset + 12)
    }

    /// True when the cursor sits on a zero-filled terminator.
    pub fn is_sentinel(&self) -> Result<bool> {
        Ok(self.end_offset_field()? == 0)
    }

    fn ensure_record(&self) -> Result<()> {
        if self.is_sentinel()? {
            return Err(Error::InvalidCursor {
                offset: self.offset,
                expected: "node record",
            });
        }
        Ok(())
    }

    /// Name bytes exactly as stored.
    pub fn name_bytes(&self) -> Result<&'a [u8]> {
        self.ensure_record()?;
        let len = self.name_len()? as usize;
        read_bytes(self.buf, self.offset + NODE_HEADER_LEN, len)
    }

    /// Name as text; use [`name_bytes`](Self::name_bytes) for non-UTF-8 names.
    pub fn name(&self) -> Result<&'a str> {
        let bytes = self.name_bytes()?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 {
            offset: self.offset + NODE_HEADER_LEN,
        })
    }

    pub fn properties(&self) -> Result<PropertyRange<'a>> {
        self.ensure_record()?;
        PropertyRange::for_node(self.buf, self.offset)
    }

    /// Range over the nested records.
    ///
    /// Leaf records have no trailing sentinel, so when the body ends exactly
    /// at `end_offset` the range is collapsed to `[end - 13, end - 13)`.
    pub fn children(&self) -> Result<NodeRange<'a>> {
        self.ensure_record()?;
        let end = self.end_offset_field()?;
        let start = self.offset
            + NODE_HEADER_LEN
            + self.property_list_len()?
            + self.name_len()? as usize;

        let child_end = end
            .checked_sub(NODE_HEADER_LEN)
            .filter(|&e| e >= self.offset)
            .ok_or_else(|| Error::malformed(self.offset, "end offset precedes record header"))?;
        let child_start = if start == end { child_end } else { start };
        if child_start > child_end {
            return Err(Error::malformed(
                self.offset,
                format!("record body ends at {start:#x}, past its end offset {end:#x}"),
            ));
        }
        Ok(NodeRange::new(self.buf, child_start, child_end))
    }

    /// First direct child named `name`.
    pub fn find_child(&self, name: &str) -> Result<Option<NodeCursor<'a>>> {
        for child in self.children()? {
            let child = child?;
            if child.name_bytes()? == name.as_bytes() {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Step to the next sibling (or the sentinel ending this run).
    pub fn advance(&mut self) -> Result<()> {
        let next = self.end_offset_field()?;
        if next <= self.offset {
            return Err(Error::malformed(
                self.offset,
                format!("end offset {next:#x} does not move past the record"),
            ));
        }
        self.offset = next;
        Ok(())
    }
}

impl PartialEq for NodeCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl Eq for NodeCursor<'_> {}

impl fmt::Debug for NodeCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCursor")
            .field("offset", &self.offset)
            .finish()
    }
}

/// A run of sibling records, `[begin, end)`.
#[derive(Debug, Clone)]
pub struct NodeRange<'a> {
    begin: NodeCursor<'a>,
    end: NodeCursor<'a>,
    failed: bool,
}

impl<'a> NodeRange<'a> {
    pub fn new(buf: &'a [u8], begin: usize, end: usize) -> Self {
        Self {
            begin: NodeCursor::new(buf, begin),
            end: NodeCursor::new(buf, end),
            failed: false,
        }
    }

    /// Cursor at the next record to be yielded.
    pub fn begin(&self) -> NodeCursor<'a> {
        self.begin
    }

    pub fn end(&self) -> NodeCursor<'a> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

impl<'a> Iterator for NodeRange<'a> {
    type Item = Result<NodeCursor<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.is_empty() {
            return None;
        }
        let current = self.begin;
        let step = if current.offset > self.end.offset {
            Err(Error::malformed(
                current.offset,
                format!("sibling run overshoots its end at {:#x}", self.end.offset),
            ))
        } else {
            current
                .ensure_record()
                .and_then(|()| self.begin.advance())
        };
        match step {
            Ok(()) => Some(Ok(current)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for NodeRange<'_> {}
