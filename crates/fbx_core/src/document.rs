//! Binary FBX document: owns the bytes, validates the header, finds the root.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use crate::bytes::{read_len, read_u32_le};
use crate::error::{Error, Result};
use crate::node::{NodeCursor, NodeRange};

/// File magic, the first 20 bytes of every binary FBX file.
pub const MAGIC: &[u8; 20] = b"Kaydara FBX Binary  ";

/// Offset of the `u32` format version (after 3 reserved bytes).
pub const VERSION_OFFSET: usize = 23;

/// Offset of the first top-level node record.
pub const ROOT_OFFSET: usize = 27;

/// A validated binary FBX document.
///
/// The buffer is either borrowed from the caller or owned (when loaded from
/// disk). All cursors borrow from the document, so it must outlive them.
pub struct Document<'a> {
    buffer: Cow<'a, [u8]>,
    version: u32,
    end_offset: usize,
}

impl Document<'static> {
    /// Read a file from disk and validate it.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use fbx_core::Document;
    ///
    /// let doc = Document::open("cube.fbx")?;
    /// for node in doc.root() {
    ///     println!("{}", node?.name()?);
    /// }
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        log::debug!("Read {} bytes from {}", bytes.len(), path.display());
        Self::from_vec(bytes)
    }

    pub fn from_vec(bytes: Vec<u8>) -> Result<Self> {
        Self::from_buffer(Cow::Owned(bytes))
    }
}

impl<'a> Document<'a> {
    /// Validate a caller-supplied byte range without copying it.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        Self::from_buffer(Cow::Borrowed(bytes))
    }

    fn from_buffer(buffer: Cow<'a, [u8]>) -> Result<Self> {
        if buffer.len() < ROOT_OFFSET {
            return Err(Error::Truncated {
                offset: 0,
                width: ROOT_OFFSET,
                limit: buffer.len(),
            });
        }
        if &buffer[..MAGIC.len()] != MAGIC {
            return Err(Error::BadMagic);
        }

        let version = read_u32_le(&buffer, VERSION_OFFSET)?;
        let end_offset = find_root_end(&buffer)?;
        log::debug!(
            "FBX version {}, top-level records span {:#x}..{:#x}",
            version,
            ROOT_OFFSET,
            end_offset
        );

        Ok(Self {
            buffer,
            version,
            end_offset,
        })
    }

    /// Format version, e.g. `7400`.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Offset where the top-level record sequence ends.
    pub fn end_offset(&self) -> usize {
        self.end_offset
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The top-level records.
    pub fn root(&self) -> NodeRange<'_> {
        NodeRange::new(&self.buffer, ROOT_OFFSET, self.end_offset)
    }

    /// First top-level record named `name`.
    pub fn find(&self, name: &str) -> Result<Option<NodeCursor<'_>>> {
        for node in self.root() {
            let node = node?;
            if node.name_bytes()? == name.as_bytes() {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.buffer.len())
            .field("version", &self.version)
            .field("end_offset", &self.end_offset)
            .finish()
    }
}

/// Follow the chain of absolute `u32` offsets starting at the first record
/// until a zero is read; the position of that zero ends the root sequence.
fn find_root_end(buf: &[u8]) -> Result<usize> {
    let mut pos = ROOT_OFFSET;
    let mut hops = 0usize;
    loop {
        let next = read_len(buf, pos)?;
        if next == 0 {
            break;
        }
        if next <= pos {
            return Err(Error::malformed(
                pos,
                format!("offset chain points backwards to {next:#x}"),
            ));
        }
        pos = next;
        hops += 1;
    }
    log::debug!("Offset chain: {} hops, root ends at {:#x}", hops, pos);
    Ok(pos)
}
