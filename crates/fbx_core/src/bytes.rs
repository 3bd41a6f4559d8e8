//! Bounds-checked little-endian reads at absolute buffer positions.
//!
//! Every read in the crate goes through these functions, so an offset taken
//! from a corrupt record surfaces as [`Error::Truncated`] instead of reading
//! past the buffer.

use crate::error::{Error, Result};

/// Borrow `len` bytes starting at `pos`.
#[inline]
pub fn read_bytes(buf: &[u8], pos: usize, len: usize) -> Result<&[u8]> {
    pos.checked_add(len)
        .and_then(|end| buf.get(pos..end))
        .ok_or(Error::Truncated {
            offset: pos,
            width: len,
            limit: buf.len(),
        })
}

#[inline]
fn read_array<const N: usize>(buf: &[u8], pos: usize) -> Result<[u8; N]> {
    let bytes = read_bytes(buf, pos, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

#[inline]
pub fn read_u8(buf: &[u8], pos: usize) -> Result<u8> {
    buf.get(pos).copied().ok_or(Error::Truncated {
        offset: pos,
        width: 1,
        limit: buf.len(),
    })
}

#[inline]
pub fn read_u16_le(buf: &[u8], pos: usize) -> Result<u16> {
    read_array(buf, pos).map(u16::from_le_bytes)
}

#[inline]
pub fn read_u32_le(buf: &[u8], pos: usize) -> Result<u32> {
    read_array(buf, pos).map(u32::from_le_bytes)
}

/// Read a 64-bit value as two 32-bit words, low word first.
#[inline]
pub fn read_u64_le(buf: &[u8], pos: usize) -> Result<u64> {
    // Check the full width up front so the error reports the 8-byte read.
    read_bytes(buf, pos, 8)?;
    let lo = read_u32_le(buf, pos)? as u64;
    let hi = read_u32_le(buf, pos + 4)? as u64;
    Ok((hi << 32) | lo)
}

/// Read a `u32` and widen it to an offset/length.
#[inline]
pub(crate) fn read_len(buf: &[u8], pos: usize) -> Result<usize> {
    read_u32_le(buf, pos).map(|v| v as usize)
}
