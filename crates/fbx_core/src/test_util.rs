//! Byte-level builders for synthetic documents used in unit tests.

use crate::document::{MAGIC, ROOT_OFFSET};
use crate::node::NODE_HEADER_LEN;

/// A node record to be encoded, with pre-encoded properties.
pub(crate) struct TestNode {
    name: Vec<u8>,
    props: Vec<Vec<u8>>,
    children: Vec<TestNode>,
    closed: bool,
}

impl TestNode {
    pub fn new(name: &str) -> Self {
        Self::with_name_bytes(name.as_bytes())
    }

    pub fn with_name_bytes(name: &[u8]) -> Self {
        Self {
            name: name.to_vec(),
            props: Vec::new(),
            children: Vec::new(),
            closed: false,
        }
    }

    /// Write the closing sentinel even without children, as Blender's
    /// exporter does for empty records.
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn prop(mut self, encoded: Vec<u8>) -> Self {
        self.props.push(encoded);
        self
    }

    pub fn child(mut self, node: TestNode) -> Self {
        self.children.push(node);
        self
    }

    /// Append this record at the end of `out`; offsets are absolute in `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        let start = out.len();
        let prop_bytes: Vec<u8> = self.props.concat();

        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&(self.props.len() as u32).to_le_bytes());
        out.extend_from_slice(&(prop_bytes.len() as u32).to_le_bytes());
        out.push(self.name.len() as u8);
        out.extend_from_slice(&self.name);
        out.extend_from_slice(&prop_bytes);

        for child in &self.children {
            child.encode(out);
        }
        if !self.children.is_empty() || self.closed {
            out.extend_from_slice(&[0; NODE_HEADER_LEN]);
        }

        let end = out.len() as u32;
        out[start..start + 4].copy_from_slice(&end.to_le_bytes());
    }
}

/// Encode a complete document: header, top-level records, root sentinel.
pub(crate) fn document(version: u32, nodes: &[TestNode]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[0x00, 0x1A, 0x00]);
    out.extend_from_slice(&version.to_le_bytes());
    assert_eq!(out.len(), ROOT_OFFSET);

    for node in nodes {
        node.encode(&mut out);
    }
    out.extend_from_slice(&[0; NODE_HEADER_LEN]);
    out
}

fn scalar(tag: u8, bytes: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(bytes);
    out
}

pub(crate) fn i16_prop(v: i16) -> Vec<u8> {
    scalar(b'Y', &v.to_le_bytes())
}

pub(crate) fn bool_prop(v: bool) -> Vec<u8> {
    scalar(b'C', &[v as u8])
}

pub(crate) fn i32_prop(v: i32) -> Vec<u8> {
    scalar(b'I', &v.to_le_bytes())
}

pub(crate) fn f32_prop(v: f32) -> Vec<u8> {
    scalar(b'F', &v.to_le_bytes())
}

pub(crate) fn f64_prop(v: f64) -> Vec<u8> {
    scalar(b'D', &v.to_le_bytes())
}

pub(crate) fn i64_prop(v: i64) -> Vec<u8> {
    scalar(b'L', &v.to_le_bytes())
}

fn sized(tag: u8, bytes: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
    out
}

pub(crate) fn string_prop(bytes: &[u8]) -> Vec<u8> {
    sized(b'S', bytes)
}

pub(crate) fn raw_prop(bytes: &[u8]) -> Vec<u8> {
    sized(b'R', bytes)
}

/// Array property; `compressed_length` is always `payload.len()`.
pub(crate) fn array_prop(tag: u8, array_length: u32, encoding: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&array_length.to_le_bytes());
    out.extend_from_slice(&encoding.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Uncompressed `f64` array.
pub(crate) fn f64_array_prop(values: &[f64]) -> Vec<u8> {
    let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    array_prop(b'd', values.len() as u32, 0, &payload)
}
