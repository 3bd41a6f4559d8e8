//! Listing of the recognized children of the top-level `Objects` section.
//!
//! Only the record name is interpreted; everything else stays raw and is read
//! through the returned cursors.

use std::iter::FusedIterator;

use serde::Serialize;

use crate::document::Document;
use crate::error::Result;
use crate::node::{NodeCursor, NodeRange};

/// Name of the top-level section holding object definitions.
pub const OBJECTS_SECTION: &str = "Objects";

/// Object record kinds picked out of the `Objects` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectKind {
    NodeAttribute,
    Geometry,
    Model,
    Material,
}

impl ObjectKind {
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"NodeAttribute" => Some(ObjectKind::NodeAttribute),
            b"Geometry" => Some(ObjectKind::Geometry),
            b"Model" => Some(ObjectKind::Model),
            b"Material" => Some(ObjectKind::Material),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::NodeAttribute => "NodeAttribute",
            ObjectKind::Geometry => "Geometry",
            ObjectKind::Model => "Model",
            ObjectKind::Material => "Material",
        }
    }
}

/// One recognized object record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectEntry<'a> {
    pub kind: ObjectKind,
    pub node: NodeCursor<'a>,
}

/// Iterator over the recognized children of a section; other names are skipped.
#[derive(Debug, Clone)]
pub struct Objects<'a> {
    children: NodeRange<'a>,
}

/// List the recognized object records directly under `section`.
pub fn list(section: NodeCursor<'_>) -> Result<Objects<'_>> {
    Ok(Objects {
        children: section.children()?,
    })
}

impl<'a> Iterator for Objects<'a> {
    type Item = Result<ObjectEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = match self.children.next()? {
                Ok(node) => node,
                Err(e) => return Some(Err(e)),
            };
            match node.name_bytes() {
                Ok(name) => {
                    if let Some(kind) = ObjectKind::from_name(name) {
                        return Some(Ok(ObjectEntry { kind, node }));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl FusedIterator for Objects<'_> {}

impl Document<'_> {
    /// Objects of the top-level `Objects` section, if the document has one.
    pub fn objects(&self) -> Result<Option<Objects<'_>>> {
        match self.find(OBJECTS_SECTION)? {
            Some(section) => list(section).map(Some),
            None => Ok(None),
        }
    }
}
