//! FBX Core - lazy traversal of binary FBX documents.
//!
//! This crate walks node records and their typed property lists directly in
//! the file's byte buffer, without building a tree:
//!
//! - **Document**: header validation and discovery of the top-level records
//! - **Cursors**: `NodeCursor` / `PropertyCursor` over the raw bytes, with
//!   `NodeRange` / `PropertyRange` iterators
//! - **Inspection**: property rendering, a text dump, object listing and
//!   parallel statistics
//!
//! Array payloads are never decoded; compressed arrays are reported as such.
//!
//! # Example
//!
//! ```ignore
//! use fbx_core::Document;
//!
//! let doc = Document::open("cube.fbx")?;
//! for node in doc.root() {
//!     let node = node?;
//!     println!("{}", node.name()?);
//!     for prop in node.properties()? {
//!         println!("  {}", prop?.render()?);
//!     }
//! }
//! ```

pub mod bytes;
pub mod document;
pub mod dump;
pub mod error;
pub mod node;
pub mod objects;
pub mod property;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_util;

// Re-export commonly used types
pub use document::Document;
pub use error::{Error, ErrorKind, Result};
pub use node::{NodeCursor, NodeRange};
pub use objects::{ObjectEntry, ObjectKind};
pub use property::{ArrayHeader, PropertyCursor, PropertyRange, PropertyType, PropertyValue};
pub use stats::TreeStats;
