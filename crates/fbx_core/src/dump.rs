//! Indented text dump of a document, one line per record and per property.
//!
//! ```text
//! 0000001b..000000f2 FBXHeaderExtension
//!   0000003a..00000056 FBXHeaderVersion
//!      I 1003
//! ```

use std::io::Write;

use crate::document::Document;
use crate::error::Result;
use crate::node::NodeCursor;

/// Write every record of `doc` to `out`.
pub fn write_tree<W: Write>(doc: &Document<'_>, out: &mut W) -> Result<()> {
    for node in doc.root() {
        write_node(node?, 0, out)?;
    }
    Ok(())
}

/// Write `node` and its subtree, indented two spaces per `depth`.
pub fn write_node<W: Write>(node: NodeCursor<'_>, depth: usize, out: &mut W) -> Result<()> {
    let indent = depth * 2;
    writeln!(
        out,
        "{:indent$}{:08x}..{:08x} {}",
        "",
        node.offset(),
        node.end_offset_field()?,
        String::from_utf8_lossy(node.name_bytes()?)
    )?;

    let mut count = 0u32;
    for prop in node.properties()? {
        let prop = prop?;
        writeln!(out, "{:indent$}   {} {}", "", prop.kind() as char, prop.render()?)?;
        count += 1;
    }

    let declared = node.num_properties()?;
    if count != declared {
        log::warn!(
            "Record {} at {:#x} declares {} properties but holds {}",
            String::from_utf8_lossy(node.name_bytes()?),
            node.offset(),
            declared,
            count
        );
    }

    for child in node.children()? {
        write_node(child?, depth + 1, out)?;
    }
    Ok(())
}
