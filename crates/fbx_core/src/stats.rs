//! Whole-document statistics.
//!
//! Each top-level record bounds its own subtree, so the subtrees are walked
//! independently in parallel using rayon and the results reduced.

use rayon::prelude::*;
use serde::Serialize;

use crate::document::Document;
use crate::error::Result;
use crate::node::NodeCursor;
use crate::property::PropertyType;

/// Counts gathered over a document or subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    /// Node records, sentinels excluded
    pub nodes: usize,
    pub properties: usize,
    /// Depth of the deepest record (top level is 1)
    pub max_depth: usize,
    pub arrays: usize,
    pub compressed_arrays: usize,
    /// Total payload bytes of string properties
    pub string_bytes: usize,
}

impl TreeStats {
    /// Combine counts from two disjoint subtrees.
    pub fn merge(self, other: TreeStats) -> TreeStats {
        TreeStats {
            nodes: self.nodes + other.nodes,
            properties: self.properties + other.properties,
            max_depth: self.max_depth.max(other.max_depth),
            arrays: self.arrays + other.arrays,
            compressed_arrays: self.compressed_arrays + other.compressed_arrays,
            string_bytes: self.string_bytes + other.string_bytes,
        }
    }
}

/// Statistics for `node` and everything nested under it.
pub fn subtree_stats(node: NodeCursor<'_>, depth: usize) -> Result<TreeStats> {
    let mut stats = TreeStats {
        nodes: 1,
        max_depth: depth,
        ..Default::default()
    };

    for prop in node.properties()? {
        let prop = prop?;
        stats.properties += 1;
        let ty = prop.property_type();
        if ty.is_array() {
            stats.arrays += 1;
            if prop.array_header()?.is_compressed() {
                stats.compressed_arrays += 1;
            }
        } else if ty == PropertyType::String {
            stats.string_bytes += prop.raw_bytes()?.len();
        }
    }

    for child in node.children()? {
        stats = stats.merge(subtree_stats(child?, depth + 1)?);
    }
    Ok(stats)
}

impl Document<'_> {
    /// Summarize the whole document.
    pub fn stats(&self) -> Result<TreeStats> {
        let top_level: Vec<NodeCursor<'_>> = self.root().collect::<Result<_>>()?;
        let stats = top_level
            .par_iter()
            .map(|node| subtree_stats(*node, 1))
            .try_reduce(TreeStats::default, |a, b| Ok(a.merge(b)))?;

        log::debug!(
            "Scanned {} nodes, {} properties across {} top-level records",
            stats.nodes,
            stats.properties,
            top_level.len()
        );
        Ok(stats)
    }
}
