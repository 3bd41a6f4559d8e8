//! Example: Open a binary FBX file and walk its top-level records.
//!
//! Run with: cargo run --example walk_fbx -- assets/cube.fbx

use std::env;

use fbx_core::{Document, PropertyType};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: walk_fbx <path-to-fbx-file>");
        println!("\nExamples:");
        println!("  cargo run --example walk_fbx -- assets/cube.fbx");
        return;
    }

    let path = &args[1];
    println!("Loading FBX file: {}", path);

    let doc = match Document::open(path) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error loading FBX file: {}", e);
            return;
        }
    };

    println!("\n=== {} ===", path);
    println!("Version: {}", doc.version());
    println!("Top-level records end at: {:#x}", doc.end_offset());

    println!("\n--- Top-level records ---");
    for node in doc.root() {
        let node = match node {
            Ok(node) => node,
            Err(e) => {
                eprintln!("  traversal stopped: {}", e);
                break;
            }
        };
        let name = node.name().unwrap_or_default();
        let children = node.children().map(|c| c.count()).unwrap_or(0);
        println!(
            "  {:08x} {} - {} properties, {} children",
            node.offset(),
            name,
            node.num_properties().unwrap_or(0),
            children
        );
    }

    if let Ok(Some(objects)) = doc.objects() {
        println!("\n--- Objects ---");
        for entry in objects.flatten() {
            let arrays = entry
                .node
                .children()
                .into_iter()
                .flatten()
                .flatten()
                .filter_map(|child| child.properties().ok())
                .flatten()
                .flatten()
                .filter(|p| p.property_type().is_array())
                .count();
            let label = entry
                .node
                .properties()
                .ok()
                .and_then(|mut props| {
                    props.find_map(|p| {
                        p.ok()
                            .filter(|p| p.property_type() == PropertyType::String)
                            .and_then(|p| p.render().ok())
                    })
                })
                .map(|v| v.to_string())
                .unwrap_or_default();
            println!("  {:?} {:?} - {} array properties", entry.kind, label, arrays);
        }
    }

    match doc.stats() {
        Ok(stats) => {
            println!("\n--- Statistics ---");
            println!("  Nodes: {}", stats.nodes);
            println!("  Properties: {}", stats.properties);
            println!("  Max depth: {}", stats.max_depth);
            println!(
                "  Arrays: {} ({} compressed)",
                stats.arrays, stats.compressed_arrays
            );
        }
        Err(e) => eprintln!("Error computing statistics: {}", e),
    }
}
