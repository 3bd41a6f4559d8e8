// Inspect a binary FBX file from the command line.
// Run with: cargo run --release --bin fbx_dump -- <file.fbx> [tree|json|objects|stats]

use std::env;
use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use fbx_core::{dump, Document, NodeCursor};
use serde_json::{json, Value};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <file.fbx> [tree|json|objects|stats]", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let mode = args.get(2).map(String::as_str).unwrap_or("tree");

    let doc = Document::open(path).with_context(|| format!("Failed to open {}", path))?;
    log::info!(
        "Loaded {} (FBX {}, {} bytes)",
        path,
        doc.version(),
        doc.buffer().len()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match mode {
        "tree" => dump::write_tree(&doc, &mut out)?,
        "json" => {
            let nodes = doc
                .root()
                .map(|node| node_json(node?))
                .collect::<Result<Vec<_>>>()?;
            serde_json::to_writer_pretty(&mut out, &json!({ "version": doc.version(), "nodes": nodes }))?;
            writeln!(out)?;
        }
        "objects" => print_objects(&doc, &mut out)?,
        "stats" => {
            let stats = doc.stats()?;
            writeln!(out, "Nodes: {}", stats.nodes)?;
            writeln!(out, "Properties: {}", stats.properties)?;
            writeln!(out, "Max depth: {}", stats.max_depth)?;
            writeln!(
                out,
                "Arrays: {} ({} compressed)",
                stats.arrays, stats.compressed_arrays
            )?;
            writeln!(out, "String bytes: {}", stats.string_bytes)?;
        }
        other => bail!("Unknown mode '{}', expected tree, json, objects or stats", other),
    }

    Ok(())
}

fn node_json(node: NodeCursor<'_>) -> Result<Value> {
    let mut properties = Vec::new();
    for prop in node.properties()? {
        let prop = prop?;
        let mut entry = json!({
            "kind": (prop.kind() as char).to_string(),
            "type": prop.property_type().name(),
            "value": serde_json::to_value(prop.render()?)?,
        });
        if prop.property_type().is_array() {
            entry["array"] = serde_json::to_value(prop.array_header()?)?;
        }
        properties.push(entry);
    }

    let children = node
        .children()?
        .map(|child| node_json(child?))
        .collect::<Result<Vec<_>>>()?;

    Ok(json!({
        "name": String::from_utf8_lossy(node.name_bytes()?),
        "offset": node.offset(),
        "end": node.end_offset_field()?,
        "properties": properties,
        "children": children,
    }))
}

fn print_objects<W: Write>(doc: &Document<'_>, out: &mut W) -> Result<()> {
    let Some(objects) = doc.objects()? else {
        log::warn!("No Objects section found");
        return Ok(());
    };

    for entry in objects {
        let entry = entry?;
        writeln!(
            out,
            "  {} ({})",
            String::from_utf8_lossy(entry.node.name_bytes()?),
            entry.kind.name()
        )?;
        for prop in entry.node.properties()? {
            writeln!(out, "      p {}", prop?.render()?)?;
        }
        for child in entry.node.children()? {
            let child = child?;
            writeln!(out, "    {}", String::from_utf8_lossy(child.name_bytes()?))?;
            for prop in child.properties()? {
                writeln!(out, "      p {}", prop?.render()?)?;
            }
        }
    }
    Ok(())
}
