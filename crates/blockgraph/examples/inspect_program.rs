//! Simple inspector for saved block programs.
//!
//! Usage: inspect_program <language.json> <program.json|program.bgz>

use std::fs;

use blockgraph::{Block, BlockGraph, ConnectorSlot, GenusRegistry, load_program_bytes, validate_graph};

fn format_label(label: &str) -> String {
    let preview: String = label.chars().take(40).collect();
    if label.chars().count() > 40 {
        format!("\"{}...\"", preview)
    } else {
        format!("\"{}\"", preview)
    }
}

fn format_slot(slot: ConnectorSlot) -> String {
    match slot {
        ConnectorSlot::Plug => "plug".to_string(),
        ConnectorSlot::Before => "before".to_string(),
        ConnectorSlot::After => "after".to_string(),
        ConnectorSlot::Socket(i) => format!("socket[{}]", i),
    }
}

fn print_block(graph: &BlockGraph, block: &Block) {
    let variant = if block.is_stub() { " (stub)" } else { "" };
    let shown = match graph.genera().lookup(block.genus_name()) {
        Some(genus) => genus.decorated_label(block.label()),
        None => block.label().to_string(),
    };
    println!("[{}] {}{} {}", block.id(), block.genus_name(), variant, format_label(&shown));
    if let Some(page) = block.page_label() {
        println!("      page label: {}", format_label(page));
    }
    if let Some(message) = block.error_message() {
        println!("      error: {}", message);
    }
    for slot in block.slots() {
        if let Some(connector) = block.connector(slot) {
            match connector.occupant() {
                Some(occupant) => println!("      {} {} -> {}", format_slot(slot), connector.kind, occupant),
                None => println!("      {} {}", format_slot(slot), connector.kind),
            }
        }
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let (Some(language_path), Some(program_path)) = (args.next(), args.next()) else {
        eprintln!("usage: inspect_program <language.json> <program>");
        std::process::exit(2);
    };

    let language = fs::read_to_string(&language_path).expect("Failed to read language");
    let genera = GenusRegistry::from_json(&language).expect("Failed to load language");
    println!("Language: {} genera", genera.len());
    if let Some(fingerprint) = genera.fingerprint_hex() {
        println!("Fingerprint: {}", fingerprint);
    }

    println!("Reading: {}", program_path);
    let data = fs::read(&program_path).expect("Failed to read program");
    println!("File size: {} bytes", data.len());

    let mut graph = BlockGraph::new(genera);
    let ids = load_program_bytes(&mut graph, &data, None).expect("Failed to load program");

    let stubs = ids
        .iter()
        .filter(|id| graph.block(**id).is_some_and(Block::is_stub))
        .count();
    println!("\n=== Blocks ({}) ===", ids.len());
    println!("  Plain: {}", ids.len() - stubs);
    println!("  Stubs: {}", stubs);

    let roots: Vec<_> = ids.iter().filter(|id| graph.parent_of(**id).is_none()).collect();
    println!("  Top-level: {}", roots.len());

    println!("\n=== First 20 Blocks (detail) ===");
    for id in ids.iter().take(20) {
        if let Some(block) = graph.block(*id) {
            print_block(&graph, block);
        }
    }
    if ids.len() > 20 {
        println!("... and {} more blocks", ids.len() - 20);
    }

    match validate_graph(&graph) {
        Ok(()) => println!("\nGraph is consistent"),
        Err(e) => println!("\nGraph is inconsistent: {}", e),
    }
}
