//! Benchmark for program save and load.
//!
//! Builds a synthetic program of many nested command stacks and times the JSON
//! and compressed save paths plus loading with and without ID remapping.

use std::time::Instant;

use blockgraph::{
    BlockGraph, BlockId, ConnectorRef, GenusRegistry, IdMapping, LinkChecker, StubKind, load_program,
    load_program_bytes, save_program, save_program_compressed, validate_graph,
};

const LANGUAGE: &str = r#"{
  "BlockGenuses": [
    { "name": "number", "kind": "data", "initlabel": "0", "editable-label": true,
      "BlockConnectors": [ { "connector-kind": "plug", "connector-type": "number" } ] },
    { "name": "text", "kind": "data", "initlabel": "", "editable-label": true,
      "BlockConnectors": [ { "connector-kind": "plug", "connector-type": "string" } ] },
    { "name": "plus", "kind": "function", "initlabel": "+", "is-infix": true,
      "BlockConnectors": [
        { "connector-kind": "plug", "connector-type": "number" },
        { "connector-kind": "socket", "connector-type": "number" },
        { "connector-kind": "socket", "connector-type": "number" }
      ] },
    { "name": "print", "kind": "command", "initlabel": "print",
      "BlockConnectors": [ { "connector-kind": "socket", "connector-type": "string" } ] },
    { "name": "repeat", "kind": "command", "initlabel": "repeat",
      "BlockConnectors": [
        { "connector-kind": "socket", "connector-type": "number", "label": "times" },
        { "connector-kind": "socket", "connector-type": "cmd", "label": "do" }
      ] },
    { "name": "getter", "kind": "data",
      "BlockConnectors": [ { "connector-kind": "plug", "connector-type": "poly" } ] },
    { "name": "variable", "kind": "variable", "initlabel": "v", "label-unique": true,
      "BlockConnectors": [ { "connector-kind": "socket", "connector-type": "number" } ],
      "Stubs": [ { "stub-genus": "getter" } ] }
  ]
}"#;

/// One loop: repeat(times: a + b) { print(text) x body_len }.
fn build_loop(graph: &mut BlockGraph, checker: &LinkChecker, index: usize, body_len: usize) -> BlockId {
    let repeat = graph.create_block("repeat").expect("repeat");
    let plus = graph.create_block("plus").expect("plus");
    let a = graph.create_block("number").expect("number");
    let b = graph.create_block("number").expect("number");
    graph.set_label(a, &index.to_string()).expect("label");
    graph.set_label(b, "1").expect("label");
    checker
        .connect(graph, ConnectorRef::socket(repeat, 0), ConnectorRef::plug(plus))
        .expect("connect");
    checker
        .connect(graph, ConnectorRef::socket(plus, 0), ConnectorRef::plug(a))
        .expect("connect");
    checker
        .connect(graph, ConnectorRef::socket(plus, 1), ConnectorRef::plug(b))
        .expect("connect");

    let mut previous = ConnectorRef::socket(repeat, 1);
    for line in 0..body_len {
        let print = graph.create_block("print").expect("print");
        let text = graph.create_block("text").expect("text");
        graph.set_label(text, &format!("line {} of loop {}", line, index)).expect("label");
        checker
            .connect(graph, ConnectorRef::socket(print, 0), ConnectorRef::plug(text))
            .expect("connect");
        checker.connect(graph, previous, ConnectorRef::before(print)).expect("connect");
        previous = ConnectorRef::after(print);
    }
    repeat
}

fn build_program(loops: usize, body_len: usize) -> BlockGraph {
    let genera = GenusRegistry::from_json(LANGUAGE).expect("Failed to load language");
    let mut graph = BlockGraph::new(genera);
    let checker = LinkChecker::with_builtin_rules();
    for index in 0..loops {
        build_loop(&mut graph, &checker, index, body_len);
        if index % 10 == 0 {
            let var = graph.create_block("variable").expect("variable");
            for _ in 0..4 {
                graph.create_stub(var, StubKind::Getter).expect("stub");
            }
        }
    }
    graph
}

fn main() {
    let loops: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(2_000);
    let body_len = 8;

    let build_start = Instant::now();
    let graph = build_program(loops, body_len);
    let build_time = build_start.elapsed();
    println!("Built {} blocks in {:?}", graph.len(), build_time);

    // Benchmark saving (JSON)
    let save_start = Instant::now();
    let saved = save_program(&graph).expect("Failed to save");
    let save_time = save_start.elapsed();
    println!("\nJSON: {} bytes in {:?}", saved.len(), save_time);
    println!(
        "  Throughput: {:.2} MB/s",
        (saved.len() as f64 / 1_000_000.0) / save_time.as_secs_f64()
    );

    // Benchmark saving (compressed)
    let compress_start = Instant::now();
    let compressed = save_program_compressed(&graph).expect("Failed to compress");
    let compress_time = compress_start.elapsed();
    println!("\nCompressed: {} bytes in {:?}", compressed.len(), compress_time);
    println!(
        "  Compression ratio: {:.1}x",
        saved.len() as f64 / compressed.len() as f64
    );

    // Baseline: parsing the JSON without building blocks
    let parse_start = Instant::now();
    let value: serde_json::Value = serde_json::from_str(&saved).expect("Failed to parse");
    let parse_time = parse_start.elapsed();
    let listed = value["BlockGraph"]["Blocks"].as_array().map_or(0, Vec::len);
    println!("\nParse only: {} records in {:?}", listed, parse_time);

    // Benchmark loading (same IDs)
    let mut copy = BlockGraph::new(graph.genera().clone());
    let load_start = Instant::now();
    let ids = load_program(&mut copy, &saved, None).expect("Failed to load");
    let load_time = load_start.elapsed();
    println!("Load: {} blocks in {:?}", ids.len(), load_time);
    println!(
        "  Overhead vs parse: {:.1}x",
        load_time.as_secs_f64() / parse_time.as_secs_f64()
    );
    validate_graph(&copy).expect("Loaded graph is inconsistent");

    // Benchmark loading with remapping, as a paste into a live graph
    let remap_start = Instant::now();
    let pasted = load_program(&mut copy, &saved, Some(&mut IdMapping::default())).expect("Failed to paste");
    let remap_time = remap_start.elapsed();
    println!("Paste (remapped): {} blocks in {:?}", pasted.len(), remap_time);
    assert_eq!(copy.len(), 2 * graph.len(), "Paste should not collide with loaded blocks");

    // Benchmark loading (compressed)
    let mut from_bytes = BlockGraph::new(graph.genera().clone());
    let bytes_start = Instant::now();
    load_program_bytes(&mut from_bytes, &compressed, None).expect("Failed to load compressed");
    let bytes_time = bytes_start.elapsed();
    println!("Load (compressed): {} blocks in {:?}", from_bytes.len(), bytes_time);

    // Verify the save format is stable across a round trip
    let resaved = save_program(&from_bytes).expect("Failed to resave");
    assert_eq!(saved, resaved, "Round trip should reproduce the saved program");
    println!("\nRound trip is exact");
}
