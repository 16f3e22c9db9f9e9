//! Block-graph model for visual block languages.
//!
//! This crate holds the language-independent core of a block-based
//! programming editor: the schemas ("genera") blocks are made from, the block
//! instances and their typed connectors, the rule engine that decides which
//! connectors may join, the stubs that mirror declaration blocks, and the save
//! format that round-trips a program exactly.
//!
//! # Quick Start
//!
//! ```rust
//! use blockgraph::{BlockGraph, ConnectorRef, GenusRegistry, LinkChecker};
//! use blockgraph::codec::save_block;
//!
//! let language = r#"{
//!   "BlockGenuses": [
//!     { "name": "text", "kind": "data", "BlockConnectors": [
//!         { "connector-kind": "plug", "connector-type": "string" } ] },
//!     { "name": "print", "kind": "command", "BlockConnectors": [
//!         { "connector-kind": "socket", "connector-type": "string" } ] }
//!   ]
//! }"#;
//! let mut graph = BlockGraph::new(GenusRegistry::from_json(language).unwrap());
//! let print = graph.create_block("print").unwrap();
//! let text = graph.create_block("text").unwrap();
//!
//! let checker = LinkChecker::with_builtin_rules();
//! let socket = ConnectorRef::socket(print, 0);
//! let plug = ConnectorRef::plug(text);
//! assert!(checker.can_link(&graph, socket, plug));
//! checker.connect(&mut graph, socket, plug).unwrap();
//!
//! assert_eq!(graph.block(text).unwrap().plug().unwrap().occupant(), Some(print));
//! assert!(save_block(&graph, print).unwrap().contains("con-block-id"));
//! ```
//!
//! # Modules
//!
//! - [`genus`]: Genus schemas and the registry that loads them
//! - [`model`]: Block IDs, connectors, blocks and the [`BlockGraph`] arena
//! - [`stub`]: Stub registries and parent/stub synchronization
//! - [`link`]: Links, link rules and the [`LinkChecker`]
//! - [`codec`]: JSON save format, with optional zstd compression
//! - [`validate`]: Whole-graph invariant checks
//! - [`config`]: Runtime configuration
//! - [`error`]: Error types
//! - [`limits`]: Format constants and limits for untrusted input
//!
//! # Save Format
//!
//! Programs are JSON with fixed field names:
//! - Plain: `{"BlockGraph": {"language": ..., "Blocks": [...]}}`
//! - Compressed: `BGZ1` magic + uncompressed length + zstd data
//!
//! [`codec::load_program_bytes`] detects both.

pub mod codec;
pub mod config;
pub mod error;
pub mod genus;
pub mod limits;
pub mod link;
pub mod model;
pub mod notify;
pub mod stub;
pub mod validate;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types at crate root
pub use codec::{load_block, load_program, load_program_bytes, save_block, save_program, save_program_compressed};
pub use config::GraphConfig;
pub use error::{ConfigError, GraphError, LanguageError, LoadError, SaveError, ValidationError};
pub use genus::{Genus, GenusKind, GenusRegistry, StubKind};
pub use link::{ConnectHook, ConnectorGeometry, Link, LinkChecker, LinkRule, LinkSide, RuleCategory};
pub use model::{
    Block, BlockGraph, BlockId, BlockState, BlockVariant, Connector, ConnectorRef, ConnectorSlot, IdMapping,
    PositionType,
};
pub use notify::{RenderEvent, RenderNotifier};
pub use stub::{StubInfo, StubKey, StubRegistry};
pub use validate::validate_graph;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
