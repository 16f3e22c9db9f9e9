//! Error types for the block graph, language loading, persistence and validation.

use thiserror::Error;

use crate::genus::StubKind;
use crate::model::{BlockId, ConnectorRef, ConnectorSlot};

/// Structural error raised by a graph mutation.
///
/// These indicate a sequencing bug in the caller (connecting an occupied plug,
/// indexing past the socket list, ...) rather than a recoverable condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("block {id} does not exist")]
    UnknownBlock { id: BlockId },

    #[error("genus {name:?} is not defined by the loaded language")]
    UnknownGenus { name: String },

    #[error("block id {id} is already in use")]
    DuplicateBlockId { id: BlockId },

    #[error("socket index {index} out of range for block {block} ({count} sockets)")]
    SocketOutOfRange {
        block: BlockId,
        index: usize,
        count: usize,
    },

    #[error("block {block} has no {slot:?} connector")]
    MissingConnector { block: BlockId, slot: ConnectorSlot },

    #[error("plug side {plug:?} is already occupied by block {occupant}")]
    PlugOccupied { plug: ConnectorRef, occupant: BlockId },

    #[error("connectors {a:?} and {b:?} cannot form a link")]
    InvalidLink { a: ConnectorRef, b: ConnectorRef },

    #[error("connector {at:?} holds block {occupant}, which does not reference it back")]
    BrokenReciprocity { at: ConnectorRef, occupant: BlockId },

    #[error("label {label:?} is already used by another {genus:?} block")]
    DuplicateLabel { genus: String, label: String },

    #[error("default argument genus {genus:?} has neither a plug nor a before connector")]
    UnpluggableDefaultArgument { genus: String },

    #[error("stub block {id} cannot change genus")]
    StubGenusChange { id: BlockId },

    #[error("genus {genus:?} does not declare {kind:?} stubs")]
    StubKindNotDeclared { genus: String, kind: StubKind },

    #[error(
        "caller stub {stub} cannot be synchronized with block {parent}: expected {expected} argument sockets, found {found}"
    )]
    StubOutOfSync {
        stub: BlockId,
        parent: BlockId,
        expected: usize,
        found: usize,
    },
}

/// Error while loading a language description.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LanguageError {
    #[error("malformed language description: {0}")]
    Parse(String),

    #[error("genus {name:?} is defined more than once")]
    DuplicateGenus { name: String },

    #[error("genus {genus:?} declares more than one plug")]
    MultiplePlugs { genus: String },

    #[error("genus {genus:?} declares {stub:?} stubs but no generic {stub:?} genus exists")]
    MissingStubGenus { genus: String, stub: StubKind },

    #[error("family member {name:?} is not a known genus")]
    UnknownFamilyMember { name: String },

    #[error("genus {genus:?} references undeclared expand group {group:?}")]
    UnknownExpandGroup { genus: String, group: String },

    #[error("genus {genus:?} has a default argument of unknown genus {arg:?}")]
    UnknownDefaultArg { genus: String, arg: String },

    #[error("obsolete genus {name:?} is also defined as a live genus")]
    ObsoleteConflict { name: String },
}

/// Error while loading a saved program or block.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("malformed save data: {0}")]
    Parse(String),

    #[error("block {id} declares {declared} sockets but lists {actual}")]
    SocketCountMismatch {
        id: BlockId,
        declared: usize,
        actual: usize,
    },

    #[error("program size {len} exceeds maximum {max}")]
    TooLarge { len: usize, max: usize },

    #[error("program holds {count} blocks, maximum is {max}")]
    TooManyBlocks { count: usize, max: usize },

    #[error("invalid UTF-8 in program text")]
    InvalidUtf8,

    #[error("zstd decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("uncompressed size mismatch: declared {declared}, actual {actual}")]
    UncompressedSizeMismatch { declared: usize, actual: usize },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Error while saving a block or program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaveError {
    #[error("serialization failed: {0}")]
    Serialize(String),

    #[error("zstd compression failed: {0}")]
    CompressionFailed(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Invariant violation found by [`crate::validate::validate_graph`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("connector {at:?} references missing block {occupant}")]
    DanglingOccupant { at: ConnectorRef, occupant: BlockId },

    #[error("connector {at:?} holds block {occupant}, which has no connector back to it")]
    NotReciprocal { at: ConnectorRef, occupant: BlockId },

    #[error("connectors {a:?} and {b:?} are joined but are not one plug side and one socket side")]
    RoleMismatch { a: ConnectorRef, b: ConnectorRef },

    #[error("stub registry entry {id} does not refer to a live block of the right kind")]
    StaleRegistryEntry { id: BlockId },
}

/// Error while reading a [`crate::config::GraphConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Parse(String),
}
