//! Data model: block IDs, connectors, blocks and the graph arena.
//!
//! - Identifiers and their allocation
//! - Connectors (typed attachment points)
//! - Blocks (genus instances)
//! - The [`BlockGraph`] arena that owns every block
//! - State snapshots for undo/redo

pub mod block;
pub mod complaints;
pub mod connector;
pub mod graph;
pub mod id;
pub mod state;

pub use block::{Block, BlockVariant};
pub use complaints::Complaints;
pub use connector::{
    Connector, ConnectorRef, ConnectorRole, ConnectorShape, ConnectorSlot, DefaultArg, PositionType,
};
pub use graph::{ArgumentPredicate, BlockGraph, is_argument_socket};
pub use id::{BlockId, IdAllocator, IdMapping, remap};
pub use state::BlockState;
