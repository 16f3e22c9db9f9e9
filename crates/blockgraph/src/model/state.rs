//! Block state snapshots for undo/redo.
//!
//! A snapshot records occupancy as raw IDs. Restoring writes them back without
//! touching the neighbours, so an undo step restores every block it touched.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::GraphError;
use crate::model::{BlockGraph, BlockId, Connector};
use crate::notify::RenderEvent;
use crate::stub::StubKey;

/// Everything `restore` writes back: connectors are kept whole, occupant
/// included.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockState {
    pub genus: String,
    pub label: String,
    pub page_label: Option<String>,
    pub error: Option<String>,
    pub focus: bool,
    pub properties: BTreeMap<String, String>,
    pub plug: Option<Connector>,
    pub before: Option<Connector>,
    pub after: Option<Connector>,
    pub sockets: Vec<Connector>,
}

impl BlockGraph {
    /// Captures the block's state, occupants included, for a later `restore`.
    pub fn snapshot(&self, id: BlockId) -> Result<BlockState, GraphError> {
        let block = self.get(id)?;
        Ok(BlockState {
            genus: block.genus.clone(),
            label: block.label.clone(),
            page_label: block.page_label.clone(),
            error: block.error.clone(),
            focus: block.focus,
            properties: block.properties.clone(),
            plug: block.plug.clone(),
            before: block.before.clone(),
            after: block.after.clone(),
            sockets: block.sockets.clone(),
        })
    }

    /// Writes a snapshot back. The socket list grows or shrinks to the
    /// snapshot's count.
    pub fn restore(&mut self, id: BlockId, state: &BlockState) -> Result<(), GraphError> {
        let block = self.get(id)?;
        let is_stub = block.is_stub();
        let old_key = StubKey::new(block.label.as_str(), block.genus.as_str());
        if !is_stub && state.genus != block.genus && self.genera().lookup(&state.genus).is_none() {
            return Err(GraphError::UnknownGenus {
                name: state.genus.clone(),
            });
        }
        let was_parent = self.stubs.is_parent(&old_key, id);

        let block = self.get_mut(id)?;
        if !is_stub {
            block.genus = state.genus.clone();
        }
        block.label = state.label.clone();
        block.page_label = state.page_label.clone();
        block.error = state.error.clone();
        block.focus = state.focus;
        block.properties = state.properties.clone();
        block.plug = state.plug.clone();
        block.before = state.before.clone();
        block.after = state.after.clone();
        block.sockets.truncate(state.sockets.len());
        for (index, socket) in state.sockets.iter().enumerate() {
            match block.sockets.get_mut(index) {
                Some(slot) => *slot = socket.clone(),
                None => block.sockets.push(socket.clone()),
            }
        }
        let new_key = StubKey::new(block.label.as_str(), block.genus.as_str());

        if was_parent && new_key != old_key {
            if new_key.genus == old_key.genus {
                // Undoing a rename takes the stubs back along.
                self.rename_parent(id, &old_key.name, &new_key.name)?;
            } else {
                self.stubs.remove_parent(&old_key, id);
                self.stubs.register_parent(new_key, id);
            }
        }
        debug!(id, sockets = state.sockets.len(), "restored block state");
        self.notify(id, RenderEvent::ConnectorChanged);
        Ok(())
    }
}
