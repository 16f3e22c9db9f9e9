//! Block instances.

use std::collections::BTreeMap;

use crate::genus::Genus;
use crate::model::{BlockId, Connector, ConnectorSlot};
use crate::stub::StubInfo;

/// Plain block or stub of a declaration block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockVariant {
    Plain,
    Stub(StubInfo),
}

/// A mutable instance of a genus.
///
/// Blocks are owned by a [`crate::BlockGraph`]; every mutation that can reach
/// other blocks goes through the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) genus: String,
    pub(crate) label: String,
    pub(crate) page_label: Option<String>,
    pub(crate) sockets: Vec<Connector>,
    pub(crate) plug: Option<Connector>,
    pub(crate) before: Option<Connector>,
    pub(crate) after: Option<Connector>,
    pub(crate) properties: BTreeMap<String, String>,
    /// Present when the block is bad.
    pub(crate) error: Option<String>,
    pub(crate) focus: bool,
    pub(crate) variant: BlockVariant,
}

impl Block {
    /// Builds a block with fresh copies of every connector template of `genus`.
    pub(crate) fn from_genus(id: BlockId, genus: &Genus, variant: BlockVariant) -> Self {
        Self {
            id,
            genus: genus.name.clone(),
            label: genus.initial_label.clone(),
            page_label: None,
            sockets: genus.sockets.iter().map(Connector::template).collect(),
            plug: genus.plug.as_ref().map(Connector::template),
            before: genus.before.as_ref().map(Connector::template),
            after: genus.after.as_ref().map(Connector::template),
            properties: BTreeMap::new(),
            error: None,
            focus: false,
            variant,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn genus_name(&self) -> &str {
        &self.genus
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn page_label(&self) -> Option<&str> {
        self.page_label.as_deref()
    }

    pub fn sockets(&self) -> &[Connector] {
        &self.sockets
    }

    pub fn socket(&self, index: usize) -> Option<&Connector> {
        self.sockets.get(index)
    }

    pub fn num_sockets(&self) -> usize {
        self.sockets.len()
    }

    pub fn plug(&self) -> Option<&Connector> {
        self.plug.as_ref()
    }

    pub fn before(&self) -> Option<&Connector> {
        self.before.as_ref()
    }

    pub fn after(&self) -> Option<&Connector> {
        self.after.as_ref()
    }

    /// Block-level property override.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn is_bad(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_focus(&self) -> bool {
        self.focus
    }

    pub fn variant(&self) -> &BlockVariant {
        &self.variant
    }

    pub fn stub(&self) -> Option<&StubInfo> {
        match &self.variant {
            BlockVariant::Stub(info) => Some(info),
            BlockVariant::Plain => None,
        }
    }

    pub fn is_stub(&self) -> bool {
        self.stub().is_some()
    }

    pub fn connector(&self, slot: ConnectorSlot) -> Option<&Connector> {
        match slot {
            ConnectorSlot::Plug => self.plug.as_ref(),
            ConnectorSlot::Before => self.before.as_ref(),
            ConnectorSlot::After => self.after.as_ref(),
            ConnectorSlot::Socket(index) => self.sockets.get(index),
        }
    }

    pub(crate) fn connector_mut(&mut self, slot: ConnectorSlot) -> Option<&mut Connector> {
        match slot {
            ConnectorSlot::Plug => self.plug.as_mut(),
            ConnectorSlot::Before => self.before.as_mut(),
            ConnectorSlot::After => self.after.as_mut(),
            ConnectorSlot::Socket(index) => self.sockets.get_mut(index),
        }
    }

    /// Every slot that currently holds a connector: plug, before, after, then
    /// sockets in order.
    pub fn slots(&self) -> Vec<ConnectorSlot> {
        let mut slots = Vec::with_capacity(self.sockets.len() + 3);
        if self.plug.is_some() {
            slots.push(ConnectorSlot::Plug);
        }
        if self.before.is_some() {
            slots.push(ConnectorSlot::Before);
        }
        if self.after.is_some() {
            slots.push(ConnectorSlot::After);
        }
        slots.extend((0..self.sockets.len()).map(ConnectorSlot::Socket));
        slots
    }

    /// The slot whose occupant is `other`.
    pub fn connector_to(&self, other: BlockId) -> Option<ConnectorSlot> {
        self.slots()
            .into_iter()
            .find(|slot| self.connector(*slot).and_then(Connector::occupant) == Some(other))
    }

    /// The first slot holding any occupant.
    pub(crate) fn first_occupied(&self) -> Option<ConnectorSlot> {
        self.slots()
            .into_iter()
            .find(|slot| self.connector(*slot).is_some_and(Connector::has_block))
    }

    /// Every block attached to this one.
    pub fn neighbors(&self) -> Vec<BlockId> {
        self.slots()
            .into_iter()
            .filter_map(|slot| self.connector(slot).and_then(Connector::occupant))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_registry;

    #[test]
    fn test_from_genus_copies_templates() {
        let registry = sample_registry();
        let genus = registry.lookup("print").unwrap();
        let mut a = Block::from_genus(1, genus, BlockVariant::Plain);
        let b = Block::from_genus(2, genus, BlockVariant::Plain);
        a.sockets[0].label = "changed".to_string();
        assert_eq!(b.sockets[0].label, "value");
        assert_eq!(genus.sockets[0].label, "value");
        assert_eq!(a.label(), "print");
        assert_eq!(
            a.slots(),
            vec![ConnectorSlot::Before, ConnectorSlot::After, ConnectorSlot::Socket(0)]
        );
    }

    #[test]
    fn test_connector_to() {
        let registry = sample_registry();
        let mut block = Block::from_genus(1, registry.lookup("print").unwrap(), BlockVariant::Plain);
        block.sockets[0].set_occupant(Some(9));
        assert_eq!(block.connector_to(9), Some(ConnectorSlot::Socket(0)));
        assert_eq!(block.connector_to(8), None);
        assert_eq!(block.first_occupied(), Some(ConnectorSlot::Socket(0)));
        assert_eq!(block.neighbors(), vec![9]);
    }
}
