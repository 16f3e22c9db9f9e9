//! Joining connectors.
//!
//! A [`Link`] is an oriented pair (plug side, socket side) that performs the
//! mutation. The [`LinkChecker`] decides whether a pair may join by running an
//! ordered list of [`LinkRule`]s and, after a join, its [`ConnectHook`]s.

mod checker;
pub mod rules;

pub use checker::{ConnectorGeometry, LinkChecker};

use tracing::debug;

use crate::error::GraphError;
use crate::model::{Block, BlockGraph, BlockId, Connector, ConnectorRef, ConnectorSlot};

/// Whether a rule can veto a link or only vote for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    /// Every mandatory rule must approve.
    Mandatory,
    /// At least one advisory rule must approve.
    Advisory,
}

/// One end of a prospective link, resolved against the graph.
#[derive(Debug, Clone, Copy)]
pub struct LinkSide<'a> {
    pub block: &'a Block,
    pub slot: ConnectorSlot,
    pub connector: &'a Connector,
}

impl<'a> LinkSide<'a> {
    pub fn resolve(graph: &'a BlockGraph, at: ConnectorRef) -> Option<Self> {
        let block = graph.block(at.block)?;
        let connector = block.connector(at.slot)?;
        Some(Self {
            block,
            slot: at.slot,
            connector,
        })
    }

    pub fn at(&self) -> ConnectorRef {
        ConnectorRef::new(self.block.id(), self.slot)
    }

    pub fn is_plug_side(&self) -> bool {
        self.slot.is_plug_side()
    }
}

/// A compatibility predicate over two connectors.
///
/// Rules must be symmetric: swapping `a` and `b` never changes the answer.
pub trait LinkRule {
    fn name(&self) -> &str;

    fn category(&self) -> RuleCategory {
        RuleCategory::Advisory
    }

    fn can_link(&self, graph: &BlockGraph, a: &LinkSide<'_>, b: &LinkSide<'_>) -> bool;
}

/// Runs after a successful connect. `displaced` is the block that occupied the
/// socket side before the join.
pub trait ConnectHook {
    fn name(&self) -> &str;

    fn connected(&self, graph: &mut BlockGraph, link: &Link, displaced: Option<BlockId>) -> Result<(), GraphError>;
}

/// An oriented connector pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    plug: ConnectorRef,
    socket: ConnectorRef,
}

impl Link {
    /// Orients two connectors into a link. Exactly one of them must be on the
    /// plug side.
    pub fn between(graph: &BlockGraph, a: ConnectorRef, b: ConnectorRef) -> Result<Self, GraphError> {
        graph.connector(a)?;
        graph.connector(b)?;
        match (a.slot.is_plug_side(), b.slot.is_plug_side()) {
            (true, false) => Ok(Self { plug: a, socket: b }),
            (false, true) => Ok(Self { plug: b, socket: a }),
            _ => Err(GraphError::InvalidLink { a, b }),
        }
    }

    pub fn plug(&self) -> ConnectorRef {
        self.plug
    }

    pub fn socket(&self) -> ConnectorRef {
        self.socket
    }

    pub fn plug_block(&self) -> BlockId {
        self.plug.block
    }

    pub fn socket_block(&self) -> BlockId {
        self.socket.block
    }

    /// Joins the pair. A block already in the socket side is disconnected
    /// first and returned.
    pub fn connect(&self, graph: &mut BlockGraph) -> Result<Option<BlockId>, GraphError> {
        if let Some(occupant) = graph.connector(self.plug)?.occupant() {
            return Err(GraphError::PlugOccupied {
                plug: self.plug,
                occupant,
            });
        }
        let displaced = graph.release(self.socket, false)?;
        // A replaced occupant leaves its expand group already grown.
        graph.attach(self.plug, self.socket, displaced.is_none())?;
        if let Some(displaced) = displaced {
            debug!(displaced, socket = ?self.socket, "displaced occupant");
        }
        Ok(displaced)
    }

    /// Clears both sides of the pair.
    pub fn disconnect(&self, graph: &mut BlockGraph) -> Result<(), GraphError> {
        let occupant = graph.connector(self.plug)?.occupant();
        let back = graph.connector(self.socket)?.occupant();
        if occupant != Some(self.socket.block) || back != Some(self.plug.block) {
            return Err(GraphError::BrokenReciprocity {
                at: self.plug,
                occupant: occupant.unwrap_or(self.socket.block),
            });
        }
        graph.detach(self.plug, self.socket, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_graph;

    #[test]
    fn test_orientation() {
        let mut graph = sample_graph();
        let print = graph.create_block("print").unwrap();
        let text = graph.create_block("text").unwrap();
        let socket = ConnectorRef::socket(print, 0);
        let plug = ConnectorRef::plug(text);

        let forward = Link::between(&graph, socket, plug).unwrap();
        let backward = Link::between(&graph, plug, socket).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.plug(), plug);
        assert_eq!(forward.socket_block(), print);

        assert!(matches!(
            Link::between(&graph, socket, ConnectorRef::after(print)),
            Err(GraphError::InvalidLink { .. })
        ));
        assert!(matches!(
            Link::between(&graph, ConnectorRef::plug(print), socket),
            Err(GraphError::MissingConnector { .. })
        ));
    }

    #[test]
    fn test_connect_is_reciprocal() {
        let mut graph = sample_graph();
        let print = graph.create_block("print").unwrap();
        let text = graph.create_block("text").unwrap();
        let link = Link::between(&graph, ConnectorRef::socket(print, 0), ConnectorRef::plug(text)).unwrap();

        assert_eq!(link.connect(&mut graph).unwrap(), None);
        assert_eq!(graph.connector_to(print, text), Some(ConnectorSlot::Socket(0)));
        assert_eq!(graph.connector_to(text, print), Some(ConnectorSlot::Plug));

        link.disconnect(&mut graph).unwrap();
        assert!(!graph.block(print).unwrap().socket(0).unwrap().has_block());
        assert!(!graph.block(text).unwrap().plug().unwrap().has_block());
        assert!(link.disconnect(&mut graph).is_err());
    }

    #[test]
    fn test_connect_displaces_occupant() {
        let mut graph = sample_graph();
        let print = graph.create_block("print").unwrap();
        let first = graph.create_block("text").unwrap();
        let second = graph.create_block("text").unwrap();
        Link::between(&graph, ConnectorRef::socket(print, 0), ConnectorRef::plug(first))
            .unwrap()
            .connect(&mut graph)
            .unwrap();

        let link = Link::between(&graph, ConnectorRef::socket(print, 0), ConnectorRef::plug(second)).unwrap();
        assert_eq!(link.connect(&mut graph).unwrap(), Some(first));
        assert!(!graph.block(first).unwrap().plug().unwrap().has_block());
        assert_eq!(graph.block(print).unwrap().socket(0).unwrap().occupant(), Some(second));
    }

    #[test]
    fn test_occupied_plug_is_an_error() {
        let mut graph = sample_graph();
        let a = graph.create_block("print").unwrap();
        let b = graph.create_block("print").unwrap();
        let text = graph.create_block("text").unwrap();
        Link::between(&graph, ConnectorRef::socket(a, 0), ConnectorRef::plug(text))
            .unwrap()
            .connect(&mut graph)
            .unwrap();
        let link = Link::between(&graph, ConnectorRef::socket(b, 0), ConnectorRef::plug(text)).unwrap();
        assert_eq!(
            link.connect(&mut graph),
            Err(GraphError::PlugOccupied {
                plug: ConnectorRef::plug(text),
                occupant: a
            })
        );
    }
}
