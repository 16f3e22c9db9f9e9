//! Built-in link rules and their post-connect hooks.

use tracing::debug;

use crate::error::GraphError;
use crate::link::{ConnectHook, Link, LinkRule, LinkSide, RuleCategory};
use crate::model::{BlockGraph, BlockId, Connector, ConnectorRef, ConnectorSlot};

/// Orders a pair as (plug side, socket side), or `None` when both sit on the
/// same side.
fn oriented<'s, 'a>(a: &'s LinkSide<'a>, b: &'s LinkSide<'a>) -> Option<(&'s LinkSide<'a>, &'s LinkSide<'a>)> {
    match (a.is_plug_side(), b.is_plug_side()) {
        (true, false) => Some((a, b)),
        (false, true) => Some((b, a)),
        _ => None,
    }
}

/// Refuses links that would join a block to itself or to its own subtree.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCycle;

impl LinkRule for NoCycle {
    fn name(&self) -> &str {
        "no-cycle"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Mandatory
    }

    fn can_link(&self, graph: &BlockGraph, a: &LinkSide<'_>, b: &LinkSide<'_>) -> bool {
        let (plug, socket) = match oriented(a, b) {
            Some(pair) => pair,
            None => return a.block.id() != b.block.id(),
        };
        plug.block.id() != socket.block.id() && !graph.is_ancestor(plug.block.id(), socket.block.id())
    }
}

/// Two empty connectors of opposite sides and equal kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct KindMatch;

impl LinkRule for KindMatch {
    fn name(&self) -> &str {
        "kind-match"
    }

    fn can_link(&self, _graph: &BlockGraph, a: &LinkSide<'_>, b: &LinkSide<'_>) -> bool {
        oriented(a, b).is_some()
            && !a.connector.has_block()
            && !b.connector.has_block()
            && a.connector.kind == b.connector.kind
    }
}

/// Command sequencing: an empty before connector into an after connector or
/// a statement socket, occupied or not. Inserting mid-sequence re-links the
/// remainder after the inserted run.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowMatch;

impl LinkRule for FlowMatch {
    fn name(&self) -> &str {
        "flow-match"
    }

    fn can_link(&self, _graph: &BlockGraph, a: &LinkSide<'_>, b: &LinkSide<'_>) -> bool {
        let Some((plug, socket)) = oriented(a, b) else {
            return false;
        };
        plug.slot == ConnectorSlot::Before
            && !plug.connector.has_block()
            && plug.connector.is_command()
            && socket.connector.is_command()
    }
}

impl ConnectHook for FlowMatch {
    fn name(&self) -> &str {
        "flow-match"
    }

    fn connected(&self, graph: &mut BlockGraph, link: &Link, displaced: Option<BlockId>) -> Result<(), GraphError> {
        let Some(displaced) = displaced else {
            return Ok(());
        };
        if link.plug().slot != ConnectorSlot::Before {
            return Ok(());
        }
        let displaced_before = ConnectorRef::before(displaced);
        if graph.connector(displaced_before).map_or(true, Connector::has_block) {
            return Ok(());
        }
        let tail = graph.sequence_tail(link.plug_block());
        let tail_after = ConnectorRef::after(tail);
        if graph.connector(tail_after).map_or(true, Connector::has_block) {
            return Ok(());
        }
        debug!(displaced, tail, "splicing displaced sequence after inserted run");
        graph.attach(displaced_before, tail_after, false)
    }
}

/// An infix block dropped onto an occupied socket wraps the occupant: the
/// infix plug takes the socket and the old occupant moves to the infix
/// block's first socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfixWrap;

impl LinkRule for InfixWrap {
    fn name(&self) -> &str {
        "infix-wrap"
    }

    fn can_link(&self, graph: &BlockGraph, a: &LinkSide<'_>, b: &LinkSide<'_>) -> bool {
        let Some((plug, socket)) = oriented(a, b) else {
            return false;
        };
        if plug.slot != ConnectorSlot::Plug || plug.connector.has_block() {
            return false;
        }
        if !matches!(socket.slot, ConnectorSlot::Socket(_)) {
            return false;
        }
        let Some(held) = socket.connector.occupant() else {
            return false;
        };
        let infix = graph.genus_of(plug.block.id()).is_ok_and(|g| g.is_infix);
        if !infix || plug.connector.kind != socket.connector.kind {
            return false;
        }
        let Some(first) = plug.block.socket(0) else {
            return false;
        };
        let held_plug = graph.block(held).and_then(|h| h.plug());
        !first.has_block() && held_plug.is_some_and(|p| p.kind == first.kind)
    }
}

impl ConnectHook for InfixWrap {
    fn name(&self) -> &str {
        "infix-wrap"
    }

    fn connected(&self, graph: &mut BlockGraph, link: &Link, displaced: Option<BlockId>) -> Result<(), GraphError> {
        let Some(displaced) = displaced else {
            return Ok(());
        };
        if link.plug().slot != ConnectorSlot::Plug || !graph.genus_of(link.plug_block())?.is_infix {
            return Ok(());
        }
        let first = ConnectorRef::socket(link.plug_block(), 0);
        let displaced_plug = ConnectorRef::plug(displaced);
        let free = graph.connector(first).is_ok_and(|c| !c.has_block())
            && graph.connector(displaced_plug).is_ok_and(|c| !c.has_block());
        if !free {
            return Ok(());
        }
        debug!(displaced, infix = link.plug_block(), "wrapping displaced block");
        graph.attach(displaced_plug, first, true)
    }
}
