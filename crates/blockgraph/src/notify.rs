//! Hook into the view layer.
//!
//! The graph never lays anything out; it only tells the renderer which block
//! needs attention after a mutation.

use crate::model::BlockId;

/// What changed on a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderEvent {
    /// Label, page label, error state or properties changed.
    Repaint,
    /// A connector gained an occupant or the connector list changed.
    ConnectorChanged,
    /// A connector lost its occupant.
    Disconnected,
}

/// Receives render notifications by block ID.
pub trait RenderNotifier {
    fn notify(&self, block: BlockId, event: RenderEvent);
}

impl<F> RenderNotifier for F
where
    F: Fn(BlockId, RenderEvent),
{
    fn notify(&self, block: BlockId, event: RenderEvent) {
        self(block, event)
    }
}
