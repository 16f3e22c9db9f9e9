//! Typed attachment points on a block.

use serde::{Deserialize, Serialize};

use crate::genus::COMMAND_KIND;
use crate::model::BlockId;

/// Where a connector sits on the block outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionType {
    #[default]
    Single,
    Mirror,
    Bottom,
    Top,
}

/// Whether a declared connector is a receptacle or an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorRole {
    Socket,
    Plug,
}

/// Block created to fill an empty socket on request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultArg {
    #[serde(rename = "genus-name")]
    pub genus: String,
    #[serde(default)]
    pub label: String,
}

/// A connector instance. Every block owns its own copies; templates held by a
/// genus are never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    pub kind: String,
    pub init_kind: String,
    pub position: PositionType,
    pub label: String,
    pub label_editable: bool,
    pub indented: bool,
    pub expandable: bool,
    /// Empty when the connector belongs to no expand group.
    pub expand_group: String,
    pub default_arg: Option<DefaultArg>,
    occupant: Option<BlockId>,
}

/// The parts of a connector that decide whether two connectors are
/// interchangeable for expand-group bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorShape<'a> {
    pub position: PositionType,
    pub expandable: bool,
    pub init_kind: &'a str,
    pub expand_group: &'a str,
}

impl Connector {
    pub fn new(kind: impl Into<String>, position: PositionType) -> Self {
        let kind = kind.into();
        Self {
            init_kind: kind.clone(),
            kind,
            position,
            label: String::new(),
            label_editable: false,
            indented: false,
            expandable: false,
            expand_group: String::new(),
            default_arg: None,
            occupant: None,
        }
    }

    /// A sequencing connector (before/after or statement socket).
    pub fn command(position: PositionType) -> Self {
        Self::new(COMMAND_KIND, position)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn expandable_in(mut self, group: impl Into<String>) -> Self {
        self.expandable = true;
        self.expand_group = group.into();
        self
    }

    pub fn with_default_arg(mut self, genus: impl Into<String>, label: impl Into<String>) -> Self {
        self.default_arg = Some(DefaultArg {
            genus: genus.into(),
            label: label.into(),
        });
        self
    }

    pub fn occupant(&self) -> Option<BlockId> {
        self.occupant
    }

    pub fn has_block(&self) -> bool {
        self.occupant.is_some()
    }

    pub(crate) fn set_occupant(&mut self, occupant: Option<BlockId>) {
        self.occupant = occupant;
    }

    /// A fresh, empty copy of this connector.
    pub fn template(&self) -> Self {
        Self {
            occupant: None,
            ..self.clone()
        }
    }

    /// Changes the current kind, leaving the initial kind alone.
    pub fn set_kind(&mut self, kind: impl Into<String>) {
        self.kind = kind.into();
    }

    /// Sets both current and initial kind, for connectors still being shaped.
    pub(crate) fn seed_kind(&mut self, kind: &str) {
        self.kind = kind.to_string();
        self.init_kind = kind.to_string();
    }

    pub fn is_command(&self) -> bool {
        self.kind == COMMAND_KIND
    }

    pub fn in_expand_group(&self) -> bool {
        self.expandable && !self.expand_group.is_empty()
    }

    pub fn shape(&self) -> ConnectorShape<'_> {
        ConnectorShape {
            position: self.position,
            expandable: self.expandable,
            init_kind: &self.init_kind,
            expand_group: &self.expand_group,
        }
    }
}

/// Position of a connector on its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectorSlot {
    Plug,
    Before,
    After,
    Socket(usize),
}

impl ConnectorSlot {
    /// Plug and before connectors attach *into* another block.
    pub fn is_plug_side(self) -> bool {
        matches!(self, ConnectorSlot::Plug | ConnectorSlot::Before)
    }

    /// Sockets and after connectors receive another block.
    pub fn is_socket_side(self) -> bool {
        !self.is_plug_side()
    }
}

/// A connector addressed by owner and slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorRef {
    pub block: BlockId,
    pub slot: ConnectorSlot,
}

impl ConnectorRef {
    pub fn new(block: BlockId, slot: ConnectorSlot) -> Self {
        Self { block, slot }
    }

    pub fn plug(block: BlockId) -> Self {
        Self::new(block, ConnectorSlot::Plug)
    }

    pub fn before(block: BlockId) -> Self {
        Self::new(block, ConnectorSlot::Before)
    }

    pub fn after(block: BlockId) -> Self {
        Self::new(block, ConnectorSlot::After)
    }

    pub fn socket(block: BlockId, index: usize) -> Self {
        Self::new(block, ConnectorSlot::Socket(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_drops_occupant() {
        let mut c = Connector::new("number", PositionType::Single).with_label("x");
        c.set_occupant(Some(4));
        let t = c.template();
        assert!(!t.has_block());
        assert_eq!(t.label, "x");
        assert!(c.has_block());
    }

    #[test]
    fn test_shape_ignores_current_kind_and_label() {
        let a = Connector::new("number", PositionType::Single).expandable_in("items");
        let mut b = a.clone().with_label("other");
        b.set_kind("string");
        assert_eq!(a.shape(), b.shape());

        let c = Connector::new("string", PositionType::Single).expandable_in("items");
        assert_ne!(a.shape(), c.shape());
    }

    #[test]
    fn test_slot_sides() {
        assert!(ConnectorSlot::Plug.is_plug_side());
        assert!(ConnectorSlot::Before.is_plug_side());
        assert!(ConnectorSlot::After.is_socket_side());
        assert!(ConnectorSlot::Socket(3).is_socket_side());
    }
}
