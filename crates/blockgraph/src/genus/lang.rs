//! Serde schema of the language description document.
//!
//! ```json
//! {
//!   "BlockGenuses": [
//!     { "name": "print", "kind": "command", "initlabel": "print",
//!       "BlockConnectors": [
//!         { "connector-kind": "socket", "connector-type": "string" }
//!       ] }
//!   ],
//!   "BlockFamilies": [["print", "say"]],
//!   "ObsoleteBlockGenuses": ["old-print"]
//! }
//! ```

use serde::Deserialize;

use crate::codec::PropertyRecord;
use crate::genus::{GenusKind, StubKind};
use crate::model::{Connector, ConnectorRole, DefaultArg, PositionType};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageDescription {
    #[serde(rename = "BlockGenuses", default)]
    pub genuses: Vec<GenusEntry>,
    #[serde(rename = "BlockFamilies", default)]
    pub families: Vec<Vec<String>>,
    #[serde(rename = "ObsoleteBlockGenuses", default)]
    pub obsolete: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GenusEntry {
    pub name: String,
    pub kind: GenusKind,
    #[serde(default)]
    pub color: [u8; 3],
    #[serde(default)]
    pub initlabel: Option<String>,
    #[serde(default)]
    pub label_prefix: String,
    #[serde(default)]
    pub label_suffix: String,
    #[serde(default)]
    pub editable_label: bool,
    #[serde(default)]
    pub label_unique: bool,
    #[serde(default)]
    pub page_label_enabled: bool,
    #[serde(default)]
    pub encode_label: bool,
    #[serde(default)]
    pub is_starter: bool,
    #[serde(default)]
    pub is_terminator: bool,
    #[serde(default)]
    pub is_infix: bool,
    #[serde(rename = "BlockConnectors", default)]
    pub connectors: Vec<ConnectorEntry>,
    #[serde(rename = "ExpandGroups", default)]
    pub expand_groups: Vec<ExpandGroupEntry>,
    #[serde(rename = "Stubs", default)]
    pub stubs: Vec<StubEntry>,
    #[serde(rename = "LangSpecProperties", default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(rename = "Description", default)]
    pub description: Option<DescriptionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectorEntry {
    pub connector_kind: ConnectorRole,
    pub connector_type: String,
    #[serde(default)]
    pub position_type: PositionType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub label_editable: bool,
    #[serde(default)]
    pub is_indented: bool,
    #[serde(default)]
    pub is_expandable: bool,
    #[serde(default)]
    pub expand_group: String,
    #[serde(rename = "DefaultArg", default)]
    pub default_arg: Option<DefaultArg>,
}

impl ConnectorEntry {
    pub fn to_connector(&self) -> Connector {
        let mut connector = Connector::new(self.connector_type.as_str(), self.position_type);
        connector.label = self.label.clone();
        connector.label_editable = self.label_editable;
        connector.indented = self.is_indented;
        connector.expandable = self.is_expandable;
        connector.expand_group = self.expand_group.clone();
        connector.default_arg = self.default_arg.clone();
        connector
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExpandGroupEntry {
    pub group_name: String,
    #[serde(rename = "BlockConnectors", default)]
    pub connectors: Vec<ConnectorEntry>,
}

/// Per-parent customization of a generic stub genus.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StubEntry {
    pub stub_genus: StubKind,
    #[serde(default)]
    pub label_prefix: Option<String>,
    #[serde(default)]
    pub label_suffix: Option<String>,
    #[serde(rename = "LangSpecProperties", default)]
    pub properties: Vec<PropertyRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescriptionEntry {
    #[serde(rename = "Text", default)]
    pub text: String,
    #[serde(rename = "ArgDescriptions", default)]
    pub args: Vec<String>,
}
