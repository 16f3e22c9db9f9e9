//! Serde shapes of the save format.
//!
//! Field names are part of the format and must not change.

use serde::{Deserialize, Serialize};

use crate::model::{BlockId, ConnectorRole, DefaultArg, PositionType};

/// A saved block, plain or stub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SavedBlock {
    #[serde(rename = "Block")]
    Block(BlockRecord),
    #[serde(rename = "BlockStub")]
    Stub(StubRecord),
}

impl SavedBlock {
    /// The inner block record.
    pub fn record(&self) -> &BlockRecord {
        match self {
            SavedBlock::Block(record) => record,
            SavedBlock::Stub(stub) => &stub.block,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubRecord {
    #[serde(rename = "StubParentName")]
    pub parent_name: String,
    #[serde(rename = "StubParentGenus")]
    pub parent_genus: String,
    #[serde(rename = "Block")]
    pub block: BlockRecord,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    #[serde(rename = "genus-name")]
    pub genus_name: String,
    #[serde(rename = "has-focus", default, skip_serializing_if = "is_false", with = "yes_flag")]
    pub has_focus: bool,
    #[serde(rename = "Label", default)]
    pub label: String,
    #[serde(rename = "PageLabel", default, skip_serializing_if = "Option::is_none")]
    pub page_label: Option<String>,
    #[serde(rename = "CompilerErrorMsg", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "BeforeBlockId", default, skip_serializing_if = "Option::is_none")]
    pub before: Option<BlockId>,
    #[serde(rename = "AfterBlockId", default, skip_serializing_if = "Option::is_none")]
    pub after: Option<BlockId>,
    #[serde(rename = "Plug", default, skip_serializing_if = "Option::is_none")]
    pub plug: Option<PlugRecord>,
    #[serde(rename = "Sockets", default, skip_serializing_if = "Option::is_none")]
    pub sockets: Option<SocketsRecord>,
    #[serde(rename = "LangSpecProperties", default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlugRecord {
    #[serde(rename = "BlockConnector")]
    pub connector: ConnectorRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketsRecord {
    #[serde(rename = "num-sockets")]
    pub num_sockets: usize,
    #[serde(rename = "BlockConnector", default)]
    pub connectors: Vec<ConnectorRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorRecord {
    #[serde(rename = "connector-kind")]
    pub role: ConnectorRole,
    #[serde(rename = "connector-type")]
    pub kind: String,
    #[serde(rename = "init-type", default)]
    pub init_kind: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "position-type", default)]
    pub position: PositionType,
    #[serde(rename = "label-editable", default, skip_serializing_if = "is_false", with = "yes_flag")]
    pub label_editable: bool,
    #[serde(rename = "is-indented", default, skip_serializing_if = "is_false", with = "yes_flag")]
    pub indented: bool,
    #[serde(rename = "is-expandable", default, skip_serializing_if = "is_false", with = "yes_flag")]
    pub expandable: bool,
    #[serde(rename = "expand-group", default, skip_serializing_if = "String::is_empty")]
    pub expand_group: String,
    #[serde(rename = "con-block-id", default, skip_serializing_if = "Option::is_none")]
    pub occupant: Option<BlockId>,
    #[serde(rename = "DefArg", default, skip_serializing_if = "Option::is_none")]
    pub default_arg: Option<DefaultArg>,
}

/// A key/value pair in a `LangSpecProperties` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub key: String,
    pub value: String,
}

/// Top level of a saved program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramFile {
    #[serde(rename = "BlockGraph")]
    pub graph: ProgramRecord,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgramRecord {
    /// Fingerprint of the language the program was saved under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "Blocks", default)]
    pub blocks: Vec<SavedBlock>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Booleans stored as `"yes"` / `"no"`.
mod yes_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *flag { "yes" } else { "no" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(text == "yes" || text == "true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_are_omitted() {
        let record = BlockRecord {
            id: 7,
            genus_name: "print".to_string(),
            label: "print".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&SavedBlock::Block(record)).unwrap();
        assert_eq!(json, r#"{"Block":{"id":7,"genus-name":"print","Label":"print"}}"#);
    }

    #[test]
    fn test_yes_flags() {
        let text = r#"{"connector-kind": "socket", "connector-type": "cmd", "is-indented": "yes",
            "is-expandable": "no", "con-block-id": 3}"#;
        let connector: ConnectorRecord = serde_json::from_str(text).unwrap();
        assert!(connector.indented);
        assert!(!connector.expandable);
        assert_eq!(connector.occupant, Some(3));
        assert_eq!(connector.position, PositionType::Single);

        let json = serde_json::to_string(&connector).unwrap();
        assert!(json.contains(r#""is-indented":"yes""#));
        assert!(!json.contains("is-expandable"));
    }

    #[test]
    fn test_stub_discriminator() {
        let text = r#"{"BlockStub": {"StubParentName": "x", "StubParentGenus": "global-var",
            "Block": {"id": 4, "genus-name": "getterglobal-var", "Label": "x", "has-focus": "yes"}}}"#;
        let saved: SavedBlock = serde_json::from_str(text).unwrap();
        match &saved {
            SavedBlock::Stub(stub) => assert_eq!(stub.parent_genus, "global-var"),
            SavedBlock::Block(_) => panic!("expected a stub"),
        }
        assert!(saved.record().has_focus);
    }
}
