//! Single-block save and load.

use tracing::{trace, warn};

use crate::codec::label::{decode_label, encode_label};
use crate::codec::record::{BlockRecord, ConnectorRecord, PlugRecord, PropertyRecord, SavedBlock, SocketsRecord, StubRecord};
use crate::error::{GraphError, LoadError, SaveError};
use crate::genus::{OBSOLETE_GENUS_PROPERTY, OBSOLETE_MESSAGE, PLACEHOLDER_GENUS, StubKind};
use crate::model::{
    Block, BlockGraph, BlockId, BlockVariant, Connector, ConnectorRole, IdMapping, PositionType, remap,
};
use crate::stub::StubInfo;

// =============================================================================
// SAVE
// =============================================================================

/// Builds the save record of one block.
pub fn block_record(graph: &BlockGraph, id: BlockId) -> Result<SavedBlock, GraphError> {
    let block = graph.block(id).ok_or(GraphError::UnknownBlock { id })?;
    let encode = graph.genera().lookup(block.genus_name()).is_some_and(|g| g.encode_label);
    // Placeholder blocks are saved under the genus they were loaded as, so a
    // later language that defines it again can pick them up.
    let genus_name = match (block.genus_name(), block.property(OBSOLETE_GENUS_PROPERTY)) {
        (PLACEHOLDER_GENUS, Some(original)) => original.to_string(),
        (name, _) => name.to_string(),
    };

    let record = BlockRecord {
        id,
        genus_name,
        has_focus: block.has_focus(),
        label: if encode {
            encode_label(block.label())
        } else {
            block.label().to_string()
        },
        page_label: block.page_label().map(str::to_string),
        error: block.error_message().map(str::to_string),
        before: block.before().and_then(Connector::occupant),
        after: block.after().and_then(Connector::occupant),
        plug: block.plug().map(|c| PlugRecord {
            connector: connector_record(c, ConnectorRole::Plug),
        }),
        sockets: (block.num_sockets() > 0).then(|| SocketsRecord {
            num_sockets: block.num_sockets(),
            connectors: block
                .sockets()
                .iter()
                .map(|c| connector_record(c, ConnectorRole::Socket))
                .collect(),
        }),
        properties: block
            .properties()
            .iter()
            .map(|(key, value)| PropertyRecord {
                key: key.clone(),
                value: value.clone(),
            })
            .collect(),
    };

    Ok(match block.stub() {
        Some(info) => SavedBlock::Stub(StubRecord {
            parent_name: info.parent_name.clone(),
            parent_genus: info.parent_genus.clone(),
            block: record,
        }),
        None => SavedBlock::Block(record),
    })
}

fn connector_record(connector: &Connector, role: ConnectorRole) -> ConnectorRecord {
    ConnectorRecord {
        role,
        kind: connector.kind.clone(),
        init_kind: connector.init_kind.clone(),
        label: connector.label.clone(),
        position: connector.position,
        label_editable: connector.label_editable,
        indented: connector.indented,
        expandable: connector.expandable,
        expand_group: connector.expand_group.clone(),
        occupant: connector.occupant(),
        default_arg: connector.default_arg.clone(),
    }
}

/// Saves one block as JSON.
pub fn save_block(graph: &BlockGraph, id: BlockId) -> Result<String, SaveError> {
    let saved = block_record(graph, id)?;
    serde_json::to_string_pretty(&saved).map_err(|e| SaveError::Serialize(e.to_string()))
}

// =============================================================================
// LOAD
// =============================================================================

/// Loads one block from its JSON save.
pub fn load_block(graph: &mut BlockGraph, text: &str, mapping: Option<&mut IdMapping>) -> Result<BlockId, LoadError> {
    let saved: SavedBlock = serde_json::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))?;
    load_saved(graph, &saved, mapping)
}

fn translate(graph: &mut BlockGraph, mapping: &mut Option<&mut IdMapping>, id: BlockId) -> BlockId {
    match mapping.as_deref_mut() {
        Some(mapping) => remap(graph.id_allocator_mut(), mapping, id),
        None => id,
    }
}

/// Loads one block record into the graph.
///
/// With a mapping every embedded ID (own, before, after, plug occupant, socket
/// occupants, in that order) is translated, unseen IDs getting fresh ones.
/// An unknown or obsolete genus loads as the placeholder genus, marked bad.
pub fn load_saved(
    graph: &mut BlockGraph,
    saved: &SavedBlock,
    mut mapping: Option<&mut IdMapping>,
) -> Result<BlockId, LoadError> {
    let record = saved.record();

    let id = translate(graph, &mut mapping, record.id);
    let before = record.before.map(|b| translate(graph, &mut mapping, b));
    let after = record.after.map(|a| translate(graph, &mut mapping, a));
    let plug_occupant = record
        .plug
        .as_ref()
        .and_then(|p| p.connector.occupant)
        .map(|o| translate(graph, &mut mapping, o));
    let mut socket_occupants = Vec::new();
    if let Some(sockets) = &record.sockets {
        if sockets.num_sockets != sockets.connectors.len() {
            return Err(LoadError::SocketCountMismatch {
                id: record.id,
                declared: sockets.num_sockets,
                actual: sockets.connectors.len(),
            });
        }
        for connector in &sockets.connectors {
            socket_occupants.push(connector.occupant.map(|o| translate(graph, &mut mapping, o)));
        }
    }

    if graph.contains(id) {
        return Err(GraphError::DuplicateBlockId { id }.into());
    }

    let variant = match saved {
        SavedBlock::Stub(stub) => stub_variant(graph, stub),
        SavedBlock::Block(_) => BlockVariant::Plain,
    };
    let (genus, obsolete) = match graph.genera().get(&record.genus_name) {
        Some(genus) => (genus, false),
        None => {
            warn!(id, genus = %record.genus_name, "unknown or obsolete genus, loading placeholder");
            (graph.genera().placeholder(), true)
        }
    };
    let decode = genus.encode_label;
    let mut block = Block::from_genus(id, genus, variant);

    block.label = if decode {
        decode_label(&record.label)
    } else {
        record.label.clone()
    };
    block.page_label = record.page_label.clone();
    block.error = record.error.clone();
    block.focus = record.has_focus;
    block.properties = record
        .properties
        .iter()
        .map(|p| (p.key.clone(), p.value.clone()))
        .collect();
    if obsolete {
        block.error = Some(OBSOLETE_MESSAGE.to_string());
        block
            .properties
            .insert(OBSOLETE_GENUS_PROPERTY.to_string(), record.genus_name.clone());
    }

    block.plug = record
        .plug
        .as_ref()
        .map(|p| connector_from_record(&p.connector, plug_occupant));
    block.sockets = match &record.sockets {
        Some(sockets) => sockets
            .connectors
            .iter()
            .zip(socket_occupants)
            .map(|(c, occupant)| connector_from_record(c, occupant))
            .collect(),
        None => Vec::new(),
    };
    if before.is_some() && block.before.is_none() {
        block.before = Some(Connector::command(PositionType::Top));
    }
    if after.is_some() && block.after.is_none() {
        block.after = Some(Connector::command(PositionType::Bottom));
    }
    if let Some(connector) = block.before.as_mut() {
        connector.set_occupant(before);
    }
    if let Some(connector) = block.after.as_mut() {
        connector.set_occupant(after);
    }

    // Callers have either a plug or a before/after pair, never both.
    if block.stub().is_some_and(|info| info.kind == StubKind::Caller) {
        if block.plug.is_some() {
            block.before = None;
            block.after = None;
        } else {
            block.before.get_or_insert_with(|| Connector::command(PositionType::Top));
            block.after.get_or_insert_with(|| Connector::command(PositionType::Bottom));
        }
    }

    trace!(id, source = record.id, genus = %block.genus, "loaded block");
    graph.insert(block);
    Ok(id)
}

/// Stub variant for a stub record, or plain when the record does not name a
/// stub genus of its parent.
fn stub_variant(graph: &BlockGraph, stub: &StubRecord) -> BlockVariant {
    let genus_name = &stub.block.genus_name;
    match StubKind::from_stub_genus(genus_name, &stub.parent_genus) {
        Some(kind) if graph.genera().contains(genus_name) => BlockVariant::Stub(StubInfo {
            parent_name: stub.parent_name.clone(),
            parent_genus: stub.parent_genus.clone(),
            kind,
        }),
        _ => {
            warn!(
                genus = %genus_name,
                parent = %stub.parent_genus,
                "malformed stub record, loading as a plain block"
            );
            BlockVariant::Plain
        }
    }
}

fn connector_from_record(record: &ConnectorRecord, occupant: Option<BlockId>) -> Connector {
    let mut connector = Connector::new(record.kind.as_str(), record.position);
    if !record.init_kind.is_empty() {
        connector.init_kind = record.init_kind.clone();
    }
    connector.label = record.label.clone();
    connector.label_editable = record.label_editable;
    connector.indented = record.indented;
    connector.expandable = record.expandable;
    connector.expand_group = record.expand_group.clone();
    connector.default_arg = record.default_arg.clone();
    connector.set_occupant(occupant);
    connector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_graph;
    use crate::link::LinkChecker;
    use crate::model::ConnectorRef;

    #[test]
    fn test_saved_socket_names_occupant() {
        let mut graph = sample_graph();
        let print = graph.create_block("print").unwrap();
        let text = graph.create_block("text").unwrap();
        LinkChecker::with_builtin_rules()
            .connect(&mut graph, ConnectorRef::socket(print, 0), ConnectorRef::plug(text))
            .unwrap();

        let json = save_block(&graph, print).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let socket = &value["Block"]["Sockets"]["BlockConnector"][0];
        assert_eq!(socket["con-block-id"], serde_json::json!(text));
        assert_eq!(value["Block"]["Sockets"]["num-sockets"], serde_json::json!(1));
        assert!(value["Block"].get("Plug").is_none());
    }

    #[test]
    fn test_obsolete_genus_loads_as_placeholder() {
        let mut graph = sample_graph();
        let text = r#"{"Block": {"id": 5, "genus-name": "old-print", "Label": "print",
            "BeforeBlockId": 4}}"#;
        let id = load_block(&mut graph, text, None).unwrap();
        let block = graph.block(id).unwrap();
        assert_eq!(block.genus_name(), PLACEHOLDER_GENUS);
        assert_eq!(block.error_message(), Some(OBSOLETE_MESSAGE));
        assert_eq!(block.property(OBSOLETE_GENUS_PROPERTY), Some("old-print"));
        assert_eq!(block.before().unwrap().occupant(), Some(4));
        assert_eq!(block.label(), "print");

        // Saved back under its original genus.
        let SavedBlock::Block(record) = block_record(&graph, id).unwrap() else {
            panic!("expected a plain block");
        };
        assert_eq!(record.genus_name, "old-print");
    }

    #[test]
    fn test_unknown_genus_loads_as_placeholder() {
        let mut graph = sample_graph();
        let id = load_block(&mut graph, r#"{"Block": {"id": 1, "genus-name": "mystery"}}"#, None).unwrap();
        assert!(graph.block(id).unwrap().is_bad());
    }

    #[test]
    fn test_socket_count_mismatch() {
        let mut graph = sample_graph();
        let text = r#"{"Block": {"id": 1, "genus-name": "print", "Sockets": {"num-sockets": 2,
            "BlockConnector": [{"connector-kind": "socket", "connector-type": "string"}]}}}"#;
        assert_eq!(
            load_block(&mut graph, text, None),
            Err(LoadError::SocketCountMismatch {
                id: 1,
                declared: 2,
                actual: 1
            })
        );
        assert!(graph.is_empty());
    }

    #[test]
    fn test_duplicate_id_without_mapping() {
        let mut graph = sample_graph();
        let print = graph.create_block("print").unwrap();
        let json = save_block(&graph, print).unwrap();
        assert_eq!(
            load_block(&mut graph, &json, None),
            Err(LoadError::Graph(GraphError::DuplicateBlockId { id: print }))
        );
        let mut mapping = IdMapping::default();
        let copy = load_block(&mut graph, &json, Some(&mut mapping)).unwrap();
        assert_ne!(copy, print);
        assert_eq!(mapping[&print], copy);
    }

    #[test]
    fn test_encoded_label_round_trip() {
        let mut graph = sample_graph();
        let text = graph.create_block("text").unwrap();
        graph.set_label(text, "héllo").unwrap();
        let json = save_block(&graph, text).unwrap();
        assert!(json.contains("h\\\\u00e9llo"));

        let mut mapping = IdMapping::default();
        let copy = load_block(&mut graph, &json, Some(&mut mapping)).unwrap();
        assert_eq!(graph.block(copy).unwrap().label(), "héllo");
    }

    #[test]
    fn test_stub_round_trip_reregisters() {
        let mut graph = sample_graph();
        let var = graph.create_block("global-var").unwrap();
        let getter = graph.create_stub(var, StubKind::Getter).unwrap();
        let json = save_block(&graph, getter).unwrap();
        assert!(json.contains("BlockStub"));

        graph.remove_block(getter).unwrap();
        let loaded = load_block(&mut graph, &json, None).unwrap();
        assert_eq!(loaded, getter);
        assert_eq!(graph.stub_parent(loaded), Some(var));
        assert_eq!(graph.block(loaded).unwrap().plug().unwrap().kind, "number");
    }

    #[test]
    fn test_caller_shape_is_normalized() {
        let mut graph = sample_graph();
        graph.create_block("procedure").unwrap();
        let text = r#"{"BlockStub": {"StubParentName": "proc", "StubParentGenus": "procedure",
            "Block": {"id": 9, "genus-name": "callerprocedure", "Label": "proc"}}}"#;
        let id = load_block(&mut graph, text, None).unwrap();
        let block = graph.block(id).unwrap();
        assert!(block.is_stub());
        assert!(block.before().is_some() && block.after().is_some());
    }

    #[test]
    fn test_malformed_stub_loads_plain() {
        let mut graph = sample_graph();
        let text = r#"{"BlockStub": {"StubParentName": "x", "StubParentGenus": "global-var",
            "Block": {"id": 3, "genus-name": "print", "Label": "print"}}}"#;
        let id = load_block(&mut graph, text, None).unwrap();
        assert!(!graph.block(id).unwrap().is_stub());
    }
}
