//! Whole-graph invariant checks.
//!
//! Mutations keep these invariants on their own; the check is for graphs
//! assembled by loading, where the save data decides occupancy.

use crate::error::ValidationError;
use crate::model::{BlockGraph, ConnectorRef};

/// Checks occupancy and registry invariants:
///
/// - every occupant exists
/// - the occupant holds a connector back to the owner
/// - each join pairs a plug-side connector with a socket-side one
/// - registry entries name live blocks of the right variant
pub fn validate_graph(graph: &BlockGraph) -> Result<(), ValidationError> {
    for id in graph.ids() {
        let Some(block) = graph.block(id) else {
            continue;
        };
        for slot in block.slots() {
            let at = ConnectorRef::new(id, slot);
            let Some(occupant) = block.connector(slot).and_then(|c| c.occupant()) else {
                continue;
            };
            let Some(other) = graph.block(occupant) else {
                return Err(ValidationError::DanglingOccupant { at, occupant });
            };
            let Some(back) = other.connector_to(id) else {
                return Err(ValidationError::NotReciprocal { at, occupant });
            };
            if slot.is_plug_side() == back.is_plug_side() {
                return Err(ValidationError::RoleMismatch {
                    a: at,
                    b: ConnectorRef::new(occupant, back),
                });
            }
        }
    }

    let registry = graph.stub_registry();
    for (key, id) in registry.all_parents() {
        let live = graph
            .block(id)
            .is_some_and(|b| !b.is_stub() && b.label() == key.name && b.genus_name() == key.genus);
        if !live {
            return Err(ValidationError::StaleRegistryEntry { id });
        }
    }
    for (key, id) in registry.all_stubs() {
        let live = graph
            .block(id)
            .and_then(|b| b.stub())
            .is_some_and(|info| info.key() == *key);
        if !live {
            return Err(ValidationError::StaleRegistryEntry { id });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::load_program;
    use crate::fixtures::sample_graph;
    use crate::genus::StubKind;
    use crate::link::LinkChecker;

    #[test]
    fn test_mutations_keep_graph_valid() {
        let mut graph = sample_graph();
        let checker = LinkChecker::with_builtin_rules();
        let print = graph.create_block("print").unwrap();
        let text = graph.create_block("text").unwrap();
        let var = graph.create_block("global-var").unwrap();
        checker
            .connect(&mut graph, ConnectorRef::socket(print, 0), ConnectorRef::plug(text))
            .unwrap();
        graph.create_stub(var, StubKind::Setter).unwrap();
        graph.set_label(var, "y").unwrap();
        assert_eq!(validate_graph(&graph), Ok(()));

        graph.remove_block(text).unwrap();
        graph.remove_block(var).unwrap();
        assert_eq!(validate_graph(&graph), Ok(()));
    }

    #[test]
    fn test_dangling_occupant_from_load() {
        let mut graph = sample_graph();
        let program = r#"{"BlockGraph": {"Blocks": [
            {"Block": {"id": 1, "genus-name": "print", "Label": "print", "AfterBlockId": 2}}
        ]}}"#;
        load_program(&mut graph, program, None).unwrap();
        assert_eq!(
            validate_graph(&graph),
            Err(ValidationError::DanglingOccupant {
                at: ConnectorRef::after(1),
                occupant: 2
            })
        );
    }

    #[test]
    fn test_one_sided_link_from_load() {
        let mut graph = sample_graph();
        let program = r#"{"BlockGraph": {"Blocks": [
            {"Block": {"id": 1, "genus-name": "print", "Label": "print", "AfterBlockId": 2}},
            {"Block": {"id": 2, "genus-name": "print", "Label": "print"}}
        ]}}"#;
        load_program(&mut graph, program, None).unwrap();
        assert_eq!(
            validate_graph(&graph),
            Err(ValidationError::NotReciprocal {
                at: ConnectorRef::after(1),
                occupant: 2
            })
        );
    }
}
