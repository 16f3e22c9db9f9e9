//! Keeping stubs in step with their parent declaration.

use tracing::{debug, warn};

use crate::error::GraphError;
use crate::genus::{GenusKind, StubKind};
use crate::model::{Block, BlockGraph, BlockId, BlockVariant, Connector, ConnectorRef, ConnectorSlot, PositionType};
use crate::notify::RenderEvent;
use crate::stub::{StubInfo, StubKey};

impl BlockGraph {
    /// Creates a stub of `kind` for the declaration block `parent`.
    pub fn create_stub(&mut self, parent: BlockId, kind: StubKind) -> Result<BlockId, GraphError> {
        let parent_block = self.get(parent)?;
        if parent_block.is_stub() {
            return Err(GraphError::StubKindNotDeclared {
                genus: parent_block.genus.clone(),
                kind,
            });
        }
        let parent_genus = self.lookup_genus(&parent_block.genus)?;
        if !parent_genus.declares_stub(kind) {
            return Err(GraphError::StubKindNotDeclared {
                genus: parent_genus.name.clone(),
                kind,
            });
        }
        let stub_genus_name = kind.genus_name(&parent_genus.name);
        let stub_genus = self.genera().get(&stub_genus_name).ok_or(GraphError::UnknownGenus {
            name: stub_genus_name,
        })?;

        let info = StubInfo {
            parent_name: parent_block.label.clone(),
            parent_genus: parent_block.genus.clone(),
            kind,
        };
        // Getters, setters and agents take their type from the parent's first
        // socket, or from its plug when it has none.
        let seed = parent_block
            .sockets
            .first()
            .or(parent_block.plug.as_ref())
            .map(|c| c.kind.clone());

        let mut block = Block::from_genus(0, stub_genus, BlockVariant::Stub(info));
        block.label = parent_block.label.clone();
        block.page_label = parent_block.page_label.clone();
        if let Some(seed) = seed {
            let target = match kind {
                StubKind::Getter | StubKind::Agent => block.plug.as_mut(),
                StubKind::Setter => block.sockets.first_mut(),
                StubKind::Caller => None,
            };
            if let Some(connector) = target {
                connector.seed_kind(&seed);
            }
        }

        let id = self.allocate_id();
        block.id = id;
        self.insert(block);
        if kind == StubKind::Caller {
            self.reshape_caller(id, parent)?;
            self.sync_caller_sockets(id, parent)?;
        }
        debug!(stub = id, parent, kind = %kind, "created stub");
        Ok(id)
    }

    /// The parent a stub currently resolves to.
    ///
    /// With several parents under the stub's key, the one in the same tree as
    /// the stub wins. When none shares its tree the stub is unresolved.
    pub fn stub_parent(&self, stub: BlockId) -> Option<BlockId> {
        let info = self.blocks_stub_info(stub)?;
        let parents = self.stubs.parents(&info.key());
        match parents.as_slice() {
            [] => None,
            [only] => Some(*only),
            many => {
                let root = self.root_of(stub);
                many.iter().copied().find(|p| self.root_of(*p) == root)
            }
        }
    }

    fn blocks_stub_info(&self, id: BlockId) -> Option<&StubInfo> {
        self.block(id)?.stub()
    }

    /// Stubs that resolve to `parent`.
    pub fn stubs_of(&self, parent: BlockId) -> Result<Vec<BlockId>, GraphError> {
        let block = self.get(parent)?;
        if block.is_stub() {
            return Ok(Vec::new());
        }
        let key = StubKey::new(block.label.as_str(), block.genus.as_str());
        if !self.stubs.is_parent(&key, parent) {
            return Ok(Vec::new());
        }
        Ok(self
            .stubs
            .stubs(&key)
            .into_iter()
            .filter(|s| self.stub_parent(*s) == Some(parent))
            .collect())
    }

    fn callers_of(&self, parent: BlockId) -> Result<Vec<BlockId>, GraphError> {
        Ok(self
            .stubs_of(parent)?
            .into_iter()
            .filter(|s| self.blocks_stub_info(*s).is_some_and(|i| i.kind == StubKind::Caller))
            .collect())
    }

    /// Moves a renamed parent, and the stubs that follow it, to the new key.
    pub(crate) fn rename_parent(&mut self, parent: BlockId, old: &str, new: &str) -> Result<(), GraphError> {
        let genus_name = self.get(parent)?.genus.clone();
        let kind = self.lookup_genus(&genus_name)?.kind;
        let old_key = StubKey::new(old, genus_name.as_str());
        let new_key = StubKey::new(new, genus_name.as_str());

        self.stubs.remove_parent(&old_key, parent);
        self.stubs.register_parent(new_key.clone(), parent);
        let remaining = self.stubs.parents(&old_key);
        let candidates = self.stubs.stubs(&old_key);

        let moving: Vec<BlockId> = if kind == GenusKind::Param {
            // Same-named parameters of different procedures keep their own
            // stubs. A stub follows if it sits in this parameter's tree, or
            // if no remaining parameter shares its tree.
            let parent_root = self.root_of(parent);
            candidates
                .into_iter()
                .filter(|s| {
                    let root = self.root_of(*s);
                    root == parent_root || !remaining.iter().any(|p| self.root_of(*p) == root)
                })
                .collect()
        } else if remaining.is_empty() {
            candidates
        } else {
            Vec::new()
        };

        for stub in &moving {
            self.stubs.move_stub(&old_key, new_key.clone(), *stub);
            let block = self.get_mut(*stub)?;
            block.label = new.to_string();
            if let BlockVariant::Stub(info) = &mut block.variant {
                info.parent_name = new.to_string();
            }
            self.notify(*stub, RenderEvent::Repaint);
        }
        debug!(parent, old, new, moved = moving.len(), "renamed stub parent");
        Ok(())
    }

    /// Stubs copy the parent's page label; callers also resync.
    pub(crate) fn parent_page_label_changed(&mut self, parent: BlockId) -> Result<(), GraphError> {
        let page_label = self.get(parent)?.page_label.clone();
        for stub in self.stubs_of(parent)? {
            self.get_mut(stub)?.page_label = page_label.clone();
            if self.blocks_stub_info(stub).is_some_and(|i| i.kind == StubKind::Caller) {
                self.sync_caller_sockets(stub, parent)?;
            }
            self.notify(stub, RenderEvent::Repaint);
        }
        Ok(())
    }

    /// Callers resync after the parent's sockets or their occupants changed.
    pub(crate) fn parent_connectors_changed(&mut self, parent: BlockId) -> Result<(), GraphError> {
        for stub in self.callers_of(parent)? {
            self.sync_caller_sockets(stub, parent)?;
            self.notify(stub, RenderEvent::ConnectorChanged);
        }
        Ok(())
    }

    /// Callers follow the parent between plug shape and command shape.
    pub(crate) fn parent_plug_changed(&mut self, parent: BlockId) -> Result<(), GraphError> {
        for stub in self.callers_of(parent)? {
            self.reshape_caller(stub, parent)?;
            self.notify(stub, RenderEvent::ConnectorChanged);
        }
        Ok(())
    }

    /// A parent with a plug gives its callers a plug of the same kind and no
    /// before/after; otherwise callers get before/after and no plug.
    fn reshape_caller(&mut self, stub: BlockId, parent: BlockId) -> Result<(), GraphError> {
        match self.get(parent)?.plug.clone() {
            Some(plug) => {
                for slot in [ConnectorSlot::Before, ConnectorSlot::After] {
                    if self.get(stub)?.connector(slot).is_some() {
                        self.release(ConnectorRef::new(stub, slot), true)?;
                    }
                }
                let kind_changed = self.get(stub)?.plug.as_ref().is_some_and(|p| p.kind != plug.kind);
                if kind_changed {
                    self.release(ConnectorRef::plug(stub), true)?;
                }
                let block = self.get_mut(stub)?;
                block.before = None;
                block.after = None;
                if let Some(own) = block.plug.as_mut() {
                    own.seed_kind(&plug.kind);
                } else {
                    block.plug = Some(plug.template());
                }
            }
            None => {
                if self.get(stub)?.plug.is_some() {
                    self.release(ConnectorRef::plug(stub), true)?;
                }
                let block = self.get_mut(stub)?;
                block.plug = None;
                if block.before.is_none() {
                    block.before = Some(Connector::command(PositionType::Top));
                }
                if block.after.is_none() {
                    block.after = Some(Connector::command(PositionType::Bottom));
                }
            }
        }
        Ok(())
    }

    /// Templates for the caller sockets of `parent`: one per argument socket,
    /// labelled after the argument block when one is plugged in.
    fn argument_templates(&self, parent: BlockId) -> Result<Vec<Connector>, GraphError> {
        let block = self.get(parent)?;
        let genus = self.lookup_genus(&block.genus)?;
        let is_argument = self.argument_predicate();
        Ok(block
            .sockets
            .iter()
            .filter(|c| is_argument(genus, c))
            .map(|c| {
                let mut template = c.template();
                if let Some(arg) = c.occupant().and_then(|o| self.block(o)) {
                    template.label = arg.label.clone();
                }
                template.expandable = false;
                template.expand_group.clear();
                template.default_arg = None;
                template
            })
            .collect())
    }

    /// Brings a caller's sockets in line with the parent's argument sockets.
    ///
    /// Extra caller sockets are dropped by name first, so the sockets that
    /// survive keep their attached blocks; the rest is updated by position.
    /// Fails with `StubOutOfSync` when the names cannot account for the
    /// surplus.
    pub(crate) fn sync_caller_sockets(&mut self, stub: BlockId, parent: BlockId) -> Result<(), GraphError> {
        let args = self.argument_templates(parent)?;
        let current = self.get(stub)?.sockets.len();

        if current > args.len() {
            // A socket whose name still names some argument is never dropped.
            // Surplus sockets sharing an argument's name are ambiguous and
            // leave the caller out of sync.
            let unmatched: Vec<usize> = self
                .get(stub)?
                .sockets
                .iter()
                .enumerate()
                .filter(|(_, socket)| !args.iter().any(|a| a.label == socket.label))
                .map(|(index, _)| index)
                .collect();
            let excess = current - args.len();
            for index in unmatched.into_iter().rev().take(excess) {
                self.release(ConnectorRef::socket(stub, index), false)?;
                self.get_mut(stub)?.sockets.remove(index);
            }
        }

        let remaining = self.get(stub)?.sockets.len();
        if remaining > args.len() {
            warn!(stub, parent, expected = args.len(), found = remaining, "caller out of sync");
            return Err(GraphError::StubOutOfSync {
                stub,
                parent,
                expected: args.len(),
                found: remaining,
            });
        }

        let block = self.get_mut(stub)?;
        for (index, arg) in args.iter().enumerate() {
            match block.sockets.get_mut(index) {
                Some(socket) => {
                    socket.kind = arg.kind.clone();
                    socket.init_kind = arg.init_kind.clone();
                    socket.label = arg.label.clone();
                }
                None => block.sockets.push(arg.template()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_graph;
    use crate::link::Link;

    fn plug_into(graph: &mut BlockGraph, plug: BlockId, host: BlockId, index: usize) {
        Link::between(graph, ConnectorRef::plug(plug), ConnectorRef::socket(host, index))
            .unwrap()
            .connect(graph)
            .unwrap();
    }

    /// A procedure with one argument block plugged into its first arg socket.
    fn procedure_with_arg(graph: &mut BlockGraph, arg_label: &str) -> (BlockId, BlockId) {
        let proc_id = graph.create_block("procedure").unwrap();
        let arg = graph.create_block("argument").unwrap();
        graph.set_label(arg, arg_label).unwrap();
        plug_into(graph, arg, proc_id, 1);
        (proc_id, arg)
    }

    #[test]
    fn test_create_getter_seeds_kind() {
        let mut graph = sample_graph();
        let var = graph.create_block("global-var").unwrap();
        let getter = graph.create_stub(var, StubKind::Getter).unwrap();
        let setter = graph.create_stub(var, StubKind::Setter).unwrap();

        let block = graph.block(getter).unwrap();
        assert_eq!(block.genus_name(), "getterglobal-var");
        assert_eq!(block.label(), "x");
        assert_eq!(block.plug().unwrap().kind, "number");
        assert_eq!(graph.block(setter).unwrap().socket(0).unwrap().kind, "number");
        assert_eq!(graph.stub_parent(getter), Some(var));
        assert_eq!(graph.stubs_of(var).unwrap(), vec![getter, setter]);
        // Stubs draw in the parent's color.
        assert_eq!(graph.color_of(getter), graph.color_of(var));
    }

    #[test]
    fn test_seeded_kinds_ignore_parent_changes() {
        let mut graph = sample_graph();
        let var = graph.create_block("global-var").unwrap();
        let getter = graph.create_stub(var, StubKind::Getter).unwrap();
        let setter = graph.create_stub(var, StubKind::Setter).unwrap();

        graph
            .replace_socket(var, 0, Connector::new("string", PositionType::Single))
            .unwrap();
        graph
            .add_socket(var, Connector::new("boolean", PositionType::Single))
            .unwrap();
        assert_eq!(graph.block(getter).unwrap().plug().unwrap().kind, "number");
        let setter_block = graph.block(setter).unwrap();
        assert_eq!(setter_block.num_sockets(), 1);
        assert_eq!(setter_block.socket(0).unwrap().kind, "number");

        // Callers of a procedure do resync on the same kind of change.
        let (proc_id, _) = procedure_with_arg(&mut graph, "n");
        let caller = graph.create_stub(proc_id, StubKind::Caller).unwrap();
        graph
            .replace_socket(proc_id, 1, Connector::new("string", PositionType::Single).with_label("s"))
            .unwrap();
        let block = graph.block(caller).unwrap();
        assert_eq!(block.num_sockets(), 1);
        assert_eq!(block.socket(0).unwrap().kind, "string");
        assert_eq!(block.socket(0).unwrap().label, "s");
    }

    #[test]
    fn test_ambiguous_surplus_is_out_of_sync() {
        let mut graph = sample_graph();
        let (proc_id, _) = procedure_with_arg(&mut graph, "n");
        let twin = graph.create_block("argument").unwrap();
        graph.set_label(twin, "n").unwrap();
        plug_into(&mut graph, twin, proc_id, 2);
        let caller = graph.create_stub(proc_id, StubKind::Caller).unwrap();
        assert_eq!(graph.block(caller).unwrap().num_sockets(), 2);

        // Both caller sockets are named "n", so neither can be told apart.
        let link = Link::between(&graph, ConnectorRef::plug(twin), ConnectorRef::socket(proc_id, 2)).unwrap();
        assert_eq!(
            link.disconnect(&mut graph),
            Err(GraphError::StubOutOfSync {
                stub: caller,
                parent: proc_id,
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn test_undeclared_kind_is_rejected() {
        let mut graph = sample_graph();
        let var = graph.create_block("global-var").unwrap();
        assert_eq!(
            graph.create_stub(var, StubKind::Caller),
            Err(GraphError::StubKindNotDeclared {
                genus: "global-var".to_string(),
                kind: StubKind::Caller
            })
        );
        let print = graph.create_block("print").unwrap();
        assert!(graph.create_stub(print, StubKind::Getter).is_err());
    }

    #[test]
    fn test_param_getter_seeds_from_plug() {
        let mut graph = sample_graph();
        let arg = graph.create_block("argument").unwrap();
        let getter = graph.create_stub(arg, StubKind::Getter).unwrap();
        assert_eq!(graph.block(getter).unwrap().plug().unwrap().kind, "number");
    }

    #[test]
    fn test_rename_moves_stubs() {
        let mut graph = sample_graph();
        let var = graph.create_block("global-var").unwrap();
        let a = graph.create_stub(var, StubKind::Getter).unwrap();
        let b = graph.create_stub(var, StubKind::Setter).unwrap();

        graph.set_label(var, "total").unwrap();
        let old_key = StubKey::new("x", "global-var");
        let new_key = StubKey::new("total", "global-var");
        assert!(!graph.stub_registry().has_stubs(&old_key));
        assert_eq!(graph.stub_registry().stubs(&new_key), vec![a, b]);
        assert_eq!(graph.block(a).unwrap().label(), "total");
        assert_eq!(graph.block(b).unwrap().stub().unwrap().parent_name, "total");
        assert_eq!(graph.stub_parent(a), Some(var));
    }

    #[test]
    fn test_page_label_propagates() {
        let mut graph = sample_graph();
        let var = graph.create_block("global-var").unwrap();
        let getter = graph.create_stub(var, StubKind::Getter).unwrap();
        graph.set_page_label(var, Some("sprite")).unwrap();
        assert_eq!(graph.block(getter).unwrap().page_label(), Some("sprite"));
    }

    #[test]
    fn test_caller_tracks_arguments() {
        let mut graph = sample_graph();
        let (proc_id, arg) = procedure_with_arg(&mut graph, "n");
        let caller = graph.create_stub(proc_id, StubKind::Caller).unwrap();

        let block = graph.block(caller).unwrap();
        assert!(block.before().is_some() && block.after().is_some());
        assert!(block.plug().is_none());
        assert_eq!(block.num_sockets(), 1);
        assert_eq!(block.socket(0).unwrap().label, "n");
        assert_eq!(block.socket(0).unwrap().kind, "number");

        // A second argument grows the caller.
        let second = graph.create_block("argument").unwrap();
        graph.set_label(second, "m").unwrap();
        plug_into(&mut graph, second, proc_id, 2);
        let labels: Vec<&str> = graph.block(caller).unwrap().sockets().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["n", "m"]);

        // Renaming an argument relabels the caller socket.
        graph.set_label(arg, "count").unwrap();
        assert_eq!(graph.block(caller).unwrap().socket(0).unwrap().label, "count");
    }

    #[test]
    fn test_caller_drops_removed_argument_by_name() {
        let mut graph = sample_graph();
        let (proc_id, first) = procedure_with_arg(&mut graph, "n");
        let second = graph.create_block("argument").unwrap();
        graph.set_label(second, "m").unwrap();
        plug_into(&mut graph, second, proc_id, 2);
        let caller = graph.create_stub(proc_id, StubKind::Caller).unwrap();

        // Something plugged into the caller's "m" socket must survive.
        let value = graph.create_block("number").unwrap();
        plug_into(&mut graph, value, caller, 1);

        let link = Link::between(&graph, ConnectorRef::plug(first), ConnectorRef::socket(proc_id, 1)).unwrap();
        link.disconnect(&mut graph).unwrap();

        let block = graph.block(caller).unwrap();
        assert_eq!(block.num_sockets(), 1);
        assert_eq!(block.socket(0).unwrap().label, "m");
        assert_eq!(block.socket(0).unwrap().occupant(), Some(value));
    }

    #[test]
    fn test_caller_follows_parent_plug() {
        let mut graph = sample_graph();
        let proc_id = graph.create_block("procedure").unwrap();
        let caller = graph.create_stub(proc_id, StubKind::Caller).unwrap();
        let next = graph.create_block("print").unwrap();
        Link::between(&graph, ConnectorRef::before(next), ConnectorRef::after(caller))
            .unwrap()
            .connect(&mut graph)
            .unwrap();

        graph
            .set_plug(proc_id, Some(Connector::new("number", PositionType::Single)))
            .unwrap();
        let block = graph.block(caller).unwrap();
        assert_eq!(block.plug().unwrap().kind, "number");
        assert!(block.before().is_none() && block.after().is_none());
        assert!(!graph.block(next).unwrap().before().unwrap().has_block());

        graph.set_plug(proc_id, None).unwrap();
        let block = graph.block(caller).unwrap();
        assert!(block.plug().is_none());
        assert!(block.before().is_some() && block.after().is_some());
    }

    /// Puts a print block in the procedure body and a getter in its socket, so
    /// the getter's tree is the procedure's tree.
    fn getter_in_body(graph: &mut BlockGraph, proc_id: BlockId, arg: BlockId) -> BlockId {
        let print = graph.create_block("print").unwrap();
        Link::between(graph, ConnectorRef::before(print), ConnectorRef::socket(proc_id, 0))
            .unwrap()
            .connect(graph)
            .unwrap();
        let getter = graph.create_stub(arg, StubKind::Getter).unwrap();
        graph
            .attach(ConnectorRef::plug(getter), ConnectorRef::socket(print, 0), false)
            .unwrap();
        getter
    }

    #[test]
    fn test_param_rename_moves_only_local_stubs() {
        let mut graph = sample_graph();
        let (p1, a1) = procedure_with_arg(&mut graph, "a");
        let (p2, a2) = procedure_with_arg(&mut graph, "a");
        let g1 = getter_in_body(&mut graph, p1, a1);
        let g2 = getter_in_body(&mut graph, p2, a2);
        assert_eq!(graph.stub_parent(g1), Some(a1));
        assert_eq!(graph.stub_parent(g2), Some(a2));

        graph.set_label(a1, "b").unwrap();
        assert_eq!(graph.block(g1).unwrap().label(), "b");
        assert_eq!(graph.block(g2).unwrap().label(), "a");
        assert_eq!(graph.stub_registry().stubs(&StubKey::new("a", "argument")), vec![g2]);
        assert_eq!(graph.stub_parent(g1), Some(a1));
    }

    #[test]
    fn test_unresolved_stub_with_two_parents() {
        let mut graph = sample_graph();
        let (_, a1) = procedure_with_arg(&mut graph, "a");
        let (_, _a2) = procedure_with_arg(&mut graph, "a");
        // A loose getter is in neither procedure's tree.
        let loose = graph.create_stub(a1, StubKind::Getter).unwrap();
        assert_eq!(graph.stub_parent(loose), None);
        assert!(graph.stubs_of(a1).unwrap().is_empty());
    }
}
