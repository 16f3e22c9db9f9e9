//! The block arena.
//!
//! [`BlockGraph`] owns every live block keyed by ID together with the stub
//! registries, the complaint log and the render hook. Every operation that can
//! touch more than one block goes through it.

use std::fmt;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::genus::{Genus, GenusRegistry, StubKind};
use crate::model::{
    Block, BlockId, BlockVariant, Complaints, Connector, ConnectorRef, ConnectorSlot, IdAllocator,
};
use crate::notify::{RenderEvent, RenderNotifier};
use crate::stub::{StubKey, StubRegistry};

/// Decides which sockets of a declaration block are argument sockets that
/// caller stubs mirror.
pub type ArgumentPredicate = fn(&Genus, &Connector) -> bool;

/// Default argument predicate: non-command sockets of a genus that declares
/// callers. Expandable sockets count only once occupied, so the trailing empty
/// slot of an argument group is not an argument.
pub fn is_argument_socket(genus: &Genus, connector: &Connector) -> bool {
    genus.declares_stub(StubKind::Caller)
        && !connector.is_command()
        && (!connector.expandable || connector.has_block())
}

pub struct BlockGraph {
    genera: GenusRegistry,
    blocks: FxHashMap<BlockId, Block>,
    ids: IdAllocator,
    pub(crate) stubs: StubRegistry,
    config: GraphConfig,
    argument_socket: ArgumentPredicate,
    notifier: Option<Box<dyn RenderNotifier>>,
    complaints: Complaints,
}

impl fmt::Debug for BlockGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockGraph")
            .field("blocks", &self.blocks.len())
            .field("next_id", &self.ids.peek())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BlockGraph {
    /// An empty graph over `genera` with the default configuration.
    pub fn new(genera: GenusRegistry) -> Self {
        Self::with_config(genera, GraphConfig::default())
    }

    /// An empty graph over `genera` using `config`.
    pub fn with_config(genera: GenusRegistry, config: GraphConfig) -> Self {
        Self {
            genera,
            blocks: FxHashMap::default(),
            ids: IdAllocator::new(),
            stubs: StubRegistry::new(),
            config,
            argument_socket: is_argument_socket,
            notifier: None,
            complaints: Complaints::new(),
        }
    }

    pub fn genera(&self) -> &GenusRegistry {
        &self.genera
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn stub_registry(&self) -> &StubRegistry {
        &self.stubs
    }

    /// Replaces the rule deciding which declaration sockets callers mirror.
    pub fn set_argument_predicate(&mut self, predicate: ArgumentPredicate) {
        self.argument_socket = predicate;
    }

    pub(crate) fn argument_predicate(&self) -> ArgumentPredicate {
        self.argument_socket
    }

    /// Installs the view hook that receives every [`RenderEvent`].
    pub fn set_notifier(&mut self, notifier: impl RenderNotifier + 'static) {
        self.notifier = Some(Box::new(notifier));
    }

    pub(crate) fn notify(&self, block: BlockId, event: RenderEvent) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(block, event);
        }
    }

    /// Clears every block and registry entry and restarts ID allocation.
    pub fn reset(&mut self) {
        debug!(blocks = self.blocks.len(), "resetting block graph");
        self.blocks.clear();
        self.stubs.clear();
        self.ids.reset();
        self.complaints.clear();
    }

    /// Switches language: full reset, then a new registry.
    pub fn replace_language(&mut self, genera: GenusRegistry) {
        self.reset();
        self.genera = genera;
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// All block IDs in ascending order.
    pub fn ids(&self) -> Vec<BlockId> {
        let mut ids: Vec<BlockId> = self.blocks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Live blocks in no particular order. Use [`ids`](Self::ids) for a
    /// stable order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.values()
    }

    pub(crate) fn get(&self, id: BlockId) -> Result<&Block, GraphError> {
        self.blocks.get(&id).ok_or(GraphError::UnknownBlock { id })
    }

    pub(crate) fn get_mut(&mut self, id: BlockId) -> Result<&mut Block, GraphError> {
        self.blocks.get_mut(&id).ok_or(GraphError::UnknownBlock { id })
    }

    pub(crate) fn lookup_genus(&self, name: &str) -> Result<&Genus, GraphError> {
        self.genera.lookup(name).ok_or_else(|| GraphError::UnknownGenus {
            name: name.to_string(),
        })
    }

    /// The genus of a live block.
    pub fn genus_of(&self, id: BlockId) -> Result<&Genus, GraphError> {
        let block = self.get(id)?;
        self.lookup_genus(&block.genus)
    }

    /// The connector at `at`, or `MissingConnector` if the block lacks it.
    pub fn connector(&self, at: ConnectorRef) -> Result<&Connector, GraphError> {
        self.get(at.block)?
            .connector(at.slot)
            .ok_or(GraphError::MissingConnector {
                block: at.block,
                slot: at.slot,
            })
    }

    pub(crate) fn connector_mut(&mut self, at: ConnectorRef) -> Result<&mut Connector, GraphError> {
        self.get_mut(at.block)?
            .connector_mut(at.slot)
            .ok_or(GraphError::MissingConnector {
                block: at.block,
                slot: at.slot,
            })
    }

    /// The slot of `block` whose occupant is `other`.
    pub fn connector_to(&self, block: BlockId, other: BlockId) -> Option<ConnectorSlot> {
        self.blocks.get(&block)?.connector_to(other)
    }

    /// Display color. Stubs use their parent genus color.
    pub fn color_of(&self, id: BlockId) -> Option<[u8; 3]> {
        let block = self.blocks.get(&id)?;
        let genus = match block.stub() {
            Some(info) => self.genera.lookup(&info.parent_genus)?,
            None => self.genera.lookup(&block.genus)?,
        };
        Some(genus.color)
    }

    /// The block this one hangs from: the holder of its plug, else the holder
    /// of its before connector.
    pub fn parent_of(&self, id: BlockId) -> Option<BlockId> {
        let block = self.blocks.get(&id)?;
        block
            .plug
            .as_ref()
            .and_then(Connector::occupant)
            .or_else(|| block.before.as_ref().and_then(Connector::occupant))
    }

    /// Top of the tree containing `id`.
    pub fn root_of(&self, id: BlockId) -> BlockId {
        let mut current = id;
        for _ in 0..=self.blocks.len() {
            match self.parent_of(current) {
                Some(parent) => current = parent,
                None => return current,
            }
        }
        current
    }

    /// True if `ancestor` is reached by walking up from `id` (exclusive).
    pub fn is_ancestor(&self, ancestor: BlockId, id: BlockId) -> bool {
        let mut current = id;
        for _ in 0..=self.blocks.len() {
            match self.parent_of(current) {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// Last block of the command sequence starting at `id`.
    pub fn sequence_tail(&self, id: BlockId) -> BlockId {
        let mut current = id;
        for _ in 0..=self.blocks.len() {
            let next = self
                .blocks
                .get(&current)
                .and_then(|b| b.after.as_ref())
                .and_then(Connector::occupant);
            match next {
                Some(next) => current = next,
                None => return current,
            }
        }
        current
    }

    // =========================================================================
    // Construction and removal
    // =========================================================================

    /// Creates a block of `genus_name` with fresh connector copies.
    pub fn create_block(&mut self, genus_name: &str) -> Result<BlockId, GraphError> {
        let genus = self.genera.get(genus_name).ok_or_else(|| GraphError::UnknownGenus {
            name: genus_name.to_string(),
        })?;
        let unique = genus.label_unique;
        let mut block = Block::from_genus(0, genus, BlockVariant::Plain);
        if unique {
            block.label = self.unique_label(genus_name, &block.label, None);
        }
        let id = self.ids.allocate();
        block.id = id;
        self.insert(block);
        Ok(id)
    }

    pub(crate) fn allocate_id(&mut self) -> BlockId {
        self.ids.allocate()
    }

    pub(crate) fn id_allocator_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    /// The ID the next created block receives.
    pub fn next_id(&self) -> BlockId {
        self.ids.peek()
    }

    /// Publishes a fully built block and registers it with the stub registries.
    pub(crate) fn insert(&mut self, block: Block) {
        let id = block.id;
        match &block.variant {
            BlockVariant::Stub(info) => self.stubs.add_stub(info.key(), id),
            BlockVariant::Plain => {
                let declares = self.genera.get(&block.genus).is_some_and(Genus::has_stubs);
                if declares && self.config.stub_linking {
                    self.stubs
                        .register_parent(StubKey::new(block.label.as_str(), block.genus.as_str()), id);
                }
            }
        }
        trace!(id, genus = %block.genus, "inserted block");
        self.ids.claim(id);
        self.blocks.insert(id, block);
        self.notify(id, RenderEvent::Repaint);
    }

    /// Removes a block: disconnects it, drops its registry entries and
    /// complaints, and returns it.
    pub fn remove_block(&mut self, id: BlockId) -> Result<Block, GraphError> {
        self.disconnect_all(id)?;
        let block = self.blocks.remove(&id).ok_or(GraphError::UnknownBlock { id })?;
        match &block.variant {
            BlockVariant::Stub(info) => self.stubs.remove_stub(&info.key(), id),
            BlockVariant::Plain => self
                .stubs
                .remove_parent(&StubKey::new(block.label.as_str(), block.genus.as_str()), id),
        }
        self.complaints.clear_block(id);
        debug!(id, "removed block");
        Ok(block)
    }

    /// Disconnects every occupant of the block's connectors.
    pub fn disconnect_all(&mut self, id: BlockId) -> Result<(), GraphError> {
        while let Some(slot) = self.get(id)?.first_occupied() {
            self.release(ConnectorRef::new(id, slot), true)?;
        }
        Ok(())
    }

    /// A label not used by any other block of `genus_name`, derived from `base`.
    pub fn unique_label(&self, genus_name: &str, base: &str, exclude: Option<BlockId>) -> String {
        let taken = |label: &str| {
            self.blocks.values().any(|b| {
                Some(b.id) != exclude && !b.is_stub() && b.genus == genus_name && b.label == label
            })
        };
        if !taken(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}{}", base, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    // =========================================================================
    // Block state
    // =========================================================================

    /// Sets the label. Renaming a declaration moves its stubs; renaming a
    /// block plugged into a declaration's argument socket resyncs callers.
    pub fn set_label(&mut self, id: BlockId, label: &str) -> Result<(), GraphError> {
        let block = self.get(id)?;
        if block.label == label {
            return Ok(());
        }
        let old = block.label.clone();
        let genus_name = block.genus.clone();
        let is_stub = block.is_stub();
        if !is_stub
            && self.lookup_genus(&genus_name)?.label_unique
            && self.unique_label(&genus_name, label, Some(id)) != label
        {
            return Err(GraphError::DuplicateLabel {
                genus: genus_name,
                label: label.to_string(),
            });
        }
        let was_parent = !is_stub && self.stubs.is_parent(&StubKey::new(old.as_str(), genus_name.as_str()), id);

        self.get_mut(id)?.label = label.to_string();
        if was_parent {
            self.rename_parent(id, &old, label)?;
        }
        if let Some(host) = self.get(id)?.plug.as_ref().and_then(Connector::occupant) {
            self.parent_connectors_changed(host)?;
        }
        self.notify(id, RenderEvent::Repaint);
        Ok(())
    }

    /// Sets or clears the page label and copies it to the block's stubs.
    pub fn set_page_label(&mut self, id: BlockId, page_label: Option<&str>) -> Result<(), GraphError> {
        self.get_mut(id)?.page_label = page_label.map(str::to_string);
        self.parent_page_label_changed(id)?;
        self.notify(id, RenderEvent::Repaint);
        Ok(())
    }

    /// Swaps the genus. Connector occupancy is untouched; the label falls back
    /// to the new genus's initial label unless `preserve_label` is set.
    ///
    /// When the genus stays the same, a label reset is a rename and the stubs
    /// follow it. Under a different genus the old stubs keep their key and
    /// resolve to no parent.
    pub fn change_genus(&mut self, id: BlockId, genus_name: &str, preserve_label: bool) -> Result<(), GraphError> {
        let block = self.get(id)?;
        if block.is_stub() {
            return Err(GraphError::StubGenusChange { id });
        }
        let old_key = StubKey::new(block.label.as_str(), block.genus.as_str());
        let genus = self.genera.get(genus_name).ok_or_else(|| GraphError::UnknownGenus {
            name: genus_name.to_string(),
        })?;
        let initial_label = genus.initial_label.clone();
        let declares = genus.has_stubs();
        let was_parent = self.stubs.is_parent(&old_key, id);

        let block = self.get_mut(id)?;
        block.genus = genus_name.to_string();
        if !preserve_label {
            block.label = initial_label;
        }
        let new_key = StubKey::new(block.label.as_str(), genus_name);
        if was_parent && new_key.genus == old_key.genus {
            if new_key.name != old_key.name {
                self.rename_parent(id, &old_key.name, &new_key.name)?;
            }
        } else {
            self.stubs.remove_parent(&old_key, id);
            if declares && self.config.stub_linking {
                self.stubs.register_parent(new_key, id);
            }
        }
        debug!(id, genus = genus_name, "changed genus");
        self.notify(id, RenderEvent::Repaint);
        Ok(())
    }

    /// Overrides a language-specific property on this block only.
    pub fn set_property(&mut self, id: BlockId, key: &str, value: &str) -> Result<(), GraphError> {
        self.get_mut(id)?
            .properties
            .insert(key.to_string(), value.to_string());
        self.notify(id, RenderEvent::Repaint);
        Ok(())
    }

    pub fn remove_property(&mut self, id: BlockId, key: &str) -> Result<Option<String>, GraphError> {
        let removed = self.get_mut(id)?.properties.remove(key);
        self.notify(id, RenderEvent::Repaint);
        Ok(removed)
    }

    /// Property lookup: block override first, then the genus.
    pub fn property(&self, id: BlockId, key: &str) -> Option<&str> {
        let block = self.blocks.get(&id)?;
        block
            .property(key)
            .or_else(|| self.genera.lookup(&block.genus).and_then(|g| g.property(key)))
    }

    /// Flags the block with a compiler error message.
    pub fn mark_bad(&mut self, id: BlockId, message: &str) -> Result<(), GraphError> {
        self.get_mut(id)?.error = Some(message.to_string());
        self.notify(id, RenderEvent::Repaint);
        Ok(())
    }

    pub fn clear_bad(&mut self, id: BlockId) -> Result<(), GraphError> {
        self.get_mut(id)?.error = None;
        self.notify(id, RenderEvent::Repaint);
        Ok(())
    }

    pub fn set_focus(&mut self, id: BlockId, focus: bool) -> Result<(), GraphError> {
        self.get_mut(id)?.focus = focus;
        self.notify(id, RenderEvent::Repaint);
        Ok(())
    }

    // =========================================================================
    // Complaints
    // =========================================================================

    /// Records a code generator complaint against a block.
    pub fn post_complaint(&mut self, id: BlockId, message: impl Into<String>) -> Result<(), GraphError> {
        self.get(id)?;
        self.complaints.post(id, message);
        self.notify(id, RenderEvent::Repaint);
        Ok(())
    }

    pub fn complaints(&self) -> &Complaints {
        &self.complaints
    }

    pub fn clear_complaints(&mut self) {
        self.complaints.clear();
    }

    // =========================================================================
    // Connectors
    // =========================================================================

    fn check_index(&self, id: BlockId, index: usize, inclusive: bool) -> Result<(), GraphError> {
        let count = self.get(id)?.sockets.len();
        let ok = if inclusive { index <= count } else { index < count };
        if ok {
            Ok(())
        } else {
            Err(GraphError::SocketOutOfRange { block: id, index, count })
        }
    }

    /// Appends a socket built from `connector` and returns its index.
    pub fn add_socket(&mut self, id: BlockId, connector: Connector) -> Result<usize, GraphError> {
        let index = self.get(id)?.sockets.len();
        self.insert_socket(id, index, connector)?;
        Ok(index)
    }

    /// Inserts a socket at `index`; `index` may equal the socket count.
    pub fn insert_socket(&mut self, id: BlockId, index: usize, connector: Connector) -> Result<(), GraphError> {
        self.check_index(id, index, true)?;
        self.get_mut(id)?.sockets.insert(index, connector.template());
        self.sockets_changed(id)
    }

    /// Replaces the socket at `index`, disconnecting its occupant first.
    pub fn replace_socket(&mut self, id: BlockId, index: usize, connector: Connector) -> Result<(), GraphError> {
        self.check_index(id, index, false)?;
        self.release(ConnectorRef::socket(id, index), false)?;
        self.get_mut(id)?.sockets[index] = connector.template();
        self.sockets_changed(id)
    }

    /// Removes the socket at `index`, disconnecting its occupant first.
    pub fn remove_socket(&mut self, id: BlockId, index: usize) -> Result<Connector, GraphError> {
        self.check_index(id, index, false)?;
        self.release(ConnectorRef::socket(id, index), false)?;
        let removed = self.get_mut(id)?.sockets.remove(index);
        self.sockets_changed(id)?;
        Ok(removed)
    }

    /// Replaces the plug, disconnecting the old plug's occupant first.
    pub fn set_plug(&mut self, id: BlockId, plug: Option<Connector>) -> Result<(), GraphError> {
        if self.get(id)?.plug.is_some() {
            self.release(ConnectorRef::plug(id), true)?;
        }
        self.get_mut(id)?.plug = plug.map(|p| p.template());
        self.parent_plug_changed(id)?;
        self.notify(id, RenderEvent::ConnectorChanged);
        Ok(())
    }

    fn sockets_changed(&mut self, id: BlockId) -> Result<(), GraphError> {
        self.parent_connectors_changed(id)?;
        self.notify(id, RenderEvent::ConnectorChanged);
        Ok(())
    }

    /// Joins a plug-side connector to a socket-side connector. Both must be
    /// empty. When `expand` is set an expandable socket grows its group.
    pub(crate) fn attach(&mut self, plug: ConnectorRef, socket: ConnectorRef, expand: bool) -> Result<(), GraphError> {
        if let Some(occupant) = self.connector(plug)?.occupant() {
            return Err(GraphError::PlugOccupied { plug, occupant });
        }
        if let Some(occupant) = self.connector(socket)?.occupant() {
            return Err(GraphError::BrokenReciprocity { at: socket, occupant });
        }
        self.connector_mut(plug)?.set_occupant(Some(socket.block));
        self.connector_mut(socket)?.set_occupant(Some(plug.block));
        debug!(plug = ?plug, socket = ?socket, "connected");

        if expand {
            if let ConnectorSlot::Socket(index) = socket.slot {
                self.expand_socket_group(socket.block, index)?;
            }
        }
        self.notify(plug.block, RenderEvent::ConnectorChanged);
        self.notify(socket.block, RenderEvent::ConnectorChanged);
        if let ConnectorSlot::Socket(_) = socket.slot {
            self.parent_connectors_changed(socket.block)?;
        }
        Ok(())
    }

    /// Clears both sides of a join. When `shrink` is set an expandable socket
    /// may give back its group.
    pub(crate) fn detach(&mut self, plug: ConnectorRef, socket: ConnectorRef, shrink: bool) -> Result<(), GraphError> {
        self.connector_mut(plug)?.set_occupant(None);
        self.connector_mut(socket)?.set_occupant(None);
        debug!(plug = ?plug, socket = ?socket, "disconnected");

        if shrink {
            if let ConnectorSlot::Socket(index) = socket.slot {
                self.shrink_socket_group(socket.block, index)?;
            }
        }
        self.notify(plug.block, RenderEvent::Disconnected);
        self.notify(socket.block, RenderEvent::Disconnected);
        if let ConnectorSlot::Socket(_) = socket.slot {
            self.parent_connectors_changed(socket.block)?;
        }
        Ok(())
    }

    /// Disconnects whatever occupies `at`. Returns the former occupant.
    pub(crate) fn release(&mut self, at: ConnectorRef, shrink: bool) -> Result<Option<BlockId>, GraphError> {
        let Some(occupant) = self.connector(at)?.occupant() else {
            return Ok(None);
        };
        let back = self
            .connector_to(occupant, at.block)
            .ok_or(GraphError::BrokenReciprocity { at, occupant })?;
        let other = ConnectorRef::new(occupant, back);
        if at.slot.is_plug_side() {
            self.detach(at, other, shrink)?;
        } else {
            self.detach(other, at, shrink)?;
        }
        Ok(Some(occupant))
    }

    /// Length of the expand-group run `index` belongs to, or `None` when the
    /// socket is not in a declared group.
    fn group_run_len(&self, id: BlockId, index: usize) -> Result<Option<usize>, GraphError> {
        let socket = self.connector(ConnectorRef::socket(id, index))?;
        if !socket.in_expand_group() {
            return Ok(None);
        }
        let len = self
            .genus_of(id)?
            .expand_group(&socket.expand_group)
            .map(<[Connector]>::len)
            .filter(|len| *len > 0);
        Ok(len)
    }

    /// Inserts a fresh copy of the socket's expand-group run right after the
    /// run holding it, when that run has just received its first occupant.
    /// Returns the number of sockets added.
    pub fn expand_socket_group(&mut self, id: BlockId, index: usize) -> Result<usize, GraphError> {
        let Some(run_len) = self.group_run_len(id, index)? else {
            return Ok(0);
        };
        let block = self.get(id)?;
        let group_name = block.sockets[index].expand_group.clone();
        let (start, end) = group_run(&block.sockets, index, run_len);
        if (start..end).any(|i| i != index && block.sockets[i].has_block()) {
            return Ok(0);
        }
        let run: Vec<Connector> = match self.genus_of(id)?.expand_group(&group_name) {
            Some(run) => run.iter().map(Connector::template).collect(),
            None => return Ok(0),
        };
        self.get_mut(id)?.sockets.splice(end..end, run);
        debug!(id, group = %group_name, added = run_len, "expanded socket group");
        Ok(run_len)
    }

    /// Removes the expand-group run holding `index` when every connector of
    /// the run is empty and another empty connector of the same shape remains
    /// on the block. Returns whether the run was removed.
    pub fn shrink_socket_group(&mut self, id: BlockId, index: usize) -> Result<bool, GraphError> {
        let Some(run_len) = self.group_run_len(id, index)? else {
            return Ok(false);
        };
        let block = self.get(id)?;
        let socket = &block.sockets[index];
        if socket.has_block() {
            return Ok(false);
        }
        let (start, end) = group_run(&block.sockets, index, run_len);
        if end - start != run_len {
            return Ok(false);
        }
        let run = &block.sockets[start..end];
        if run.iter().any(|c| c.has_block() || c.expand_group != socket.expand_group) {
            return Ok(false);
        }
        let shape = socket.shape();
        let representative = block
            .sockets
            .iter()
            .enumerate()
            .any(|(i, c)| (i < start || i >= end) && !c.has_block() && c.shape() == shape);
        if !representative {
            return Ok(false);
        }
        let group_name = socket.expand_group.clone();
        self.get_mut(id)?.sockets.drain(start..end);
        debug!(id, group = %group_name, removed = run_len, "shrank socket group");
        Ok(true)
    }

    /// Fills the socket with its declared default argument if it is empty.
    /// Returns the new block, or `None` when nothing was created.
    pub fn link_default_argument(&mut self, id: BlockId, index: usize) -> Result<Option<BlockId>, GraphError> {
        let socket = self.connector(ConnectorRef::socket(id, index))?;
        let Some(arg) = socket.default_arg.clone() else {
            return Ok(None);
        };
        if socket.has_block() {
            return Ok(None);
        }
        let genus = self.lookup_genus(&arg.genus)?;
        let slot = if genus.plug.is_some() {
            ConnectorSlot::Plug
        } else if genus.before.is_some() {
            ConnectorSlot::Before
        } else {
            return Err(GraphError::UnpluggableDefaultArgument { genus: arg.genus });
        };

        let arg_id = self.create_block(&arg.genus)?;
        let linked = if arg.label.is_empty() {
            Ok(())
        } else {
            self.set_label(arg_id, &arg.label)
        }
        .and_then(|()| self.attach(ConnectorRef::new(arg_id, slot), ConnectorRef::socket(id, index), true));
        if let Err(e) = linked {
            self.remove_block(arg_id)?;
            return Err(e);
        }
        Ok(Some(arg_id))
    }

    /// Runs [`link_default_argument`](Self::link_default_argument) on every socket.
    pub fn link_default_arguments(&mut self, id: BlockId) -> Result<Vec<BlockId>, GraphError> {
        let mut created = Vec::new();
        let mut index = 0;
        while index < self.get(id)?.sockets.len() {
            if let Some(arg) = self.link_default_argument(id, index)? {
                created.push(arg);
            }
            index += 1;
        }
        Ok(created)
    }
}

/// Bounds of the run holding socket `index`. Runs of `run_len` tile the
/// contiguous stretch of sockets sharing its expand group, from the start of
/// that stretch; a trailing partial run is clipped to the stretch.
fn group_run(sockets: &[Connector], index: usize, run_len: usize) -> (usize, usize) {
    let group = &sockets[index].expand_group;
    let same = |c: &Connector| c.in_expand_group() && c.expand_group == *group;
    let mut first = index;
    while first > 0 && same(&sockets[first - 1]) {
        first -= 1;
    }
    let mut last = index + 1;
    while last < sockets.len() && same(&sockets[last]) {
        last += 1;
    }
    let start = first + (index - first) / run_len * run_len;
    (start, (start + run_len).min(last))
}
