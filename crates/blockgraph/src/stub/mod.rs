//! Stubs: getter/setter/caller/agent blocks that mirror a declaration block.
//!
//! Parents and stubs meet in two name-keyed registries. A key is the parent's
//! label plus its genus, so a stub finds its parent again after a save/load
//! without holding its ID.

mod sync;

use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::genus::StubKind;
use crate::model::BlockId;

/// Registry key: parent label + parent genus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StubKey {
    pub name: String,
    pub genus: String,
}

impl StubKey {
    pub fn new(name: impl Into<String>, genus: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            genus: genus.into(),
        }
    }
}

impl fmt::Display for StubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.genus)
    }
}

/// What a stub block knows about its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubInfo {
    pub parent_name: String,
    pub parent_genus: String,
    pub kind: StubKind,
}

impl StubInfo {
    pub fn key(&self) -> StubKey {
        StubKey::new(self.parent_name.as_str(), self.parent_genus.as_str())
    }
}

/// parent key → parent block IDs, and parent key → stub block IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubRegistry {
    parents: FxHashMap<StubKey, BTreeSet<BlockId>>,
    stubs: FxHashMap<StubKey, BTreeSet<BlockId>>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_parent(&mut self, key: StubKey, parent: BlockId) {
        self.parents.entry(key).or_default().insert(parent);
    }

    pub fn remove_parent(&mut self, key: &StubKey, parent: BlockId) {
        remove_from(&mut self.parents, key, parent);
    }

    pub fn is_parent(&self, key: &StubKey, parent: BlockId) -> bool {
        self.parents.get(key).is_some_and(|set| set.contains(&parent))
    }

    pub fn parents(&self, key: &StubKey) -> Vec<BlockId> {
        self.parents.get(key).map(|set| set.iter().copied().collect()).unwrap_or_default()
    }

    pub fn add_stub(&mut self, key: StubKey, stub: BlockId) {
        self.stubs.entry(key).or_default().insert(stub);
    }

    pub fn remove_stub(&mut self, key: &StubKey, stub: BlockId) {
        remove_from(&mut self.stubs, key, stub);
    }

    pub fn stubs(&self, key: &StubKey) -> Vec<BlockId> {
        self.stubs.get(key).map(|set| set.iter().copied().collect()).unwrap_or_default()
    }

    pub fn has_stubs(&self, key: &StubKey) -> bool {
        self.stubs.get(key).is_some_and(|set| !set.is_empty())
    }

    pub fn move_stub(&mut self, from: &StubKey, to: StubKey, stub: BlockId) {
        self.remove_stub(from, stub);
        self.add_stub(to, stub);
    }

    /// Every registered parent ID.
    pub fn all_parents(&self) -> impl Iterator<Item = (&StubKey, BlockId)> + '_ {
        self.parents.iter().flat_map(|(key, set)| set.iter().map(move |id| (key, *id)))
    }

    /// Every registered stub ID.
    pub fn all_stubs(&self) -> impl Iterator<Item = (&StubKey, BlockId)> + '_ {
        self.stubs.iter().flat_map(|(key, set)| set.iter().map(move |id| (key, *id)))
    }

    pub fn clear(&mut self) {
        self.parents.clear();
        self.stubs.clear();
    }
}

fn remove_from(map: &mut FxHashMap<StubKey, BTreeSet<BlockId>>, key: &StubKey, id: BlockId) {
    if let Some(set) = map.get_mut(key) {
        set.remove(&id);
        if set.is_empty() {
            map.remove(key);
        }
    }
}
