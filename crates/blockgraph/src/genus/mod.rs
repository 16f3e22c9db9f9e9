//! Block schemas ("genera") and the registry that loads them.
//!
//! A genus is immutable once loaded. Blocks refer to their genus by name and
//! look it up in the [`GenusRegistry`] on demand, so genus identity is the
//! name, never a reference.

pub mod lang;
pub mod registry;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::Connector;

pub use registry::{GenusRegistry, OBSOLETE_GENUS_PROPERTY, OBSOLETE_MESSAGE, PLACEHOLDER_GENUS};

/// Connector kind of sequencing connectors and statement sockets.
pub const COMMAND_KIND: &str = "cmd";

/// Broad category of a genus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenusKind {
    Command,
    Data,
    Function,
    Param,
    Procedure,
    Variable,
}

impl GenusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenusKind::Command => "command",
            GenusKind::Data => "data",
            GenusKind::Function => "function",
            GenusKind::Param => "param",
            GenusKind::Procedure => "procedure",
            GenusKind::Variable => "variable",
        }
    }
}

/// The kinds of stub a declaration block can spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StubKind {
    Getter,
    Setter,
    Caller,
    Agent,
}

impl StubKind {
    pub const ALL: [StubKind; 4] = [
        StubKind::Getter,
        StubKind::Setter,
        StubKind::Caller,
        StubKind::Agent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StubKind::Getter => "getter",
            StubKind::Setter => "setter",
            StubKind::Caller => "caller",
            StubKind::Agent => "agent",
        }
    }

    /// Name of the derived genus for stubs of this kind on `parent_genus`.
    pub fn genus_name(&self, parent_genus: &str) -> String {
        format!("{}{}", self.as_str(), parent_genus)
    }

    /// Recovers the stub kind from a derived genus name.
    pub fn from_stub_genus(stub_genus: &str, parent_genus: &str) -> Option<StubKind> {
        let prefix = stub_genus.strip_suffix(parent_genus)?;
        prefix.parse().ok()
    }
}

impl fmt::Display for StubKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StubKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StubKind::ALL.into_iter().find(|k| k.as_str() == s).ok_or(())
    }
}

/// A block schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Genus {
    pub name: String,
    pub kind: GenusKind,
    pub color: [u8; 3],
    pub initial_label: String,
    pub label_prefix: String,
    pub label_suffix: String,
    pub label_editable: bool,
    pub label_unique: bool,
    pub page_label_enabled: bool,
    /// Escape non-ASCII label characters when saving.
    pub encode_label: bool,
    pub is_starter: bool,
    pub is_terminator: bool,
    pub is_infix: bool,
    /// Set only on the obsolete-genus placeholder.
    pub is_bad: bool,
    pub sockets: Vec<Connector>,
    pub plug: Option<Connector>,
    pub before: Option<Connector>,
    pub after: Option<Connector>,
    pub expand_groups: FxHashMap<String, Vec<Connector>>,
    pub stub_kinds: Vec<StubKind>,
    /// Other members of this genus's family.
    pub family: Vec<String>,
    pub properties: BTreeMap<String, String>,
    pub description: String,
    pub arg_descriptions: Vec<String>,
}

impl Genus {
    /// A genus with no connectors and default flags.
    pub fn new(name: impl Into<String>, kind: GenusKind) -> Self {
        let name = name.into();
        Self {
            initial_label: name.clone(),
            name,
            kind,
            color: [0, 0, 0],
            label_prefix: String::new(),
            label_suffix: String::new(),
            label_editable: false,
            label_unique: false,
            page_label_enabled: false,
            encode_label: false,
            is_starter: false,
            is_terminator: false,
            is_infix: false,
            is_bad: false,
            sockets: Vec::new(),
            plug: None,
            before: None,
            after: None,
            expand_groups: FxHashMap::default(),
            stub_kinds: Vec::new(),
            family: Vec::new(),
            properties: BTreeMap::new(),
            description: String::new(),
            arg_descriptions: Vec::new(),
        }
    }

    pub fn is_command(&self) -> bool {
        self.kind == GenusKind::Command
    }

    pub fn has_stubs(&self) -> bool {
        !self.stub_kinds.is_empty()
    }

    pub fn declares_stub(&self, kind: StubKind) -> bool {
        self.stub_kinds.contains(&kind)
    }

    pub fn expand_group(&self, name: &str) -> Option<&[Connector]> {
        self.expand_groups.get(name).map(Vec::as_slice)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The label as displayed, with the genus affixes.
    pub fn decorated_label(&self, label: &str) -> String {
        format!("{}{}{}", self.label_prefix, label, self.label_suffix)
    }
}
