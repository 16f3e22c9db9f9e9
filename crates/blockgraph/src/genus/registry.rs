//! Name → genus table populated from a language description.

use lazy_static::lazy_static;
use rustc_hash::{FxHashMap, FxHashSet};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::LanguageError;
use crate::genus::lang::{GenusEntry, LanguageDescription};
use crate::genus::{Genus, GenusKind};
use crate::model::{Connector, ConnectorRole, PositionType};

/// Name of the shared genus that stands in for obsolete or unknown genera.
pub const PLACEHOLDER_GENUS: &str = "obsolete-block";

/// Error message attached to blocks downgraded to the placeholder genus.
pub const OBSOLETE_MESSAGE: &str =
    "This block is no longer supported by the current language and must be replaced.";

/// Block property recording the genus a placeholder block was saved under.
pub const OBSOLETE_GENUS_PROPERTY: &str = "obsolete-genus";

lazy_static! {
    static ref PLACEHOLDER: Genus = {
        let mut genus = Genus::new(PLACEHOLDER_GENUS, GenusKind::Command);
        genus.color = [128, 128, 128];
        genus.initial_label = "obsolete".to_string();
        genus.is_bad = true;
        genus
    };
}

/// All genera of the current language.
#[derive(Debug, Clone, Default)]
pub struct GenusRegistry {
    genera: FxHashMap<String, Genus>,
    obsolete: FxHashSet<String>,
    fingerprint: Option<[u8; 32]>,
}

impl GenusRegistry {
    /// Creates an empty registry. Only the placeholder genus resolves.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from a JSON language description.
    pub fn from_json(text: &str) -> Result<Self, LanguageError> {
        let mut registry = Self::new();
        registry.load(text)?;
        Ok(registry)
    }

    /// Parses `text` and adds its genera.
    ///
    /// On error the registry is left as it was.
    pub fn load(&mut self, text: &str) -> Result<(), LanguageError> {
        let description: LanguageDescription =
            serde_json::from_str(text).map_err(|e| LanguageError::Parse(e.to_string()))?;
        self.load_description(&description)?;
        let hash = Sha256::digest(text.as_bytes());
        let mut fingerprint = [0u8; 32];
        fingerprint.copy_from_slice(&hash);
        self.fingerprint = Some(fingerprint);
        Ok(())
    }

    /// Adds the genera of an already-parsed description.
    pub fn load_description(&mut self, description: &LanguageDescription) -> Result<(), LanguageError> {
        let mut staged: FxHashMap<String, Genus> = FxHashMap::default();

        for entry in &description.genuses {
            if staged.contains_key(&entry.name) || self.defines(&entry.name) {
                return Err(LanguageError::DuplicateGenus {
                    name: entry.name.clone(),
                });
            }
            staged.insert(entry.name.clone(), build_genus(entry)?);
        }

        // Derived stub genera: a copy of the generic stub genus per parent.
        let mut derived = Vec::new();
        for entry in &description.genuses {
            for stub in &entry.stubs {
                let generic = staged
                    .get(stub.stub_genus.as_str())
                    .or_else(|| self.genera.get(stub.stub_genus.as_str()))
                    .ok_or_else(|| LanguageError::MissingStubGenus {
                        genus: entry.name.clone(),
                        stub: stub.stub_genus,
                    })?;
                let mut genus = generic.clone();
                genus.name = stub.stub_genus.genus_name(&entry.name);
                genus.stub_kinds.clear();
                genus.family.clear();
                if let Some(prefix) = &stub.label_prefix {
                    genus.label_prefix = prefix.clone();
                }
                if let Some(suffix) = &stub.label_suffix {
                    genus.label_suffix = suffix.clone();
                }
                for property in &stub.properties {
                    genus.properties.insert(property.key.clone(), property.value.clone());
                }
                derived.push(genus);
            }
        }
        for genus in derived {
            if staged.contains_key(&genus.name) || self.defines(&genus.name) {
                return Err(LanguageError::DuplicateGenus { name: genus.name });
            }
            staged.insert(genus.name.clone(), genus);
        }

        for genus in staged.values() {
            for connector in &genus.sockets {
                if connector.in_expand_group() && !genus.expand_groups.contains_key(&connector.expand_group) {
                    return Err(LanguageError::UnknownExpandGroup {
                        genus: genus.name.clone(),
                        group: connector.expand_group.clone(),
                    });
                }
                if let Some(arg) = &connector.default_arg {
                    if !staged.contains_key(&arg.genus) && !self.defines(&arg.genus) {
                        return Err(LanguageError::UnknownDefaultArg {
                            genus: genus.name.clone(),
                            arg: arg.genus.clone(),
                        });
                    }
                }
            }
        }

        for name in &description.obsolete {
            if staged.contains_key(name) || self.defines(name) {
                return Err(LanguageError::ObsoleteConflict { name: name.clone() });
            }
        }

        for family in &description.families {
            for member in family {
                if !staged.contains_key(member) && !self.defines(member) {
                    return Err(LanguageError::UnknownFamilyMember { name: member.clone() });
                }
            }
        }
        for family in &description.families {
            for member in family {
                let siblings: Vec<String> = family.iter().filter(|m| *m != member).cloned().collect();
                let genus = match staged.get_mut(member) {
                    Some(genus) => genus,
                    None => match self.genera.get_mut(member) {
                        Some(genus) => genus,
                        None => continue,
                    },
                };
                for sibling in siblings {
                    if !genus.family.contains(&sibling) {
                        genus.family.push(sibling);
                    }
                }
            }
        }

        info!(
            genera = staged.len(),
            obsolete = description.obsolete.len(),
            "loaded language description"
        );
        self.genera.extend(staged);
        self.obsolete.extend(description.obsolete.iter().cloned());
        Ok(())
    }

    fn defines(&self, name: &str) -> bool {
        self.genera.contains_key(name) || self.obsolete.contains(name) || name == PLACEHOLDER_GENUS
    }

    /// Looks up a live genus, ignoring the obsolete mapping.
    pub fn get(&self, name: &str) -> Option<&Genus> {
        self.genera.get(name)
    }

    /// Looks up a genus by name. Obsolete names resolve to the placeholder.
    pub fn lookup(&self, name: &str) -> Option<&Genus> {
        if name == PLACEHOLDER_GENUS || self.obsolete.contains(name) {
            return Some(&PLACEHOLDER);
        }
        self.genera.get(name)
    }

    pub fn is_obsolete(&self, name: &str) -> bool {
        self.obsolete.contains(name)
    }

    pub fn placeholder(&self) -> &Genus {
        &PLACEHOLDER
    }

    pub fn contains(&self, name: &str) -> bool {
        self.genera.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.genera.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genera.is_empty()
    }

    /// Genus names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.genera.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Other members of the genus's family.
    pub fn siblings(&self, name: &str) -> &[String] {
        self.genera.get(name).map(|g| g.family.as_slice()).unwrap_or(&[])
    }

    /// SHA-256 of the last loaded description text.
    pub fn fingerprint(&self) -> Option<[u8; 32]> {
        self.fingerprint
    }

    /// The fingerprint as lowercase hex.
    pub fn fingerprint_hex(&self) -> Option<String> {
        self.fingerprint
            .map(|bytes| bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Drops every genus, for a language switch.
    pub fn reset(&mut self) {
        debug!(genera = self.genera.len(), "resetting genus registry");
        self.genera.clear();
        self.obsolete.clear();
        self.fingerprint = None;
    }
}

fn build_genus(entry: &GenusEntry) -> Result<Genus, LanguageError> {
    let mut genus = Genus::new(entry.name.as_str(), entry.kind);
    genus.color = entry.color;
    if let Some(label) = &entry.initlabel {
        genus.initial_label = label.clone();
    }
    genus.label_prefix = entry.label_prefix.clone();
    genus.label_suffix = entry.label_suffix.clone();
    genus.label_editable = entry.editable_label;
    genus.label_unique = entry.label_unique;
    genus.page_label_enabled = entry.page_label_enabled;
    genus.encode_label = entry.encode_label;
    genus.is_starter = entry.is_starter;
    genus.is_terminator = entry.is_terminator;
    genus.is_infix = entry.is_infix;

    for connector in &entry.connectors {
        match connector.connector_kind {
            ConnectorRole::Plug => {
                if genus.plug.is_some() {
                    return Err(LanguageError::MultiplePlugs {
                        genus: entry.name.clone(),
                    });
                }
                genus.plug = Some(connector.to_connector());
            }
            ConnectorRole::Socket => genus.sockets.push(connector.to_connector()),
        }
    }

    if entry.kind == GenusKind::Command {
        if !entry.is_starter {
            genus.before = Some(Connector::command(PositionType::Top));
        }
        if !entry.is_terminator {
            genus.after = Some(Connector::command(PositionType::Bottom));
        }
    }

    for group in &entry.expand_groups {
        let run = group.connectors.iter().map(|c| c.to_connector()).collect();
        genus.expand_groups.insert(group.group_name.clone(), run);
    }

    genus.stub_kinds = entry.stubs.iter().map(|s| s.stub_genus).collect();
    for property in &entry.properties {
        genus.properties.insert(property.key.clone(), property.value.clone());
    }
    if let Some(description) = &entry.description {
        genus.description = description.text.clone();
        genus.arg_descriptions = description.args.clone();
    }
    Ok(genus)
}
