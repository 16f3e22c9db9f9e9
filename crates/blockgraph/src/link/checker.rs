//! The rule engine.

use std::cell::Cell;
use std::fmt;

use tracing::debug;

use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::limits::DEFAULT_MAX_LINK_DISTANCE;
use crate::link::rules::{FlowMatch, InfixWrap, KindMatch, NoCycle};
use crate::link::{ConnectHook, Link, LinkRule, LinkSide, RuleCategory};
use crate::model::{BlockGraph, BlockId, ConnectorRef};

/// Connector placement supplied by the view layer.
pub trait ConnectorGeometry {
    fn is_visible(&self, _block: BlockId) -> bool {
        true
    }

    fn is_collapsed(&self, _block: BlockId) -> bool {
        false
    }

    /// Screen position of a connector, or `None` when it is not laid out.
    fn position(&self, at: ConnectorRef) -> Option<(f64, f64)>;
}

/// Ordered link rules plus post-connect hooks.
pub struct LinkChecker {
    rules: Vec<Box<dyn LinkRule>>,
    hooks: Vec<Box<dyn ConnectHook>>,
    max_distance: f64,
    /// Orientation of the last pair passed to [`LinkChecker::link_for`].
    last: Cell<Option<(ConnectorRef, ConnectorRef, Link)>>,
}

impl fmt::Debug for LinkChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkChecker")
            .field("rules", &self.rule_names())
            .field("hooks", &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>())
            .field("max_distance", &self.max_distance)
            .finish()
    }
}

impl Default for LinkChecker {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}

impl LinkChecker {
    /// A checker with no rules. It accepts nothing until an advisory rule is added.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            hooks: Vec::new(),
            max_distance: DEFAULT_MAX_LINK_DISTANCE,
            last: Cell::new(None),
        }
    }

    /// `no-cycle`, `kind-match`, `flow-match` and `infix-wrap`, plus the
    /// flow splice and infix re-attach hooks.
    pub fn with_builtin_rules() -> Self {
        let mut checker = Self::empty();
        checker.add_rule(Box::new(NoCycle));
        checker.add_rule(Box::new(KindMatch));
        checker.add_rule(Box::new(FlowMatch));
        checker.add_rule(Box::new(InfixWrap));
        checker.add_hook(Box::new(FlowMatch));
        checker.add_hook(Box::new(InfixWrap));
        checker
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        let mut checker = Self::with_builtin_rules();
        checker.max_distance = config.max_link_distance;
        checker
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn set_max_distance(&mut self, distance: f64) {
        self.max_distance = distance;
    }

    pub fn add_rule(&mut self, rule: Box<dyn LinkRule>) {
        self.rules.push(rule);
    }

    /// Inserts a rule at `index`, clamped to the end of the list.
    pub fn insert_rule(&mut self, index: usize, rule: Box<dyn LinkRule>) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
    }

    /// Removes the first rule named `name`.
    pub fn remove_rule(&mut self, name: &str) -> Option<Box<dyn LinkRule>> {
        let index = self.rules.iter().position(|r| r.name() == name)?;
        Some(self.rules.remove(index))
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn add_hook(&mut self, hook: Box<dyn ConnectHook>) {
        self.hooks.push(hook);
    }

    /// True when every mandatory rule approves and at least one advisory rule
    /// does. Missing blocks or connectors never link.
    pub fn can_link(&self, graph: &BlockGraph, a: ConnectorRef, b: ConnectorRef) -> bool {
        let (Some(a), Some(b)) = (LinkSide::resolve(graph, a), LinkSide::resolve(graph, b)) else {
            return false;
        };
        let mut advisory = false;
        for rule in &self.rules {
            match rule.category() {
                RuleCategory::Mandatory => {
                    if !rule.can_link(graph, &a, &b) {
                        return false;
                    }
                }
                RuleCategory::Advisory => {
                    if !advisory && rule.can_link(graph, &a, &b) {
                        advisory = true;
                    }
                }
            }
        }
        advisory
    }

    /// Orients a pair into a [`Link`], reusing the last answer for a repeated pair.
    pub fn link_for(&self, graph: &BlockGraph, a: ConnectorRef, b: ConnectorRef) -> Result<Link, GraphError> {
        if let Some((last_a, last_b, link)) = self.last.get() {
            if (last_a, last_b) == (a, b) {
                return Ok(link);
            }
        }
        let link = Link::between(graph, a, b)?;
        self.last.set(Some((a, b, link)));
        Ok(link)
    }

    /// Checks and joins a pair, then runs every hook in order.
    pub fn connect(&self, graph: &mut BlockGraph, a: ConnectorRef, b: ConnectorRef) -> Result<Link, GraphError> {
        if !self.can_link(graph, a, b) {
            return Err(GraphError::InvalidLink { a, b });
        }
        let link = self.link_for(graph, a, b)?;
        let displaced = link.connect(graph)?;
        for hook in &self.hooks {
            hook.connected(graph, &link, displaced)?;
        }
        Ok(link)
    }

    pub fn disconnect(&self, graph: &mut BlockGraph, a: ConnectorRef, b: ConnectorRef) -> Result<(), GraphError> {
        self.link_for(graph, a, b)?.disconnect(graph)
    }

    /// Nearest linkable pair within the maximum distance between `candidate`
    /// and any other visible, expanded block.
    pub fn get_link(&self, graph: &BlockGraph, geometry: &dyn ConnectorGeometry, candidate: BlockId) -> Option<Link> {
        self.nearest(graph, geometry, candidate, Some(self.max_distance))
    }

    /// Like [`get_link`](Self::get_link) without the distance cap.
    pub fn get_weak_link(&self, graph: &BlockGraph, geometry: &dyn ConnectorGeometry, candidate: BlockId) -> Option<Link> {
        self.nearest(graph, geometry, candidate, None)
    }

    fn nearest(
        &self,
        graph: &BlockGraph,
        geometry: &dyn ConnectorGeometry,
        candidate: BlockId,
        cap: Option<f64>,
    ) -> Option<Link> {
        let own_slots = graph.block(candidate)?.slots();
        let mut best: Option<(f64, ConnectorRef, ConnectorRef)> = None;

        for other in graph.ids() {
            if other == candidate || !geometry.is_visible(other) || geometry.is_collapsed(other) {
                continue;
            }
            let Some(other_block) = graph.block(other) else {
                continue;
            };
            for own in &own_slots {
                let mine = ConnectorRef::new(candidate, *own);
                let Some(from) = geometry.position(mine) else {
                    continue;
                };
                for slot in other_block.slots() {
                    let theirs = ConnectorRef::new(other, slot);
                    let Some(to) = geometry.position(theirs) else {
                        continue;
                    };
                    let distance = (from.0 - to.0).hypot(from.1 - to.1);
                    if cap.is_some_and(|cap| distance > cap) {
                        continue;
                    }
                    if best.is_some_and(|(d, _, _)| d <= distance) {
                        continue;
                    }
                    if self.can_link(graph, mine, theirs) {
                        best = Some((distance, mine, theirs));
                    }
                }
            }
        }

        let (distance, mine, theirs) = best?;
        debug!(candidate, distance, "nearest link");
        self.link_for(graph, mine, theirs).ok()
    }
}
