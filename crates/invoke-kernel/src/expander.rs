//! Instance expansion
//!
//! The repetition engine decides, from `count` and `for_each`, which instances
//! an action has. This module is the query surface the invoke nodes use to
//! read those decisions, plus an in-memory [`Expander`] that records them.

use crate::eval::RepetitionData;
use invoke_addrs::{AbsAction, AbsActionInstance, InstanceKey};
use invoke_value::Value;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Queries against resolved repetition
pub trait InstanceExpander: Send + Sync {
    /// Every concrete action instance known so far
    fn all_instances(&self) -> InstanceSet;

    /// Whether `addr` exists after expansion
    fn has_instance(&self, addr: &AbsActionInstance) -> bool {
        self.all_instances().has_action_instance(addr)
    }

    /// Concrete instances of `addr`, in key order
    fn expand_action(&self, addr: &AbsAction) -> Vec<AbsActionInstance>;

    /// Repetition data for evaluating `addr`'s configuration
    fn get_repetition_data(&self, addr: &AbsActionInstance) -> RepetitionData;
}

/// Set of concrete action instances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceSet {
    actions: BTreeSet<AbsActionInstance>,
}

impl InstanceSet {
    /// Whether `addr` is in the set
    #[inline]
    #[must_use]
    pub fn has_action_instance(&self, addr: &AbsActionInstance) -> bool {
        self.actions.contains(addr)
    }

    /// Number of instances
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Instances in address order
    pub fn iter(&self) -> impl Iterator<Item = &AbsActionInstance> {
        self.actions.iter()
    }
}

/// How one action repeats
#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    /// Exactly one instance with no key
    Single,
    /// `count = n`: keys `0..n`
    Count(usize),
    /// `for_each`: one instance per map key
    ForEach(BTreeMap<String, Value>),
}

impl Expansion {
    fn keys(&self) -> Vec<InstanceKey> {
        match self {
            Self::Single => vec![InstanceKey::NoKey],
            Self::Count(n) => (0..*n)
                .map(|i| InstanceKey::Int(i64::try_from(i).unwrap_or(i64::MAX)))
                .collect(),
            Self::ForEach(items) => items.keys().cloned().map(InstanceKey::Str).collect(),
        }
    }

    fn repetition_data(&self, key: &InstanceKey) -> RepetitionData {
        match (self, key) {
            (Self::Count(_), InstanceKey::Int(i)) => RepetitionData::count(*i),
            (Self::ForEach(items), InstanceKey::Str(k)) => items
                .get(k)
                .map(|v| RepetitionData::for_each(k.clone(), v.clone()))
                .unwrap_or_default(),
            _ => RepetitionData::default(),
        }
    }
}

/// In-memory record of resolved repetition
///
/// Actions with no recorded expansion have no instances.
#[derive(Debug, Default)]
pub struct Expander {
    actions: RwLock<HashMap<AbsAction, Expansion>>,
}

impl Expander {
    /// Empty expander
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record how `addr` repeats, replacing any earlier record
    pub fn set_action_expansion(&self, addr: AbsAction, expansion: Expansion) {
        tracing::debug!(action = %addr, ?expansion, "recorded action expansion");
        self.actions.write().insert(addr, expansion);
    }
}

impl InstanceExpander for Expander {
    fn all_instances(&self) -> InstanceSet {
        let actions = self.actions.read();
        InstanceSet {
            actions: actions
                .iter()
                .flat_map(|(addr, expansion)| {
                    expansion.keys().into_iter().map(move |key| addr.instance(key))
                })
                .collect(),
        }
    }

    fn has_instance(&self, addr: &AbsActionInstance) -> bool {
        self.actions
            .read()
            .get(&addr.containing_action())
            .is_some_and(|expansion| expansion.keys().contains(&addr.action.key))
    }

    fn expand_action(&self, addr: &AbsAction) -> Vec<AbsActionInstance> {
        let actions = self.actions.read();
        let Some(expansion) = actions.get(addr) else {
            tracing::warn!(action = %addr, "no expansion recorded for action");
            return Vec::new();
        };
        expansion.keys().into_iter().map(|key| addr.instance(key)).collect()
    }

    fn get_repetition_data(&self, addr: &AbsActionInstance) -> RepetitionData {
        self.actions
            .read()
            .get(&addr.containing_action())
            .map(|expansion| expansion.repetition_data(&addr.action.key))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoke_addrs::{Action, ModuleInstance};

    fn notify() -> AbsAction {
        Action::new("webhook_notify", "notify").absolute(&ModuleInstance::root())
    }

    #[test]
    fn for_each_expands_in_key_order() {
        let expander = Expander::new();
        expander.set_action_expansion(
            notify(),
            Expansion::ForEach(BTreeMap::from([
                ("b".to_string(), Value::string("B")),
                ("a".to_string(), Value::string("A")),
            ])),
        );
        let keys: Vec<_> = expander
            .expand_action(&notify())
            .into_iter()
            .map(|i| i.action.key)
            .collect();
        assert_eq!(keys, vec![InstanceKey::from("a"), InstanceKey::from("b")]);
    }

    #[test]
    fn count_repetition_data() {
        let expander = Expander::new();
        expander.set_action_expansion(notify(), Expansion::Count(2));
        let inst = notify().instance(InstanceKey::Int(1));
        assert!(expander.has_instance(&inst));
        assert_eq!(expander.get_repetition_data(&inst), RepetitionData::count(1));
        assert!(!expander.has_instance(&notify().instance(InstanceKey::Int(2))));
    }

    #[test]
    fn for_each_repetition_data() {
        let expander = Expander::new();
        expander.set_action_expansion(
            notify(),
            Expansion::ForEach(BTreeMap::from([("prod".to_string(), Value::string("p"))])),
        );
        let data = expander.get_repetition_data(&notify().instance("prod".into()));
        assert_eq!(data.each_key.as_deref(), Some("prod"));
        assert_eq!(data.each_value, Some(Value::string("p")));
    }

    #[test]
    fn unknown_action_has_no_instances() {
        let expander = Expander::new();
        assert!(expander.expand_action(&notify()).is_empty());
        assert!(expander.all_instances().is_empty());
        assert!(!expander.has_instance(&notify().instance(InstanceKey::NoKey)));
    }

    #[test]
    fn all_instances_agrees_with_has_instance() {
        let expander = Expander::new();
        expander.set_action_expansion(notify(), Expansion::Single);
        let all = expander.all_instances();
        assert_eq!(all.len(), 1);
        let only = all.iter().next().unwrap();
        assert!(expander.has_instance(only));
    }
}
