//! Planned changes
//!
//! The change set is the only output of a successful instance pipeline. It is
//! shared by every instance of a walk, appended to concurrently and read once
//! the walk finishes.

use crate::types::InvocationId;
use invoke_addrs::{AbsActionInstance, AbsProviderConfig};
use invoke_value::{Value, ValueError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Why an action was planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ActionTrigger {
    /// Explicitly requested by the user
    Invoke,
}

/// One planned action invocation
///
/// Immutable once built. The configuration value has had every ephemeral
/// value replaced by null.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInvocation {
    id: InvocationId,
    addr: AbsActionInstance,
    provider_addr: AbsProviderConfig,
    trigger: ActionTrigger,
    config_value: Value,
}

impl ActionInvocation {
    /// Record for an explicitly invoked instance
    #[must_use]
    pub fn invoke(addr: AbsActionInstance, provider_addr: AbsProviderConfig, config_value: Value) -> Self {
        Self {
            id: InvocationId::new(),
            addr,
            provider_addr,
            trigger: ActionTrigger::Invoke,
            config_value,
        }
    }

    /// Record id
    #[inline]
    #[must_use]
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Invoked instance
    #[inline]
    #[must_use]
    pub fn addr(&self) -> &AbsActionInstance {
        &self.addr
    }

    /// Provider configuration that planned it
    #[inline]
    #[must_use]
    pub fn provider_addr(&self) -> &AbsProviderConfig {
        &self.provider_addr
    }

    /// Trigger kind
    #[inline]
    #[must_use]
    pub fn trigger(&self) -> ActionTrigger {
        self.trigger
    }

    /// Persisted configuration
    #[inline]
    #[must_use]
    pub fn config_value(&self) -> &Value {
        &self.config_value
    }

    /// JSON rendering for reports, with sensitive values redacted
    ///
    /// # Errors
    /// Fails when the configuration still holds unknown values.
    pub fn to_json(&self) -> Result<serde_json::Value, ValueError> {
        Ok(serde_json::json!({
            "id": self.id.to_string(),
            "addr": self.addr.to_string(),
            "provider": self.provider_addr.to_string(),
            "trigger": self.trigger,
            "config": self.config_value.to_json_redacted()?,
        }))
    }
}

/// Append-only collection of planned invocations
#[derive(Debug, Default)]
pub struct ChangeSet {
    action_invocations: Mutex<Vec<Arc<ActionInvocation>>>,
}

impl ChangeSet {
    /// Empty change set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a planned invocation
    pub fn append_action_invocation(&self, invocation: ActionInvocation) {
        tracing::info!(action = %invocation.addr, id = %invocation.id, "planned action invocation");
        self.action_invocations.lock().push(Arc::new(invocation));
    }

    /// Every invocation appended so far, in append order
    #[must_use]
    pub fn action_invocations(&self) -> Vec<Arc<ActionInvocation>> {
        self.action_invocations.lock().clone()
    }

    /// Invocation planned for `addr`, if any
    #[must_use]
    pub fn get(&self, addr: &AbsActionInstance) -> Option<Arc<ActionInvocation>> {
        self.action_invocations
            .lock()
            .iter()
            .find(|inv| &inv.addr == addr)
            .cloned()
    }

    /// Number of invocations
    #[must_use]
    pub fn len(&self) -> usize {
        self.action_invocations.lock().len()
    }

    /// Whether nothing was planned
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.action_invocations.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoke_addrs::{Action, InstanceKey, Module, ModuleInstance, Provider};
    use invoke_value::Mark;

    fn instance(key: &str) -> AbsActionInstance {
        Action::new("webhook_notify", "notify")
            .absolute(&ModuleInstance::root())
            .instance(InstanceKey::from(key))
    }

    fn provider() -> AbsProviderConfig {
        AbsProviderConfig::new(Module::root(), Provider::new("webhook"), None)
    }

    #[test]
    fn append_and_lookup() {
        let changes = ChangeSet::new();
        changes.append_action_invocation(ActionInvocation::invoke(
            instance("a"),
            provider(),
            Value::object([("message", Value::string("hi"))]),
        ));
        assert_eq!(changes.len(), 1);
        let inv = changes.get(&instance("a")).unwrap();
        assert_eq!(inv.trigger(), ActionTrigger::Invoke);
        assert!(changes.get(&instance("b")).is_none());
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let changes = Arc::new(ChangeSet::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let changes = Arc::clone(&changes);
                std::thread::spawn(move || {
                    changes.append_action_invocation(ActionInvocation::invoke(
                        instance(&i.to_string()),
                        provider(),
                        Value::null(invoke_value::Type::Dynamic),
                    ));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let ids: std::collections::HashSet<_> =
            changes.action_invocations().iter().map(|inv| inv.id()).collect();
        assert_eq!(ids.len(), 16);
    }

    #[test]
    fn json_redacts_sensitive_values() {
        let inv = ActionInvocation::invoke(
            instance("a"),
            provider(),
            Value::object([("token", Value::string("s3cr3t").with_mark(Mark::Sensitive))]),
        );
        let json = inv.to_json().unwrap();
        assert_eq!(json["trigger"], "Invoke");
        assert_eq!(json["addr"], "action.webhook_notify.notify[\"a\"]");
        assert!(!json.to_string().contains("s3cr3t"));
    }
}
