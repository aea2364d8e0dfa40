//! Abstract invoke node

use crate::configs::ActionDecl;
use crate::error::BindingError;
use crate::providers::ActionSchema;
use invoke_addrs::{
    AbsProviderConfig, ActionTarget, ConfigAction, LocalProviderConfig, Module, Provider,
    ProviderConfig, Reference,
};
use once_cell::sync::OnceCell;
use std::sync::Arc;

const INVOKE_SUFFIX: &str = " (invoke)";

/// An invoke target before expansion
///
/// Holds the target, the declaration it points at (absent when the user
/// named an action that is not configured) and two write-once slots filled
/// by the walker: the resolved provider and the action schema.
#[derive(Debug)]
pub struct ActionInvokeNode {
    target: ActionTarget,
    config: Option<Arc<ActionDecl>>,
    resolved_provider: OnceCell<AbsProviderConfig>,
    schema: OnceCell<Arc<ActionSchema>>,
}

impl ActionInvokeNode {
    /// Node for `target` backed by `config`
    #[must_use]
    pub fn new(target: ActionTarget, config: Option<Arc<ActionDecl>>) -> Self {
        Self {
            target,
            config,
            resolved_provider: OnceCell::new(),
            schema: OnceCell::new(),
        }
    }

    /// Requested target
    #[inline]
    #[must_use]
    pub fn target(&self) -> &ActionTarget {
        &self.target
    }

    /// Declaration, when configured
    #[inline]
    #[must_use]
    pub fn config(&self) -> Option<&Arc<ActionDecl>> {
        self.config.as_ref()
    }

    /// Graph node name
    ///
    /// Instance targets render their declaration address without the key;
    /// abstract targets render the action in their static module.
    #[must_use]
    pub fn name(&self) -> String {
        let base = match &self.target {
            ActionTarget::Instance(inst) => inst.config_action().to_string(),
            ActionTarget::Action(action) => action.action.in_module(&action.module.module()).to_string(),
        };
        base + INVOKE_SUFFIX
    }

    /// Static address of the targeted declaration
    #[inline]
    #[must_use]
    pub fn action_addr(&self) -> ConfigAction {
        self.target.config_action()
    }

    /// Static module the declaration lives in
    #[inline]
    #[must_use]
    pub fn module_path(&self) -> Module {
        self.target.module_path()
    }

    /// Provider configuration serving this node
    ///
    /// The flag is `true` when the binding has been resolved by the walker
    /// and `false` when it is inferred from the declaration.
    #[must_use]
    pub fn provided_by(&self) -> (ProviderConfig, bool) {
        if let Some(resolved) = self.resolved_provider.get() {
            return (ProviderConfig::Absolute(resolved.clone()), true);
        }
        let local = match &self.config {
            Some(decl) => decl.provider_config_addr(),
            None => LocalProviderConfig::implied_by_action_type(&self.target.config_action().action.type_name),
        };
        (ProviderConfig::Local(local), false)
    }

    /// Provider serving the action type
    #[must_use]
    pub fn provider(&self) -> Provider {
        match &self.config {
            Some(decl) => decl.provider.clone(),
            None => Provider::implied_by_action_type(&self.target.config_action().action.type_name),
        }
    }

    /// Record the walker's provider resolution
    ///
    /// Setting the same binding again is a no-op.
    ///
    /// # Errors
    /// Fails when a different binding is already in place.
    pub fn set_provider(&self, addr: AbsProviderConfig) -> Result<(), BindingError> {
        let existing = self.resolved_provider.get_or_init(|| addr.clone());
        if *existing == addr {
            tracing::debug!(node = %self.name(), provider = %addr, "resolved provider");
            Ok(())
        } else {
            Err(BindingError::ProviderAlreadyResolved {
                node: self.name(),
                existing: existing.to_string(),
            })
        }
    }

    /// Resolved provider, once set
    #[inline]
    #[must_use]
    pub fn resolved_provider(&self) -> Option<&AbsProviderConfig> {
        self.resolved_provider.get()
    }

    /// Attach the provider's schema for this action type
    ///
    /// # Errors
    /// Fails when a schema is already attached.
    pub fn attach_action_schema(&self, schema: Arc<ActionSchema>) -> Result<(), BindingError> {
        self.schema
            .set(schema)
            .map_err(|_| BindingError::SchemaAlreadyAttached { node: self.name() })
    }

    /// Attached schema
    #[inline]
    #[must_use]
    pub fn action_schema(&self) -> Option<&Arc<ActionSchema>> {
        self.schema.get()
    }

    /// What this node references
    ///
    /// An instance target references both the instance and its declaration,
    /// so the declaration is known to exist before the instance runs.
    #[must_use]
    pub fn references(&self) -> Vec<Reference> {
        match &self.target {
            ActionTarget::Instance(inst) => vec![
                Reference::to_instance(inst.action.clone()),
                Reference::to_action(inst.action.action.clone()),
            ],
            ActionTarget::Action(action) => vec![Reference::to_action(action.action.clone())],
        }
    }

    /// Declaration, provider and schema an instance needs to run
    ///
    /// # Panics
    /// Panics when called on an unconfigured node or before the walker has
    /// resolved the provider and attached the schema. Both are upstream
    /// ordering bugs.
    pub(crate) fn resolved(&self) -> (Arc<ActionDecl>, AbsProviderConfig, Arc<ActionSchema>) {
        let Some(decl) = self.config.clone() else {
            panic!("{} has no declaration to instantiate", self.name());
        };
        let Some(provider) = self.resolved_provider.get().cloned() else {
            panic!("{} expanded before its provider was resolved", self.name());
        };
        let Some(schema) = self.schema.get().cloned() else {
            panic!("{} expanded before its schema was attached", self.name());
        };
        (decl, provider, schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::SourceRange;
    use invoke_addrs::{Action, InstanceKey, ModuleInstance, Referenceable};

    fn decl() -> Arc<ActionDecl> {
        Arc::new(ActionDecl::new(
            "webhook_notify",
            "notify",
            SourceRange::new("main.tf", (1, 1), (1, 35)),
        ))
    }

    fn in_child_module() -> ActionTarget {
        Action::new("webhook_notify", "notify")
            .absolute(&ModuleInstance::root().child("app", InstanceKey::from(1)))
            .instance(InstanceKey::from("prod"))
            .into()
    }

    #[test]
    fn instance_name_drops_keys() {
        let node = ActionInvokeNode::new(in_child_module(), Some(decl()));
        assert_eq!(node.name(), "module.app.action.webhook_notify.notify (invoke)");
    }

    #[test]
    fn abstract_name_uses_static_module() {
        let target: ActionTarget = Action::new("webhook_notify", "notify")
            .absolute(&ModuleInstance::root())
            .into();
        let node = ActionInvokeNode::new(target, Some(decl()));
        assert_eq!(node.name(), "action.webhook_notify.notify (invoke)");
    }

    #[test]
    fn provided_by_is_inferred_until_resolved() {
        let node = ActionInvokeNode::new(in_child_module(), Some(decl()));
        let (addr, exact) = node.provided_by();
        assert!(!exact);
        assert_eq!(addr, ProviderConfig::Local(LocalProviderConfig::new("webhook")));

        let resolved = AbsProviderConfig::new(Module::root(), Provider::new("webhook"), None);
        node.set_provider(resolved.clone()).unwrap();
        assert_eq!(node.provided_by(), (ProviderConfig::Absolute(resolved), true));
    }

    #[test]
    fn provided_by_without_declaration_uses_implied_provider() {
        let node = ActionInvokeNode::new(in_child_module(), None);
        let (addr, exact) = node.provided_by();
        assert!(!exact);
        assert_eq!(addr.to_string(), "provider.webhook");
        assert_eq!(node.provider(), Provider::new("webhook"));
    }

    #[test]
    fn provider_binding_is_write_once() {
        let node = ActionInvokeNode::new(in_child_module(), Some(decl()));
        let root = AbsProviderConfig::new(Module::root(), Provider::new("webhook"), None);
        let eu = AbsProviderConfig::new(Module::root(), Provider::new("webhook"), Some("eu".into()));
        node.set_provider(root.clone()).unwrap();
        node.set_provider(root.clone()).unwrap();
        assert!(matches!(
            node.set_provider(eu),
            Err(BindingError::ProviderAlreadyResolved { .. })
        ));
        assert_eq!(node.resolved_provider(), Some(&root));
    }

    #[test]
    fn schema_is_write_once() {
        let node = ActionInvokeNode::new(in_child_module(), Some(decl()));
        node.attach_action_schema(Arc::new(ActionSchema::default())).unwrap();
        assert!(node.attach_action_schema(Arc::new(ActionSchema::default())).is_err());
    }

    #[test]
    fn instance_target_references_instance_and_declaration() {
        let node = ActionInvokeNode::new(in_child_module(), Some(decl()));
        let refs = node.references();
        assert_eq!(refs.len(), 2);
        assert!(matches!(refs[0].subject, Referenceable::ActionInstance(_)));
        assert!(matches!(refs[1].subject, Referenceable::Action(_)));
    }

    #[test]
    #[should_panic(expected = "before its provider was resolved")]
    fn resolving_unbound_node_panics() {
        let node = ActionInvokeNode::new(in_child_module(), Some(decl()));
        let _ = node.resolved();
    }
}
