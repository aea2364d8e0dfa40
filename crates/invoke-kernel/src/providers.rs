//! Provider plugins
//!
//! Actions are planned by the provider that serves their type. The engine
//! talks to providers only through [`ProviderClient`]; how the plugin process
//! is reached is the client's business. [`ProviderSource`] hands out live
//! clients per resolved provider configuration and knows each provider's
//! action schemas.

use crate::diagnostics::Diagnostics;
use crate::error::ProviderError;
use dashmap::DashMap;
use invoke_addrs::{AbsProviderConfig, Provider};
use invoke_value::{BlockSchema, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// What the caller can handle in a provider response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Caller can continue when the provider defers
    #[serde(default)]
    pub deferral_allowed: bool,
    /// Caller supports write-only attributes
    #[serde(default)]
    pub write_only_attributes_allowed: bool,
}

/// Shape contract for one action type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionSchema {
    /// Schema of the `config` block
    pub config_schema: BlockSchema,
}

impl ActionSchema {
    /// Action schema with the given config block schema
    #[inline]
    #[must_use]
    pub fn new(config_schema: BlockSchema) -> Self {
        Self { config_schema }
    }
}

/// Plan-action call
#[derive(Debug, Clone, PartialEq)]
pub struct PlanActionRequest {
    /// Declared action type
    pub action_type: String,
    /// Wholly known, unmarked configuration
    pub proposed_action_data: Value,
    /// Caller capabilities
    pub client_capabilities: ClientCapabilities,
}

/// Why a provider deferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredReason {
    /// Provider configuration depends on unknown values
    ProviderConfigUnknown,
    /// Action configuration depends on unknown values
    ActionConfigUnknown,
    /// Something the action needs does not exist yet
    AbsentPrereq,
}

/// Deferral signal in a plan-action response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deferred {
    /// Provider's reason
    pub reason: DeferredReason,
}

/// Plan-action result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanActionResponse {
    /// Provider-reported diagnostics
    pub diagnostics: Diagnostics,
    /// Present when the provider wants to defer the action
    pub deferred: Option<Deferred>,
}

impl PlanActionResponse {
    /// Response accepting the plan
    #[inline]
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    /// Response deferring the action
    #[inline]
    #[must_use]
    pub fn deferred(reason: DeferredReason) -> Self {
        Self {
            diagnostics: Diagnostics::new(),
            deferred: Some(Deferred { reason }),
        }
    }

    /// Response with diagnostics
    #[inline]
    #[must_use]
    pub fn with_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            deferred: None,
        }
    }
}

/// Live connection to a provider plugin
#[async_trait::async_trait]
pub trait ProviderClient: Send + Sync {
    /// Ask the provider to plan one action invocation
    async fn plan_action(&self, request: PlanActionRequest) -> PlanActionResponse;
}

/// Source of live provider clients and their schemas
#[async_trait::async_trait]
pub trait ProviderSource: Send + Sync {
    /// Client for a resolved provider configuration
    ///
    /// # Errors
    /// Fails when the provider is not installed or cannot be started.
    async fn get_provider(
        &self,
        addr: &AbsProviderConfig,
    ) -> Result<Arc<dyn ProviderClient>, ProviderError>;

    /// Schema `provider` publishes for `action_type`
    fn action_schema(&self, provider: &Provider, action_type: &str) -> Option<Arc<ActionSchema>>;
}

/// Starts a client for a provider configuration
pub type ProviderFactory =
    Arc<dyn Fn(&AbsProviderConfig) -> Result<Arc<dyn ProviderClient>, ProviderError> + Send + Sync>;

struct Registration {
    factory: ProviderFactory,
    schemas: HashMap<String, Arc<ActionSchema>>,
}

/// Installed providers
///
/// Each provider configuration gets one client, started on first use and
/// shared afterwards.
#[derive(Default)]
pub struct ProviderRegistry {
    installed: DashMap<Provider, Registration>,
    live: DashMap<AbsProviderConfig, Arc<dyn ProviderClient>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("installed", &self.installed.len())
            .field("live", &self.live.len())
            .finish()
    }
}

impl ProviderRegistry {
    /// Registry with nothing installed
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `provider`, started by `factory`
    pub fn install(&self, provider: Provider, factory: ProviderFactory) {
        tracing::debug!(%provider, "installed provider");
        self.installed.insert(
            provider,
            Registration {
                factory,
                schemas: HashMap::new(),
            },
        );
    }

    /// Install a provider backed by one shared client
    pub fn install_client(&self, provider: Provider, client: Arc<dyn ProviderClient>) {
        self.install(
            provider,
            Arc::new(
                move |_: &AbsProviderConfig| -> Result<Arc<dyn ProviderClient>, ProviderError> {
                    Ok(Arc::clone(&client))
                },
            ),
        );
    }

    /// Publish `schema` for `action_type` on an installed provider
    ///
    /// Returns `false` when the provider is not installed.
    pub fn register_action_schema(
        &self,
        provider: &Provider,
        action_type: impl Into<String>,
        schema: ActionSchema,
    ) -> bool {
        match self.installed.get_mut(provider) {
            Some(mut reg) => {
                reg.schemas.insert(action_type.into(), Arc::new(schema));
                true
            }
            None => false,
        }
    }

    /// Number of started clients
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[async_trait::async_trait]
impl ProviderSource for ProviderRegistry {
    async fn get_provider(
        &self,
        addr: &AbsProviderConfig,
    ) -> Result<Arc<dyn ProviderClient>, ProviderError> {
        if let Some(client) = self.live.get(addr) {
            return Ok(Arc::clone(client.value()));
        }

        let factory = self
            .installed
            .get(&addr.provider)
            .map(|reg| Arc::clone(&reg.factory))
            .ok_or_else(|| ProviderError::NotInstalled(addr.provider.to_string()))?;

        let client = factory(addr)?;
        tracing::debug!(provider = %addr, "started provider client");
        Ok(Arc::clone(
            self.live.entry(addr.clone()).or_insert(client).value(),
        ))
    }

    fn action_schema(&self, provider: &Provider, action_type: &str) -> Option<Arc<ActionSchema>> {
        self.installed
            .get(provider)
            .and_then(|reg| reg.schemas.get(action_type).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoke_addrs::Module;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Accepting;

    #[async_trait::async_trait]
    impl ProviderClient for Accepting {
        async fn plan_action(&self, _request: PlanActionRequest) -> PlanActionResponse {
            PlanActionResponse::ok()
        }
    }

    fn addr(alias: Option<&str>) -> AbsProviderConfig {
        AbsProviderConfig::new(
            Module::root(),
            Provider::new("webhook"),
            alias.map(String::from),
        )
    }

    #[tokio::test]
    async fn one_client_per_configuration() {
        let started = Arc::new(AtomicUsize::new(0));
        let registry = ProviderRegistry::new();
        let counter = Arc::clone(&started);
        registry.install(
            Provider::new("webhook"),
            Arc::new(
                move |_: &AbsProviderConfig| -> Result<Arc<dyn ProviderClient>, ProviderError> {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(Accepting))
                },
            ),
        );

        registry.get_provider(&addr(None)).await.unwrap();
        registry.get_provider(&addr(None)).await.unwrap();
        registry.get_provider(&addr(Some("eu"))).await.unwrap();

        assert_eq!(started.load(Ordering::SeqCst), 2);
        assert_eq!(registry.live_count(), 2);
    }

    #[tokio::test]
    async fn missing_provider_is_an_error() {
        let registry = ProviderRegistry::new();
        let err = registry.get_provider(&addr(None)).await.err().unwrap();
        assert!(matches!(err, ProviderError::NotInstalled(_)));
    }

    #[tokio::test]
    async fn factory_failure_propagates() {
        let registry = ProviderRegistry::new();
        registry.install(
            Provider::new("webhook"),
            Arc::new(|a: &AbsProviderConfig| -> Result<Arc<dyn ProviderClient>, ProviderError> {
                Err(ProviderError::Handshake {
                    addr: a.to_string(),
                    reason: "protocol version mismatch".into(),
                })
            }),
        );
        let err = registry.get_provider(&addr(None)).await.err().unwrap();
        assert!(err.to_string().contains("protocol version mismatch"));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn schemas_are_per_provider_and_type() {
        let registry = ProviderRegistry::new();
        registry.install_client(Provider::new("webhook"), Arc::new(Accepting));
        assert!(registry.register_action_schema(
            &Provider::new("webhook"),
            "webhook_notify",
            ActionSchema::default()
        ));
        assert!(!registry.register_action_schema(&Provider::new("aws"), "aws_x", ActionSchema::default()));

        assert!(registry.action_schema(&Provider::new("webhook"), "webhook_notify").is_some());
        assert!(registry.action_schema(&Provider::new("webhook"), "webhook_other").is_none());
    }
}
