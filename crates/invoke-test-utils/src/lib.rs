//! Testing utilities for the invoke workspace
//!
//! Shared fixtures for integration tests: the `webhook_notify` schema,
//! declaration builders and a [`TestEnv`] wiring every collaborator to
//! in-memory implementations.

#![allow(missing_docs)]

use invoke_addrs::{AbsAction, ActionTarget, Module, Provider};
use invoke_kernel::configs::{ActionDecl, Body, Config, Expr, SourceRange};
use invoke_kernel::context::WalkContext;
use invoke_kernel::eval::ScopeEvaluator;
use invoke_kernel::expander::{Expander, Expansion};
use invoke_kernel::providers::{ActionSchema, ProviderRegistry};
use invoke_kernel::walk::InvokeWalker;
use invoke_value::{AttributeSchema, BlockSchema, Type};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use invoke_kernel::test_harness::doubles::{provider_error, unavailable_factory, RecordingProvider};

pub const NOTIFY_TYPE: &str = "webhook_notify";

pub fn webhook_provider() -> Provider {
    Provider::new("webhook")
}

/// `webhook_notify` config schema
///
/// `message` is required, `token` is write-only and `endpoint` is deprecated.
pub fn notify_schema() -> ActionSchema {
    ActionSchema::new(
        BlockSchema::new()
            .with_attribute("message", AttributeSchema::required(Type::String))
            .with_attribute("url", AttributeSchema::optional(Type::String))
            .with_attribute("token", AttributeSchema::optional(Type::String).write_only())
            .with_attribute("endpoint", AttributeSchema::optional(Type::String).deprecated()),
    )
}

pub fn decl_range(line: usize) -> SourceRange {
    SourceRange::new("main.tf", (line, 1), (line, 40))
}

/// Declaration whose body sets `message` to `expr`
pub fn notify_decl(name: &str, expr: Expr) -> ActionDecl {
    let body = Body::new(decl_range(2)).with_attribute("message", expr, decl_range(3));
    ActionDecl::new(NOTIFY_TYPE, name, decl_range(1)).with_config(body)
}

/// Parse a target address
pub fn target(addr: &str) -> ActionTarget {
    addr.parse()
        .unwrap_or_else(|err| panic!("bad target {addr}: {err}"))
}

/// In-memory collaborators for one walk
pub struct TestEnv {
    pub config: Config,
    pub expander: Arc<Expander>,
    pub evaluator: Arc<ScopeEvaluator>,
    pub registry: Arc<ProviderRegistry>,
    pub client: Arc<RecordingProvider>,
    pub cancellation: CancellationToken,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    /// Environment whose provider accepts everything
    pub fn new() -> Self {
        Self::with_client(RecordingProvider::accepting())
    }

    /// Environment backed by `client`, with the notify schema registered
    pub fn with_client(client: RecordingProvider) -> Self {
        let client = Arc::new(client);
        let registry = ProviderRegistry::new();
        registry.install_client(webhook_provider(), client.clone());
        registry.register_action_schema(&webhook_provider(), NOTIFY_TYPE, notify_schema());
        Self {
            config: Config::new(),
            expander: Arc::new(Expander::new()),
            evaluator: Arc::new(ScopeEvaluator::new()),
            registry: Arc::new(registry),
            client,
            cancellation: CancellationToken::new(),
        }
    }

    /// Add a declaration in `module`
    pub fn declare(&mut self, module: &Module, decl: ActionDecl) -> Arc<ActionDecl> {
        self.config.add_action(module, decl)
    }

    /// Record how `action` repeats
    pub fn expand(&self, action: &AbsAction, expansion: Expansion) {
        self.expander.set_action_expansion(action.clone(), expansion);
    }

    /// Walk context over this environment
    pub fn context(&self) -> WalkContext {
        WalkContext::new(
            self.expander.clone(),
            self.evaluator.clone(),
            self.registry.clone(),
        )
        .with_cancellation(self.cancellation.clone())
    }

    /// Walker over a snapshot of the configuration
    pub fn walker(&self) -> InvokeWalker {
        InvokeWalker::new(Arc::new(self.config.clone()))
    }
}
