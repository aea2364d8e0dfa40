//! Walk context
//!
//! Everything an invoke node needs from the surrounding graph walk, threaded
//! explicitly instead of held in globals.
//!
//! # Usage
//!
//! ```rust,ignore
//! let ctx = WalkContext::new(expander, evaluator, providers)
//!     .with_client_capabilities(settings.client_capabilities)
//!     .with_cancellation(token.child_token());
//! ```

use crate::changes::ChangeSet;
use crate::eval::BlockEvaluator;
use crate::expander::InstanceExpander;
use crate::providers::{ClientCapabilities, ProviderSource};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Collaborators shared by every node of one walk
#[derive(Clone)]
pub struct WalkContext {
    expander: Arc<dyn InstanceExpander>,
    evaluator: Arc<dyn BlockEvaluator>,
    providers: Arc<dyn ProviderSource>,
    changes: Arc<ChangeSet>,
    client_capabilities: ClientCapabilities,
    cancellation: CancellationToken,
}

impl std::fmt::Debug for WalkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkContext")
            .field("changes", &self.changes.len())
            .field("client_capabilities", &self.client_capabilities)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl WalkContext {
    /// Context with an empty change set and default capabilities
    #[must_use]
    pub fn new(
        expander: Arc<dyn InstanceExpander>,
        evaluator: Arc<dyn BlockEvaluator>,
        providers: Arc<dyn ProviderSource>,
    ) -> Self {
        Self {
            expander,
            evaluator,
            providers,
            changes: Arc::new(ChangeSet::new()),
            client_capabilities: ClientCapabilities::default(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Record planned invocations into `changes`
    #[inline]
    #[must_use]
    pub fn with_changes(mut self, changes: Arc<ChangeSet>) -> Self {
        self.changes = changes;
        self
    }

    /// Declare caller capabilities sent with every plan request
    #[inline]
    #[must_use]
    pub fn with_client_capabilities(mut self, capabilities: ClientCapabilities) -> Self {
        self.client_capabilities = capabilities;
        self
    }

    /// Abort pipelines when `token` is cancelled
    #[inline]
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Instance expander
    #[inline]
    #[must_use]
    pub fn expander(&self) -> &dyn InstanceExpander {
        self.expander.as_ref()
    }

    /// Configuration evaluator
    #[inline]
    #[must_use]
    pub fn evaluator(&self) -> &dyn BlockEvaluator {
        self.evaluator.as_ref()
    }

    /// Provider lookup
    #[inline]
    #[must_use]
    pub fn providers(&self) -> &dyn ProviderSource {
        self.providers.as_ref()
    }

    /// Shared change set
    #[inline]
    #[must_use]
    pub fn changes(&self) -> &Arc<ChangeSet> {
        &self.changes
    }

    /// Caller capabilities
    #[inline]
    #[must_use]
    pub fn client_capabilities(&self) -> ClientCapabilities {
        self.client_capabilities
    }

    /// Walk cancellation signal
    #[inline]
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}
