//! Invoke Kernel
//!
//! Plan-time engine for explicitly invoked actions. A user names an action
//! (or one instance of it); the kernel binds it to a provider, expands it into
//! concrete instances and plans each one through a fail-fast pipeline:
//!
//! 1. **Evaluate**: configuration body against the action schema
//! 2. **Validate**: no ephemeral values, deprecations reported
//! 3. **Check**: provider available, configuration wholly known
//! 4. **Dispatch**: plan-action request to the provider
//! 5. **Commit**: invocation record appended to the change set
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use invoke_kernel::prelude::*;
//!
//! let ctx = WalkContext::new(expander, evaluator, registry);
//! let walker = InvokeWalker::new(Arc::new(config));
//!
//! let report = walker.walk(&ctx, &["action.webhook_notify.notify[\"prod\"]".parse()?]).await;
//! for invocation in report.changes.action_invocations() {
//!     println!("{}", invocation.addr());
//! }
//! ```

pub mod changes;
pub mod configs;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod expander;
pub mod graph;
pub mod node;
pub mod providers;
pub mod settings;
pub mod telemetry;
pub mod types;
pub mod walk;

// Test harness
pub mod test_harness;

pub use error::*;

/// Commonly used types
pub mod prelude {
    pub use crate::changes::{ActionInvocation, ActionTrigger, ChangeSet};
    pub use crate::configs::{ActionDecl, Body, Config, Expr, SourceRange};
    pub use crate::context::WalkContext;
    pub use crate::diagnostics::{Diagnostic, Diagnostics, DiagnosticsSink, Severity};
    pub use crate::error::{BindingError, GraphError, ProviderError, SettingsError};
    pub use crate::eval::{BlockEvaluator, Deprecations, RepetitionData, ScopeEvaluator};
    pub use crate::expander::{Expander, Expansion, InstanceExpander, InstanceSet};
    pub use crate::graph::{Subgraph, SubgraphNode};
    pub use crate::node::{ActionInvokeExpandNode, ActionInvokeInstanceNode, ActionInvokeNode, PipelineStep};
    pub use crate::providers::{
        ActionSchema, ClientCapabilities, DeferredReason, PlanActionRequest, PlanActionResponse,
        ProviderClient, ProviderRegistry, ProviderSource,
    };
    pub use crate::settings::{InvokeConfig, LogFormat};
    pub use crate::types::InvocationId;
    pub use crate::walk::{InvokeWalker, WalkReport};
    pub use invoke_addrs::{AbsAction, AbsActionInstance, Action, ActionTarget, InstanceKey, ModuleInstance};
    pub use invoke_value::{AttributeSchema, BlockSchema, Mark, Type, Value};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
