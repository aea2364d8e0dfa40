//! Invoke walk driver
//!
//! Plays the graph walker's part for explicitly invoked targets: binds each
//! target to its provider and schema, expands it, then plans every resulting
//! instance with bounded concurrency. Sibling instances share nothing but the
//! change set and the diagnostics sink.
//!
//! # Usage
//!
//! ```rust,ignore
//! let walker = InvokeWalker::new(Arc::new(config)).with_parallelism(settings.parallelism);
//! let report = walker.walk(&ctx, &["action.webhook_notify.notify".parse()?]).await;
//! if report.has_errors() {
//!     for diag in report.diagnostics.errors() {
//!         eprintln!("{diag}");
//!     }
//! }
//! ```

use crate::changes::ChangeSet;
use crate::configs::Config;
use crate::context::WalkContext;
use crate::diagnostics::{Diagnostic, Diagnostics, DiagnosticsSink};
use crate::node::{ActionInvokeExpandNode, ActionInvokeInstanceNode, ActionInvokeNode};
use crate::settings::InvokeConfig;
use futures::stream::{self, StreamExt};
use invoke_addrs::{ActionTarget, ProviderConfig};
use std::sync::Arc;

/// Outcome of one invoke walk
#[derive(Debug)]
pub struct WalkReport {
    /// Diagnostics this walk produced, also appended to the sink
    pub diagnostics: Diagnostics,
    /// Change set the instances committed to
    pub changes: Arc<ChangeSet>,
    /// Instance pipelines that ran
    pub instances_run: usize,
    /// Whether the walk was cancelled
    pub cancelled: bool,
}

impl WalkReport {
    /// Whether any error was reported
    #[inline]
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Drives invoke targets through binding, expansion and execution
#[derive(Debug)]
pub struct InvokeWalker {
    config: Arc<Config>,
    parallelism: usize,
    sink: Arc<DiagnosticsSink>,
}

impl InvokeWalker {
    /// Walker over `config` with default settings
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            parallelism: InvokeConfig::default().parallelism,
            sink: Arc::new(DiagnosticsSink::new()),
        }
    }

    /// Walker configured from `settings`
    #[must_use]
    pub fn from_settings(config: Arc<Config>, settings: &InvokeConfig) -> Self {
        Self::new(config).with_parallelism(settings.parallelism)
    }

    /// Plan at most `parallelism` instances at once
    #[inline]
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Report into a shared sink
    #[inline]
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Diagnostics sink
    #[inline]
    #[must_use]
    pub fn sink(&self) -> &Arc<DiagnosticsSink> {
        &self.sink
    }

    /// Plan every instance of `targets`
    pub async fn walk(&self, ctx: &WalkContext, targets: &[ActionTarget]) -> WalkReport {
        let mut diagnostics = Diagnostics::new();
        let mut instances = Vec::new();
        for target in targets {
            let (expanded, diags) = self.prepare(ctx, target);
            diagnostics.append(diags);
            instances.extend(expanded);
        }

        let instances_run = instances.len();
        tracing::info!(targets = targets.len(), instances = instances_run, "planning invoked actions");

        let executed: Vec<Diagnostics> = stream::iter(instances.iter())
            .map(|instance| instance.execute(ctx))
            .buffer_unordered(self.parallelism)
            .collect()
            .await;
        for diags in executed {
            diagnostics.append(diags);
        }

        self.sink.append(diagnostics.clone());
        WalkReport {
            diagnostics,
            changes: Arc::clone(ctx.changes()),
            instances_run,
            cancelled: ctx.cancellation().is_cancelled(),
        }
    }

    /// Bind, expand and collect the instances of one target
    fn prepare(&self, ctx: &WalkContext, target: &ActionTarget) -> (Vec<ActionInvokeInstanceNode>, Diagnostics) {
        let decl = self.config.action(&target.config_action());
        let node = Arc::new(ActionInvokeNode::new(target.clone(), decl.clone()));

        if let Some(decl) = &decl {
            let resolved = match node.provided_by() {
                (ProviderConfig::Absolute(abs), _) => abs,
                (ProviderConfig::Local(local), _) => {
                    self.config
                        .resolve_provider(&node.module_path(), &local, &node.provider())
                }
            };
            if let Err(err) = node.set_provider(resolved) {
                return (Vec::new(), Diagnostic::error("Invalid provider binding", err.to_string()).into());
            }

            let provider = node.provider();
            let Some(schema) = ctx.providers().action_schema(&provider, &decl.type_name) else {
                let diag = Diagnostic::error(
                    "Invalid action type",
                    format!(
                        "The provider {provider} does not support action type \"{}\".",
                        decl.type_name
                    ),
                )
                .with_subject(decl.decl_range.clone());
                return (Vec::new(), diag.into());
            };
            if let Err(err) = node.attach_action_schema(schema) {
                return (Vec::new(), Diagnostic::error("Invalid action schema", err.to_string()).into());
            }
        }

        let (graph, mut diags) = ActionInvokeExpandNode::new(node).dynamic_expand(ctx);
        let Some(graph) = graph else {
            return (Vec::new(), diags);
        };
        if let Err(err) = graph.validate() {
            diags.push(Diagnostic::error("Invalid expansion graph", err.to_string()));
            return (Vec::new(), diags);
        }
        (graph.into_instances(), diags)
    }
}
