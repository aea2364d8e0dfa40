//! Instance execution pipeline
//!
//! One concrete instance is planned in a fixed sequence of steps. Any error
//! before dispatch stops the pipeline without contacting the provider; the
//! invocation record is appended only when every step succeeded.
//!
//! | Step | Fails with |
//! |------|------------|
//! | repetition data | |
//! | evaluation | evaluator errors |
//! | ephemeral validation | `Invalid use of ephemeral value` |
//! | deprecation validation | deprecation errors |
//! | provider lookup | `Failed to get provider` |
//! | completeness check | `Partially applied configuration` |
//! | plan action | provider errors |
//! | deferral check | `Provider deferred an action` |
//! | commit | |
//!
//! Cancellation is observed before every step and while waiting on the
//! evaluator or the provider.

use super::ActionInvokeNode;
use crate::changes::ActionInvocation;
use crate::configs::{ActionDecl, Body};
use crate::context::WalkContext;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::eval::validate_forbidden_ephemeral_values;
use crate::providers::{ActionSchema, PlanActionRequest};
use invoke_addrs::{AbsActionInstance, AbsProviderConfig, ActionTarget, ModuleInstance, Reference};
use invoke_value::{remove_ephemeral_values, Value};
use std::fmt::{self, Display, Formatter};
use std::future::Future;
use std::sync::Arc;
use tracing::Instrument;

/// Pipeline step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStep {
    /// Look up key-scoped evaluation data
    RepetitionData,
    /// Evaluate the configuration body
    Evaluation,
    /// Reject ephemeral values
    EphemeralValidation,
    /// Report deprecations
    DeprecationValidation,
    /// Obtain a live provider client
    ProviderLookup,
    /// Require a wholly known configuration
    CompletenessCheck,
    /// Ask the provider to plan
    PlanAction,
    /// Reject deferral
    DeferralCheck,
    /// Append the invocation record
    Commit,
}

impl Display for PipelineStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RepetitionData => "repetition data lookup",
            Self::Evaluation => "configuration evaluation",
            Self::EphemeralValidation => "ephemeral value validation",
            Self::DeprecationValidation => "deprecation validation",
            Self::ProviderLookup => "provider lookup",
            Self::CompletenessCheck => "completeness check",
            Self::PlanAction => "plan action",
            Self::DeferralCheck => "deferral check",
            Self::Commit => "commit",
        })
    }
}

/// The pipeline stopped; the reason is already in the diagnostics
struct Halted;

/// One concrete, executable instance
///
/// Captures the provider binding and schema of the node it was expanded
/// from, so nothing it reads can change while it runs.
#[derive(Debug, Clone)]
pub struct ActionInvokeInstanceNode {
    target: ActionTarget,
    addr: AbsActionInstance,
    config: Arc<ActionDecl>,
    provider: AbsProviderConfig,
    schema: Arc<ActionSchema>,
    references: Vec<Reference>,
}

impl ActionInvokeInstanceNode {
    /// Instance `addr` of `node`
    ///
    /// # Panics
    /// Panics when `node` is unconfigured or not yet bound.
    pub(crate) fn new(node: &ActionInvokeNode, addr: AbsActionInstance) -> Self {
        let (config, provider, schema) = node.resolved();
        Self {
            target: node.target().clone(),
            addr,
            config,
            provider,
            schema,
            references: node.references(),
        }
    }

    /// Instance address
    #[inline]
    #[must_use]
    pub fn addr(&self) -> &AbsActionInstance {
        &self.addr
    }

    /// Module instance the action lives in
    #[inline]
    #[must_use]
    pub fn path(&self) -> &ModuleInstance {
        &self.addr.module
    }

    /// Provider configuration that plans this instance
    #[inline]
    #[must_use]
    pub fn provider(&self) -> &AbsProviderConfig {
        &self.provider
    }

    /// Graph node name
    #[must_use]
    pub fn name(&self) -> String {
        format!("{} (invoke)", self.addr)
    }

    /// References inherited from the abstract node
    #[inline]
    #[must_use]
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Run the pipeline, returning this instance's diagnostics
    pub async fn execute(&self, ctx: &WalkContext) -> Diagnostics {
        let span = tracing::info_span!("action_invoke", action = %self.addr, provider = %self.provider);
        let mut diags = Diagnostics::new();
        if self.run(ctx, &mut diags).instrument(span.clone()).await.is_err() {
            span.in_scope(|| {
                tracing::warn!(errors = diags.error_count(), "action invocation not planned");
            });
        }
        diags
    }

    async fn run(&self, ctx: &WalkContext, diags: &mut Diagnostics) -> Result<(), Halted> {
        let schema = &self.schema.config_schema;
        let addr = self.addr.to_string();

        self.checkpoint(ctx, PipelineStep::RepetitionData, diags)?;
        let repetition = ctx.expander().get_repetition_data(&self.addr);

        let mut config_val = Value::null(schema.implied_type());
        if let Some(body) = &self.config.config {
            self.checkpoint(ctx, PipelineStep::Evaluation, diags)?;
            let evaluated = ctx.evaluator().evaluate_block(body, schema, &repetition);
            let (value, eval_diags) = self
                .cancellable(ctx, PipelineStep::Evaluation, diags, evaluated)
                .await?;
            let failed = eval_diags.has_errors();
            diags.append(eval_diags.in_config_body(body, &addr));
            if failed {
                return Err(Halted);
            }

            self.checkpoint(ctx, PipelineStep::EphemeralValidation, diags)?;
            diags.append(validate_forbidden_ephemeral_values(&value, schema).in_config_body(body, &addr));

            self.checkpoint(ctx, PipelineStep::DeprecationValidation, diags)?;
            let module = self.addr.module.module();
            let (value, deprecation_diags) =
                ctx.evaluator().validate_deprecations(value, schema, &module);
            diags.append(deprecation_diags.in_config_body(body, &addr));

            if diags.has_errors() {
                return Err(Halted);
            }
            config_val = value;
        }

        let persisted = remove_ephemeral_values(config_val.clone());

        self.checkpoint(ctx, PipelineStep::ProviderLookup, diags)?;
        let lookup = ctx.providers().get_provider(&self.provider);
        let provider = match self
            .cancellable(ctx, PipelineStep::ProviderLookup, diags, lookup)
            .await?
        {
            Ok(provider) => provider,
            Err(err) => {
                diags.push(
                    Diagnostic::error(
                        "Failed to get provider",
                        format!(
                            "Failed to get provider while triggering action {}: {err}.",
                            self.target
                        ),
                    )
                    .with_subject(self.config.decl_range.clone())
                    .with_address(addr.clone()),
                );
                return Err(Halted);
            }
        };

        self.checkpoint(ctx, PipelineStep::CompletenessCheck, diags)?;
        let (unmarked, _) = config_val.unmark_deep_with_paths();
        if !unmarked.is_wholly_known() {
            diags.push(
                Diagnostic::error(
                    "Partially applied configuration",
                    format!(
                        "The action {} contains unknown values while planning. This means it is referencing resources that have not yet been created, please run a complete plan/apply cycle to ensure the state matches the configuration before using the -invoke argument.",
                        self.target
                    ),
                )
                .with_subject(self.config.decl_range.clone())
                .with_address(addr.clone()),
            );
            return Err(Halted);
        }

        self.checkpoint(ctx, PipelineStep::PlanAction, diags)?;
        let request = PlanActionRequest {
            action_type: self.addr.action.action.type_name.clone(),
            proposed_action_data: unmarked,
            client_capabilities: ctx.client_capabilities(),
        };
        let planned = provider.plan_action(request);
        let resp = self
            .cancellable(ctx, PipelineStep::PlanAction, diags, planned)
            .await?;
        tracing::debug!(
            diagnostics = resp.diagnostics.len(),
            deferred = resp.deferred.is_some(),
            "provider planned action"
        );
        let provider_failed = resp.diagnostics.has_errors();
        let containing = self.addr.containing_action().to_string();
        diags.append(anchor(resp.diagnostics, self.config.config.as_ref(), &containing));

        self.checkpoint(ctx, PipelineStep::DeferralCheck, diags)?;
        if let Some(deferred) = resp.deferred {
            tracing::debug!(reason = ?deferred.reason, "provider deferred action");
            diags.push(
                Diagnostic::error(
                    "Provider deferred an action",
                    format!(
                        "The provider for {} ordered the action deferred. This likely means you are executing the action against a configuration that hasn't been completely applied.",
                        self.target
                    ),
                )
                .with_subject(self.config.decl_range.clone())
                .with_address(addr.clone()),
            );
            return Err(Halted);
        }
        if provider_failed {
            return Err(Halted);
        }

        self.checkpoint(ctx, PipelineStep::Commit, diags)?;
        ctx.changes().append_action_invocation(ActionInvocation::invoke(
            self.addr.clone(),
            self.provider.clone(),
            persisted,
        ));
        Ok(())
    }

    fn checkpoint(&self, ctx: &WalkContext, step: PipelineStep, diags: &mut Diagnostics) -> Result<(), Halted> {
        if ctx.cancellation().is_cancelled() {
            diags.push(self.cancelled(step));
            return Err(Halted);
        }
        tracing::debug!(%step, "pipeline checkpoint");
        Ok(())
    }

    async fn cancellable<T>(
        &self,
        ctx: &WalkContext,
        step: PipelineStep,
        diags: &mut Diagnostics,
        fut: impl Future<Output = T> + Send,
    ) -> Result<T, Halted> {
        tokio::select! {
            biased;
            () = ctx.cancellation().cancelled() => {
                diags.push(self.cancelled(step));
                Err(Halted)
            }
            out = fut => Ok(out),
        }
    }

    fn cancelled(&self, step: PipelineStep) -> Diagnostic {
        tracing::debug!(%step, "pipeline cancelled");
        Diagnostic::error(
            "Action invocation cancelled",
            format!("Planning of {} was cancelled before {step}.", self.addr),
        )
        .with_subject(self.config.decl_range.clone())
        .with_address(self.addr.to_string())
    }
}

/// Anchor provider diagnostics to the configuration body, or just name the
/// action when there is none
fn anchor(diags: Diagnostics, body: Option<&Body>, address: &str) -> Diagnostics {
    match body {
        Some(body) => diags.in_config_body(body, address),
        None => diags
            .into_iter()
            .map(|diag| match diag.address {
                Some(_) => diag,
                None => diag.with_address(address),
            })
            .collect(),
    }
}
