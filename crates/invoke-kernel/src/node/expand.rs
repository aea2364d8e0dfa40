//! Dynamic expansion of invoke targets

use super::{ActionInvokeInstanceNode, ActionInvokeNode};
use crate::context::WalkContext;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::Subgraph;
use invoke_addrs::{ActionTarget, Reference};
use std::sync::Arc;

/// Placeholder that fans out into instance nodes once repetition is known
#[derive(Debug, Clone)]
pub struct ActionInvokeExpandNode {
    node: Arc<ActionInvokeNode>,
}

impl ActionInvokeExpandNode {
    /// Wrap an abstract node
    #[inline]
    #[must_use]
    pub fn new(node: Arc<ActionInvokeNode>) -> Self {
        Self { node }
    }

    /// Wrapped abstract node
    #[inline]
    #[must_use]
    pub fn node(&self) -> &Arc<ActionInvokeNode> {
        &self.node
    }

    /// Graph node name
    #[must_use]
    pub fn name(&self) -> String {
        self.node.name()
    }

    /// Same references as the wrapped node
    #[must_use]
    pub fn references(&self) -> Vec<Reference> {
        self.node.references()
    }

    /// Expand into one instance node per concrete instance
    ///
    /// Returns no graph and one error when the target is not configured or a
    /// targeted instance does not exist after expansion. Otherwise the graph
    /// always carries a root, even with zero instances.
    ///
    /// # Panics
    /// Panics when a configured node is expanded before its provider and
    /// schema are bound.
    pub fn dynamic_expand(&self, ctx: &WalkContext) -> (Option<Subgraph>, Diagnostics) {
        let target = self.node.target();
        let Some(decl) = self.node.config() else {
            tracing::warn!(%target, "invoke target is not configured");
            let diag = Diagnostic::error(
                "Invalid action target",
                format!("Action {target} does not exist within the configuration."),
            );
            return (None, diag.into());
        };

        let instances = match target {
            ActionTarget::Instance(addr) => {
                if !ctx.expander().has_instance(addr) {
                    tracing::warn!(%addr, "targeted instance does not exist");
                    let diag = Diagnostic::error(
                        "Invalid action",
                        format!("Targeted action does not exist after expansion: {addr}."),
                    )
                    .with_subject(decl.decl_range.clone());
                    return (None, diag.into());
                }
                vec![addr.clone()]
            }
            ActionTarget::Action(addr) => ctx.expander().expand_action(addr),
        };

        let mut graph = Subgraph::new();
        for addr in instances {
            graph.add_instance(ActionInvokeInstanceNode::new(&self.node, addr));
        }
        graph.add_root();
        tracing::debug!(node = %self.name(), instances = graph.instance_count(), "expanded invoke target");
        (Some(graph), Diagnostics::new())
    }
}
