//! Invoke graph nodes
//!
//! An explicitly invoked action passes through three node kinds:
//!
//! 1. [`ActionInvokeNode`]: the target as requested, bound to a provider by
//!    the walker before anything expands.
//! 2. [`ActionInvokeExpandNode`]: turns the target into concrete instances
//!    once repetition is resolved.
//! 3. [`ActionInvokeInstanceNode`]: plans one instance and records the result.
//!
//! # Example
//!
//! ```rust,ignore
//! let node = Arc::new(ActionInvokeNode::new(target, config.action(&addr)));
//! node.set_provider(resolved)?;
//! node.attach_action_schema(schema)?;
//!
//! let (graph, diags) = ActionInvokeExpandNode::new(node).dynamic_expand(&ctx);
//! for instance in graph.map(Subgraph::into_instances).unwrap_or_default() {
//!     let diags = instance.execute(&ctx).await;
//! }
//! ```

mod abstract_node;
mod expand;
mod instance;

pub use abstract_node::ActionInvokeNode;
pub use expand::ActionInvokeExpandNode;
pub use instance::{ActionInvokeInstanceNode, PipelineStep};
