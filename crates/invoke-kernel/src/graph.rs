//! Expansion subgraphs
//!
//! Dynamic expansion hands the walker a small graph instead of a bare list:
//! the instance nodes plus a synthetic root that every instance reaches. The
//! walker can then treat zero, one and many instances the same way.

use crate::error::GraphError;
use crate::node::ActionInvokeInstanceNode;
use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graph::{DiGraph, NodeIndex};

/// Vertex of an expansion subgraph
#[derive(Debug)]
pub enum SubgraphNode {
    /// One executable instance
    Instance(ActionInvokeInstanceNode),
    /// Synthetic root
    Root,
}

/// Graph produced by one dynamic expansion
///
/// Edges point from an instance to the root.
#[derive(Debug, Default)]
pub struct Subgraph {
    graph: DiGraph<SubgraphNode, ()>,
    root: Option<NodeIndex>,
}

impl Subgraph {
    /// Empty subgraph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance node
    pub fn add_instance(&mut self, node: ActionInvokeInstanceNode) -> NodeIndex {
        let idx = self.graph.add_node(SubgraphNode::Instance(node));
        if let Some(root) = self.root {
            self.graph.add_edge(idx, root, ());
        }
        idx
    }

    /// Add the root, connecting every node to it
    ///
    /// Adding a root twice returns the existing one.
    pub fn add_root(&mut self) -> NodeIndex {
        if let Some(root) = self.root {
            return root;
        }
        let existing: Vec<NodeIndex> = self.graph.node_indices().collect();
        let root = self.graph.add_node(SubgraphNode::Root);
        for idx in existing {
            self.graph.add_edge(idx, root, ());
        }
        self.root = Some(root);
        root
    }

    /// Root index, once added
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    /// Instance nodes in insertion order
    pub fn instances(&self) -> impl Iterator<Item = &ActionInvokeInstanceNode> {
        self.graph.node_weights().filter_map(|n| match n {
            SubgraphNode::Instance(inst) => Some(inst),
            SubgraphNode::Root => None,
        })
    }

    /// Take the instance nodes out of the graph
    #[must_use]
    pub fn into_instances(self) -> Vec<ActionInvokeInstanceNode> {
        let (nodes, _) = self.graph.into_nodes_edges();
        nodes
            .into_iter()
            .filter_map(|n| match n.weight {
                SubgraphNode::Instance(inst) => Some(inst),
                SubgraphNode::Root => None,
            })
            .collect()
    }

    /// Number of instance nodes
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances().count()
    }

    /// Check the subgraph is acyclic and every instance reaches the root
    ///
    /// # Errors
    /// Returns the first structural problem found.
    pub fn validate(&self) -> Result<(), GraphError> {
        if is_cyclic_directed(&self.graph) {
            return Err(GraphError::CycleDetected);
        }
        let Some(root) = self.root else {
            return if self.graph.node_count() == 0 {
                Ok(())
            } else {
                Err(GraphError::MissingRoot)
            };
        };
        for idx in self.graph.node_indices() {
            if let SubgraphNode::Instance(inst) = &self.graph[idx] {
                if !has_path_connecting(&self.graph, idx, root, None) {
                    return Err(GraphError::Unrooted(inst.addr().to_string()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::{ActionDecl, SourceRange};
    use crate::node::ActionInvokeNode;
    use crate::providers::ActionSchema;
    use invoke_addrs::{AbsProviderConfig, Action, ActionTarget, InstanceKey, Module, ModuleInstance, Provider};
    use std::sync::Arc;

    fn bound_node() -> ActionInvokeNode {
        let action = Action::new("webhook_notify", "notify").absolute(&ModuleInstance::root());
        let decl = ActionDecl::new("webhook_notify", "notify", SourceRange::new("main.tf", (1, 1), (1, 2)));
        let node = ActionInvokeNode::new(ActionTarget::Action(action), Some(Arc::new(decl)));
        node.set_provider(AbsProviderConfig::new(Module::root(), Provider::new("webhook"), None))
            .unwrap();
        node.attach_action_schema(Arc::new(ActionSchema::default())).unwrap();
        node
    }

    fn instance(node: &ActionInvokeNode, i: i64) -> ActionInvokeInstanceNode {
        ActionInvokeInstanceNode::new(node, node.target().abs_action().instance(InstanceKey::Int(i)))
    }

    #[test]
    fn root_is_reachable_from_every_instance() {
        let node = bound_node();
        let mut graph = Subgraph::new();
        graph.add_instance(instance(&node, 0));
        graph.add_instance(instance(&node, 1));
        graph.add_root();
        graph.add_instance(instance(&node, 2));

        assert_eq!(graph.instance_count(), 3);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn add_root_is_idempotent() {
        let mut graph = Subgraph::new();
        let first = graph.add_root();
        assert_eq!(graph.add_root(), first);
        assert_eq!(graph.instance_count(), 0);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn instances_without_root_are_rejected() {
        let node = bound_node();
        let mut graph = Subgraph::new();
        graph.add_instance(instance(&node, 0));
        assert_eq!(graph.validate(), Err(GraphError::MissingRoot));
    }

    #[test]
    fn into_instances_keeps_insertion_order() {
        let node = bound_node();
        let mut graph = Subgraph::new();
        for i in 0..4 {
            graph.add_instance(instance(&node, i));
        }
        graph.add_root();
        let keys: Vec<_> = graph
            .into_instances()
            .into_iter()
            .map(|inst| inst.addr().action.key.clone())
            .collect();
        assert_eq!(keys, (0..4).map(InstanceKey::Int).collect::<Vec<_>>());
    }
}
