use crate::domain::edge::DependencyEdge;
use crate::domain::node::ModuleNode;
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Module dependency graph. Edges point from a module to its dependency.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    pub graph: DiGraph<ModuleNode, DependencyEdge>,

    /// Mapping from module name to node index
    pub name_to_node: HashMap<String, NodeIndex>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: ModuleNode) -> NodeIndex {
        let name = node.name().to_string();
        let idx = self.graph.add_node(node);
        self.name_to_node.insert(name, idx);
        idx
    }

    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, edge: DependencyEdge) -> EdgeIndex {
        self.graph.add_edge(source, target, edge)
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeIndex> {
        self.name_to_node.get(name).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &ModuleNode {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut ModuleNode {
        &mut self.graph[idx]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Direct dependencies in the order they were declared. A module may depend on the same
    /// target through several edges.
    pub fn dependencies(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DependencyEdge)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| (edge.id(), edge.target(), edge.weight()))
            .collect();
        // petgraph yields outgoing edges newest first.
        edges.sort_by_key(|(id, _, _)| *id);
        edges.into_iter().map(|(_, target, edge)| (target, edge)).collect()
    }
}
