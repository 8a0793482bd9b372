use crate::network::{DeviceId, Medium};
use petgraph::algo::astar;
use petgraph::graphmap::UnGraphMap;

/// Undirected device graph, edges labeled with the link medium.
#[derive(Debug, Default, Clone)]
pub struct TopologyGraph {
    graph: UnGraphMap<DeviceId, Medium>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&mut self, id: DeviceId) {
        self.graph.add_node(id);
    }

    /// Drops the node and every incident edge.
    pub fn remove_device(&mut self, id: DeviceId) -> bool {
        self.graph.remove_node(id)
    }

    pub fn contains_device(&self, id: DeviceId) -> bool {
        self.graph.contains_node(id)
    }

    /// Returns false (and leaves the graph alone) for self loops, duplicates and unknown nodes.
    pub fn add_link(&mut self, a: DeviceId, b: DeviceId, medium: Medium) -> bool {
        if a == b
            || !self.graph.contains_node(a)
            || !self.graph.contains_node(b)
            || self.graph.contains_edge(a, b)
        {
            return false;
        }
        self.graph.add_edge(a, b, medium);
        true
    }

    pub fn remove_link(&mut self, a: DeviceId, b: DeviceId) -> Option<Medium> {
        self.graph.remove_edge(a, b)
    }

    pub fn has_link(&self, a: DeviceId, b: DeviceId) -> bool {
        self.graph.contains_edge(a, b)
    }

    pub fn medium(&self, a: DeviceId, b: DeviceId) -> Option<Medium> {
        self.graph.edge_weight(a, b).copied()
    }

    pub fn neighbors(&self, id: DeviceId) -> Vec<DeviceId> {
        if !self.graph.contains_node(id) {
            return Vec::new();
        }
        self.graph.neighbors(id).collect()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Fewest-hops path including both endpoints. Medium plays no part in the choice.
    pub fn path(&self, from: DeviceId, to: DeviceId) -> Option<Vec<DeviceId>> {
        if !self.graph.contains_node(from) || !self.graph.contains_node(to) {
            return None;
        }
        astar(&self.graph, from, |n| n == to, |_| 1u32, |_| 0u32).map(|(_, path)| path)
    }
}
