//! Station graph used for the one-time connectivity check
//!
//! Stations are nodes and lines are undirected edges. Lines naming unknown
//! stations are left out; the line's own validation reports them.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use std::collections::HashMap;

use super::types::{LineId, StationId};
use super::world::World;

/// Undirected view of the rail network
#[derive(Debug, Default)]
pub struct RailNetwork {
    graph: UnGraph<StationId, LineId>,

    /// Maps station IDs to their node indices in the graph
    station_to_node: HashMap<StationId, NodeIndex>,
}

impl RailNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_world(world: &World) -> Self {
        let mut network = Self::new();
        for id in world.stations().keys() {
            network.add_station(id.clone());
        }
        for line in world.lines().values() {
            let [a, b] = &line.ends;
            network.add_line(line.id.clone(), a, b);
        }
        network
    }

    pub fn add_station(&mut self, id: StationId) {
        if self.station_to_node.contains_key(&id) {
            return;
        }
        let node = self.graph.add_node(id.clone());
        self.station_to_node.insert(id, node);
    }

    /// Adds an edge between two known stations. Returns `false` if either
    /// end is unknown.
    pub fn add_line(&mut self, id: LineId, a: &StationId, b: &StationId) -> bool {
        match (self.station_to_node.get(a), self.station_to_node.get(b)) {
            (Some(&a), Some(&b)) => {
                self.graph.add_edge(a, b, id);
                true
            }
            _ => false,
        }
    }

    pub fn station_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn line_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True when a breadth-first walk from any station reaches all others.
    ///
    /// No stations is trivially connected. Stations without any line are
    /// not, even if there is only one of them.
    pub fn is_connected(&self) -> bool {
        let Some(first) = self.graph.node_indices().next() else {
            return true;
        };
        if self.graph.edge_count() == 0 {
            return false;
        }

        let mut bfs = Bfs::new(&self.graph, first);
        let mut reached = 0;
        while bfs.next(&self.graph).is_some() {
            reached += 1;
        }

        reached == self.graph.node_count()
    }

    /// Number of connected parts, used for diagnostics
    pub fn component_count(&self) -> usize {
        petgraph::algo::connected_components(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(stations: &[&str], lines: &[(&str, &str)]) -> RailNetwork {
        let mut network = RailNetwork::new();
        for s in stations {
            network.add_station(StationId::from(*s));
        }
        for (i, (a, b)) in lines.iter().enumerate() {
            network.add_line(
                LineId::from(format!("L{i}")),
                &StationId::from(*a),
                &StationId::from(*b),
            );
        }
        network
    }

    #[test]
    fn empty_network_is_connected() {
        assert!(network(&[], &[]).is_connected());
    }

    #[test]
    fn single_station_without_lines_is_not_connected() {
        assert!(!network(&["A"], &[]).is_connected());
    }

    #[test]
    fn tree_is_connected() {
        let n = network(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("B", "D")],
        );
        assert!(n.is_connected());
        assert_eq!(n.component_count(), 1);
    }

    #[test]
    fn two_clusters_are_not_connected() {
        let n = network(&["A", "B", "C", "D"], &[("A", "B"), ("C", "D")]);
        assert!(!n.is_connected());
        assert_eq!(n.component_count(), 2);
    }

    #[test]
    fn unknown_end_is_skipped() {
        let mut n = network(&["A", "B"], &[("A", "B")]);
        assert!(!n.add_line(LineId::from("X"), &StationId::from("A"), &StationId::from("Z")));
        assert_eq!(n.line_count(), 1);
        assert_eq!(n.station_count(), 2);
    }
}
