// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, Edge, Node, METERS_PER_KILOMETER};
use std::collections::btree_map::{BTreeMap, Entry};
use std::collections::HashMap;

/// Error conditions which may occur when constructing a [Graph].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("node id must not be zero")]
    ZeroNodeId,

    #[error("node {0} has invalid coordinates")]
    InvalidCoordinates(i64),

    #[error("node {0} already exists with different coordinates")]
    NodeMoved(i64),

    #[error("unknown node: {0}")]
    UnknownNode(i64),

    #[error("edge {from} -> {to} has invalid length {length}")]
    InvalidLength { from: i64, to: i64, length: f64 },
}

/// Represents a road network as a set of [Nodes](Node)
/// and directed [Edges](Edge) between them.
///
/// Nodes are kept ordered by their id, and this order is used
/// to break ties deterministically in nearest-node lookups.
///
/// A graph is built once (usually by the [osm](crate::osm) module) and
/// then only read from, which allows sharing it between threads without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<i64, (Node, Vec<Edge>)>,
    heuristic_scale: f64,
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::default(),
            heuristic_scale: 1.0,
        }
    }
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|(_, edges)| edges.len()).sum()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(|(node, _)| node)
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<Node> {
        self.nodes.get(&id).map(|&(node, _)| node)
    }

    /// Multiplier applied to the great-circle distance (in meters) to make it
    /// a lower bound of the road distance between any two nodes.
    ///
    /// Equals 1 as long as every edge is at least as long as the straight line
    /// between its nodes, which is always the case for graphs built from OSM data.
    pub fn heuristic_scale(&self) -> f64 {
        self.heuristic_scale
    }

    /// Creates a new [Node].
    ///
    /// Coordinates of existing nodes are immutable; setting an existing node
    /// with the same coordinates is a no-op.
    pub fn set_node(&mut self, node: Node) -> Result<(), GraphError> {
        if node.id == 0 {
            return Err(GraphError::ZeroNodeId);
        }

        if !(node.lat.is_finite() && node.lon.is_finite())
            || node.lat.abs() > 90.0
            || node.lon.abs() > 180.0
        {
            return Err(GraphError::InvalidCoordinates(node.id));
        }

        match self.nodes.entry(node.id) {
            Entry::Vacant(e) => {
                e.insert((node, Vec::default()));
                Ok(())
            }
            Entry::Occupied(e) if e.get().0 == node => Ok(()),
            Entry::Occupied(_) => Err(GraphError::NodeMoved(node.id)),
        }
    }

    /// Gets all outgoing [Edges](Edge) from a node with a given id.
    pub fn get_edges(&self, from_id: i64) -> &[Edge] {
        self.nodes
            .get(&from_id)
            .map(|(_, e)| e.as_slice())
            .unwrap_or_default()
    }

    /// Gets the length of an [Edge] from one node to another.
    /// If such an edge doesn't exist, returns [f64::INFINITY].
    pub fn get_edge(&self, from_id: i64, to_id: i64) -> f64 {
        self.get_edges(from_id)
            .iter()
            .find_map(|edge| {
                if edge.to == to_id {
                    Some(edge.length)
                } else {
                    None
                }
            })
            .unwrap_or(f64::INFINITY)
    }

    /// Creates or updates an [Edge] from a node with a given id.
    ///
    /// Both nodes must already exist in the graph, and the length
    /// must be finite and non-negative.
    pub fn set_edge(&mut self, from_id: i64, edge: Edge) -> Result<(), GraphError> {
        if !edge.length.is_finite() || edge.length < 0.0 {
            return Err(GraphError::InvalidLength {
                from: from_id,
                to: edge.to,
                length: edge.length,
            });
        }

        let to = self
            .get_node(edge.to)
            .ok_or(GraphError::UnknownNode(edge.to))?;

        let (from, edges) = self
            .nodes
            .get_mut(&from_id)
            .ok_or(GraphError::UnknownNode(from_id))?;

        if let Some(candidate) = edges.iter_mut().find(|e| e.to == edge.to) {
            *candidate = edge;
        } else {
            edges.push(edge);
        }

        let span = earth_distance(from.lat, from.lon, to.lat, to.lon) * METERS_PER_KILOMETER;
        if span > 0.0 {
            self.heuristic_scale = self.heuristic_scale.min(edge.length / span);
        }

        Ok(())
    }

    /// Returns the total length of a path, or `None` if any
    /// two consecutive nodes are not connected by an edge.
    pub fn path_length(&self, path: &[i64]) -> Option<f64> {
        path.windows(2).try_fold(0.0, |total, pair| {
            let length = self.get_edge(pair[0], pair[1]);
            if length.is_finite() {
                Some(total + length)
            } else {
                None
            }
        })
    }

    /// Finds the closest [Node] to the given position by computing the distance
    /// to every node in the graph. Ties are broken towards the smallest node id.
    ///
    /// For repeated queries on large graphs, use a [KDTree](crate::KDTree).
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<Node> {
        self.iter()
            .map(|&nd| (earth_distance(lat, lon, nd.lat, nd.lon), nd))
            .min_by(|(a_dist, _), (b_dist, _)| a_dist.total_cmp(b_dist))
            .map(|(_, nd)| nd)
    }

    /// Removes all nodes outside of the largest weakly connected component.
    /// If multiple components have the same size, the one containing
    /// the smallest node id is retained.
    ///
    /// Returns the number of removed nodes.
    pub fn retain_largest_component(&mut self) -> usize {
        let ids: Vec<i64> = self.nodes.keys().cloned().collect();
        let index: HashMap<i64, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let mut components = DisjointSet::new(ids.len());

        for (i, (_, edges)) in self.nodes.values().enumerate() {
            for edge in edges {
                if let Some(&j) = index.get(&edge.to) {
                    components.union(i, j);
                }
            }
        }

        let roots: Vec<usize> = (0..ids.len()).map(|i| components.find(i)).collect();
        let mut sizes: HashMap<usize, usize> = HashMap::default();
        for &root in &roots {
            *sizes.entry(root).or_default() += 1;
        }

        // Roots are visited in node id order, so the first largest component wins.
        let mut best: Option<(usize, usize)> = None;
        for &root in &roots {
            let size = sizes[&root];
            match best {
                Some((_, best_size)) if best_size >= size => {}
                _ => best = Some((root, size)),
            }
        }

        let Some((best_root, _)) = best else {
            return 0;
        };

        let before = self.nodes.len();
        let keep: Vec<bool> = roots.iter().map(|&root| root == best_root).collect();
        self.nodes.retain(|id, _| keep[index[id]]);
        before - self.nodes.len()
    }
}

/// Union-find structure over `0..n`.
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let a = self.find(a);
        let b = self.find(b);
        if a == b {
            return;
        }
        match self.rank[a].cmp(&self.rank[b]) {
            std::cmp::Ordering::Less => self.parent[a] = b,
            std::cmp::Ordering::Greater => self.parent[b] = a,
            std::cmp::Ordering::Equal => {
                self.parent[b] = a;
                self.rank[a] += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, lat: f64, lon: f64) -> Node {
        Node { id, lat, lon }
    }

    /// A(0,0), B(0,1), C(0,2), with A-B and B-C of length 1, and A-C of length 5.
    fn abc_graph() -> Graph {
        let mut g = Graph::new();
        g.set_node(node(1, 0.0, 0.0)).unwrap();
        g.set_node(node(2, 0.0, 1.0)).unwrap();
        g.set_node(node(3, 0.0, 2.0)).unwrap();
        for (a, b, length) in [(1, 2, 1.0), (2, 3, 1.0), (1, 3, 5.0)] {
            g.set_edge(a, Edge { to: b, length }).unwrap();
            g.set_edge(b, Edge { to: a, length }).unwrap();
        }
        g
    }

    #[test]
    fn nodes_and_edges() {
        let g = abc_graph();
        assert_eq!(g.len(), 3);
        assert_eq!(g.edge_count(), 6);
        assert!(!g.is_empty());
        assert_eq!(g.get_node(2), Some(node(2, 0.0, 1.0)));
        assert_eq!(g.get_node(4), None);
        assert_eq!(g.get_edge(1, 3), 5.0);
        assert!(g.get_edge(1, 4).is_infinite());
        assert!(g.get_edges(4).is_empty());
        assert_eq!(g.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn set_edge_replaces_existing() {
        let mut g = abc_graph();
        g.set_edge(1, Edge { to: 3, length: 4.0 }).unwrap();
        assert_eq!(g.get_edge(1, 3), 4.0);
        assert_eq!(g.get_edges(1).len(), 2);
    }

    #[test]
    fn set_edge_rejects_invalid_edges() {
        let mut g = abc_graph();
        assert_eq!(
            g.set_edge(1, Edge { to: 9, length: 1.0 }),
            Err(GraphError::UnknownNode(9))
        );
        assert_eq!(
            g.set_edge(9, Edge { to: 1, length: 1.0 }),
            Err(GraphError::UnknownNode(9))
        );
        assert!(matches!(
            g.set_edge(1, Edge { to: 2, length: -1.0 }),
            Err(GraphError::InvalidLength { from: 1, to: 2, .. })
        ));
        assert!(matches!(
            g.set_edge(1, Edge { to: 2, length: f64::NAN }),
            Err(GraphError::InvalidLength { .. })
        ));
        assert_eq!(g.get_edge(1, 2), 1.0);
    }

    #[test]
    fn set_node_rejects_invalid_nodes() {
        let mut g = abc_graph();
        assert_eq!(g.set_node(node(0, 1.0, 1.0)), Err(GraphError::ZeroNodeId));
        assert_eq!(
            g.set_node(node(5, f64::NAN, 1.0)),
            Err(GraphError::InvalidCoordinates(5))
        );
        assert_eq!(
            g.set_node(node(5, 91.0, 1.0)),
            Err(GraphError::InvalidCoordinates(5))
        );
        assert_eq!(g.set_node(node(1, 0.0, 0.0)), Ok(()));
        assert_eq!(g.set_node(node(1, 0.5, 0.0)), Err(GraphError::NodeMoved(1)));
        assert_eq!(g.get_edges(1).len(), 2);
    }

    #[test]
    fn heuristic_scale() {
        let mut g = Graph::new();
        g.set_node(node(1, 0.0, 0.0)).unwrap();
        g.set_node(node(2, 0.0, 0.001)).unwrap();
        g.set_node(node(3, 0.0, 0.001)).unwrap();

        // Road longer than the straight line - scale stays at 1
        g.set_edge(1, Edge { to: 2, length: 200.0 }).unwrap();
        assert_eq!(g.heuristic_scale(), 1.0);

        // Coincident nodes don't affect the scale
        g.set_edge(2, Edge { to: 3, length: 0.0 }).unwrap();
        assert_eq!(g.heuristic_scale(), 1.0);

        // Road shorter than the straight line (~111.19 m)
        g.set_edge(2, Edge { to: 1, length: 55.0 }).unwrap();
        let span = earth_distance(0.0, 0.0, 0.0, 0.001) * METERS_PER_KILOMETER;
        assert!((g.heuristic_scale() - 55.0 / span).abs() < 1e-12);
    }

    #[test]
    fn path_length() {
        let g = abc_graph();
        assert_eq!(g.path_length(&[1, 2, 3]), Some(2.0));
        assert_eq!(g.path_length(&[1, 3]), Some(5.0));
        assert_eq!(g.path_length(&[2]), Some(0.0));
        assert_eq!(g.path_length(&[]), Some(0.0));
        assert_eq!(g.path_length(&[1, 2, 4]), None);
    }

    #[test]
    fn find_nearest_node() {
        let g = abc_graph();
        assert_eq!(g.find_nearest_node(0.1, 0.9).map(|n| n.id), Some(2));
        assert_eq!(g.find_nearest_node(0.0, 2.0).map(|n| n.id), Some(3));

        // Far outside of the graph
        assert_eq!(g.find_nearest_node(45.0, 120.0).map(|n| n.id), Some(3));
        assert_eq!(g.find_nearest_node(-60.0, -150.0).map(|n| n.id), Some(1));

        assert_eq!(Graph::new().find_nearest_node(0.0, 0.0), None);
    }

    #[test]
    fn find_nearest_node_tie() {
        let mut g = Graph::new();
        g.set_node(node(7, 0.0, -1.0)).unwrap();
        g.set_node(node(5, 0.0, 1.0)).unwrap();
        assert_eq!(g.find_nearest_node(0.0, 0.0).map(|n| n.id), Some(5));
    }

    #[test]
    fn retain_largest_component() {
        let mut g = abc_graph();
        g.set_node(node(10, 1.0, 1.0)).unwrap();
        g.set_node(node(11, 1.0, 1.001)).unwrap();
        g.set_edge(10, Edge { to: 11, length: 120.0 }).unwrap();
        g.set_node(node(20, 2.0, 2.0)).unwrap();

        assert_eq!(g.retain_largest_component(), 3);
        assert_eq!(g.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(g.edge_count(), 6);
    }

    #[test]
    fn retain_largest_component_one_way_edges_connect() {
        let mut g = Graph::new();
        for id in 1..=5 {
            g.set_node(node(id, 0.0, id as f64 * 0.001)).unwrap();
        }
        g.set_edge(4, Edge { to: 3, length: 200.0 }).unwrap();
        g.set_edge(5, Edge { to: 3, length: 300.0 }).unwrap();
        g.set_edge(1, Edge { to: 2, length: 200.0 }).unwrap();

        assert_eq!(g.retain_largest_component(), 2);
        assert_eq!(g.iter().map(|n| n.id).collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn retain_largest_component_tie() {
        let mut g = Graph::new();
        for id in 1..=4 {
            g.set_node(node(id, 0.0, id as f64 * 0.001)).unwrap();
        }
        g.set_edge(3, Edge { to: 4, length: 200.0 }).unwrap();
        g.set_edge(2, Edge { to: 1, length: 200.0 }).unwrap();

        assert_eq!(g.retain_largest_component(), 2);
        assert_eq!(g.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2]);

        assert_eq!(Graph::new().retain_largest_component(), 0);
    }
}
