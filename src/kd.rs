// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::distance::{meridian_distance, parallel_distance};
use crate::{earth_distance, Graph, Node};

const AXIS_SLACK: f64 = 1.0 + 1e-9;

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree),
/// which is used to speed up nearest-neighbor search for large graphs. A linear scan
/// with [Graph::find_nearest_node] quickly becomes the most expensive part of
/// answering a route request, a k-d tree trades memory usage for CPU time.
///
/// Nodes are split alternately by latitude and longitude. A branch is skipped only if
/// the great-circle distance to its splitting parallel or meridian is larger than
/// the best candidate, so results match [Graph::find_nearest_node] (including
/// tie-breaking towards the smallest node id), as long as the data does not
/// straddle the antimeridian (180°/-180° longitude).
#[derive(Debug, Clone)]
pub struct KDTree {
    pivot: Node,
    left: Option<Box<KDTree>>,
    right: Option<Box<KDTree>>,
}

impl KDTree {
    /// Finds the closest [Node] to the given position.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Node {
        self.find_nearest_node_impl(lat, lon, false).0
    }

    fn find_nearest_node_impl(&self, lat: f64, lon: f64, lon_divides: bool) -> (Node, f64) {
        // Start by assuming that pivot is the closest
        let mut best = self.pivot;
        let mut best_dist = earth_distance(lat, lon, best.lat, best.lon);

        // Select which branch to recurse into first
        let first_left = if lon_divides {
            lon < best.lon
        } else {
            lat < best.lat
        };
        let (first, second) = if first_left {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        // Recurse into the first branch
        if let Some(ref branch) = first {
            let (alt, alt_dist) = branch.find_nearest_node_impl(lat, lon, !lon_divides);
            if is_better(alt, alt_dist, best, best_dist) {
                best = alt;
                best_dist = alt_dist;
            }
        }

        // (Optionally) recurse into the second branch
        if let Some(ref branch) = second {
            // A closer (or equally close) node is possible in the second branch if and only if
            // the splitting axis is not further away than the current best candidate.
            // The axis bounds and haversine may round differently for equal distances,
            // hence the relative slack - otherwise a tied node with a smaller id could be skipped.
            let dist_to_axis = if lon_divides {
                meridian_distance(lat, lon, self.pivot.lon)
            } else {
                parallel_distance(lat, self.pivot.lat)
            };

            if dist_to_axis <= best_dist * AXIS_SLACK {
                let (alt, alt_dist) = branch.find_nearest_node_impl(lat, lon, !lon_divides);
                if is_better(alt, alt_dist, best, best_dist) {
                    best = alt;
                    best_dist = alt_dist;
                }
            }
        }

        (best, best_dist)
    }

    /// Builds a k-d tree over all nodes of a [Graph].
    /// Returns `None` if the graph is empty.
    pub fn from_graph(g: &Graph) -> Option<Self> {
        Self::from_iter(g.iter().cloned())
    }

    /// Builds a k-d tree from an iterable of [Nodes](Node).
    pub fn from_iter<I: IntoIterator<Item = Node>>(nodes: I) -> Option<Self> {
        let mut nodes = nodes.into_iter().collect::<Vec<_>>();
        Self::build(nodes.as_mut_slice())
    }

    /// Builds a k-d tree from a mutable slice of [Nodes](Node). Nodes will be reordered
    /// in the slice to facilitate building the tree.
    pub fn build(nodes: &mut [Node]) -> Option<Self> {
        Self::build_impl(nodes, false)
    }

    fn build_impl(nodes: &mut [Node], lon_divides: bool) -> Option<Self> {
        match nodes.len() {
            0 => None,
            1 => Some(Self {
                pivot: nodes[0],
                left: None,
                right: None,
            }),
            _ => {
                if lon_divides {
                    nodes.sort_by(|a, b| a.lon.total_cmp(&b.lon));
                } else {
                    nodes.sort_by(|a, b| a.lat.total_cmp(&b.lat));
                }
                let median = nodes.len() / 2;
                let pivot = nodes[median];
                let (left, right_and_pivot) = nodes.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Self {
                    pivot,
                    left: Self::build_impl(left, !lon_divides).map(Box::new),
                    right: Self::build_impl(right, !lon_divides).map(Box::new),
                })
            }
        }
    }
}

#[inline]
fn is_better(candidate: Node, candidate_dist: f64, best: Node, best_dist: f64) -> bool {
    candidate_dist < best_dist || (candidate_dist == best_dist && candidate.id < best.id)
}
