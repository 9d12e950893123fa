// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{Graph, KDTree, Node, RouteError};

/// Objects which can find the [Node] closest to an arbitrary position.
///
/// Both implementations measure [great-circle distance](crate::earth_distance)
/// and break ties towards the smallest node id, so they always agree.
pub trait NearestNode {
    /// Finds the closest [Node] to the given position,
    /// returning `None` only if there are no nodes at all.
    fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<Node>;
}

impl NearestNode for Graph {
    fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<Node> {
        Graph::find_nearest_node(self, lat, lon)
    }
}

impl NearestNode for KDTree {
    fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<Node> {
        Some(KDTree::find_nearest_node(self, lat, lon))
    }
}

impl<T: NearestNode> NearestNode for Option<T> {
    fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<Node> {
        self.as_ref().and_then(|index| index.find_nearest_node(lat, lon))
    }
}

/// Resolves a position to the id of the closest node.
///
/// The position doesn't need to lie within the network - a node is returned
/// as long as there is at least one. Fails with [RouteError::EmptyGraph] otherwise.
pub fn nearest_node<I: NearestNode + ?Sized>(
    index: &I,
    lat: f64,
    lon: f64,
) -> Result<i64, RouteError> {
    index
        .find_nearest_node(lat, lon)
        .map(|n| n.id)
        .ok_or(RouteError::EmptyGraph)
}
