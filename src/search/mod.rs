// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod best_first;
mod error;

pub use best_first::{astar, dijkstra};
pub use error::{SearchError, SearchLimits, DEFAULT_STEP_LIMIT};

use crate::Graph;

/// Shortest route between two nodes, as returned by [dijkstra] and [astar].
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Ids of consecutive nodes, from the start to the end node (inclusive).
    pub nodes: Vec<i64>,

    /// Total length of the route, in meters.
    pub length: f64,
}

/// Shortest-path algorithm used to answer a route request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Dijkstra,
    AStar,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dijkstra => write!(f, "dijkstra"),
            Self::AStar => write!(f, "astar"),
        }
    }
}

/// Finds the shortest route between two nodes with the selected [Algorithm].
pub fn find_route(
    g: &Graph,
    algorithm: Algorithm,
    from_id: i64,
    to_id: i64,
    limits: SearchLimits,
) -> Result<Route, SearchError> {
    match algorithm {
        Algorithm::Dijkstra => dijkstra(g, from_id, to_id, limits),
        Algorithm::AStar => astar(g, from_id, to_id, limits),
    }
}
