// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::time::Instant;

/// Recommended number of allowed node expansions in [dijkstra](crate::dijkstra) and
/// [astar](crate::astar) before [SearchError::StepLimitExceeded] is returned.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Bounds on the amount of work a single route search may perform.
///
/// Concluding that no route exists requires expanding all nodes reachable
/// from the start, which can be very time-consuming on large networks.
/// Both limits protect against resource exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum number of node expansions.
    pub step_limit: usize,

    /// Point in time after which the search is abandoned.
    pub deadline: Option<Instant>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            deadline: None,
        }
    }
}

/// Error conditions which may occur during [dijkstra](crate::dijkstra)
/// or [astar](crate::astar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The start or end nodes don't exist in a graph.
    #[error("invalid node: {0}")]
    InvalidReference(i64),

    /// The end node is not reachable from the start node.
    #[error("no path from node {from} to node {to}")]
    NoPath { from: i64, to: i64 },

    /// Route search has exceeded its limit of steps.
    /// Either the nodes are really far apart, or no route exists.
    #[error("step limit exceeded")]
    StepLimitExceeded,

    /// Route search has exceeded its deadline.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}
