// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{find_route, nearest_node, Algorithm, Graph, KDTree, SearchError, SearchLimits};

/// Request for a route between two arbitrary positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,

    /// Use [A*](crate::astar) instead of [Dijkstra's algorithm](crate::dijkstra).
    /// Missing and `null` both mean `false`.
    #[serde(default, deserialize_with = "null_as_false")]
    pub use_astar: bool,
}

fn null_as_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(d)?.unwrap_or(false))
}

impl RouteRequest {
    /// Returns the [Algorithm] selected by this request.
    pub fn algorithm(&self) -> Algorithm {
        if self.use_astar {
            Algorithm::AStar
        } else {
            Algorithm::Dijkstra
        }
    }

    fn validate(&self) -> Result<(), RouteError> {
        check_coordinate("start_lat", self.start_lat, 90.0)?;
        check_coordinate("start_lon", self.start_lon, 180.0)?;
        check_coordinate("end_lat", self.end_lat, 90.0)?;
        check_coordinate("end_lon", self.end_lon, 180.0)?;
        Ok(())
    }
}

fn check_coordinate(field: &'static str, value: f64, limit: f64) -> Result<(), RouteError> {
    if value.is_finite() && value.abs() <= limit {
        Ok(())
    } else {
        Err(RouteError::InvalidCoordinate { field, value })
    }
}

/// Computed route, as `[latitude, longitude]` pairs of consecutive nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub route: Vec<[f64; 2]>,

    /// Total length of the route, in meters.
    pub distance: f64,

    pub algorithm: Algorithm,
}

/// Error conditions which may occur during [RouteService::compute_route].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// A coordinate of the request is not a finite number within its range.
    #[error("invalid coordinate {field}: {value}")]
    InvalidCoordinate { field: &'static str, value: f64 },

    /// There are no nodes to snap the request to.
    #[error("road network graph is empty")]
    EmptyGraph,

    /// The snapped start and end nodes are not connected.
    #[error("no route from node {from} to node {to}")]
    NoPath { from: i64, to: i64 },

    /// A node was missing from the graph.
    #[error("invalid node: {0}")]
    InvalidNode(i64),

    /// The search has run out of its step or time budget.
    #[error("route search aborted: {0}")]
    SearchAborted(SearchError),
}

impl From<SearchError> for RouteError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::InvalidReference(id) => Self::InvalidNode(id),
            SearchError::NoPath { from, to } => Self::NoPath { from, to },
            SearchError::StepLimitExceeded | SearchError::DeadlineExceeded => {
                Self::SearchAborted(e)
            }
        }
    }
}

/// Answers [RouteRequests](RouteRequest) over a single, immutable road network.
///
/// The graph and its spatial index are built once and shared;
/// cloning the service is cheap, and all methods take `&self`,
/// so it can serve concurrent requests without locking.
#[derive(Debug, Clone)]
pub struct RouteService {
    graph: Arc<Graph>,
    index: Arc<KDTree>,
    limits: SearchLimits,
    timeout: Option<Duration>,
}

impl RouteService {
    /// Creates a service over the provided graph, indexing its nodes
    /// for nearest-node lookups. Fails with [RouteError::EmptyGraph]
    /// if the graph has no nodes.
    pub fn new(graph: Arc<Graph>) -> Result<Self, RouteError> {
        let index = KDTree::from_graph(&graph).ok_or(RouteError::EmptyGraph)?;
        Ok(Self {
            graph,
            index: Arc::new(index),
            limits: SearchLimits::default(),
            timeout: None,
        })
    }

    /// Overrides the [SearchLimits] applied to every request.
    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets a wall-clock budget for every request, measured from the moment
    /// [RouteService::compute_route] is called.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the underlying road network.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Computes the shortest route between the positions of a [RouteRequest].
    ///
    /// Both positions are snapped to their nearest nodes, the selected algorithm
    /// is run between them, and the resulting nodes are projected back to positions.
    pub fn compute_route(&self, request: &RouteRequest) -> Result<RouteResult, RouteError> {
        request.validate()?;

        let limits = match self.timeout {
            Some(timeout) => SearchLimits {
                deadline: Some(Instant::now() + timeout),
                ..self.limits
            },
            None => self.limits,
        };

        let start = nearest_node(self.index.as_ref(), request.start_lat, request.start_lon)?;
        let end = nearest_node(self.index.as_ref(), request.end_lat, request.end_lon)?;
        let algorithm = request.algorithm();

        debug!("Routing from node {start} to node {end} with {algorithm}");
        let found = find_route(&self.graph, algorithm, start, end, limits)?;

        let route = found
            .nodes
            .iter()
            .map(|&id| {
                self.graph
                    .get_node(id)
                    .map(|n| [n.lat, n.lon])
                    .ok_or(RouteError::InvalidNode(id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Found route with {} nodes and {:.1} m from node {start} to node {end}",
            route.len(),
            found.length,
        );

        Ok(RouteResult {
            route,
            distance: found.length,
            algorithm,
        })
    }
}
