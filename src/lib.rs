// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Shortest driving routes over [OpenStreetMap](https://www.openstreetmap.org/) data.
//!
//! A road network is converted into a weighted directed [Graph], where every edge
//! weighs its physical length in meters. Routes between arbitrary coordinates are
//! found by snapping both ends to the nearest [Node] and running either
//! [Dijkstra's algorithm](crate::dijkstra) or [A*](crate::astar), guided by the
//! great-circle distance to the destination.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! let g = roadroute::osm::load_graph(
//!     &roadroute::osm::Options::default(),
//!     "path/to/tampico.osm",
//! ).expect("failed to load tampico.osm");
//!
//! let service = roadroute::RouteService::new(Arc::new(g)).expect("empty graph");
//! let route = service
//!     .compute_route(&roadroute::RouteRequest {
//!         start_lat: 22.2553,
//!         start_lon: -97.8686,
//!         end_lat: 22.2331,
//!         end_lon: -97.8614,
//!         use_astar: true,
//!     })
//!     .expect("failed to find route");
//!
//! println!("Route: {:?}", route.route);
//! ```
//!
//! # Features
//!
//! - `server`: the axum-based `http` module,
//! - `cli`: the `roadroute` binary (implies `server`).
//!
//! The `http` module is always compiled for unit tests.

mod distance;
mod graph;
#[cfg(any(test, feature = "server"))]
pub mod http;
mod kd;
mod nearest;
pub mod osm;
mod search;
mod service;

pub use distance::{earth_distance, EARTH_RADIUS, METERS_PER_KILOMETER};
pub use graph::{Graph, GraphError};
pub use kd::KDTree;
pub use nearest::{nearest_node, NearestNode};
pub use search::{
    astar, dijkstra, find_route, Algorithm, Route, SearchError, SearchLimits, DEFAULT_STEP_LIMIT,
};
pub use service::{RouteError, RouteRequest, RouteResult, RouteService};

/// Represents an element of the [Graph] - an intersection or a waypoint
/// of the road network.
///
/// Nodes with `id == 0` are disallowed, as zero is used
/// to signify absence of nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

/// Represents an outgoing (one-way) road segment from a specific [Node].
///
/// `length` is expressed in meters and must be finite and non-negative.
/// The target node always exists in the [Graph].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: i64,
    pub length: f64,
}
