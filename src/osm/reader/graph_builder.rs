// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use log::{debug, warn};

use crate::{earth_distance, Edge, Graph, GraphError, Node, METERS_PER_KILOMETER};

use super::{model, FeatureReader, Options};

/// Helper object used for storing state related to converting [OSM features](super::model::Feature)
/// into a [Graph].
///
/// Nodes are only added to the graph once a routable way references them,
/// so that the graph contains road nodes exclusively.
pub(super) struct GraphBuilder<'a> {
    g: &'a mut Graph,
    options: &'a Options<'a>,
    pending_nodes: HashMap<i64, Node>,
    ignore_bbox: bool,
}

impl<'a> GraphBuilder<'a> {
    /// Create a new, empty graph builder.
    pub(super) fn new(g: &'a mut Graph, options: &'a Options<'a>) -> Self {
        let ignore_bbox =
            options.bbox.iter().all(|&x| x == 0.0) || options.bbox.iter().any(|x| !x.is_finite());

        if !ignore_bbox {
            let [min_lon, min_lat, max_lon, max_lat] = options.bbox;
            if min_lon > max_lon || min_lat > max_lat {
                warn!("Bounding box {:?} is empty - no nodes will be loaded", options.bbox);
            }
        }

        Self {
            g,
            options,
            pending_nodes: HashMap::default(),
            ignore_bbox,
        }
    }

    /// Add all features from the provided [FeatureReader].
    pub(super) fn add_features<F: FeatureReader>(
        &mut self,
        mut features: F,
    ) -> Result<(), F::Error> {
        while let Some(f) = features.next_feature()? {
            self.add_feature(f);
        }
        Ok(())
    }

    fn add_feature(&mut self, f: model::Feature) {
        match f {
            model::Feature::Node(n) => self.add_node(n),
            model::Feature::Way(w) => self.add_way(w),
        }
    }

    fn add_node(&mut self, n: Node) {
        if !Self::is_valid_node(&n) {
            debug!("Skipping node {} with invalid position ({}, {})", n.id, n.lat, n.lon);
        } else if self.is_in_bbox(n.lat, n.lon) {
            self.pending_nodes.insert(n.id, n);
        }
    }

    fn is_valid_node(n: &Node) -> bool {
        n.id != 0 && n.lat.abs() <= 90.0 && n.lon.abs() <= 180.0
    }

    fn is_in_bbox(&self, lat: f64, lon: f64) -> bool {
        if self.ignore_bbox {
            return true;
        }
        let [min_lon, min_lat, max_lon, max_lat] = self.options.bbox;
        lat >= min_lat && lat <= max_lat && lon >= min_lon && lon <= max_lon
    }

    fn add_way(&mut self, w: model::Way) {
        if !self.options.profile.is_routable(&w.tags) {
            return;
        }

        let nodes = Self::get_way_nodes(&w);
        if !nodes.windows(2).any(|pair| self.is_known_segment(pair)) {
            debug!("Skipping way {} - no segments between known nodes", w.id);
            return;
        }

        let (forward, backward) = self.options.profile.way_direction(&w.tags);
        if !forward && !backward {
            return;
        }

        self.create_edges(w.id, &nodes, forward, backward);
    }

    /// Returns nodes of the way without consecutive duplicates.
    fn get_way_nodes(w: &model::Way) -> Vec<i64> {
        let mut nodes = w.nodes.clone();
        nodes.dedup();
        nodes
    }

    /// Checks if both nodes of a segment were loaded (valid and within the bounding box).
    /// Segments with unknown nodes are skipped, splitting the way.
    fn is_known_segment(&self, pair: &[i64]) -> bool {
        pair.iter().all(|id| self.pending_nodes.contains_key(id))
    }

    fn create_edges(&mut self, way_id: i64, nodes: &[i64], forward: bool, backward: bool) {
        debug_assert!(forward || backward);

        for pair in nodes.windows(2) {
            let (Some(&left), Some(&right)) =
                (self.pending_nodes.get(&pair[0]), self.pending_nodes.get(&pair[1]))
            else {
                continue;
            };

            let length =
                earth_distance(left.lat, left.lon, right.lat, right.lon) * METERS_PER_KILOMETER;

            if let Err(e) = self.add_segment(left, right, length, forward, backward) {
                warn!("Skipping segment {} - {} of way {way_id}: {e}", left.id, right.id);
            }
        }
    }

    fn add_segment(
        &mut self,
        left: Node,
        right: Node,
        length: f64,
        forward: bool,
        backward: bool,
    ) -> Result<(), GraphError> {
        self.g.set_node(left)?;
        self.g.set_node(right)?;
        if forward {
            self.g.set_edge(left.id, Edge { to: right.id, length })?;
        }
        if backward {
            self.g.set_edge(right.id, Edge { to: left.id, length })?;
        }
        Ok(())
    }
}
