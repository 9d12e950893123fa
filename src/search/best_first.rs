// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

use super::{Route, SearchError, SearchLimits};
use crate::{earth_distance, Edge, Graph, Node, METERS_PER_KILOMETER};

/// How often (in node expansions) the deadline is checked.
const DEADLINE_CHECK_INTERVAL: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    at: i64,
    cost: f64,
    score: f64,
    seq: u64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // NOTE: We revert the order of comparison,
        // as lower scores (and earlier pushes) are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

fn reconstruct_path(came_from: &HashMap<i64, i64>, mut last: i64) -> Vec<i64> {
    let mut path = vec![last];

    while let Some(&nd) = came_from.get(&last) {
        path.push(nd);
        last = nd;
    }

    path.reverse();
    path
}

/// Uses [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
/// to find the shortest route between two nodes in the provided graph.
///
/// The search stops as soon as the end node is settled. Among multiple
/// shortest routes, the one discovered first is returned, so results are reproducible.
pub fn dijkstra(
    g: &Graph,
    from_id: i64,
    to_id: i64,
    limits: SearchLimits,
) -> Result<Route, SearchError> {
    search(g, from_id, to_id, limits, |_| 0.0)
}

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find the shortest route between two nodes in the provided graph.
///
/// The heuristic is the great-circle distance to the end node, converted to meters and
/// multiplied by [Graph::heuristic_scale]. It never overestimates the remaining
/// road distance, thus the returned route is as short as the one from [dijkstra].
pub fn astar(
    g: &Graph,
    from_id: i64,
    to_id: i64,
    limits: SearchLimits,
) -> Result<Route, SearchError> {
    let to_node = g
        .get_node(to_id)
        .ok_or(SearchError::InvalidReference(to_id))?;
    let scale = g.heuristic_scale() * METERS_PER_KILOMETER;

    search(g, from_id, to_id, limits, |n: &Node| {
        scale * earth_distance(n.lat, n.lon, to_node.lat, to_node.lon)
    })
}

fn search<H: Fn(&Node) -> f64>(
    g: &Graph,
    from_id: i64,
    to_id: i64,
    limits: SearchLimits,
    heuristic: H,
) -> Result<Route, SearchError> {
    let from_node = g
        .get_node(from_id)
        .ok_or(SearchError::InvalidReference(from_id))?;
    if g.get_node(to_id).is_none() {
        return Err(SearchError::InvalidReference(to_id));
    }

    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::default();
    let mut came_from: HashMap<i64, i64> = HashMap::default();
    let mut known_costs: HashMap<i64, f64> = HashMap::default();
    let mut steps: usize = 0;
    let mut seq: u64 = 0;

    queue.push(QueueItem {
        at: from_id,
        cost: 0.0,
        score: heuristic(&from_node),
        seq,
    });
    known_costs.insert(from_id, 0.0);

    while let Some(item) = queue.pop() {
        if item.at == to_id {
            return Ok(Route {
                nodes: reconstruct_path(&came_from, to_id),
                length: item.cost,
            });
        }

        // Contrary to the textbook definition, we might keep multiple items in the queue for the same node.
        if item.cost > known_costs.get(&item.at).cloned().unwrap_or(f64::INFINITY) {
            continue;
        }

        steps += 1;
        if steps > limits.step_limit {
            return Err(SearchError::StepLimitExceeded);
        }
        if steps % DEADLINE_CHECK_INTERVAL == 0 {
            if let Some(deadline) = limits.deadline {
                if Instant::now() >= deadline {
                    return Err(SearchError::DeadlineExceeded);
                }
            }
        }

        for &Edge {
            to: neighbor_id,
            length,
        } in g.get_edges(item.at)
        {
            let Some(neighbor) = g.get_node(neighbor_id) else {
                continue;
            };

            // Only strictly cheaper paths replace the known one
            let neighbor_cost = item.cost + length;
            if neighbor_cost
                >= known_costs
                    .get(&neighbor_id)
                    .cloned()
                    .unwrap_or(f64::INFINITY)
            {
                continue;
            }

            came_from.insert(neighbor_id, item.at);
            known_costs.insert(neighbor_id, neighbor_cost);
            seq += 1;
            queue.push(QueueItem {
                at: neighbor_id,
                cost: neighbor_cost,
                score: neighbor_cost + heuristic(&neighbor),
                seq,
            });
        }
    }

    Err(SearchError::NoPath {
        from: from_id,
        to: to_id,
    })
}
