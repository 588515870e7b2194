use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::ops::Add;

use log::error;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::graph::{DirectedWeightedGraph, EdgeId, VertexId};

/// What the router needs from an edge weight: a zero (`Default`), accumulation and comparison.
pub trait PathWeight: Clone + Default + PartialOrd + Add<Output = Self> + Send + Sync {}

impl<T> PathWeight for T where T: Clone + Default + PartialOrd + Add<Output = T> + Send + Sync {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteInternalData<W> {
    pub weight: W,
    // Last edge on the best known path, None for the source itself.
    pub prev_edge: Option<EdgeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RouteInfo<W> {
    pub weight: W,
    pub edges: Vec<EdgeId>,
}

struct QueueEntry<W> {
    weight: W,
    vertex: VertexId,
}

// BinaryHeap is a max-heap, so the ordering on weights is flipped.
impl<W: PartialOrd> Ord for QueueEntry<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .partial_cmp(&self.weight)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.vertex.cmp(&other.vertex))
    }
}

impl<W: PartialOrd> PartialOrd for QueueEntry<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W: PartialOrd> PartialEq for QueueEntry<W> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<W: PartialOrd> Eq for QueueEntry<W> {}

/// All-pairs shortest path table, computed once from a graph with non-negative weights.
///
/// `routes_internal_data[from][to]` is None when `to` is unreachable from `from`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Router<W> {
    routes_internal_data: Vec<Vec<Option<RouteInternalData<W>>>>,
}

impl<W: PathWeight> Router<W> {
    pub fn new(graph: &DirectedWeightedGraph<W>) -> Self {
        // Every source is independent, each worker fills its own row.
        let routes_internal_data = (0..graph.vertex_count())
            .into_par_iter()
            .map(|source| Self::shortest_paths_from(graph, source))
            .collect();
        Self { routes_internal_data }
    }

    // Dijkstra from a single source.
    fn shortest_paths_from(graph: &DirectedWeightedGraph<W>, source: VertexId) -> Vec<Option<RouteInternalData<W>>> {
        let mut routes: Vec<Option<RouteInternalData<W>>> = vec![None; graph.vertex_count()];
        routes[source] = Some(RouteInternalData { weight: W::default(), prev_edge: None });

        let mut queue = BinaryHeap::new();
        queue.push(QueueEntry { weight: W::default(), vertex: source });

        while let Some(QueueEntry { weight, vertex }) = queue.pop() {
            // Skip entries superseded by a cheaper path.
            if routes[vertex].as_ref().is_some_and(|best| best.weight < weight) {
                continue;
            }

            for &edge_id in graph.get_incident_edges(vertex) {
                let edge = graph.get_edge(edge_id);
                let candidate = weight.clone() + edge.weight.clone();
                let improves = match &routes[edge.to] {
                    Some(best) => candidate < best.weight,
                    None => true,
                };
                if improves {
                    routes[edge.to] = Some(RouteInternalData { weight: candidate.clone(), prev_edge: Some(edge_id) });
                    queue.push(QueueEntry { weight: candidate, vertex: edge.to });
                }
            }
        }

        routes
    }

    /// Cheapest path from `from` to `to`, as the list of edges to follow. Among paths of equal
    /// weight any one may be returned. A vertex reaches itself with an empty path.
    pub fn build_route(&self, graph: &DirectedWeightedGraph<W>, from: VertexId, to: VertexId) -> Option<RouteInfo<W>> {
        let route = self.routes_internal_data.get(from)?.get(to)?.as_ref()?;
        let row = &self.routes_internal_data[from];

        // Reconstruct from parent pointers.
        let mut edges = Vec::new();
        let mut prev_edge = route.prev_edge;
        while let Some(edge_id) = prev_edge {
            if edges.len() >= graph.vertex_count() {
                error!("Loop in routing table while rebuilding route {from} -> {to}.");
                return None;
            }
            edges.push(edge_id);
            let edge_from = graph.get_edge(edge_id).from;
            prev_edge = row[edge_from].as_ref().and_then(|data| data.prev_edge);
        }
        edges.reverse();

        Some(RouteInfo { weight: route.weight.clone(), edges })
    }

    /// Best known weight from `from` to `to`, without rebuilding the path.
    pub fn get_route_weight(&self, from: VertexId, to: VertexId) -> Option<&W> {
        self.routes_internal_data.get(from)?.get(to)?.as_ref().map(|route| &route.weight)
    }

    pub fn vertex_count(&self) -> usize {
        self.routes_internal_data.len()
    }

    // Deserialized tables come from outside, so check them against the graph before use.
    pub(crate) fn is_consistent(&self, graph: &DirectedWeightedGraph<W>) -> bool {
        let vertex_count = graph.vertex_count();
        self.routes_internal_data.len() == vertex_count
            && self.routes_internal_data.iter().all(|row| {
                row.len() == vertex_count
                    && row.iter().enumerate().all(|(to, route)| match route.as_ref().and_then(|route| route.prev_edge) {
                        Some(edge_id) => edge_id < graph.edge_count() && graph.get_edge(edge_id).to == to,
                        None => true,
                    })
            })
    }
}
