use serde::{Deserialize, Serialize};

pub type VertexId = usize;
pub type EdgeId = usize;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge<W> {
    pub from: VertexId,
    pub to: VertexId,
    pub weight: W,
}

/// Directed multigraph over dense vertex ids. Edges are only ever appended, and each vertex
/// keeps the ids of its outgoing edges in insertion order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectedWeightedGraph<W> {
    edges: Vec<Edge<W>>,
    incidence_lists: Vec<Vec<EdgeId>>,
}

impl<W> DirectedWeightedGraph<W> {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            edges: Vec::new(),
            incidence_lists: vec![Vec::new(); vertex_count],
        }
    }

    pub fn add_edge(&mut self, edge: Edge<W>) -> EdgeId {
        assert!(
            edge.from < self.incidence_lists.len() && edge.to < self.incidence_lists.len(),
            "Edge {} -> {} is outside of a graph with {} vertices.",
            edge.from,
            edge.to,
            self.incidence_lists.len()
        );
        let edge_id = self.edges.len();
        self.incidence_lists[edge.from].push(edge_id);
        self.edges.push(edge);
        edge_id
    }

    pub fn vertex_count(&self) -> usize {
        self.incidence_lists.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn get_edge(&self, edge_id: EdgeId) -> &Edge<W> {
        &self.edges[edge_id]
    }

    pub fn get_edges(&self) -> &[Edge<W>] {
        &self.edges
    }

    pub fn get_incident_edges(&self, vertex: VertexId) -> &[EdgeId] {
        &self.incidence_lists[vertex]
    }

    // Deserialized graphs come from outside, so check their ids before using them.
    pub(crate) fn is_consistent(&self) -> bool {
        let vertex_count = self.vertex_count();
        self.edges.iter().all(|edge| edge.from < vertex_count && edge.to < vertex_count)
            && self.incidence_lists.iter().enumerate().all(|(vertex, list)| {
                list.iter().all(|&edge_id| self.edges.get(edge_id).is_some_and(|edge| edge.from == vertex))
            })
    }
}
