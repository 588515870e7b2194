use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Add;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::catalogue::{BusIndex, StopIndex, TransportCatalogue};
use crate::graph::{DirectedWeightedGraph, Edge, VertexId};
use crate::journey::{Journey, Leg};
use crate::router::Router;

/// Both settings must lie in (0, MAX_SETTING].
pub const MAX_SETTING: f64 = 1000.0;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("Bus wait time {0} is outside of (0, 1000] minutes.")]
    WaitTimeOutOfRange(f64),
    #[error("Bus velocity {0} is outside of (0, 1000] km/h.")]
    VelocityOutOfRange(f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutingSettings {
    /// Minutes spent waiting at every boarding.
    pub bus_wait_time: f64,
    /// km/h
    pub bus_velocity: f64,
}

impl RoutingSettings {
    pub fn new(bus_wait_time: f64, bus_velocity: f64) -> Result<Self, SettingsError> {
        let settings = Self { bus_wait_time, bus_velocity };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let in_range = |value: f64| value > 0.0 && value <= MAX_SETTING;
        if !in_range(self.bus_wait_time) {
            return Err(SettingsError::WaitTimeOutOfRange(self.bus_wait_time));
        }
        if !in_range(self.bus_velocity) {
            return Err(SettingsError::VelocityOutOfRange(self.bus_velocity));
        }
        Ok(())
    }

    /// Minutes needed to ride `meters` at the bus velocity.
    pub fn travel_time(&self, meters: f64) -> f64 {
        (meters / 1000.0) / self.bus_velocity * 60.0
    }
}

/// Weight of a single-bus ride. Only `total_time` takes part in addition and comparison,
/// `bus` and `span_count` describe the edge itself.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RouteWeight {
    pub bus: BusIndex,
    /// Wait plus travel, in minutes.
    pub total_time: f64,
    pub span_count: u32,
}

impl Add for RouteWeight {
    type Output = RouteWeight;

    fn add(self, other: RouteWeight) -> RouteWeight {
        RouteWeight {
            total_time: self.total_time + other.total_time,
            ..RouteWeight::default()
        }
    }
}

impl PartialEq for RouteWeight {
    fn eq(&self, other: &Self) -> bool {
        self.total_time == other.total_time
    }
}

impl PartialOrd for RouteWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.total_time.partial_cmp(&other.total_time)
    }
}

/// Route queries by stop name over a graph built once from a catalogue.
///
/// Vertex ids are the catalogue's stop indices, so stop `i` in storage order is vertex `i`.
pub struct TransportRouter {
    settings: RoutingSettings,
    stop_names: Vec<Arc<str>>,
    stop_ids: HashMap<Arc<str>, VertexId>,
    bus_names: Vec<Arc<str>>,
    graph: DirectedWeightedGraph<RouteWeight>,
    router: Router<RouteWeight>,
}

impl TransportRouter {
    pub fn new(catalogue: &TransportCatalogue, settings: RoutingSettings) -> Result<Self, SettingsError> {
        settings.validate()?;

        let graph = Self::build_graph(catalogue, &settings);
        info!("Built routing graph with {} vertices and {} edges.", graph.vertex_count(), graph.edge_count());

        let start = Instant::now();
        let router = Router::new(&graph);
        info!("Precomputed routing table in {:?}.", start.elapsed());

        Ok(Self::from_parts(catalogue, settings, graph, router))
    }

    // The caller guarantees that `graph` and `router` were built from `catalogue`.
    pub(crate) fn from_parts(
        catalogue: &TransportCatalogue,
        settings: RoutingSettings,
        graph: DirectedWeightedGraph<RouteWeight>,
        router: Router<RouteWeight>,
    ) -> Self {
        let stop_names: Vec<Arc<str>> = catalogue.stops().iter().map(|stop| stop.name.clone()).collect();
        let stop_ids = stop_names.iter().enumerate().map(|(vertex, name)| (name.clone(), vertex)).collect();
        let bus_names = catalogue.buses().iter().map(|bus| bus.name.clone()).collect();
        Self { settings, stop_names, stop_ids, bus_names, graph, router }
    }

    /// One edge per ordered pair of positions on every bus route, so that a ride without
    /// changing buses is always a single edge.
    pub fn build_graph(catalogue: &TransportCatalogue, settings: &RoutingSettings) -> DirectedWeightedGraph<RouteWeight> {
        let mut graph = DirectedWeightedGraph::new(catalogue.num_stops());
        for (bus_idx, bus) in catalogue.buses().iter().enumerate() {
            // There-and-back routes are already stored doubled, and a doubled route reads the
            // same backwards, so one pass covers both directions.
            let num_edges = Self::add_bus_edges(&mut graph, catalogue, settings, bus_idx as BusIndex, &bus.stops);
            debug!("Bus {}: {} edges over {} stops.", bus.name, num_edges, bus.stops.len());
        }
        graph
    }

    fn add_bus_edges(
        graph: &mut DirectedWeightedGraph<RouteWeight>,
        catalogue: &TransportCatalogue,
        settings: &RoutingSettings,
        bus: BusIndex,
        stops: &[StopIndex],
    ) -> usize {
        let mut num_edges = 0;
        for i in 0..stops.len() {
            let mut total_time = settings.bus_wait_time;
            for j in (i + 1)..stops.len() {
                total_time += settings.travel_time(catalogue.get_stops_distance(stops[j - 1], stops[j]));
                graph.add_edge(Edge {
                    from: stops[i] as VertexId,
                    to: stops[j] as VertexId,
                    weight: RouteWeight { bus, total_time, span_count: (j - i) as u32 },
                });
                num_edges += 1;
            }
        }
        num_edges
    }

    /// Fastest journey between two stops, None if either stop is unknown or unreachable.
    pub fn build_route(&self, from: &str, to: &str) -> Option<Journey> {
        let from = *self.stop_ids.get(from)?;
        let to = *self.stop_ids.get(to)?;
        if from == to {
            return Some(Journey::empty());
        }
        let route = self.router.build_route(&self.graph, from, to)?;

        let mut legs = Vec::with_capacity(route.edges.len() * 2);
        for &edge_id in route.edges.iter() {
            let edge = self.graph.get_edge(edge_id);
            legs.push(Leg::Wait {
                stop_name: self.stop_names[edge.from].clone(),
                time: self.settings.bus_wait_time,
            });
            legs.push(Leg::Ride {
                bus: self.bus_names[edge.weight.bus as usize].clone(),
                span_count: edge.weight.span_count,
                time: edge.weight.total_time - self.settings.bus_wait_time,
            });
        }

        Some(Journey::from(legs, route.weight.total_time))
    }

    pub fn get_settings(&self) -> &RoutingSettings {
        &self.settings
    }

    pub fn get_graph(&self) -> &DirectedWeightedGraph<RouteWeight> {
        &self.graph
    }

    pub fn get_router(&self) -> &Router<RouteWeight> {
        &self.router
    }

    pub fn get_stop_name(&self, vertex: VertexId) -> Option<&str> {
        self.stop_names.get(vertex).map(|name| name.as_ref())
    }

    pub fn get_stop_vertex(&self, name: &str) -> Option<VertexId> {
        self.stop_ids.get(name).copied()
    }
}
