pub mod geo;

pub mod catalogue;

pub use catalogue::{Bus, BusInfo, CatalogueError, Stop, StopInfo, TransportCatalogue};

pub mod graph;

pub use graph::{DirectedWeightedGraph, Edge};

pub mod router;

pub use router::{RouteInfo, Router};

pub mod transport_router;

pub use transport_router::{RouteWeight, RoutingSettings, SettingsError, TransportRouter};

pub mod journey;

pub use journey::{Journey, Leg};

pub mod svg;

pub mod render;

pub use render::{MapRenderer, RenderSettings};

pub mod serialization;

pub mod requests;

pub mod utils;
