use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::catalogue::{Distance, StopIndex, TransportCatalogue};
use crate::geo::Coordinates;
use crate::graph::DirectedWeightedGraph;
use crate::render::{RenderError, RenderSettings};
use crate::router::Router;
use crate::transport_router::{RouteWeight, RoutingSettings, SettingsError, TransportRouter};

pub const FORMAT_VERSION: u32 = 2;

#[derive(thiserror::Error, Debug)]
pub enum SerializationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("Failed to decode snapshot: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("Snapshot format version {found} is not supported (expected {expected}).")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("Corrupted snapshot: {0}")]
    Corrupted(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Everything the build phase hands over to the serve phase.
pub struct Base {
    pub catalogue: TransportCatalogue,
    pub router: Option<TransportRouter>,
    pub render_settings: Option<RenderSettings>,
}

impl Base {
    pub fn new(catalogue: TransportCatalogue) -> Self {
        Self { catalogue, router: None, render_settings: None }
    }
}

#[derive(Serialize, Deserialize)]
struct StopRecord {
    name: String,
    coordinates: Coordinates,
    // Outgoing road distances, by stop id.
    road_distances: Vec<(StopIndex, Distance)>,
}

#[derive(Serialize, Deserialize)]
struct BusRecord {
    name: String,
    // Forward stops only, the catalogue doubles there-and-back routes again on load.
    stops: Vec<StopIndex>,
    is_round_trip: bool,
}

// Stop ids in a snapshot are positions in `stops`, which is also catalogue storage order.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    stops: Vec<StopRecord>,
    buses: Vec<BusRecord>,
    routing_settings: Option<RoutingSettings>,
    router_cache: Option<RouterCacheRef<'a>>,
    render_settings: Option<&'a RenderSettings>,
}

#[derive(Serialize)]
struct RouterCacheRef<'a> {
    graph: &'a DirectedWeightedGraph<RouteWeight>,
    router: &'a Router<RouteWeight>,
}

#[derive(Deserialize)]
struct Snapshot {
    stops: Vec<StopRecord>,
    buses: Vec<BusRecord>,
    routing_settings: Option<RoutingSettings>,
    router_cache: Option<RouterCache>,
    render_settings: Option<RenderSettings>,
}

#[derive(Deserialize)]
struct RouterCache {
    graph: DirectedWeightedGraph<RouteWeight>,
    router: Router<RouteWeight>,
}

/// Id to name table used while decoding.
struct StopNames<'a> {
    names: Vec<&'a str>,
}

impl<'a> StopNames<'a> {
    fn new(stops: &'a [StopRecord]) -> Self {
        Self { names: stops.iter().map(|stop| stop.name.as_str()).collect() }
    }

    fn get(&self, stop_id: StopIndex) -> Result<&'a str, SerializationError> {
        self.names
            .get(stop_id as usize)
            .copied()
            .ok_or_else(|| SerializationError::Corrupted(format!("stop id {stop_id} out of range")))
    }
}

/// Writes the catalogue, the render settings, and the routing settings when a router is
/// given. With `include_router_cache` the precomputed graph and routing table are stored too,
/// so that loading does not have to recompute them. Returns the number of bytes written.
pub fn serialize<W: Write>(writer: &mut W, base: &Base, include_router_cache: bool) -> Result<usize, SerializationError> {
    let catalogue = &base.catalogue;
    let router = base.router.as_ref();
    let mut stops: Vec<StopRecord> = catalogue
        .stops()
        .iter()
        .map(|stop| StopRecord {
            name: stop.name.to_string(),
            coordinates: stop.coordinates,
            road_distances: Vec::new(),
        })
        .collect();
    for (from, to, meters) in catalogue.distances() {
        stops[from as usize].road_distances.push((to, meters));
    }

    let buses = catalogue
        .buses()
        .iter()
        .map(|bus| BusRecord {
            name: bus.name.to_string(),
            stops: bus.forward_stops().to_vec(),
            is_round_trip: bus.is_round_trip,
        })
        .collect();

    let snapshot = SnapshotRef {
        stops,
        buses,
        routing_settings: router.map(|router| *router.get_settings()),
        router_cache: router.filter(|_| include_router_cache).map(|router| RouterCacheRef {
            graph: router.get_graph(),
            router: router.get_router(),
        }),
        render_settings: base.render_settings.as_ref(),
    };

    let config = bincode::config::standard();
    let mut num_bytes = bincode::serde::encode_into_std_write(FORMAT_VERSION, &mut *writer, config)?;
    num_bytes += bincode::serde::encode_into_std_write(&snapshot, &mut *writer, config)?;
    Ok(num_bytes)
}

/// Rebuilds a catalogue, and its router if routing settings were stored.
pub fn deserialize<R: Read>(reader: &mut R) -> Result<Base, SerializationError> {
    let config = bincode::config::standard();
    let version: u32 = bincode::serde::decode_from_std_read(&mut *reader, config)?;
    if version != FORMAT_VERSION {
        return Err(SerializationError::VersionMismatch { found: version, expected: FORMAT_VERSION });
    }
    let snapshot: Snapshot = bincode::serde::decode_from_std_read(&mut *reader, config)?;

    let stop_names = StopNames::new(&snapshot.stops);
    let catalogue = restore_catalogue(&snapshot, &stop_names)?;

    let router = match (snapshot.routing_settings, snapshot.router_cache) {
        (Some(settings), Some(cache)) => {
            settings.validate()?;
            if cache.graph.vertex_count() != catalogue.num_stops()
                || !cache.graph.is_consistent()
                || !cache.router.is_consistent(&cache.graph)
                || cache.graph.get_edges().iter().any(|edge| edge.weight.bus as usize >= catalogue.num_buses())
            {
                return Err(SerializationError::Corrupted("cached graph does not match the catalogue".to_owned()));
            }
            Some(TransportRouter::from_parts(&catalogue, settings, cache.graph, cache.router))
        }
        (Some(settings), None) => Some(TransportRouter::new(&catalogue, settings)?),
        (None, Some(_)) => {
            return Err(SerializationError::Corrupted("router cache without routing settings".to_owned()));
        }
        (None, None) => None,
    };

    if let Some(render_settings) = &snapshot.render_settings {
        render_settings.validate()?;
    }

    Ok(Base { catalogue, router, render_settings: snapshot.render_settings })
}

fn restore_catalogue(snapshot: &Snapshot, stop_names: &StopNames) -> Result<TransportCatalogue, SerializationError> {
    let mut catalogue = TransportCatalogue::new();

    for (stop_id, stop) in snapshot.stops.iter().enumerate() {
        if catalogue.add_stop(&stop.name, stop.coordinates) as usize != stop_id {
            return Err(SerializationError::Corrupted(format!("duplicate stop {:?}", stop.name)));
        }
    }

    for (from, stop) in snapshot.stops.iter().enumerate() {
        for &(to, meters) in stop.road_distances.iter() {
            stop_names.get(to)?;
            catalogue.add_distance_by_idx(from as StopIndex, to, meters);
        }
    }

    for bus in snapshot.buses.iter() {
        let stops = bus.stops.iter().map(|&stop_id| stop_names.get(stop_id)).collect::<Result<Vec<_>, _>>()?;
        catalogue
            .add_bus(&bus.name, &stops, bus.is_round_trip)
            .map_err(|err| SerializationError::Corrupted(err.to_string()))?;
    }

    Ok(catalogue)
}

/// Writes a snapshot next to `path` and moves it into place once complete.
pub fn save_to_file(path: &Path, base: &Base, include_router_cache: bool) -> Result<(), SerializationError> {
    let temp_path = path.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&temp_path)?);
    let num_bytes = serialize(&mut writer, base, include_router_cache)?;
    writer.flush()?;
    drop(writer);
    std::fs::rename(&temp_path, path)?;
    info!("Wrote {} bytes to {}.", num_bytes, path.display());
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<Base, SerializationError> {
    let mut reader = BufReader::new(File::open(path)?);
    let base = deserialize(&mut reader)?;
    info!(
        "Loaded {} stops and {} buses from {}.",
        base.catalogue.num_stops(),
        base.catalogue.num_buses(),
        path.display()
    );
    Ok(base)
}
