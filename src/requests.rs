use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::PathBuf;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::catalogue::{CatalogueError, Distance, TransportCatalogue};
use crate::geo::Coordinates;
use crate::journey::Leg;
use crate::render::{MapRenderer, RenderError, RenderSettings};
use crate::serialization::{self, Base, SerializationError};
use crate::svg::{Color, Point};
use crate::transport_router::{RoutingSettings, SettingsError, TransportRouter};

pub const NOT_FOUND: &str = "not found";

#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Document has no {0:?} section.")]
    MissingSection(&'static str),
}

#[derive(Debug, Default, Deserialize)]
pub struct InputDocument {
    #[serde(default)]
    pub base_requests: Vec<BaseRequest>,
    #[serde(default)]
    pub stat_requests: Vec<StatRequest>,
    pub routing_settings: Option<RoutingSettings>,
    pub render_settings: Option<RenderSettingsRequest>,
    pub serialization_settings: Option<SerializationSettings>,
}

#[derive(Debug, Deserialize)]
pub struct SerializationSettings {
    pub file: PathBuf,
}

/// `render_settings` as written in the input document. Offsets are `[dx, dy]` pairs, colors
/// are either a name or an `[r, g, b]` / `[r, g, b, opacity]` array.
#[derive(Clone, Debug, Deserialize)]
pub struct RenderSettingsRequest {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub line_width: f64,
    pub stop_radius: f64,
    pub bus_label_font_size: u32,
    pub bus_label_offset: [f64; 2],
    pub stop_label_font_size: u32,
    pub stop_label_offset: [f64; 2],
    pub underlayer_color: ColorRequest,
    pub underlayer_width: f64,
    pub color_palette: Vec<ColorRequest>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ColorRequest {
    Named(String),
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, f64),
}

impl From<&ColorRequest> for Color {
    fn from(color: &ColorRequest) -> Self {
        match color {
            ColorRequest::Named(name) => Color::Named(name.clone()),
            &ColorRequest::Rgb(red, green, blue) => Color::rgb(red, green, blue),
            &ColorRequest::Rgba(red, green, blue, opacity) => Color::rgba(red, green, blue, opacity),
        }
    }
}

impl RenderSettingsRequest {
    pub fn to_settings(&self) -> Result<RenderSettings, RenderError> {
        let [bus_dx, bus_dy] = self.bus_label_offset;
        let [stop_dx, stop_dy] = self.stop_label_offset;
        let settings = RenderSettings {
            width: self.width,
            height: self.height,
            padding: self.padding,
            line_width: self.line_width,
            stop_radius: self.stop_radius,
            bus_label_font_size: self.bus_label_font_size,
            bus_label_offset: Point::new(bus_dx, bus_dy),
            stop_label_font_size: self.stop_label_font_size,
            stop_label_offset: Point::new(stop_dx, stop_dy),
            underlayer_color: Color::from(&self.underlayer_color),
            underlayer_width: self.underlayer_width,
            color_palette: self.color_palette.iter().map(Color::from).collect(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BaseRequest {
    Stop(StopRequest),
    Bus(BusRequest),
}

#[derive(Debug, Deserialize)]
pub struct StopRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub road_distances: BTreeMap<String, Distance>,
}

#[derive(Debug, Deserialize)]
pub struct BusRequest {
    pub name: String,
    pub stops: Vec<String>,
    #[serde(rename = "is_roundtrip")]
    pub is_round_trip: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatRequest {
    pub id: i64,
    #[serde(flatten)]
    pub query: StatQuery,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StatQuery {
    Bus { name: String },
    Stop { name: String },
    Route { from: String, to: String },
    Map,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatResponse {
    Bus {
        request_id: i64,
        curvature: f64,
        route_length: f64,
        stop_count: usize,
        unique_stop_count: usize,
    },
    Stop {
        request_id: i64,
        buses: Vec<String>,
    },
    Route {
        request_id: i64,
        total_time: f64,
        items: Vec<RouteItem>,
    },
    Map {
        request_id: i64,
        map: String,
    },
    NotFound {
        request_id: i64,
        error_message: &'static str,
    },
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum RouteItem {
    Wait { stop_name: String, time: f64 },
    Bus { bus: String, span_count: u32, time: f64 },
}

impl From<&Leg> for RouteItem {
    fn from(leg: &Leg) -> Self {
        match leg {
            Leg::Wait { stop_name, time } => RouteItem::Wait { stop_name: stop_name.to_string(), time: *time },
            Leg::Ride { bus, span_count, time } => RouteItem::Bus {
                bus: bus.to_string(),
                span_count: *span_count,
                time: *time,
            },
        }
    }
}

pub fn read_document<R: Read>(reader: R) -> Result<InputDocument, RequestError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Fills a catalogue from base requests: all stops first, then road distances, then buses,
/// so requests may refer to stops declared later in the list.
pub fn fill_catalogue(requests: &[BaseRequest]) -> Result<TransportCatalogue, RequestError> {
    let mut catalogue = TransportCatalogue::new();

    for request in requests {
        if let BaseRequest::Stop(stop) = request {
            catalogue.add_stop(&stop.name, Coordinates::new(stop.latitude, stop.longitude));
        }
    }
    for request in requests {
        if let BaseRequest::Stop(stop) = request {
            for (other, &meters) in stop.road_distances.iter() {
                catalogue.add_distance(&stop.name, other, meters)?;
            }
        }
    }
    for request in requests {
        if let BaseRequest::Bus(bus) = request {
            catalogue.add_bus(&bus.name, &bus.stops, bus.is_round_trip)?;
        }
    }

    catalogue.validate()?;
    info!("Catalogue filled with {} stops and {} buses.", catalogue.num_stops(), catalogue.num_buses());
    Ok(catalogue)
}

/// Answers stat requests against a loaded catalogue and, if present, its router and render
/// settings. The map is rendered on the first `Map` request and reused afterwards.
pub struct RequestHandler<'a> {
    catalogue: &'a TransportCatalogue,
    router: Option<&'a TransportRouter>,
    render_settings: Option<&'a RenderSettings>,
    map: OnceCell<String>,
}

impl<'a> RequestHandler<'a> {
    pub fn new(catalogue: &'a TransportCatalogue, router: Option<&'a TransportRouter>) -> Self {
        Self { catalogue, router, render_settings: None, map: OnceCell::new() }
    }

    pub fn from_base(base: &'a Base) -> Self {
        let handler = Self::new(&base.catalogue, base.router.as_ref());
        match &base.render_settings {
            Some(render_settings) => handler.with_render_settings(render_settings),
            None => handler,
        }
    }

    pub fn with_render_settings(mut self, render_settings: &'a RenderSettings) -> Self {
        self.render_settings = Some(render_settings);
        self
    }

    fn render_map(&self, render_settings: &RenderSettings) -> &str {
        self.map.get_or_init(|| MapRenderer::new(render_settings).render(self.catalogue).to_string())
    }

    pub fn answer(&self, request: &StatRequest) -> StatResponse {
        let request_id = request.id;
        let not_found = StatResponse::NotFound { request_id, error_message: NOT_FOUND };

        match &request.query {
            StatQuery::Bus { name } => match self.catalogue.get_bus_info(name) {
                Some(info) => StatResponse::Bus {
                    request_id,
                    curvature: info.curvature,
                    route_length: info.route_length,
                    stop_count: info.stop_count,
                    unique_stop_count: info.unique_stop_count,
                },
                None => not_found,
            },
            StatQuery::Stop { name } => match self.catalogue.get_stop_info(name) {
                Some(info) => StatResponse::Stop {
                    request_id,
                    buses: info.buses.iter().map(|bus| bus.to_string()).collect(),
                },
                None => not_found,
            },
            StatQuery::Route { from, to } => match self.router.and_then(|router| router.build_route(from, to)) {
                Some(journey) => {
                    debug!("Route {} -> {}:\n{}", from, to, journey);
                    StatResponse::Route {
                        request_id,
                        total_time: journey.total_time,
                        items: journey.legs.iter().map(RouteItem::from).collect(),
                    }
                }
                None => not_found,
            },
            StatQuery::Map => match self.render_settings {
                Some(render_settings) => StatResponse::Map {
                    request_id,
                    map: self.render_map(render_settings).to_owned(),
                },
                None => not_found,
            },
        }
    }

    pub fn answer_all(&self, requests: &[StatRequest]) -> Vec<StatResponse> {
        requests.iter().map(|request| self.answer(request)).collect()
    }
}

/// Build phase: fill the catalogue, build the router and persist them with the render settings.
pub fn make_base(document: &InputDocument, include_router_cache: bool) -> Result<(), RequestError> {
    let settings = document
        .serialization_settings
        .as_ref()
        .ok_or(RequestError::MissingSection("serialization_settings"))?;

    // Settings are checked before any catalogue or graph work.
    if let Some(routing_settings) = &document.routing_settings {
        routing_settings.validate()?;
    }
    let render_settings = document.render_settings.as_ref().map(RenderSettingsRequest::to_settings).transpose()?;

    let catalogue = fill_catalogue(&document.base_requests)?;
    let router = document
        .routing_settings
        .map(|routing_settings| TransportRouter::new(&catalogue, routing_settings))
        .transpose()?;

    let base = Base { catalogue, router, render_settings };
    serialization::save_to_file(&settings.file, &base, include_router_cache)?;
    Ok(())
}

/// Serve phase: load the persisted state and write one JSON answer per stat request.
pub fn process_requests<W: Write>(document: &InputDocument, writer: W) -> Result<(), RequestError> {
    let settings = document
        .serialization_settings
        .as_ref()
        .ok_or(RequestError::MissingSection("serialization_settings"))?;

    let base = serialization::load_from_file(&settings.file)?;
    let handler = RequestHandler::from_base(&base);
    let responses = handler.answer_all(&document.stat_requests);
    info!("Answered {} requests.", responses.len());

    serde_json::to_writer_pretty(writer, &responses)?;
    Ok(())
}
