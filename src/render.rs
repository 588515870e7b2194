use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalogue::{Bus, TransportCatalogue};
use crate::geo::Coordinates;
use crate::svg::{Color, Document, Object, PathProps, Point, Text};

const EPSILON: f64 = 1e-6;
const FONT_FAMILY: &str = "Verdana";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("Map size {width}x{height} must be positive.")]
    InvalidSize { width: f64, height: f64 },
    #[error("Padding {0} must be non-negative and less than half of the map size.")]
    InvalidPadding(f64),
    #[error("Color palette is empty.")]
    EmptyPalette,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub line_width: f64,
    pub stop_radius: f64,
    pub bus_label_font_size: u32,
    pub bus_label_offset: Point,
    pub stop_label_font_size: u32,
    pub stop_label_offset: Point,
    pub underlayer_color: Color,
    pub underlayer_width: f64,
    pub color_palette: Vec<Color>,
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), RenderError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(RenderError::InvalidSize { width: self.width, height: self.height });
        }
        if !(self.padding >= 0.0 && self.padding < self.width.min(self.height) / 2.0) {
            return Err(RenderError::InvalidPadding(self.padding));
        }
        if self.color_palette.is_empty() {
            return Err(RenderError::EmptyPalette);
        }
        Ok(())
    }
}

/// Maps geographic coordinates onto the image plane, keeping the aspect ratio and fitting
/// every given point inside the padded area. North is up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SphereProjector {
    padding: f64,
    min_lng: f64,
    max_lat: f64,
    zoom: f64,
}

impl SphereProjector {
    pub fn new<I>(points: I, width: f64, height: f64, padding: f64) -> Self
    where
        I: IntoIterator<Item = Coordinates>,
    {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self { padding, ..Self::default() };
        };
        let (mut min_lat, mut max_lat, mut min_lng, mut max_lng) = (first.lat, first.lat, first.lng, first.lng);
        for point in points {
            min_lat = min_lat.min(point.lat);
            max_lat = max_lat.max(point.lat);
            min_lng = min_lng.min(point.lng);
            max_lng = max_lng.max(point.lng);
        }

        let width_zoom = (max_lng - min_lng > EPSILON).then(|| (width - 2.0 * padding) / (max_lng - min_lng));
        let height_zoom = (max_lat - min_lat > EPSILON).then(|| (height - 2.0 * padding) / (max_lat - min_lat));
        let zoom = match (width_zoom, height_zoom) {
            (Some(width_zoom), Some(height_zoom)) => width_zoom.min(height_zoom),
            (Some(zoom), None) | (None, Some(zoom)) => zoom,
            (None, None) => 0.0,
        };

        Self { padding, min_lng, max_lat, zoom }
    }

    pub fn project(&self, coordinates: Coordinates) -> Point {
        Point::new(
            (coordinates.lng - self.min_lng) * self.zoom + self.padding,
            (self.max_lat - coordinates.lat) * self.zoom + self.padding,
        )
    }
}

/// Draws the network as an SVG map: bus lines, bus labels, stop circles and stop labels, in
/// that order. Buses are drawn in name order and take palette colors in turn; stops that no
/// bus serves are left out.
pub struct MapRenderer<'a> {
    settings: &'a RenderSettings,
}

impl<'a> MapRenderer<'a> {
    pub fn new(settings: &'a RenderSettings) -> Self {
        Self { settings }
    }

    pub fn render(&self, catalogue: &TransportCatalogue) -> Document {
        let buses: Vec<&Bus> = catalogue
            .get_sorted_all_buses()
            .into_iter()
            .filter(|bus| !bus.stops.is_empty())
            .collect();

        let mut stops: BTreeMap<&str, Coordinates> = BTreeMap::new();
        for bus in buses.iter() {
            for &stop_idx in bus.stops.iter() {
                let stop = catalogue.get_stop(stop_idx);
                stops.insert(stop.name.as_ref(), stop.coordinates);
            }
        }
        let projector = SphereProjector::new(
            stops.values().copied(),
            self.settings.width,
            self.settings.height,
            self.settings.padding,
        );

        let mut document = Document::new();
        for (i, bus) in buses.iter().enumerate() {
            document.add(Object::Polyline {
                points: bus.stops.iter().map(|&stop_idx| projector.project(catalogue.get_stop(stop_idx).coordinates)).collect(),
                props: PathProps {
                    fill: Some(Color::None),
                    stroke: Some(self.palette_color(i)),
                    stroke_width: Some(self.settings.line_width),
                    rounded: true,
                },
            });
        }
        for (i, bus) in buses.iter().enumerate() {
            let forward = bus.forward_stops();
            let mut ends = vec![forward[0]];
            if let Some(&last) = forward.last() {
                if !bus.is_round_trip && last != forward[0] {
                    ends.push(last);
                }
            }
            for stop_idx in ends {
                let position = projector.project(catalogue.get_stop(stop_idx).coordinates);
                let label = self.bus_label(position, &bus.name, self.palette_color(i));
                document.add(Object::Text(self.underlayer(&label)));
                document.add(Object::Text(label));
            }
        }
        for &coordinates in stops.values() {
            document.add(Object::Circle {
                center: projector.project(coordinates),
                radius: self.settings.stop_radius,
                props: PathProps::filled(Color::named("white")),
            });
        }
        for (&name, &coordinates) in stops.iter() {
            let label = self.stop_label(projector.project(coordinates), name);
            document.add(Object::Text(self.underlayer(&label)));
            document.add(Object::Text(label));
        }

        debug!("Rendered {} buses and {} stops.", buses.len(), stops.len());
        document
    }

    fn palette_color(&self, bus_number: usize) -> Color {
        let palette = &self.settings.color_palette;
        if palette.is_empty() {
            return Color::None;
        }
        palette[bus_number % palette.len()].clone()
    }

    fn bus_label(&self, position: Point, name: &str, color: Color) -> Text {
        Text {
            position,
            offset: self.settings.bus_label_offset,
            font_size: self.settings.bus_label_font_size,
            font_family: Some(FONT_FAMILY.to_owned()),
            font_weight: Some("bold".to_owned()),
            data: name.to_owned(),
            props: PathProps::filled(color),
        }
    }

    fn stop_label(&self, position: Point, name: &str) -> Text {
        Text {
            position,
            offset: self.settings.stop_label_offset,
            font_size: self.settings.stop_label_font_size,
            font_family: Some(FONT_FAMILY.to_owned()),
            font_weight: None,
            data: name.to_owned(),
            props: PathProps::filled(Color::named("black")),
        }
    }

    // Same text drawn underneath with a wide stroke, so labels stay readable over lines.
    fn underlayer(&self, label: &Text) -> Text {
        Text {
            props: PathProps {
                fill: Some(self.settings.underlayer_color.clone()),
                stroke: Some(self.settings.underlayer_color.clone()),
                stroke_width: Some(self.settings.underlayer_width),
                rounded: true,
            },
            ..label.clone()
        }
    }
}
