use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use log::warn;

use crate::geo::{self, Coordinates};
use crate::utils;

pub type StopIndex = u32;
pub type BusIndex = u32;
/// Road distance in meters.
pub type Distance = u32;

pub struct Stop {
    pub name: Arc<str>,
    pub coordinates: Coordinates,
}

impl Stop {
    pub fn new(name: &str, coordinates: Coordinates) -> Self {
        Self { name: Arc::from(name), coordinates }
    }
}

pub struct Bus {
    pub name: Arc<str>,
    // Full traversable path. There-and-back routes are stored doubled.
    pub stops: Vec<StopIndex>,
    pub is_round_trip: bool,
}

impl Bus {
    /// The stops as they were given when the bus was added.
    pub fn forward_stops(&self) -> &[StopIndex] {
        &self.stops[..utils::forward_len(self.stops.len(), self.is_round_trip)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BusInfo {
    pub stop_count: usize,
    pub unique_stop_count: usize,
    /// Sum of road distances along the route, in meters.
    pub route_length: f64,
    /// Road length divided by great-circle length.
    pub curvature: f64,
}

#[derive(Debug, PartialEq)]
pub struct StopInfo<'a> {
    pub name: &'a str,
    /// Sorted by name, without duplicates.
    pub buses: Vec<&'a str>,
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogueError {
    #[error("Stop {0:?} is not in the catalogue.")]
    UnknownStop(String),
    #[error("No road distance between {from:?} and {to:?} (bus {bus:?}).")]
    MissingDistance { from: String, to: String, bus: String },
}

/// Indexed store of stops, buses and road distances.
///
/// Stops and buses live in append-only arenas and are referred to by index everywhere else,
/// so indices handed out stay valid for the lifetime of the catalogue.
#[derive(Default)]
pub struct TransportCatalogue {
    stops: Vec<Stop>,
    stop_index: HashMap<Arc<str>, StopIndex>,
    buses: Vec<Bus>,
    bus_index: HashMap<Arc<str>, BusIndex>,
    // Buses serving each stop, kept sorted by name.
    stop_buses: Vec<BTreeSet<Arc<str>>>,
    distances: HashMap<(StopIndex, StopIndex), Distance>,
}

impl TransportCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stop. The first registration of a name wins, later calls are no-ops.
    pub fn add_stop(&mut self, name: &str, coordinates: Coordinates) -> StopIndex {
        if let Some(&stop_idx) = self.stop_index.get(name) {
            return stop_idx;
        }
        let stop_idx = self.stops.len() as StopIndex;
        let stop = Stop::new(name, coordinates);
        self.stop_index.insert(stop.name.clone(), stop_idx);
        self.stops.push(stop);
        self.stop_buses.push(BTreeSet::new());
        stop_idx
    }

    /// Adds a bus over already registered stops. A non round trip route is stored doubled.
    pub fn add_bus<S: AsRef<str>>(&mut self, name: &str, stops: &[S], is_round_trip: bool) -> Result<BusIndex, CatalogueError> {
        if let Some(&bus_idx) = self.bus_index.get(name) {
            return Ok(bus_idx);
        }

        let forward = stops
            .iter()
            .map(|stop| self.get_stop_idx(stop.as_ref()).ok_or_else(|| CatalogueError::UnknownStop(stop.as_ref().to_owned())))
            .collect::<Result<Vec<_>, _>>()?;
        let route = if is_round_trip { forward } else { utils::double_route(&forward) };

        let bus_idx = self.buses.len() as BusIndex;
        let name: Arc<str> = Arc::from(name);
        for &stop_idx in route.iter() {
            self.stop_buses[stop_idx as usize].insert(name.clone());
        }
        self.bus_index.insert(name.clone(), bus_idx);
        self.buses.push(Bus { name, stops: route, is_round_trip });
        Ok(bus_idx)
    }

    /// Sets the road distance `from` -> `to`. The reverse direction defaults to the same value
    /// if it has not been set yet.
    pub fn add_distance(&mut self, from: &str, to: &str, meters: Distance) -> Result<(), CatalogueError> {
        let from_idx = self.get_stop_idx(from).ok_or_else(|| CatalogueError::UnknownStop(from.to_owned()))?;
        let to_idx = self.get_stop_idx(to).ok_or_else(|| CatalogueError::UnknownStop(to.to_owned()))?;
        self.add_distance_by_idx(from_idx, to_idx, meters);
        Ok(())
    }

    pub fn add_distance_by_idx(&mut self, from: StopIndex, to: StopIndex, meters: Distance) {
        self.distances.insert((from, to), meters);
        self.distances.entry((to, from)).or_insert(meters);
    }

    pub fn find_stop(&self, name: &str) -> Option<&Stop> {
        self.get_stop_idx(name).map(|stop_idx| self.get_stop(stop_idx))
    }

    pub fn find_bus(&self, name: &str) -> Option<&Bus> {
        self.get_bus_idx(name).map(|bus_idx| self.get_bus(bus_idx))
    }

    pub fn get_stop_idx(&self, name: &str) -> Option<StopIndex> {
        self.stop_index.get(name).copied()
    }

    pub fn get_bus_idx(&self, name: &str) -> Option<BusIndex> {
        self.bus_index.get(name).copied()
    }

    pub fn get_stop(&self, stop_idx: StopIndex) -> &Stop {
        &self.stops[stop_idx as usize]
    }

    pub fn get_bus(&self, bus_idx: BusIndex) -> &Bus {
        &self.buses[bus_idx as usize]
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    pub fn num_buses(&self) -> usize {
        self.buses.len()
    }

    pub fn get_bus_info(&self, name: &str) -> Option<BusInfo> {
        let bus = self.find_bus(name)?;

        let route_length = self.route_length(bus);
        let geo_length: f64 = bus
            .stops
            .windows(2)
            .map(|pair| geo::compute_distance(self.get_stop(pair[0]).coordinates, self.get_stop(pair[1]).coordinates))
            .sum();
        let curvature = if geo_length > 0.0 { route_length / geo_length } else { 1.0 };
        let unique_stop_count = bus.stops.iter().collect::<HashSet<_>>().len();

        Some(BusInfo {
            stop_count: bus.stops.len(),
            unique_stop_count,
            route_length,
            curvature,
        })
    }

    pub fn get_stop_info(&self, name: &str) -> Option<StopInfo<'_>> {
        let stop_idx = self.get_stop_idx(name)?;
        Some(StopInfo {
            name: &self.get_stop(stop_idx).name,
            buses: self.stop_buses[stop_idx as usize].iter().map(|bus| bus.as_ref()).collect(),
        })
    }

    /// Sum of road distances along the whole stored route of a bus.
    pub fn get_road_distance(&self, bus_name: &str) -> Option<f64> {
        self.find_bus(bus_name).map(|bus| self.route_length(bus))
    }

    fn route_length(&self, bus: &Bus) -> f64 {
        bus.stops.windows(2).map(|pair| self.get_stops_distance(pair[0], pair[1])).sum()
    }

    /// Road distance with a fallback to the reverse entry. Pairs unknown in both directions
    /// fall back to the great-circle distance, which is zero for a stop and itself.
    pub fn get_stops_distance(&self, from: StopIndex, to: StopIndex) -> f64 {
        if let Some(meters) = self.get_road_distance_between(from, to) {
            return meters as f64;
        }
        if from != to {
            warn!(
                "No road distance between {} and {}, using great-circle distance.",
                self.get_stop(from).name,
                self.get_stop(to).name
            );
        }
        geo::compute_distance(self.get_stop(from).coordinates, self.get_stop(to).coordinates)
    }

    fn get_road_distance_between(&self, from: StopIndex, to: StopIndex) -> Option<Distance> {
        self.distances.get(&(from, to)).or_else(|| self.distances.get(&(to, from))).copied()
    }

    /// All stored directed distances, sorted by stop pair.
    pub fn distances(&self) -> Vec<(StopIndex, StopIndex, Distance)> {
        let mut distances: Vec<_> = self.distances.iter().map(|(&(from, to), &meters)| (from, to, meters)).collect();
        distances.sort_unstable();
        distances
    }

    pub fn get_sorted_all_buses(&self) -> Vec<&Bus> {
        let mut buses: Vec<&Bus> = self.buses.iter().collect();
        buses.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        buses
    }

    /// Checks that every pair of distinct consecutive stops on every bus has a road distance.
    pub fn validate(&self) -> Result<(), CatalogueError> {
        for bus in self.buses.iter() {
            for pair in bus.stops.windows(2) {
                if pair[0] != pair[1] && self.get_road_distance_between(pair[0], pair[1]).is_none() {
                    return Err(CatalogueError::MissingDistance {
                        from: self.get_stop(pair[0]).name.to_string(),
                        to: self.get_stop(pair[1]).name.to_string(),
                        bus: bus.name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_catalogue() -> TransportCatalogue {
        let mut catalogue = TransportCatalogue::new();
        catalogue.add_stop("Tolstopaltsevo", Coordinates::new(55.611087, 37.20829));
        catalogue.add_stop("Marushkino", Coordinates::new(55.595884, 37.209755));
        catalogue.add_stop("Rasskazovka", Coordinates::new(55.632761, 37.333324));
        catalogue.add_distance("Tolstopaltsevo", "Marushkino", 3900).unwrap();
        catalogue.add_distance("Marushkino", "Rasskazovka", 9900).unwrap();
        catalogue.add_distance("Marushkino", "Marushkino", 100).unwrap();
        catalogue.add_bus("750", &["Tolstopaltsevo", "Marushkino", "Marushkino", "Rasskazovka"], false).unwrap();
        catalogue
    }

    #[test]
    fn add_stop_keeps_first_registration() {
        let mut catalogue = TransportCatalogue::new();
        let first = catalogue.add_stop("A", Coordinates::new(1.0, 2.0));
        let second = catalogue.add_stop("A", Coordinates::new(3.0, 4.0));
        assert_eq!(first, second);
        assert_eq!(catalogue.num_stops(), 1);
        assert_eq!(catalogue.find_stop("A").unwrap().coordinates, Coordinates::new(1.0, 2.0));
    }

    #[test]
    fn add_bus_is_idempotent_by_name() {
        let mut catalogue = sample_catalogue();
        let again = catalogue.add_bus("750", &["Tolstopaltsevo"], true).unwrap();
        assert_eq!(again, catalogue.get_bus_idx("750").unwrap());
        assert_eq!(catalogue.num_buses(), 1);
        assert_eq!(catalogue.find_bus("750").unwrap().stops.len(), 7);
    }

    #[test]
    fn add_bus_rejects_unknown_stop() {
        let mut catalogue = sample_catalogue();
        let err = catalogue.add_bus("1", &["Tolstopaltsevo", "Nowhere"], true).unwrap_err();
        assert!(matches!(err, CatalogueError::UnknownStop(name) if name == "Nowhere"));
        assert!(catalogue.find_bus("1").is_none());
    }

    #[test]
    fn there_and_back_route_is_doubled() {
        let catalogue = sample_catalogue();
        let bus = catalogue.find_bus("750").unwrap();
        let names: Vec<&str> = bus.stops.iter().map(|&s| catalogue.get_stop(s).name.as_ref()).collect();
        assert_eq!(
            names,
            ["Tolstopaltsevo", "Marushkino", "Marushkino", "Rasskazovka", "Marushkino", "Marushkino", "Tolstopaltsevo"]
        );
        assert_eq!(bus.forward_stops().len(), 4);
    }

    #[test]
    fn reverse_distance_defaults_once() {
        let mut catalogue = sample_catalogue();
        let t = catalogue.get_stop_idx("Tolstopaltsevo").unwrap();
        let m = catalogue.get_stop_idx("Marushkino").unwrap();
        assert_eq!(catalogue.get_stops_distance(m, t), 3900.0);

        catalogue.add_distance("Marushkino", "Tolstopaltsevo", 4000).unwrap();
        assert_eq!(catalogue.get_stops_distance(m, t), 4000.0);
        assert_eq!(catalogue.get_stops_distance(t, m), 3900.0);

        // An explicit entry is not overwritten by a later default.
        catalogue.add_distance("Tolstopaltsevo", "Marushkino", 3800).unwrap();
        assert_eq!(catalogue.get_stops_distance(m, t), 4000.0);
    }

    #[test]
    fn unknown_pair_falls_back_to_great_circle() {
        let mut catalogue = TransportCatalogue::new();
        let a = catalogue.add_stop("A", Coordinates::new(0.0, 0.0));
        let b = catalogue.add_stop("B", Coordinates::new(1.0, 0.0));
        assert_eq!(catalogue.get_stops_distance(a, a), 0.0);
        assert_relative_eq!(catalogue.get_stops_distance(a, b), 111194.93, max_relative = 1e-6);
    }

    #[test]
    fn bus_info() {
        let catalogue = sample_catalogue();
        let info = catalogue.get_bus_info("750").unwrap();
        assert_eq!(info.stop_count, 7);
        assert_eq!(info.unique_stop_count, 3);
        assert_eq!(info.route_length, 27800.0);
        let t = catalogue.find_stop("Tolstopaltsevo").unwrap().coordinates;
        let m = catalogue.find_stop("Marushkino").unwrap().coordinates;
        let r = catalogue.find_stop("Rasskazovka").unwrap().coordinates;
        let geo_length = 2.0 * (geo::compute_distance(t, m) + geo::compute_distance(m, r));
        assert_relative_eq!(info.curvature, 27800.0 / geo_length, max_relative = 1e-9);
        assert!(info.curvature > 1.0);
        assert_eq!(catalogue.get_road_distance("750"), Some(27800.0));
        assert!(catalogue.get_bus_info("751").is_none());
    }

    #[test]
    fn curvature_of_flat_route_is_one() {
        let mut catalogue = TransportCatalogue::new();
        catalogue.add_stop("A", Coordinates::new(0.0, 0.0));
        catalogue.add_stop("B", Coordinates::new(0.0, 0.0));
        catalogue.add_distance("A", "B", 1000).unwrap();
        catalogue.add_bus("1", &["A", "B"], true).unwrap();
        let info = catalogue.get_bus_info("1").unwrap();
        assert_eq!(info.route_length, 1000.0);
        assert_eq!(info.curvature, 1.0);
    }

    #[test]
    fn stop_info_is_sorted_and_deduplicated() {
        let mut catalogue = sample_catalogue();
        catalogue.add_bus("256", &["Marushkino", "Rasskazovka", "Marushkino"], true).unwrap();
        catalogue.add_stop("Lonely", Coordinates::new(55.0, 37.0));

        let info = catalogue.get_stop_info("Marushkino").unwrap();
        assert_eq!(info.buses, ["256", "750"]);
        assert!(catalogue.get_stop_info("Lonely").unwrap().buses.is_empty());
        assert!(catalogue.get_stop_info("Nowhere").is_none());
    }

    #[test]
    fn sorted_buses() {
        let mut catalogue = sample_catalogue();
        catalogue.add_bus("14", &["Marushkino", "Rasskazovka", "Marushkino"], true).unwrap();
        catalogue.add_bus("828", &["Rasskazovka"], true).unwrap();
        let names: Vec<&str> = catalogue.get_sorted_all_buses().iter().map(|bus| bus.name.as_ref()).collect();
        assert_eq!(names, ["14", "750", "828"]);
    }

    #[test]
    fn validate_reports_missing_distance() {
        let mut catalogue = sample_catalogue();
        assert!(catalogue.validate().is_ok());

        catalogue.add_bus("9", &["Tolstopaltsevo", "Rasskazovka"], true).unwrap();
        let err = catalogue.validate().unwrap_err();
        assert!(matches!(err, CatalogueError::MissingDistance { bus, .. } if bus == "9"));
    }
}
