use transport_catalogue::geo::{self, Coordinates};
use transport_catalogue::{RoutingSettings, TransportCatalogue, TransportRouter};

// Common example data for the tests and benchmarks.

pub fn get_example_settings() -> RoutingSettings {
    RoutingSettings { bus_wait_time: 6.0, bus_velocity: 40.0 }
}

pub fn get_stop_name(stop: usize) -> String {
    format!("Stop {stop}")
}

/// Random network around a city-sized box. Road distances are the great-circle distance
/// stretched by up to 50%, so curvature is always at least one.
pub fn build_example_catalogue(num_stops: usize, num_buses: usize, seed: u64) -> TransportCatalogue {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut catalogue = TransportCatalogue::new();

    for stop in 0..num_stops {
        let coordinates = Coordinates::new(55.5 + rng.f64() * 0.3, 37.3 + rng.f64() * 0.5);
        catalogue.add_stop(&get_stop_name(stop), coordinates);
    }

    for bus in 0..num_buses {
        let num_route_stops = rng.usize(2..=8usize.min(num_stops.max(2)));
        let mut route: Vec<usize> = (0..num_route_stops).map(|_| rng.usize(..num_stops)).collect();
        let is_round_trip = rng.bool();
        if is_round_trip {
            route.push(route[0]);
        }

        for pair in route.windows(2) {
            let from = catalogue.get_stop(pair[0] as u32).coordinates;
            let to = catalogue.get_stop(pair[1] as u32).coordinates;
            let meters = (geo::compute_distance(from, to) * (1.0 + rng.f64() * 0.5)).ceil() as u32;
            catalogue
                .add_distance(&get_stop_name(pair[0]), &get_stop_name(pair[1]), meters.max(1))
                .unwrap();
        }

        let stop_names: Vec<String> = route.into_iter().map(get_stop_name).collect();
        catalogue.add_bus(&bus.to_string(), &stop_names, is_round_trip).unwrap();
    }

    catalogue
}

pub fn get_example_scenario() -> (TransportCatalogue, TransportRouter) {
    let catalogue = build_example_catalogue(100, 40, 7);
    let router = TransportRouter::new(&catalogue, get_example_settings()).unwrap();
    (catalogue, router)
}
