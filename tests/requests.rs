use std::path::PathBuf;

use serde_json::{json, Value};

use transport_catalogue::requests::{self, InputDocument, RequestError};
use transport_catalogue::serialization::SerializationError;

fn temp_db(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("transport_catalogue_{}_{}.db", name, std::process::id()))
}

fn base_document(db: &PathBuf) -> InputDocument {
    serde_json::from_value(json!({
        "serialization_settings": {"file": db},
        "routing_settings": {"bus_wait_time": 2, "bus_velocity": 30},
        "render_settings": {
            "width": 600, "height": 400, "padding": 50,
            "line_width": 14, "stop_radius": 5,
            "bus_label_font_size": 20, "bus_label_offset": [7, 15],
            "stop_label_font_size": 20, "stop_label_offset": [7, -3],
            "underlayer_color": [255, 255, 255, 0.85], "underlayer_width": 3,
            "color_palette": ["green", [255, 160, 0], "red"]
        },
        "base_requests": [
            {"type": "Bus", "name": "297", "stops": ["Biryulyovo Zapadnoye", "Biryulyovo Tovarnaya", "Universam", "Biryulyovo Zapadnoye"], "is_roundtrip": true},
            {"type": "Bus", "name": "635", "stops": ["Biryulyovo Tovarnaya", "Universam", "Prazhskaya"], "is_roundtrip": false},
            {"type": "Stop", "name": "Biryulyovo Zapadnoye", "latitude": 55.574371, "longitude": 37.6517, "road_distances": {"Biryulyovo Tovarnaya": 2600}},
            {"type": "Stop", "name": "Biryulyovo Tovarnaya", "latitude": 55.592028, "longitude": 37.653656, "road_distances": {"Universam": 890}},
            {"type": "Stop", "name": "Universam", "latitude": 55.587655, "longitude": 37.645687, "road_distances": {"Biryulyovo Zapadnoye": 2500, "Biryulyovo Tovarnaya": 1380, "Prazhskaya": 4650}},
            {"type": "Stop", "name": "Prazhskaya", "latitude": 55.611717, "longitude": 37.603938, "road_distances": {}},
            {"type": "Stop", "name": "Lonely", "latitude": 55.6, "longitude": 37.6, "road_distances": {}}
        ]
    }))
    .unwrap()
}

fn stat_document(db: &PathBuf) -> InputDocument {
    serde_json::from_value(json!({
        "serialization_settings": {"file": db},
        "stat_requests": [
            {"id": 1, "type": "Bus", "name": "297"},
            {"id": 2, "type": "Bus", "name": "635"},
            {"id": 3, "type": "Stop", "name": "Universam"},
            {"id": 4, "type": "Route", "from": "Biryulyovo Zapadnoye", "to": "Universam"},
            {"id": 5, "type": "Route", "from": "Biryulyovo Zapadnoye", "to": "Prazhskaya"},
            {"id": 6, "type": "Route", "from": "Universam", "to": "Lonely"},
            {"id": 7, "type": "Stop", "name": "Nowhere"},
            {"id": 8, "type": "Route", "from": "Prazhskaya", "to": "Prazhskaya"},
            {"id": 9, "type": "Map"},
            {"id": 10, "type": "Map"}
        ]
    }))
    .unwrap()
}

fn run(name: &str, include_router_cache: bool) -> Vec<Value> {
    let db = temp_db(name);
    requests::make_base(&base_document(&db), include_router_cache).unwrap();

    let mut output = Vec::new();
    requests::process_requests(&stat_document(&db), &mut output).unwrap();
    std::fs::remove_file(&db).unwrap();

    serde_json::from_slice::<Value>(&output).unwrap().as_array().unwrap().clone()
}

fn close(value: &Value, expected: f64) -> bool {
    (value.as_f64().unwrap() - expected).abs() < 1e-6
}

#[test]
fn build_then_serve() {
    let answers = run("build_then_serve", false);
    assert_eq!(answers.len(), 10);

    assert_eq!(answers[0]["request_id"], 1);
    assert_eq!(answers[0]["stop_count"], 4);
    assert_eq!(answers[0]["unique_stop_count"], 3);
    assert!(close(&answers[0]["route_length"], 5990.0));

    // 635 is there and back: 5 stops, 890 + 4650 + 4650 + 1380.
    assert_eq!(answers[1]["stop_count"], 5);
    assert!(close(&answers[1]["route_length"], 11570.0));

    assert_eq!(answers[2]["buses"], json!(["297", "635"]));

    // Zapadnoye -> Tovarnaya -> Universam on 297: 2 + (2600 + 890) m at 30 km/h.
    assert!(close(&answers[3]["total_time"], 2.0 + 3.49 / 30.0 * 60.0));
    assert_eq!(answers[3]["items"].as_array().unwrap().len(), 2);
    assert_eq!(answers[3]["items"][1]["span_count"], 2);

    // One transfer to 635, either at Tovarnaya or at Universam: both take 20.28 minutes.
    let items = answers[4]["items"].as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[0]["type"], "Wait");
    assert_eq!(items[1]["bus"], "297");
    assert_eq!(items[3]["bus"], "635");
    assert!(close(&answers[4]["total_time"], 20.28));

    assert_eq!(answers[5], json!({"request_id": 6, "error_message": "not found"}));
    assert_eq!(answers[6], json!({"request_id": 7, "error_message": "not found"}));
    assert_eq!(answers[7], json!({"request_id": 8, "total_time": 0.0, "items": []}));

    assert_eq!(answers[8]["request_id"], 9);
    let map = answers[8]["map"].as_str().unwrap();
    assert!(map.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>"));
    assert!(map.ends_with("</svg>"));
    assert_eq!(map.matches("<polyline").count(), 2);
    // 297 is a round trip, 635 gets a label at both ends.
    assert_eq!(map.matches(r#"font-weight="bold">297</text>"#).count(), 2);
    assert_eq!(map.matches(r#"font-weight="bold">635</text>"#).count(), 4);
    assert_eq!(map.matches("<circle").count(), 4);
    assert!(map.contains(r#"stroke="rgb(255,160,0)""#));
    assert!(map.contains(r#"stroke="rgba(255,255,255,0.85)""#));
    assert!(!map.contains("Lonely"));
    assert_eq!(answers[9]["map"], answers[8]["map"]);
}

#[test]
fn map_request_does_not_break_the_batch() {
    let document = requests::read_document(
        r#"{
            "serialization_settings": {"file": "unused.db"},
            "stat_requests": [{"id": 1, "type": "Bus", "name": "1"}, {"id": 2, "type": "Map"}]
        }"#
        .as_bytes(),
    )
    .unwrap();
    assert_eq!(document.stat_requests.len(), 2);
}

#[test]
fn map_without_render_settings_is_not_found() {
    let db = temp_db("no_render_settings");
    let mut document = base_document(&db);
    document.render_settings = None;
    requests::make_base(&document, false).unwrap();

    let mut output = Vec::new();
    requests::process_requests(&stat_document(&db), &mut output).unwrap();
    std::fs::remove_file(&db).unwrap();

    let answers: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(answers[8], json!({"request_id": 9, "error_message": "not found"}));
    assert_eq!(answers[0]["stop_count"], 4);
}

#[test]
fn invalid_render_settings_stop_the_build() {
    let db = temp_db("invalid_render_settings");
    let mut document = base_document(&db);
    document.render_settings.as_mut().unwrap().color_palette.clear();
    assert!(matches!(requests::make_base(&document, false), Err(RequestError::Render(_))));
    assert!(!db.exists());
}

#[test]
fn router_cache_gives_same_answers() {
    assert_eq!(run("without_cache", false), run("with_cache", true));
}

#[test]
fn invalid_settings_stop_the_build() {
    let db = temp_db("invalid_settings");
    let mut document = base_document(&db);
    document.routing_settings.as_mut().unwrap().bus_velocity = 0.0;
    assert!(matches!(requests::make_base(&document, false), Err(RequestError::Settings(_))));
    assert!(!db.exists());
}

#[test]
fn missing_database_is_reported() {
    let db = temp_db("missing");
    let result = requests::process_requests(&stat_document(&db), Vec::new());
    assert!(matches!(result, Err(RequestError::Serialization(SerializationError::Io(_)))));
}
