//! Pre-defined two-aircraft encounters.

use tcas_core::geo::NM_TO_METERS;
use tcas_core::offset_by_bearing;
use tcas_node::SimulatorStart;

/// A named encounter: aircraft identifiers with their simulator start states.
pub struct Encounter {
    pub name: String,
    pub aircraft: Vec<(String, SimulatorStart)>,
}

fn inbound(
    center_lat: f64,
    center_lon: f64,
    distance_m: f64,
    heading_deg: f64,
    altitude_ft: f64,
    ground_speed_kt: f64,
) -> SimulatorStart {
    // Start behind the center as seen along the heading.
    let (lat, lon) = offset_by_bearing(
        center_lat,
        center_lon,
        distance_m,
        (heading_deg + 180.0).to_radians(),
    );
    SimulatorStart {
        altitude_ft,
        lat,
        lon,
        vertical_speed_fpm: 0.0,
        ground_speed_kt,
        heading_deg,
        ground_elevation_ft: 0.0,
    }
}

/// Two aircraft head-on through the center.
///
/// - AAA: West to East at 15000 ft
/// - BBB: East to West, `vertical_separation_ft` below
pub fn create_head_on_scenario(
    center_lat: f64,
    center_lon: f64,
    vertical_separation_ft: f64,
) -> Encounter {
    let distance_m = 2.0 * NM_TO_METERS;
    Encounter {
        name: "head-on".to_string(),
        aircraft: vec![
            (
                "AAA".to_string(),
                inbound(center_lat, center_lon, distance_m, 90.0, 15_000.0, 300.0),
            ),
            (
                "BBB".to_string(),
                inbound(
                    center_lat,
                    center_lon,
                    distance_m,
                    270.0,
                    15_000.0 - vertical_separation_ft,
                    300.0,
                ),
            ),
        ],
    }
}

/// Two aircraft crossing at right angles, arriving at the center together.
///
/// - AAA: South to North at 9000 ft
/// - BBB: West to East at 8700 ft
pub fn create_crossing_scenario(center_lat: f64, center_lon: f64) -> Encounter {
    let distance_m = 2.5 * NM_TO_METERS;
    Encounter {
        name: "crossing".to_string(),
        aircraft: vec![
            (
                "AAA".to_string(),
                inbound(center_lat, center_lon, distance_m, 0.0, 9_000.0, 250.0),
            ),
            (
                "BBB".to_string(),
                inbound(center_lat, center_lon, distance_m, 90.0, 8_700.0, 250.0),
            ),
        ],
    }
}

/// Two aircraft on parallel tracks 2 NM apart (no conflict).
pub fn create_parallel_scenario(center_lat: f64, center_lon: f64) -> Encounter {
    let distance_m = 2.0 * NM_TO_METERS;
    let (north_lat, north_lon) =
        offset_by_bearing(center_lat, center_lon, NM_TO_METERS, 0.0_f64.to_radians());
    let (south_lat, south_lon) =
        offset_by_bearing(center_lat, center_lon, NM_TO_METERS, 180.0_f64.to_radians());
    Encounter {
        name: "parallel".to_string(),
        aircraft: vec![
            (
                "AAA".to_string(),
                inbound(north_lat, north_lon, distance_m, 90.0, 12_000.0, 250.0),
            ),
            (
                "BBB".to_string(),
                inbound(south_lat, south_lon, distance_m, 90.0, 12_000.0, 250.0),
            ),
        ],
    }
}

/// Look up an encounter by name.
pub fn by_name(name: &str, center_lat: f64, center_lon: f64) -> Option<Encounter> {
    match name {
        "head-on" => Some(create_head_on_scenario(center_lat, center_lon, 200.0)),
        "crossing" => Some(create_crossing_scenario(center_lat, center_lon)),
        "parallel" => Some(create_parallel_scenario(center_lat, center_lon)),
        _ => None,
    }
}
