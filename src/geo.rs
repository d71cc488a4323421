use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

const CAR_SPEED_KMH: f64 = 40.0;
/// Parking and boarding buffer added to every car leg.
const CAR_OVERHEAD_MINUTES: u32 = 10;
const WALK_SPEED_KMH: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Car,
    Walk,
}

impl TransportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Car => "car",
            TransportMode::Walk => "walk",
        }
    }

    /// Travel mode name understood by the map directions service.
    pub fn nav_mode(self) -> &'static str {
        match self {
            TransportMode::Car => "driving",
            TransportMode::Walk => "walking",
        }
    }
}

impl std::str::FromStr for TransportMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "car" => Ok(TransportMode::Car),
            "walk" => Ok(TransportMode::Walk),
            other => anyhow::bail!("unknown transport mode {:?}, expected car or walk", other),
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Great-circle distance in kilometers, rounded to one decimal place.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    (EARTH_RADIUS_KM * c * 10.0).round() / 10.0
}

pub fn travel_minutes(distance_km: f64, mode: TransportMode) -> u32 {
    let minutes = match mode {
        TransportMode::Car => distance_km / CAR_SPEED_KMH * 60.0,
        TransportMode::Walk => distance_km / WALK_SPEED_KMH * 60.0,
    };
    if !minutes.is_finite() || minutes < 0.0 {
        log::warn!("Discarding invalid leg distance {}", distance_km);
        return 0;
    }
    let minutes = minutes.round() as u32;
    match mode {
        TransportMode::Car => minutes + CAR_OVERHEAD_MINUTES,
        TransportMode::Walk => minutes,
    }
}

pub fn navigation_url(from: Coordinates, to: Coordinates, mode: TransportMode) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={},{}&destination={},{}&travelmode={}",
        from.lat,
        from.lon,
        to.lat,
        to.lon,
        mode.nav_mode()
    )
}
