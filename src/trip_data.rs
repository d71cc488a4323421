use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use ustr::{ustr, Ustr};

use crate::geo::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayId(pub Ustr);

/// Identity of a stop, `{dayId}-s{index}`. Stable as long as the stops of a
/// day keep their order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(pub Ustr);

impl DayId {
    pub fn new(id: &str) -> Self {
        DayId(ustr(id))
    }

    pub fn stop(self, index: usize) -> StopId {
        StopId(ustr(&format!("{}-s{}", self.0, index)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl StopId {
    pub fn new(id: &str) -> Self {
        StopId(ustr(id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for DayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for StopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub adult: f64,
    #[serde(default)]
    pub child: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Stop {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDay {
    pub id: DayId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<chrono::NaiveDate>,
    pub stops: Vec<Stop>,
}

impl TripDay {
    pub fn stop_id(&self, index: usize) -> StopId {
        self.id.stop(index)
    }

    pub fn stop_ids(&self) -> impl Iterator<Item = StopId> + '_ {
        (0..self.stops.len()).map(|i| self.stop_id(i))
    }
}

/// Reference data for a whole trip. Loaded once and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    #[serde(default)]
    pub name: String,
    pub days: Vec<TripDay>,
}

impl Trip {
    pub fn day(&self, id: DayId) -> Option<&TripDay> {
        self.days.iter().find(|day| day.id == id)
    }

    pub fn find_stop(&self, id: StopId) -> Option<(&TripDay, &Stop)> {
        self.days.iter().find_map(|day| {
            day.stop_ids()
                .position(|s| s == id)
                .map(|i| (day, &day.stops[i]))
        })
    }

    pub fn from_json(text: &str) -> Result<Trip> {
        let trip: Trip = serde_json::from_str(text)?;
        trip.validate()?;
        Ok(trip)
    }

    pub fn load(path: &Path) -> Result<Trip> {
        log::info!("Loading trip data from {:?}", path);
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trip data {:?}", path))?;
        let trip = Trip::from_json(&text).with_context(|| format!("Invalid trip data {:?}", path))?;
        log::info!(
            "Loaded {} days with {} stops",
            trip.days.len(),
            trip.days.iter().map(|d| d.stops.len()).sum::<usize>()
        );
        Ok(trip)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for day in &self.days {
            if !seen.insert(day.id) {
                anyhow::bail!("Duplicate day id {:?}", day.id.as_str());
            }
            for (i, stop) in day.stops.iter().enumerate() {
                if !stop.lat.is_finite() || !stop.lon.is_finite() {
                    anyhow::bail!(
                        "Stop {:?} ({}) has invalid coordinates",
                        stop.name,
                        day.stop_id(i)
                    );
                }
            }
        }
        Ok(())
    }
}
