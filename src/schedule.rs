use serde::Serialize;

use crate::{
    geo::{self, TransportMode},
    overrides::Overrides,
    parsing,
    trip_data::{DayId, Stop, StopId, TripDay},
};

const FALLBACK_DAY_START_MINUTES: u32 = 9 * 60;
const FALLBACK_DEPARTURE_MINUTES: u32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextStopInfo {
    pub distance_km: f64,
    pub mode: TransportMode,
    pub travel_minutes: u32,
    /// Both alternatives are always filled in so the other mode can be shown.
    pub drive_time: String,
    pub walk_time: String,
    pub nav_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedStop {
    pub id: StopId,
    #[serde(flatten)]
    pub stop: Stop,
    pub arrival_time: String,
    pub stay_minutes: u32,
    pub is_departed: bool,
    pub effective_departure_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<NextStopInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDay {
    pub id: DayId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<chrono::NaiveDate>,
    pub start_time: String,
    pub stops: Vec<ResolvedStop>,
}

/// Derives arrival, departure and leg estimates for every stop of every day.
///
/// Days are independent of each other. Within a day each stop arrives when
/// the previous one was left plus the travel time of the leg between them.
pub fn recompute(days: &[TripDay], overrides: &Overrides) -> Vec<ResolvedDay> {
    days.iter().map(|day| resolve_day(day, overrides)).collect()
}

pub fn resolve_day(day: &TripDay, overrides: &Overrides) -> ResolvedDay {
    let mut clock = parsing::advance_clock(
        parsing::clock_or(
            Some(overrides.day_start_for(day.id)),
            FALLBACK_DAY_START_MINUTES,
        ),
        0,
    );
    let start_time = parsing::format_clock(clock);

    let mut stops = Vec::with_capacity(day.stops.len());
    for (i, stop) in day.stops.iter().enumerate() {
        let id = day.stop_id(i);
        let arrival = clock;
        let stay_minutes = parsing::parse_stay(Some(overrides.stay_for(id)));

        let departure_override = overrides.departure_for(id);
        let is_departed = departure_override.is_some();
        let departure = match departure_override {
            Some(time) => parsing::advance_clock(
                parsing::clock_or(Some(time), FALLBACK_DEPARTURE_MINUTES),
                0,
            ),
            None => parsing::advance_clock(arrival, stay_minutes),
        };

        let next = day.stops.get(i + 1).map(|next_stop| {
            let leg = next_stop_info(stop, next_stop, overrides.mode_for(id));
            clock = parsing::advance_clock(departure, leg.travel_minutes);
            leg
        });
        log::trace!(
            "{} arrives {} departs {}",
            id,
            parsing::format_clock(arrival),
            parsing::format_clock(departure)
        );

        stops.push(ResolvedStop {
            id,
            stop: stop.clone(),
            arrival_time: parsing::format_clock(arrival),
            stay_minutes,
            is_departed,
            effective_departure_time: parsing::format_clock(departure),
            next,
        });
    }

    ResolvedDay {
        id: day.id,
        title: day.title.clone(),
        date: day.date,
        start_time,
        stops,
    }
}

fn next_stop_info(from: &Stop, to: &Stop, mode: TransportMode) -> NextStopInfo {
    let distance_km = geo::haversine_km(from.coordinates(), to.coordinates());
    NextStopInfo {
        distance_km,
        mode,
        travel_minutes: geo::travel_minutes(distance_km, mode),
        drive_time: parsing::format_duration(geo::travel_minutes(distance_km, TransportMode::Car)),
        walk_time: parsing::format_duration(geo::travel_minutes(
            distance_km,
            TransportMode::Walk,
        )),
        nav_url: geo::navigation_url(from.coordinates(), to.coordinates(), mode),
    }
}
