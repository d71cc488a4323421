use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    geo::TransportMode,
    trip_data::{DayId, StopId},
};

pub const DEFAULT_DAY_START: &str = "09:00";
pub const DEFAULT_STAY: &str = "1.5 hr";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCount {
    pub adult: u32,
    pub child: u32,
}

impl Default for TicketCount {
    fn default() -> Self {
        TicketCount { adult: 1, child: 0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverrideEdit {
    DayStart { day: DayId, time: String },
    ConfirmDeparture { stop: StopId, time: String },
    ClearDeparture { stop: StopId },
    Stay { stop: StopId, duration: String },
    Mode { stop: StopId, mode: TransportMode },
    Tickets { stop: StopId, count: TicketCount },
}

/// Sparse user overrides. A missing entry means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    pub day_start: BTreeMap<DayId, String>,
    pub actual_departure: BTreeMap<StopId, String>,
    pub stay: BTreeMap<StopId, String>,
    pub transport_mode: BTreeMap<StopId, TransportMode>,
    pub tickets: BTreeMap<StopId, TicketCount>,
}

impl Overrides {
    pub fn day_start_for(&self, day: DayId) -> &str {
        self.day_start
            .get(&day)
            .map(String::as_str)
            .unwrap_or(DEFAULT_DAY_START)
    }

    pub fn departure_for(&self, stop: StopId) -> Option<&str> {
        self.actual_departure.get(&stop).map(String::as_str)
    }

    pub fn stay_for(&self, stop: StopId) -> &str {
        self.stay
            .get(&stop)
            .map(String::as_str)
            .unwrap_or(DEFAULT_STAY)
    }

    pub fn mode_for(&self, stop: StopId) -> TransportMode {
        self.transport_mode.get(&stop).copied().unwrap_or_default()
    }

    pub fn tickets_for(&self, stop: StopId) -> TicketCount {
        self.tickets.get(&stop).copied().unwrap_or_default()
    }

    pub fn set_day_start(&mut self, day: DayId, time: impl Into<String>) {
        self.day_start.insert(day, time.into());
    }

    pub fn confirm_departure(&mut self, stop: StopId, time: impl Into<String>) {
        self.actual_departure.insert(stop, time.into());
    }

    pub fn clear_departure(&mut self, stop: StopId) -> bool {
        self.actual_departure.remove(&stop).is_some()
    }

    pub fn set_stay(&mut self, stop: StopId, duration: impl Into<String>) {
        self.stay.insert(stop, duration.into());
    }

    pub fn set_mode(&mut self, stop: StopId, mode: TransportMode) {
        self.transport_mode.insert(stop, mode);
    }

    pub fn set_tickets(&mut self, stop: StopId, count: TicketCount) {
        self.tickets.insert(stop, count);
    }

    pub fn apply(&mut self, edit: &OverrideEdit) {
        match edit {
            OverrideEdit::DayStart { day, time } => self.set_day_start(*day, time.as_str()),
            OverrideEdit::ConfirmDeparture { stop, time } => {
                self.confirm_departure(*stop, time.as_str())
            }
            OverrideEdit::ClearDeparture { stop } => {
                self.clear_departure(*stop);
            }
            OverrideEdit::Stay { stop, duration } => self.set_stay(*stop, duration.as_str()),
            OverrideEdit::Mode { stop, mode } => self.set_mode(*stop, *mode),
            OverrideEdit::Tickets { stop, count } => self.set_tickets(*stop, *count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_use_defaults() {
        let overrides = Overrides::default();
        let stop = StopId::new("d1-s0");
        assert_eq!(overrides.day_start_for(DayId::new("d1")), "09:00");
        assert_eq!(overrides.stay_for(stop), "1.5 hr");
        assert_eq!(overrides.mode_for(stop), TransportMode::Car);
        assert_eq!(overrides.departure_for(stop), None);
        assert_eq!(overrides.tickets_for(stop), TicketCount { adult: 1, child: 0 });
    }

    #[test]
    fn mutations_replace_defaults() {
        let mut overrides = Overrides::default();
        let stop = StopId::new("d1-s0");
        overrides.set_day_start(DayId::new("d1"), "08:15");
        overrides.set_stay(stop, "30 min");
        overrides.set_mode(stop, TransportMode::Walk);
        overrides.confirm_departure(stop, "10:02");
        assert_eq!(overrides.day_start_for(DayId::new("d1")), "08:15");
        assert_eq!(overrides.stay_for(stop), "30 min");
        assert_eq!(overrides.mode_for(stop), TransportMode::Walk);
        assert_eq!(overrides.departure_for(stop), Some("10:02"));

        assert!(overrides.clear_departure(stop));
        assert!(!overrides.clear_departure(stop));
        assert_eq!(overrides.departure_for(stop), None);
    }

    #[test]
    fn edits_apply_like_setters() {
        let stop = StopId::new("d1-s2");
        let mut overrides = Overrides::default();
        overrides.apply(&OverrideEdit::Mode {
            stop,
            mode: TransportMode::Walk,
        });
        overrides.apply(&OverrideEdit::ConfirmDeparture {
            stop,
            time: "11:40".to_string(),
        });
        assert_eq!(overrides.mode_for(stop), TransportMode::Walk);
        assert_eq!(overrides.departure_for(stop), Some("11:40"));

        overrides.apply(&OverrideEdit::ClearDeparture { stop });
        assert_eq!(overrides.departure_for(stop), None);
    }

    #[test]
    fn serializes_with_plain_string_keys() {
        let mut overrides = Overrides::default();
        overrides.set_mode(StopId::new("d2-s1"), TransportMode::Walk);
        let json = serde_json::to_value(&overrides).unwrap();
        assert_eq!(json["transport_mode"]["d2-s1"], "walk");
        let back: Overrides = serde_json::from_value(json).unwrap();
        assert_eq!(back, overrides);
    }
}
