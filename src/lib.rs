pub mod config;
pub mod geo;
pub mod override_store;
pub mod overrides;
pub mod parsing;
pub mod schedule;
pub mod stats;
pub mod trip_data;

pub use overrides::{OverrideEdit, Overrides};
pub use schedule::{recompute, ResolvedDay, ResolvedStop};
pub use trip_data::{DayId, Stop, StopId, Trip, TripDay};
