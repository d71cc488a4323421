use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{overrides::Overrides, schedule::ResolvedDay, trip_data::DayId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Food,
    Transport,
    Ticket,
    Lodging,
    Shopping,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseCategory::Food => "food",
            ExpenseCategory::Transport => "transport",
            ExpenseCategory::Ticket => "ticket",
            ExpenseCategory::Lodging => "lodging",
            ExpenseCategory::Shopping => "shopping",
            ExpenseCategory::Other => "other",
        }
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "food" => ExpenseCategory::Food,
            "transport" => ExpenseCategory::Transport,
            "ticket" => ExpenseCategory::Ticket,
            "lodging" => ExpenseCategory::Lodging,
            "shopping" => ExpenseCategory::Shopping,
            "other" => ExpenseCategory::Other,
            other => anyhow::bail!("unknown expense category {:?}", other),
        })
    }
}

/// One ledger entry, amounts in the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub day: Option<DayId>,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: f64,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub stop_count: usize,
    pub distance_km: f64,
    pub travel_minutes: u32,
    pub ticket_cost: f64,
    pub expense_total: f64,
}

impl Totals {
    fn add(&mut self, other: &Totals) {
        self.stop_count += other.stop_count;
        self.distance_km += other.distance_km;
        self.travel_minutes += other.travel_minutes;
        self.ticket_cost += other.ticket_cost;
        self.expense_total += other.expense_total;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStats {
    pub id: DayId,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripStats {
    pub days: Vec<DayStats>,
    pub totals: Totals,
    /// Expenses not tied to any day of the schedule.
    pub unassigned_expenses: f64,
    pub by_category: BTreeMap<ExpenseCategory, f64>,
}

pub fn compute_stats(
    schedule: &[ResolvedDay],
    expenses: &[Expense],
    overrides: &Overrides,
) -> TripStats {
    let mut stats = TripStats::default();

    for day in schedule {
        let mut totals = Totals {
            stop_count: day.stops.len(),
            ..Totals::default()
        };
        for stop in &day.stops {
            if let Some(next) = &stop.next {
                totals.distance_km += next.distance_km;
                totals.travel_minutes += next.travel_minutes;
            }
            if let Some(ticket) = &stop.stop.ticket {
                let count = overrides.tickets_for(stop.id);
                totals.ticket_cost +=
                    ticket.adult * count.adult as f64 + ticket.child * count.child as f64;
            }
        }
        totals.distance_km = round_tenth(totals.distance_km);
        totals.expense_total = expenses
            .iter()
            .filter(|expense| expense.day == Some(day.id))
            .map(|expense| expense.amount)
            .sum();

        stats.totals.add(&totals);
        stats.days.push(DayStats { id: day.id, totals });
    }
    stats.totals.distance_km = round_tenth(stats.totals.distance_km);

    for expense in expenses {
        *stats.by_category.entry(expense.category).or_default() += expense.amount;
        let scheduled = expense
            .day
            .is_some_and(|day| schedule.iter().any(|d| d.id == day));
        if !scheduled {
            stats.unassigned_expenses += expense.amount;
        }
    }
    stats.totals.expense_total += stats.unassigned_expenses;

    stats
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        overrides::TicketCount,
        schedule::recompute,
        trip_data::{Stop, StopId, Ticket, TripDay},
    };

    fn expense(day: Option<&str>, category: ExpenseCategory, amount: f64) -> Expense {
        Expense {
            id: 0,
            day: day.map(DayId::new),
            category,
            description: String::new(),
            amount,
            recorded_at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
        }
    }

    fn days() -> Vec<TripDay> {
        vec![TripDay {
            id: DayId::new("d1"),
            title: String::new(),
            date: None,
            stops: vec![
                Stop {
                    name: "Shinjuku".to_string(),
                    lat: 35.6895,
                    lon: 139.6917,
                    ticket: Some(Ticket {
                        adult: 500.0,
                        child: 200.0,
                    }),
                    description: None,
                },
                Stop {
                    name: "Tokyo Tower".to_string(),
                    lat: 35.6586,
                    lon: 139.7454,
                    ticket: Some(Ticket {
                        adult: 1200.0,
                        child: 700.0,
                    }),
                    description: None,
                },
            ],
        }]
    }

    #[test]
    fn totals_cover_legs_tickets_and_expenses() {
        let mut overrides = Overrides::default();
        overrides.set_tickets(StopId::new("d1-s1"), TicketCount { adult: 2, child: 1 });
        let schedule = recompute(&days(), &overrides);
        let expenses = vec![
            expense(Some("d1"), ExpenseCategory::Food, 1800.0),
            expense(Some("d1"), ExpenseCategory::Transport, 400.0),
            expense(None, ExpenseCategory::Lodging, 12000.0),
        ];

        let stats = compute_stats(&schedule, &expenses, &overrides);
        let day = &stats.days[0].totals;
        assert_eq!(day.stop_count, 2);
        assert_eq!(day.distance_km, 5.9);
        assert_eq!(day.travel_minutes, 19);
        assert_eq!(day.ticket_cost, 500.0 + 2.0 * 1200.0 + 700.0);
        assert_eq!(day.expense_total, 2200.0);

        assert_eq!(stats.unassigned_expenses, 12000.0);
        assert_eq!(stats.totals.expense_total, 14200.0);
        assert_eq!(stats.by_category[&ExpenseCategory::Lodging], 12000.0);
        assert_eq!(stats.by_category.get(&ExpenseCategory::Shopping), None);
    }

    #[test]
    fn expenses_for_unknown_days_are_unassigned() {
        let overrides = Overrides::default();
        let schedule = recompute(&days(), &overrides);
        let stats = compute_stats(
            &schedule,
            &[expense(Some("d9"), ExpenseCategory::Other, 50.0)],
            &overrides,
        );
        assert_eq!(stats.days[0].totals.expense_total, 0.0);
        assert_eq!(stats.unassigned_expenses, 50.0);
    }

    #[test]
    fn category_parsing() {
        assert_eq!("Food".parse::<ExpenseCategory>().unwrap(), ExpenseCategory::Food);
        assert!("fuel".parse::<ExpenseCategory>().is_err());
    }
}
