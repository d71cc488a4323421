use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use trip_planner::{
    config::{CurrencyOption, PlannerConfig},
    geo::TransportMode,
    override_store::OverrideStore,
    overrides::TicketCount,
    parsing,
    recompute,
    stats::{compute_stats, ExpenseCategory, TripStats},
    DayId, OverrideEdit, Overrides, ResolvedDay, StopId, Trip,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan and track a multi-day trip itinerary", long_about = None)]
struct Args {
    /// Trip reference data as JSON
    #[arg(long, default_value = "trip.json")]
    trip: PathBuf,
    /// Optional planner configuration
    #[arg(long, default_value = "trip_planner.json")]
    config: PathBuf,
    /// Override the database path from the config
    #[arg(long)]
    db: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Print the resolved schedule
    Schedule {
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Set the start time of a day
    SetStart { day: String, time: String },
    /// Set how long to stay at a stop
    SetStay { stop: String, duration: String },
    /// Choose how to travel to the next stop
    SetMode { stop: String, mode: TransportMode },
    /// Record the actual departure from a stop, now if no time is given
    Depart { stop: String, time: Option<String> },
    /// Forget a recorded departure
    Undepart { stop: String },
    /// Set the number of tickets bought at a stop
    SetTickets { stop: String, adult: u32, child: u32 },
    /// Add an entry to the expense ledger
    AddExpense {
        #[arg(long)]
        day: Option<String>,
        category: ExpenseCategory,
        amount: f64,
        description: String,
    },
    /// Remove an entry from the expense ledger
    RemoveExpense { id: i64 },
    /// Print per-day and trip-wide totals
    Stats {
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Dump all overrides and expenses as JSON
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    simple_logger::SimpleLogger::new()
        .with_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init()?;

    let config = PlannerConfig::load(&args.config)?;
    let trip = Trip::load(&args.trip)?;
    let store = OverrideStore::open(args.db.as_ref().unwrap_or(&config.database_path)).await?;
    let mut overrides = store.load().await?;

    match args.cmd {
        Command::Schedule { day, json } => {
            let schedule = recompute(&trip.days, &overrides);
            let schedule: Vec<_> = match day {
                Some(day) => {
                    let day = find_day(&trip, &day)?;
                    schedule.into_iter().filter(|d| d.id == day).collect()
                }
                None => schedule,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&schedule)?);
            } else {
                for day in &schedule {
                    print_day(day);
                }
            }
        }
        Command::SetStart { day, time } => {
            let day = find_day(&trip, &day)?;
            let time = checked_clock(&time)?;
            let edit = OverrideEdit::DayStart { day, time };
            edit_and_show(&store, &trip, &mut overrides, edit, day).await?;
        }
        Command::SetStay { stop, duration } => {
            let (stop, day) = find_stop(&trip, &stop)?;
            if !config.is_stay_option(&duration) {
                anyhow::bail!(
                    "Unknown stay duration {:?}, expected one of {:?}",
                    duration,
                    config.stay_options
                );
            }
            let edit = OverrideEdit::Stay { stop, duration };
            edit_and_show(&store, &trip, &mut overrides, edit, day).await?;
        }
        Command::SetMode { stop, mode } => {
            let (stop, day) = find_stop(&trip, &stop)?;
            let edit = OverrideEdit::Mode { stop, mode };
            edit_and_show(&store, &trip, &mut overrides, edit, day).await?;
        }
        Command::Depart { stop, time } => {
            let (stop, day) = find_stop(&trip, &stop)?;
            let time = match time {
                Some(time) => checked_clock(&time)?,
                None => chrono::Local::now().format("%H:%M").to_string(),
            };
            let edit = OverrideEdit::ConfirmDeparture { stop, time };
            edit_and_show(&store, &trip, &mut overrides, edit, day).await?;
        }
        Command::Undepart { stop } => {
            let (stop, day) = find_stop(&trip, &stop)?;
            let edit = OverrideEdit::ClearDeparture { stop };
            edit_and_show(&store, &trip, &mut overrides, edit, day).await?;
        }
        Command::SetTickets { stop, adult, child } => {
            let (stop, day) = find_stop(&trip, &stop)?;
            let edit = OverrideEdit::Tickets {
                stop,
                count: TicketCount { adult, child },
            };
            edit_and_show(&store, &trip, &mut overrides, edit, day).await?;
        }
        Command::AddExpense {
            day,
            category,
            amount,
            description,
        } => {
            let day = day.map(|day| find_day(&trip, &day)).transpose()?;
            let expense = store
                .add_expense(day, category, &description, amount)
                .await?;
            log::info!("Added expense #{}", expense.id);
        }
        Command::RemoveExpense { id } => {
            if !store.remove_expense(id).await? {
                anyhow::bail!("No expense #{}", id);
            }
            log::info!("Removed expense #{}", id);
        }
        Command::Stats { currency, json } => {
            let schedule = recompute(&trip.days, &overrides);
            let expenses = store.load_expenses().await?;
            let stats = compute_stats(&schedule, &expenses, &overrides);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                let currency = match currency {
                    Some(code) => config
                        .currency
                        .option(&code)
                        .ok_or_else(|| anyhow::anyhow!("Unknown currency {:?}", code))?,
                    None => &config.currency.base,
                };
                print_stats(&stats, currency);
            }
        }
        Command::Export => {
            let expenses = store.load_expenses().await?;
            let export = serde_json::json!({
                "overrides": overrides,
                "expenses": expenses,
            });
            println!("{}", serde_json::to_string_pretty(&export)?);
        }
    }

    Ok(())
}

async fn edit_and_show(
    store: &OverrideStore,
    trip: &Trip,
    overrides: &mut Overrides,
    edit: OverrideEdit,
    day: DayId,
) -> Result<()> {
    store.apply(overrides, &edit).await?;
    let schedule = recompute(&trip.days, overrides);
    for resolved in schedule.iter().filter(|d| d.id == day) {
        print_day(resolved);
    }
    Ok(())
}

fn find_day(trip: &Trip, id: &str) -> Result<DayId> {
    let id = DayId::new(id);
    match trip.day(id) {
        Some(_) => Ok(id),
        None => anyhow::bail!("Unknown day {:?}", id.as_str()),
    }
}

fn find_stop(trip: &Trip, id: &str) -> Result<(StopId, DayId)> {
    let id = StopId::new(id);
    match trip.find_stop(id) {
        Some((day, _)) => Ok((id, day.id)),
        None => anyhow::bail!("Unknown stop {:?}", id.as_str()),
    }
}

/// Normalizes user input to `HH:MM`, rejecting out-of-range hours or minutes.
fn checked_clock(text: &str) -> Result<String> {
    match parsing::parse_wall_clock(text) {
        Some(minutes) => Ok(parsing::format_clock(minutes)),
        None => anyhow::bail!("Invalid time {:?}, expected HH:MM", text),
    }
}

fn print_day(day: &ResolvedDay) {
    match day.date {
        Some(date) => println!("== {} {} ({})", day.id, day.title, date),
        None => println!("== {} {}", day.id, day.title),
    }
    for stop in &day.stops {
        println!(
            "  {} {:<8} -> {} {}{}",
            stop.arrival_time,
            stop.id.as_str(),
            stop.effective_departure_time,
            stop.stop.name,
            if stop.is_departed { " (departed)" } else { "" }
        );
        if let Some(next) = &stop.next {
            println!(
                "        {} km by {}, {} min (drive {}, walk {})",
                next.distance_km, next.mode, next.travel_minutes, next.drive_time, next.walk_time
            );
        }
    }
}

fn print_stats(stats: &TripStats, currency: &CurrencyOption) {
    for day in &stats.days {
        println!(
            "{:<8} {:>2} stops {:>6.1} km {:>6} travel  tickets {}  expenses {}",
            day.id.as_str(),
            day.totals.stop_count,
            day.totals.distance_km,
            parsing::format_duration(day.totals.travel_minutes),
            currency.format(day.totals.ticket_cost),
            currency.format(day.totals.expense_total),
        );
    }
    println!(
        "Total    {:>2} stops {:>6.1} km {:>6} travel  tickets {}  expenses {}",
        stats.totals.stop_count,
        stats.totals.distance_km,
        parsing::format_duration(stats.totals.travel_minutes),
        currency.format(stats.totals.ticket_cost),
        currency.format(stats.totals.expense_total),
    );
    if stats.unassigned_expenses > 0.0 {
        println!("  not tied to a day: {}", currency.format(stats.unassigned_expenses));
    }
    for (category, amount) in &stats.by_category {
        println!("  {:<10} {}", category.as_str(), currency.format(*amount));
    }
}
