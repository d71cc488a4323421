use std::{path::Path, str::FromStr};

use anyhow::{Context, Result};
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::{
    geo::TransportMode,
    overrides::{OverrideEdit, Overrides, TicketCount},
    stats::{Expense, ExpenseCategory},
    trip_data::{DayId, StopId},
};

const DAY_START: &str = "day_start";
const ACTUAL_DEPARTURE: &str = "actual_departure";
const STAY: &str = "stay";
const TRANSPORT_MODE: &str = "transport_mode";
const TICKETS: &str = "tickets";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS overrides (
    category TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (category, key)
);
CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    day TEXT,
    category TEXT NOT NULL,
    description TEXT NOT NULL,
    amount REAL NOT NULL,
    recorded_at TEXT NOT NULL
);
";

/// Persists overrides and the expense ledger in a local SQLite file.
pub struct OverrideStore {
    pool: SqlitePool,
}

impl OverrideStore {
    pub async fn open(path: &Path) -> Result<OverrideStore> {
        log::info!("Opening override store {:?}", path);
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open override store {:?}", path))?;
        Self::with_pool(pool).await
    }

    /// A store that lives as long as the returned value, used in tests.
    pub async fn in_memory() -> Result<OverrideStore> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<std::time::Duration>)
            .max_lifetime(None::<std::time::Duration>)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<OverrideStore> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(OverrideStore { pool })
    }

    pub async fn load(&self) -> Result<Overrides> {
        let mut overrides = Overrides::default();
        let mut rows = sqlx::query_as::<_, (String, String, String)>(
            "SELECT category, key, value FROM overrides ORDER BY category, key",
        )
        .fetch(&self.pool);

        while let Some((category, key, value)) = rows.try_next().await? {
            let stop = StopId::new(&key);
            match category.as_str() {
                DAY_START => overrides.set_day_start(DayId::new(&key), value),
                ACTUAL_DEPARTURE => overrides.confirm_departure(stop, value),
                STAY => overrides.set_stay(stop, value),
                TRANSPORT_MODE => match value.parse::<TransportMode>() {
                    Ok(mode) => overrides.set_mode(stop, mode),
                    Err(err) => log::warn!("Skipping stored mode for {}: {}", key, err),
                },
                TICKETS => match serde_json::from_str::<TicketCount>(&value) {
                    Ok(count) => overrides.set_tickets(stop, count),
                    Err(err) => log::warn!("Skipping stored tickets for {}: {}", key, err),
                },
                other => log::warn!("Skipping unknown override category {:?}", other),
            }
        }
        Ok(overrides)
    }

    /// Writes one edit through to the database.
    pub async fn persist(&self, edit: &OverrideEdit) -> Result<()> {
        match edit {
            OverrideEdit::DayStart { day, time } => self.put(DAY_START, day.as_str(), time).await,
            OverrideEdit::ConfirmDeparture { stop, time } => {
                self.put(ACTUAL_DEPARTURE, stop.as_str(), time).await
            }
            OverrideEdit::ClearDeparture { stop } => {
                self.remove(ACTUAL_DEPARTURE, stop.as_str()).await
            }
            OverrideEdit::Stay { stop, duration } => self.put(STAY, stop.as_str(), duration).await,
            OverrideEdit::Mode { stop, mode } => {
                self.put(TRANSPORT_MODE, stop.as_str(), mode.as_str()).await
            }
            OverrideEdit::Tickets { stop, count } => {
                self.put(TICKETS, stop.as_str(), &serde_json::to_string(count)?)
                    .await
            }
        }
    }

    /// Applies an edit in memory and persists it.
    pub async fn apply(&self, overrides: &mut Overrides, edit: &OverrideEdit) -> Result<()> {
        self.persist(edit).await?;
        overrides.apply(edit);
        Ok(())
    }

    async fn put(&self, category: &str, key: &str, value: &str) -> Result<()> {
        log::debug!("Storing {} {} = {:?}", category, key, value);
        sqlx::query(
            "INSERT INTO overrides (category, key, value) VALUES (?, ?, ?)
             ON CONFLICT (category, key) DO UPDATE SET value = excluded.value",
        )
        .bind(category)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, category: &str, key: &str) -> Result<()> {
        log::debug!("Removing {} {}", category, key);
        sqlx::query("DELETE FROM overrides WHERE category = ? AND key = ?")
            .bind(category)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn add_expense(
        &self,
        day: Option<DayId>,
        category: ExpenseCategory,
        description: &str,
        amount: f64,
    ) -> Result<Expense> {
        if !amount.is_finite() {
            anyhow::bail!("Expense amount must be a finite number");
        }
        let recorded_at = chrono::Utc::now();
        let result = sqlx::query(
            "INSERT INTO expenses (day, category, description, amount, recorded_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(day.as_ref().map(DayId::as_str))
        .bind(category.as_str())
        .bind(description)
        .bind(amount)
        .bind(recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(Expense {
            id: result.last_insert_rowid(),
            day,
            category,
            description: description.to_string(),
            amount,
            recorded_at,
        })
    }

    pub async fn remove_expense(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn load_expenses(&self) -> Result<Vec<Expense>> {
        let mut expenses = vec![];
        let mut rows = sqlx::query_as::<_, (i64, Option<String>, String, String, f64, String)>(
            "SELECT id, day, category, description, amount, recorded_at FROM expenses ORDER BY id",
        )
        .fetch(&self.pool);

        while let Some((id, day, category, description, amount, recorded_at)) =
            rows.try_next().await?
        {
            let category = match category.parse::<ExpenseCategory>() {
                Ok(category) => category,
                Err(err) => {
                    log::warn!("Skipping expense {}: {}", id, err);
                    continue;
                }
            };
            let recorded_at = match chrono::DateTime::parse_from_rfc3339(&recorded_at) {
                Ok(time) => time.with_timezone(&chrono::Utc),
                Err(err) => {
                    log::warn!("Skipping expense {}: {}", id, err);
                    continue;
                }
            };
            expenses.push(Expense {
                id,
                day: day.as_deref().map(DayId::new),
                category,
                description,
                amount,
                recorded_at,
            });
        }
        Ok(expenses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn edits_survive_reload() {
        let store = OverrideStore::in_memory().await.unwrap();
        let mut overrides = Overrides::default();
        let stop = StopId::new("d1-s0");
        let edits = [
            OverrideEdit::DayStart {
                day: DayId::new("d1"),
                time: "08:30".to_string(),
            },
            OverrideEdit::Stay {
                stop,
                duration: "45 min".to_string(),
            },
            OverrideEdit::Mode {
                stop,
                mode: TransportMode::Walk,
            },
            OverrideEdit::Tickets {
                stop,
                count: TicketCount { adult: 2, child: 2 },
            },
            OverrideEdit::ConfirmDeparture {
                stop,
                time: "09:10".to_string(),
            },
        ];
        for edit in &edits {
            store.apply(&mut overrides, edit).await.unwrap();
        }

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, overrides);
        assert_eq!(loaded.stay_for(stop), "45 min");
    }

    #[tokio::test]
    async fn later_writes_replace_earlier_ones() {
        let store = OverrideStore::in_memory().await.unwrap();
        let stop = StopId::new("d2-s1");
        let mut overrides = Overrides::default();
        for duration in ["1 hr", "3 hr"] {
            let edit = OverrideEdit::Stay {
                stop,
                duration: duration.to_string(),
            };
            store.apply(&mut overrides, &edit).await.unwrap();
        }
        store
            .apply(
                &mut overrides,
                &OverrideEdit::ConfirmDeparture {
                    stop,
                    time: "12:00".to_string(),
                },
            )
            .await
            .unwrap();
        store
            .apply(&mut overrides, &OverrideEdit::ClearDeparture { stop })
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.stay_for(stop), "3 hr");
        assert_eq!(loaded.departure_for(stop), None);
    }

    #[tokio::test]
    async fn corrupt_rows_are_skipped() {
        let store = OverrideStore::in_memory().await.unwrap();
        store.put(TRANSPORT_MODE, "d1-s0", "bike").await.unwrap();
        store.put("currency", "d1-s0", "TWD").await.unwrap();
        store.put(STAY, "d1-s0", "2 hr").await.unwrap();

        let loaded = store.load().await.unwrap();
        assert!(loaded.transport_mode.is_empty());
        assert_eq!(loaded.stay_for(StopId::new("d1-s0")), "2 hr");
    }

    #[tokio::test]
    async fn expense_ledger() {
        let store = OverrideStore::in_memory().await.unwrap();
        let lunch = store
            .add_expense(Some(DayId::new("d1")), ExpenseCategory::Food, "Ramen", 1200.0)
            .await
            .unwrap();
        store
            .add_expense(None, ExpenseCategory::Lodging, "Hotel", 15000.0)
            .await
            .unwrap();

        let expenses = store.load_expenses().await.unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].description, "Ramen");
        assert_eq!(expenses[0].day, Some(DayId::new("d1")));
        assert_eq!(expenses[1].day, None);

        assert!(store.remove_expense(lunch.id).await.unwrap());
        assert!(!store.remove_expense(lunch.id).await.unwrap());
        assert_eq!(store.load_expenses().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_non_finite_amounts() {
        let store = OverrideStore::in_memory().await.unwrap();
        assert!(store
            .add_expense(None, ExpenseCategory::Other, "?", f64::NAN)
            .await
            .is_err());
    }
}
