use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyOption {
    pub code: String,
    pub symbol: String,
    /// Display units per unit of the base currency.
    pub rate: f64,
}

impl CurrencyOption {
    pub fn convert(&self, base_amount: f64) -> f64 {
        base_amount * self.rate
    }

    pub fn format(&self, base_amount: f64) -> String {
        let amount = self.convert(base_amount);
        if amount.fract().abs() < 1e-9 {
            format!("{}{:.0}", self.symbol, amount)
        } else {
            format!("{}{:.2}", self.symbol, amount)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub base: CurrencyOption,
    #[serde(default)]
    pub display: Vec<CurrencyOption>,
}

impl CurrencyConfig {
    pub fn option(&self, code: &str) -> Option<&CurrencyOption> {
        std::iter::once(&self.base)
            .chain(self.display.iter())
            .find(|option| option.code.eq_ignore_ascii_case(code))
    }
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        CurrencyConfig {
            base: CurrencyOption {
                code: "JPY".to_string(),
                symbol: "¥".to_string(),
                rate: 1.0,
            },
            display: vec![
                CurrencyOption {
                    code: "TWD".to_string(),
                    symbol: "NT$".to_string(),
                    rate: 0.21,
                },
                CurrencyOption {
                    code: "USD".to_string(),
                    symbol: "$".to_string(),
                    rate: 0.0067,
                },
            ],
        }
    }
}

/// Static tables the planner needs, handed to each component explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub stay_options: Vec<String>,
    pub currency: CurrencyConfig,
    pub database_path: PathBuf,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            stay_options: ["-", "30 min", "1 hr", "1.5 hr", "2 hr", "3 hr", "Overnight"]
                .into_iter()
                .map(String::from)
                .collect(),
            currency: CurrencyConfig::default(),
            database_path: PathBuf::from("trip_planner.sqlite"),
        }
    }
}

impl PlannerConfig {
    pub fn is_stay_option(&self, duration: &str) -> bool {
        self.stay_options.iter().any(|option| option == duration)
    }

    pub fn from_json(text: &str) -> Result<PlannerConfig> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<PlannerConfig> {
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(PlannerConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        PlannerConfig::from_json(&text).with_context(|| format!("Invalid config {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = PlannerConfig::from_json(r#"{"database_path": "trip.db"}"#).unwrap();
        assert_eq!(config.database_path, PathBuf::from("trip.db"));
        assert!(config.is_stay_option("1.5 hr"));
        assert!(config.is_stay_option("Overnight"));
        assert!(!config.is_stay_option("4 hr"));
        assert_eq!(config.currency.base.code, "JPY");
    }

    #[test]
    fn currency_lookup_and_format() {
        let currency = CurrencyConfig::default();
        let twd = currency.option("twd").unwrap();
        assert_eq!(twd.format(1000.0), "NT$210");
        assert_eq!(currency.option("JPY").unwrap().format(1500.0), "¥1500");
        assert_eq!(currency.option("USD").unwrap().format(1000.0), "$6.70");
        assert!(currency.option("EUR").is_none());
    }
}
