use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

use crate::data::derive::CurrencyRate;

/// Tunables for the aggregations. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Prices are normalised into this currency.
    pub reference_currency: String,
    /// Multiplier applied to every non-reference price.
    pub exchange_rate: f64,
    /// How many entries the top-N rankings keep.
    pub top_n: usize,
    /// Separator inside multi-valued cells such as `market_regions`.
    pub region_delimiter: String,
    /// First and last release year of the price trend series.
    pub trend_years: (i32, i32),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            reference_currency: "GBP".to_string(),
            exchange_rate: 0.85,
            top_n: 5,
            region_delimiter: ", ".to_string(),
            trend_years: (2020, 2023),
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AnalysisConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!("using analysis config from {}", path.display());
        Ok(config)
    }

    pub fn currency_rate(&self) -> CurrencyRate {
        CurrencyRate {
            reference: self.reference_currency.clone(),
            rate: self.exchange_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, r#"{{"top_n": 3, "trend_years": [2021, 2022]}}"#).unwrap();

        let config = AnalysisConfig::from_file(tmp.path()).unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.trend_years, (2021, 2022));
        assert_eq!(config.reference_currency, "GBP");
        assert_eq!(config.exchange_rate, 0.85);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        assert!(AnalysisConfig::from_file(Path::new("/no/such/config.json")).is_err());
    }
}
