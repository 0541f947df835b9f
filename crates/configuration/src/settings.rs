use crate::error::ConfigError;
use chrono::NaiveDate;
use core_types::SampleWindow;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const FIRST_MONTH: NaiveDate = match NaiveDate::from_ymd_opt(1926, 1, 1) {
    Some(date) => date,
    None => panic!("invalid default start date"),
};
const CUTOFF_MONTH: NaiveDate = match NaiveDate::from_ymd_opt(2022, 12, 31) {
    Some(date) => date,
    None => panic!("invalid default end date"),
};

/// The root configuration structure for a replication run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub sample: Sample,
    pub universe: Universe,
    pub source: Source,
    pub comparison: Comparison,
    pub logging: Logging,
}

/// The historical window every fetch is bounded to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Sample {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            start_date: FIRST_MONTH,
            end_date: CUTOFF_MONTH,
        }
    }
}

/// Which securities enter the market portfolio.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Universe {
    /// Share codes treated as ordinary common stock.
    pub share_codes: Vec<i32>,
    /// Primary listing venues (NYSE, AMEX, NASDAQ).
    pub exchange_codes: Vec<i32>,
}

impl Default for Universe {
    fn default() -> Self {
        Self {
            share_codes: vec![10, 11],
            exchange_codes: vec![1, 2, 3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Postgres,
    Csv,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Source {
    pub kind: SourceKind,
    /// Directory holding `security_months.csv`, `delistings.csv` and `factors.csv`.
    pub csv_dir: Option<PathBuf>,
    pub tables: Tables,
}

/// Fully qualified table names queried by the Postgres source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Tables {
    pub security_months: String,
    pub security_names: String,
    pub delistings: String,
    pub factors: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            security_months: "crsp.msf".to_string(),
            security_names: "crsp.msenames".to_string(),
            delistings: "crsp.msedelist".to_string(),
            factors: "ff.factors_monthly".to_string(),
        }
    }
}

/// Which pair of series the comparator lines up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ComparisonBasis {
    /// Reference market return (mkt-rf + rf) against the replicated
    /// value-weighted return.
    #[default]
    Total,
    /// Reference mkt-rf against the replicated value-weighted excess return.
    Excess,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Comparison {
    pub basis: ComparisonBasis,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, a daily-rolling log file is written here as well.
    pub directory: Option<PathBuf>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl Settings {
    pub fn window(&self) -> Result<SampleWindow, ConfigError> {
        SampleWindow::new(self.sample.start_date, self.sample.end_date)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window()?;

        if self.universe.share_codes.is_empty() {
            return Err(ConfigError::ValidationError(
                "universe.share_codes must not be empty".to_string(),
            ));
        }
        if self.universe.exchange_codes.is_empty() {
            return Err(ConfigError::ValidationError(
                "universe.exchange_codes must not be empty".to_string(),
            ));
        }

        match self.source.kind {
            SourceKind::Csv if self.source.csv_dir.is_none() => {
                return Err(ConfigError::ValidationError(
                    "source.csv_dir is required when source.kind = \"csv\"".to_string(),
                ));
            }
            SourceKind::Csv => {}
            SourceKind::Postgres => {
                let tables = &self.source.tables;
                for name in [
                    &tables.security_months,
                    &tables.security_names,
                    &tables.delistings,
                    &tables.factors,
                ] {
                    if !is_table_identifier(name) {
                        return Err(ConfigError::ValidationError(format!(
                            "'{name}' is not a valid table name"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Accepts `table` or `schema.table`, each part an unquoted SQL identifier.
/// Table names are interpolated into query text.
pub fn is_table_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return false;
    }
    parts.iter().all(|part| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_full_history() {
        let settings = Settings::default();
        assert_eq!(settings.sample.start_date, FIRST_MONTH);
        assert_eq!(settings.sample.end_date, CUTOFF_MONTH);
        assert_eq!(settings.universe.share_codes, vec![10, 11]);
        assert_eq!(settings.universe.exchange_codes, vec![1, 2, 3]);
        assert_eq!(settings.comparison.basis, ComparisonBasis::Total);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn table_identifiers() {
        assert!(is_table_identifier("crsp.msf"));
        assert!(is_table_identifier("factors_monthly"));
        assert!(!is_table_identifier("crsp.msf; drop table x"));
        assert!(!is_table_identifier("a.b.c"));
        assert!(!is_table_identifier("1abc"));
        assert!(!is_table_identifier(""));
    }

    #[test]
    fn csv_source_requires_directory() {
        let mut settings = Settings::default();
        settings.source.kind = SourceKind::Csv;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ValidationError(_))
        ));
        settings.source.csv_dir = Some(PathBuf::from("data"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_window_and_empty_universe() {
        let mut settings = Settings::default();
        settings.sample.start_date = CUTOFF_MONTH;
        settings.sample.end_date = FIRST_MONTH;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.universe.exchange_codes.clear();
        assert!(settings.validate().is_err());
    }
}
