use crate::settings::{ComparisonBasis, Settings, SourceKind};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Command-line flags that take precedence over the file and environment.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// First date of the sample window (format: YYYY-MM-DD).
    #[arg(long, global = true)]
    pub start: Option<NaiveDate>,

    /// Last date of the sample window (format: YYYY-MM-DD).
    #[arg(long, global = true)]
    pub end: Option<NaiveDate>,

    /// Where the raw tables come from.
    #[arg(long, value_enum, global = true)]
    pub source: Option<SourceKind>,

    /// Directory with the CSV extracts (implies `--source csv`).
    #[arg(long, global = true)]
    pub csv_dir: Option<PathBuf>,

    /// Which pair of series to compare.
    #[arg(long, value_enum, global = true)]
    pub basis: Option<ComparisonBasis>,
}

impl Settings {
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(start) = overrides.start {
            self.sample.start_date = start;
        }
        if let Some(end) = overrides.end {
            self.sample.end_date = end;
        }
        if let Some(kind) = overrides.source {
            self.source.kind = kind;
        }
        if let Some(dir) = overrides.csv_dir {
            self.source.kind = SourceKind::Csv;
            self.source.csv_dir = Some(dir);
        }
        if let Some(basis) = overrides.basis {
            self.comparison.basis = basis;
        }
    }
}
