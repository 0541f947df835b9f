use crate::error::SourceError;
use crate::RawDataSource;
use async_trait::async_trait;
use core_types::{RawDelisting, RawFactorRow, RawSecurityMonth, RawTables, SampleWindow};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub const SECURITY_MONTHS_FILE: &str = "security_months.csv";
pub const DELISTINGS_FILE: &str = "delistings.csv";
pub const FACTORS_FILE: &str = "factors.csv";

/// Reads the raw tables from CSV extracts with a header row whose column
/// names match the database columns (`permno`, `permco`, `date`, ...).
/// Empty fields are read as missing values.
#[derive(Debug, Clone)]
pub struct CsvSource {
    directory: PathBuf,
}

impl CsvSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl RawDataSource for CsvSource {
    async fn fetch_raw_tables(&self, window: &SampleWindow) -> Result<RawTables, SourceError> {
        let security_months: Vec<RawSecurityMonth> =
            read_table(&self.directory.join(SECURITY_MONTHS_FILE))?
                .into_iter()
                .filter(|row: &RawSecurityMonth| window.contains(row.date))
                .collect();
        tracing::info!(rows = security_months.len(), "Loaded security months.");

        let delistings: Vec<RawDelisting> = read_table(&self.directory.join(DELISTINGS_FILE))?
            .into_iter()
            .filter(|row: &RawDelisting| window.contains(row.dlstdt))
            .collect();
        tracing::info!(rows = delistings.len(), "Loaded delisting events.");

        let factors: Vec<RawFactorRow> = read_table(&self.directory.join(FACTORS_FILE))?
            .into_iter()
            .filter(|row: &RawFactorRow| window.contains(row.date))
            .collect();
        tracing::info!(rows = factors.len(), "Loaded reference factors.");

        Ok(RawTables {
            security_months,
            delistings,
            factors,
        })
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SourceError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|e| csv_error(path, e))
}

/// A value that does not deserialize into its column type is a schema problem.
fn csv_error(path: &Path, error: csv::Error) -> SourceError {
    if let csv::ErrorKind::Deserialize { .. } = error.kind() {
        return SourceError::SchemaError {
            table: path.display().to_string(),
            message: error.to_string(),
        };
    }
    SourceError::CsvError {
        path: path.to_path_buf(),
        source: error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    fn window() -> SampleWindow {
        SampleWindow::new(
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(1990, 12, 31).unwrap(),
        )
        .unwrap()
    }

    fn write_fixture(dir: &Path, security_months: &str) {
        fs::write(dir.join(SECURITY_MONTHS_FILE), security_months).unwrap();
        fs::write(
            dir.join(DELISTINGS_FILE),
            "permno,dlret,dlstdt,dlstcd\n10001,-0.5,1990-02-15,550\n10002,,1991-03-10,100\n",
        )
        .unwrap();
        fs::write(
            dir.join(FACTORS_FILE),
            "date,mktrf,smb,hml,rf\n1989-12-01,0.01,,,0.006\n1990-01-01,-0.0785,0.0127,0.0087,0.0057\n",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn loads_all_three_tables_within_window() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(
            dir.path(),
            "permno,permco,date,shrcd,exchcd,ret,shrout,prc,cfacpr,cfacshr\n\
             10001,7953,1990-01-31,11,1,0.02,1000,-12.5,1,1\n\
             10001,7953,1990-02-28,11,1,,1000,12.0,,\n\
             10001,7953,1991-01-31,11,1,0.01,1000,12.0,1,1\n",
        );

        let tables = CsvSource::new(dir.path())
            .fetch_raw_tables(&window())
            .await
            .unwrap();

        assert_eq!(tables.security_months.len(), 2);
        assert_eq!(tables.security_months[0].prc, Some(-12.5));
        assert_eq!(tables.security_months[1].ret, None);
        assert_eq!(tables.delistings.len(), 1);
        assert_eq!(tables.delistings[0].dlret, Some(-0.5));
        assert_eq!(tables.factors.len(), 1);
        assert_eq!(tables.factors[0].smb, Some(0.0127));
    }

    #[tokio::test]
    async fn non_numeric_identifier_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(
            dir.path(),
            "permno,permco,date,shrcd,exchcd,ret,shrout,prc,cfacpr,cfacshr\n\
             ABC,7953,1990-01-31,11,1,0.02,1000,12.5,1,1\n",
        );

        let result = CsvSource::new(dir.path()).fetch_raw_tables(&window()).await;
        assert!(matches!(result, Err(SourceError::SchemaError { .. })));
    }

    #[tokio::test]
    async fn missing_file_is_reported_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = CsvSource::new(dir.path()).fetch_raw_tables(&window()).await;
        match result {
            Err(SourceError::CsvError { path, .. }) => {
                assert!(path.ends_with(SECURITY_MONTHS_FILE));
            }
            other => panic!("expected a CSV error, got {other:?}"),
        }
    }
}
