//! # Data Acquisition
//!
//! Fetches the three raw tables a replication run starts from: the monthly
//! security file (joined with share/exchange classification), the delisting
//! file, and the published reference factors.
//!
//! ## Public API
//!
//! - `RawDataSource`: the seam between the pipeline and wherever the data lives.
//! - `PostgresSource`: WRDS-style PostgreSQL. Holds a connection only for the
//!   duration of `fetch_raw_tables`.
//! - `CsvSource`: the same three tables as CSV extracts in one directory.
//! - `SourceError`: connection, query, schema and file errors. All are fatal.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod csv_source;
pub mod error;
pub mod repository;

use async_trait::async_trait;
use core_types::{RawTables, SampleWindow};

// Re-export the key components to create a clean, public-facing API.
pub use connection::connect;
pub use csv_source::CsvSource;
pub use error::SourceError;
pub use repository::PostgresSource;

/// Anything that can produce the raw tables for a sample window.
///
/// Implementations must not hold external resources once the call returns.
#[async_trait]
pub trait RawDataSource: Send + Sync {
    async fn fetch_raw_tables(&self, window: &SampleWindow) -> Result<RawTables, SourceError>;
}
