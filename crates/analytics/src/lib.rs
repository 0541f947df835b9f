//! # Replication Analytics
//!
//! Judges how closely the replicated market series tracks the published one.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O. Depends only on `core-types` for its inputs and on
//!   `configuration` for the comparison basis.
//! - **Stateless calculation:** `AnalyticsEngine` takes the monthly series and
//!   produces a `ComparisonReport`. All numbers keep full precision; rounding
//!   belongs to presentation.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: month alignment and the comparison itself.
//! - `ComparisonReport` / `SummaryStatistics`: the results.
//! - `statistics`: the underlying estimators.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;
pub mod statistics;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{AlignedSeries, AnalyticsEngine, summarize};
pub use error::AnalyticsError;
pub use report::{ComparisonReport, SummaryStatistics};
