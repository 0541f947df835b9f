//! # Security Panel Construction
//!
//! Turns the raw security and delisting tables into the analysis panel the
//! market aggregator consumes.
//!
//! - `cleaner`: integer identifiers, month-end dates, absolute prices, sorted tables.
//! - `compositor`: full outer join with delistings, total returns, market
//!   values and one-month lagged market values from a single linear scan.
//! - `filter`: share-class and exchange restriction plus projection to `PanelRow`.
//!
//! Every function takes its input table and returns a new one.

pub mod cleaner;
pub mod compositor;
pub mod error;
pub mod filter;

pub use cleaner::{clean_delistings, clean_reference, clean_security_months};
pub use compositor::{compose_returns, total_return};
pub use error::PanelError;
pub use filter::UniverseFilter;
