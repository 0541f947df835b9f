pub mod calendar;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use calendar::{MonthKey, SampleWindow, month_end};
pub use error::CoreError;
pub use structs::{
    DelistingEvent, EnrichedSecurityMonth, MonthlyMarketReturn, PanelRow, RawDelisting,
    RawFactorRow, RawSecurityMonth, RawTables, ReferenceFactorRow, SecurityObservation,
};
