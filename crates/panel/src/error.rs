use core_types::MonthKey;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PanelError {
    #[error("Column '{field}' holds {value}, which is not an integer identifier")]
    InvalidIdentifier { field: &'static str, value: f64 },

    #[error("Column '{field}' holds {value}, which is not an integer code")]
    InvalidCode { field: &'static str, value: f64 },

    #[error("Reference series has more than one row for {0}")]
    DuplicateReferenceMonth(MonthKey),
}
