use core_types::MonthKey;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AggregationError {
    #[error("Total lagged market value for {month} is {total}; value weights are undefined")]
    DegenerateWeights { month: MonthKey, total: f64 },
}
