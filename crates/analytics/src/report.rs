use configuration::ComparisonBasis;
use core_types::MonthKey;
use serde::Serialize;

/// Annualized description of one monthly return series.
///
/// Mean and volatility are in percentage points per year. Values that cannot
/// be estimated from the series (too few months, zero variance) are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub annualized_mean: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: Option<f64>,
    pub skewness: Option<f64>,
    pub excess_kurtosis: Option<f64>,
}

/// The final output of the `AnalyticsEngine`: the replicated series set
/// against the published reference over their common months.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub basis: ComparisonBasis,
    pub observations: usize,
    pub first_month: MonthKey,
    pub last_month: MonthKey,
    pub reference: SummaryStatistics,
    pub replicated: SummaryStatistics,
    pub correlation: Option<f64>,
    /// In fractional monthly return units.
    pub max_abs_difference: f64,
}
