use crate::error::AnalyticsError;
use crate::report::{ComparisonReport, SummaryStatistics};
use crate::statistics::{
    ANNUALIZED_MEAN_SCALE, MONTHS_PER_YEAR, excess_kurtosis, max_abs_difference, mean,
    pearson_correlation, sample_std, skewness,
};
use configuration::ComparisonBasis;
use core_types::{MonthKey, MonthlyMarketReturn, ReferenceFactorRow};
use std::collections::HashMap;

/// The two monthly series lined up on their common months.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub months: Vec<MonthKey>,
    pub reference: Vec<f64>,
    pub replicated: Vec<f64>,
}

/// A stateless calculator comparing the replicated market return with the
/// published reference.
#[derive(Debug, Default)]
pub struct AnalyticsEngine {
    basis: ComparisonBasis,
}

impl AnalyticsEngine {
    pub fn new(basis: ComparisonBasis) -> Self {
        Self { basis }
    }

    /// Inner join on calendar month, in chronological order.
    pub fn align(
        &self,
        replicated: &[MonthlyMarketReturn],
        reference: &[ReferenceFactorRow],
    ) -> AlignedSeries {
        let by_month: HashMap<MonthKey, &ReferenceFactorRow> =
            reference.iter().map(|row| (row.month, row)).collect();

        let mut pairs: Vec<(MonthKey, f64, f64)> = replicated
            .iter()
            .filter_map(|ours| {
                let theirs = by_month.get(&ours.month)?;
                Some(match self.basis {
                    ComparisonBasis::Excess => (
                        ours.month,
                        theirs.market_minus_riskfree,
                        ours.value_weighted_excess,
                    ),
                    ComparisonBasis::Total => (
                        ours.month,
                        theirs.market_return(),
                        ours.value_weighted_excess + theirs.risk_free,
                    ),
                })
            })
            .collect();
        pairs.sort_by_key(|(month, _, _)| *month);

        let mut aligned = AlignedSeries {
            months: Vec::with_capacity(pairs.len()),
            reference: Vec::with_capacity(pairs.len()),
            replicated: Vec::with_capacity(pairs.len()),
        };
        for (month, theirs, ours) in pairs {
            aligned.months.push(month);
            aligned.reference.push(theirs);
            aligned.replicated.push(ours);
        }
        aligned
    }

    /// The main entry point: aligns both series and computes the report.
    ///
    /// # Errors
    ///
    /// `NotEnoughData` when fewer than two months are common to both series.
    pub fn compare(
        &self,
        replicated: &[MonthlyMarketReturn],
        reference: &[ReferenceFactorRow],
    ) -> Result<ComparisonReport, AnalyticsError> {
        let aligned = self.align(replicated, reference);

        let (Some(&first_month), Some(&last_month)) =
            (aligned.months.first(), aligned.months.last())
        else {
            return Err(AnalyticsError::NotEnoughData(
                "no month is common to the replicated and reference series".to_string(),
            ));
        };
        if aligned.months.len() < 2 {
            return Err(AnalyticsError::NotEnoughData(format!(
                "only {first_month} is common to both series; at least two months are required"
            )));
        }

        let report = ComparisonReport {
            basis: self.basis,
            observations: aligned.months.len(),
            first_month,
            last_month,
            reference: summarize(&aligned.reference)?,
            replicated: summarize(&aligned.replicated)?,
            correlation: pearson_correlation(&aligned.reference, &aligned.replicated),
            max_abs_difference: max_abs_difference(&aligned.reference, &aligned.replicated)
                .ok_or_else(|| AnalyticsError::NotEnoughData("empty aligned series".to_string()))?,
        };

        tracing::info!(
            months = report.observations,
            first = %report.first_month,
            last = %report.last_month,
            correlation = ?report.correlation,
            "Compared replicated series with reference."
        );

        Ok(report)
    }
}

/// Annualizes a monthly series of fractional returns.
pub fn summarize(monthly: &[f64]) -> Result<SummaryStatistics, AnalyticsError> {
    let (Some(monthly_mean), Some(monthly_std)) = (mean(monthly), sample_std(monthly)) else {
        return Err(AnalyticsError::NotEnoughData(format!(
            "{} monthly observations; at least two are required",
            monthly.len()
        )));
    };

    let annualized_mean = monthly_mean * ANNUALIZED_MEAN_SCALE;
    let annualized_volatility = monthly_std * 100.0 * MONTHS_PER_YEAR.sqrt();
    let sharpe_ratio = (annualized_volatility > 0.0).then(|| annualized_mean / annualized_volatility);

    Ok(SummaryStatistics {
        annualized_mean,
        annualized_volatility,
        sharpe_ratio,
        skewness: skewness(monthly),
        excess_kurtosis: excess_kurtosis(monthly),
    })
}
