//! # Market Aggregator
//!
//! Collapses the analysis panel into one value-weighted and one
//! equal-weighted market excess return per calendar month.
//!
//! Only months present in both the panel and the reference series are
//! produced; a month missing from either side is skipped without error.

pub mod error;

use core_types::{MonthKey, MonthlyMarketReturn, PanelRow, ReferenceFactorRow};
use std::collections::{BTreeMap, HashMap};

pub use error::AggregationError;

/// Running sums for one calendar month of the panel.
#[derive(Debug, Clone, Copy, Default)]
struct MonthAccumulator {
    lagged_value: f64,
    lagged_value_grown: f64,
    return_sum: f64,
    constituents: usize,
}

impl MonthAccumulator {
    fn add(&mut self, row: &PanelRow) {
        self.lagged_value += row.lagged_market_value;
        self.lagged_value_grown += row.lagged_market_value * (1.0 + row.total_return);
        self.return_sum += row.total_return;
        self.constituents += 1;
    }

    fn finish(self, month: MonthKey, risk_free: f64) -> Result<MonthlyMarketReturn, AggregationError> {
        if !(self.lagged_value > 0.0 && self.lagged_value.is_finite()) {
            return Err(AggregationError::DegenerateWeights {
                month,
                total: self.lagged_value,
            });
        }

        let value_weighted =
            (self.lagged_value_grown - self.lagged_value) / self.lagged_value;
        let equal_weighted = self.return_sum / self.constituents as f64;

        Ok(MonthlyMarketReturn {
            month,
            value_weighted_excess: value_weighted - risk_free,
            equal_weighted_excess: equal_weighted - risk_free,
            total_lagged_market_value: self.lagged_value,
            constituents: self.constituents,
        })
    }
}

/// Computes the monthly market excess returns.
///
/// The panel is partitioned by month in one pass, so the cost is linear in
/// the number of panel rows. Output is in chronological order and does not
/// depend on the order of `panel`.
///
/// # Errors
///
/// `DegenerateWeights` if a retained month's lagged market values do not sum
/// to a positive, finite number.
pub fn aggregate_market(
    panel: &[PanelRow],
    reference: &[ReferenceFactorRow],
) -> Result<Vec<MonthlyMarketReturn>, AggregationError> {
    let mut by_month: BTreeMap<MonthKey, MonthAccumulator> = BTreeMap::new();
    for row in panel {
        by_month.entry(row.key()).or_default().add(row);
    }

    let risk_free: HashMap<MonthKey, f64> = reference
        .iter()
        .map(|row| (row.month, row.risk_free))
        .collect();

    let mut monthly = Vec::with_capacity(by_month.len().min(risk_free.len()));
    for (month, accumulator) in by_month.iter() {
        let Some(&rf) = risk_free.get(month) else {
            continue;
        };
        let result = accumulator.finish(*month, rf)?;
        tracing::debug!(
            month = %month,
            constituents = result.constituents,
            vw = result.value_weighted_excess,
            ew = result.equal_weighted_excess,
            "Aggregated month."
        );
        monthly.push(result);
    }

    tracing::info!(
        months = monthly.len(),
        panel_only = by_month.len() - monthly.len(),
        reference_only = risk_free.len() - monthly.len(),
        "Aggregated market returns."
    );

    Ok(monthly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn panel_row(id: i64, month: u32, lag: f64, ret: f64) -> PanelRow {
        PanelRow {
            security_id: id,
            year: 2000,
            month,
            price: None,
            shares_outstanding: None,
            lagged_market_value: lag,
            total_return: ret,
        }
    }

    fn reference_row(month: u32, rf: f64) -> ReferenceFactorRow {
        ReferenceFactorRow {
            month: MonthKey::new(2000, month).unwrap(),
            date: NaiveDate::from_ymd_opt(2000, month, 1).unwrap(),
            market_minus_riskfree: 0.0,
            size: None,
            value: None,
            risk_free: rf,
        }
    }

    /// Three securities over four months; month 1 has no lag so no rows.
    fn synthetic_panel() -> Vec<PanelRow> {
        vec![
            panel_row(1, 2, 100.0, 0.05),
            panel_row(2, 2, 300.0, -0.02),
            panel_row(3, 2, 600.0, 0.01),
            panel_row(1, 3, 105.0, 0.00),
            panel_row(2, 3, 294.0, 0.03),
            panel_row(3, 3, 606.0, -0.04),
            panel_row(1, 4, 105.0, 0.02),
            panel_row(2, 4, 302.82, 0.01),
        ]
    }

    fn synthetic_reference() -> Vec<ReferenceFactorRow> {
        (1..=4).map(|m| reference_row(m, 0.001 * m as f64)).collect()
    }

    #[test]
    fn value_weighted_matches_hand_computation() {
        let monthly = aggregate_market(&synthetic_panel(), &synthetic_reference()).unwrap();
        assert_eq!(monthly.len(), 3);

        // Month 2: weights 100/300/600, rf = 0.002.
        let lag: f64 = 100.0 + 300.0 + 600.0;
        let grown = 100.0 * 1.05 + 300.0 * 0.98 + 600.0 * 1.01;
        let expected_vw = (grown - lag) / lag - 0.002;
        let expected_ew = (0.05 - 0.02 + 0.01) / 3.0 - 0.002;

        let feb = &monthly[0];
        assert_eq!(feb.month, MonthKey::new(2000, 2).unwrap());
        assert_abs_diff_eq!(feb.value_weighted_excess, expected_vw, epsilon = 1e-9);
        assert_abs_diff_eq!(feb.value_weighted_excess, 0.0050 - 0.002, epsilon = 1e-9);
        assert_abs_diff_eq!(feb.equal_weighted_excess, expected_ew, epsilon = 1e-9);
        assert_abs_diff_eq!(feb.total_lagged_market_value, 1000.0, epsilon = 1e-9);
        assert_eq!(feb.constituents, 3);

        // Month 4: two constituents only.
        let apr = &monthly[2];
        let lag = 105.0 + 302.82;
        let expected = (105.0 * 1.02 + 302.82 * 1.01 - lag) / lag - 0.004;
        assert_abs_diff_eq!(apr.value_weighted_excess, expected, epsilon = 1e-9);
        assert_eq!(apr.constituents, 2);
    }

    #[test]
    fn row_order_does_not_matter() {
        let reference = synthetic_reference();
        let forward = aggregate_market(&synthetic_panel(), &reference).unwrap();

        let mut shuffled = synthetic_panel();
        shuffled.reverse();
        shuffled.swap(0, 4);
        let backward = aggregate_market(&shuffled, &reference).unwrap();

        assert_eq!(forward.len(), backward.len());
        for (a, b) in forward.iter().zip(&backward) {
            assert_eq!(a.month, b.month);
            assert_abs_diff_eq!(a.value_weighted_excess, b.value_weighted_excess, epsilon = 1e-12);
            assert_abs_diff_eq!(a.equal_weighted_excess, b.equal_weighted_excess, epsilon = 1e-12);
        }
    }

    #[test]
    fn months_missing_from_either_side_are_skipped() {
        // Reference has months 1..=4 but the panel has nothing for month 1;
        // the panel has month 5 which the reference lacks.
        let mut panel = synthetic_panel();
        panel.push(panel_row(1, 5, 107.1, 0.01));

        let monthly = aggregate_market(&panel, &synthetic_reference()).unwrap();
        let months: Vec<u32> = monthly.iter().map(|m| m.month.month).collect();
        assert_eq!(months, vec![2, 3, 4]);
    }

    #[test]
    fn zero_total_weight_is_an_error() {
        let panel = vec![panel_row(1, 2, 0.0, 0.05), panel_row(2, 2, 0.0, 0.01)];
        let result = aggregate_market(&panel, &synthetic_reference());
        assert_eq!(
            result,
            Err(AggregationError::DegenerateWeights {
                month: MonthKey::new(2000, 2).unwrap(),
                total: 0.0
            })
        );
    }

    #[test]
    fn zero_weight_month_outside_reference_is_ignored() {
        let panel = vec![panel_row(1, 9, 0.0, 0.05)];
        let monthly = aggregate_market(&panel, &synthetic_reference()).unwrap();
        assert!(monthly.is_empty());
    }
}
