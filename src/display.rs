use analytics::{ComparisonReport, SummaryStatistics};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, ContentArrangement, Table};
use core_types::MonthlyMarketReturn;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

const SUMMARY_DECIMALS: u32 = 2;
const AGREEMENT_DECIMALS: u32 = 4;
const SERIES_DECIMALS: u32 = 6;

/// Formats `value` with exactly `decimals` places, rounding half to even.
/// Missing or non-finite values print as "n/a".
pub fn fixed(value: Option<f64>, decimals: u32) -> String {
    match value.and_then(Decimal::from_f64) {
        Some(decimal) => format!("{:.*}", decimals as usize, decimal.round_dp(decimals)),
        None => "n/a".to_string(),
    }
}

/// The five-row statistics table, reference column first.
pub fn summary_table(report: &ComparisonReport) -> Table {
    let rows: [(&str, fn(&SummaryStatistics) -> Option<f64>); 5] = [
        ("Mean", |s| Some(s.annualized_mean)),
        ("Volatility", |s| Some(s.annualized_volatility)),
        ("Sharpe Ratio", |s| s.sharpe_ratio),
        ("Skewness", |s| s.skewness),
        ("Kurtosis", |s| s.excess_kurtosis),
    ];

    let mut table = new_table(vec!["", "Reference", "Replicated"]);
    for (label, metric) in rows {
        table.add_row(vec![
            label.to_string(),
            fixed(metric(&report.reference), SUMMARY_DECIMALS),
            fixed(metric(&report.replicated), SUMMARY_DECIMALS),
        ]);
    }
    table
}

/// The two-row agreement table.
pub fn agreement_table(report: &ComparisonReport) -> Table {
    let mut table = new_table(vec!["", "Value"]);
    table.add_row(vec![
        "Correlation".to_string(),
        fixed(report.correlation, AGREEMENT_DECIMALS),
    ]);
    table.add_row(vec![
        "Max Abs Difference".to_string(),
        fixed(Some(report.max_abs_difference), AGREEMENT_DECIMALS),
    ]);
    table
}

pub fn print_comparison(report: &ComparisonReport) {
    println!(
        "Replicated vs. reference market return, {} to {} ({} months, {:?} basis)",
        report.first_month, report.last_month, report.observations, report.basis
    );
    println!("{}", summary_table(report));
    println!("{}", agreement_table(report));
}

pub fn series_table(monthly: &[MonthlyMarketReturn]) -> Table {
    let mut table = new_table(vec!["Month", "VW Excess", "EW Excess", "Constituents"]);
    for row in monthly {
        table.add_row(vec![
            row.month.to_string(),
            fixed(Some(row.value_weighted_excess), SERIES_DECIMALS),
            fixed(Some(row.equal_weighted_excess), SERIES_DECIMALS),
            row.constituents.to_string(),
        ]);
    }
    table
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    for index in 1..table.column_count() {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::ComparisonBasis;
    use core_types::MonthKey;

    fn stats(mean: f64) -> SummaryStatistics {
        SummaryStatistics {
            annualized_mean: mean,
            annualized_volatility: 18.5,
            sharpe_ratio: Some(mean / 18.5),
            skewness: Some(0.1234),
            excess_kurtosis: None,
        }
    }

    #[test]
    fn fixed_pads_and_rounds_half_to_even() {
        assert_eq!(fixed(Some(8.4), 2), "8.40");
        assert_eq!(fixed(Some(0.125), 2), "0.12");
        assert_eq!(fixed(Some(0.99987), 4), "0.9999");
        assert_eq!(fixed(Some(-1.0), 2), "-1.00");
        assert_eq!(fixed(None, 2), "n/a");
        assert_eq!(fixed(Some(f64::NAN), 2), "n/a");
    }

    #[test]
    fn tables_have_expected_rows() {
        let report = ComparisonReport {
            basis: ComparisonBasis::Excess,
            observations: 2,
            first_month: MonthKey::new(1926, 7).unwrap(),
            last_month: MonthKey::new(1926, 8).unwrap(),
            reference: stats(8.0),
            replicated: stats(7.9),
            correlation: Some(0.99987),
            max_abs_difference: 0.01234,
        };

        let summary = summary_table(&report);
        assert_eq!(summary.row_iter().count(), 5);
        let rendered = summary.to_string();
        assert!(rendered.contains("Sharpe Ratio"));
        assert!(rendered.contains("7.90"));
        assert!(rendered.contains("n/a"));

        let agreement = agreement_table(&report).to_string();
        assert!(agreement.contains("0.9999"));
        assert!(agreement.contains("0.0123"));
    }
}
