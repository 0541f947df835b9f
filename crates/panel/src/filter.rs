use configuration::Universe;
use core_types::{EnrichedSecurityMonth, PanelRow};

/// Restricts the enriched panel to common stock on the major exchanges.
#[derive(Debug, Clone)]
pub struct UniverseFilter {
    share_codes: Vec<i32>,
    exchange_codes: Vec<i32>,
}

impl UniverseFilter {
    pub fn new(share_codes: Vec<i32>, exchange_codes: Vec<i32>) -> Self {
        Self {
            share_codes,
            exchange_codes,
        }
    }

    /// Unclassified rows (no share or exchange code yet) never qualify.
    pub fn admits(&self, share_code: Option<i32>, exchange_code: Option<i32>) -> bool {
        share_code.is_some_and(|code| self.share_codes.contains(&code))
            && exchange_code.is_some_and(|code| self.exchange_codes.contains(&code))
    }

    pub fn retain(&self, rows: Vec<EnrichedSecurityMonth>) -> Vec<EnrichedSecurityMonth> {
        rows.into_iter()
            .filter(|row| self.admits(row.share_code, row.exchange_code))
            .collect()
    }

    /// Filters, projects to the analysis schema and drops rows without a
    /// lagged market value (every security's first eligible month included).
    pub fn build_panel(&self, rows: Vec<EnrichedSecurityMonth>) -> Vec<PanelRow> {
        let eligible = self.retain(rows);
        let eligible_count = eligible.len();

        let panel: Vec<PanelRow> = eligible.into_iter().filter_map(reshape).collect();

        tracing::info!(
            eligible = eligible_count,
            panel_rows = panel.len(),
            "Built analysis panel."
        );
        panel
    }
}

impl Default for UniverseFilter {
    fn default() -> Self {
        Self::from(&Universe::default())
    }
}

impl From<&Universe> for UniverseFilter {
    fn from(universe: &Universe) -> Self {
        Self::new(universe.share_codes.clone(), universe.exchange_codes.clone())
    }
}

fn reshape(row: EnrichedSecurityMonth) -> Option<PanelRow> {
    let month = row.month();
    Some(PanelRow {
        security_id: row.security_id,
        year: month.year,
        month: month.month,
        price: row.price,
        shares_outstanding: row.shares_outstanding,
        lagged_market_value: row.lagged_market_value?,
        total_return: row.total_return,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(id: i64, share: Option<i32>, exchange: Option<i32>, lag: Option<f64>) -> EnrichedSecurityMonth {
        EnrichedSecurityMonth {
            security_id: id,
            issuer_id: Some(id),
            date: NaiveDate::from_ymd_opt(1990, 3, 31).unwrap(),
            share_code: share,
            exchange_code: exchange,
            ret: 0.01,
            delisting_return: 0.0,
            price: Some(10.0),
            shares_outstanding: Some(5.0),
            total_return: 0.01,
            market_value: Some(50.0),
            lagged_market_value: lag,
        }
    }

    fn mixed_rows() -> Vec<EnrichedSecurityMonth> {
        vec![
            row(1, Some(10), Some(1), Some(1.0)),
            row(2, Some(11), Some(3), Some(2.0)),
            row(3, Some(12), Some(1), Some(3.0)), // ADR-style share code
            row(4, Some(10), Some(4), Some(4.0)), // minor exchange
            row(5, None, Some(2), Some(5.0)),     // never classified
            row(6, Some(10), Some(2), None),      // first month, no lag
        ]
    }

    #[test]
    fn admits_only_common_stock_on_major_exchanges() {
        let filter = UniverseFilter::default();
        let kept: Vec<_> = filter.retain(mixed_rows()).iter().map(|r| r.security_id).collect();
        assert_eq!(kept, vec![1, 2, 6]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let filter = UniverseFilter::default();
        let once = filter.retain(mixed_rows());
        let twice = filter.retain(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn panel_drops_rows_without_lag_and_splits_month() {
        let panel = UniverseFilter::default().build_panel(mixed_rows());
        assert_eq!(panel.len(), 2);
        assert_eq!(panel[0].security_id, 1);
        assert_eq!((panel[0].year, panel[0].month), (1990, 3));
        assert_eq!(panel[1].lagged_market_value, 2.0);
    }

    #[test]
    fn custom_universe() {
        let filter = UniverseFilter::new(vec![12], vec![1]);
        assert!(filter.admits(Some(12), Some(1)));
        assert!(!filter.admits(Some(10), Some(1)));
    }
}
