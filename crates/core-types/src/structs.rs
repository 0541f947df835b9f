use crate::calendar::MonthKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==============================================================================
// Raw tables, exactly as the upstream source delivers them
// ==============================================================================

/// One row of the monthly stock file joined with the security name history.
///
/// Identifiers and codes arrive as floating point (the source stores them as
/// double precision); the panel cleaner coerces them to integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSecurityMonth {
    pub permno: f64,
    pub permco: f64,
    pub date: NaiveDate,
    pub shrcd: Option<f64>,
    pub exchcd: Option<f64>,
    pub ret: Option<f64>,
    pub shrout: Option<f64>,
    /// Negative when the source reports a bid/ask midpoint instead of a trade.
    pub prc: Option<f64>,
    pub cfacpr: Option<f64>,
    pub cfacshr: Option<f64>,
}

/// One row of the delisting file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDelisting {
    pub permno: f64,
    pub dlret: Option<f64>,
    pub dlstdt: NaiveDate,
    pub dlstcd: Option<f64>,
}

/// One row of the published monthly factor file. Values are fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFactorRow {
    pub date: NaiveDate,
    pub mktrf: f64,
    pub smb: Option<f64>,
    pub hml: Option<f64>,
    pub rf: f64,
}

/// The three tables fetched at the start of every run.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub security_months: Vec<RawSecurityMonth>,
    pub delistings: Vec<RawDelisting>,
    pub factors: Vec<RawFactorRow>,
}

// ==============================================================================
// Cleaned and derived tables
// ==============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityObservation {
    pub security_id: i64,
    pub issuer_id: i64,
    /// Always the last day of the month.
    pub date: NaiveDate,
    pub share_code: Option<i32>,
    pub exchange_code: Option<i32>,
    pub ret: Option<f64>,
    /// Absolute value of the source price.
    pub price: Option<f64>,
    pub shares_outstanding: Option<f64>,
    // Carried through, not used by the return computation.
    pub price_adjustment: Option<f64>,
    pub share_adjustment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DelistingEvent {
    pub security_id: i64,
    pub delisting_return: Option<f64>,
    pub delisting_date: NaiveDate,
    pub reason_code: Option<i32>,
    /// Month end of `delisting_date`, used to join onto observations.
    pub join_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceFactorRow {
    pub month: MonthKey,
    pub date: NaiveDate,
    pub market_minus_riskfree: f64,
    pub size: Option<f64>,
    pub value: Option<f64>,
    pub risk_free: f64,
}

impl ReferenceFactorRow {
    /// Total market return, `mkt-rf + rf`.
    pub fn market_return(&self) -> f64 {
        self.market_minus_riskfree + self.risk_free
    }
}

/// A security-month after delisting returns have been folded in and the
/// previous month's market value has been attached.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSecurityMonth {
    pub security_id: i64,
    /// Absent for months that only exist in the delisting file.
    pub issuer_id: Option<i64>,
    pub date: NaiveDate,
    pub share_code: Option<i32>,
    pub exchange_code: Option<i32>,
    pub ret: f64,
    pub delisting_return: f64,
    pub price: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub total_return: f64,
    pub market_value: Option<f64>,
    pub lagged_market_value: Option<f64>,
}

impl EnrichedSecurityMonth {
    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

/// One row of the analysis panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelRow {
    pub security_id: i64,
    pub year: i32,
    pub month: u32,
    pub price: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub lagged_market_value: f64,
    pub total_return: f64,
}

impl PanelRow {
    pub fn key(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }
}

/// The replicated market return for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMarketReturn {
    pub month: MonthKey,
    pub value_weighted_excess: f64,
    pub equal_weighted_excess: f64,
    pub total_lagged_market_value: f64,
    pub constituents: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_return_adds_back_risk_free() {
        let row = ReferenceFactorRow {
            month: MonthKey::new(1926, 7).unwrap(),
            date: NaiveDate::from_ymd_opt(1926, 7, 1).unwrap(),
            market_minus_riskfree: 0.0296,
            size: Some(-0.0256),
            value: Some(-0.0243),
            risk_free: 0.0022,
        };
        assert!((row.market_return() - 0.0318).abs() < 1e-12);
    }

    #[test]
    fn raw_rows_tolerate_missing_optionals() {
        let json = r#"{"permno":10001.0,"permco":7953.0,"date":"1986-01-31",
            "shrcd":null,"exchcd":3.0,"ret":null,"shrout":null,"prc":-2.5,
            "cfacpr":null,"cfacshr":null}"#;
        let row: RawSecurityMonth = serde_json::from_str(json).unwrap();
        assert_eq!(row.prc, Some(-2.5));
        assert!(row.ret.is_none());
    }
}
