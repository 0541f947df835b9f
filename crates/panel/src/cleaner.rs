use crate::error::PanelError;
use core_types::{
    DelistingEvent, MonthKey, RawDelisting, RawFactorRow, RawSecurityMonth, ReferenceFactorRow,
    SecurityObservation, month_end,
};

/// Largest magnitude at which every integer is exactly representable as f64.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Normalizes the monthly security file.
///
/// Identifiers become integers, dates move to month end, prices lose their
/// sign, and the result is sorted by (security id, date). Missing returns,
/// prices and shares are left missing.
pub fn clean_security_months(
    raw: Vec<RawSecurityMonth>,
) -> Result<Vec<SecurityObservation>, PanelError> {
    let mut cleaned = raw
        .into_iter()
        .map(|row| -> Result<SecurityObservation, PanelError> {
            Ok(SecurityObservation {
                security_id: to_identifier("permno", row.permno)?,
                issuer_id: to_identifier("permco", row.permco)?,
                date: month_end(row.date),
                share_code: to_code("shrcd", row.shrcd)?,
                exchange_code: to_code("exchcd", row.exchcd)?,
                ret: finite(row.ret),
                price: finite(row.prc).map(f64::abs),
                shares_outstanding: finite(row.shrout),
                price_adjustment: finite(row.cfacpr),
                share_adjustment: finite(row.cfacshr),
            })
        })
        .collect::<Result<Vec<_>, PanelError>>()?;

    cleaned.sort_by_key(|row| (row.security_id, row.date));
    tracing::info!(rows = cleaned.len(), "Cleaned security months.");
    Ok(cleaned)
}

/// Normalizes the delisting file and derives the month-end join date.
pub fn clean_delistings(raw: Vec<RawDelisting>) -> Result<Vec<DelistingEvent>, PanelError> {
    let mut cleaned = raw
        .into_iter()
        .map(|row| -> Result<DelistingEvent, PanelError> {
            Ok(DelistingEvent {
                security_id: to_identifier("permno", row.permno)?,
                delisting_return: finite(row.dlret),
                delisting_date: row.dlstdt,
                reason_code: to_code("dlstcd", row.dlstcd)?,
                join_date: month_end(row.dlstdt),
            })
        })
        .collect::<Result<Vec<_>, PanelError>>()?;

    cleaned.sort_by_key(|row| (row.security_id, row.delisting_date));
    tracing::info!(rows = cleaned.len(), "Cleaned delisting events.");
    Ok(cleaned)
}

/// Keys the reference series by calendar month, in chronological order.
pub fn clean_reference(raw: Vec<RawFactorRow>) -> Result<Vec<ReferenceFactorRow>, PanelError> {
    let mut cleaned: Vec<ReferenceFactorRow> = raw
        .into_iter()
        .map(|row| ReferenceFactorRow {
            month: MonthKey::from_date(row.date),
            date: row.date,
            market_minus_riskfree: row.mktrf,
            size: row.smb,
            value: row.hml,
            risk_free: row.rf,
        })
        .collect();

    cleaned.sort_by_key(|row| row.month);
    if let Some(pair) = cleaned.windows(2).find(|pair| pair[0].month == pair[1].month) {
        return Err(PanelError::DuplicateReferenceMonth(pair[1].month));
    }

    Ok(cleaned)
}

fn to_identifier(field: &'static str, value: f64) -> Result<i64, PanelError> {
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > MAX_EXACT_INTEGER {
        return Err(PanelError::InvalidIdentifier { field, value });
    }
    Ok(value as i64)
}

/// NaN is how some extracts spell "missing"; anything else must be integral.
fn to_code(field: &'static str, value: Option<f64>) -> Result<Option<i32>, PanelError> {
    match value {
        None => Ok(None),
        Some(v) if v.is_nan() => Ok(None),
        Some(v) if v.is_finite() && v.fract() == 0.0 && v.abs() <= f64::from(i32::MAX) => {
            Ok(Some(v as i32))
        }
        Some(v) => Err(PanelError::InvalidCode { field, value: v }),
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
