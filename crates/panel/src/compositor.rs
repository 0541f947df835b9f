use core_types::{DelistingEvent, EnrichedSecurityMonth, MonthKey, SecurityObservation};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Holding-period return with the delisting return compounded in:
/// `(1 + ret)(1 + dlret) - 1`.
///
/// Evaluated in expanded form so that a zero on either side returns the other
/// side bit for bit.
pub fn total_return(ret: f64, delisting_return: f64) -> f64 {
    ret + delisting_return + ret * delisting_return
}

/// One output row of the full outer join, before enrichment.
#[derive(Debug, Clone, Copy)]
struct Joined<'a> {
    security_id: i64,
    date: NaiveDate,
    observation: Option<&'a SecurityObservation>,
    delisting: Option<&'a DelistingEvent>,
}

/// The previous row seen by the linear scan.
#[derive(Debug, Clone, Copy)]
struct Previous {
    security_id: i64,
    month_index: i64,
    market_value: Option<f64>,
}

/// Share class and exchange carried forward within one security.
#[derive(Debug, Clone, Copy, Default)]
struct Classification {
    share_code: Option<i32>,
    exchange_code: Option<i32>,
}

/// Merges delisting events onto observations and attaches lagged market values.
///
/// Both inputs must be sorted as the cleaner leaves them. The output is
/// ordered by (security id, month end) and contains every observation and
/// every delisting month, whether or not the other side has a match.
pub fn compose_returns(
    observations: &[SecurityObservation],
    delistings: &[DelistingEvent],
) -> Vec<EnrichedSecurityMonth> {
    let delistings = unique_delistings(delistings);
    let joined = outer_join(observations, &delistings);

    let mut enriched = Vec::with_capacity(joined.len());
    let mut previous: Option<Previous> = None;
    let mut carried = Classification::default();

    for row in joined {
        let same_security = previous.is_some_and(|p| p.security_id == row.security_id);
        if !same_security {
            carried = Classification::default();
        }

        if let Some(observation) = row.observation {
            carried.share_code = observation.share_code.or(carried.share_code);
            carried.exchange_code = observation.exchange_code.or(carried.exchange_code);
        }

        let ret = row.observation.and_then(|o| o.ret).unwrap_or(0.0);
        let price = match row.observation {
            Some(observation) => observation.price,
            None => Some(0.0),
        };
        let shares_outstanding = row.observation.and_then(|o| o.shares_outstanding);
        let delisting_return = row
            .delisting
            .and_then(|d| d.delisting_return)
            .unwrap_or(0.0);
        let market_value = price.zip(shares_outstanding).map(|(p, s)| p * s);

        let month_index = MonthKey::from_date(row.date).index();
        let lagged_market_value = match previous {
            Some(p) if same_security && p.month_index + 1 == month_index => p.market_value,
            _ => None,
        };

        enriched.push(EnrichedSecurityMonth {
            security_id: row.security_id,
            issuer_id: row.observation.map(|o| o.issuer_id),
            date: row.date,
            share_code: carried.share_code,
            exchange_code: carried.exchange_code,
            ret,
            delisting_return,
            price,
            shares_outstanding,
            total_return: total_return(ret, delisting_return),
            market_value,
            lagged_market_value,
        });

        previous = Some(Previous {
            security_id: row.security_id,
            month_index,
            market_value,
        });
    }

    let with_lag = enriched
        .iter()
        .filter(|r| r.lagged_market_value.is_some())
        .count();
    tracing::info!(
        rows = enriched.len(),
        with_lag,
        "Composed total returns and lagged market values."
    );

    enriched
}

/// Keeps the earliest event per (security, month). Input is sorted by
/// (security id, delisting date), so duplicates are adjacent.
fn unique_delistings(delistings: &[DelistingEvent]) -> Vec<&DelistingEvent> {
    let mut unique: Vec<&DelistingEvent> = Vec::with_capacity(delistings.len());
    for event in delistings {
        match unique.last() {
            Some(last)
                if last.security_id == event.security_id && last.join_date == event.join_date => {}
            _ => unique.push(event),
        }
    }

    let dropped = delistings.len() - unique.len();
    if dropped > 0 {
        tracing::warn!(
            dropped,
            "Multiple delisting events in the same security-month; kept the earliest of each."
        );
    }
    unique
}

/// Sort-merge full outer join on (security id, month end). A delisting that
/// matches several observations with the same key is attached to each.
fn outer_join<'a>(
    observations: &'a [SecurityObservation],
    delistings: &[&'a DelistingEvent],
) -> Vec<Joined<'a>> {
    let mut joined = Vec::with_capacity(observations.len() + delistings.len());
    let mut obs = observations.iter().peekable();
    let mut dls = delistings.iter().copied().peekable();

    loop {
        match (obs.peek().copied(), dls.peek().copied()) {
            (Some(o), Some(d)) => {
                let obs_key = (o.security_id, o.date);
                match obs_key.cmp(&(d.security_id, d.join_date)) {
                    Ordering::Less => {
                        joined.push(from_observation(o, None));
                        obs.next();
                    }
                    Ordering::Greater => {
                        joined.push(from_delisting(d));
                        dls.next();
                    }
                    Ordering::Equal => {
                        joined.push(from_observation(o, Some(d)));
                        obs.next();
                        let more_with_same_key = obs
                            .peek()
                            .is_some_and(|next| (next.security_id, next.date) == obs_key);
                        if !more_with_same_key {
                            dls.next();
                        }
                    }
                }
            }
            (Some(o), None) => {
                joined.push(from_observation(o, None));
                obs.next();
            }
            (None, Some(d)) => {
                joined.push(from_delisting(d));
                dls.next();
            }
            (None, None) => break,
        }
    }

    joined
}

fn from_observation<'a>(
    observation: &'a SecurityObservation,
    delisting: Option<&'a DelistingEvent>,
) -> Joined<'a> {
    Joined {
        security_id: observation.security_id,
        date: observation.date,
        observation: Some(observation),
        delisting,
    }
}

fn from_delisting(delisting: &DelistingEvent) -> Joined<'_> {
    Joined {
        security_id: delisting.security_id,
        date: delisting.join_date,
        observation: None,
        delisting: Some(delisting),
    }
}
