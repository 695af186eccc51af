//! Per-period statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use super::compute_statistics;
use crate::models::{DuelRecord, Granularity, Statistics};

/// Bucket key for a timestamp, in the given time zone.
///
/// - day: `YYYY-MM-DD`
/// - week: `YYYY-MM-DD` of the Sunday starting the week
/// - month: `YYYY-MM`
pub fn period_key<Tz: TimeZone>(timestamp: &DateTime<Utc>, granularity: Granularity, tz: &Tz) -> String {
    let date = timestamp.with_timezone(tz).date_naive();
    match granularity {
        Granularity::Day => date.format("%Y-%m-%d").to_string(),
        Granularity::Week => {
            let back = date.weekday().num_days_from_sunday() as i64;
            (date - Duration::days(back)).format("%Y-%m-%d").to_string()
        }
        Granularity::Month => date.format("%Y-%m").to_string(),
    }
}

/// Statistics per period, keyed in UTC.
pub fn compute_by_period<'a, I>(records: I, granularity: Granularity) -> BTreeMap<String, Statistics>
where
    I: IntoIterator<Item = &'a DuelRecord>,
{
    compute_by_period_in(records, granularity, &Utc)
}

/// Statistics per period, keyed in the given time zone.
///
/// Only periods with at least one record appear. Keys sort chronologically.
pub fn compute_by_period_in<'a, I, Tz>(
    records: I,
    granularity: Granularity,
    tz: &Tz,
) -> BTreeMap<String, Statistics>
where
    I: IntoIterator<Item = &'a DuelRecord>,
    Tz: TimeZone,
{
    let mut buckets: BTreeMap<String, Vec<&'a DuelRecord>> = BTreeMap::new();
    for record in records {
        let key = period_key(&record.timestamp, granularity, tz);
        buckets.entry(key).or_default().push(record);
    }

    buckets
        .into_iter()
        .map(|(key, duels)| (key, compute_statistics(duels)))
        .collect()
}
