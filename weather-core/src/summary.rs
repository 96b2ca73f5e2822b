//! Reduction of the 3-hour forecast feed into one summary per calendar day.
//!
//! Days are keyed by the UTC date of each sample. For cities far from UTC this
//! can put late-evening samples on the following day; the approximation is kept
//! so that summaries line up with the provider's own timestamps.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Timelike};

use crate::model::{round_half_up, Condition, DaySummary, ForecastEntry};

/// Maximum number of days kept from a forecast feed.
pub const MAX_DAYS: usize = 5;

/// Inclusive UTC hour range preferred when picking a day's representative sample.
const MIDDAY_HOURS: std::ops::RangeInclusive<u32> = 12..=15;

/// Groups samples by UTC date and summarizes the first [`MAX_DAYS`] dates in
/// ascending order. Samples keep their feed order within a day.
pub fn summarize_forecast(entries: &[ForecastEntry]) -> Vec<DaySummary> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&ForecastEntry>> = BTreeMap::new();

    for entry in entries {
        match entry.time() {
            Some(time) => by_date.entry(time.date_naive()).or_default().push(entry),
            None => tracing::debug!(timestamp = entry.timestamp, "skipping out-of-range forecast sample"),
        }
    }

    by_date
        .values()
        .filter_map(|day| summarize_day(day))
        .take(MAX_DAYS)
        .collect()
}

/// Summarizes the samples of a single day. Returns `None` for an empty slice.
pub fn summarize_day(entries: &[&ForecastEntry]) -> Option<DaySummary> {
    let first = *entries.first()?;
    let first_time = first.time()?;

    let (min, max) = temperature_range(entries).unzip();

    let condition = representative(entries).and_then(|e| e.condition.as_ref());
    let (icon, main, description) = match condition {
        Some(Condition { main, description, icon }) => {
            (icon.clone(), main.clone(), description.clone())
        }
        None => Default::default(),
    };

    Some(DaySummary {
        day: first_time.format("%a").to_string(),
        date: first_time.date_naive(),
        min,
        max,
        icon,
        main,
        description,
    })
}

fn temperature_range(entries: &[&ForecastEntry]) -> Option<(i32, i32)> {
    entries
        .iter()
        .filter_map(|e| e.temperature)
        .filter(|t| t.is_finite())
        .map(round_half_up)
        .fold(None, |range, t| match range {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        })
}

/// Picks the sample whose condition stands for the whole day.
///
/// A midday sample wins if it carries a condition; otherwise the first sample
/// of the most frequent category; otherwise the first sample.
fn representative<'a>(entries: &[&'a ForecastEntry]) -> Option<&'a ForecastEntry> {
    let midday = entries.iter().copied().find(|e| {
        e.time()
            .is_some_and(|t| MIDDAY_HOURS.contains(&t.hour()))
    });

    if let Some(entry) = midday.filter(|e| e.condition.is_some()) {
        return Some(entry);
    }

    if let Some(category) = most_frequent_category(entries) {
        let by_mode = entries.iter().copied().find(|e| {
            e.condition
                .as_ref()
                .is_some_and(|c| c.main == category)
        });
        if by_mode.is_some() {
            return by_mode;
        }
    }

    entries.first().copied()
}

/// Statistical mode of the condition category; ties go to the category seen first.
fn most_frequent_category(entries: &[&ForecastEntry]) -> Option<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for condition in entries.iter().filter_map(|e| e.condition.as_ref()) {
        let count = counts.entry(condition.main.as_str()).or_insert(0);
        if *count == 0 {
            order.push(condition.main.as_str());
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for category in order {
        let count = counts[category];
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((category, count));
        }
    }

    best.map(|(category, _)| category.to_string())
}
