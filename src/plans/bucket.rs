//! Calendar-day bucketing of scheduled plans
//!
//! [`DayKey::of`] is the only place an instant becomes a calendar day. Plans
//! and query days both go through it, always in UTC, so a plan at 23:30Z
//! lands on the same day whatever the caller's local offset is.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::types::Scheduled;

/// A calendar day in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// The UTC calendar day containing `instant`
    pub fn of<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        DayKey(instant.with_timezone(&Utc).date_naive())
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(DayKey)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

/// A calendar date picked in the UI is already a day.
impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        DayKey(date)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DayKey {
    fn from(instant: DateTime<Tz>) -> Self {
        DayKey::of(&instant)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Group plans by UTC day, keeping the input order inside each day.
pub fn bucket_by_day<P: Scheduled + Clone>(plans: &[P]) -> BTreeMap<DayKey, Vec<P>> {
    let mut buckets: BTreeMap<DayKey, Vec<P>> = BTreeMap::new();
    for plan in plans {
        buckets
            .entry(DayKey::of(&plan.scheduled_date()))
            .or_default()
            .push(plan.clone());
    }
    buckets
}

/// Plans scheduled on `day`
pub fn for_day<P: Scheduled + Clone>(plans: &[P], day: impl Into<DayKey>) -> Vec<P> {
    let day = day.into();
    plans
        .iter()
        .filter(|plan| DayKey::of(&plan.scheduled_date()) == day)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str, DateTime<Utc>);

    impl Scheduled for Item {
        fn scheduled_date(&self) -> DateTime<Utc> {
            self.1
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn late_evening_utc_stays_on_its_day() {
        let plans = vec![Item("late", at("2024-03-01T23:30:00Z"))];
        assert_eq!(for_day(&plans, day(2024, 3, 1)), plans);
        assert!(for_day(&plans, day(2024, 3, 2)).is_empty());
    }

    #[test]
    fn caller_offset_does_not_shift_the_plan() {
        let plans = vec![Item("late", at("2024-03-01T23:30:00Z"))];
        // The same instant seen from UTC+5 and UTC-8.
        let east = FixedOffset::east_opt(5 * 3600).unwrap();
        let west = FixedOffset::west_opt(8 * 3600).unwrap();
        let seen_east = at("2024-03-01T23:30:00Z").with_timezone(&east);
        let seen_west = at("2024-03-01T23:30:00Z").with_timezone(&west);

        assert_eq!(DayKey::of(&seen_east), DayKey::from(day(2024, 3, 1)));
        assert_eq!(DayKey::of(&seen_west), DayKey::from(day(2024, 3, 1)));
        assert_eq!(for_day(&plans, seen_east).len(), 1);
        assert_eq!(for_day(&plans, seen_west).len(), 1);
    }

    #[test]
    fn bucketing_is_idempotent_and_ordered() {
        let plans = vec![
            Item("b", at("2024-03-02T06:00:00Z")),
            Item("a1", at("2024-03-01T08:00:00Z")),
            Item("a2", at("2024-03-01T23:59:59Z")),
        ];
        let first = bucket_by_day(&plans);
        let second = bucket_by_day(&plans);
        assert_eq!(first, second);

        let days: Vec<String> = first.keys().map(|k| k.to_string()).collect();
        assert_eq!(days, vec!["2024-03-01", "2024-03-02"]);
        let names: Vec<&str> = first[&DayKey::from(day(2024, 3, 1))]
            .iter()
            .map(|i| i.0)
            .collect();
        assert_eq!(names, vec!["a1", "a2"]);
    }

    #[test]
    fn every_plan_lands_in_exactly_one_bucket() {
        let plans = vec![
            Item("x", at("2024-03-01T00:00:00Z")),
            Item("y", at("2024-03-01T23:59:59Z")),
            Item("z", at("2024-03-02T00:00:00Z")),
        ];
        let total: usize = bucket_by_day(&plans).values().map(Vec::len).sum();
        assert_eq!(total, plans.len());
    }
}
