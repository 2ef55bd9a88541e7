//! Week bucketing for the Monday-first calendar week.
//!
//! Habits are partitioned by the week they belong to. This module
//! resolves any calendar date to the Monday that starts its week and
//! encodes that Monday as a stable string identifier used as the
//! partition key in the document store:
//! - `week_start` maps a date to its Monday (Sunday counts as the last
//!   day of the running week, not the first of a new one)
//! - [`WeekId`] wraps the week-start date and handles the string
//!   encoding, parsing, and week-to-week navigation

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Number of days in a tracked week.
pub const DAYS_IN_WEEK: usize = 7;

/// Weekday labels for the habit grid, Monday-first.
pub const DAY_LABELS: [&str; DAYS_IN_WEEK] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Returns the Monday that begins the calendar week containing `date`.
///
/// Monday maps to itself; every other weekday maps back by its
/// Monday-based index (Tuesday 1 day, ..., Sunday 6 days).
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(back)
}

/// Partition key for one Monday-to-Sunday week.
///
/// The string form is `"{year}-{month0}-{day}"` of the week-start date,
/// with a ZERO-based month (January = 0). That encoding is what existing
/// habit documents already carry in their `week` field, so it is kept
/// as-is; it is injective over week-start dates and parses back without
/// loss. Serializes as the string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekId {
    start: NaiveDate,
}

impl WeekId {
    /// Week containing the given date.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            start: week_start(date),
        }
    }

    /// Week containing today (local calendar date).
    pub fn current() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    /// Monday that starts this week.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// The seven dates of this week, Monday through Sunday.
    pub fn days(&self) -> [NaiveDate; DAYS_IN_WEEK] {
        std::array::from_fn(|i| self.start + Duration::days(i as i64))
    }

    /// Whether `date` falls inside this week.
    pub fn contains(&self, date: NaiveDate) -> bool {
        week_start(date) == self.start
    }

    /// The week immediately before this one.
    pub fn prev(&self) -> Self {
        Self {
            start: self.start - Duration::days(7),
        }
    }

    /// The week immediately after this one.
    pub fn next(&self) -> Self {
        Self {
            start: self.start + Duration::days(7),
        }
    }

    /// The week `weeks` whole weeks away (negative steps backward).
    ///
    /// Fails when the step leaves the range of representable dates.
    /// One week of slack stays reserved on both sides, so a returned
    /// week can still step to either neighbor.
    pub fn offset(&self, weeks: i64) -> Result<Self, ValidationError> {
        weeks
            .checked_mul(7)
            .and_then(Duration::try_days)
            .and_then(|step| self.start.checked_add_signed(step))
            .filter(|start| start.checked_sub_signed(Duration::days(7)).is_some())
            .filter(|start| start.checked_add_signed(Duration::days(13)).is_some())
            .map(|start| Self { start })
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "week offset".to_string(),
                message: format!("{weeks} weeks away is outside the supported date range"),
            })
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.start.year(),
            self.start.month0(),
            self.start.day()
        )
    }
}

impl FromStr for WeekId {
    type Err = ValidationError;

    /// Parses the `"{year}-{month0}-{day}"` form. Rejects strings that
    /// do not name a valid date or whose date is not a Monday, since a
    /// well-formed identifier always names a week-start date.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidWeekId(s.to_string());

        let mut parts = s.split('-');
        let year: i32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let month0: u32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let day: u32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let start = NaiveDate::from_ymd_opt(year, month0 + 1, day).ok_or_else(invalid)?;
        if start.weekday() != Weekday::Mon {
            return Err(invalid());
        }
        Ok(Self { start })
    }
}

impl Serialize for WeekId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_monday_maps_to_itself() {
        let monday = date(2025, 8, 18);
        assert_eq!(monday.weekday(), Weekday::Mon);
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn test_week_start_midweek() {
        // Thursday 2025-08-21 belongs to the week of Monday 2025-08-18
        assert_eq!(week_start(date(2025, 8, 21)), date(2025, 8, 18));
    }

    #[test]
    fn test_sunday_belongs_to_previous_monday() {
        let sunday = date(2025, 8, 24);
        assert_eq!(sunday.weekday(), Weekday::Sun);
        assert_eq!(week_start(sunday), date(2025, 8, 18));
    }

    #[test]
    fn test_week_start_crosses_month_boundary() {
        // Monday 2025-06-30 starts the week containing Tuesday 2025-07-01
        assert_eq!(week_start(date(2025, 7, 1)), date(2025, 6, 30));
    }

    #[test]
    fn test_identifier_uses_zero_based_month() {
        let id = WeekId::for_date(date(2025, 8, 18));
        assert_eq!(id.to_string(), "2025-7-18");

        let january = WeekId::for_date(date(2025, 1, 6));
        assert_eq!(january.to_string(), "2025-0-6");
    }

    #[test]
    fn test_identifier_stable_across_the_span() {
        let from_monday = WeekId::for_date(date(2025, 8, 18));
        let from_sunday = WeekId::for_date(date(2025, 8, 24));
        assert_eq!(from_monday, from_sunday);
        assert_eq!(from_monday.to_string(), from_sunday.to_string());
    }

    #[test]
    fn test_parse_round_trip() {
        let id = WeekId::for_date(date(2025, 8, 20));
        let parsed: WeekId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_non_monday() {
        // 2025-08-19 is a Tuesday; month0 7 = August
        let err = "2025-7-19".parse::<WeekId>();
        assert!(err.is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "week", "2025", "2025-7", "2025-12-1", "2025-7-18-x"] {
            assert!(bad.parse::<WeekId>().is_err(), "should reject {:?}", bad);
        }
    }

    #[test]
    fn test_navigation() {
        let id = WeekId::for_date(date(2025, 8, 18));
        assert_eq!(id.prev().start(), date(2025, 8, 11));
        assert_eq!(id.next().start(), date(2025, 8, 25));
        assert_eq!(id.offset(-2).unwrap().start(), date(2025, 8, 4));
        assert_eq!(id.offset(0).unwrap(), id);
    }

    #[test]
    fn test_offset_rejects_steps_outside_date_range() {
        let id = WeekId::for_date(date(2025, 8, 18));
        for weeks in [
            1_000_000_000,
            20_000_000_000,
            i64::MAX,
            i64::MIN,
            -1_000_000_000,
        ] {
            assert!(
                matches!(id.offset(weeks), Err(ValidationError::InvalidValue { .. })),
                "offset({weeks}) should be rejected"
            );
        }
        // A century in either direction is comfortably in range.
        assert!(id.offset(5200).is_ok());
        assert!(id.offset(-5200).is_ok());
    }

    #[test]
    fn test_days_span_monday_to_sunday() {
        let days = WeekId::for_date(date(2025, 8, 21)).days();
        assert_eq!(days[0], date(2025, 8, 18));
        assert_eq!(days[6], date(2025, 8, 24));
        assert_eq!(days[0].weekday(), Weekday::Mon);
        assert_eq!(days[6].weekday(), Weekday::Sun);
    }

    #[test]
    fn test_serde_as_string() {
        let id = WeekId::for_date(date(2025, 8, 18));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"2025-7-18\"");
        let back: WeekId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        // ~110 years around the epoch
        (0i64..40_000).prop_map(|n| date(1970, 1, 1) + Duration::days(n))
    }

    proptest! {
        #[test]
        fn prop_week_start_idempotent(d in arb_date()) {
            prop_assert_eq!(week_start(week_start(d)), week_start(d));
        }

        #[test]
        fn prop_week_start_is_monday_within_six_days(d in arb_date()) {
            let start = week_start(d);
            prop_assert_eq!(start.weekday(), Weekday::Mon);
            let gap = (d - start).num_days();
            prop_assert!((0..7).contains(&gap));
        }

        #[test]
        fn prop_same_span_same_identifier(d in arb_date(), day in 0i64..7) {
            let within = week_start(d) + Duration::days(day);
            prop_assert_eq!(WeekId::for_date(d), WeekId::for_date(within));
        }

        #[test]
        fn prop_adjacent_weeks_differ(d in arb_date()) {
            let id = WeekId::for_date(d);
            prop_assert_ne!(id, id.next());
            prop_assert_ne!(id.to_string(), id.next().to_string());
        }

        #[test]
        fn prop_identifier_round_trips(d in arb_date()) {
            let id = WeekId::for_date(d);
            let parsed: WeekId = id.to_string().parse().unwrap();
            prop_assert_eq!(parsed, id);
        }
    }
}
