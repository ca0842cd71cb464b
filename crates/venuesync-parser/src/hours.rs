use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::errors::ParseError;
use crate::model::RawRow;
use crate::time::{has_period, to_24_hour, TimeOfDay};

// Only the en dash separates a range; exports that use a hyphen do not match.
static HOURS_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}(?::\d{2})?\s*(?i:am|pm)?)\s*\x{2013}\s*(\d{1,2}(?::\d{2})?\s*(?i:am|pm)?)")
        .expect("hours range pattern compiles")
});

const CLOSED_MARKER: &str = "Closed";
const OPEN_ALL_DAY_MARKER: &str = "Open 24 hours";

/// Placeholder pair stored for "Open 24 hours" cells.
pub const OPEN_ALL_DAY_START: TimeOfDay = match TimeOfDay::new(12, 0) {
    Some(time) => time,
    None => panic!("invalid sentinel"),
};
pub const OPEN_ALL_DAY_CLOSE: TimeOfDay = match TimeOfDay::new(1, 0) {
    Some(time) => time,
    None => panic!("invalid sentinel"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Spreadsheet column holding this day's opening hours.
    pub fn source_column(&self) -> String {
        format!("Open_Time_{}", self.label())
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySchedule {
    Closed,
    OpenAllDay,
    Ranged {
        start: TimeOfDay,
        close: TimeOfDay,
        enabled: bool,
    },
}

impl DaySchedule {
    pub fn start(&self) -> Option<TimeOfDay> {
        match self {
            DaySchedule::Closed => None,
            DaySchedule::OpenAllDay => Some(OPEN_ALL_DAY_START),
            DaySchedule::Ranged { start, .. } => Some(*start),
        }
    }

    pub fn close(&self) -> Option<TimeOfDay> {
        match self {
            DaySchedule::Closed => None,
            DaySchedule::OpenAllDay => Some(OPEN_ALL_DAY_CLOSE),
            DaySchedule::Ranged { close, .. } => Some(*close),
        }
    }
}

impl Serialize for DaySchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DaySchedule::Closed => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("closed", "on")?;
                map.end()
            }
            DaySchedule::OpenAllDay => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("start", &OPEN_ALL_DAY_START)?;
                map.serialize_entry("close", &OPEN_ALL_DAY_CLOSE)?;
                map.serialize_entry("always_open", "on")?;
                map.end()
            }
            DaySchedule::Ranged {
                start,
                close,
                enabled,
            } => {
                let mut map = serializer.serialize_map(Some(if *enabled { 3 } else { 2 }))?;
                map.serialize_entry("start", start)?;
                map.serialize_entry("close", close)?;
                if *enabled {
                    map.serialize_entry("enabled", "on")?;
                }
                map.end()
            }
        }
    }
}

/// Opening hours keyed by weekday, iterated monday to sunday.
///
/// Days whose cell could not be interpreted are absent rather than closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WeekSchedule {
    days: BTreeMap<Weekday, DaySchedule>,
}

impl WeekSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, day: Weekday, schedule: DaySchedule) {
        self.days.insert(day, schedule);
    }

    pub fn get(&self, day: Weekday) -> Option<&DaySchedule> {
        self.days.get(&day)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &DaySchedule)> {
        self.days.iter().map(|(day, schedule)| (*day, schedule))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Interprets one opening-hours cell.
///
/// Returns `None` when the cell matches none of the known shapes.
pub fn parse_day(cell: &str) -> Option<DaySchedule> {
    if cell.contains(CLOSED_MARKER) {
        return Some(DaySchedule::Closed);
    }
    if cell.contains(OPEN_ALL_DAY_MARKER) {
        return Some(DaySchedule::OpenAllDay);
    }

    match parse_range(cell) {
        Ok(schedule) => Some(schedule),
        Err(err) => {
            warn!(cell, error = %err, "Could not interpret opening hours");
            None
        }
    }
}

fn parse_range(cell: &str) -> Result<DaySchedule, ParseError> {
    let caps = HOURS_RANGE.captures(cell).ok_or_else(|| ParseError::NoHoursRange {
        cell: cell.to_string(),
    })?;

    let start = to_24_hour(&assume_pm(&caps[1]))?;
    let close = to_24_hour(&assume_pm(&caps[2]))?;

    Ok(DaySchedule::Ranged {
        start,
        close,
        enabled: true,
    })
}

fn assume_pm(token: &str) -> String {
    let token = token.trim();
    if has_period(token) {
        token.to_string()
    } else {
        format!("{token}PM")
    }
}

/// Builds the weekly schedule from the seven `Open_Time_<Day>` columns.
pub fn parse_week(row: &RawRow) -> WeekSchedule {
    let mut week = WeekSchedule::new();
    for day in Weekday::ALL {
        let column = day.source_column();
        let Some(cell) = row.non_empty(&column) else {
            debug!(column = %column, "No opening hours listed");
            continue;
        };
        if let Some(schedule) = parse_day(cell) {
            week.insert(day, schedule);
        }
    }
    week
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(hour: u8, minute: u8) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[test]
    fn closed_is_a_substring_match() {
        assert_eq!(parse_day("Closed on Mondays"), Some(DaySchedule::Closed));
        assert_eq!(parse_day("closed"), None);
    }

    #[test]
    fn open_all_day_uses_sentinel_pair() {
        let parsed = parse_day("Open 24 hours").unwrap();
        assert_eq!(parsed, DaySchedule::OpenAllDay);
        assert_eq!(parsed.start(), Some(time(12, 0)));
        assert_eq!(parsed.close(), Some(time(1, 0)));
    }

    #[test]
    fn ranged_hours_with_markers() {
        assert_eq!(
            parse_day("9AM\u{2013}5PM"),
            Some(DaySchedule::Ranged {
                start: time(9, 0),
                close: time(17, 0),
                enabled: true
            })
        );
        assert_eq!(
            parse_day("11:30 AM \u{2013} 10:15 PM"),
            Some(DaySchedule::Ranged {
                start: time(11, 30),
                close: time(22, 15),
                enabled: true
            })
        );
    }

    #[test]
    fn tokens_without_marker_are_pm() {
        assert_eq!(
            parse_day("9\u{2013}5"),
            Some(DaySchedule::Ranged {
                start: time(21, 0),
                close: time(17, 0),
                enabled: true
            })
        );
    }

    #[test]
    fn hyphen_is_not_a_range_separator() {
        assert_eq!(parse_day("9AM-5PM"), None);
    }

    #[test]
    fn only_first_range_is_used() {
        assert_eq!(
            parse_day("11AM\u{2013}3PM, 5\u{2013}10PM"),
            Some(DaySchedule::Ranged {
                start: time(11, 0),
                close: time(15, 0),
                enabled: true
            })
        );
    }

    #[test]
    fn week_omits_empty_and_unmatched_days() {
        let row: RawRow = [
            ("Open_Time_Monday", "9AM\u{2013}5PM"),
            ("Open_Time_Tuesday", "Closed"),
            ("Open_Time_Wednesday", "by appointment"),
            ("Open_Time_Thursday", ""),
            ("Open_Time_Sunday", "Open 24 hours"),
        ]
        .into_iter()
        .collect();

        let week = parse_week(&row);
        assert_eq!(week.len(), 3);
        assert!(week.get(Weekday::Wednesday).is_none());
        assert!(week.get(Weekday::Thursday).is_none());
        assert_eq!(week.get(Weekday::Tuesday), Some(&DaySchedule::Closed));
        let days: Vec<Weekday> = week.iter().map(|(day, _)| day).collect();
        assert_eq!(days, vec![Weekday::Monday, Weekday::Tuesday, Weekday::Sunday]);
    }

    #[test]
    fn schedule_serializes_in_weekday_order() {
        let mut week = WeekSchedule::new();
        week.insert(Weekday::Sunday, DaySchedule::Closed);
        week.insert(
            Weekday::Monday,
            DaySchedule::Ranged {
                start: time(9, 0),
                close: time(17, 0),
                enabled: true,
            },
        );
        let json = serde_json::to_string(&week).unwrap();
        assert_eq!(
            json,
            r#"{"monday":{"start":"09:00","close":"17:00","enabled":"on"},"sunday":{"closed":"on"}}"#
        );
    }
}
