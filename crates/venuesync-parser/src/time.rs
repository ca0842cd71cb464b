use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::errors::ParseError;

static TIME_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})(?::(\d{2}))?\s*(?i:(am|pm))?$").expect("time token pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Am,
    Pm,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Am => "AM",
            Period::Pm => "PM",
        }
    }

    fn from_marker(marker: &str) -> Option<Self> {
        if marker.eq_ignore_ascii_case("am") {
            Some(Period::Am)
        } else if marker.eq_ignore_ascii_case("pm") {
            Some(Period::Pm)
        } else {
            None
        }
    }
}

/// Canonical 24-hour wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub const fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour <= 23 && minute <= 59 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Display form used on rendered pages, e.g. `1:30 PM` or `12:00 AM`.
    pub fn to_12_hour(&self) -> String {
        let period = if self.hour < 12 { Period::Am } else { Period::Pm };
        let hour = match self.hour % 12 {
            0 => 12,
            other => other,
        };
        format!("{}:{:02} {}", hour, self.minute, period.as_str())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| ParseError::time_token(s, "expected HH:MM"))?;
        let hour: u8 = hour
            .parse()
            .map_err(|_| ParseError::time_token(s, "hour is not numeric"))?;
        let minute: u8 = minute
            .parse()
            .map_err(|_| ParseError::time_token(s, "minute is not numeric"))?;
        TimeOfDay::new(hour, minute).ok_or_else(|| ParseError::time_token(s, "out of range"))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Returns true when the token already carries an AM/PM marker.
pub fn has_period(token: &str) -> bool {
    TIME_TOKEN
        .captures(token.trim())
        .is_some_and(|caps| caps.get(3).is_some())
}

/// Converts a 12-hour token such as `9AM`, `1:30 PM` or `12:00am` to 24-hour time.
///
/// A token without a period is taken at face value, so `9` becomes `09:00`.
/// Callers that want a default period must append it before calling.
pub fn to_24_hour(token: &str) -> Result<TimeOfDay, ParseError> {
    let trimmed = token.trim();
    let caps = TIME_TOKEN
        .captures(trimmed)
        .ok_or_else(|| ParseError::time_token(token, "expected <hour>[:<minute>][AM|PM]"))?;

    let mut hour: u8 = caps[1]
        .parse()
        .map_err(|_| ParseError::time_token(token, "hour is not numeric"))?;
    let minute: u8 = match caps.get(2) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| ParseError::time_token(token, "minute is not numeric"))?,
        None => 0,
    };

    match caps.get(3).and_then(|m| Period::from_marker(m.as_str())) {
        Some(Period::Pm) if hour != 12 => hour += 12,
        Some(Period::Am) if hour == 12 => hour = 0,
        _ => {}
    }

    TimeOfDay::new(hour, minute)
        .ok_or_else(|| ParseError::time_token(token, format!("{hour}:{minute:02} is outside 00:00-23:59")))
}
