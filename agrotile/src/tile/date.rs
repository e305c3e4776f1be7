//! Calendar-day acquisition dates.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected date string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("date must be YYYY-MM-DD, got '{0}'")]
pub struct InvalidDate(pub String);

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static date pattern"))
}

/// A single UTC calendar day in `YYYY-MM-DD` form.
///
/// The string shape is checked strictly (zero-padded) and the day must
/// exist in the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageryDate(NaiveDate);

impl ImageryDate {
    /// Parses a `YYYY-MM-DD` string.
    pub fn parse(value: &str) -> Result<Self, InvalidDate> {
        if !date_pattern().is_match(value) {
            return Err(InvalidDate(value.to_string()));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| InvalidDate(value.to_string()))
    }

    /// Start of the day as an RFC 3339 UTC timestamp.
    pub fn start_of_day(&self) -> String {
        format!("{}T00:00:00Z", self)
    }

    /// Last second of the day as an RFC 3339 UTC timestamp.
    pub fn end_of_day(&self) -> String {
        format!("{}T23:59:59Z", self)
    }

    /// The underlying calendar date.
    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for ImageryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for ImageryDate {
    type Err = InvalidDate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImageryDate {
    type Error = InvalidDate;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImageryDate> for String {
    fn from(date: ImageryDate) -> Self {
        date.to_string()
    }
}
