//! Calendar date keys for diary and profile maps.
//!
//! # Invariants
//! - A `DateKey` is always a real calendar date in strict `YYYY-MM-DD` form.
//! - Lexicographic order of keys equals chronological order.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

static DATE_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date shape regex"));

/// Validated ISO 8601 calendar date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(String);

impl DateKey {
    /// Parses a strict `YYYY-MM-DD` date. Surrounding whitespace is ignored.
    ///
    /// # Errors
    /// - `InvalidFormat` when the shape is not `YYYY-MM-DD`.
    /// - `InvalidCalendarDate` for impossible dates such as `2023-02-29`.
    pub fn parse(value: &str) -> Result<Self, DateKeyError> {
        let trimmed = value.trim();
        if !DATE_SHAPE_RE.is_match(trimmed) {
            return Err(DateKeyError::InvalidFormat(value.to_string()));
        }
        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map_err(|_| DateKeyError::InvalidCalendarDate(trimmed.to_string()))?;
        Ok(Self(trimmed.to_string()))
    }

    /// Current local date.
    pub fn today() -> Self {
        Self(Local::now().date_naive().format(DATE_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DateKey {
    type Err = DateKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for DateKey {
    type Error = DateKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DateKey> for String {
    fn from(value: DateKey) -> Self {
        value.0
    }
}

/// Date parsing failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateKeyError {
    InvalidFormat(String),
    InvalidCalendarDate(String),
}

impl Display for DateKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(value) => {
                write!(f, "invalid date `{value}`; expected YYYY-MM-DD")
            }
            Self::InvalidCalendarDate(value) => write!(f, "`{value}` is not a calendar date"),
        }
    }
}

impl Error for DateKeyError {}
