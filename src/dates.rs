use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimeflowError};

/// Storage format for calendar days.
pub const DATE_FORMAT_DB: &str = "%Y-%m-%d";
/// Human-facing format, e.g. `January 2, 2024`.
pub const DATE_FORMAT_DISPLAY: &str = "%B %-d, %Y";

/// A date with no time of day or timezone, keyed as `YYYY-MM-DD`.
///
/// Comparison and ordering follow the calendar, so sorting days sorts them
/// chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    /// The current local calendar day.
    pub fn today() -> Self {
        CalendarDay(Local::now().date_naive())
    }

    /// Parses a strict `YYYY-MM-DD` key.
    ///
    /// Anything else, including unpadded months or days, is rejected rather
    /// than coerced.
    pub fn parse(input: &str) -> Result<Self> {
        if !has_shape(input, &[4, 2, 2]) {
            return Err(TimeflowError::invalid_date(input, "expected YYYY-MM-DD"));
        }
        NaiveDate::parse_from_str(input, DATE_FORMAT_DB)
            .map(CalendarDay)
            .map_err(|e| TimeflowError::invalid_date(input, e.to_string()))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        CalendarDay(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(CalendarDay)
            .ok_or_else(|| {
                TimeflowError::invalid_date(
                    format!("{:04}-{:02}-{:02}", year, month, day),
                    "no such calendar day",
                )
            })
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Signed number of calendar days from `other` to `self` (`self - other`).
    pub fn days_between(&self, other: &CalendarDay) -> i64 {
        (self.0 - other.0).num_days()
    }

    /// The day `n` days after this one (before, for negative `n`).
    pub fn add_days(&self, n: i64) -> Result<Self> {
        Duration::try_days(n)
            .and_then(|d| self.0.checked_add_signed(d))
            .map(CalendarDay)
            .ok_or_else(|| TimeflowError::validation("days", format!("{} days from {} is out of range", n, self)))
    }

    pub fn is_same_day(&self, other: &CalendarDay) -> bool {
        self.0 == other.0
    }

    /// Renders the day for people rather than storage.
    pub fn display(&self) -> String {
        self.0.format(DATE_FORMAT_DISPLAY).to_string()
    }

    pub fn month(&self) -> YearMonth {
        YearMonth {
            year: self.0.year(),
            month: self.0.month(),
        }
    }

    pub fn day_of_month(&self) -> u32 {
        self.0.day()
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT_DB))
    }
}

impl FromStr for CalendarDay {
    type Err = TimeflowError;

    fn from_str(s: &str) -> Result<Self> {
        CalendarDay::parse(s)
    }
}

impl TryFrom<String> for CalendarDay {
    type Error = TimeflowError;

    fn try_from(value: String) -> Result<Self> {
        CalendarDay::parse(&value)
    }
}

impl From<CalendarDay> for String {
    fn from(day: CalendarDay) -> Self {
        day.to_string()
    }
}

/// A calendar month, keyed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(TimeflowError::invalid_date(
                format!("{:04}-{:02}", year, month),
                "no such month",
            ));
        }
        Ok(YearMonth { year, month })
    }

    /// The month containing today.
    pub fn current() -> Self {
        CalendarDay::today().month()
    }

    pub fn parse(input: &str) -> Result<Self> {
        if !has_shape(input, &[4, 2]) {
            return Err(TimeflowError::invalid_date(input, "expected YYYY-MM"));
        }
        let (year, month) = input.split_at(4);
        let year = year
            .parse::<i32>()
            .map_err(|e| TimeflowError::invalid_date(input, e.to_string()))?;
        let month = month[1..]
            .parse::<u32>()
            .map_err(|e| TimeflowError::invalid_date(input, e.to_string()))?;
        YearMonth::new(year, month).map_err(|_| TimeflowError::invalid_date(input, "no such month"))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> CalendarDay {
        // `new` and `parse` only admit months whose first day exists
        CalendarDay(NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default())
    }

    /// Every day of the month, in order.
    pub fn days(&self) -> Vec<CalendarDay> {
        let month = self.month;
        self.first_day()
            .date()
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(CalendarDay)
            .collect()
    }

    pub fn contains(&self, day: &CalendarDay) -> bool {
        day.date().year() == self.year && day.date().month() == self.month
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            YearMonth { year: self.year - 1, month: 12 }
        } else {
            YearMonth { year: self.year, month: self.month - 1 }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            YearMonth { year: self.year + 1, month: 1 }
        } else {
            YearMonth { year: self.year, month: self.month + 1 }
        }
    }

    /// Month title such as `January 2024`.
    pub fn display(&self) -> String {
        self.first_day().date().format("%B %Y").to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = TimeflowError;

    fn from_str(s: &str) -> Result<Self> {
        YearMonth::parse(s)
    }
}

/// Source of "today" for anything that depends on the current day.
pub trait Clock {
    fn today(&self) -> CalendarDay;
}

/// Reads the local system date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> CalendarDay {
        CalendarDay::today()
    }
}

/// Always reports the same day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub CalendarDay);

impl Clock for FixedClock {
    fn today(&self) -> CalendarDay {
        self.0
    }
}

/// Checks for dash-separated groups of ASCII digits with the given widths.
fn has_shape(input: &str, widths: &[usize]) -> bool {
    let groups: Vec<&str> = input.split('-').collect();
    groups.len() == widths.len()
        && groups
            .iter()
            .zip(widths)
            .all(|(g, w)| g.len() == *w && g.bytes().all(|b| b.is_ascii_digit()))
}
