//! Time-period phrase parsing
//!
//! Turns informal phrases ("this month", "last 10 days", an explicit
//! `YYYY-MM-DD to YYYY-MM-DD` range) into concrete inclusive date
//! ranges for the observation API.

use std::fmt;

use chrono::{Datelike, Duration, Local, NaiveDate};

use crate::error::{DiffError, Result};

/// An inclusive date range, both endpoints `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_str(), self.end_str())
    }
}

/// Parse a time-period phrase into a date range, using the local date
/// as "today".
///
/// Supported formats, tried in order:
/// 1. `YYYY-MM-DD to YYYY-MM-DD` (explicit range)
/// 2. `this month` / `last month`
/// 3. `this year` / `last year`
/// 4. `last N days|weeks|months|years` (also `past ...`)
/// 5. a bare number, read as N days back
///
/// Anything else fails with [`DiffError::InvalidTimeFormat`].
pub fn parse_time_period(phrase: &str) -> Result<TimeWindow> {
    parse_time_period_on(phrase, Local::now().date_naive())
}

/// Same as [`parse_time_period`] with an explicit "today", so callers
/// can pin the clock.
pub fn parse_time_period_on(phrase: &str, today: NaiveDate) -> Result<TimeWindow> {
    let phrase = phrase.trim().to_lowercase();

    if let Some(window) = parse_explicit_range(&phrase)? {
        return Ok(window);
    }

    match phrase.as_str() {
        "this month" => {
            let start = today.with_day(1).unwrap();
            let end = first_of_next_month(today) - Duration::days(1);
            return Ok(TimeWindow { start, end });
        }
        "last month" => {
            let end = today.with_day(1).unwrap() - Duration::days(1);
            let start = end.with_day(1).unwrap();
            return Ok(TimeWindow { start, end });
        }
        "this year" => {
            return Ok(year_window(today.year()));
        }
        "last year" => {
            return Ok(year_window(today.year() - 1));
        }
        _ => {}
    }

    if let Some(window) = parse_relative(&phrase, today) {
        return Ok(window);
    }

    // A bare number is read as "N days back from today"
    if !phrase.is_empty() && phrase.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(days) = phrase.parse::<i64>() {
            return Ok(TimeWindow {
                start: today - Duration::days(days),
                end: today,
            });
        }
    }

    Err(DiffError::InvalidTimeFormat(format!(
        "unable to parse time period: '{}'",
        phrase
    )))
}

/// `YYYY-MM-DD to YYYY-MM-DD`. Returns `Ok(None)` when the phrase is
/// not shaped like a range, so later grammars get a chance.
fn parse_explicit_range(phrase: &str) -> Result<Option<TimeWindow>> {
    let Some((lhs, rhs)) = phrase.split_once(" to ") else {
        return Ok(None);
    };

    let start = NaiveDate::parse_from_str(lhs.trim(), "%Y-%m-%d");
    let end = NaiveDate::parse_from_str(rhs.trim(), "%Y-%m-%d");
    let (Ok(start), Ok(end)) = (start, end) else {
        return Ok(None);
    };

    if start > end {
        return Err(DiffError::InvalidTimeFormat(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }

    Ok(Some(TimeWindow { start, end }))
}

/// `(last|past) N (day|week|month|year)s?`
fn parse_relative(phrase: &str, today: NaiveDate) -> Option<TimeWindow> {
    let mut words = phrase.split_whitespace();
    let lead = words.next()?;
    if lead != "last" && lead != "past" {
        return None;
    }

    let number = words.next()?.parse::<u32>().ok()? as i64;
    let unit = words.next()?;
    if words.next().is_some() {
        return None;
    }

    let unit = unit.strip_suffix('s').unwrap_or(unit);
    let start = match unit {
        "day" => today - Duration::days(number),
        "week" => today - Duration::weeks(number),
        // Months are approximated as exactly 30 days; downstream
        // consumers tolerate the 1-2 day drift vs. calendar months.
        "month" => today - Duration::days(number * 30),
        "year" => subtract_years(today, number as i32),
        _ => return None,
    };

    Some(TimeWindow { start, end: today })
}

fn year_window(year: i32) -> TimeWindow {
    TimeWindow {
        start: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
    }
}

fn first_of_next_month(today: NaiveDate) -> NaiveDate {
    if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1).unwrap()
    }
}

/// Calendar-year subtraction, not 365-day arithmetic. Feb 29 minus N
/// years clamps to Feb 28 when the target year is not a leap year.
fn subtract_years(date: NaiveDate, years: i32) -> NaiveDate {
    date.with_year(date.year() - years)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(date.year() - years, 2, 28).unwrap())
}
