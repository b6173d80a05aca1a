//! Day and window expressions accepted on the command line
//!
//! - Days: `today`, `yesterday`, `YYYY-MM-DD`
//! - Windows: `Nd` or `Nw` (`7d`, `2w`)

use chrono::{Days, NaiveDate};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DateParseError {
    #[error("Cannot parse date '{0}' (use today, yesterday or YYYY-MM-DD)")]
    Day(String),

    #[error("Cannot parse window '{0}' (use e.g. 7d or 2w)")]
    Window(String),
}

/// Resolve a day expression relative to `today`
pub fn parse_day(s: &str, today: NaiveDate) -> Result<NaiveDate, DateParseError> {
    match s.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => today
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| DateParseError::Day(s.to_string())),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|_| DateParseError::Day(s.to_string())),
    }
}

/// Parse a window length into a number of days
pub fn parse_window(s: &str) -> Result<u32, DateParseError> {
    let re = regex::Regex::new(r"^(\d+)([dw])$")
        .map_err(|_| DateParseError::Window(s.to_string()))?;

    let caps = re
        .captures(s.trim())
        .ok_or_else(|| DateParseError::Window(s.to_string()))?;

    let amount: u32 = caps[1]
        .parse()
        .map_err(|_| DateParseError::Window(s.to_string()))?;

    let days = match &caps[2] {
        "w" => amount.checked_mul(7),
        _ => Some(amount),
    };

    match days {
        Some(days) if days > 0 => Ok(days),
        _ => Err(DateParseError::Window(s.to_string())),
    }
}
