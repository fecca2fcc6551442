//! Conversion between compact `YYYYMMDD` strings and calendar dates.

use std::ops::Range;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of leading characters a compact date must carry.
pub const COMPACT_LEN: usize = 8;

pub const DEFAULT_PATTERN: &str = "yyyy-MM-dd";
pub const COMPACT_PATTERN: &str = "yyyyMMdd";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("compact date {input:?} is shorter than 8 characters")]
    TooShort { input: String },

    #[error("compact date {input:?} has a non-numeric {field}")]
    NonNumeric { field: &'static str, input: String },

    #[error("{year:04}-{month:02}-{day:02} is not a calendar date")]
    InvalidDate { year: u32, month: u32, day: u32 },
}

/// A start/end pair in compact form, as handed to and emitted by the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactRange {
    pub start_date: String,
    pub end_date: String,
}

impl CompactRange {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }
}

/// Parses the first eight characters of `compact` as year, 1-indexed month
/// and day. Dates that do not exist (Feb 30, month 13) are rejected instead
/// of rolling over into the following month.
pub fn decode(compact: &str) -> Result<NaiveDate, DecodeError> {
    if compact.len() < COMPACT_LEN {
        return Err(DecodeError::TooShort {
            input: compact.to_string(),
        });
    }

    let year = numeric_field(compact, 0..4, "year")?;
    let month = numeric_field(compact, 4..6, "month")?;
    let day = numeric_field(compact, 6..8, "day")?;

    NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or(DecodeError::InvalidDate { year, month, day })
}

fn numeric_field(input: &str, range: Range<usize>, field: &'static str) -> Result<u32, DecodeError> {
    let non_numeric = || DecodeError::NonNumeric {
        field,
        input: input.to_string(),
    };

    let digits = input
        .get(range)
        .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(non_numeric)?;

    digits.parse().map_err(|_| non_numeric())
}

/// Decodes both ends of a range; the first failing endpoint wins.
pub fn decode_range(range: &CompactRange) -> Result<(NaiveDate, NaiveDate), DecodeError> {
    Ok((decode(&range.start_date)?, decode(&range.end_date)?))
}

/// Formats `date` with `format`. A missing date stays missing.
pub fn encode(date: Option<NaiveDate>, format: &DateFormat) -> Option<String> {
    date.map(|d| format.format(d))
}

pub fn encode_compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// A display pattern written with `yyyy`/`MM`/`dd` style tokens, translated
/// once into a chrono format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
    strftime: String,
}

fn token_regex() -> &'static Regex {
    static TOKENS: OnceLock<Regex> = OnceLock::new();
    TOKENS.get_or_init(|| {
        Regex::new(r"yyyy|yy|MM|M|dd|d|[^yMd]+|[yMd]").expect("token pattern is a valid regex")
    })
}

impl DateFormat {
    pub fn new(pattern: &str) -> Self {
        let mut strftime = String::with_capacity(pattern.len() * 2);
        for token in token_regex().find_iter(pattern) {
            match token.as_str() {
                "yyyy" => strftime.push_str("%Y"),
                "yy" => strftime.push_str("%y"),
                "MM" => strftime.push_str("%m"),
                "M" => strftime.push_str("%-m"),
                "dd" => strftime.push_str("%d"),
                "d" => strftime.push_str("%-d"),
                literal => strftime.push_str(&literal.replace('%', "%%")),
            }
        }

        Self {
            pattern: pattern.to_string(),
            strftime,
        }
    }

    pub fn compact() -> Self {
        Self::new(COMPACT_PATTERN)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format(&self, date: NaiveDate) -> String {
        date.format(&self.strftime).to_string()
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}
