use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{self, CompactRange};
use crate::picker::RangeChange;
use crate::source::StatsQuery;

/// Earliest year offered by the year selector.
pub const FIRST_SELECTABLE_YEAR: i32 = 2000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Year,
    Month,
    Day,
}

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 4] = [FilterMode::All, FilterMode::Year, FilterMode::Month, FilterMode::Day];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Year => "year",
            FilterMode::Month => "month",
            FilterMode::Day => "day",
        }
    }
}

/// Mode plus its dependent fields. Empty strings mean "not selected".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub mode: FilterMode,
    pub year: String,
    pub month: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    SetMode(FilterMode),
    SetYear(String),
    SetMonth(String),
    RangeChanged(RangeChange),
}

/// A query together with its admission flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRequest {
    pub query: StatsQuery,
    pub enabled: bool,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next state after `event`. `today` supplies the defaults a mode change
    /// fills in.
    pub fn apply(&self, event: FilterEvent, today: NaiveDate) -> Self {
        let next = match event {
            FilterEvent::SetMode(mode) if mode == self.mode => self.clone(),
            FilterEvent::SetMode(mode) => Self::entering(mode, today),
            FilterEvent::SetYear(year) => self.with_year(year),
            FilterEvent::SetMonth(month) => self.with_month(month),
            FilterEvent::RangeChanged(change) => self.with_range(change),
        };

        debug!(
            action = "transition",
            component = "filter",
            mode = next.mode.as_str(),
            year = %next.year,
            month = %next.month,
            start_date = %next.start_date,
            end_date = %next.end_date,
            "Filter state updated"
        );

        next
    }

    fn entering(mode: FilterMode, today: NaiveDate) -> Self {
        let current_year = today.year().to_string();
        let current_month = format!("{:02}", today.month());

        match mode {
            FilterMode::All => Self::default(),
            FilterMode::Year => Self {
                mode,
                year: current_year,
                ..Default::default()
            },
            FilterMode::Month => Self {
                mode,
                year: current_year,
                month: current_month,
                ..Default::default()
            },
            FilterMode::Day => {
                let first_of_month = today.with_day(1).unwrap_or(today);
                Self {
                    mode,
                    start_date: codec::encode_compact(first_of_month),
                    end_date: codec::encode_compact(today),
                    ..Default::default()
                }
            }
        }
    }

    // Fields the current mode does not use stay empty, so events that would
    // set them are dropped. In day mode a year/month replaces the range.
    fn with_year(&self, year: String) -> Self {
        match self.mode {
            FilterMode::All => self.clone(),
            FilterMode::Year | FilterMode::Month => Self { year, ..self.clone() },
            FilterMode::Day => Self {
                year,
                start_date: String::new(),
                end_date: String::new(),
                ..self.clone()
            },
        }
    }

    fn with_month(&self, month: String) -> Self {
        match self.mode {
            FilterMode::All | FilterMode::Year => self.clone(),
            FilterMode::Month => Self { month, ..self.clone() },
            FilterMode::Day => Self {
                month,
                start_date: String::new(),
                end_date: String::new(),
                ..self.clone()
            },
        }
    }

    // An explicit range replaces any year/month selection. Only day mode has
    // a range.
    fn with_range(&self, change: RangeChange) -> Self {
        if self.mode != FilterMode::Day {
            return self.clone();
        }

        match (change.start_date, change.end_date) {
            (Some(start_date), Some(end_date)) => Self {
                mode: self.mode,
                year: String::new(),
                month: String::new(),
                start_date,
                end_date,
            },
            _ => Self {
                start_date: String::new(),
                end_date: String::new(),
                ..self.clone()
            },
        }
    }

    /// The start/end pair to seed the range picker with, if both are set.
    pub fn range_default(&self) -> Option<CompactRange> {
        if self.start_date.is_empty() || self.end_date.is_empty() {
            None
        } else {
            Some(CompactRange::new(self.start_date.clone(), self.end_date.clone()))
        }
    }

    /// All four statistics requests. They are always built, but at most one
    /// of them is enabled.
    pub fn requests(&self) -> [StatsRequest; 4] {
        FilterMode::ALL_MODES.map(|mode| self.request_for(mode))
    }

    /// The request whose data is displayed for the current mode.
    pub fn active_request(&self) -> StatsRequest {
        self.request_for(self.mode)
    }

    fn request_for(&self, mode: FilterMode) -> StatsRequest {
        let active = self.mode == mode;
        let when = |value: &str| -> Option<String> {
            (active && !value.is_empty()).then(|| value.to_string())
        };

        match mode {
            FilterMode::All => StatsRequest {
                query: StatsQuery::ByDisease,
                enabled: active,
            },
            FilterMode::Year => StatsRequest {
                query: StatsQuery::ByYear { year: when(&self.year) },
                enabled: active,
            },
            FilterMode::Month => StatsRequest {
                query: StatsQuery::ByMonth {
                    year: if active { self.year.clone() } else { String::new() },
                    month: when(&self.month),
                },
                enabled: active && !self.year.is_empty(),
            },
            FilterMode::Day => {
                let has_range = !self.start_date.is_empty();
                StatsRequest {
                    query: StatsQuery::ByDay {
                        year: if has_range { None } else { when(&self.year) },
                        month: if has_range { None } else { when(&self.month) },
                        start_date: when(&self.start_date),
                        end_date: when(&self.end_date),
                    },
                    enabled: active && (has_range || !self.year.is_empty()),
                }
            }
        }
    }
}

/// Years offered by the year selector, newest first.
pub fn year_options(today: NaiveDate) -> Vec<String> {
    (FIRST_SELECTABLE_YEAR..=today.year())
        .rev()
        .map(|y| y.to_string())
        .collect()
}

pub fn month_options() -> Vec<String> {
    (1..=12).map(|m| format!("{:02}", m)).collect()
}
