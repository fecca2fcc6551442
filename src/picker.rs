//! Date-range picker interaction state.
//!
//! The picker owns its open/closed flag and the calendar selection, and talks
//! to the outside world only in compact or formatted strings. Every
//! interaction goes through [`DateRangePicker::apply`], which returns the next
//! state together with the range event to forward, if any.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::{self, CompactRange, DateFormat};

/// Key correlating the selection with the calendar widget.
pub const SELECTION_KEY: &str = "selection";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickerPhase {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeSelection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl RangeSelection {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn key(&self) -> &'static str {
        SELECTION_KEY
    }
}

/// Range event forwarded to the owner of the picker. Both ends are set after a
/// completed selection and both are `None` after a clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeChange {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeChange {
    pub fn cleared() -> Self {
        Self {
            start_date: None,
            end_date: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    /// Click on the display area.
    Toggle,
    /// Pointer went down somewhere on the page; `inside` is the caller's hit
    /// test against the picker's bounds.
    PointerDown { inside: bool },
    /// The calendar reported a new selection. `end` is `None` while only the
    /// first endpoint has been picked.
    Select {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    Clear,
    /// The owner re-rendered with a (possibly different) default range.
    DefaultChanged(Option<CompactRange>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRangePicker {
    phase: PickerPhase,
    selection: RangeSelection,
    has_user_interacted: bool,
    last_closed_start_key: Option<String>,
    format: DateFormat,
}

impl DateRangePicker {
    /// Builds a closed picker. A default that fails to decode leaves the
    /// selection empty.
    pub fn new(default: Option<&CompactRange>, format: DateFormat) -> Self {
        let picker = Self {
            phase: PickerPhase::Closed,
            selection: RangeSelection::default(),
            has_user_interacted: false,
            last_closed_start_key: None,
            format,
        };

        match default {
            Some(range) => picker.with_default(range),
            None => picker,
        }
    }

    pub fn phase(&self) -> PickerPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == PickerPhase::Open
    }

    pub fn selection(&self) -> RangeSelection {
        self.selection
    }

    pub fn has_user_interacted(&self) -> bool {
        self.has_user_interacted
    }

    pub fn last_closed_start_key(&self) -> Option<&str> {
        self.last_closed_start_key.as_deref()
    }

    pub fn format(&self) -> &DateFormat {
        &self.format
    }

    pub fn apply(&self, event: PickerEvent) -> (Self, Option<RangeChange>) {
        let mut next = self.clone();

        let change = match event {
            PickerEvent::Toggle => {
                if next.is_open() {
                    next.close();
                } else {
                    next.phase = PickerPhase::Open;
                }
                None
            }
            PickerEvent::PointerDown { inside } => {
                if next.is_open() && !inside {
                    next.close();
                }
                None
            }
            PickerEvent::Select { start, end } => next.select(start, end),
            PickerEvent::Clear => {
                next.selection = RangeSelection::default();
                next.close();
                Some(RangeChange::cleared())
            }
            PickerEvent::DefaultChanged(Some(range)) if !next.has_user_interacted => {
                next = next.with_default(&range);
                None
            }
            PickerEvent::DefaultChanged(_) => None,
        };

        debug!(
            action = "transition",
            component = "date_range_picker",
            open = next.is_open(),
            interacted = next.has_user_interacted,
            emitted = change.is_some(),
            "Picker event applied"
        );

        (next, change)
    }

    fn with_default(mut self, range: &CompactRange) -> Self {
        match codec::decode_range(range) {
            Ok((start, end)) => {
                self.selection = RangeSelection::new(start, end);
                self.has_user_interacted = true;
            }
            Err(e) => {
                warn!(
                    action = "decode",
                    component = "date_range_picker",
                    start = %range.start_date,
                    end = %range.end_date,
                    error = %e,
                    "Ignoring undecodable default range"
                );
            }
        }
        self
    }

    fn select(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<RangeChange> {
        // The calendar is only mounted while open.
        if !self.is_open() {
            return None;
        }

        self.selection = RangeSelection { start, end };
        self.has_user_interacted = true;

        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            _ => return None,
        };

        let start_key = self.format.format(start);
        if self.last_closed_start_key.as_deref() == Some(start_key.as_str()) {
            self.close();
        } else {
            self.last_closed_start_key = Some(start_key.clone());
        }

        Some(RangeChange {
            start_date: Some(start_key),
            end_date: Some(self.format.format(end)),
        })
    }

    // Repeated-start tracking is scoped to a single open session.
    fn close(&mut self) {
        self.phase = PickerPhase::Closed;
        self.last_closed_start_key = None;
    }

    /// Text shown in the picker's display area. With only a start date picked
    /// the start date is shown on both sides of the range.
    pub fn display_text(&self, placeholder: &str) -> String {
        let start = codec::encode(self.selection.start, &self.format);
        let end = match self.selection.end {
            None => start.clone(),
            Some(_) => codec::encode(self.selection.end, &self.format),
        };

        if !self.is_open() && start.is_none() && end.is_none() {
            return placeholder.to_string();
        }

        format!(
            "{} - {}",
            start.unwrap_or_default(),
            end.unwrap_or_default()
        )
    }
}

/// Quick-pick ranges offered next to the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetRange {
    Today,
    LastWeek,
    LastMonth,
    LastTwoMonths,
    LastThreeMonths,
    ThisMonth,
}

impl PresetRange {
    pub const ALL: [PresetRange; 6] = [
        PresetRange::Today,
        PresetRange::LastWeek,
        PresetRange::LastMonth,
        PresetRange::LastTwoMonths,
        PresetRange::LastThreeMonths,
        PresetRange::ThisMonth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PresetRange::Today => "Today",
            PresetRange::LastWeek => "Last 7 days",
            PresetRange::LastMonth => "Last month",
            PresetRange::LastTwoMonths => "Last 2 months",
            PresetRange::LastThreeMonths => "Last 3 months",
            PresetRange::ThisMonth => "This month",
        }
    }

    pub fn range(self, today: NaiveDate) -> RangeSelection {
        let months_back = |n: u32| today.checked_sub_months(Months::new(n)).unwrap_or(today);

        match self {
            PresetRange::Today => RangeSelection::new(today, today),
            PresetRange::LastWeek => RangeSelection::new(today - Duration::days(6), today),
            PresetRange::LastMonth => RangeSelection::new(months_back(1), today),
            PresetRange::LastTwoMonths => RangeSelection::new(months_back(2), today),
            PresetRange::LastThreeMonths => RangeSelection::new(months_back(3), today),
            PresetRange::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(today);
                RangeSelection::new(first, last)
            }
        }
    }

    /// The selection event a click on this preset produces.
    pub fn event(self, today: NaiveDate) -> PickerEvent {
        let range = self.range(today);
        PickerEvent::Select {
            start: range.start,
            end: range.end,
        }
    }
}
