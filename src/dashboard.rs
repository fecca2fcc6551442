use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use crate::codec::DateFormat;
use crate::filter::{FilterEvent, FilterMode, FilterState, StatsRequest};
use crate::picker::{DateRangePicker, PickerEvent};
use crate::record::StatRecord;
use crate::source::{QueryStatus, QueryStore, StatsQuery, StatsResponse, StatsSource};
use crate::stats::{self, AggregatedStat, StatsSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    SetMode(FilterMode),
    SetYear(String),
    SetMonth(String),
    Picker(PickerEvent),
}

/// Data shown for the active request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub mode: FilterMode,
    pub request_key: String,
    pub stats: Vec<AggregatedStat>,
    pub summary: StatsSummary,
    /// Rows as delivered, for the per-period detail table.
    pub detail: Vec<StatRecord>,
}

impl DashboardView {
    pub fn has_chart(&self) -> bool {
        stats::has_positive_series(&self.stats)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// The current parameters do not admit any request.
    Idle,
    Loading,
    Unavailable(String),
    Ready(DashboardView),
}

#[derive(Debug)]
pub struct Dashboard {
    filter: FilterState,
    picker: Option<DateRangePicker>,
    store: QueryStore,
    range_format: DateFormat,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            filter: FilterState::new(),
            picker: None,
            store: QueryStore::new(),
            range_format: DateFormat::compact(),
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// The range picker; only present in day mode.
    pub fn picker(&self) -> Option<&DateRangePicker> {
        self.picker.as_ref()
    }

    pub fn requests(&self) -> [StatsRequest; 4] {
        self.filter.requests()
    }

    pub fn handle(&mut self, event: DashboardEvent, today: NaiveDate) {
        match event {
            DashboardEvent::SetMode(mode) => {
                self.filter = self.filter.apply(FilterEvent::SetMode(mode), today);
            }
            DashboardEvent::SetYear(year) => {
                self.filter = self.filter.apply(FilterEvent::SetYear(year), today);
            }
            DashboardEvent::SetMonth(month) => {
                self.filter = self.filter.apply(FilterEvent::SetMonth(month), today);
            }
            DashboardEvent::Picker(event) => {
                if let Some(picker) = &self.picker {
                    let (next, change) = picker.apply(event);
                    self.picker = Some(next);
                    if let Some(change) = change {
                        self.filter = self.filter.apply(FilterEvent::RangeChanged(change), today);
                    }
                }
            }
        }

        self.sync_picker();
    }

    // Mounts the picker on entering day mode, re-offers the current range as
    // its default while in day mode, and drops it otherwise.
    fn sync_picker(&mut self) {
        let default = self.filter.range_default();
        self.picker = match (self.filter.mode, self.picker.take()) {
            (FilterMode::Day, None) => Some(DateRangePicker::new(default.as_ref(), self.range_format.clone())),
            (FilterMode::Day, Some(picker)) => Some(picker.apply(PickerEvent::DefaultChanged(default)).0),
            _ => None,
        };
    }

    /// The active query if it is enabled and has not been dispatched yet.
    /// The query is marked in flight.
    pub fn next_fetch(&mut self) -> Option<StatsQuery> {
        let request = self.filter.active_request();
        if request.enabled && self.store.begin(&request.query) {
            Some(request.query)
        } else {
            None
        }
    }

    /// Stores a finished fetch under its own key, whichever request is active
    /// now.
    pub fn complete_fetch(&mut self, query: &StatsQuery, result: Result<StatsResponse>) {
        self.store.complete(query, result);
    }

    /// Fetches the active request from `source` if needed. Returns whether a
    /// fetch happened.
    pub fn refresh(&mut self, source: &dyn StatsSource) -> bool {
        match self.next_fetch() {
            Some(query) => {
                info!(action = "fetch", component = "dashboard", key = %query.cache_key(), "Dispatching statistics request");
                let result = source.fetch(&query);
                self.complete_fetch(&query, result);
                true
            }
            None => false,
        }
    }

    pub fn view(&self) -> ViewState {
        let request = self.filter.active_request();
        if !request.enabled {
            return ViewState::Idle;
        }

        match self.store.status(&request.query) {
            None | Some(QueryStatus::Loading) => ViewState::Loading,
            Some(QueryStatus::Failed(message)) => ViewState::Unavailable(message.clone()),
            Some(QueryStatus::Ready(records)) => {
                let stats = stats::aggregate_records(records);
                let summary = stats::summarize(&stats);
                ViewState::Ready(DashboardView {
                    mode: self.filter.mode,
                    request_key: request.query.cache_key(),
                    stats,
                    summary,
                    detail: records.clone(),
                })
            }
        }
    }
}
