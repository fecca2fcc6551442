use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::record::{NormalizedStat, StatRecord};

/// Label used for rows whose entity name is missing.
pub const UNCLASSIFIED: &str = "unclassified";

/// Per-entity totals across every row of one query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStat {
    pub entity_name: String,
    pub occurrence_count: u64,
    pub total_livestock_count: u64,
    pub first_occurrence_date: Option<String>,
    pub last_occurrence_date: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub entity_count: usize,
    pub total_occurrences: u64,
    pub total_livestock: u64,
}

impl AggregatedStat {
    fn start(name: String, stat: &NormalizedStat) -> Self {
        Self {
            entity_name: name,
            occurrence_count: stat.occurrence_count,
            total_livestock_count: stat.total_livestock_count,
            first_occurrence_date: stat.min_date.clone(),
            last_occurrence_date: stat.max_date.clone(),
        }
    }

    fn absorb(&mut self, stat: &NormalizedStat) {
        self.occurrence_count = add_count(self.occurrence_count, stat.occurrence_count, &self.entity_name);
        self.total_livestock_count = add_count(self.total_livestock_count, stat.total_livestock_count, &self.entity_name);

        if let Some(min) = &stat.min_date {
            if self.first_occurrence_date.as_ref().map_or(true, |cur| min < cur) {
                self.first_occurrence_date = Some(min.clone());
            }
        }
        if let Some(max) = &stat.max_date {
            if self.last_occurrence_date.as_ref().map_or(true, |cur| max > cur) {
                self.last_occurrence_date = Some(max.clone());
            }
        }
    }
}

// Counts come from source JSON; a sum past u64::MAX saturates.
fn add_count(total: u64, value: u64, entity: &str) -> u64 {
    total.checked_add(value).unwrap_or_else(|| {
        warn!(action = "aggregate", component = "aggregation", entity, "Count overflowed, saturating");
        u64::MAX
    })
}

/// Folds rows into one entry per entity, ordered by livestock count
/// descending. Entities with equal counts keep the order in which they were
/// first seen.
pub fn aggregate<'a, I>(stats: I) -> Vec<AggregatedStat>
where
    I: IntoIterator<Item = &'a NormalizedStat>,
{
    let start_time = Instant::now();

    // Insertion-ordered: entries[index[name]] is the accumulator for name.
    let mut entries: Vec<AggregatedStat> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows = 0usize;

    for stat in stats {
        rows += 1;
        let name = stat
            .entity_name
            .clone()
            .unwrap_or_else(|| UNCLASSIFIED.to_string());

        match index.get(&name) {
            Some(&slot) => entries[slot].absorb(stat),
            None => {
                index.insert(name.clone(), entries.len());
                entries.push(AggregatedStat::start(name, stat));
            }
        }
    }

    // sort_by is stable, which keeps ties in first-seen order.
    entries.sort_by(|a, b| b.total_livestock_count.cmp(&a.total_livestock_count));

    debug!(
        action = "complete",
        component = "aggregation",
        rows,
        entities = entries.len(),
        duration_us = start_time.elapsed().as_micros(),
        "Aggregation completed"
    );

    entries
}

/// Normalizes tagged records and aggregates them in one call.
pub fn aggregate_records(records: &[StatRecord]) -> Vec<AggregatedStat> {
    let normalized: Vec<NormalizedStat> = records.iter().map(StatRecord::normalize).collect();
    aggregate(&normalized)
}

pub fn summarize(stats: &[AggregatedStat]) -> StatsSummary {
    stats.iter().fold(
        StatsSummary {
            entity_count: stats.len(),
            ..Default::default()
        },
        |mut acc, stat| {
            acc.total_occurrences = add_count(acc.total_occurrences, stat.occurrence_count, "summary");
            acc.total_livestock = add_count(acc.total_livestock, stat.total_livestock_count, "summary");
            acc
        },
    )
}

/// Whether a chart of livestock counts would show any bar at all.
pub fn has_positive_series(stats: &[AggregatedStat]) -> bool {
    stats.iter().any(|s| s.total_livestock_count > 0)
}
