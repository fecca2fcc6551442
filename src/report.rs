use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::Instant;
use tracing::info;

use crate::codec::{self, DateFormat};
use crate::dashboard::{Dashboard, DashboardEvent, DashboardView, ViewState};
use crate::filter::FilterMode;
use crate::listing::{
    Listing, LivestockDiseaseOccurrence, LivestockDiseasePrediction, OccurrenceListQuery, PredictionByDateQuery,
    PredictionByDiseaseQuery, PredictionListQuery,
};
use crate::picker::PickerEvent;
use crate::source::{Endpoint, JsonDirSource, Pagination, StatsSource};
use crate::stats::AggregatedStat;
use crate::utils::{display_date, format_number};
use crate::Args;

/// Replays the command line as dashboard interactions: pick the mode, adjust
/// year/month, then open the range picker, select and click away.
pub fn build_dashboard(args: &Args, today: NaiveDate) -> Result<Dashboard> {
    let mut dashboard = Dashboard::new();
    dashboard.handle(DashboardEvent::SetMode(args.mode), today);

    if let Some(year) = &args.year {
        dashboard.handle(DashboardEvent::SetYear(year.clone()), today);
    }
    if let Some(month) = &args.month {
        dashboard.handle(DashboardEvent::SetMonth(month.clone()), today);
    }

    if let (Some(start), Some(end)) = (&args.start, &args.end) {
        let start = codec::decode(start).with_context(|| format!("Invalid --start {:?}", start))?;
        let end = codec::decode(end).with_context(|| format!("Invalid --end {:?}", end))?;
        if end < start {
            anyhow::bail!("--end must not be before --start");
        }

        for event in [
            PickerEvent::Toggle,
            PickerEvent::Select {
                start: Some(start),
                end: Some(end),
            },
            PickerEvent::PointerDown { inside: false },
        ] {
            dashboard.handle(DashboardEvent::Picker(event), today);
        }
    }

    Ok(dashboard)
}

pub fn analyze_statistics(args: &Args, today: NaiveDate, source: &dyn StatsSource) -> Result<ViewState> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "analysis", mode = args.mode.as_str(), "Starting statistics analysis");

    let mut dashboard = build_dashboard(args, today)?;
    dashboard.refresh(source);
    let view = dashboard.view();

    info!(
        action = "complete",
        component = "analysis",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Analysis completed"
    );
    Ok(view)
}

fn mode_title(mode: FilterMode) -> &'static str {
    match mode {
        FilterMode::All => "All Time",
        FilterMode::Year => "Yearly",
        FilterMode::Month => "Monthly",
        FilterMode::Day => "Daily",
    }
}

fn print_ranked(heading: &str, rows: &[&AggregatedStat]) {
    println!("\n{} {} diseases:", heading, rows.len());
    for stat in rows {
        println!(
            "- {}: {} head in {} occurrences",
            stat.entity_name,
            format_number(stat.total_livestock_count),
            format_number(stat.occurrence_count)
        );
    }
}

pub fn print_analysis_results(view: &DashboardView, args: &Args) {
    let format = DateFormat::new(&args.date_format);

    println!("\n--- {} Disease Occurrence Statistics ---", mode_title(view.mode));
    println!("Request: {}", view.request_key);
    println!(
        "Diseases: {}, occurrences: {}, livestock: {}",
        format_number(view.summary.entity_count as u64),
        format_number(view.summary.total_occurrences),
        format_number(view.summary.total_livestock)
    );

    if view.stats.is_empty() {
        println!("\nNo data.");
        return;
    }
    if !view.has_chart() {
        println!("\nNo chart data.");
    }

    let ranked: Vec<&AggregatedStat> = view.stats.iter().collect();
    let top = args.top.unwrap_or(ranked.len()).min(ranked.len());
    print_ranked("Top", &ranked[..top]);

    if let Some(bottom) = args.bottom {
        let bottom = bottom.min(ranked.len());
        let least: Vec<&AggregatedStat> = ranked.iter().rev().take(bottom).copied().collect();
        print_ranked("Bottom", &least);
    }

    if view.mode == FilterMode::All {
        println!("\nFirst and latest occurrence:");
        for stat in &view.stats {
            println!(
                "- {}: {} .. {}",
                stat.entity_name,
                display_date(stat.first_occurrence_date.as_deref(), &format),
                display_date(stat.last_occurrence_date.as_deref(), &format)
            );
        }
    }

    if args.detail {
        println!("\nDetail:");
        for record in &view.detail {
            let period = record
                .period_label()
                .map(|label| match view.mode {
                    FilterMode::Day => display_date(Some(&label), &format),
                    _ => label,
                })
                .unwrap_or_else(|| "-".to_string());
            println!(
                "- {} | {} | {} | {}",
                period,
                record.entity_name.as_deref().unwrap_or(crate::stats::UNCLASSIFIED),
                format_number(record.occurrence_count.unwrap_or(0)),
                format_number(record.total_livestock_count.unwrap_or(0))
            );
        }
    }
}

pub fn occurrence_query(args: &Args) -> OccurrenceListQuery {
    OccurrenceListQuery {
        page: args.page,
        limit: args.limit,
        disease_name: args.disease.clone(),
        farm_name: args.farm.clone(),
        occurrence_date: args.date.clone(),
        species_name: args.species.clone(),
    }
}

pub fn prediction_query(args: &Args) -> PredictionListQuery {
    PredictionListQuery {
        page: args.page,
        limit: args.limit,
        disease_name: args.disease.clone(),
        prediction_date: args.date.clone(),
        start_date: args.start.clone(),
        end_date: args.end.clone(),
        upcoming: args.upcoming,
        region: args.region.clone(),
        risk_level: args.risk.clone(),
        min_confidence: args.min_confidence,
        enabled: true,
    }
}

fn require_enabled<E: Endpoint>(endpoint: &E, hint: &str) -> Result<()> {
    if !endpoint.enabled() {
        anyhow::bail!("{} needs {}", endpoint.cache_key(), hint);
    }
    Ok(())
}

fn print_page(pagination: &Pagination) {
    println!(
        "\nPage {} of {} ({} records){}",
        pagination.page,
        pagination.total_pages,
        format_number(pagination.total),
        if pagination.has_next() { ", more with --page" } else { "" }
    );
}

fn print_occurrence(row: &LivestockDiseaseOccurrence, format: &DateFormat) {
    println!(
        "- {} | {} | {} | {} | {} | {} head",
        row.report_number,
        display_date(row.occurrence_date.as_deref(), format),
        row.disease_name.as_deref().unwrap_or(crate::stats::UNCLASSIFIED),
        row.farm_name.as_deref().unwrap_or("-"),
        row.species_name.as_deref().unwrap_or("-"),
        format_number(row.livestock_count.unwrap_or(0))
    );
}

fn print_prediction(row: &LivestockDiseasePrediction, format: &DateFormat) {
    let confidence = row
        .confidence_fraction()
        .map(|c| format!("{:.0}%", c * 100.0))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "- {} | {} | {} | risk {} | confidence {}",
        display_date(Some(&row.prediction_date), format),
        row.disease_name.as_deref().unwrap_or(crate::stats::UNCLASSIFIED),
        row.region.as_deref().unwrap_or("-"),
        row.risk_level.as_deref().unwrap_or("-"),
        confidence
    );
}

/// Loads and prints the listing selected with `--list`.
pub fn print_listing(args: &Args, source: &JsonDirSource) -> Result<()> {
    let format = DateFormat::new(&args.date_format);

    match args.list {
        None => Ok(()),
        Some(Listing::Occurrences) => {
            let query = occurrence_query(args);
            let page = source.fetch_endpoint(&query)?.data;
            println!("\n--- Disease Occurrences ---");
            println!("Request: {}", query.cache_key());
            for row in &page.list {
                print_occurrence(row, &format);
            }
            print_page(&page.pagination);
            Ok(())
        }
        Some(Listing::Predictions) => {
            let query = prediction_query(args);
            let page = source.fetch_endpoint(&query)?.data;
            println!("\n--- Disease Predictions ---");
            println!("Request: {}", query.cache_key());
            for row in &page.list {
                print_prediction(row, &format);
            }
            print_page(&page.pagination);
            Ok(())
        }
        Some(Listing::PredictionsByDisease) => {
            let query = PredictionByDiseaseQuery::new(args.disease.clone().unwrap_or_default());
            require_enabled(&query, "a non-empty --disease")?;
            let group = source.fetch_endpoint(&query)?.data;
            println!("\n--- Predictions for {} ({}) ---", group.disease_name, format_number(group.total_count));
            for row in &group.predictions {
                print_prediction(row, &format);
            }
            Ok(())
        }
        Some(Listing::PredictionsByDate) => {
            let query = PredictionByDateQuery::new(args.date.clone().unwrap_or_default());
            require_enabled(&query, "a non-empty --date")?;
            let group = source.fetch_endpoint(&query)?.data;
            println!(
                "\n--- Predictions for {} ({}) ---",
                display_date(Some(&group.date), &format),
                format_number(group.total_count)
            );
            for row in &group.predictions {
                print_prediction(row, &format);
            }
            Ok(())
        }
    }
}
