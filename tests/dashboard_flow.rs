use std::fs;

use chrono::NaiveDate;
use clap::Parser;
use tempfile::TempDir;

use epistat::dashboard::{Dashboard, DashboardEvent, ViewState};
use epistat::filter::FilterMode;
use epistat::listing::{OccurrenceListQuery, PredictionByDateQuery, PredictionByDiseaseQuery};
use epistat::picker::PickerEvent;
use epistat::source::{JsonDirSource, StatsQuery};
use epistat::stats::UNCLASSIFIED;
use epistat::Args;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("by-day.json"),
        r#"{
            "result": true,
            "message": "ok",
            "data": [
                {"occurrenceDate": "20240101", "diseaseName": "FMD", "occurrenceCount": null, "totalLivestockCount": 10},
                {"occurrenceDate": "20240115", "diseaseName": "FMD", "occurrenceCount": null, "totalLivestockCount": 5},
                {"occurrenceDate": "20240301", "diseaseName": null, "occurrenceCount": null, "totalLivestockCount": 3}
            ]
        }"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("by-disease.json"),
        r#"{
            "result": true,
            "message": "ok",
            "data": [
                {"diseaseName": "ASF", "occurrenceCount": 4, "totalLivestockCount": 120, "firstOccurrenceDate": "20190917", "lastOccurrenceDate": "20231205"},
                {"diseaseName": "HPAI", "occurrenceCount": 9, "totalLivestockCount": 3400, "firstOccurrenceDate": "20201126", "lastOccurrenceDate": "20240110"}
            ]
        }"#,
    )
    .unwrap();
    dir
}

#[test]
fn day_range_aggregates_daily_rows() {
    let dir = data_dir();
    let source = JsonDirSource::new(dir.path());
    let mut dashboard = Dashboard::new();

    dashboard.handle(DashboardEvent::SetMode(FilterMode::Day), today());
    for event in [
        PickerEvent::Toggle,
        PickerEvent::Select {
            start: Some(ymd(2024, 1, 1)),
            end: Some(ymd(2024, 3, 1)),
        },
        PickerEvent::PointerDown { inside: false },
    ] {
        dashboard.handle(DashboardEvent::Picker(event), today());
    }

    assert!(dashboard.refresh(&source));
    assert!(!dashboard.refresh(&source));

    let view = match dashboard.view() {
        ViewState::Ready(view) => view,
        other => panic!("unexpected view {:?}", other),
    };

    assert_eq!(
        view.request_key,
        "/dashboard/disease-occurrence/statistics/by-day?startDate=20240101&endDate=20240301"
    );
    assert_eq!(view.stats.len(), 2);

    assert_eq!(view.stats[0].entity_name, "FMD");
    assert_eq!(view.stats[0].occurrence_count, 0);
    assert_eq!(view.stats[0].total_livestock_count, 15);
    assert_eq!(view.stats[0].first_occurrence_date.as_deref(), Some("20240101"));
    assert_eq!(view.stats[0].last_occurrence_date.as_deref(), Some("20240115"));

    assert_eq!(view.stats[1].entity_name, UNCLASSIFIED);
    assert_eq!(view.stats[1].total_livestock_count, 3);
    assert_eq!(view.stats[1].first_occurrence_date.as_deref(), Some("20240301"));
    assert_eq!(view.stats[1].last_occurrence_date.as_deref(), Some("20240301"));

    assert_eq!(view.summary.total_livestock, 18);
    assert_eq!(view.detail.len(), 3);
    assert!(view.has_chart());
}

#[test]
fn double_click_on_same_start_closes_picker_in_dashboard() {
    let mut dashboard = Dashboard::new();
    dashboard.handle(DashboardEvent::SetMode(FilterMode::Day), today());
    dashboard.handle(DashboardEvent::Picker(PickerEvent::Toggle), today());

    let click = PickerEvent::Select {
        start: Some(ymd(2024, 1, 1)),
        end: Some(ymd(2024, 1, 1)),
    };
    dashboard.handle(DashboardEvent::Picker(click.clone()), today());
    assert!(dashboard.picker().unwrap().is_open());

    dashboard.handle(DashboardEvent::Picker(click), today());
    assert!(!dashboard.picker().unwrap().is_open());
    assert_eq!(dashboard.filter().start_date, "20240101");
    assert_eq!(dashboard.filter().end_date, "20240101");
}

#[test]
fn switching_modes_never_enables_two_requests() {
    let mut dashboard = Dashboard::new();
    let modes = [
        FilterMode::Year,
        FilterMode::Day,
        FilterMode::Month,
        FilterMode::All,
        FilterMode::Day,
    ];

    for mode in modes {
        dashboard.handle(DashboardEvent::SetMode(mode), today());
        let enabled: Vec<StatsQuery> = dashboard
            .requests()
            .into_iter()
            .filter(|r| r.enabled)
            .map(|r| r.query)
            .collect();
        assert_eq!(enabled.len(), 1, "mode {:?}", mode);
    }
}

#[test]
fn missing_response_file_surfaces_as_unavailable() {
    let dir = TempDir::new().unwrap();
    let source = JsonDirSource::new(dir.path());
    let mut dashboard = Dashboard::new();
    dashboard.handle(DashboardEvent::SetMode(FilterMode::Year), today());

    dashboard.refresh(&source);
    assert!(matches!(dashboard.view(), ViewState::Unavailable(_)));
}

#[test]
fn analyze_statistics_from_command_line() {
    let dir = data_dir();
    let data_dir = dir.path().to_string_lossy().into_owned();
    let args = Args::parse_from(["epistat", "--data-dir", data_dir.as_str(), "--top", "1"]);
    let source = JsonDirSource::new(args.data_dir.clone());

    match epistat::analyze_statistics(&args, today(), &source).unwrap() {
        ViewState::Ready(view) => {
            assert_eq!(view.mode, FilterMode::All);
            assert_eq!(view.stats[0].entity_name, "HPAI");
            assert_eq!(view.stats[1].entity_name, "ASF");
            assert_eq!(view.stats[1].first_occurrence_date.as_deref(), Some("20190917"));
        }
        other => panic!("unexpected view {:?}", other),
    }
}

#[test]
fn listings_load_through_the_file_source() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("occurrences.json"),
        r#"{"result":true,"message":"","data":{"list":[
            {"id":1,"ictsd_occrrnc_no":"2024-0001","lknts_nm":"ASF","occrrnc_de":"20240105","occrrnc_lvstckcnt":12.0}
        ],"pagination":{"total":21,"page":1,"limit":20,"totalPages":2}}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("predict-by-disease.json"),
        r#"{"result":true,"message":"","data":{"diseaseName":"ASF","totalCount":1,"predictions":[
            {"id":9,"lknts_nm":"ASF","prediction_date":"20240320","confidence_score":55}
        ]}}"#,
    )
    .unwrap();
    let source = JsonDirSource::new(dir.path());

    let page = source.fetch_endpoint(&OccurrenceListQuery::default()).unwrap().data;
    assert_eq!(page.list[0].livestock_count, Some(12));
    assert!(page.pagination.has_next());

    let group = source
        .fetch_endpoint(&PredictionByDiseaseQuery::new("ASF"))
        .unwrap()
        .data;
    assert_eq!(group.total_count, 1);
    assert_eq!(group.predictions[0].confidence_fraction(), Some(0.55));

    assert!(source.fetch_endpoint(&PredictionByDiseaseQuery::new("")).is_err());
    assert!(source.fetch_endpoint(&PredictionByDateQuery::new("20240320")).is_err());
}

#[test]
fn listing_from_command_line() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("predict-by-date.json"),
        r#"{"result":true,"message":"","data":{"date":"20240320","totalCount":0,"predictions":[]}}"#,
    )
    .unwrap();
    let data_dir = dir.path().to_string_lossy().into_owned();
    let args = Args::parse_from([
        "epistat",
        "--data-dir",
        data_dir.as_str(),
        "--list",
        "predictions-by-date",
        "--date",
        "20240320",
    ]);
    let source = JsonDirSource::new(args.data_dir.clone());

    assert!(epistat::utils::validate_args(&args).is_ok());
    assert!(epistat::report::print_listing(&args, &source).is_ok());
}
