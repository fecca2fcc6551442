use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::record::{Granularity, RawStatRecord, StatRecord};

pub const OCCURRENCE_BASE_PATH: &str = "/dashboard/disease-occurrence";
pub const STATISTICS_BASE_PATH: &str = "/dashboard/disease-occurrence/statistics";

/// Path plus url-encoded query string, or the bare path without parameters.
pub fn request_key<K, V>(path: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return path.to_string();
    }

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{}?{}", path, query)
}

/// A request descriptor outside the four statistics queries.
pub trait Endpoint {
    type Data: DeserializeOwned;

    /// Name of the captured response under a [`JsonDirSource`] root.
    fn file_stem(&self) -> &'static str;

    fn cache_key(&self) -> String;

    /// Whether the current parameters admit this request.
    fn enabled(&self) -> bool {
        true
    }
}

/// One of the four statistics endpoints with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatsQuery {
    ByDisease,
    ByYear {
        year: Option<String>,
    },
    ByMonth {
        year: String,
        month: Option<String>,
    },
    ByDay {
        year: Option<String>,
        month: Option<String>,
        start_date: Option<String>,
        end_date: Option<String>,
    },
}

impl StatsQuery {
    pub fn endpoint(&self) -> &'static str {
        match self {
            StatsQuery::ByDisease => "by-disease",
            StatsQuery::ByYear { .. } => "by-year",
            StatsQuery::ByMonth { .. } => "by-month",
            StatsQuery::ByDay { .. } => "by-day",
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            StatsQuery::ByDisease => Granularity::Overall,
            StatsQuery::ByYear { .. } => Granularity::Year,
            StatsQuery::ByMonth { .. } => Granularity::Month,
            StatsQuery::ByDay { .. } => Granularity::Day,
        }
    }

    /// Query parameters in the order they are sent.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::new();

        match self {
            StatsQuery::ByDisease => {}
            StatsQuery::ByYear { year } => push_param(&mut params, "year", year.as_deref()),
            StatsQuery::ByMonth { year, month } => {
                push_param(&mut params, "year", Some(year.as_str()));
                push_param(&mut params, "month", month.as_deref());
            }
            StatsQuery::ByDay {
                year,
                month,
                start_date,
                end_date,
            } => {
                push_param(&mut params, "year", year.as_deref());
                push_param(&mut params, "month", month.as_deref());
                push_param(&mut params, "startDate", start_date.as_deref());
                push_param(&mut params, "endDate", end_date.as_deref());
            }
        }

        params
    }

    /// Path plus encoded query string. Two queries share a key exactly when
    /// they would fetch the same data.
    pub fn cache_key(&self) -> String {
        let path = format!("{}/{}", STATISTICS_BASE_PATH, self.endpoint());
        request_key(&path, &self.params())
    }
}

fn push_param<'a>(params: &mut Vec<(&'static str, &'a str)>, name: &'static str, value: Option<&'a str>) {
    if let Some(v) = value {
        params.push((name, v));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListData<T> {
    pub list: Vec<T>,
    pub pagination: Pagination,
}

/// `{ result, message, data }` wrapper shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: bool,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

pub type StatsResponse = ApiResponse<Vec<RawStatRecord>>;

impl StatsResponse {
    /// Tags every row with the granularity of the query that produced it.
    pub fn into_records(self, query: &StatsQuery) -> Vec<StatRecord> {
        let granularity = query.granularity();
        self.data.into_iter().map(|raw| raw.tag(granularity)).collect()
    }
}

pub trait StatsSource {
    fn fetch(&self, query: &StatsQuery) -> Result<StatsResponse>;
}

/// Reads captured responses from `<root>/<endpoint>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, file_stem: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_stem))
    }

    /// Loads the captured response for `endpoint`. A request its parameters
    /// do not admit is never read.
    pub fn fetch_endpoint<E: Endpoint>(&self, endpoint: &E) -> Result<ApiResponse<E::Data>> {
        let key = endpoint.cache_key();
        if !endpoint.enabled() {
            anyhow::bail!("Request {} is not enabled for these parameters", key);
        }
        self.load(endpoint.file_stem(), &key)
    }

    fn load<T: DeserializeOwned>(&self, file_stem: &str, key: &str) -> Result<ApiResponse<T>> {
        let start_time = Instant::now();
        let path = self.path_for(file_stem);
        info!(action = "start", component = "json_source", key, path = ?path, "Loading response");

        let response: ApiResponse<T> = read_response(&path)?;
        if !response.result {
            anyhow::bail!("Source rejected {}: {}", key, response.message);
        }

        info!(
            action = "complete",
            component = "json_source",
            key,
            duration_ms = start_time.elapsed().as_millis(),
            "Response loaded"
        );
        Ok(response)
    }
}

impl StatsSource for JsonDirSource {
    fn fetch(&self, query: &StatsQuery) -> Result<StatsResponse> {
        let response: StatsResponse = self.load(query.endpoint(), &query.cache_key())?;
        info!(action = "fetch", component = "json_source", rows = response.data.len(), "Statistics rows received");
        Ok(response)
    }
}

fn read_response<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        anyhow::bail!("Response file not found at {:?}", path);
    }
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Malformed response in {:?}", path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    Loading,
    Ready(Vec<StatRecord>),
    Failed(String),
}

/// Fetch results keyed by [`StatsQuery::cache_key`]. A response is only ever
/// written under the key of the query that produced it, so a slow response
/// for an old parameter set cannot replace what the current key shows.
#[derive(Debug, Default)]
pub struct QueryStore {
    entries: HashMap<String, QueryStatus>,
}

impl QueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `query` as in flight. Returns false when it already has an entry.
    pub fn begin(&mut self, query: &StatsQuery) -> bool {
        let key = query.cache_key();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, QueryStatus::Loading);
        true
    }

    pub fn complete(&mut self, query: &StatsQuery, result: Result<StatsResponse>) {
        let key = query.cache_key();
        let status = match result {
            Ok(response) => QueryStatus::Ready(response.into_records(query)),
            Err(e) => {
                warn!(action = "fetch", component = "query_store", key = %key, error = %e, "Statistics fetch failed");
                QueryStatus::Failed(e.to_string())
            }
        };
        self.entries.insert(key, status);
    }

    pub fn status(&self, query: &StatsQuery) -> Option<&QueryStatus> {
        self.entries.get(&query.cache_key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn by_day(start: &str, end: &str) -> StatsQuery {
        StatsQuery::ByDay {
            year: None,
            month: None,
            start_date: Some(start.into()),
            end_date: Some(end.into()),
        }
    }

    #[test]
    fn cache_keys() {
        assert_eq!(
            StatsQuery::ByDisease.cache_key(),
            "/dashboard/disease-occurrence/statistics/by-disease"
        );
        assert_eq!(
            StatsQuery::ByYear { year: None }.cache_key(),
            "/dashboard/disease-occurrence/statistics/by-year"
        );
        assert_eq!(
            StatsQuery::ByMonth {
                year: "2024".into(),
                month: Some("03".into())
            }
            .cache_key(),
            "/dashboard/disease-occurrence/statistics/by-month?year=2024&month=03"
        );
        assert_eq!(
            by_day("20240301", "20240315").cache_key(),
            "/dashboard/disease-occurrence/statistics/by-day?startDate=20240301&endDate=20240315"
        );
    }

    #[test]
    fn response_rows_take_query_granularity() {
        let json = r#"{"result":true,"message":"ok","data":[
            {"occurrenceDate":"20240301","diseaseName":"FMD","occurrenceCount":1,"totalLivestockCount":12}
        ]}"#;
        let response: StatsResponse = serde_json::from_str(json).unwrap();
        let records = response.into_records(&by_day("20240301", "20240301"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].granularity(), Granularity::Day);
    }

    #[test]
    fn parses_list_envelope() {
        let json = r#"{"result":true,"message":"","data":{"list":[{"diseaseName":"ASF"}],
            "pagination":{"total":1,"page":1,"limit":20,"totalPages":1}}}"#;
        let response: ApiResponse<ListData<RawStatRecord>> = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.list.len(), 1);
        assert_eq!(response.data.pagination.total_pages, 1);
    }

    #[test]
    fn pagination_knows_the_last_page() {
        let page = |page, total_pages| Pagination {
            total: 45,
            page,
            limit: 20,
            total_pages,
        };
        assert!(page(1, 3).has_next());
        assert!(!page(3, 3).has_next());
        assert!(!page(1, 0).has_next());
    }

    #[test]
    fn request_key_encodes_values() {
        assert_eq!(request_key::<&str, &str>("/a", &[]), "/a");
        assert_eq!(request_key("/a", &[("farm_nm", "Green Hill"), ("x", "1&2")]), "/a?farm_nm=Green+Hill&x=1%262");
    }

    #[test]
    fn json_dir_source_reads_endpoint_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("by-year.json"),
            r#"{"result":true,"message":"","data":[{"year":"2024","diseaseName":"LSD","occurrenceCount":3,"totalLivestockCount":30}]}"#,
        )
        .unwrap();

        let source = JsonDirSource::new(dir.path());
        let response = source.fetch(&StatsQuery::ByYear { year: Some("2024".into()) }).unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].entity_name.as_deref(), Some("LSD"));
    }

    #[test]
    fn json_dir_source_errors() {
        let dir = TempDir::new().unwrap();
        let source = JsonDirSource::new(dir.path());
        assert!(source.fetch(&StatsQuery::ByDisease).is_err());

        fs::write(dir.path().join("by-disease.json"), r#"{"result":false,"message":"down","data":[]}"#).unwrap();
        let err = source.fetch(&StatsQuery::ByDisease).unwrap_err();
        assert!(err.to_string().contains("down"));

        fs::write(dir.path().join("by-disease.json"), "not json").unwrap();
        assert!(source.fetch(&StatsQuery::ByDisease).is_err());
    }

    #[test]
    fn store_keeps_results_under_their_own_key() {
        let old = by_day("20240101", "20240131");
        let current = by_day("20240201", "20240229");
        let mut store = QueryStore::new();

        assert!(store.begin(&old));
        assert!(store.begin(&current));
        assert!(!store.begin(&current));

        let late: StatsResponse = serde_json::from_str(
            r#"{"result":true,"message":"","data":[{"occurrenceDate":"20240105","diseaseName":"FMD"}]}"#,
        )
        .unwrap();
        store.complete(&old, Ok(late));

        assert_eq!(store.status(&current), Some(&QueryStatus::Loading));
        assert!(matches!(store.status(&old), Some(QueryStatus::Ready(rows)) if rows.len() == 1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn store_records_failures() {
        let mut store = QueryStore::new();
        store.begin(&StatsQuery::ByDisease);
        store.complete(&StatsQuery::ByDisease, Err(anyhow::anyhow!("connection refused")));
        assert_eq!(
            store.status(&StatsQuery::ByDisease),
            Some(&QueryStatus::Failed("connection refused".into()))
        );
    }
}
