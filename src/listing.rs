use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::lenient_count;
use crate::source::{request_key, Endpoint, ListData, OCCURRENCE_BASE_PATH};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;

/// Record listings served next to the statistics endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Listing {
    Occurrences,
    Predictions,
    PredictionsByDisease,
    PredictionsByDate,
}

/// One reported outbreak at a farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivestockDiseaseOccurrence {
    pub id: u64,
    #[serde(rename = "ictsd_occrrnc_no", default)]
    pub report_number: String,
    #[serde(rename = "lknts_nm", default)]
    pub disease_name: Option<String>,
    #[serde(rename = "farm_nm", default)]
    pub farm_name: Option<String>,
    #[serde(rename = "farm_locplc_legaldong_code", default)]
    pub farm_district_code: Option<String>,
    #[serde(rename = "farm_locplc", default)]
    pub farm_location: Option<String>,
    #[serde(rename = "occrrnc_de", default)]
    pub occurrence_date: Option<String>,
    #[serde(rename = "lvstckspc_code", default)]
    pub species_code: Option<String>,
    #[serde(rename = "lvstckspc_nm", default)]
    pub species_name: Option<String>,
    #[serde(rename = "occrrnc_lvstckcnt", default, deserialize_with = "lenient_count")]
    pub livestock_count: Option<u64>,
    #[serde(rename = "dgnss_engn_code", default)]
    pub diagnosis_agency_code: Option<String>,
    #[serde(rename = "dgnss_engn_nm", default)]
    pub diagnosis_agency_name: Option<String>,
    #[serde(rename = "cessation_de", default)]
    pub cessation_date: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivestockDiseasePrediction {
    pub id: u64,
    #[serde(rename = "lknts_nm", default)]
    pub disease_name: Option<String>,
    /// Compact `YYYYMMDD` date the prediction is for.
    pub prediction_date: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub prediction_basis: Value,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: String,
}

impl LivestockDiseasePrediction {
    /// The basis object. The source stores it as a JSON string, so string
    /// values are parsed; a string that is not JSON yields `None`.
    pub fn basis(&self) -> Option<Value> {
        match &self.prediction_basis {
            Value::Null => None,
            Value::String(raw) => serde_json::from_str(raw).ok(),
            other => Some(other.clone()),
        }
    }

    /// Confidence scaled to `0.0..=1.0`. Scores above 1 are percentages.
    pub fn confidence_fraction(&self) -> Option<f64> {
        self.confidence_score
            .map(|score| if score > 1.0 { score / 100.0 } else { score })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseasePredictions {
    pub disease_name: String,
    pub predictions: Vec<LivestockDiseasePrediction>,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatePredictions {
    pub date: String,
    pub predictions: Vec<LivestockDiseasePrediction>,
    pub total_count: u64,
}

type Params = Vec<(&'static str, String)>;

fn paging(page: u32, limit: u32) -> Params {
    vec![("page", page.to_string()), ("limit", limit.to_string())]
}

// Optional filters are sent only when non-empty.
fn push_filter(params: &mut Params, name: &'static str, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        params.push((name, v.to_string()));
    }
}

/// Paginated occurrence list with optional disease, farm, date and species
/// filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceListQuery {
    pub page: u32,
    pub limit: u32,
    pub disease_name: Option<String>,
    pub farm_name: Option<String>,
    pub occurrence_date: Option<String>,
    pub species_name: Option<String>,
}

impl Default for OccurrenceListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            disease_name: None,
            farm_name: None,
            occurrence_date: None,
            species_name: None,
        }
    }
}

impl OccurrenceListQuery {
    pub fn params(&self) -> Params {
        let mut params = paging(self.page, self.limit);
        push_filter(&mut params, "lknts_nm", &self.disease_name);
        push_filter(&mut params, "farm_nm", &self.farm_name);
        push_filter(&mut params, "occrrnc_de", &self.occurrence_date);
        push_filter(&mut params, "lvstckspc_nm", &self.species_name);
        params
    }
}

impl Endpoint for OccurrenceListQuery {
    type Data = ListData<LivestockDiseaseOccurrence>;

    fn file_stem(&self) -> &'static str {
        "occurrences"
    }

    fn cache_key(&self) -> String {
        request_key(OCCURRENCE_BASE_PATH, &self.params())
    }
}

/// Paginated prediction list. `enabled` lets a caller hold the request back.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionListQuery {
    pub page: u32,
    pub limit: u32,
    pub disease_name: Option<String>,
    pub prediction_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub upcoming: bool,
    pub region: Option<String>,
    pub risk_level: Option<String>,
    pub min_confidence: Option<f64>,
    pub enabled: bool,
}

impl Default for PredictionListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            disease_name: None,
            prediction_date: None,
            start_date: None,
            end_date: None,
            upcoming: false,
            region: None,
            risk_level: None,
            min_confidence: None,
            enabled: true,
        }
    }
}

impl PredictionListQuery {
    pub fn params(&self) -> Params {
        let mut params = paging(self.page, self.limit);
        push_filter(&mut params, "lknts_nm", &self.disease_name);
        push_filter(&mut params, "prediction_date", &self.prediction_date);
        push_filter(&mut params, "startDate", &self.start_date);
        push_filter(&mut params, "endDate", &self.end_date);
        if self.upcoming {
            params.push(("upcoming", "true".to_string()));
        }
        push_filter(&mut params, "region", &self.region);
        push_filter(&mut params, "risk_level", &self.risk_level);
        // Zero is a real threshold, so only absence omits it.
        if let Some(min) = self.min_confidence {
            params.push(("min_confidence", min.to_string()));
        }
        params
    }
}

impl Endpoint for PredictionListQuery {
    type Data = ListData<LivestockDiseasePrediction>;

    fn file_stem(&self) -> &'static str {
        "predict"
    }

    fn cache_key(&self) -> String {
        request_key(&format!("{}/predict", OCCURRENCE_BASE_PATH), &self.params())
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Predictions for one disease. Admitted only with a non-empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionByDiseaseQuery {
    pub disease_name: String,
    pub enabled: bool,
}

impl PredictionByDiseaseQuery {
    pub fn new(disease_name: impl Into<String>) -> Self {
        Self {
            disease_name: disease_name.into(),
            enabled: true,
        }
    }
}

impl Endpoint for PredictionByDiseaseQuery {
    type Data = DiseasePredictions;

    fn file_stem(&self) -> &'static str {
        "predict-by-disease"
    }

    fn cache_key(&self) -> String {
        request_key(
            &format!("{}/predict/by-disease", OCCURRENCE_BASE_PATH),
            &[("lknts_nm", self.disease_name.as_str())],
        )
    }

    fn enabled(&self) -> bool {
        self.enabled && !self.disease_name.is_empty()
    }
}

/// Predictions for one compact date. Admitted only with a non-empty date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionByDateQuery {
    pub date: String,
    pub enabled: bool,
}

impl PredictionByDateQuery {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            enabled: true,
        }
    }
}

impl Endpoint for PredictionByDateQuery {
    type Data = DatePredictions;

    fn file_stem(&self) -> &'static str {
        "predict-by-date"
    }

    fn cache_key(&self) -> String {
        request_key(
            &format!("{}/predict/by-date", OCCURRENCE_BASE_PATH),
            &[("date", self.date.as_str())],
        )
    }

    fn enabled(&self) -> bool {
        self.enabled && !self.date.is_empty()
    }
}
