use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Time-bucket level of a statistics row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Overall,
    Year,
    Month,
    Day,
}

/// One row exactly as the statistics source delivers it. Which optional
/// fields are populated depends on the endpoint that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatRecord {
    #[serde(rename = "diseaseName", alias = "entityName", default)]
    pub entity_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub occurrence_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_livestock_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_occurrence_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_occurrence_date: Option<String>,
}

/// The time bucket a record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Period {
    Overall {
        first_occurrence_date: Option<String>,
        last_occurrence_date: Option<String>,
    },
    Year {
        year: Option<String>,
    },
    Month {
        year: Option<String>,
        month: Option<String>,
    },
    Day {
        occurrence_date: Option<String>,
    },
}

/// A source row carrying an explicit period, assigned by whoever issued the
/// request rather than guessed later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatRecord {
    pub entity_name: Option<String>,
    pub occurrence_count: Option<u64>,
    pub total_livestock_count: Option<u64>,
    pub period: Period,
}

/// Counts coalesced to zero and dates collapsed into one `(min, max)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStat {
    pub entity_name: Option<String>,
    pub occurrence_count: u64,
    pub total_livestock_count: u64,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
}

impl RawStatRecord {
    /// Best guess at the row's granularity from which fields are populated.
    /// Only used when the issuing request is unknown.
    pub fn infer_granularity(&self) -> Granularity {
        if present(&self.occurrence_date).is_some() {
            Granularity::Day
        } else if present(&self.month).is_some() {
            Granularity::Month
        } else if present(&self.year).is_some() {
            Granularity::Year
        } else {
            Granularity::Overall
        }
    }

    pub fn tag(self, granularity: Granularity) -> StatRecord {
        let period = match granularity {
            Granularity::Overall => Period::Overall {
                first_occurrence_date: self.first_occurrence_date,
                last_occurrence_date: self.last_occurrence_date,
            },
            Granularity::Year => Period::Year { year: self.year },
            Granularity::Month => Period::Month {
                year: self.year,
                month: self.month,
            },
            Granularity::Day => Period::Day {
                occurrence_date: self.occurrence_date,
            },
        };

        StatRecord {
            entity_name: self.entity_name,
            occurrence_count: self.occurrence_count,
            total_livestock_count: self.total_livestock_count,
            period,
        }
    }

    pub fn into_tagged(self) -> StatRecord {
        let granularity = self.infer_granularity();
        self.tag(granularity)
    }
}

impl StatRecord {
    pub fn granularity(&self) -> Granularity {
        match self.period {
            Period::Overall { .. } => Granularity::Overall,
            Period::Year { .. } => Granularity::Year,
            Period::Month { .. } => Granularity::Month,
            Period::Day { .. } => Granularity::Day,
        }
    }

    pub fn normalize(&self) -> NormalizedStat {
        let (min_date, max_date) = match &self.period {
            Period::Day { occurrence_date } => {
                let date = present(occurrence_date);
                (date.clone(), date)
            }
            Period::Overall {
                first_occurrence_date,
                last_occurrence_date,
            } => (present(first_occurrence_date), present(last_occurrence_date)),
            Period::Year { .. } | Period::Month { .. } => (None, None),
        };

        NormalizedStat {
            entity_name: self.entity_name.clone(),
            occurrence_count: self.occurrence_count.unwrap_or(0),
            total_livestock_count: self.total_livestock_count.unwrap_or(0),
            min_date,
            max_date,
        }
    }

    /// Label for the period column of a detail table.
    pub fn period_label(&self) -> Option<String> {
        match &self.period {
            Period::Overall { .. } => None,
            Period::Year { year } => present(year),
            Period::Month { year, month } => match (present(year), present(month)) {
                (Some(y), Some(m)) => Some(format!("{}-{}", y, m)),
                (Some(y), None) => Some(y),
                _ => None,
            },
            Period::Day { occurrence_date } => present(occurrence_date),
        }
    }
}

/// Reads a count that may arrive as an integer, an integral float (`12.0`) or
/// a numeric string. Anything else, including negative or fractional
/// numbers, is treated as missing rather than failing the whole response.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f < u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// Empty strings from the source mean "no value".
fn present(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}
