use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod filter;

pub use filter::FilterState;

pub type DriverWeights = IndexMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueBand {
    #[serde(rename = "LT1M")]
    Lt1M,
    #[serde(rename = "1-10M")]
    From1To10M,
    #[serde(rename = "10-50M")]
    From10To50M,
    #[serde(rename = "50M+")]
    Over50M,
}

impl ValueBand {
    pub const ALL: [ValueBand; 4] = [
        Self::Lt1M,
        Self::From1To10M,
        Self::From10To50M,
        Self::Over50M,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lt1M => "LT1M",
            Self::From1To10M => "1-10M",
            Self::From10To50M => "10-50M",
            Self::Over50M => "50M+",
        }
    }
}

impl std::fmt::Display for ValueBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ValueBand {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|band| band.as_str() == value)
            .ok_or_else(|| CoreError::InvalidValueBand(value.to_owned()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid value band '{0}', expected one of: LT1M, 1-10M, 10-50M, 50M+")]
    InvalidValueBand(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(rename = "agencyId", default, skip_serializing_if = "is_unset")]
    pub agency_id: Option<String>,
    #[serde(rename = "naics", default, skip_serializing_if = "is_unset")]
    pub naics_prefix: Option<String>,
    #[serde(
        rename = "valueBand",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub value_band: Option<ValueBand>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        is_unset(&self.agency_id) && is_unset(&self.naics_prefix) && self.value_band.is_none()
    }
}

// Empty strings never reach the query string.
fn is_unset(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    #[serde(default, deserialize_with = "deserialize_label")]
    pub agency_id: String,
    #[serde(default, deserialize_with = "deserialize_label")]
    pub naics: String,
    #[serde(default, deserialize_with = "deserialize_label")]
    pub value_band: String,
    #[serde(default)]
    pub opportunity_count: u64,
    #[serde(default)]
    pub protest_rate: f64,
    #[serde(default)]
    pub sustain_rate: f64,
    #[serde(default = "missing_days", deserialize_with = "deserialize_days")]
    pub median_resolution_days: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    #[serde(default)]
    pub records: Vec<AggregateRow>,
    #[serde(default)]
    pub total: u64,
}

impl AggregateResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    #[serde(rename = "oppId")]
    pub opp_id: i64,
    pub probability: f64,
    #[serde(default)]
    pub sustain_probability: f64,
    #[serde(default)]
    pub drivers: DriverWeights,
    #[serde(default)]
    pub sustain_drivers: DriverWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    #[serde(default)]
    pub auc: f64,
    #[serde(default)]
    pub calibration_error: f64,
    #[serde(default)]
    pub brier: f64,
    #[serde(default)]
    pub n_train: u64,
    #[serde(default)]
    pub n_test: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetricsReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protest: Option<ModelMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustain: Option<ModelMetrics>,
}

impl ModelMetricsReport {
    pub fn is_empty(&self) -> bool {
        self.protest.is_none() && self.sustain.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

fn missing_days() -> f64 {
    f64::NAN
}

fn deserialize_days<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

// Segment labels come straight from a dataframe: NAICS codes are often numeric
// and ungrouped keys arrive as null.
fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let label = match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    };
    Ok(label)
}
