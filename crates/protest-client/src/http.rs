use std::time::Duration;

use async_trait::async_trait;
use protest_core::{AggregateResult, FilterSet, HealthStatus, ModelMetricsReport, RiskResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ApiError, DashboardApi};

const AGGREGATES_PATH: &str = "/protestAgg";
const RISK_PATH: &str = "/protestRisk";
const METRICS_PATH: &str = "/modelMetrics";
const HEALTH_PATH: &str = "/health";
pub const EXPORT_PATH: &str = "/exportAggregates";

#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDashboardApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(base_url.into()),
        }
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: normalize_base_url(base_url.into()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let mut request = self.client.get(self.endpoint_url(path));
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: extract_error_detail(&body),
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn protest_aggregates(&self, filters: &FilterSet) -> Result<AggregateResult, ApiError> {
        self.get_json(AGGREGATES_PATH, Some(filters)).await
    }

    async fn protest_risk(&self, opp_id: i64) -> Result<RiskResult, ApiError> {
        self.get_json(RISK_PATH, Some(&[("oppId", opp_id)])).await
    }

    async fn model_metrics(&self) -> Result<ModelMetricsReport, ApiError> {
        self.get_json::<_, ()>(METRICS_PATH, None).await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json::<_, ()>(HEALTH_PATH, None).await
    }

    fn export_url(&self) -> String {
        self.endpoint_url(EXPORT_PATH)
    }
}

fn normalize_base_url(base_url: String) -> String {
    base_url.trim().trim_end_matches('/').to_owned()
}

// A list detail (validation failure) is joined from its `msg` fields.
pub(crate) fn extract_error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    let detail = match value.get("detail")? {
        Value::Null => return None,
        Value::String(text) => text.trim().to_owned(),
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(text) => Some(text.trim().to_owned()),
                other => other.get("msg").and_then(Value::as_str).map(str::to_owned),
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    };

    (!detail.is_empty()).then_some(detail)
}
