use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use protest_config::{ProtestConfig, load_workspace_config, resolve_base_url};
use protest_core::{AggregateResult, FilterSet, HealthStatus, ModelMetricsReport, RiskResult};
use thiserror::Error;

mod http;
mod mock;
mod queries;
mod session;
mod state;

pub use http::{EXPORT_PATH, HttpDashboardApi};
pub use mock::{MockCall, MockDashboardApi};
pub use queries::{
    AGGREGATE_ERROR_DEFAULT, AggregateQuery, EMPTY_OPP_ID_MESSAGE, INVALID_OPP_ID_MESSAGE,
    MetricsQuery, RISK_ERROR_DEFAULT, RiskQuery, parse_opp_id,
};
pub use session::{DashboardSession, DashboardSnapshot};
pub use state::{ErrorSlot, QueryCell, QueryState, QueryStatus, RequestTicket, Settlement};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("request failed with status code {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("response decoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config load failed: {0}")]
    Config(#[from] protest_config::ConfigError),
}

impl ApiError {
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status {
                detail: Some(detail),
                ..
            } => Some(detail.as_str()),
            _ => None,
        }
    }

    pub fn user_message(&self, default: &str) -> String {
        if let Some(detail) = self.detail() {
            return detail.to_owned();
        }

        let message = self.to_string();
        if message.trim().is_empty() {
            default.to_owned()
        } else {
            message
        }
    }
}

#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn protest_aggregates(&self, filters: &FilterSet) -> Result<AggregateResult, ApiError>;

    async fn protest_risk(&self, opp_id: i64) -> Result<RiskResult, ApiError>;

    async fn model_metrics(&self) -> Result<ModelMetricsReport, ApiError>;

    async fn health(&self) -> Result<HealthStatus, ApiError>;

    fn export_url(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiOverrides {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

pub struct LoadedApi {
    pub api: Arc<dyn DashboardApi>,
    pub base_url: String,
}

pub fn load_api_from_config(
    workspace_root: impl AsRef<Path>,
    overrides: ApiOverrides,
) -> Result<LoadedApi, ApiError> {
    let config = load_workspace_config(workspace_root)?;
    load_api(&config, overrides)
}

pub fn load_api(config: &ProtestConfig, overrides: ApiOverrides) -> Result<LoadedApi, ApiError> {
    let base_url = resolve_base_url(config, overrides.base_url);
    let timeout = overrides
        .request_timeout_secs
        .or(config.api.request_timeout_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    let api = HttpDashboardApi::with_timeout(base_url.clone(), timeout)?;
    Ok(LoadedApi {
        api: Arc::new(api),
        base_url,
    })
}
