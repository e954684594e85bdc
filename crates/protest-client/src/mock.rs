use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use protest_core::{AggregateResult, FilterSet, HealthStatus, ModelMetricsReport, RiskResult};

use crate::http::EXPORT_PATH;
use crate::{ApiError, DashboardApi};

const MOCK_BASE_URL: &str = "http://mock.invalid";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Aggregates(FilterSet),
    Risk(i64),
    Metrics,
    Health,
}

#[derive(Debug, Clone, Default)]
pub struct MockDashboardApi {
    aggregates: AggregateResult,
    aggregate_failure: Option<Option<String>>,
    risks: HashMap<i64, RiskResult>,
    metrics: Option<ModelMetricsReport>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockDashboardApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aggregates(mut self, aggregates: AggregateResult) -> Self {
        self.aggregates = aggregates;
        self
    }

    pub fn failing_aggregates(mut self, detail: Option<String>) -> Self {
        self.aggregate_failure = Some(detail);
        self
    }

    pub fn with_risk(mut self, risk: RiskResult) -> Self {
        self.risks.insert(risk.opp_id, risk);
        self
    }

    pub fn with_metrics(mut self, metrics: ModelMetricsReport) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: MockCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl DashboardApi for MockDashboardApi {
    async fn protest_aggregates(&self, filters: &FilterSet) -> Result<AggregateResult, ApiError> {
        self.record(MockCall::Aggregates(filters.clone()));
        match &self.aggregate_failure {
            Some(detail) => Err(ApiError::Status {
                status: 503,
                detail: detail.clone(),
            }),
            None => Ok(self.aggregates.clone()),
        }
    }

    async fn protest_risk(&self, opp_id: i64) -> Result<RiskResult, ApiError> {
        self.record(MockCall::Risk(opp_id));
        self.risks
            .get(&opp_id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 404,
                detail: Some("Opportunity not found".to_owned()),
            })
    }

    async fn model_metrics(&self) -> Result<ModelMetricsReport, ApiError> {
        self.record(MockCall::Metrics);
        self.metrics.clone().ok_or(ApiError::Status {
            status: 500,
            detail: None,
        })
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.record(MockCall::Health);
        Ok(HealthStatus {
            status: "ok".to_owned(),
        })
    }

    fn export_url(&self) -> String {
        format!("{MOCK_BASE_URL}{EXPORT_PATH}")
    }
}
