use std::sync::Arc;

use protest_analysis::{AggregateSummary, DEFAULT_TOP_DRIVERS, RiskDrivers};
use protest_core::{AggregateResult, FilterSet, FilterState, ModelMetricsReport, RiskResult};
use serde::Serialize;
use tokio::sync::watch;

use crate::queries::{AggregateQuery, MetricsQuery, RiskQuery};
use crate::state::{ErrorSlot, QueryState, Settlement};
use crate::{ApiError, DashboardApi};

pub struct DashboardSession {
    api: Arc<dyn DashboardApi>,
    filters: FilterState,
    aggregates: AggregateQuery,
    risk: RiskQuery,
    metrics: MetricsQuery,
    errors: ErrorSlot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub filters: FilterState,
    pub filters_active: bool,
    pub aggregates: QueryState<AggregateResult>,
    pub summary: AggregateSummary,
    pub risk: QueryState<RiskResult>,
    pub drivers: RiskDrivers,
    pub metrics: QueryState<ModelMetricsReport>,
    pub error: Option<String>,
    pub export_url: String,
}

impl DashboardSession {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        let errors = ErrorSlot::new();
        Self {
            aggregates: AggregateQuery::new(api.clone(), errors.clone()),
            risk: RiskQuery::new(api.clone(), errors.clone()),
            metrics: MetricsQuery::new(api.clone()),
            filters: FilterState::new(),
            errors,
            api,
        }
    }

    pub fn api(&self) -> &Arc<dyn DashboardApi> {
        &self.api
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn aggregates(&self) -> &AggregateQuery {
        &self.aggregates
    }

    pub fn risk(&self) -> &RiskQuery {
        &self.risk
    }

    pub fn metrics(&self) -> &MetricsQuery {
        &self.metrics
    }

    pub fn error(&self) -> Option<String> {
        self.errors.get()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<String>> {
        self.errors.subscribe()
    }

    pub fn export_url(&self) -> String {
        self.api.export_url()
    }

    pub async fn start(&self) {
        let defaults = FilterSet::default();
        tokio::join!(
            self.aggregates.fetch(&defaults),
            self.metrics.fetch()
        );
    }

    pub async fn submit_filters(&self) -> Settlement {
        let params = self.filters.to_query_params();
        self.aggregates.fetch(&params).await
    }

    pub async fn reset_filters(&mut self) -> Settlement {
        let params = self.filters.reset();
        self.aggregates.fetch(&params).await
    }

    pub async fn score_risk(&self, opp_id: &str) -> Result<Settlement, ApiError> {
        self.risk.fetch(opp_id).await
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot_with_driver_limit(DEFAULT_TOP_DRIVERS)
    }

    pub fn snapshot_with_driver_limit(&self, top_drivers: usize) -> DashboardSnapshot {
        let aggregates = self.aggregates.state();
        let risk = self.risk.state();

        DashboardSnapshot {
            filters: self.filters.clone(),
            filters_active: self.filters.is_active(),
            summary: aggregates
                .data
                .as_ref()
                .map(AggregateSummary::from_result)
                .unwrap_or_default(),
            aggregates,
            drivers: RiskDrivers::from_risk(risk.data.as_ref(), top_drivers),
            risk,
            metrics: self.metrics.state(),
            error: self.errors.get(),
            export_url: self.api.export_url(),
        }
    }
}
