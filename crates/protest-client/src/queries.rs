use std::sync::Arc;

use protest_core::{AggregateResult, FilterSet, ModelMetricsReport, RiskResult};
use tokio::sync::watch;

use crate::state::{ErrorSlot, QueryCell, QueryState, Settlement};
use crate::{ApiError, DashboardApi};

pub const AGGREGATE_ERROR_DEFAULT: &str = "Unable to load aggregates";
pub const RISK_ERROR_DEFAULT: &str = "Unable to score opportunity";
pub const EMPTY_OPP_ID_MESSAGE: &str = "Enter an opportunity ID to score risk.";
pub const INVALID_OPP_ID_MESSAGE: &str = "Opportunity ID must be a whole number.";

pub struct AggregateQuery {
    api: Arc<dyn DashboardApi>,
    cell: QueryCell<AggregateResult>,
    errors: ErrorSlot,
}

impl AggregateQuery {
    pub fn new(api: Arc<dyn DashboardApi>, errors: ErrorSlot) -> Self {
        Self {
            api,
            cell: QueryCell::new(),
            errors,
        }
    }

    pub fn state(&self) -> QueryState<AggregateResult> {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<AggregateResult>> {
        self.cell.subscribe()
    }

    pub async fn fetch(&self, filters: &FilterSet) -> Settlement {
        let ticket = self.cell.begin(true);
        self.errors.clear();
        tracing::debug!(
            generation = ticket.generation(),
            agency_id = ?filters.agency_id,
            naics = ?filters.naics_prefix,
            value_band = ?filters.value_band,
            "aggregate request issued"
        );

        match self.api.protest_aggregates(filters).await {
            Ok(result) => {
                tracing::debug!(
                    generation = ticket.generation(),
                    rows = result.records.len(),
                    total = result.total,
                    "aggregate request settled"
                );
                self.cell.succeed(ticket, result)
            }
            Err(err) => {
                let message = err.user_message(AGGREGATE_ERROR_DEFAULT);
                tracing::debug!(generation = ticket.generation(), error = %err, "aggregate request failed");
                let settlement =
                    self.cell
                        .fail(ticket, Some(message.clone()), Some(AggregateResult::default()));
                if settlement.is_applied() {
                    self.errors.set(message);
                }
                settlement
            }
        }
    }
}

pub struct RiskQuery {
    api: Arc<dyn DashboardApi>,
    cell: QueryCell<RiskResult>,
    errors: ErrorSlot,
}

impl RiskQuery {
    pub fn new(api: Arc<dyn DashboardApi>, errors: ErrorSlot) -> Self {
        Self {
            api,
            cell: QueryCell::new(),
            errors,
        }
    }

    pub fn state(&self) -> QueryState<RiskResult> {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<RiskResult>> {
        self.cell.subscribe()
    }

    pub async fn fetch(&self, opp_id: &str) -> Result<Settlement, ApiError> {
        let opp_id = match parse_opp_id(opp_id) {
            Ok(opp_id) => opp_id,
            Err(err) => {
                let message = err.to_string();
                self.cell.reject(message.clone());
                self.errors.set(message);
                return Err(err);
            }
        };

        let ticket = self.cell.begin(false);
        self.errors.clear();
        tracing::debug!(generation = ticket.generation(), opp_id, "risk request issued");

        let settlement = match self.api.protest_risk(opp_id).await {
            Ok(result) => self.cell.succeed(ticket, result),
            Err(err) => {
                let message = err.user_message(RISK_ERROR_DEFAULT);
                tracing::debug!(generation = ticket.generation(), opp_id, error = %err, "risk request failed");
                let settlement = self.cell.fail(ticket, Some(message.clone()), None);
                if settlement.is_applied() {
                    self.errors.set(message);
                }
                settlement
            }
        };

        Ok(settlement)
    }
}

pub struct MetricsQuery {
    api: Arc<dyn DashboardApi>,
    cell: QueryCell<ModelMetricsReport>,
}

impl MetricsQuery {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self {
            api,
            cell: QueryCell::new(),
        }
    }

    pub fn state(&self) -> QueryState<ModelMetricsReport> {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<ModelMetricsReport>> {
        self.cell.subscribe()
    }

    pub fn metrics(&self) -> Option<ModelMetricsReport> {
        self.cell.snapshot().data
    }

    pub async fn fetch(&self) -> Settlement {
        let ticket = self.cell.begin(false);

        match self.api.model_metrics().await {
            Ok(report) => self.cell.succeed(ticket, report),
            Err(err) => {
                tracing::debug!(error = %err, "model metrics unavailable");
                self.cell.fail(ticket, None, None)
            }
        }
    }
}

pub fn parse_opp_id(input: &str) -> Result<i64, ApiError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(EMPTY_OPP_ID_MESSAGE.to_owned()));
    }

    trimmed
        .parse::<i64>()
        .map_err(|_| ApiError::Validation(INVALID_OPP_ID_MESSAGE.to_owned()))
}
