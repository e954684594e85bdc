use protest_core::AggregateResult;
use serde::Serialize;

use crate::weighted_median_resolution;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub total_opportunities: u64,
    pub unique_segments: usize,
    pub median_resolution_days: Option<f64>,
}

impl AggregateSummary {
    pub fn from_result(result: &AggregateResult) -> Self {
        Self {
            total_opportunities: result.total,
            unique_segments: result.records.len(),
            median_resolution_days: weighted_median_resolution(&result.records, result.total),
        }
    }
}
