use protest_core::{DriverWeights, RiskResult};
use serde::Serialize;

pub const DEFAULT_TOP_DRIVERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Driver {
    pub feature: String,
    pub weight: f64,
}

// Stable: equal magnitudes keep the map's order.
pub fn top_drivers(weights: &DriverWeights, k: usize) -> Vec<Driver> {
    let mut ranked = weights
        .iter()
        .map(|(feature, weight)| Driver {
            feature: feature.clone(),
            weight: *weight,
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|left, right| right.weight.abs().total_cmp(&left.weight.abs()));
    ranked.truncate(k);

    ranked
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskDrivers {
    pub protest: Vec<Driver>,
    pub sustain: Vec<Driver>,
}

impl RiskDrivers {
    pub fn from_risk(risk: Option<&RiskResult>, k: usize) -> Self {
        let Some(risk) = risk else {
            return Self::default();
        };

        Self {
            protest: top_drivers(&risk.drivers, k),
            sustain: top_drivers(&risk.sustain_drivers, k),
        }
    }
}
