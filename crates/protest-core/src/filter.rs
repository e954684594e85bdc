use serde::{Deserialize, Serialize};

use crate::{CoreError, FilterSet, ValueBand};

// Values are kept verbatim; only empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FilterInputs")]
pub struct FilterState {
    agency_id: String,
    naics_prefix: String,
    value_band: String,
}

#[derive(Deserialize)]
struct FilterInputs {
    #[serde(default)]
    agency_id: String,
    #[serde(default)]
    naics_prefix: String,
    #[serde(default)]
    value_band: String,
}

impl TryFrom<FilterInputs> for FilterState {
    type Error = CoreError;

    fn try_from(inputs: FilterInputs) -> Result<Self, Self::Error> {
        let mut state = Self {
            agency_id: inputs.agency_id,
            naics_prefix: inputs.naics_prefix,
            value_band: String::new(),
        };
        state.set_value_band(inputs.value_band)?;
        Ok(state)
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agency_id(&self) -> &str {
        &self.agency_id
    }

    pub fn naics_prefix(&self) -> &str {
        &self.naics_prefix
    }

    pub fn value_band(&self) -> &str {
        &self.value_band
    }

    pub fn set_agency_id(&mut self, value: impl Into<String>) {
        self.agency_id = value.into();
    }

    pub fn set_naics_prefix(&mut self, value: impl Into<String>) {
        self.naics_prefix = value.into();
    }

    pub fn set_value_band(&mut self, value: impl Into<String>) -> Result<(), CoreError> {
        let value = value.into();
        if !value.is_empty() {
            value.parse::<ValueBand>()?;
        }
        self.value_band = value;
        Ok(())
    }

    pub fn to_query_params(&self) -> FilterSet {
        FilterSet {
            agency_id: non_empty(&self.agency_id),
            naics_prefix: non_empty(&self.naics_prefix),
            value_band: self.value_band.parse().ok(),
        }
    }

    pub fn is_active(&self) -> bool {
        !(self.agency_id.is_empty() && self.naics_prefix.is_empty() && self.value_band.is_empty())
    }

    pub fn reset(&mut self) -> FilterSet {
        self.agency_id.clear();
        self.naics_prefix.clear();
        self.value_band.clear();
        self.to_query_params()
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn to_query_params_drops_empty_strings() {
        let mut state = FilterState::new();
        state.set_agency_id("");
        state.set_naics_prefix("5415");
        state.set_value_band("").expect("empty band is valid");

        let params = state.to_query_params();

        assert_eq!(
            params,
            FilterSet {
                agency_id: None,
                naics_prefix: Some("5415".to_owned()),
                value_band: None,
            }
        );
        assert_eq!(
            serde_json::to_value(&params).expect("serialize params"),
            json!({ "naics": "5415" })
        );
    }

    #[test]
    fn to_query_params_keeps_values_verbatim() {
        let mut state = FilterState::new();
        state.set_agency_id("dhs ");
        state.set_value_band("10-50M").expect("valid band");

        let params = state.to_query_params();

        assert_eq!(params.agency_id.as_deref(), Some("dhs "));
        assert_eq!(params.value_band, Some(ValueBand::From10To50M));
    }

    #[test]
    fn set_value_band_rejects_unknown_band_and_keeps_previous_value() {
        let mut state = FilterState::new();
        state.set_value_band("LT1M").expect("valid band");

        let err = state.set_value_band("HUGE").expect_err("unknown band");

        assert_eq!(err, CoreError::InvalidValueBand("HUGE".to_owned()));
        assert_eq!(state.value_band(), "LT1M");
    }

    #[test]
    fn is_active_tracks_any_non_empty_field() {
        let mut state = FilterState::new();
        assert!(!state.is_active());

        state.set_naics_prefix("54");
        assert!(state.is_active());

        state.set_naics_prefix("");
        state.set_value_band("50M+").expect("valid band");
        assert!(state.is_active());
    }

    #[test]
    fn reset_clears_fields_and_yields_empty_params() {
        let mut state = FilterState::new();
        state.set_agency_id("DHS");
        state.set_naics_prefix("5415");
        state.set_value_band("1-10M").expect("valid band");

        let params = state.reset();

        assert!(params.is_empty());
        assert!(!state.is_active());
        assert_eq!(state, FilterState::default());
    }

    #[test]
    fn deserialize_rejects_unknown_value_band() {
        let err = serde_json::from_value::<FilterState>(json!({
            "agency_id": "DHS",
            "naics_prefix": "",
            "value_band": "HUGE"
        }))
        .expect_err("unknown band");
        assert!(err.to_string().contains("invalid value band 'HUGE'"));

        let state: FilterState = serde_json::from_value(json!({
            "agency_id": "DHS",
            "value_band": "10-50M"
        }))
        .expect("valid filter state");
        assert_eq!(state.naics_prefix(), "");
        assert_eq!(state.to_query_params().value_band, Some(ValueBand::From10To50M));
    }
}
