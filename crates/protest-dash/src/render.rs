use std::io::{self, Write};

use protest_analysis::{AggregateSummary, Driver, RiskDrivers};
use protest_client::{DashboardSnapshot, QueryState, QueryStatus};
use protest_core::{AggregateResult, ModelMetrics, ModelMetricsReport, RiskResult};
use serde::Serialize;

use crate::format::{
    MISSING_VALUE, filter_badge, format_days, format_decimal, format_number, normalize_field, pct,
};

pub const EMPTY_AGGREGATES_MESSAGE: &str =
    "No matching records. Adjust filters to broaden the search.";
pub const PENDING_AGGREGATES_MESSAGE: &str = "Fetching latest figures...";
pub const INSUFFICIENT_SIGNAL_MESSAGE: &str = "Insufficient signal.";
pub const METRICS_UNAVAILABLE_MESSAGE: &str = "Model metrics unavailable.";

pub fn write_json<T: Serialize + ?Sized>(value: &T, out: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

pub fn write_overview(snapshot: &DashboardSnapshot, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "filters\t{}", filter_badge(snapshot.filters_active))?;
    write_summary(&snapshot.summary, out)?;
    writeln!(out, "export_url\t{}", normalize_field(&snapshot.export_url))?;
    writeln!(out)?;
    write_aggregate_rows(&snapshot.aggregates, out)?;
    writeln!(out)?;
    write_metrics(snapshot.metrics.data.as_ref(), out)
}

pub fn write_summary(summary: &AggregateSummary, out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "total_opportunities\t{}",
        format_number(summary.total_opportunities)
    )?;
    writeln!(
        out,
        "unique_segments\t{}",
        format_number(summary.unique_segments as u64)
    )?;
    writeln!(
        out,
        "median_resolution\t{}",
        format_days(summary.median_resolution_days)
    )
}

pub fn write_aggregate_rows(
    state: &QueryState<AggregateResult>,
    out: &mut dyn Write,
) -> io::Result<()> {
    writeln!(
        out,
        "agency\tnaics\tvalue_band\topps\tprotest_rate\tsustain_rate\tmedian_days"
    )?;

    let records = state
        .data
        .as_ref()
        .map(|data| data.records.as_slice())
        .unwrap_or_default();
    if records.is_empty() {
        let message = if state.status == QueryStatus::Pending {
            PENDING_AGGREGATES_MESSAGE
        } else {
            EMPTY_AGGREGATES_MESSAGE
        };
        return writeln!(out, "{message}");
    }

    for row in records {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            label_field(&row.agency_id),
            label_field(&row.naics),
            label_field(&row.value_band),
            format_number(row.opportunity_count),
            pct(row.protest_rate, 1),
            pct(row.sustain_rate, 1),
            format_days(Some(row.median_resolution_days))
        )?;
    }

    Ok(())
}

pub fn write_risk(
    risk: Option<&RiskResult>,
    drivers: &RiskDrivers,
    out: &mut dyn Write,
) -> io::Result<()> {
    let Some(risk) = risk else {
        return Ok(());
    };

    writeln!(out, "opportunity\t#{}", risk.opp_id)?;
    writeln!(out, "protest_probability\t{}", pct(risk.probability, 1))?;
    writeln!(
        out,
        "sustain_probability\t{}",
        pct(risk.sustain_probability, 1)
    )?;
    writeln!(out)?;
    write_driver_group("protest_drivers", &drivers.protest, out)?;
    writeln!(out)?;
    write_driver_group("sustain_drivers", &drivers.sustain, out)
}

fn write_driver_group(title: &str, drivers: &[Driver], out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{title}\timpact\tweight")?;
    if drivers.is_empty() {
        return writeln!(out, "{INSUFFICIENT_SIGNAL_MESSAGE}");
    }

    for driver in drivers {
        writeln!(
            out,
            "{}\t{}\t{}",
            label_field(&driver.feature),
            pct(driver.weight.abs(), 1),
            format_decimal(driver.weight, 3)
        )?;
    }

    Ok(())
}

pub fn write_metrics(report: Option<&ModelMetricsReport>, out: &mut dyn Write) -> io::Result<()> {
    let Some(report) = report.filter(|report| !report.is_empty()) else {
        return writeln!(out, "{METRICS_UNAVAILABLE_MESSAGE}");
    };

    writeln!(out, "model\tauc\tcalibration_error\tbrier\ttrain\ttest")?;
    for (name, metrics) in [("protest", &report.protest), ("sustain", &report.sustain)] {
        if let Some(metrics) = metrics {
            write_metrics_row(name, metrics, out)?;
        }
    }

    Ok(())
}

fn write_metrics_row(name: &str, metrics: &ModelMetrics, out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "{name}\t{}\t{}\t{}\t{}\t{}",
        format_decimal(metrics.auc, 2),
        format_decimal(metrics.calibration_error, 3),
        format_decimal(metrics.brier, 3),
        format_number(metrics.n_train),
        format_number(metrics.n_test)
    )
}

fn label_field(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        MISSING_VALUE.to_owned()
    } else {
        normalize_field(value)
    }
}

#[cfg(test)]
mod tests {
    use protest_analysis::DEFAULT_TOP_DRIVERS;
    use protest_core::AggregateRow;

    use super::*;

    fn render(write: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        let mut out: Vec<u8> = Vec::new();
        let sink: &mut dyn Write = &mut out;
        write(sink).expect("write output");
        String::from_utf8(out).expect("utf8 output")
    }

    fn settled<T>(data: T) -> QueryState<T> {
        QueryState {
            status: QueryStatus::Success,
            data: Some(data),
            error: None,
            generation: 1,
        }
    }

    #[test]
    fn aggregate_rows_render_stable_header_and_formatted_columns() {
        let state = settled(AggregateResult {
            records: vec![AggregateRow {
                agency_id: "DHS".to_owned(),
                naics: String::new(),
                value_band: "1-10M".to_owned(),
                opportunity_count: 1250,
                protest_rate: 0.125,
                sustain_rate: 0.4,
                median_resolution_days: f64::NAN,
            }],
            total: 1250,
        });

        let rendered = render(|out| write_aggregate_rows(&state, out));
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(
            lines[0],
            "agency\tnaics\tvalue_band\topps\tprotest_rate\tsustain_rate\tmedian_days"
        );
        assert_eq!(lines.len(), 2);
        let columns: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(
            columns,
            vec!["DHS", MISSING_VALUE, "1-10M", "1,250", "12.5%", "40.0%", MISSING_VALUE]
        );
    }

    #[test]
    fn empty_and_pending_aggregates_render_a_message() {
        let empty = settled(AggregateResult::default());
        let rendered = render(|out| write_aggregate_rows(&empty, out));
        assert_eq!(rendered.lines().nth(1), Some(EMPTY_AGGREGATES_MESSAGE));

        let pending = QueryState::<AggregateResult> {
            status: QueryStatus::Pending,
            ..QueryState::default()
        };
        let rendered = render(|out| write_aggregate_rows(&pending, out));
        assert_eq!(rendered.lines().nth(1), Some(PENDING_AGGREGATES_MESSAGE));
    }

    #[test]
    fn risk_renders_probabilities_and_driver_groups() {
        let risk = RiskResult {
            opp_id: 1000,
            probability: 0.734,
            sustain_probability: 0.2,
            drivers: [
                ("Award value (M)".to_owned(), 0.25),
                ("SOW ambiguity".to_owned(), -0.61),
            ]
            .into_iter()
            .collect(),
            sustain_drivers: Default::default(),
        };
        let drivers = RiskDrivers::from_risk(Some(&risk), DEFAULT_TOP_DRIVERS);

        let rendered = render(|out| write_risk(Some(&risk), &drivers, out));
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "opportunity\t#1000");
        assert_eq!(lines[1], "protest_probability\t73.4%");
        assert_eq!(lines[2], "sustain_probability\t20.0%");
        assert_eq!(lines[4], "protest_drivers\timpact\tweight");
        assert_eq!(lines[5], "SOW ambiguity\t61.0%\t-0.610");
        assert_eq!(lines[6], "Award value (M)\t25.0%\t0.250");
        assert_eq!(lines[8], "sustain_drivers\timpact\tweight");
        assert_eq!(lines[9], INSUFFICIENT_SIGNAL_MESSAGE);
    }

    #[test]
    fn missing_risk_renders_nothing() {
        let rendered = render(|out| write_risk(None, &RiskDrivers::default(), out));
        assert!(rendered.is_empty());
    }

    #[test]
    fn metrics_render_available_models_only() {
        let report = ModelMetricsReport {
            protest: Some(ModelMetrics {
                auc: 0.8123,
                calibration_error: 0.0214,
                brier: 0.1199,
                n_train: 12000,
                n_test: 3000,
            }),
            sustain: None,
        };

        let rendered = render(|out| write_metrics(Some(&report), out));
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "protest\t0.81\t0.021\t0.120\t12,000\t3,000");
    }

    #[test]
    fn absent_metrics_render_unavailable_message() {
        let rendered = render(|out| write_metrics(None, out));
        assert_eq!(rendered.trim_end(), METRICS_UNAVAILABLE_MESSAGE);

        let empty = ModelMetricsReport::default();
        let rendered = render(|out| write_metrics(Some(&empty), out));
        assert_eq!(rendered.trim_end(), METRICS_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn write_json_emits_null_for_missing_median() {
        let summary = AggregateSummary::default();
        let rendered = render(|out| write_json(&summary, out));
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");

        assert_eq!(value["total_opportunities"], 0);
        assert!(value["median_resolution_days"].is_null());
    }
}
