use std::sync::Arc;

use clap::Parser;
use protest_client::{DashboardSession, EMPTY_OPP_ID_MESSAGE, MockCall, MockDashboardApi};
use protest_core::{
    AggregateResult, AggregateRow, FilterSet, ModelMetrics, ModelMetricsReport, RiskResult,
    ValueBand,
};
use protest_dash::cli::Cli;
use protest_dash::commands::execute;
use protest_dash::render::{EMPTY_AGGREGATES_MESSAGE, METRICS_UNAVAILABLE_MESSAGE};

fn aggregates() -> AggregateResult {
    AggregateResult {
        records: vec![
            AggregateRow {
                agency_id: "DHS".to_owned(),
                naics: "541511".to_owned(),
                value_band: "LT1M".to_owned(),
                opportunity_count: 2,
                protest_rate: 0.5,
                sustain_rate: 0.0,
                median_resolution_days: 10.0,
            },
            AggregateRow {
                agency_id: "DOD".to_owned(),
                naics: "541512".to_owned(),
                value_band: "1-10M".to_owned(),
                opportunity_count: 3,
                protest_rate: 0.3,
                sustain_rate: 0.5,
                median_resolution_days: 20.0,
            },
        ],
        total: 5,
    }
}

fn metrics() -> ModelMetricsReport {
    ModelMetricsReport {
        protest: Some(ModelMetrics {
            auc: 0.81,
            calibration_error: 0.021,
            brier: 0.12,
            n_train: 1200,
            n_test: 300,
        }),
        sustain: None,
    }
}

fn risk() -> RiskResult {
    RiskResult {
        opp_id: 1000,
        probability: 0.42,
        sustain_probability: 0.1,
        drivers: [
            ("Award value (M)".to_owned(), 0.2),
            ("SOW ambiguity".to_owned(), -0.9),
            ("Incumbent displaced".to_owned(), 0.5),
        ]
        .into_iter()
        .collect(),
        sustain_drivers: Default::default(),
    }
}

async fn run_command(
    api: &Arc<MockDashboardApi>,
    args: &[&str],
) -> (String, DashboardSession) {
    let cli = Cli::try_parse_from(std::iter::once("protest-dash").chain(args.iter().copied()))
        .expect("command should parse");
    let mut session = DashboardSession::new(api.clone());
    let mut out = Vec::new();

    execute(&cli.command, &mut session, &mut out)
        .await
        .expect("command should run");

    (String::from_utf8(out).expect("utf8 output"), session)
}

#[tokio::test]
async fn overview_prints_summary_rows_and_metrics() {
    let api = Arc::new(
        MockDashboardApi::new()
            .with_aggregates(aggregates())
            .with_metrics(metrics()),
    );

    let (rendered, session) = run_command(&api, &["overview"]).await;
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "filters\tAll agencies");
    assert_eq!(lines[1], "total_opportunities\t5");
    assert_eq!(lines[2], "unique_segments\t2");
    assert_eq!(lines[3], "median_resolution\t16 days");
    assert_eq!(lines[4], "export_url\thttp://mock.invalid/exportAggregates");
    assert!(rendered.contains("DOD\t541512\t1-10M\t3\t30.0%\t50.0%\t20 days"));
    assert!(rendered.contains("protest\t0.81\t0.021\t0.120\t1,200\t300"));
    assert_eq!(session.error(), None);
    assert_eq!(
        api.calls(),
        vec![
            MockCall::Aggregates(FilterSet::default()),
            MockCall::Metrics
        ]
    );
}

#[tokio::test]
async fn overview_with_filters_requeries_with_normalized_params() {
    let api = Arc::new(MockDashboardApi::new().with_aggregates(aggregates()));

    let (rendered, _session) = run_command(
        &api,
        &["overview", "--agency-id", "", "--naics", "5415", "--value-band", "LT1M"],
    )
    .await;

    assert!(rendered.starts_with("filters\tFilters applied\n"));
    assert!(rendered.contains(METRICS_UNAVAILABLE_MESSAGE));
    assert_eq!(
        api.calls().last(),
        Some(&MockCall::Aggregates(FilterSet {
            agency_id: None,
            naics_prefix: Some("5415".to_owned()),
            value_band: Some(ValueBand::Lt1M),
        }))
    );
}

#[tokio::test]
async fn failed_aggregates_leave_error_for_exit_status() {
    let api = Arc::new(
        MockDashboardApi::new().failing_aggregates(Some("Aggregation service offline".to_owned())),
    );

    let (rendered, session) = run_command(&api, &["aggregates"]).await;

    assert!(rendered.contains("total_opportunities\t0"));
    assert!(rendered.contains(EMPTY_AGGREGATES_MESSAGE));
    assert_eq!(
        session.error().as_deref(),
        Some("Aggregation service offline")
    );
}

#[tokio::test]
async fn risk_prints_top_drivers_limited_by_flag() {
    let api = Arc::new(MockDashboardApi::new().with_risk(risk()));

    let (rendered, session) = run_command(&api, &["risk", "1000", "--top", "2"]).await;
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "opportunity\t#1000");
    assert_eq!(lines[1], "protest_probability\t42.0%");
    assert_eq!(lines[5], "SOW ambiguity\t90.0%\t-0.900");
    assert_eq!(lines[6], "Incumbent displaced\t50.0%\t0.500");
    assert_eq!(lines[7], "");
    assert_eq!(session.error(), None);
}

#[tokio::test]
async fn risk_without_id_sets_error_and_sends_nothing() {
    let api = Arc::new(MockDashboardApi::new().with_risk(risk()));

    let (rendered, session) = run_command(&api, &["risk"]).await;

    assert!(rendered.is_empty());
    assert_eq!(session.error().as_deref(), Some(EMPTY_OPP_ID_MESSAGE));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn unknown_opportunity_reports_server_detail() {
    let api = Arc::new(MockDashboardApi::new());

    let (_, session) = run_command(&api, &["risk", "77", "--output", "json"]).await;

    assert_eq!(session.error().as_deref(), Some("Opportunity not found"));
    assert_eq!(api.calls(), vec![MockCall::Risk(77)]);
}

#[tokio::test]
async fn risk_json_output_carries_state_and_drivers() {
    let api = Arc::new(MockDashboardApi::new().with_risk(risk()));

    let (rendered, _) = run_command(&api, &["risk", "1000", "--output", "json"]).await;
    let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");

    assert_eq!(value["risk"]["status"], "success");
    assert_eq!(value["risk"]["data"]["oppId"], 1000);
    assert_eq!(value["drivers"]["protest"][0]["feature"], "SOW ambiguity");
    assert_eq!(value["drivers"]["sustain"], serde_json::json!([]));
}

#[tokio::test]
async fn metrics_failure_is_silent() {
    let api = Arc::new(MockDashboardApi::new());

    let (rendered, session) = run_command(&api, &["metrics"]).await;

    assert_eq!(rendered.trim_end(), METRICS_UNAVAILABLE_MESSAGE);
    assert_eq!(session.error(), None);
}

#[tokio::test]
async fn export_url_and_health_need_no_dashboard_state() {
    let api = Arc::new(MockDashboardApi::new());

    let (export, _) = run_command(&api, &["export-url"]).await;
    assert_eq!(export.trim_end(), "http://mock.invalid/exportAggregates");

    let (health, _) = run_command(&api, &["health"]).await;
    assert_eq!(health.trim_end(), "status\tok");
    assert_eq!(api.calls(), vec![MockCall::Health]);
}
