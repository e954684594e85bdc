use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use protest_analysis::{AggregateSummary, RiskDrivers};
use protest_client::{DashboardApi, DashboardSession, QueryState};
use protest_config::{config_path, ensure_workspace_config};
use protest_core::{AggregateResult, FilterState, ModelMetricsReport, RiskResult};
use serde::Serialize;

use crate::cli::{
    AggregatesArgs, Commands, FilterArgs, OutputArgs, OutputFormat, OverviewArgs, RiskArgs,
};
use crate::render::{
    write_aggregate_rows, write_json, write_metrics, write_overview, write_risk, write_summary,
};

#[derive(Debug, Serialize)]
struct AggregatesView {
    filters_active: bool,
    summary: AggregateSummary,
    aggregates: QueryState<AggregateResult>,
}

#[derive(Debug, Serialize)]
struct RiskView {
    risk: QueryState<RiskResult>,
    drivers: RiskDrivers,
}

pub async fn execute(
    command: &Commands,
    session: &mut DashboardSession,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Commands::Overview(args) => run_overview(session, args, out).await,
        Commands::Aggregates(args) => run_aggregates(session, args, out).await,
        Commands::Risk(args) => run_risk(session, args, out).await,
        Commands::Metrics(args) => run_metrics(session, args, out).await,
        Commands::ExportUrl => {
            writeln!(out, "{}", session.export_url()).context("failed to write export url")
        }
        Commands::Health => run_health(session, out).await,
        Commands::InitConfig => bail!("init-config runs without a dashboard session"),
    }
}

pub async fn run_overview(
    session: &mut DashboardSession,
    args: &OverviewArgs,
    out: &mut dyn Write,
) -> Result<()> {
    apply_filters(session.filters_mut(), &args.filters)?;

    session.start().await;
    if session.filters().is_active() {
        session.submit_filters().await;
    }

    let snapshot = session.snapshot();
    let written = match args.output.output {
        OutputFormat::Table => write_overview(&snapshot, out),
        OutputFormat::Json => write_json(&snapshot, out),
    };
    written.context("failed to write overview")
}

pub async fn run_aggregates(
    session: &mut DashboardSession,
    args: &AggregatesArgs,
    out: &mut dyn Write,
) -> Result<()> {
    apply_filters(session.filters_mut(), &args.filters)?;
    session.submit_filters().await;

    let snapshot = session.snapshot();
    let written = match args.output.output {
        OutputFormat::Table => {
            write_aggregates_table(&snapshot.summary, &snapshot.aggregates, out)
        }
        OutputFormat::Json => write_json(
            &AggregatesView {
                filters_active: snapshot.filters_active,
                summary: snapshot.summary,
                aggregates: snapshot.aggregates,
            },
            out,
        ),
    };
    written.context("failed to write aggregates")
}

fn write_aggregates_table(
    summary: &AggregateSummary,
    aggregates: &QueryState<AggregateResult>,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    write_summary(summary, out)?;
    writeln!(out)?;
    write_aggregate_rows(aggregates, out)
}

pub async fn run_risk(
    session: &DashboardSession,
    args: &RiskArgs,
    out: &mut dyn Write,
) -> Result<()> {
    if let Err(err) = session.score_risk(&args.opp_id).await {
        tracing::debug!(error = %err, "risk request rejected before sending");
    }

    let snapshot = session.snapshot_with_driver_limit(args.top);
    let written = match args.output.output {
        OutputFormat::Table => write_risk(snapshot.risk.data.as_ref(), &snapshot.drivers, out),
        OutputFormat::Json => write_json(
            &RiskView {
                risk: snapshot.risk,
                drivers: snapshot.drivers,
            },
            out,
        ),
    };
    written.context("failed to write risk score")
}

pub async fn run_metrics(
    session: &DashboardSession,
    args: &OutputArgs,
    out: &mut dyn Write,
) -> Result<()> {
    session.metrics().fetch().await;

    let metrics: Option<ModelMetricsReport> = session.metrics().metrics();
    let written = match args.output {
        OutputFormat::Table => write_metrics(metrics.as_ref(), out),
        OutputFormat::Json => write_json(&metrics, out),
    };
    written.context("failed to write model metrics")
}

pub async fn run_health(session: &DashboardSession, out: &mut dyn Write) -> Result<()> {
    let health = session
        .api()
        .health()
        .await
        .context("analytics service health check failed")?;
    if !health.is_ok() {
        bail!("analytics service reported status '{}'", health.status);
    }

    writeln!(out, "status\t{}", health.status).context("failed to write health status")
}

pub fn run_init_config(workspace: &Path, out: &mut dyn Write) -> Result<()> {
    ensure_workspace_config(workspace).with_context(|| {
        format!(
            "failed to initialize config in workspace {}",
            workspace.display()
        )
    })?;

    writeln!(out, "config\t{}", config_path(workspace).display())
        .context("failed to write config path")
}

pub fn apply_filters(filters: &mut FilterState, args: &FilterArgs) -> Result<()> {
    if let Some(agency_id) = &args.agency_id {
        filters.set_agency_id(agency_id.as_str());
    }
    if let Some(naics) = &args.naics {
        filters.set_naics_prefix(naics.as_str());
    }
    if let Some(value_band) = &args.value_band {
        filters
            .set_value_band(value_band.as_str())
            .context("invalid --value-band")?;
    }

    Ok(())
}
