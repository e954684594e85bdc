use std::io::Write;

use anyhow::{Context, Result};
use protest_client::{ApiOverrides, DashboardSession, load_api};
use protest_config::{load_workspace_config, validate_config};
use protest_dash::cli::{Cli, Commands, parse_cli};
use protest_dash::commands::{execute, run_init_config};
use protest_dash::logging::init_tracing;

fn main() -> Result<()> {
    let cli = parse_cli();
    init_tracing(cli.log_format).context("failed to initialize logging")?;
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let mut out = std::io::stdout().lock();

    if matches!(cli.command, Commands::InitConfig) {
        return run_init_config(&cli.workspace, &mut out);
    }

    let config = load_workspace_config(&cli.workspace).with_context(|| {
        format!(
            "failed to load workspace config under {}",
            cli.workspace.display()
        )
    })?;
    for warning in validate_config(&config) {
        tracing::warn!(code = warning.code, "config warning: {}", warning.message);
    }

    let loaded = load_api(
        &config,
        ApiOverrides {
            base_url: cli.api_url.clone(),
            request_timeout_secs: cli.timeout_secs,
        },
    )
    .context("failed to build analytics client")?;
    tracing::debug!(base_url = %loaded.base_url, "analytics client ready");

    let mut session = DashboardSession::new(loaded.api);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(execute(&cli.command, &mut session, &mut out))?;
    out.flush().context("failed to flush output")?;

    if let Some(message) = session.error() {
        eprintln!("Heads up: {message}");
        std::process::exit(1);
    }

    Ok(())
}
