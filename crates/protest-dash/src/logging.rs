use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::cli::LogFormat;

const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub fn init_tracing(format: LogFormat) -> Result<(), LoggingError> {
    let env_filter = build_env_filter();

    match format {
        LogFormat::Human => {
            let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
            tracing::subscriber::set_global_default(
                Registry::default().with(env_filter).with(layer),
            )?;
        }
        LogFormat::Json => {
            let layer = fmt::layer().json().with_writer(std::io::stderr);
            tracing::subscriber::set_global_default(
                Registry::default().with(env_filter).with(layer),
            )?;
        }
    }

    tracing::debug!(format = format.as_str(), "logging initialized");
    Ok(())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
