use std::ffi::OsStr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use protest_analysis::DEFAULT_TOP_DRIVERS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid log format '{other}', expected one of: human, json"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid output format '{other}', expected one of: table, json"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct FilterArgs {
    #[arg(long, help = "Agency identifier, e.g. DHS")]
    pub agency_id: Option<String>,

    #[arg(long, help = "NAICS code prefix, e.g. 5415")]
    pub naics: Option<String>,

    #[arg(long, help = "Contract value band: LT1M, 1-10M, 10-50M or 50M+")]
    pub value_band: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct OutputArgs {
    #[arg(
        long,
        default_value = "table",
        value_parser = parse_output_format,
        help = "Output format: table or json"
    )]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct OverviewArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct AggregatesArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct RiskArgs {
    #[arg(default_value = "", help = "Opportunity ID to score")]
    pub opp_id: String,

    #[arg(
        long,
        default_value_t = DEFAULT_TOP_DRIVERS,
        help = "Number of drivers to show per model"
    )]
    pub top: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Load the dashboard: portfolio summary, aggregate table and model metrics
    Overview(OverviewArgs),
    /// Query protest aggregates for a set of filters
    Aggregates(AggregatesArgs),
    /// Score protest and sustain risk for one opportunity
    Risk(RiskArgs),
    /// Show back-tested model metrics
    Metrics(OutputArgs),
    /// Print the CSV export link
    ExportUrl,
    /// Check that the analytics service is reachable
    Health,
    /// Write a default .protest/config.toml into the workspace
    InitConfig,
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Protest risk analytics dashboard client")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = ".",
        help = "Workspace root holding .protest/config.toml"
    )]
    pub workspace: PathBuf,

    #[arg(long, global = true, help = "Analytics service base URL override")]
    pub api_url: Option<String>,

    #[arg(long, global = true, help = "Request timeout override in seconds")]
    pub timeout_secs: Option<u64>,

    #[arg(
        long,
        global = true,
        default_value = "human",
        value_parser = parse_log_format,
        help = "Log format: human or json"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

pub fn parse_cli() -> Cli {
    let mut args: Vec<_> = std::env::args_os().collect();
    if args.get(1).is_some_and(|arg| arg == OsStr::new("--")) {
        args.remove(1);
    }

    Cli::parse_from(args)
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse()
}

fn parse_output_format(value: &str) -> Result<OutputFormat, String> {
    value.parse()
}
