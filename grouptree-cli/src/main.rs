use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use grouptree_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use grouptree_core::metrics::init_metrics;
use grouptree_core::{Config, Hierarchy};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

mod churn;
mod layout;

use churn::ChurnOptions;
use layout::Layout;

#[derive(Parser, Debug)]
#[command(name = "grouptree")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML); defaults plus GROUPTREE_* variables otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Write the recorded metrics in Prometheus text format to this file
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Build a group layout and print its tree snapshot
    Tree {
        /// Layout file with nested [[group]] tables
        #[arg(long)]
        layout: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Move nodes between shared lists from many threads and check the rings
    Churn {
        #[arg(long, default_value_t = 4)]
        threads: usize,

        /// Operations per thread
        #[arg(long, default_value_t = 10_000)]
        ops: usize,

        #[arg(long, default_value_t = 4)]
        lists: usize,

        #[arg(long, default_value_t = 8)]
        nodes_per_thread: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Print the effective configuration, or write it to a file
    Config {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

/// Install a Prometheus recorder behind the `metrics` facade
fn install_metrics(config: &Config) -> Result<Option<PrometheusHandle>> {
    if !config.metrics.enabled {
        return Ok(None);
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install metrics recorder")?;
    init_metrics();
    Ok(Some(handle))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    let mut log_config = LogConfig::try_from(&config.logging)?;
    if let Some(level) = &args.log_level {
        log_config.level = level.parse().unwrap_or_else(|_| {
            eprintln!("Invalid log level '{}', using 'info'", level);
            LogLevel::Info
        });
    }
    if args.json_logs {
        log_config = log_config.json_format(true);
    }
    init_logging_with_config(log_config)?;
    let metrics = install_metrics(&config)?;

    match args.command {
        Command::Tree { layout, format } => {
            let layout = Layout::from_file(&layout)?;
            let hierarchy = Hierarchy::from_config(&config);
            let root = layout.build(&hierarchy)?;
            info!(groups = layout.groups.len(), nodes = hierarchy.node_count(), "layout built");

            match format {
                OutputFormat::Json => {
                    let snapshot = hierarchy.tree(root)?;
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                }
                OutputFormat::Text => print!("{}", hierarchy.render(root)?),
            }
        }
        Command::Churn { threads, ops, lists, nodes_per_thread, seed } => {
            let options = ChurnOptions { threads, ops, lists, nodes_per_thread, seed };
            let report = churn::run(&config, options)?;
            if report.lock_contentions > 0 {
                warn!(contentions = report.lock_contentions, "locks were contended");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Config { output } => match output {
            Some(path) => {
                config.save_to_file(&path)?;
                info!(path = %path.display(), "configuration written");
            }
            None => print!("{}", toml::to_string_pretty(&config)?),
        },
    }

    if let Some(path) = &args.metrics_out {
        match &metrics {
            Some(handle) => {
                fs::write(path, handle.render())
                    .with_context(|| format!("failed to write metrics {}", path.display()))?;
                info!(path = %path.display(), "metrics written");
            }
            None => warn!("metrics are disabled, nothing written"),
        }
    }

    Ok(())
}
