use std::path::{Path, PathBuf};

use clap::Parser;

mod config;
mod dataset;
mod models;
mod observability;
mod pricing;
mod report;
mod services;

#[cfg(test)]
mod tests;

use config::{AppConfig, LogFormat, LogLevel};
use models::{SimulatorParams, UsageDataset};
use report::{ReportFormat, Section};

/// CLI arguments for the usage analyzer
#[derive(Parser, Debug)]
#[command(version, about = "LLM usage analytics and spend-cap simulator", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to a TOML config file (built-in defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to a dataset file (.toml or .json) replacing the embedded data
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Override the configured log format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Render analysis sections (default: all of them)
    Report {
        /// Sections to render, in order
        #[arg(short, long, value_enum, value_delimiter = ',')]
        sections: Vec<Section>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Simulate a monthly per-user call limit
    #[command(allow_negative_numbers = true)]
    Simulate {
        /// Limit in calls per user per month
        limit: i64,
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
    },
    /// Evaluate the simulator at every sampled limit
    Curve {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a dataset file against the data invariants and exit
    Validate {
        /// Dataset file to check (defaults to --data)
        path: Option<PathBuf>,
    },
}

fn main() {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match AppConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };

    // CLI flags win over the config file.
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    observability::init_tracing(&config.logging);

    let command = args.command.unwrap_or(Command::Report {
        sections: Vec::new(),
        format: ReportFormat::Text,
        output: None,
    });

    match command {
        Command::Report {
            sections,
            format,
            output,
        } => {
            run_report(
                args.data.as_deref(),
                &config,
                &sections,
                format,
                output.as_deref(),
            );
        }
        Command::Simulate { limit, format } => {
            run_simulate(args.data.as_deref(), &config, limit, format);
        }
        Command::Curve { format, output } => {
            run_report(
                args.data.as_deref(),
                &config,
                &[Section::Curve],
                format,
                output.as_deref(),
            );
        }
        Command::Validate { path } => {
            run_validate(path.as_deref().or(args.data.as_deref()));
        }
    }
}

/// Load the dataset and derive simulator constants.
///
/// The embedded reference keeps its published whole-dollar baseline; a
/// user-supplied file is taken at face value, with the baseline read from
/// its own headline stats.
fn load(data: Option<&Path>, config: &AppConfig) -> (UsageDataset, SimulatorParams) {
    match data {
        Some(path) => match dataset::load_from_file(path) {
            Ok(d) => {
                let params = SimulatorParams {
                    total_cost_current_microcents: d.key_stats.total_cost_microcents,
                    total_users: d.key_stats.total_users,
                    annualization_months: config.simulator.annualization_months,
                };
                (d, params)
            }
            Err(e) => {
                eprintln!("Failed to load dataset from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut params = dataset::reference_params();
            params.annualization_months = config.simulator.annualization_months;
            (dataset::reference().clone(), params)
        }
    }
}

fn run_report(
    data: Option<&Path>,
    config: &AppConfig,
    sections: &[Section],
    format: ReportFormat,
    output: Option<&Path>,
) {
    let (dataset, params) = load(data, config);
    let sections = if sections.is_empty() {
        Section::all()
    } else {
        sections
    };
    tracing::debug!(sections = sections.len(), ?format, "rendering report");

    if let Err(e) = report::write_report(&dataset, &params, sections, format, output) {
        eprintln!("Failed to render report: {}", e);
        std::process::exit(1);
    }
}

fn run_simulate(data: Option<&Path>, config: &AppConfig, limit: i64, format: ReportFormat) {
    let (dataset, params) = load(data, config);
    tracing::debug!(limit, "simulating spend cap");

    let result = match services::simulator::simulate(&dataset.thresholds, limit, &params) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    };

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    if let Err(e) = report::render_simulation(&result, format, &mut lock) {
        eprintln!("Failed to render result: {}", e);
        std::process::exit(1);
    }
}

fn run_validate(path: Option<&Path>) {
    let Some(path) = path else {
        eprintln!("No dataset file given. Pass a path or use --data.");
        std::process::exit(1);
    };

    match dataset::load_from_file(path) {
        Ok(d) => {
            println!(
                "{}: OK ({} buckets, {} threshold anchors, {} users)",
                path.display(),
                d.buckets.len(),
                d.thresholds.len(),
                pricing::format_count(d.key_stats.total_users)
            );
        }
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
