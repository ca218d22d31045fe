#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use oxroc::config::{GroupInput, RocConfig};
use oxroc::pipeline::{PipelineError, RocAnalysis, run};
use oxroc::plot::render_svg;
use oxroc::report::{format_summary, write_table};

/// Inputs shared by every subcommand that runs the analysis.
#[derive(Args)]
pub struct InputArgs {
    /// Subgroup measurements as LABEL=PATH (repeat once per subgroup, in plot order)
    #[arg(long = "group", value_name = "LABEL=PATH", value_parser = parse_group)]
    pub groups: Vec<GroupInput>,

    /// TOML configuration file (see `oxroc config`)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Clinical cutoff on the reference saturation; below it is hypoxemic
    #[arg(long, value_name = "SATURATION")]
    pub cutoff: Option<f64>,

    /// Comma-separated ascending thresholds, e.g. 84.5,85.5,86.5
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub thresholds: Option<Vec<f64>>,

    /// Write the ROC table as tab-separated values
    #[arg(long, value_name = "PATH")]
    pub table: Option<PathBuf>,
}

#[derive(Parser)]
#[command(
    name = "oxroc",
    about = "ROC comparison of pulse-oximetry hypoxemia detection across subgroups",
    long_about = "Computes false-alarm and detection probabilities of a pulse-oximeter \
                 threshold alarm for each subgroup and for the pooled population, and plots \
                 the subgroups' operating points against each other."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis and draw the ROC comparison plot
    #[command(about = "Compute ROC points and plot them (outputs: roc.svg)")]
    Plot {
        #[command(flatten)]
        input: InputArgs,

        /// Output SVG path
        #[arg(long, value_name = "PATH", default_value = "roc.svg")]
        out: PathBuf,
    },

    /// Run the analysis without plotting
    #[command(about = "Compute ROC points and print them")]
    Sweep {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print or write the default configuration
    #[command(about = "Print the default configuration as TOML")]
    Config {
        /// Write to this file instead of stdout
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Display version and build information
    #[command(about = "Display version and build information")]
    Version,
}

fn parse_group(value: &str) -> Result<GroupInput, String> {
    GroupInput::parse(value).map_err(|e| e.to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let Cli { command } = cli;

    let result = match command {
        Some(Commands::Plot { input, out }) => run_plot(input, out),
        Some(Commands::Sweep { input }) => run_sweep(input),
        Some(Commands::Config { out }) => run_config(out),
        Some(Commands::Version) => {
            print_version_info();
            Ok(())
        }
        None => {
            Cli::command().print_help().expect("print help");
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Merges the config file (if any) with command-line overrides.
fn resolve_config(input: &InputArgs) -> Result<RocConfig, PipelineError> {
    let mut config = match &input.config {
        Some(path) => RocConfig::load(path)?,
        None => RocConfig::default(),
    };
    if !input.groups.is_empty() {
        config.groups = input.groups.clone();
    }
    if let Some(cutoff) = input.cutoff {
        config.clinical_cutoff = cutoff;
    }
    if let Some(thresholds) = &input.thresholds {
        config.thresholds = thresholds.clone();
    }
    Ok(config)
}

fn analyze_and_report(input: &InputArgs, config: &RocConfig) -> Result<RocAnalysis, PipelineError> {
    let analysis = run(config)?;
    println!("{}", format_summary(&analysis));
    if let Some(path) = &input.table {
        write_table(&analysis, path)?;
        println!("ROC table written to {}", path.display());
    }
    Ok(analysis)
}

fn run_plot(input: InputArgs, out: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&input)?;
    let analysis = analyze_and_report(&input, &config)?;
    render_svg(&analysis.groups, &config.plot, &out).map_err(PipelineError::from)?;
    println!("ROC plot written to {}", out.display());
    Ok(())
}

fn run_sweep(input: InputArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&input)?;
    analyze_and_report(&input, &config)?;
    Ok(())
}

fn run_config(out: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = RocConfig::default();
    match out {
        Some(path) => {
            config.save(&path)?;
            println!("Default configuration written to {}", path.display());
        }
        None => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}

/// Format seconds into a human-readable duration like "2.4 hours ago"
fn format_duration_ago(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    if seconds < MINUTE {
        format!("{} seconds ago", seconds)
    } else if seconds < HOUR {
        format!("{:.1} minutes ago", seconds as f64 / MINUTE as f64)
    } else if seconds < DAY {
        format!("{:.1} hours ago", seconds as f64 / HOUR as f64)
    } else {
        format!("{:.1} days ago", seconds as f64 / DAY as f64)
    }
}

fn print_version_info() {
    let version = env!("CARGO_PKG_VERSION");
    let build_timestamp: u64 = env!("OXROC_BUILD_TIMESTAMP").parse().unwrap_or(0);

    println!("oxroc {}", version);

    if build_timestamp > 0 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if now > build_timestamp {
            println!("Built: {}", format_duration_ago(now - build_timestamp));
        } else {
            println!("Built: just now");
        }
    }
}
