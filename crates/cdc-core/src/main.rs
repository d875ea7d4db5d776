use anyhow::{bail, Context, Result};
use cdc_core::test_harness::{run_simulator, SimulatorConfig};
use cdc_core::EditorConfig;
use cdc_model::ChartType;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("cdc-sim")
        .version(cdc_core::VERSION)
        .about("Dataset settings editor simulator")
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("simulate")
                .about("Run a seeded editing session against in-memory collaborators")
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("edits")
                        .long("edits")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Number of user actions"),
                )
                .arg(
                    Arg::new("persist-failure-rate")
                        .long("persist-failure-rate")
                        .default_value("0.1")
                        .value_parser(value_parser!(f64))
                        .help("Probability that a persist fails"),
                )
                .arg(
                    Arg::new("recompute-failure-rate")
                        .long("recompute-failure-rate")
                        .default_value("0.1")
                        .value_parser(value_parser!(f64))
                        .help("Probability that a recompute fails"),
                )
                .arg(
                    Arg::new("remote-edit-rate")
                        .long("remote-edit-rate")
                        .default_value("0.05")
                        .value_parser(value_parser!(f64))
                        .help("Probability of a remote edit before each action"),
                )
                .arg(
                    Arg::new("chart-type")
                        .long("chart-type")
                        .default_value("bar")
                        .help("Chart type (line, bar, pie, table, ...)"),
                )
                .arg(
                    Arg::new("datasets")
                        .long("datasets")
                        .default_value("3")
                        .value_parser(value_parser!(usize))
                        .help("Datasets in the chart"),
                )
                .arg(
                    Arg::new("categories")
                        .long("categories")
                        .default_value("5")
                        .value_parser(value_parser!(usize))
                        .help("Source records per dataset"),
                )
                .arg(config_arg())
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the report as JSON"),
                ),
        )
        .subcommand(
            Command::new("print-config")
                .about("Print the effective editor configuration as TOML")
                .arg(config_arg()),
        )
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("Editor configuration file (TOML)")
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config(args: &ArgMatches) -> Result<EditorConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(EditorConfig::default()),
    }
}

fn rate(args: &ArgMatches, name: &str) -> Result<f64> {
    let value = *args
        .get_one::<f64>(name)
        .with_context(|| format!("missing --{name}"))?;
    if !(0.0..=1.0).contains(&value) {
        bail!("--{name} must be between 0 and 1, got {value}");
    }
    Ok(value)
}

async fn simulate(args: &ArgMatches) -> Result<bool> {
    let chart_type: ChartType = args
        .get_one::<String>("chart-type")
        .context("missing --chart-type")?
        .parse()?;

    let config = SimulatorConfig {
        seed: *args.get_one::<u64>("seed").context("missing --seed")?,
        edits: *args.get_one::<u64>("edits").context("missing --edits")?,
        persist_failure_rate: rate(args, "persist-failure-rate")?,
        recompute_failure_rate: rate(args, "recompute-failure-rate")?,
        remote_edit_rate: rate(args, "remote-edit-rate")?,
        datasets: *args.get_one::<usize>("datasets").context("missing --datasets")?,
        categories: *args.get_one::<usize>("categories").context("missing --categories")?,
        chart_type,
        stop_on_first_violation: args.get_flag("stop-on-violation"),
        editor: load_config(args)?,
    };

    tracing::info!(seed = config.seed, edits = config.edits, "running simulator");
    let report = run_simulator(config).await;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.generate_text());
    }
    Ok(report.passed())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("simulate", args)) => {
            if !simulate(args).await? {
                std::process::exit(1);
            }
        }
        Some(("print-config", args)) => {
            print!("{}", load_config(args)?.to_toml_string()?);
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}
