use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use strategist_income::abi::load_strategy_abi;
use strategist_income::config::{Config, ConfigOverrides};
use strategist_income::onchain::RpcStrategistSource;
use strategist_income::output::csv::report_to_csv;
use strategist_income::output::json::{render_json, render_report_json};
use strategist_income::output::table::render_report;
use strategist_income::pipeline::{Pipeline, PipelineOutput, PipelineSettings, RunMode};
use strategist_income::report::IncomeReport;
use strategist_income::snapshot::store::SnapshotStore;
use strategist_income::sources::BeefyClient;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "strategist-income",
    about = "Strategist fee income across Beefy vaults"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Target strategist address
    #[arg(short, long)]
    strategist: Option<String>,
    #[arg(long = "snapshot-dir")]
    snapshot_dir: Option<String>,
    /// Compare strategist addresses ignoring case
    #[arg(long = "case-insensitive")]
    case_insensitive: bool,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch, filter and report (default)
    Report {
        /// Reuse the vaults saved by the last fresh run instead of querying strategists
        #[arg(long)]
        cached: bool,
    },
    /// Print the last saved report without touching the network
    Replay,
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        strategist: cli.strategist.clone(),
        snapshot_dir: cli.snapshot_dir.clone(),
        case_insensitive: cli.case_insensitive,
    });

    match cli.command.unwrap_or(Commands::Report { cached: false }) {
        Commands::Config { init, show } => handle_config_command(init, show, &config, &config_path),
        Commands::Replay => {
            let store = SnapshotStore::open(&config.resolved_snapshot_dir())?;
            let snapshot = store.load_report()?.ok_or_else(|| {
                anyhow!("no saved report at {}", store.report_path().display())
            })?;
            info!(
                "replaying report for {} saved at {}",
                snapshot.strategist,
                snapshot.saved_at.to_rfc3339()
            );
            print_report(&snapshot.report, cli.output)
        }
        Commands::Report { cached } => {
            let mode = if cached { RunMode::Cached } else { RunMode::Fresh };
            let output = run_report(&config, mode).await?;
            log_partial_failures(&output);
            print_report(&output.report, cli.output)
        }
    }
}

fn handle_config_command(init: bool, show: bool, config: &Config, config_path: &PathBuf) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

async fn run_report(config: &Config, mode: RunMode) -> Result<PipelineOutput> {
    config.validate()?;
    if let Some(abi_path) = config.resolved_abi_path() {
        load_strategy_abi(&abi_path).context("strategy interface check failed")?;
        info!("strategy ABI ok: {}", abi_path.display());
    }

    let reference = BeefyClient::new(config.api.base_url.clone(), config.api.timeout_secs)?;
    let strategists = RpcStrategistSource::connect(&config.rpc_endpoints()?)?;
    let store = SnapshotStore::open(&config.resolved_snapshot_dir())?;

    let pipeline = Pipeline {
        reference: &reference,
        strategists: &strategists,
        store: &store,
        settings: PipelineSettings {
            strategist: config.strategist.address.clone(),
            address_match: config.strategist.address_match,
            fee_rate: config.income.fee_rate,
            source_policy: config.api.source_policy,
        },
    };
    pipeline.run(mode).await
}

fn log_partial_failures(output: &PipelineOutput) {
    if !output.unresolved.is_empty() {
        warn!(
            "{} vaults skipped because their strategist could not be resolved",
            output.unresolved.len()
        );
    }
    if !output.issues.is_empty() {
        warn!(
            "{} vaults left out of totals because their APY was unavailable",
            output.issues.len()
        );
    }
}

fn print_report(report: &IncomeReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_report(report)),
        OutputFormat::Json => println!("{}", render_report_json(report)?),
        OutputFormat::Csv => print!("{}", report_to_csv(report)?),
    }
    Ok(())
}
