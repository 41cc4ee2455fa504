mod cli;
mod config;
mod error;
mod store;
mod sweep;
mod ui;
mod window;

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::SweepConfig;
use store::JsonStore;
use sweep::Sweeper;
use ui::SweepProgress;
use window::{TimeWindow, TransitionEvaluator};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str, verbose: bool) {
    let default = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = SweepConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&config.log_level, cli.verbose);

    match cli.command {
        Command::Sweep {
            collections,
            dry_run,
            now,
            store,
        } => {
            if let Some(store) = store {
                config.store_path = store;
            }
            config.dry_run |= dry_run;
            config.select_collections(&collections)?;
            // Captured once; every record in the pass is judged against it.
            let now = now.unwrap_or_else(Utc::now);
            run_sweep(&config, now, cli.json)
        }
        Command::Evaluate { start, end, now } => {
            let now = now.unwrap_or_else(Utc::now);
            Ok(evaluate_window(start, end, now, cli.json))
        }
    }
}

fn evaluate_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    json: bool,
) -> ExitCode {
    let result =
        TimeWindow::new(start, end).and_then(|window| TransitionEvaluator::evaluate(now, window));
    ui::print_decision(now, &result, json);
    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_sweep(config: &SweepConfig, now: DateTime<Utc>, json: bool) -> Result<ExitCode> {
    let mut store = JsonStore::open(&config.store_path)
        .with_context(|| format!("opening record store {}", config.store_path.display()))?;
    tracing::info!(store = %store.path().display(), %now, dry_run = config.dry_run, "Starting sweep");

    let progress = (!json).then(|| SweepProgress::start(&config.store_path.display().to_string()));
    let sweeper = Sweeper::new(config.collections.clone()).dry_run(config.dry_run);
    let report = match sweeper.run(&mut store, now) {
        Ok(report) => report,
        Err(err) => {
            if let Some(progress) = &progress {
                progress.abort();
            }
            // Collections swept before the abort keep their transitions.
            if store.save().context("saving record store")? {
                tracing::warn!(
                    store = %store.path().display(),
                    "Record store updated with transitions applied before the abort"
                );
            }
            return Err(err).context("sweep aborted");
        }
    };

    if store.save().context("saving record store")? {
        tracing::info!(store = %store.path().display(), "Record store updated");
    }

    match &progress {
        Some(progress) => progress.complete(&report),
        None => ui::print_report_json(&report)?,
    }

    if report.has_failures() {
        tracing::warn!(failed = report.summary().failed, "Sweep finished with failed records");
    }

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
