//! SafeGuard CLI
//!
//! Runs one supervised engine cycle per invocation. An external scheduler
//! (cron, systemd timer, ...) calls `safeguard run` and reads the exit code:
//!
//!   0  ran, engine succeeded
//!   2  ran, engine failed
//!   3  blocked in SAFE STATE (engine not invoked)
//!   1  hard error (state, lock, journal or status could not be handled)
//!
//! Usage:
//!   safeguard --config safeguard.toml run
//!   safeguard --config safeguard.toml status
//!   safeguard --config safeguard.toml summary
//!   safeguard --config safeguard.toml verify-journal

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use safeguard_config::{SafeguardConfig, Schedule};
use safeguard_contracts::error::{SafeguardError, SafeguardResult};
use safeguard_core::{traits::StateStore, CycleRunner, Supervisor};
use safeguard_engine::ProcessEngine;
use safeguard_journal::JsonlJournal;
use safeguard_store::{JsonFileStateStore, JsonFileStatusSink};

const EXIT_HARD_ERROR: i32 = 1;

// ── CLI definition ────────────────────────────────────────────────────────────

/// SafeGuard: failure-tracking supervisor for an unreliable engine.
#[derive(Parser)]
#[command(
    name = "safeguard",
    about = "Run one supervised engine cycle and report a traffic-light status",
    long_about = "Wraps an external engine with consecutive-failure tracking.\n\
                  After max_failures failures in a row the supervisor enters SAFE STATE\n\
                  and either blocks or probes the engine once per cycle (auto_resume)."
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "safeguard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run exactly one cycle and exit with its outcome code.
    Run,
    /// Print the last published status record as JSON.
    Status,
    /// Print the effective configuration and the persisted counters.
    Summary,
    /// Check the cycle journal's hash chain.
    VerifyJournal,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for store and journal detail.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = SafeguardConfig::from_file(&cli.config).and_then(|config| match cli.command {
        Command::Run => run(config),
        Command::Status => status(&config).map(|()| 0),
        Command::Summary => summary(&config).map(|()| 0),
        Command::VerifyJournal => verify_journal(&config).map(|()| 0),
    });

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!(error = %e, "safeguard failed");
            eprintln!("safeguard: {}", e);
            std::process::exit(EXIT_HARD_ERROR);
        }
    }
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn run(config: SafeguardConfig) -> SafeguardResult<i32> {
    let engine = ProcessEngine::new(config.supervisor.engine_invocation.clone());
    let runner = CycleRunner::new(
        Supervisor::new(config.supervisor),
        Box::new(engine),
        Box::new(JsonFileStateStore::new(&config.storage.state_path)),
        Box::new(JsonlJournal::new(&config.storage.journal_path)),
        Box::new(JsonFileStatusSink::new(&config.storage.status_path)),
    )
    .with_schedule(Box::new(config.schedule));

    let report = runner.run_cycle()?;

    println!(
        "{} | failures={} warnings={} safe_state={} | {}",
        report.outcome,
        report.state.consecutive_failures,
        report.state.warnings,
        report.state.safe_state,
        report.status.traffic_light,
    );
    Ok(report.outcome.exit_code())
}

fn status(config: &SafeguardConfig) -> SafeguardResult<()> {
    let sink = JsonFileStatusSink::new(&config.storage.status_path);
    match sink.read()? {
        Some(record) => {
            let json = serde_json::to_string_pretty(&record)
                .map_err(|e| SafeguardError::StatusReadFailed { reason: e.to_string() })?;
            println!("{}", json);
        }
        None => println!("no status published yet ({})", sink.path().display()),
    }
    Ok(())
}

fn summary(config: &SafeguardConfig) -> SafeguardResult<()> {
    let engine = &config.supervisor.engine_invocation;

    println!("SafeGuard configuration");
    println!("=======================");
    println!("max_failures      : {}", config.supervisor.max_failures);
    println!("auto_resume       : {}", config.supervisor.auto_resume);
    println!("engine            : {}", engine.display());
    if let Some(cwd) = &engine.cwd {
        println!("engine cwd        : {}", cwd.display());
    }
    println!("timeout           : {}s", engine.timeout_secs);
    if let Some(slow) = engine.slow_run_warn_secs {
        println!("slow-run warning  : {}s", slow);
    }
    if !engine.warning_exit_codes.is_empty() {
        println!("warning exit codes: {:?}", engine.warning_exit_codes);
    }
    for artifact in &engine.expected_artifacts {
        println!("expected artifact : {}", artifact.display());
    }
    println!("schedule          : {}", describe_schedule(&config.schedule));
    println!("state file        : {}", config.storage.state_path.display());
    println!("status file       : {}", config.storage.status_path.display());
    println!("journal           : {}", config.storage.journal_path.display());
    println!();

    let store = JsonFileStateStore::new(&config.storage.state_path);
    match store.load()? {
        Some(state) => {
            println!("safe_state        : {}", state.safe_state);
            println!("failures          : {}", state.consecutive_failures);
            println!("warnings          : {}", state.warnings);
            if let Some(outcome) = state.last_outcome {
                println!("last outcome      : {}", outcome);
            }
            if let Some(at) = state.last_run_at {
                println!("last run          : {}", at.to_rfc3339());
            }
            if let Some(err) = &state.last_error {
                println!("last error        : {}", err);
            }
        }
        None => println!("no cycle has run yet"),
    }
    Ok(())
}

fn verify_journal(config: &SafeguardConfig) -> SafeguardResult<()> {
    let journal = JsonlJournal::new(&config.storage.journal_path);
    let verified = journal.verify()?;
    println!("journal OK: {} entr{} verified ({})", verified, if verified == 1 { "y" } else { "ies" }, journal.path().display());
    Ok(())
}

fn describe_schedule(schedule: &Schedule) -> String {
    match schedule {
        Schedule::None => "none".to_string(),
        Schedule::Interval(s) => format!("every {} min", s.minutes),
        Schedule::Daily(s) if s.weekdays.is_empty() => format!("daily at {} UTC", s.at.format("%H:%M")),
        Schedule::Daily(s) => {
            let days = s.weekdays.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(",");
            format!("{} at {} UTC", days, s.at.format("%H:%M"))
        }
    }
}
