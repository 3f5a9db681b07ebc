//! epoh-verify: offline audit of an EPOH ledger file.
//!
//! Exit status: 0 chain valid, 1 integrity violations found, 2 ledger or
//! keyring could not be loaded.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use epoh_01_authentication::Keyring;
use epoh_03_chain_verifier::{ChainVerifier, VerificationReport};
use epoh_telemetry::{init_tracing, TelemetryConfig};

const EXIT_VIOLATIONS: u8 = 1;
const EXIT_LOAD_FAILURE: u8 = 2;

/// Verify every hash link, index, timestamp and seal of a persisted ledger
#[derive(Parser, Debug)]
#[command(name = "epoh-verify")]
#[command(about = "Audit an EPOH ledger file without trusting the Leader")]
struct Args {
    /// Ledger file (JSON lines)
    #[arg(env = "EPOH_LEDGER_PATH", default_value = "epoh_ledger.jsonl")]
    ledger: PathBuf,

    /// Keyring with the Leader's public identity; enables seal checks
    #[arg(short, long, env = "EPOH_KEYRING")]
    keyring: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Log every checked block
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    let telemetry = TelemetryConfig::from_env()
        .with_service_name("epoh-verify")
        .with_log_level(level);
    if let Err(e) = init_tracing(&telemetry) {
        eprintln!("warning: logging disabled: {e}");
    }

    let report = match run(&args) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(EXIT_LOAD_FAILURE);
        }
    };

    for note in &report.notes {
        eprintln!("note: {note}");
    }
    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: cannot encode report: {e}");
                return ExitCode::from(EXIT_LOAD_FAILURE);
            }
        }
    } else {
        println!("{report}");
    }

    if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_VIOLATIONS)
    }
}

fn run(args: &Args) -> anyhow::Result<VerificationReport> {
    let verifier = match &args.keyring {
        Some(path) => {
            let keyring = Keyring::load(path)
                .with_context(|| format!("loading keyring {}", path.display()))?;
            ChainVerifier::with_keyring(keyring)
        }
        None => ChainVerifier::new(),
    };
    let report = verifier
        .verify_path(&args.ledger)
        .with_context(|| format!("verifying {}", args.ledger.display()))?;
    Ok(report)
}
