//! Vending ledger CLI
//!
//! # Commands
//! - `vending inspect <seed.json>` - validate a catalog seed and print its products
//! - `vending run --script <session.jsonl> [--seed <seed.json>] [--snapshot]` - run a scripted session

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use vending_cli::script::product_value;
use vending_cli::{Session, Settings, inspect_seed, load_seed};

/// Vending ledger CLI
#[derive(Parser)]
#[command(name = "vending")]
#[command(author, version, about = "Catalog and purchase ledger of a vending machine")]
struct Cli {
    /// Script label of the machine owner
    #[arg(long, global = true, env = "VENDING_OWNER")]
    owner: Option<String>,

    /// Emit structured JSON logs on stderr
    #[arg(long, global = true, env = "VENDING_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a catalog seed file and print the accepted products
    Inspect {
        /// JSON array of {id, name, price, stock}
        seed: PathBuf,
    },

    /// Run a JSON Lines script against a fresh machine
    Run {
        /// Catalog seed added by the owner before the script starts
        #[arg(long)]
        seed: Option<PathBuf>,

        /// One command object per line
        #[arg(long)]
        script: PathBuf,

        /// Print the final state snapshot
        #[arg(long)]
        snapshot: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    vending_observability::init(vending_observability::LogFormat::from_json_flag(cli.log_json));
    let settings = Settings::resolve(cli.owner);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Inspect { seed } => {
            let products = load_seed(&seed)?;
            let (accepted, report) = inspect_seed(&products);
            for product in &accepted {
                writeln!(out, "{}", product_value(product))?;
            }
            for failure in &report.failed {
                let line = json!({
                    "ok": false,
                    "id": failure.product_id.get(),
                    "name": failure.name,
                    "error": failure.error.code(),
                    "message": failure.error.to_string(),
                });
                writeln!(out, "{line}")?;
            }
            tracing::info!(accepted = accepted.len(), rejected = report.failed.len(), "seed inspected");
        }
        Commands::Run { seed, script, snapshot } => {
            let mut session = Session::new(&settings.owner_label);

            if let Some(path) = seed {
                let products = load_seed(&path)?;
                let report = session.seed(&products);
                let rejected: Vec<_> = report
                    .failed
                    .iter()
                    .map(|f| json!({ "id": f.product_id.get(), "error": f.error.code() }))
                    .collect();
                let line = json!({ "seeded": report.added.len(), "rejected": rejected });
                writeln!(out, "{line}")?;
            }

            let file = File::open(&script).with_context(|| format!("failed to open script {}", script.display()))?;
            let summary = session.run(BufReader::new(file), &mut out)?;
            tracing::info!(commands = summary.commands, rejected = summary.rejected, "script finished");

            writeln!(out, "{}", session.history_summary())?;
            if snapshot {
                writeln!(out, "{}", session.snapshot()?)?;
            }
        }
    }

    Ok(())
}
