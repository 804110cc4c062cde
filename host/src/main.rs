use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use renewal_proof_core::{BatchReport, EventSource, RenewalConfig};
use renewal_prover_lib::{
    abi::parse_address, decode_abi_name, decode_journal_hex, inspect_batch, load_batch_input,
    load_events, run_batch, write_events, write_json, ExportedJournal, JsonFileSink, ResultSink,
    RpcEventProvider,
};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "renewal-host")]
#[command(about = "Batch checker for ENS renewal referral claims")]
struct Cli {
    /// Renewal controller whose logs are accepted. Defaults to the Sepolia controller.
    #[arg(long, global = true, env = "RENEWAL_CONTRACT_ADDRESS")]
    contract_address: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate a batch against an event fixture without touching the network.
    Inspect {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        events: PathBuf,
        /// Also write the exported journal here.
        #[arg(long)]
        journal: Option<PathBuf>,
        /// Also write the per-claim breakdown here.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Fetch the batch's logs over JSON-RPC into an event fixture.
    Fetch {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, env = "RPC_URL")]
        rpc_url: String,
        #[arg(long, default_value = "build/renewal/events.json")]
        out: PathBuf,
    },
    /// Fetch, evaluate and export a batch in one step.
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, env = "RPC_URL")]
        rpc_url: String,
        #[arg(long, default_value = "build/renewal/journal.json")]
        journal: PathBuf,
    },
    /// Print the four callback values of a packed journal.
    DecodeJournal {
        /// 0x-prefixed 128-byte journal.
        #[arg(long)]
        hex: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "renewal_host=info,renewal_prover_lib=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.contract_address.as_deref())?;

    match cli.command {
        Command::Inspect {
            input,
            events,
            journal,
            report,
        } => cmd_inspect(
            &input,
            &events,
            journal.as_deref(),
            report.as_deref(),
            &config,
        ),
        Command::Fetch {
            input,
            rpc_url,
            out,
        } => cmd_fetch(&input, &rpc_url, &out).await,
        Command::Run {
            input,
            rpc_url,
            journal,
        } => cmd_run(&input, &rpc_url, &journal, &config).await,
        Command::DecodeJournal { hex } => cmd_decode_journal(&hex),
    }
}

fn resolve_config(contract_address: Option<&str>) -> Result<RenewalConfig> {
    let Some(address) = contract_address else {
        return Ok(RenewalConfig::default());
    };
    let address = parse_address(address).context("invalid --contract-address")?;
    let contract = format!("0x{}", hex::encode(address));
    tracing::info!(%contract, "using configured controller");
    Ok(RenewalConfig::SEPOLIA.with_contract_address(address))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimSummary {
    slot: usize,
    block_number: u64,
    tx_idx: u32,
    log_idx: u32,
    in_range: bool,
    name: Option<String>,
    char_len: String,
    tier: String,
    paid: String,
    amount: String,
}

fn summarize<S: EventSource>(report: &BatchReport, events: &S) -> Vec<ClaimSummary> {
    report
        .claims
        .iter()
        .map(|claim| ClaimSummary {
            slot: claim.slot,
            block_number: claim.locator.block_number,
            tx_idx: claim.locator.tx_idx,
            log_idx: claim.locator.log_idx,
            in_range: claim.in_range,
            name: events
                .event(&claim.locator)
                .and_then(decode_abi_name)
                .map(|bytes| display_name(&bytes)),
            char_len: claim.char_len.to_string(),
            tier: format!("{:?}", claim.tier),
            paid: claim.paid.to_string(),
            amount: claim.amount.to_string(),
        })
        .collect()
}

fn display_name(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(name) => name.to_string(),
        Err(_) => format!("0x{}", hex::encode(bytes)),
    }
}

fn cmd_inspect(
    input_path: &Path,
    events_path: &Path,
    journal_path: Option<&Path>,
    report_path: Option<&Path>,
    config: &RenewalConfig,
) -> Result<()> {
    let input = load_batch_input(input_path)?;
    let events = load_events(events_path)?;
    let report = inspect_batch(&input, &events, config)?;
    let summary = summarize(&report, &events);

    println!("Batch validated: {}", input_path.display());
    for claim in summary.iter().filter(|c| c.in_range) {
        println!(
            "  slot {}: {} ({} chars, {}) paid {} -> {}",
            claim.slot,
            claim.name.as_deref().unwrap_or("?"),
            claim.char_len,
            claim.tier,
            claim.paid,
            claim.amount
        );
    }
    print_journal(&ExportedJournal::from(&report.journal));
    println!("constraints: {}", report.constraint_count);

    if let Some(path) = journal_path {
        JsonFileSink::new(path).submit(&report.journal)?;
        println!("Journal: {}", path.display());
    }
    if let Some(path) = report_path {
        write_json(path, &summary)?;
        println!("Report: {}", path.display());
    }
    Ok(())
}

async fn cmd_fetch(input_path: &Path, rpc_url: &str, out_path: &Path) -> Result<()> {
    let input = load_batch_input(input_path)?;
    let provider = RpcEventProvider::new(rpc_url);
    let events = provider.fetch_batch(&input).await?;
    write_events(out_path, &events)?;

    println!("Fetched {} events", events.len());
    println!("Events: {}", out_path.display());
    Ok(())
}

async fn cmd_run(
    input_path: &Path,
    rpc_url: &str,
    journal_path: &Path,
    config: &RenewalConfig,
) -> Result<()> {
    let input = load_batch_input(input_path)?;
    let provider = RpcEventProvider::new(rpc_url);
    let mut sink = JsonFileSink::new(journal_path);
    let report = run_batch(&provider, &input, config, &mut sink).await?;

    print_journal(&ExportedJournal::from(&report.journal));
    println!("Journal: {}", journal_path.display());
    Ok(())
}

fn cmd_decode_journal(hex_str: &str) -> Result<()> {
    let journal = decode_journal_hex(hex_str)?;
    print_journal(&ExportedJournal::from(&journal));
    Ok(())
}

fn print_journal(journal: &ExportedJournal) {
    println!("firstClaimId: {}", journal.first_claim_id);
    println!("lastClaimId: {}", journal.last_claim_id);
    println!("referrerId: {}", journal.referrer_id);
    println!("totalAmount: {}", journal.total_amount);
    println!("callback: {}", journal.callback_hex);
}
