//! Renewal prover library: input loading, event retrieval, batch evaluation and result export.
//!
//! Everything here sits around the deterministic `renewal-proof-core` checks so the
//! same pipeline can be driven from the CLI, from fixtures, or from tests.

pub mod abi;
pub mod fixture;
pub mod rpc;
pub mod sink;

use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use renewal_proof_core::{
    evaluate_batch_detailed, unpack_journal, BatchInput, BatchJournal, BatchReport, EventSource,
    RenewalConfig, MAX_CLAIMS,
};
use serde::Deserialize;

pub use abi::{decode_abi_name, name_renewed_topic};
pub use fixture::{load_events, write_events, EventSet};
pub use rpc::RpcEventProvider;
pub use sink::{ExportedJournal, JsonFileSink, MemorySink, ResultSink};

/// Evaluate a batch against already-retrieved events and log the outcome.
pub fn inspect_batch<S: EventSource + ?Sized>(
    input: &BatchInput,
    source: &S,
    config: &RenewalConfig,
) -> Result<BatchReport> {
    let report = evaluate_batch_detailed(input, source, config).map_err(|e| {
        tracing::warn!(
            category = ?e.category(),
            slot = ?e.slot(),
            error = e.as_str(),
            "batch rejected"
        );
        anyhow!("batch evaluation failed: {}", e)
    })?;

    for claim in &report.claims {
        tracing::debug!(
            slot = claim.slot,
            in_range = claim.in_range,
            chars = %claim.char_len,
            tier = ?claim.tier,
            amount = %claim.amount,
            "claim evaluated"
        );
    }
    tracing::info!(
        num_claims = input.num_claims,
        referrer = %report.journal.referrer_id,
        total = %report.journal.total_amount,
        constraints = report.constraint_count,
        "batch accepted"
    );
    Ok(report)
}

/// Fetch the batch's events, evaluate them, and hand the journal to `sink`.
pub async fn run_batch(
    provider: &RpcEventProvider,
    input: &BatchInput,
    config: &RenewalConfig,
    sink: &mut dyn ResultSink,
) -> Result<BatchReport> {
    let events = provider.fetch_batch(input).await?;
    let report = inspect_batch(input, &events, config)?;
    sink.submit(&report.journal).context("failed submitting journal")?;
    tracing::info!(rpc = provider.url(), "batch submitted");
    Ok(report)
}

/// Decode a 0x-prefixed packed journal.
pub fn decode_journal_hex(hex_str: &str) -> Result<BatchJournal> {
    let bytes = abi::parse_hex_bytes(hex_str.trim())?;
    unpack_journal(&bytes).map_err(|e| anyhow!("{}", e))
}

/// Write a value as pretty-printed JSON to a file.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let encoded = serde_json::to_vec_pretty(value).context("failed encoding json")?;
    fs::write(path, encoded).with_context(|| format!("failed writing json {}", path.display()))?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed creating parent dir {}", parent.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Batch input loading
// ---------------------------------------------------------------------------

/// A number written either as a JSON number or as a decimal / 0x-hex string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Number(u64),
    Text(String),
}

impl NumberLike {
    fn to_u64(&self) -> Result<u64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => parse_u64(s),
        }
    }

    fn to_u32(&self) -> Result<u32> {
        let value = self.to_u64()?;
        u32::try_from(value).map_err(|_| anyhow!("u32 out of range: {value}"))
    }
}

/// Camel-case layout, the serialized form of `BatchInput`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeBatchInput {
    pub block_numbers: Vec<NumberLike>,
    pub tx_idxs: Vec<NumberLike>,
    pub log_idxs: Vec<NumberLike>,
    pub num_claims: NumberLike,
}

/// Snake-case layout used by older batch files. Any `referrer_id` field is ignored.
#[derive(Debug, Deserialize)]
pub struct LegacyBatchInput {
    pub block_numbers: Vec<NumberLike>,
    pub tx_idxs: Vec<NumberLike>,
    pub log_idxs: Vec<NumberLike>,
    pub num_claims: NumberLike,
}

/// Load a batch input from a JSON file (supports both native and legacy formats).
///
/// Files with a `blockNumbers` key are read as native, everything else as legacy.
pub fn load_batch_input(path: &Path) -> Result<BatchInput> {
    let raw = fs::read(path).with_context(|| format!("failed reading input {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_slice(&raw)
        .with_context(|| format!("failed parsing input {}", path.display()))?;

    if value.get("blockNumbers").is_some() {
        let native: NativeBatchInput = serde_json::from_value(value)
            .with_context(|| format!("failed parsing input as native format: {}", path.display()))?;
        return native_to_input(native);
    }

    let legacy: LegacyBatchInput = serde_json::from_value(value)
        .with_context(|| format!("failed parsing input as legacy format: {}", path.display()))?;
    legacy_to_input(legacy)
}

pub fn native_to_input(native: NativeBatchInput) -> Result<BatchInput> {
    numbers_to_input(
        &native.block_numbers,
        &native.tx_idxs,
        &native.log_idxs,
        &native.num_claims,
    )
}

/// Convert a legacy batch input to the native format.
pub fn legacy_to_input(legacy: LegacyBatchInput) -> Result<BatchInput> {
    numbers_to_input(
        &legacy.block_numbers,
        &legacy.tx_idxs,
        &legacy.log_idxs,
        &legacy.num_claims,
    )
}

/// Shared conversion for both layouts.
///
/// Slots past `MAX_CLAIMS` are dropped; they always lie outside the claim count.
fn numbers_to_input(
    block_numbers: &[NumberLike],
    tx_idxs: &[NumberLike],
    log_idxs: &[NumberLike],
    num_claims: &NumberLike,
) -> Result<BatchInput> {
    let num_claims = num_claims.to_u64()?;
    if num_claims == 0 || num_claims as usize > MAX_CLAIMS {
        bail!("claim count must be in [1, {}], got {}", MAX_CLAIMS, num_claims);
    }

    let slots = block_numbers.len();
    if tx_idxs.len() != slots || log_idxs.len() != slots {
        bail!(
            "block number, tx index and log index lengths differ ({}, {}, {})",
            slots,
            tx_idxs.len(),
            log_idxs.len()
        );
    }
    if slots > MAX_CLAIMS {
        tracing::debug!(slots, kept = MAX_CLAIMS, "dropping padding slots");
    }

    let keep = slots.min(MAX_CLAIMS);
    Ok(BatchInput {
        block_numbers: block_numbers[..keep]
            .iter()
            .map(NumberLike::to_u64)
            .collect::<Result<_>>()?,
        tx_idxs: tx_idxs[..keep]
            .iter()
            .map(NumberLike::to_u32)
            .collect::<Result<_>>()?,
        log_idxs: log_idxs[..keep]
            .iter()
            .map(NumberLike::to_u32)
            .collect::<Result<_>>()?,
        num_claims: num_claims as u8,
    })
}

fn parse_u64(value: &str) -> Result<u64> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).with_context(|| format!("invalid u64 hex: {value}"))
    } else {
        value
            .parse::<u64>()
            .with_context(|| format!("invalid u64 value: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(value: serde_json::Value) -> Result<BatchInput> {
        legacy_to_input(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn legacy_accepts_strings_and_numbers() {
        let input = legacy(serde_json::json!({
            "block_numbers": ["5203518", 5203518, "0x4f663e"],
            "tx_idxs": ["112", 113, "0x72"],
            "log_idxs": [1, "1", "0x1"],
            "num_claims": "3",
            "referrer_id": "42",
        }))
        .unwrap();
        assert_eq!(input.block_numbers, vec![5_203_518, 5_203_518, 0x4f663e]);
        assert_eq!(input.tx_idxs, vec![112, 113, 114]);
        assert_eq!(input.log_idxs, vec![1, 1, 1]);
        assert_eq!(input.num_claims, 3);
    }

    #[test]
    fn legacy_drops_padding_past_max_claims() {
        let ten: Vec<u64> = (0..10).collect();
        let input = legacy(serde_json::json!({
            "block_numbers": ten,
            "tx_idxs": ten,
            "log_idxs": ten,
            "num_claims": 2,
        }))
        .unwrap();
        assert_eq!(input.block_numbers.len(), MAX_CLAIMS);
        assert_eq!(input.tx_idxs, (0..MAX_CLAIMS as u32).collect::<Vec<_>>());
    }

    #[test]
    fn legacy_rejects_bad_counts_and_lengths() {
        let err = legacy(serde_json::json!({
            "block_numbers": [1], "tx_idxs": [1], "log_idxs": [1], "num_claims": 0,
        }))
        .unwrap_err();
        assert!(err.to_string().contains("claim count"));

        let err = legacy(serde_json::json!({
            "block_numbers": [1, 2], "tx_idxs": [1], "log_idxs": [1, 2], "num_claims": 1,
        }))
        .unwrap_err();
        assert!(err.to_string().contains("lengths differ"));

        let err = legacy(serde_json::json!({
            "block_numbers": [1], "tx_idxs": ["4294967296"], "log_idxs": [1], "num_claims": 1,
        }))
        .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn decode_journal_hex_checks_length() {
        assert!(decode_journal_hex("0x1234").is_err());
        let hex = format!("0x{}", "00".repeat(128));
        let journal = decode_journal_hex(&hex).unwrap();
        assert!(journal.total_amount.is_zero());
    }
}
