//! Ethereum JSON-RPC client for fetching renewal logs by locator.

use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};
use futures::future::try_join_all;
use renewal_proof_core::{BatchInput, ClaimLocator, EventRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::abi::{
    label_matches, name_renewed_topic, parse_address, parse_bytes32, parse_hex_bytes, to_hex,
    words_from_data,
};
use crate::fixture::EventSet;

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Perform a raw JSON-RPC call. A `null` result is returned as `Value::Null`.
async fn rpc_call(client: &reqwest::Client, url: &str, method: &str, params: Value) -> Result<Value> {
    let req = RpcRequest {
        jsonrpc: "2.0",
        id: 1,
        method,
        params,
    };

    let resp: RpcResponse = client
        .post(url)
        .json(&req)
        .send()
        .await
        .with_context(|| format!("RPC request to {} failed", method))?
        .json()
        .await
        .with_context(|| format!("failed to parse RPC response for {}", method))?;

    if let Some(err) = resp.error {
        bail!("RPC error ({}): {}", err.code, err.message);
    }

    Ok(resp.result.unwrap_or(Value::Null))
}

/// Resolves claim locators to `NameRenewed` records over JSON-RPC.
#[derive(Debug, Clone)]
pub struct RpcEventProvider {
    client: reqwest::Client,
    url: String,
}

impl RpcEventProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Block → transaction hash → receipt → `logs[log_idx]`.
    pub async fn fetch_event(&self, locator: &ClaimLocator) -> Result<EventRecord> {
        let tx = rpc_call(
            &self.client,
            &self.url,
            "eth_getTransactionByBlockNumberAndIndex",
            serde_json::json!([
                format!("0x{:x}", locator.block_number),
                format!("0x{:x}", locator.tx_idx)
            ]),
        )
        .await?;
        let tx_hash = transaction_hash(&tx)
            .with_context(|| format!("no transaction at {:?}", locator))?;

        let receipt = rpc_call(
            &self.client,
            &self.url,
            "eth_getTransactionReceipt",
            serde_json::json!([tx_hash]),
        )
        .await?;
        let log = receipt_log(&receipt, locator.log_idx)
            .with_context(|| format!("no log for {:?} in receipt {}", locator, tx_hash))?;

        let record = parse_log(log).with_context(|| format!("malformed log for {:?}", locator))?;
        for anomaly in log_anomalies(&record) {
            let topic0 = record.topics.first().map(|t| to_hex(t)).unwrap_or_default();
            tracing::warn!(
                block = locator.block_number,
                tx = locator.tx_idx,
                log = locator.log_idx,
                %topic0,
                "{}",
                anomaly
            );
        }
        Ok(record)
    }

    /// Fetch every distinct locator of `input` concurrently. Fails if any fetch fails.
    pub async fn fetch_batch(&self, input: &BatchInput) -> Result<EventSet> {
        let locators: BTreeSet<ClaimLocator> = input.locators().collect();
        tracing::info!(
            rpc = %self.url,
            slots = input.block_numbers.len(),
            unique = locators.len(),
            "fetching renewal logs"
        );

        let fetched = try_join_all(locators.iter().map(|locator| async move {
            self.fetch_event(locator)
                .await
                .map(|record| (*locator, record))
        }))
        .await?;

        tracing::info!(events = fetched.len(), "renewal logs fetched");
        Ok(fetched.into_iter().collect())
    }
}

/// Shape problems that do not reject a log but are worth a warning.
fn log_anomalies(record: &EventRecord) -> Vec<&'static str> {
    let mut anomalies = Vec::new();
    if record.topics.first() != Some(&name_renewed_topic()) {
        anomalies.push("log is not a NameRenewed event");
    }
    if label_matches(record) == Some(false) {
        anomalies.push("label topic does not hash the logged name");
    }
    anomalies
}

fn transaction_hash(tx: &Value) -> Result<&str> {
    if tx.is_null() {
        bail!("transaction not found");
    }
    tx.get("hash")
        .and_then(|v| v.as_str())
        .context("transaction has no hash")
}

fn receipt_log(receipt: &Value, log_idx: u32) -> Result<&Value> {
    if receipt.is_null() {
        bail!("receipt not found");
    }
    let logs = receipt
        .get("logs")
        .and_then(|v| v.as_array())
        .context("receipt has no logs array")?;
    logs.get(log_idx as usize).with_context(|| {
        format!(
            "log index {} out of range ({} logs in receipt)",
            log_idx,
            logs.len()
        )
    })
}

/// Convert an RPC log object into an `EventRecord`.
pub fn parse_log(log: &Value) -> Result<EventRecord> {
    let obj = log.as_object().context("expected log object")?;

    let emitter = parse_address(
        obj.get("address")
            .and_then(|v| v.as_str())
            .context("missing log address")?,
    )?;

    let topics = obj
        .get("topics")
        .and_then(|v| v.as_array())
        .context("missing log topics")?
        .iter()
        .map(|t| parse_bytes32(t.as_str().context("topic is not a string")?))
        .collect::<Result<Vec<_>>>()?;

    let data_hex = obj
        .get("data")
        .and_then(|v| v.as_str())
        .context("missing log data")?;
    let data = words_from_data(&parse_hex_bytes(data_hex)?)?;

    Ok(EventRecord {
        emitter,
        topics,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::keccak256;
    use renewal_proof_core::Word;

    fn log_json(data: &str) -> Value {
        serde_json::json!({
            "address": "0xfed6a969aaa60e4961fcd3ebf1a2e8913ac65b72",
            "topics": [to_hex(&name_renewed_topic()), format!("0x{}", "ab".repeat(32))],
            "data": data,
            "logIndex": "0x3",
        })
    }

    #[test]
    fn parse_log_splits_data_words() {
        let data = format!("0x{}{}", "00".repeat(63), "05");
        let record = parse_log(&log_json(&data)).unwrap();
        assert_eq!(record.emitter[0], 0xfe);
        assert_eq!(record.topics[0], name_renewed_topic());
        assert_eq!(record.topics[1], [0xab; 32]);
        assert_eq!(record.data.len(), 2);
        assert_eq!(record.data[1].lo, 5);
    }

    #[test]
    fn parse_log_rejects_partial_words() {
        assert!(parse_log(&log_json("0x1234")).is_err());
        assert!(parse_log(&serde_json::json!("0x")).is_err());
    }

    #[test]
    fn renewal_log_has_no_anomalies() {
        let name = b"vitalik";
        let mut word = [0u8; 32];
        word[..name.len()].copy_from_slice(name);
        let mut record = EventRecord {
            emitter: [0u8; 20],
            topics: vec![name_renewed_topic(), keccak256(name)],
            data: vec![
                Word::from_u128(0x60),
                Word::from_u128(1),
                Word::from_u128(2),
                Word::from_u128(name.len() as u128),
                Word::from_be_bytes(word),
            ],
        };
        assert!(log_anomalies(&record).is_empty());

        record.topics[1] = [0u8; 32];
        assert_eq!(
            log_anomalies(&record),
            vec!["label topic does not hash the logged name"]
        );

        record.topics.clear();
        assert_eq!(log_anomalies(&record), vec!["log is not a NameRenewed event"]);
    }

    #[test]
    fn null_transaction_is_an_error() {
        assert!(transaction_hash(&Value::Null).is_err());
        let tx = serde_json::json!({ "hash": "0xdeadbeef" });
        assert_eq!(transaction_hash(&tx).unwrap(), "0xdeadbeef");
    }

    #[test]
    fn receipt_log_is_selected_by_position() {
        let receipt = serde_json::json!({ "logs": [{ "n": 0 }, { "n": 1 }] });
        assert_eq!(receipt_log(&receipt, 1).unwrap()["n"], 1);
        let err = receipt_log(&receipt, 2).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(receipt_log(&Value::Null, 0).is_err());
    }
}
