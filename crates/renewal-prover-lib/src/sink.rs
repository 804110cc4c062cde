//! Destinations for a finished batch journal.

use std::path::PathBuf;

use anyhow::Result;
use renewal_proof_core::{pack_journal, BatchJournal};
use serde::{Deserialize, Serialize};

use crate::abi::to_hex;

/// Receives the journal of a batch that passed every check.
pub trait ResultSink {
    fn submit(&mut self, journal: &BatchJournal) -> Result<()>;
}

/// Journal payload for a callback submission: decimal values plus the packed words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedJournal {
    pub first_claim_id: String,
    pub last_claim_id: String,
    pub referrer_id: String,
    pub total_amount: String,
    pub callback_hex: String,
}

impl From<&BatchJournal> for ExportedJournal {
    fn from(journal: &BatchJournal) -> Self {
        Self {
            first_claim_id: journal.first_claim_id.to_string(),
            last_claim_id: journal.last_claim_id.to_string(),
            referrer_id: journal.referrer_id.to_string(),
            total_amount: journal.total_amount.to_string(),
            callback_hex: to_hex(&pack_journal(journal)),
        }
    }
}

/// Writes each submitted journal to one JSON file, replacing the previous one.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for JsonFileSink {
    fn submit(&mut self, journal: &BatchJournal) -> Result<()> {
        crate::write_json(&self.path, &ExportedJournal::from(journal))?;
        tracing::info!(path = %self.path.display(), "journal written");
        Ok(())
    }
}

/// Keeps submitted journals in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    journals: Vec<BatchJournal>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journals(&self) -> &[BatchJournal] {
        &self.journals
    }

    pub fn last(&self) -> Option<&BatchJournal> {
        self.journals.last()
    }
}

impl ResultSink for MemorySink {
    fn submit(&mut self, journal: &BatchJournal) -> Result<()> {
        self.journals.push(*journal);
        Ok(())
    }
}
