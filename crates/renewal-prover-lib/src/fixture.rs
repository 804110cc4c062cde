//! JSON event fixtures, so a batch can be evaluated without an RPC endpoint.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{bail, Context, Result};
use renewal_proof_core::{ClaimLocator, EventRecord, EventSource};
use serde::{Deserialize, Serialize};

use crate::abi::{
    data_to_bytes, parse_address, parse_bytes32, parse_hex_bytes, to_hex, words_from_data,
};

pub const FIXTURE_VERSION: &str = "v1";

/// Event records keyed by locator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSet {
    records: BTreeMap<ClaimLocator, EventRecord>,
}

impl EventSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locator: ClaimLocator, record: EventRecord) -> Option<EventRecord> {
        self.records.insert(locator, record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClaimLocator, &EventRecord)> {
        self.records.iter()
    }
}

impl EventSource for EventSet {
    fn event(&self, locator: &ClaimLocator) -> Option<&EventRecord> {
        self.records.get(locator)
    }
}

impl FromIterator<(ClaimLocator, EventRecord)> for EventSet {
    fn from_iter<I: IntoIterator<Item = (ClaimLocator, EventRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FixtureFile {
    version: String,
    events: Vec<FixtureEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureEvent {
    block_number: u64,
    tx_idx: u32,
    log_idx: u32,
    address: String,
    #[serde(default)]
    topics: Vec<String>,
    data: String,
}

impl FixtureEvent {
    fn from_record(locator: &ClaimLocator, record: &EventRecord) -> Self {
        Self {
            block_number: locator.block_number,
            tx_idx: locator.tx_idx,
            log_idx: locator.log_idx,
            address: to_hex(&record.emitter),
            topics: record.topics.iter().map(|t| to_hex(t)).collect(),
            data: to_hex(&data_to_bytes(&record.data)),
        }
    }

    fn into_entry(self) -> Result<(ClaimLocator, EventRecord)> {
        let locator = ClaimLocator::new(self.block_number, self.tx_idx, self.log_idx);
        let emitter = parse_address(&self.address)
            .with_context(|| format!("event {:?}: invalid address", locator))?;
        let topics = self
            .topics
            .iter()
            .map(|t| parse_bytes32(t))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("event {:?}: invalid topic", locator))?;
        let data = parse_hex_bytes(&self.data)
            .and_then(|bytes| words_from_data(&bytes))
            .with_context(|| format!("event {:?}: invalid data", locator))?;

        Ok((
            locator,
            EventRecord {
                emitter,
                topics,
                data,
            },
        ))
    }
}

/// Load an event fixture file. Duplicate locators are rejected.
pub fn load_events(path: &Path) -> Result<EventSet> {
    let raw =
        fs::read(path).with_context(|| format!("failed reading events {}", path.display()))?;
    let file: FixtureFile = serde_json::from_slice(&raw)
        .with_context(|| format!("failed parsing events {}", path.display()))?;
    if file.version != FIXTURE_VERSION {
        bail!(
            "unsupported fixture version {:?} (expected {:?})",
            file.version,
            FIXTURE_VERSION
        );
    }

    let mut set = EventSet::new();
    for event in file.events {
        let (locator, record) = event.into_entry()?;
        if set.insert(locator, record).is_some() {
            bail!("duplicate event for {:?} in {}", locator, path.display());
        }
    }
    Ok(set)
}

/// Write `events` as a fixture file that `load_events` reads back.
pub fn write_events(path: &Path, events: &EventSet) -> Result<()> {
    let file = FixtureFile {
        version: FIXTURE_VERSION.to_string(),
        events: events
            .iter()
            .map(|(locator, record)| FixtureEvent::from_record(locator, record))
            .collect(),
    };
    crate::write_json(path, &file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_event_parses_hex_fields() {
        let raw = serde_json::json!({
            "blockNumber": 5203518,
            "txIdx": 112,
            "logIdx": 1,
            "address": "0xFED6a969AaA60E4961FCD3EBF1A2e8913ac65B72",
            "topics": [format!("0x{}", "11".repeat(32))],
            "data": format!("0x{}{}", "00".repeat(31), "2a"),
        });
        let event: FixtureEvent = serde_json::from_value(raw).unwrap();
        let (locator, record) = event.into_entry().unwrap();

        assert_eq!(locator, ClaimLocator::new(5_203_518, 112, 1));
        assert_eq!(record.emitter[0], 0xfe);
        assert_eq!(record.topics, vec![[0x11; 32]]);
        assert_eq!(record.data.len(), 1);
        assert_eq!(record.data[0].lo, 42);
    }

    #[test]
    fn short_address_is_rejected() {
        let event = FixtureEvent {
            block_number: 1,
            tx_idx: 0,
            log_idx: 0,
            address: "0x1234".to_string(),
            topics: Vec::new(),
            data: "0x".to_string(),
        };
        let err = event.into_entry().unwrap_err();
        assert!(format!("{err:#}").contains("invalid address"));
    }

    #[test]
    fn event_set_is_an_event_source() {
        let locator = ClaimLocator::new(1, 2, 3);
        let record = EventRecord {
            emitter: [7u8; 20],
            topics: Vec::new(),
            data: Vec::new(),
        };
        let set: EventSet = [(locator, record.clone())].into_iter().collect();
        assert_eq!(set.event(&locator), Some(&record));
        assert!(set.event(&ClaimLocator::new(1, 2, 4)).is_none());
    }
}
