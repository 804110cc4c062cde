//! Hex and ABI helpers for `NameRenewed` logs.

use anyhow::{bail, Context, Result};
use renewal_proof_core::{event::NAME_LEN_WORD, EventRecord, Word};

pub const NAME_RENEWED_SIGNATURE: &str = "NameRenewed(string,bytes32,uint256,uint256)";

/// `topic0` of every renewal log.
pub fn name_renewed_topic() -> [u8; 32] {
    keccak256(NAME_RENEWED_SIGNATURE.as_bytes())
}

/// Splits ABI log data into 32-byte words.
pub fn words_from_data(data: &[u8]) -> Result<Vec<Word>> {
    if data.len() % 32 != 0 {
        bail!("log data length {} is not a multiple of 32", data.len());
    }
    Ok(data
        .chunks_exact(32)
        .map(|chunk| Word::from_be_bytes(to_32(chunk)))
        .collect())
}

pub fn data_to_bytes(words: &[Word]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Raw name bytes of a renewal log, if the declared length fits the data.
pub fn decode_abi_name(record: &EventRecord) -> Option<Vec<u8>> {
    let len_word = record.data_word(NAME_LEN_WORD)?;
    if len_word.hi != 0 {
        return None;
    }
    let len = usize::try_from(len_word.lo).ok()?;
    let start = (NAME_LEN_WORD + 1) * 32;
    let bytes = data_to_bytes(&record.data);
    bytes.get(start..start.checked_add(len)?).map(<[u8]>::to_vec)
}

/// Whether `topic1` is the keccak of the decoded name. `None` if either is missing.
pub fn label_matches(record: &EventRecord) -> Option<bool> {
    let name = decode_abi_name(record)?;
    let label = record.topics.get(1)?;
    Some(keccak256(&name) == *label)
}

pub fn parse_hex_bytes(hex_str: &str) -> Result<Vec<u8>> {
    let stripped = strip_hex_prefix(hex_str);

    if stripped.is_empty() {
        return Ok(Vec::new());
    }

    let padded = if stripped.len() % 2 == 1 {
        format!("0{}", stripped)
    } else {
        stripped.to_string()
    };

    hex::decode(&padded).context("invalid hex string")
}

pub fn parse_address(hex_str: &str) -> Result<[u8; 20]> {
    let bytes = parse_hex_bytes(hex_str)?;
    if bytes.len() != 20 {
        bail!("address must be 20 bytes, got {}", bytes.len());
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Ok(out)
}

pub fn parse_bytes32(hex_str: &str) -> Result<[u8; 32]> {
    let bytes = parse_hex_bytes(hex_str)?;
    if bytes.len() != 32 {
        bail!("expected 32 bytes, got {}", bytes.len());
    }
    Ok(to_32(&bytes))
}

pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn strip_hex_prefix(hex_str: &str) -> &str {
    hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str)
}

fn to_32(input: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(input);
    out
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    use tiny_keccak::{Hasher, Keccak};
    let mut keccak = Keccak::v256();
    keccak.update(data);
    let mut out = [0u8; 32];
    keccak.finalize(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_for(name: &[u8]) -> EventRecord {
        let mut data = vec![
            Word::from_u128(0x60),
            Word::from_u128(1),
            Word::from_u128(2),
            Word::from_u128(name.len() as u128),
        ];
        let mut padded = name.to_vec();
        padded.resize(name.len().div_ceil(32).max(1) * 32, 0);
        data.extend(words_from_data(&padded).unwrap());
        EventRecord {
            emitter: [0u8; 20],
            topics: vec![name_renewed_topic(), keccak256(name)],
            data,
        }
    }

    #[test]
    fn topic_matches_known_hash() {
        assert_eq!(
            to_hex(&name_renewed_topic()),
            "0x3da24c024582931cfaf8267d8ed24d13a82a8068d5bd337d30ec45cea4e506ae"
        );
    }

    #[test]
    fn decodes_name_spanning_two_words() {
        let name = b"a-name-that-is-longer-than-thirty-two-bytes";
        let record = record_for(name);
        assert_eq!(decode_abi_name(&record).unwrap(), name.to_vec());
        assert_eq!(label_matches(&record), Some(true));
    }

    #[test]
    fn declared_length_past_data_is_none() {
        let mut record = record_for(b"abc");
        record.data[NAME_LEN_WORD] = Word::from_u128(64);
        assert!(decode_abi_name(&record).is_none());
    }

    #[test]
    fn uneven_data_is_rejected() {
        assert!(words_from_data(&[0u8; 33]).is_err());
        assert_eq!(words_from_data(&[]).unwrap(), Vec::new());
    }

    #[test]
    fn parse_address_requires_20_bytes() {
        let addr = parse_address("0xFED6a969AaA60E4961FCD3EBF1A2e8913ac65B72").unwrap();
        assert_eq!(addr[0], 0xfe);
        assert_eq!(addr[19], 0x72);
        assert!(parse_address("0x1234").is_err());
    }
}
