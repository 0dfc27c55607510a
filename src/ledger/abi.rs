use sha3::{Digest, Keccak256};

pub const STORE_EVIDENCE_HASH: &str = "storeEvidenceHash(bytes32,string)";

const WORD: usize = 32;

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for `storeEvidenceHash(bytes32 key, string value)`.
pub fn encode_store_evidence_hash(key: &[u8; 32], value: &str) -> Vec<u8> {
    let data = value.as_bytes();
    let padded = data.len().div_ceil(WORD) * WORD;

    let mut out = Vec::with_capacity(4 + 3 * WORD + padded);
    out.extend_from_slice(&selector(STORE_EVIDENCE_HASH));
    out.extend_from_slice(key);
    // head: offset of the dynamic string, past the two head words
    out.extend_from_slice(&word(2 * WORD as u64));
    out.extend_from_slice(&word(data.len() as u64));
    out.extend_from_slice(data);
    out.resize(4 + 3 * WORD + padded, 0);
    out
}

pub fn to_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn word(n: u64) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[24..].copy_from_slice(&n.to_be_bytes());
    w
}
