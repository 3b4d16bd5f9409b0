//! Merkle root computation over ordered leaf digests.
//!
//! Leaves are lowercase hex SHA-256 digests of canonical audit payloads.
//! Combining concatenates the *hex strings* (ASCII, not raw bytes) before
//! hashing, which keeps the root bit-compatible with client-side
//! implementations that work on hex digests throughout.

use crate::crypto::sha256_hex;

/// Root of the empty leaf set: SHA-256 of the empty string.
pub const EMPTY_ROOT: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Fold an ordered list of hex leaf digests into a single root digest.
///
/// A single leaf is hashed once (`root = sha256_hex(leaf)`); odd levels of
/// two or more duplicate their last digest before pairing. The order of the
/// leaves determines the root.
pub fn merkle_root(leaves: &[String]) -> String {
    if leaves.is_empty() {
        return EMPTY_ROOT.to_string();
    }
    if leaves.len() == 1 {
        return sha256_hex(leaves[0].as_bytes());
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            let last = level[level.len() - 1].clone();
            level.push(last);
        }
        let mut next = Vec::with_capacity(level.len() / 2);
        for pair in level.chunks(2) {
            let mut combined = String::with_capacity(pair[0].len() + pair[1].len());
            combined.push_str(&pair[0]);
            combined.push_str(&pair[1]);
            next.push(sha256_hex(combined.as_bytes()));
        }
        level = next;
    }
    level.remove(0)
}
