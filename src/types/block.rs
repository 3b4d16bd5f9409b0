use serde::{Deserialize, Serialize};

use crate::crypto::sha256_hex;
use crate::merkle::merkle_root;

use super::Audit;

/// Ordered batch of audits committed atomically, hash-linked to its
/// predecessor. Block ids start at 1; id 0 denotes the empty chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub id: u64,
    pub previous_hash: String,
    pub merkle_root: String,
    pub hash: String,
    pub audits: Vec<Audit>,
}

impl Block {
    /// Assemble a block from ordered audits, deriving the Merkle root and the
    /// proposer-assigned header hash.
    pub fn build(id: u64, previous_hash: String, audits: Vec<Audit>) -> Self {
        let leaves: Vec<String> = audits.iter().map(Audit::leaf_hash).collect();
        let merkle_root = merkle_root(&leaves);
        let hash = header_hash(id, &previous_hash, &merkle_root, &leaves);
        Self {
            id,
            previous_hash,
            merkle_root,
            hash,
            audits,
        }
    }

    pub fn leaf_hashes(&self) -> Vec<String> {
        self.audits.iter().map(Audit::leaf_hash).collect()
    }

    /// Recompute the Merkle root from the embedded audits, in order.
    pub fn computed_merkle_root(&self) -> String {
        merkle_root(&self.leaf_hashes())
    }

    /// Recompute the header hash from the embedded fields.
    pub fn computed_header_hash(&self) -> String {
        header_hash(self.id, &self.previous_hash, &self.merkle_root, &self.leaf_hashes())
    }

    pub fn meta(&self) -> BlockMeta {
        BlockMeta {
            id: self.id,
            hash: self.hash.clone(),
            previous_hash: self.previous_hash.clone(),
            merkle_root: self.merkle_root.clone(),
        }
    }
}

/// Header hash over the block identity and ordered leaf digests.
///
/// The hash is assigned by the proposer; validators treat it as opaque unless
/// header verification is switched on, so the serialization here is the one
/// documented contract for that switch.
fn header_hash(id: u64, previous_hash: &str, merkle_root: &str, leaves: &[String]) -> String {
    let mut header = String::new();
    header.push_str(&id.to_string());
    header.push_str(previous_hash);
    header.push_str(merkle_root);
    for leaf in leaves {
        header.push_str(leaf);
    }
    sha256_hex(header.as_bytes())
}

/// Persisted per-block metadata; the chain store owns an append-only ordered
/// sequence of these and the head is the last element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub id: u64,
    pub hash: String,
    pub previous_hash: String,
    pub merkle_root: String,
}
