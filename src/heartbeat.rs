use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::Address;

/// Last view a peer reported about itself. Stale entries are kept; the
/// election rule tolerates missing peers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeartbeatEntry {
    pub from_address: Address,
    pub current_leader_address: Address,
    pub latest_block_id: u64,
    pub mem_pool_size: u64,
    pub last_seen_timestamp: u64,
}

#[derive(Default)]
pub struct HeartbeatTable {
    inner: RwLock<HashMap<Address, HeartbeatEntry>>,
}

impl HeartbeatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, from: &str, leader: &str, latest_block_id: u64, mem_pool_size: u64) {
        let entry = HeartbeatEntry {
            from_address: from.to_string(),
            current_leader_address: leader.to_string(),
            latest_block_id,
            mem_pool_size,
            last_seen_timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };
        self.inner.write().insert(from.to_string(), entry);
    }

    /// Point-in-time copy of every entry, ordered by peer address.
    pub fn all(&self) -> Vec<HeartbeatEntry> {
        let mut entries: Vec<HeartbeatEntry> = self.inner.read().values().cloned().collect();
        entries.sort_by(|a, b| a.from_address.cmp(&b.from_address));
        entries
    }

    pub fn lookup(&self, from: &str) -> Option<HeartbeatEntry> {
        self.inner.read().get(from).cloned()
    }
}
