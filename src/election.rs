//! Leader bookkeeping and the deterministic vote rule.
//!
//! The election is preference-based, not partition-safe: a peer grants its
//! vote to the first candidate that beats its own view of the chain, and
//! `voted_for` is informational after that (no term scoping).

use parking_lot::RwLock;

use crate::types::Address;

#[derive(Default)]
struct ElectionInner {
    leader: Address,
    voted_for: Address,
}

/// Current-leader address and the vote granted by this peer. Empty strings
/// mean "unknown". Single writer per peer; all operations atomic.
#[derive(Default)]
pub struct ElectionState {
    inner: RwLock<ElectionInner>,
}

impl ElectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leader(&self) -> Address {
        self.inner.read().leader.clone()
    }

    pub fn set_leader(&self, address: &str) {
        self.inner.write().leader = address.to_string();
    }

    pub fn voted_for(&self) -> Address {
        self.inner.read().voted_for.clone()
    }

    pub fn set_voted_for(&self, address: &str) {
        self.inner.write().voted_for = address.to_string();
    }

    pub fn clear_vote(&self) {
        self.inner.write().voted_for.clear();
    }
}

/// A peer's replication stats as used by the vote rule.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeerStats {
    pub latest_block_id: u64,
    pub mem_pool_size: u64,
}

/// Decide whether this peer grants its vote to `candidate_addr`.
///
/// Lexicographic preference: more blocks wins; equal blocks, larger mempool
/// wins; full tie falls back to string comparison of addresses. Total and
/// deterministic in its inputs.
pub fn grants_vote(
    candidate: PeerStats,
    local: PeerStats,
    candidate_addr: &str,
    self_addr: &str,
) -> bool {
    candidate.latest_block_id > local.latest_block_id
        || (candidate.latest_block_id == local.latest_block_id
            && candidate.mem_pool_size > local.mem_pool_size)
        || (candidate.latest_block_id == local.latest_block_id
            && candidate.mem_pool_size == local.mem_pool_size
            && candidate_addr > self_addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(blocks: u64, pool: u64) -> PeerStats {
        PeerStats {
            latest_block_id: blocks,
            mem_pool_size: pool,
        }
    }

    #[test]
    fn longer_chain_wins_regardless_of_pool() {
        assert!(grants_vote(stats(3, 0), stats(2, 9), "10.0.0.0", "10.0.0.9"));
        assert!(!grants_vote(stats(1, 9), stats(2, 0), "10.0.0.9", "10.0.0.0"));
    }

    #[test]
    fn equal_chain_prefers_larger_mempool() {
        assert!(grants_vote(stats(2, 5), stats(2, 4), "10.0.0.0", "10.0.0.9"));
        assert!(!grants_vote(stats(2, 3), stats(2, 4), "10.0.0.9", "10.0.0.0"));
    }

    #[test]
    fn full_tie_breaks_on_address_order() {
        assert!(grants_vote(stats(2, 4), stats(2, 4), "10.0.0.2", "10.0.0.1"));
        assert!(!grants_vote(stats(2, 4), stats(2, 4), "10.0.0.0", "10.0.0.1"));
        assert!(!grants_vote(stats(2, 4), stats(2, 4), "10.0.0.1", "10.0.0.1"));
    }

    #[test]
    fn state_transitions_are_atomic_and_observable() {
        let state = ElectionState::new();
        assert_eq!(state.leader(), "");
        assert_eq!(state.voted_for(), "");
        state.set_voted_for("10.0.0.2:9002");
        state.set_leader("10.0.0.2:9002");
        assert_eq!(state.leader(), "10.0.0.2:9002");
        assert_eq!(state.voted_for(), "10.0.0.2:9002");
        state.clear_vote();
        assert_eq!(state.voted_for(), "");
    }
}
