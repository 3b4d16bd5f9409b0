use std::collections::HashMap;

use parking_lot::RwLock;

use crate::types::Audit;

struct PendingAudit {
    rank: u64,
    audit: Audit,
}

#[derive(Default)]
struct MempoolInner {
    entries: HashMap<String, PendingAudit>,
    next_rank: u64,
}

/// Set of audits known locally but not yet committed in a block, keyed by
/// `req_id`. Appends are idempotent: a duplicate `req_id` overwrites the body
/// but keeps the original insertion rank, so replayed gossip cannot reorder
/// block construction.
#[derive(Default)]
pub struct Mempool {
    inner: RwLock<MempoolInner>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, audit: Audit) {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.entries.get_mut(&audit.req_id) {
            existing.audit = audit;
            return;
        }
        let rank = inner.next_rank;
        inner.next_rank += 1;
        inner.entries.insert(
            audit.req_id.clone(),
            PendingAudit { rank, audit },
        );
    }

    /// All pending audits in insertion order, `req_id` breaking ties, so every
    /// replica that holds the same audit set builds the same block.
    pub fn load_all(&self) -> Vec<Audit> {
        let inner = self.inner.read();
        let mut pending: Vec<(&PendingAudit, &String)> = inner
            .entries
            .iter()
            .map(|(req_id, entry)| (entry, req_id))
            .collect();
        pending.sort_by(|a, b| a.0.rank.cmp(&b.0.rank).then_with(|| a.1.cmp(b.1)));
        pending.into_iter().map(|(entry, _)| entry.audit.clone()).collect()
    }

    /// Remove each id if present; missing ids are ignored.
    pub fn remove_batch(&self, req_ids: &[String]) {
        let mut inner = self.inner.write();
        for req_id in req_ids {
            inner.entries.remove(req_id);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn contains(&self, req_id: &str) -> bool {
        self.inner.read().entries.contains_key(req_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileInfo, UserInfo};

    fn audit(req_id: &str, access: &str) -> Audit {
        Audit {
            req_id: req_id.to_string(),
            timestamp: 1_700_000_000,
            access_type: access.to_string(),
            file_info: FileInfo {
                file_id: "f1".to_string(),
                file_name: "x".to_string(),
            },
            user_info: UserInfo {
                user_id: "u1".to_string(),
                user_name: "alice".to_string(),
            },
            signature: String::new(),
            public_key: String::new(),
        }
    }

    #[test]
    fn load_all_preserves_insertion_order() {
        let mempool = Mempool::new();
        mempool.append(audit("r3", "READ"));
        mempool.append(audit("r1", "READ"));
        mempool.append(audit("r2", "READ"));
        let ids: Vec<String> = mempool.load_all().into_iter().map(|a| a.req_id).collect();
        assert_eq!(ids, vec!["r3", "r1", "r2"]);
    }

    #[test]
    fn duplicate_append_overwrites_without_reordering() {
        let mempool = Mempool::new();
        mempool.append(audit("r1", "READ"));
        mempool.append(audit("r2", "READ"));
        mempool.append(audit("r1", "WRITE"));
        let audits = mempool.load_all();
        assert_eq!(audits.len(), 2);
        assert_eq!(audits[0].req_id, "r1");
        assert_eq!(audits[0].access_type, "WRITE");
        assert_eq!(audits[1].req_id, "r2");
    }

    #[test]
    fn remove_batch_ignores_missing_ids() {
        let mempool = Mempool::new();
        mempool.append(audit("r1", "READ"));
        mempool.append(audit("r2", "READ"));
        mempool.remove_batch(&["r1".to_string(), "missing".to_string()]);
        assert_eq!(mempool.len(), 1);
        assert!(!mempool.contains("r1"));
        assert!(mempool.contains("r2"));
    }
}
