use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ChainError, ChainResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    pub rpc_listen: SocketAddr,
    /// Address this peer advertises to the cluster; peers key heartbeat and
    /// election state on it, so it must match what others dial.
    pub self_address: String,
    pub peer_addresses: Vec<String>,
    pub block_time_ms: u64,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_election_interval_ms")]
    pub election_interval_ms: u64,
    pub max_block_audits: usize,
    #[serde(default = "default_gossip_timeout_ms")]
    pub gossip_timeout_ms: u64,
    #[serde(default = "default_broadcast_timeout_ms")]
    pub broadcast_timeout_ms: u64,
    /// Re-verify every audit signature inside proposed and committed blocks.
    /// Ingress-side verification makes this redundant in trusted clusters.
    #[serde(default)]
    pub verify_block_audit_signatures: bool,
    /// Recompute the proposer-assigned header hash during proposal checks.
    #[serde(default)]
    pub verify_block_header_hash: bool,
}

fn default_heartbeat_interval_ms() -> u64 {
    1_000
}

fn default_election_interval_ms() -> u64 {
    3_000
}

fn default_gossip_timeout_ms() -> u64 {
    200
}

fn default_broadcast_timeout_ms() -> u64 {
    2_000
}

impl NodeConfig {
    pub fn load(path: &Path) -> ChainResult<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|err| ChainError::Config(format!("unable to parse config: {err}")))
    }

    pub fn save(&self, path: &Path) -> ChainResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let encoded = toml::to_string_pretty(self)
            .map_err(|err| ChainError::Config(format!("unable to encode config: {err}")))?;
        fs::write(path, encoded)?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> ChainResult<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(self.blocks_dir())?;
        Ok(())
    }

    pub fn chain_path(&self) -> PathBuf {
        self.data_dir.join("chain.json")
    }

    pub fn blocks_dir(&self) -> PathBuf {
        self.data_dir.join("blocks")
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            rpc_listen: "127.0.0.1:9001".parse().expect("valid socket addr"),
            self_address: "127.0.0.1:9001".to_string(),
            peer_addresses: Vec::new(),
            block_time_ms: 5_000,
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            election_interval_ms: default_election_interval_ms(),
            max_block_audits: 512,
            gossip_timeout_ms: default_gossip_timeout_ms(),
            broadcast_timeout_ms: default_broadcast_timeout_ms(),
            verify_block_audit_signatures: false,
            verify_block_header_hash: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn save_and_load_roundtrips() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("node.toml");
        let mut config = NodeConfig::default();
        config.peer_addresses = vec!["127.0.0.1:9002".to_string()];
        config.save(&path).expect("save");
        let loaded = NodeConfig::load(&path).expect("load");
        assert_eq!(loaded.self_address, config.self_address);
        assert_eq!(loaded.peer_addresses, config.peer_addresses);
        assert_eq!(loaded.gossip_timeout_ms, 200);
    }

    #[test]
    fn optional_knobs_default_when_absent() {
        let parsed: NodeConfig = toml::from_str(
            r#"
            data_dir = "./data"
            rpc_listen = "127.0.0.1:9001"
            self_address = "127.0.0.1:9001"
            peer_addresses = []
            block_time_ms = 5000
            max_block_audits = 512
            "#,
        )
        .expect("parse");
        assert_eq!(parsed.gossip_timeout_ms, 200);
        assert!(!parsed.verify_block_audit_signatures);
        assert!(!parsed.verify_block_header_hash);
    }
}
