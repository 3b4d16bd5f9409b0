#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use base64ct::{Base64, Encoding};
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use auditmesh::api;
use auditmesh::config::NodeConfig;
use auditmesh::errors::ChainResult;
use auditmesh::node::{Node, NodeHandle};
use auditmesh::types::{Audit, FileInfo, UserInfo};

pub struct TestNode {
    pub handle: NodeHandle,
    pub address: String,
    pub base_url: String,
    api_task: JoinHandle<ChainResult<()>>,
    node_task: Option<JoinHandle<ChainResult<()>>>,
    _dir: TempDir,
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.api_task.abort();
        if let Some(task) = &self.node_task {
            task.abort();
        }
    }
}

/// Reserve distinct loopback addresses by binding them all at once.
pub fn free_addresses(count: usize) -> Vec<String> {
    let listeners: Vec<TcpListener> = (0..count)
        .map(|_| TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port"))
        .collect();
    listeners
        .iter()
        .map(|listener| {
            format!(
                "127.0.0.1:{}",
                listener.local_addr().expect("local addr").port()
            )
        })
        .collect()
}

fn base_config(address: &str, peers: Vec<String>, dir: &TempDir) -> Result<NodeConfig> {
    let mut config = NodeConfig::default();
    config.data_dir = dir.path().to_path_buf();
    config.rpc_listen = address.parse().context("parse listen address")?;
    config.self_address = address.to_string();
    config.peer_addresses = peers;
    Ok(config)
}

async fn spawn(config: NodeConfig, run_loops: bool, dir: TempDir) -> Result<TestNode> {
    let address = config.self_address.clone();
    let rpc_addr = config.rpc_listen;
    let node = Node::new(config)?;
    let handle = node.handle();
    let api_handle = handle.clone();
    let api_task = tokio::spawn(async move { api::serve(api_handle, rpc_addr).await });
    let node_task = run_loops.then(|| tokio::spawn(async move { node.start().await }));
    let base_url = format!("http://{address}");
    wait_for_server(&base_url).await?;
    Ok(TestNode {
        handle,
        address,
        base_url,
        api_task,
        node_task,
        _dir: dir,
    })
}

/// Node with only the RPC surface up; driver loops stay idle so tests can
/// exercise handlers deterministically.
pub async fn spawn_node(address: &str, peers: Vec<String>) -> Result<TestNode> {
    let dir = tempfile::tempdir()?;
    let config = base_config(address, peers, &dir)?;
    spawn(config, false, dir).await
}

/// Node with heartbeat, election and proposal loops running on fast timers.
pub async fn spawn_full_node(address: &str, peers: Vec<String>) -> Result<TestNode> {
    let dir = tempfile::tempdir()?;
    let mut config = base_config(address, peers, &dir)?;
    config.block_time_ms = 200;
    config.heartbeat_interval_ms = 150;
    config.election_interval_ms = 250;
    config.broadcast_timeout_ms = 1_000;
    spawn(config, true, dir).await
}

async fn wait_for_server(base_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(response) = client.get(format!("{base_url}/health")).send().await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("RPC server at {base_url} did not come up");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// Poll `condition` until it holds or the timeout elapses.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

static TEST_KEY: OnceLock<(RsaPrivateKey, String)> = OnceLock::new();

/// Process-wide signing key; RSA key generation is slow enough to share.
pub fn test_key() -> &'static (RsaPrivateKey, String) {
    TEST_KEY.get_or_init(|| {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("generate rsa key");
        let pem = private
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .expect("encode public key");
        (private, pem)
    })
}

pub fn unsigned_audit(req_id: &str) -> Audit {
    Audit {
        req_id: req_id.to_string(),
        timestamp: 1_700_000_000,
        access_type: "READ".to_string(),
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

/// Audit signed with the shared test key over its canonical payload.
pub fn signed_audit(req_id: &str) -> Audit {
    let (private, pem) = test_key();
    let mut audit = unsigned_audit(req_id);
    audit.public_key = pem.clone();
    let payload = audit.canonical_payload();
    let signature = SigningKey::<Sha256>::new(private.clone()).sign(payload.as_bytes());
    audit.signature = Base64::encode_string(&signature.to_vec());
    audit
}

pub fn mempool_contains(handle: &NodeHandle, req_id: &str) -> bool {
    handle.pending_audits().iter().any(|a| a.req_id == req_id)
}
