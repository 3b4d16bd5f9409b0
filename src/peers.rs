//! Outbound RPC clients, one per configured peer.
//!
//! Every call carries an explicit deadline and there is no retry at this
//! layer; callers decide what a failure means. Clients are constructed once
//! at startup and shared read-only.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::ChainResult;
use crate::types::{
    Audit, Block, BlockCommitResponse, BlockVoteResponse, HeartbeatRequest, HeartbeatResponse,
    NotifyLeadershipRequest, NotifyLeadershipResponse, TriggerElectionRequest,
    TriggerElectionResponse, WhisperResponse,
};

#[derive(Clone)]
pub struct PeerClient {
    address: String,
    base_url: String,
    http: reqwest::Client,
}

impl PeerClient {
    pub fn new(address: &str, http: reqwest::Client) -> Self {
        Self {
            address: address.to_string(),
            base_url: format!("http://{address}"),
            http,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        deadline: Duration,
    ) -> ChainResult<R> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .timeout(deadline)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn whisper_audit(&self, audit: &Audit, deadline: Duration) -> ChainResult<WhisperResponse> {
        self.post("/gossip/audits", audit, deadline).await
    }

    pub async fn propose_block(
        &self,
        block: &Block,
        deadline: Duration,
    ) -> ChainResult<BlockVoteResponse> {
        self.post("/blocks/propose", block, deadline).await
    }

    pub async fn commit_block(
        &self,
        block: &Block,
        deadline: Duration,
    ) -> ChainResult<BlockCommitResponse> {
        self.post("/blocks/commit", block, deadline).await
    }

    pub async fn send_heartbeat(
        &self,
        request: &HeartbeatRequest,
        deadline: Duration,
    ) -> ChainResult<HeartbeatResponse> {
        self.post("/heartbeats", request, deadline).await
    }

    pub async fn trigger_election(
        &self,
        request: &TriggerElectionRequest,
        deadline: Duration,
    ) -> ChainResult<TriggerElectionResponse> {
        self.post("/elections/trigger", request, deadline).await
    }

    pub async fn notify_leadership(
        &self,
        request: &NotifyLeadershipRequest,
        deadline: Duration,
    ) -> ChainResult<NotifyLeadershipResponse> {
        self.post("/elections/leader", request, deadline).await
    }
}

/// One persistent client per configured peer address.
pub struct PeerPool {
    clients: Vec<PeerClient>,
}

impl PeerPool {
    pub fn new(peer_addresses: &[String]) -> Self {
        let http = reqwest::Client::new();
        let clients = peer_addresses
            .iter()
            .map(|address| PeerClient::new(address, http.clone()))
            .collect();
        Self { clients }
    }

    pub fn clients(&self) -> &[PeerClient] {
        &self.clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
