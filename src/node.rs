use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time;
use tracing::{debug, info, warn};

use crate::block_store::BlockStore;
use crate::chain::ChainStore;
use crate::config::NodeConfig;
use crate::election::{grants_vote, ElectionState, PeerStats};
use crate::errors::{ChainError, ChainResult};
use crate::heartbeat::HeartbeatTable;
use crate::mempool::Mempool;
use crate::peers::PeerPool;
use crate::types::{
    Audit, Block, BlockCommitResponse, BlockVoteResponse, GetBlockResponse, HeartbeatRequest,
    HeartbeatResponse, NotifyLeadershipRequest, NotifyLeadershipResponse, SubmitAuditResponse,
    TriggerElectionRequest, TriggerElectionResponse, WhisperResponse, STATUS_FAILURE,
    STATUS_SUCCESS,
};

pub struct Node {
    inner: Arc<NodeInner>,
}

#[derive(Clone)]
pub struct NodeHandle {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    config: NodeConfig,
    mempool: Mempool,
    chain: ChainStore,
    blocks: BlockStore,
    heartbeats: HeartbeatTable,
    election: ElectionState,
    peers: PeerPool,
}

#[derive(Clone, Debug, Serialize)]
pub struct NodeStatus {
    pub address: String,
    pub leader: String,
    pub voted_for: String,
    pub latest_block_id: u64,
    pub mem_pool_size: u64,
    pub peer_count: usize,
}

impl Node {
    pub fn new(config: NodeConfig) -> ChainResult<Self> {
        config.ensure_directories()?;
        let chain = ChainStore::open(&config.chain_path())?;
        let blocks = BlockStore::open(&config.blocks_dir())?;
        let peers = PeerPool::new(&config.peer_addresses);
        let inner = Arc::new(NodeInner {
            config,
            mempool: Mempool::new(),
            chain,
            blocks,
            heartbeats: HeartbeatTable::new(),
            election: ElectionState::new(),
            peers,
        });
        Ok(Self { inner })
    }

    pub fn handle(&self) -> NodeHandle {
        NodeHandle {
            inner: self.inner.clone(),
        }
    }

    pub async fn start(self) -> ChainResult<()> {
        self.inner.clone().run().await
    }
}

impl NodeHandle {
    pub async fn submit_audit(&self, audit: Audit) -> ChainResult<SubmitAuditResponse> {
        self.inner.submit_audit(audit).await
    }

    pub fn whisper_audit(&self, audit: Audit) -> ChainResult<WhisperResponse> {
        self.inner.whisper_audit(audit)
    }

    pub fn propose_block(&self, block: &Block) -> BlockVoteResponse {
        self.inner.propose_block(block)
    }

    pub fn commit_block(&self, block: &Block) -> BlockCommitResponse {
        self.inner.commit_block(block)
    }

    pub fn get_block(&self, id: u64) -> GetBlockResponse {
        self.inner.get_block(id)
    }

    pub fn record_heartbeat(&self, request: HeartbeatRequest) -> HeartbeatResponse {
        self.inner.record_heartbeat(request)
    }

    pub fn trigger_election(&self, request: TriggerElectionRequest) -> TriggerElectionResponse {
        self.inner.trigger_election(request)
    }

    pub fn notify_leadership(
        &self,
        request: NotifyLeadershipRequest,
    ) -> NotifyLeadershipResponse {
        self.inner.notify_leadership(request)
    }

    pub fn node_status(&self) -> NodeStatus {
        self.inner.node_status()
    }

    pub fn pending_audits(&self) -> Vec<Audit> {
        self.inner.mempool.load_all()
    }

    pub fn address(&self) -> &str {
        &self.inner.config.self_address
    }
}

impl NodeInner {
    async fn run(self: Arc<Self>) -> ChainResult<()> {
        info!(address = %self.config.self_address, "starting audit node");
        let mut heartbeat =
            time::interval(Duration::from_millis(self.config.heartbeat_interval_ms.max(1)));
        let mut election =
            time::interval(Duration::from_millis(self.config.election_interval_ms.max(1)));
        let mut proposer = time::interval(Duration::from_millis(self.config.block_time_ms.max(1)));
        loop {
            tokio::select! {
                _ = heartbeat.tick() => self.broadcast_heartbeat().await,
                _ = election.tick() => self.stand_for_election().await,
                _ = proposer.tick() => {
                    if let Err(err) = self.propose_round().await {
                        warn!(?err, "block proposal round failed");
                    }
                }
            }
        }
    }

    // -- ingress ---------------------------------------------------------

    async fn submit_audit(&self, audit: Audit) -> ChainResult<SubmitAuditResponse> {
        if !audit.verify() {
            return Err(ChainError::Validation("Invalid client signature".to_string()));
        }
        debug!(req_id = %audit.req_id, "verified client signature");
        self.mempool.append(audit.clone());
        self.gossip_audit(&audit).await;
        Ok(SubmitAuditResponse {
            req_id: audit.req_id,
            status: STATUS_SUCCESS.to_string(),
        })
    }

    /// Concurrent fan-out with a per-peer deadline; failures never reach the
    /// client, whose audit is already accepted locally.
    async fn gossip_audit(&self, audit: &Audit) {
        if self.peers.is_empty() {
            return;
        }
        let deadline = Duration::from_millis(self.config.gossip_timeout_ms);
        let deliveries = self.peers.clients().iter().map(|peer| async move {
            match peer.whisper_audit(audit, deadline).await {
                Ok(ack) => {
                    debug!(peer = peer.address(), status = %ack.status, "gossip delivered")
                }
                Err(err) => warn!(peer = peer.address(), %err, "gossip to peer failed"),
            }
        });
        join_all(deliveries).await;
    }

    // -- replication handlers --------------------------------------------

    fn whisper_audit(&self, audit: Audit) -> ChainResult<WhisperResponse> {
        if !audit.verify() {
            warn!(req_id = %audit.req_id, "invalid signature in gossiped audit");
            return Err(ChainError::Validation(
                "Invalid signature in gossiped audit".to_string(),
            ));
        }
        debug!(req_id = %audit.req_id, "gossiped audit added to mempool");
        self.mempool.append(audit);
        Ok(WhisperResponse {
            status: STATUS_SUCCESS.to_string(),
        })
    }

    fn propose_block(&self, block: &Block) -> BlockVoteResponse {
        if block.computed_merkle_root() != block.merkle_root {
            return BlockVoteResponse::denied("bad merkle_root");
        }
        if block.previous_hash != self.chain.last_hash() {
            return BlockVoteResponse::denied("bad previous_hash");
        }
        if self.config.verify_block_header_hash && block.computed_header_hash() != block.hash {
            return BlockVoteResponse::denied("block_hash mismatch");
        }
        if let Err(reason) = self.check_block_audit_signatures(block) {
            return BlockVoteResponse::denied(&reason);
        }
        BlockVoteResponse::granted()
    }

    fn commit_block(&self, block: &Block) -> BlockCommitResponse {
        if let Some(existing) = self.chain.get_meta(block.id) {
            if existing.hash == block.hash {
                debug!(id = block.id, "block already committed");
                return BlockCommitResponse::success();
            }
            return BlockCommitResponse::failure(&format!("fork at id {}", block.id));
        }
        if block.id > self.chain.last_id() + 1 {
            return BlockCommitResponse::failure("block id out of range");
        }
        if let Err(reason) = self.check_block_audit_signatures(block) {
            return BlockCommitResponse::failure(&reason);
        }
        if let Err(err) = self.blocks.put(block) {
            warn!(id = block.id, %err, "could not write block file");
            return BlockCommitResponse::failure("could not write block file");
        }
        if let Err(err) = self.chain.append(block.meta()) {
            warn!(id = block.id, %err, "could not append chain metadata");
            return BlockCommitResponse::failure(&err.to_string());
        }
        let req_ids: Vec<String> = block.audits.iter().map(|a| a.req_id.clone()).collect();
        self.mempool.remove_batch(&req_ids);
        info!(id = block.id, audits = block.audits.len(), "committed block");
        BlockCommitResponse::success()
    }

    fn check_block_audit_signatures(&self, block: &Block) -> Result<(), String> {
        if !self.config.verify_block_audit_signatures {
            return Ok(());
        }
        for audit in &block.audits {
            if !audit.verify() {
                return Err(format!("invalid audit signature: {}", audit.req_id));
            }
        }
        Ok(())
    }

    fn get_block(&self, id: u64) -> GetBlockResponse {
        if id > self.chain.last_id() {
            return GetBlockResponse {
                block: None,
                status: STATUS_FAILURE.to_string(),
                error_message: "block id out of range".to_string(),
            };
        }
        match self.blocks.get(id) {
            Ok(Some(block)) => GetBlockResponse {
                block: Some(block),
                status: STATUS_SUCCESS.to_string(),
                error_message: String::new(),
            },
            Ok(None) => GetBlockResponse {
                block: None,
                status: STATUS_FAILURE.to_string(),
                error_message: "could not read block file".to_string(),
            },
            Err(err) => {
                warn!(id, %err, "could not read block file");
                GetBlockResponse {
                    block: None,
                    status: STATUS_FAILURE.to_string(),
                    error_message: "could not read block file".to_string(),
                }
            }
        }
    }

    fn record_heartbeat(&self, request: HeartbeatRequest) -> HeartbeatResponse {
        debug!(
            from = %request.from_address,
            leader = %request.current_leader_address,
            block = request.latest_block_id,
            pool = request.mem_pool_size,
            "heartbeat received"
        );
        self.heartbeats.update(
            &request.from_address,
            &request.current_leader_address,
            request.latest_block_id,
            request.mem_pool_size,
        );
        if self.election.leader().is_empty() && !request.current_leader_address.is_empty() {
            self.election.set_leader(&request.current_leader_address);
            info!(leader = %request.current_leader_address, "learned leader from heartbeat");
        }
        HeartbeatResponse {
            status: STATUS_SUCCESS.to_string(),
        }
    }

    fn trigger_election(&self, request: TriggerElectionRequest) -> TriggerElectionResponse {
        let candidate = self
            .heartbeats
            .lookup(&request.address)
            .map(|entry| PeerStats {
                latest_block_id: entry.latest_block_id,
                mem_pool_size: entry.mem_pool_size,
            })
            .unwrap_or_default();
        let local = PeerStats {
            latest_block_id: self.chain.last_id(),
            mem_pool_size: self.mempool.len() as u64,
        };
        let vote = grants_vote(candidate, local, &request.address, &self.config.self_address);
        if vote {
            self.election.set_voted_for(&request.address);
            info!(candidate = %request.address, "granted election vote");
        } else {
            debug!(candidate = %request.address, "denied election vote");
        }
        TriggerElectionResponse {
            vote,
            term: 0,
            status: STATUS_SUCCESS.to_string(),
        }
    }

    fn notify_leadership(&self, request: NotifyLeadershipRequest) -> NotifyLeadershipResponse {
        self.election.set_leader(&request.address);
        info!(leader = %request.address, "leadership notification accepted");
        NotifyLeadershipResponse {
            status: STATUS_SUCCESS.to_string(),
        }
    }

    fn node_status(&self) -> NodeStatus {
        NodeStatus {
            address: self.config.self_address.clone(),
            leader: self.election.leader(),
            voted_for: self.election.voted_for(),
            latest_block_id: self.chain.last_id(),
            mem_pool_size: self.mempool.len() as u64,
            peer_count: self.peers.len(),
        }
    }

    // -- driver loops ----------------------------------------------------

    async fn broadcast_heartbeat(&self) {
        if self.peers.is_empty() {
            return;
        }
        let request = HeartbeatRequest {
            from_address: self.config.self_address.clone(),
            current_leader_address: self.election.leader(),
            latest_block_id: self.chain.last_id(),
            mem_pool_size: self.mempool.len() as u64,
        };
        let deadline = Duration::from_millis(self.config.broadcast_timeout_ms);
        let deliveries = self.peers.clients().iter().map(|peer| {
            let request = request.clone();
            async move {
                if let Err(err) = peer.send_heartbeat(&request, deadline).await {
                    debug!(peer = peer.address(), %err, "heartbeat delivery failed");
                }
            }
        });
        join_all(deliveries).await;
    }

    /// Stand as candidate while no leader is known; with a majority of the
    /// cluster (own vote included) adopt leadership and announce it.
    async fn stand_for_election(&self) {
        if !self.election.leader().is_empty() {
            return;
        }
        let request = TriggerElectionRequest {
            address: self.config.self_address.clone(),
        };
        let deadline = Duration::from_millis(self.config.broadcast_timeout_ms);
        let responses = join_all(self.peers.clients().iter().map(|peer| {
            let request = request.clone();
            async move {
                match peer.trigger_election(&request, deadline).await {
                    Ok(response) => response.vote,
                    Err(err) => {
                        debug!(peer = peer.address(), %err, "election request failed");
                        false
                    }
                }
            }
        }))
        .await;
        let granted = 1 + responses.into_iter().filter(|vote| *vote).count();
        let cluster = self.peers.len() + 1;
        if granted * 2 > cluster {
            info!(votes = granted, cluster, "won leader election");
            self.election.set_leader(&self.config.self_address);
            self.announce_leadership().await;
        } else {
            debug!(votes = granted, cluster, "election attempt fell short");
        }
    }

    async fn announce_leadership(&self) {
        let request = NotifyLeadershipRequest {
            address: self.config.self_address.clone(),
        };
        let deadline = Duration::from_millis(self.config.broadcast_timeout_ms);
        let deliveries = self.peers.clients().iter().map(|peer| {
            let request = request.clone();
            async move {
                if let Err(err) = peer.notify_leadership(&request, deadline).await {
                    warn!(peer = peer.address(), %err, "leadership notification failed");
                }
            }
        });
        join_all(deliveries).await;
    }

    /// Leader-only: batch pending audits into the next block, collect votes,
    /// and on majority commit locally then broadcast the commit.
    async fn propose_round(&self) -> ChainResult<()> {
        if self.election.leader() != self.config.self_address {
            return Ok(());
        }
        let mut audits = self.mempool.load_all();
        if audits.is_empty() {
            return Ok(());
        }
        audits.truncate(self.config.max_block_audits);
        let block = Block::build(self.chain.last_id() + 1, self.chain.last_hash(), audits);
        info!(id = block.id, audits = block.audits.len(), "proposing block");
        let deadline = Duration::from_millis(self.config.broadcast_timeout_ms);
        let votes = join_all(self.peers.clients().iter().map(|peer| {
            let block = &block;
            async move {
                match peer.propose_block(block, deadline).await {
                    Ok(response) => {
                        if !response.vote {
                            debug!(
                                peer = peer.address(),
                                reason = %response.error_message,
                                "proposal rejected"
                            );
                        }
                        response.vote
                    }
                    Err(err) => {
                        warn!(peer = peer.address(), %err, "proposal delivery failed");
                        false
                    }
                }
            }
        }))
        .await;
        let granted = 1 + votes.into_iter().filter(|vote| *vote).count();
        let cluster = self.peers.len() + 1;
        if granted * 2 <= cluster {
            warn!(id = block.id, votes = granted, cluster, "proposal did not reach quorum");
            return Ok(());
        }
        let local = self.commit_block(&block);
        if local.status != STATUS_SUCCESS {
            warn!(id = block.id, reason = %local.error_message, "local commit failed");
            return Ok(());
        }
        let deliveries = self.peers.clients().iter().map(|peer| {
            let block = &block;
            async move {
                match peer.commit_block(block, deadline).await {
                    Ok(response) if response.status == STATUS_SUCCESS => {}
                    Ok(response) => warn!(
                        peer = peer.address(),
                        reason = %response.error_message,
                        "peer rejected commit"
                    ),
                    Err(err) => warn!(peer = peer.address(), %err, "commit delivery failed"),
                }
            }
        });
        join_all(deliveries).await;
        Ok(())
    }
}
