//! Request and response payloads of the peer and client RPC surface.
//!
//! Business-level negatives travel in-band: the HTTP status stays 200 while
//! `status` flips to "failure" and `error_message` carries the reason. Only
//! validation failures (bad signatures, malformed payloads) surface as HTTP
//! errors.

use serde::{Deserialize, Serialize};

use super::Block;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAILURE: &str = "failure";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitAuditResponse {
    pub req_id: String,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WhisperResponse {
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockVoteResponse {
    pub vote: bool,
    pub status: String,
    #[serde(default)]
    pub error_message: String,
}

impl BlockVoteResponse {
    pub fn granted() -> Self {
        Self {
            vote: true,
            status: STATUS_SUCCESS.to_string(),
            error_message: String::new(),
        }
    }

    pub fn denied(reason: &str) -> Self {
        Self {
            vote: false,
            status: STATUS_FAILURE.to_string(),
            error_message: reason.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockCommitResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: String,
}

impl BlockCommitResponse {
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            error_message: String::new(),
        }
    }

    pub fn failure(reason: &str) -> Self {
        Self {
            status: STATUS_FAILURE.to_string(),
            error_message: reason.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetBlockResponse {
    pub block: Option<Block>,
    pub status: String,
    #[serde(default)]
    pub error_message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub from_address: String,
    pub current_leader_address: String,
    pub latest_block_id: u64,
    pub mem_pool_size: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriggerElectionRequest {
    pub address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriggerElectionResponse {
    pub vote: bool,
    pub term: u64,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotifyLeadershipRequest {
    pub address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotifyLeadershipResponse {
    pub status: String,
}
