mod audit;
mod block;
mod messages;

pub use audit::{Audit, FileInfo, UserInfo};
pub use block::{Block, BlockMeta};
pub use messages::{
    BlockCommitResponse, BlockVoteResponse, GetBlockResponse, HeartbeatRequest, HeartbeatResponse,
    NotifyLeadershipRequest, NotifyLeadershipResponse, SubmitAuditResponse,
    TriggerElectionRequest, TriggerElectionResponse, WhisperResponse, STATUS_FAILURE,
    STATUS_SUCCESS,
};

pub type Address = String;
