//! Peer-to-peer permissioned audit-log replication service.
//!
//! Clients submit signed file-access audit events; a cluster of peers
//! gossips those events, batches them into Merkle-rooted, hash-linked
//! blocks, and commits blocks through a quorum-style proposal/commit
//! exchange. A heartbeat and preference-based leader election layer decides
//! which peer may propose.
//!
//! Applications typically depend on [`config::NodeConfig`] to bootstrap a
//! node, [`node::Node`] and [`node::NodeHandle`] to operate it, and
//! [`api::serve`] to expose the RPC surface. The supporting modules cover
//! persistent chain state (`chain`, `block_store`), pending audits
//! (`mempool`), cluster coordination (`heartbeat`, `election`, `peers`) and
//! the cryptographic primitives (`crypto`, `merkle`).

pub mod api;
pub mod block_store;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod election;
pub mod errors;
pub mod heartbeat;
pub mod mempool;
pub mod merkle;
pub mod node;
pub mod peers;
pub mod types;
