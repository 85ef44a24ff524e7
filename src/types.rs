//! Core data model shared across components.
//!
//! Grounded in the dataclasses of `blockchains/base.py`
//! (`TransactionSubmissionRequest/Response`, `TransactionResubmissionRequest/Response`,
//! `TransactionSubmissionStartRequest`, `UnhealthyNode`) and `health.py`'s
//! `NodesHealth`.

use crate::chain_id::ChainId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// A single RPC node endpoint in a [`crate::node_pool::NodePool`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEndpoint {
    pub url: Url,
}

impl NodeEndpoint {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Host/port portion used in diagnostics, matching the original's
    /// practice of reporting node URLs without embedded credentials.
    pub fn netloc(&self) -> String {
        match (self.url.host_str(), self.url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => self.url.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.netloc())
    }
}

/// Closed set of ABI kinds, matching `pantos.common.blockchains.enums.ContractAbi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractAbiKind {
    StandardToken,
    ProtocolToken,
    ProtocolHub,
    ProtocolForwarder,
}

impl ContractAbiKind {
    pub fn file_stem(&self) -> &'static str {
        match self {
            ContractAbiKind::StandardToken => "standard_token",
            ContractAbiKind::ProtocolToken => "protocol_token",
            ContractAbiKind::ProtocolHub => "protocol_hub",
            ContractAbiKind::ProtocolForwarder => "protocol_forwarder",
        }
    }
}

/// A semantic version identifying a contract ABI generation.
///
/// Participates in the resource lookup path (`v{major}_{minor}_{patch}/`)
/// but deliberately not in the ABI cache key — see `SPEC_FULL.md` §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}_{}_{}", self.major, self.minor, self.patch)
    }
}

/// A reference to a contract's ABI resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAbiRef {
    pub kind: ContractAbiKind,
    pub version: ProtocolVersion,
}

/// Internal identifier for a submitted transaction's lifecycle.
///
/// Matches `uuid.uuid4()` key generation in `blockchains/tasks.py`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InternalTransactionId(pub Uuid);

impl InternalTransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InternalTransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InternalTransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single request to submit a signed transaction.
///
/// Grounded in `TransactionSubmissionRequest` in `blockchains/base.py`.
#[derive(Debug, Clone)]
pub struct TransactionSubmissionRequest {
    pub chain: ChainId,
    pub from_address: String,
    pub to_address: String,
    pub data: Vec<u8>,
    pub gas: u64,
    pub min_adaptable_fee_per_gas: u128,
    pub max_total_fee_per_gas: u128,
    pub amount: u128,
    pub nonce: u64,
}

/// Result of a single submission attempt.
#[derive(Debug, Clone)]
pub struct TransactionSubmissionResponse {
    pub transaction_id: String,
    pub adaptable_fee_per_gas: u128,
}

/// A request to resubmit a previously-submitted, still-unincluded transaction
/// with a bumped fee. Grounded in `TransactionResubmissionRequest`.
#[derive(Debug, Clone)]
pub struct TransactionResubmissionRequest {
    pub chain: ChainId,
    pub from_address: String,
    pub to_address: String,
    pub data: Vec<u8>,
    pub gas: u64,
    pub nonce: u64,
    pub min_adaptable_fee_per_gas: u128,
    pub max_total_fee_per_gas: u128,
    pub amount: u128,
    pub adaptable_fee_increase_factor: f64,
}

pub type TransactionResubmissionResponse = TransactionSubmissionResponse;

/// Request to start a durable, pollable submission — adds the block-time
/// keyed resubmission schedule over a plain submission request. Grounded in
/// `TransactionSubmissionStartRequest`.
#[derive(Debug, Clone)]
pub struct TransactionSubmissionStartRequest {
    pub submission: TransactionSubmissionRequest,
    pub blocks_until_resubmission: u32,
    pub adaptable_fee_increase_factor: f64,
}

/// Lifecycle status of a submitted transaction, matching the four states
/// `read_transaction_status` can report in `ethereum.py`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Unincluded,
    Unconfirmed,
    Confirmed,
    Reverted,
}

/// Snapshot of a lifecycle task's progress, returned by
/// `Scheduler::poll`. Mirrors the `(TransactionStatus, transaction_id)`
/// pair `get_transaction_resubmission_task_result` returns, plus an
/// in-progress variant for "not ready yet" (Celery's `None`).
#[derive(Debug, Clone)]
pub enum LifecycleTaskState {
    Pending,
    Done {
        status: TransactionStatus,
        transaction_id: String,
    },
    Failed {
        reason: String,
    },
}

/// Reported by the health probe for a node that failed a connectivity
/// check. Grounded in `UnhealthyNode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnhealthyNode {
    pub node_domain: String,
    pub status: String,
}

/// Aggregate health snapshot for one chain's node pool. Grounded in
/// `pantos.common.health.NodesHealth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodesHealth {
    pub healthy_total: usize,
    pub unhealthy_total: usize,
    pub unhealthy_nodes: Vec<UnhealthyNode>,
}

/// A transaction receipt's raw fields plus the pool's current block number,
/// as read from the chain. Grounded in the receipt lookup inlined in
/// `EthereumUtilities.read_transaction_status`.
#[derive(Debug, Clone)]
pub struct TransactionReceiptInfo {
    pub block_number: Option<u64>,
    pub status_code: bool,
    pub hash: String,
    pub current_block: u64,
}

/// Average block time, used to key resubmission/confirmation countdowns.
#[derive(Debug, Clone, Copy)]
pub struct BlockTime(pub Duration);

impl BlockTime {
    pub fn seconds(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }
}
