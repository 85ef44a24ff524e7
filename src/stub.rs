//! Non-EVM stub adapter.
//!
//! `pantos.common.blockchains.enums.Blockchain` lists non-EVM chains (e.g.
//! `SOLANA`) that this crate does not ship a production adapter for. The
//! stub exists purely so the registry and health probe have something to
//! register against those chain ids during development and testing; see
//! the Open Question resolution in `DESIGN.md` — the registry and
//! dispatcher refuse to route writes to a `ChainFamily::NonEvm` adapter, so
//! this stub can never reach production traffic regardless of what it
//! implements.

use crate::chain_adapter::ChainAdapter;
use crate::chain_id::ChainId;
use crate::error::{ErrorDetail, Result, TxRelayError};
use crate::types::{
    NodeEndpoint, NodesHealth, TransactionResubmissionRequest, TransactionResubmissionResponse,
    TransactionStatus, TransactionSubmissionRequest, TransactionSubmissionResponse, UnhealthyNode,
};
use async_trait::async_trait;
use std::time::Duration;

pub struct StubAdapter {
    chain: ChainId,
}

impl StubAdapter {
    pub fn new(chain: ChainId) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl ChainAdapter for StubAdapter {
    fn chain(&self) -> ChainId {
        self.chain
    }

    fn is_valid_address(&self, address: &str) -> bool {
        !address.is_empty()
    }

    fn is_equal_address(&self, a: &str, b: &str) -> bool {
        a == b
    }

    async fn submit_transaction(
        &self,
        _request: TransactionSubmissionRequest,
    ) -> Result<TransactionSubmissionResponse> {
        Err(unsupported(self.chain))
    }

    async fn resubmit_transaction(
        &self,
        _request: TransactionResubmissionRequest,
    ) -> Result<TransactionResubmissionResponse> {
        Err(unsupported(self.chain))
    }

    async fn read_transaction_status(
        &self,
        _transaction_id: &str,
        _required_confirmations: u64,
    ) -> Result<TransactionStatus> {
        Err(unsupported(self.chain))
    }

    async fn unhealthy_endpoints(
        &self,
        urls: &[NodeEndpoint],
        _timeout: Option<Duration>,
    ) -> Vec<UnhealthyNode> {
        // The stub never establishes a transport, so every configured
        // endpoint is reported unhealthy.
        urls.iter()
            .map(|url| UnhealthyNode {
                node_domain: url.netloc(),
                status: "unreachable".to_string(),
            })
            .collect()
    }

    async fn health(&self) -> Result<NodesHealth> {
        Err(unsupported(self.chain))
    }

    fn average_block_time(&self) -> Duration {
        Duration::from_secs(0)
    }

    fn required_confirmations(&self) -> u64 {
        0
    }
}

fn unsupported(chain: ChainId) -> TxRelayError {
    TxRelayError::Domain {
        reason: "non-EVM stub adapter cannot submit transactions".to_string(),
        detail: ErrorDetail::default().chain(chain),
    }
}
