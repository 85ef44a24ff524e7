//! The `ChainAdapter` trait: the per-chain abstract base every concrete
//! adapter (EVM reference adapter, non-EVM stub) implements.
//!
//! Grounded in the abstract methods of `BlockchainUtilities` in
//! `blockchains/base.py`: `submit_transaction`, `read_transaction_status`,
//! `get_unhealthy_nodes`, `is_valid_address`, `is_equal_address`,
//! `_get_transaction_method_names`.

use crate::chain_id::{ChainFamily, ChainId};
use crate::error::{ErrorDetail, Result, TxRelayError};
use crate::resubmission;
use crate::types::{
    ContractAbiRef, NodeEndpoint, NodesHealth, TransactionReceiptInfo,
    TransactionResubmissionRequest, TransactionResubmissionResponse, TransactionStatus,
    TransactionSubmissionRequest, TransactionSubmissionResponse, UnhealthyNode,
};
use async_trait::async_trait;
use std::time::Duration;

/// Shared "this adapter doesn't implement that operation" error for the
/// default trait methods below, so the non-EVM stub (and test fakes) get a
/// consistent message without repeating it per adapter.
fn not_implemented(chain: ChainId) -> TxRelayError {
    TxRelayError::Domain {
        reason: "operation not implemented for this chain adapter".to_string(),
        detail: ErrorDetail::default().chain(chain),
    }
}

/// Per-chain write-method identifiers, used by the dispatcher to decide
/// fan-out-all vs. single-random-target. Grounded in
/// `_TRANSACTION_METHOD_NAMES` in `ethereum.py`.
pub const EVM_TRANSACTION_METHOD_NAMES: &[&str] = &[
    "send_raw_transaction",
    "send_transaction",
    "replace_transaction",
    "modify_transaction",
    "transact",
];

#[async_trait]
pub trait ChainAdapter: Send + Sync {
    fn chain(&self) -> ChainId;

    fn chain_family(&self) -> ChainFamily {
        self.chain().family()
    }

    /// Validates an address string's shape for this chain.
    fn is_valid_address(&self, address: &str) -> bool;

    /// Compares two addresses for equality under this chain's case-folding
    /// rules (EVM: case-insensitive).
    fn is_equal_address(&self, a: &str, b: &str) -> bool;

    /// The per-chain write-method set consulted by the dispatcher. EVM
    /// adapters use [`EVM_TRANSACTION_METHOD_NAMES`]; the non-EVM stub has
    /// none since it never dispatches writes.
    fn write_method_names(&self) -> &'static [&'static str] {
        match self.chain_family() {
            ChainFamily::Evm => EVM_TRANSACTION_METHOD_NAMES,
            ChainFamily::NonEvm => &[],
        }
    }

    async fn submit_transaction(
        &self,
        request: TransactionSubmissionRequest,
    ) -> Result<TransactionSubmissionResponse>;

    /// Fee-bump-and-resubmit loop. Grounded in `BlockchainUtilities
    /// .resubmit_transaction` in `blockchains/base.py`, which is a concrete
    /// method on the base class (not per-chain abstract): it is expressed
    /// here as a default method delegating to the chain-agnostic
    /// [`crate::resubmission`] loop over `self.submit_transaction`.
    async fn resubmit_transaction(
        &self,
        request: TransactionResubmissionRequest,
    ) -> Result<TransactionResubmissionResponse> {
        resubmission::resubmit(request, |submission| self.submit_transaction(submission)).await
    }

    async fn read_transaction_status(
        &self,
        transaction_id: &str,
        required_confirmations: u64,
    ) -> Result<TransactionStatus>;

    /// Attempts [`build_single_connection`]-equivalent liveness probes
    /// against every URL and reports the ones that failed. Grounded in
    /// `BlockchainUtilities.get_unhealthy_nodes` in `blockchains/base.py`.
    async fn unhealthy_endpoints(
        &self,
        urls: &[NodeEndpoint],
        timeout: Option<Duration>,
    ) -> Vec<UnhealthyNode>;

    /// Convenience health snapshot over this adapter's own configured
    /// primary + fallback endpoints, used by the REST health surface.
    async fn health(&self) -> Result<NodesHealth>;

    /// Average block time for this chain, used by the Lifecycle Scheduler
    /// to key resubmission/confirmation countdowns (`spec.md` §4.6).
    fn average_block_time(&self) -> Duration;

    /// Confirmations required before a transaction is reported `Confirmed`.
    fn required_confirmations(&self) -> u64;

    /// Derives this chain's address from a private key. Grounded in
    /// `EthereumUtilities.get_address`. Defaults to "not implemented" for
    /// adapters (like the non-EVM stub) that never hold real key material.
    fn address_of(&self, _private_key: &str) -> Result<String> {
        Err(not_implemented(self.chain()))
    }

    /// Decrypts a password-protected keystore blob into a plaintext private
    /// key. Grounded in `EthereumUtilities.decrypt_private_key` /
    /// `spec.md` §4.3's `decrypt_key`.
    fn decrypt_key(&self, _encrypted_key: &str, _password: &str) -> Result<String> {
        Err(not_implemented(self.chain()))
    }

    /// Reads an account's native balance, or (when `token_contract` is set)
    /// an ERC-20-style token balance, reconciled across the pool. Grounded
    /// in `EthereumUtilities.get_balance`.
    async fn balance(&self, _account: &str, _token_contract: Option<&str>) -> Result<u128> {
        Err(not_implemented(self.chain()))
    }

    /// Reads a transaction's raw receipt fields plus the pool's current
    /// block number. Grounded in the receipt lookup inlined in
    /// `EthereumUtilities.read_transaction_status`; the default
    /// [`ChainAdapter::read_transaction_status`] implementation for a
    /// concrete adapter is expected to build on this primitive.
    async fn read_receipt(&self, _transaction_id: &str) -> Result<TransactionReceiptInfo> {
        Err(not_implemented(self.chain()))
    }

    /// Determines whether `contract_address` advertises one of the
    /// [`crate::protocol::SUPPORTED_PROTOCOL_VERSIONS`] via its on-contract
    /// version getter. Grounded in `BlockchainUtilities
    /// .is_protocol_version_supported_by_contract`.
    async fn is_protocol_version_supported_by_contract(
        &self,
        _contract_address: &str,
        _abi_ref: ContractAbiRef,
    ) -> Result<bool> {
        Err(not_implemented(self.chain()))
    }
}
