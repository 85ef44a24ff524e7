//! Structured error taxonomy for the transaction lifecycle engine.
//!
//! Mirrors the shape of `pantos.common.exceptions.BaseError`/`ErrorCreator`
//! (a generic base error specialized per failure site) but trades the
//! original's free-form `details` dict for a typed [`ErrorDetail`] payload,
//! per the Design Notes recommendation for statically typed languages.

use crate::chain_id::ChainId;
use crate::types::InternalTransactionId;
use std::fmt;

/// Structured context attached to a [`TxRelayError`].
#[derive(Debug, Clone, Default)]
pub struct ErrorDetail {
    pub chain: Option<ChainId>,
    pub transaction_id: Option<InternalTransactionId>,
    pub nonce: Option<u64>,
    pub hosts: Vec<String>,
    /// Pool-ordered `(index, result)` pairs for a `ResultsNotMatching`
    /// reconciliation failure, e.g. `[(0, "1000"), (1, "999")]` for
    /// `spec.md` §8 scenario 1's `{"0": 1000, "1": 999}`.
    pub mismatches: Vec<(usize, String)>,
}

impl ErrorDetail {
    pub fn chain(mut self, chain: ChainId) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn transaction_id(mut self, id: InternalTransactionId) -> Self {
        self.transaction_id = Some(id);
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn hosts(mut self, hosts: Vec<String>) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn mismatches(mut self, mismatches: Vec<(usize, String)>) -> Self {
        self.mismatches = mismatches;
        self
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(chain) = self.chain {
            write!(f, "chain={chain:?}")?;
            wrote = true;
        }
        if let Some(id) = self.transaction_id {
            write!(f, "{}tx={id}", if wrote { ", " } else { "" })?;
            wrote = true;
        }
        if let Some(nonce) = self.nonce {
            write!(f, "{}nonce={nonce}", if wrote { ", " } else { "" })?;
            wrote = true;
        }
        if !self.hosts.is_empty() {
            write!(
                f,
                "{}hosts=[{}]",
                if wrote { ", " } else { "" },
                self.hosts.join(", ")
            )?;
            wrote = true;
        }
        if !self.mismatches.is_empty() {
            let pairs = self
                .mismatches
                .iter()
                .map(|(index, value)| format!("{index}: {value}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "{}results={{{pairs}}}", if wrote { ", " } else { "" })?;
        }
        Ok(())
    }
}

/// The error taxonomy shared by every component in this crate.
///
/// Variant names follow `blockchains/base.py` and `blockchains/ethereum.py`
/// (`NodeConnectionError`, `SingleNodeConnectionError`,
/// `MaxTotalFeePerGasExceededError`, `TransactionNonceTooLowError`,
/// `TransactionUnderpricedError`, `ResultsNotMatchingError`), plus
/// `NotInitialized` from `pantos.common.exceptions`.
#[derive(Debug, thiserror::Error)]
pub enum TxRelayError {
    #[error("no node in the pool could be reached ({detail})")]
    NodeConnection { detail: ErrorDetail },

    #[error("node connection failed: {detail}")]
    SingleNodeConnection { detail: ErrorDetail },

    #[error("node results did not match: {detail}")]
    ResultsNotMatching { detail: ErrorDetail },

    #[error("max total fee per gas exceeded: {detail}")]
    MaxTotalFeePerGasExceeded { detail: ErrorDetail },

    #[error("transaction nonce too low: {detail}")]
    TransactionNonceTooLow { detail: ErrorDetail },

    #[error("transaction underpriced: {detail}")]
    TransactionUnderpriced { detail: ErrorDetail },

    #[error("invalid transaction submission request: {reason} ({detail})")]
    InvalidRequest { reason: String, detail: ErrorDetail },

    #[error("chain adapter not initialized for {chain:?}")]
    NotInitialized { chain: ChainId },

    #[error("contract ABI could not be loaded: {reason} ({detail})")]
    AbiLoad { reason: String, detail: ErrorDetail },

    #[error("{reason}: {detail}")]
    Domain { reason: String, detail: ErrorDetail },
}

impl TxRelayError {
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            TxRelayError::NodeConnection { detail }
            | TxRelayError::SingleNodeConnection { detail }
            | TxRelayError::ResultsNotMatching { detail }
            | TxRelayError::MaxTotalFeePerGasExceeded { detail }
            | TxRelayError::TransactionNonceTooLow { detail }
            | TxRelayError::TransactionUnderpriced { detail }
            | TxRelayError::InvalidRequest { detail, .. }
            | TxRelayError::AbiLoad { detail, .. }
            | TxRelayError::Domain { detail, .. } => Some(detail),
            TxRelayError::NotInitialized { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TxRelayError>;
