//! Chain adapter registry: `ChainId -> Arc<dyn ChainAdapter>`, with
//! init-and-replace semantics.
//!
//! Grounded in `blockchains/factory.py` (`initialize_blockchain_utilities`,
//! `get_blockchain_utilities`, raising `NotInitializedError` on a miss) and
//! `pantos.common.health.initialize_blockchain_nodes` (the same
//! init-and-replace shape applied to the health registry).

use crate::chain_adapter::ChainAdapter;
use crate::chain_id::{ChainFamily, ChainId};
use crate::error::{Result, TxRelayError};
use dashmap::DashMap;
use std::sync::Arc;

/// Process-wide map of initialized chain adapters.
#[derive(Default)]
pub struct ChainRegistry {
    adapters: DashMap<ChainId, Arc<dyn ChainAdapter>>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the adapter for `chain`, matching
    /// `initialize_blockchain_utilities`'s overwrite-on-reinitialize
    /// behavior.
    pub fn initialize(&self, adapter: Arc<dyn ChainAdapter>) {
        self.adapters.insert(adapter.chain(), adapter);
    }

    pub fn get(&self, chain: ChainId) -> Result<Arc<dyn ChainAdapter>> {
        self.adapters
            .get(&chain)
            .map(|entry| entry.value().clone())
            .ok_or(TxRelayError::NotInitialized { chain })
    }

    /// Same as [`ChainRegistry::get`], but additionally refuses adapters
    /// whose [`ChainFamily`] is not [`ChainFamily::Evm`] — the Open
    /// Question resolution recorded in `DESIGN.md`: the non-EVM stub must
    /// never receive production write traffic.
    pub fn get_writable(&self, chain: ChainId) -> Result<Arc<dyn ChainAdapter>> {
        let adapter = self.get(chain)?;
        if adapter.chain_family() != ChainFamily::Evm {
            return Err(TxRelayError::Domain {
                reason: "chain adapter family does not support transaction submission".to_string(),
                detail: crate::error::ErrorDetail::default().chain(chain),
            });
        }
        Ok(adapter)
    }

    pub fn chains(&self) -> Vec<ChainId> {
        self.adapters.iter().map(|entry| *entry.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubAdapter;

    #[test]
    fn unregistered_chain_reports_not_initialized() {
        let registry = ChainRegistry::new();
        let err = registry.get(ChainId::Ethereum).unwrap_err();
        assert!(matches!(err, TxRelayError::NotInitialized { .. }));
    }

    #[test]
    fn non_evm_adapter_is_rejected_for_writes() {
        let registry = ChainRegistry::new();
        registry.initialize(Arc::new(StubAdapter::new(ChainId::Solana)));
        assert!(registry.get(ChainId::Solana).is_ok());
        assert!(registry.get_writable(ChainId::Solana).is_err());
    }
}
