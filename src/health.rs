//! Health Probe: concurrent connectivity checks across every registered
//! chain's configured endpoints.
//!
//! Grounded in `pantos.common.health` (`check_blockchain_nodes_health`,
//! `initialize_blockchain_nodes`): a process-wide registration of
//! `chain -> (urls, timeout)`, checked on demand by fanning out to each
//! chain's adapter and reporting a `NodesHealth` snapshot. `spec.md` §5 calls
//! for explicit parallelism across chains bounded by a worker pool; this is
//! realized with a bounded `tokio` join set rather than an unbounded
//! `futures::join_all`, so a large chain registry cannot open unbounded
//! concurrent connections.

use crate::chain_id::ChainId;
use crate::error::{Result, TxRelayError};
use crate::registry::ChainRegistry;
use crate::types::{NodeEndpoint, NodesHealth};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// One chain's health-check registration: the endpoints to probe and the
/// per-connection timeout to probe them with. Grounded in
/// `_blockchain_nodes[blockchain] = (urls, timeout)` in `health.py`.
#[derive(Debug, Clone)]
pub struct HealthRegistration {
    pub urls: Vec<NodeEndpoint>,
    pub timeout: Option<Duration>,
}

/// Process-wide health-check registry: init-and-replace semantics, matching
/// `initialize_blockchain_nodes`'s "no partial mutation" note in
/// `spec.md` §5.
#[derive(Default)]
pub struct HealthRegistry {
    registrations: DashMap<ChainId, HealthRegistration>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the probe target for `chain` in one atomic
    /// insert, so no caller can observe a half-updated registration.
    pub fn register(&self, chain: ChainId, urls: Vec<NodeEndpoint>, timeout: Option<Duration>) {
        self.registrations
            .insert(chain, HealthRegistration { urls, timeout });
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    fn snapshot(&self) -> Vec<(ChainId, HealthRegistration)> {
        self.registrations
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}

/// Fans out `adapter.unhealthy_endpoints(urls, timeout)` across every
/// registered chain, bounded by `max_concurrent_chains` simultaneous probes.
/// Grounded in `check_blockchain_nodes_health`; raises
/// [`TxRelayError::NotInitialized`]-shaped behavior via a generic domain
/// error when nothing has been registered, matching `NotInitializedError`
/// ("the blockchain nodes have not been initialized yet").
pub async fn check_health(
    registry: &HealthRegistry,
    chains: &ChainRegistry,
    max_concurrent_chains: usize,
) -> Result<HashMap<ChainId, NodesHealth>> {
    let targets = registry.snapshot();
    if targets.is_empty() {
        return Err(TxRelayError::Domain {
            reason: "the blockchain nodes have not been initialized yet".to_string(),
            detail: Default::default(),
        });
    }

    let semaphore = Arc::new(Semaphore::new(max_concurrent_chains.max(1)));
    let mut tasks = Vec::with_capacity(targets.len());
    for (chain, registration) in targets {
        let adapter = chains.get(chain)?;
        let semaphore = Arc::clone(&semaphore);
        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            let unhealthy_nodes = adapter
                .unhealthy_endpoints(&registration.urls, registration.timeout)
                .await;
            let health = NodesHealth {
                healthy_total: registration.urls.len() - unhealthy_nodes.len(),
                unhealthy_total: unhealthy_nodes.len(),
                unhealthy_nodes,
            };
            (chain, health)
        }));
    }

    let mut results = HashMap::with_capacity(tasks.len());
    for task in tasks {
        let (chain, health) = task.await.map_err(|e| TxRelayError::Domain {
            reason: format!("health probe task panicked: {e}"),
            detail: Default::default(),
        })?;
        results.insert(chain, health);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_adapter::ChainAdapter;
    use crate::types::{
        TransactionResubmissionRequest, TransactionResubmissionResponse, TransactionStatus,
        TransactionSubmissionRequest, TransactionSubmissionResponse, UnhealthyNode,
    };
    use async_trait::async_trait;
    use url::Url;

    struct FakeAdapter {
        chain: ChainId,
        unhealthy: Vec<UnhealthyNode>,
    }

    #[async_trait]
    impl ChainAdapter for FakeAdapter {
        fn chain(&self) -> ChainId {
            self.chain
        }

        fn is_valid_address(&self, _address: &str) -> bool {
            true
        }

        fn is_equal_address(&self, a: &str, b: &str) -> bool {
            a == b
        }

        async fn submit_transaction(
            &self,
            _request: TransactionSubmissionRequest,
        ) -> Result<TransactionSubmissionResponse> {
            unimplemented!()
        }

        async fn resubmit_transaction(
            &self,
            _request: TransactionResubmissionRequest,
        ) -> Result<TransactionResubmissionResponse> {
            unimplemented!()
        }

        async fn read_transaction_status(
            &self,
            _transaction_id: &str,
            _required_confirmations: u64,
        ) -> Result<TransactionStatus> {
            unimplemented!()
        }

        async fn unhealthy_endpoints(
            &self,
            _urls: &[NodeEndpoint],
            _timeout: Option<Duration>,
        ) -> Vec<UnhealthyNode> {
            self.unhealthy.clone()
        }

        async fn health(&self) -> Result<NodesHealth> {
            unimplemented!()
        }

        fn average_block_time(&self) -> Duration {
            Duration::from_secs(1)
        }

        fn required_confirmations(&self) -> u64 {
            1
        }
    }

    fn endpoint(s: &str) -> NodeEndpoint {
        NodeEndpoint::new(Url::parse(s).unwrap())
    }

    #[tokio::test]
    async fn reports_not_initialized_with_no_registrations() {
        let registry = HealthRegistry::new();
        let chains = ChainRegistry::new();
        let err = check_health(&registry, &chains, 4).await.unwrap_err();
        assert!(matches!(err, TxRelayError::Domain { .. }));
    }

    #[tokio::test]
    async fn reports_one_unhealthy_of_two() {
        let health_registry = HealthRegistry::new();
        health_registry.register(
            ChainId::Ethereum,
            vec![endpoint("http://u1:8545"), endpoint("http://u2:8545")],
            Some(Duration::from_secs(10)),
        );

        let chains = ChainRegistry::new();
        chains.initialize(Arc::new(FakeAdapter {
            chain: ChainId::Ethereum,
            unhealthy: vec![UnhealthyNode {
                node_domain: "u2:8545".to_string(),
                status: "unreachable".to_string(),
            }],
        }));

        let result = check_health(&health_registry, &chains, 4).await.unwrap();
        let snapshot = &result[&ChainId::Ethereum];
        assert_eq!(snapshot.healthy_total, 1);
        assert_eq!(snapshot.unhealthy_total, 1);
        assert_eq!(snapshot.unhealthy_nodes[0].node_domain, "u2:8545");
    }
}
