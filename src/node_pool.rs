//! Node pool: an ordered set of live connections, one per primary endpoint,
//! built against a single shared fallback bucket.
//!
//! Grounded in `BlockchainUtilities.create_node_connections` /
//! `__create_valid_node_connection` in `blockchains/base.py`: for each
//! primary URL, try it first, then walk the *shared* fallback list in
//! order, removing a fallback from that shared list only once it has been
//! connected to successfully, so no later primary can reuse it. A fallback
//! that merely fails for one primary stays available to the next (per
//! `base.py:578-584`, only the URL that ends up used is removed). Pool
//! construction fails with every attempted host once a primary (and the
//! rest of the live fallback list) is exhausted.

use crate::error::{ErrorDetail, TxRelayError};
use crate::types::NodeEndpoint;
use std::future::Future;
use std::sync::Mutex;

/// The fallback URLs shared across every primary slot during construction.
struct FallbackBucket {
    remaining: Mutex<Vec<NodeEndpoint>>,
}

impl FallbackBucket {
    fn new(fallbacks: Vec<NodeEndpoint>) -> Self {
        Self {
            remaining: Mutex::new(fallbacks),
        }
    }

    /// Snapshot of the candidates still available, in order. Taken fresh
    /// for every primary slot so a candidate another primary failed on (and
    /// therefore never removed) is offered again.
    fn snapshot(&self) -> Vec<NodeEndpoint> {
        self.remaining.lock().expect("fallback bucket lock poisoned").clone()
    }

    /// Removes `endpoint` from the shared bucket once it has been connected
    /// to successfully, so no later primary slot can claim it too.
    fn remove(&self, endpoint: &NodeEndpoint) {
        let mut guard = self.remaining.lock().expect("fallback bucket lock poisoned");
        if let Some(pos) = guard.iter().position(|candidate| candidate == endpoint) {
            guard.remove(pos);
        }
    }
}

/// A fully populated pool of live connections of type `T`, one per primary
/// endpoint given at construction. Immutable once built.
pub struct NodePool<T> {
    connections: Vec<T>,
}

impl<T> NodePool<T> {
    /// Builds a pool with exactly `primaries.len()` connections.
    ///
    /// For each primary URL in order: try it, then fall back to the shared
    /// `fallbacks` list (first success wins and is removed from the shared
    /// list). If every URL available to a given primary slot fails, the
    /// whole construction fails with [`TxRelayError::NodeConnection`]
    /// carrying every host attempted across every slot.
    pub fn build<F>(
        primaries: &[NodeEndpoint],
        fallbacks: Vec<NodeEndpoint>,
        mut connect: F,
    ) -> Result<Self, TxRelayError>
    where
        F: FnMut(&NodeEndpoint) -> Result<T, TxRelayError>,
    {
        let bucket = FallbackBucket::new(fallbacks);
        let mut connections = Vec::with_capacity(primaries.len());
        for primary in primaries {
            connections.push(Self::connect_one(primary, &bucket, &mut connect)?);
        }
        Ok(Self { connections })
    }

    fn connect_one<F>(
        primary: &NodeEndpoint,
        bucket: &FallbackBucket,
        connect: &mut F,
    ) -> Result<T, TxRelayError>
    where
        F: FnMut(&NodeEndpoint) -> Result<T, TxRelayError>,
    {
        let mut attempted = vec![primary.netloc()];
        if let Ok(connection) = connect(primary) {
            return Ok(connection);
        }
        for candidate in bucket.snapshot() {
            attempted.push(candidate.netloc());
            if let Ok(connection) = connect(&candidate) {
                bucket.remove(&candidate);
                return Ok(connection);
            }
        }
        Err(TxRelayError::NodeConnection {
            detail: ErrorDetail::default().hosts(attempted),
        })
    }

    /// Same construction algorithm as [`NodePool::build`], for connect
    /// primitives that are themselves asynchronous (every real Chain
    /// Adapter's `build_single_connection`). Kept as a separate method
    /// rather than making `build` async so the pure, synchronous variant
    /// stays usable from plain unit tests.
    pub async fn build_async<F, Fut>(
        primaries: &[NodeEndpoint],
        fallbacks: Vec<NodeEndpoint>,
        mut connect: F,
    ) -> Result<Self, TxRelayError>
    where
        F: FnMut(NodeEndpoint) -> Fut,
        Fut: Future<Output = Result<T, TxRelayError>>,
    {
        let bucket = FallbackBucket::new(fallbacks);
        let mut connections = Vec::with_capacity(primaries.len());
        for primary in primaries {
            let mut attempted = vec![primary.netloc()];
            let connection = if let Ok(connection) = connect(primary.clone()).await {
                connection
            } else {
                let mut found = None;
                for candidate in bucket.snapshot() {
                    attempted.push(candidate.netloc());
                    if let Ok(connection) = connect(candidate.clone()).await {
                        bucket.remove(&candidate);
                        found = Some(connection);
                        break;
                    }
                }
                match found {
                    Some(connection) => connection,
                    None => {
                        return Err(TxRelayError::NodeConnection {
                            detail: ErrorDetail::default().hosts(attempted),
                        });
                    }
                }
            };
            connections.push(connection);
        }
        Ok(Self { connections })
    }

    pub fn connections(&self) -> &[T] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn endpoint(s: &str) -> NodeEndpoint {
        NodeEndpoint::new(Url::parse(s).unwrap())
    }

    #[test]
    fn fallback_consumption_is_shared_across_primaries() {
        // p1 fails, f1 succeeds -> pool[0] = f1, f1 removed from the shared
        // bucket. p2 then succeeds directly -> pool[1] = p2. f2 must remain
        // unconsumed. Mirrors SPEC_FULL §8 scenario 2.
        let p1 = endpoint("http://p1:8545");
        let p2 = endpoint("http://p2:8545");
        let f1 = endpoint("http://f1:8545");
        let f2 = endpoint("http://f2:8545");

        let pool = NodePool::build(&[p1, p2], vec![f1, f2], |node| {
            if node.netloc() == "p1:8545" {
                Err(TxRelayError::SingleNodeConnection {
                    detail: ErrorDetail::default(),
                })
            } else {
                Ok(node.netloc())
            }
        })
        .unwrap();

        assert_eq!(pool.connections(), &["f1:8545".to_string(), "p2:8545".to_string()]);
    }

    #[test]
    fn failed_fallback_remains_available_to_a_later_primary() {
        // p1 and p2 both fail directly. f1 fails the first time it's tried
        // (serving p1's slot) but must stay in the shared bucket rather than
        // being consumed by that failure, so p2's slot can try it again and
        // succeed. f2 is held back so the result can only be explained by
        // f1 being offered twice.
        let p1 = endpoint("http://p1:8545");
        let p2 = endpoint("http://p2:8545");
        let f1 = endpoint("http://f1:8545");
        let f2 = endpoint("http://f2:8545");

        let f1_attempts = std::cell::RefCell::new(0u32);
        let pool = NodePool::build(&[p1, p2], vec![f1, f2], |node| match node.netloc().as_str() {
            "p1:8545" | "p2:8545" => Err(TxRelayError::SingleNodeConnection {
                detail: ErrorDetail::default(),
            }),
            "f1:8545" => {
                let mut attempts = f1_attempts.borrow_mut();
                *attempts += 1;
                if *attempts == 1 {
                    Err(TxRelayError::SingleNodeConnection {
                        detail: ErrorDetail::default(),
                    })
                } else {
                    Ok(node.netloc())
                }
            }
            _ => Ok(node.netloc()),
        })
        .unwrap();

        assert_eq!(pool.connections(), &["f2:8545".to_string(), "f1:8545".to_string()]);
    }

    #[test]
    fn exhausting_every_host_reports_all_attempts() {
        let p1 = endpoint("http://p1:8545");
        let f1 = endpoint("http://f1:8545");

        let err = NodePool::<()>::build(&[p1], vec![f1], |_| {
            Err(TxRelayError::SingleNodeConnection {
                detail: ErrorDetail::default(),
            })
        })
        .unwrap_err();

        match err {
            TxRelayError::NodeConnection { detail } => {
                assert_eq!(detail.hosts, vec!["p1:8545", "f1:8545"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn pool_size_matches_primary_count_on_success() {
        let primaries = vec![endpoint("http://p1:8545"), endpoint("http://p2:8545")];
        let pool = NodePool::build(&primaries, vec![], |node| Ok(node.netloc())).unwrap();
        assert_eq!(pool.len(), primaries.len());
    }
}
