//! Lifecycle Scheduler: a durable, pollable handle over one transaction's
//! submit -> resubmit -> terminal-status journey.
//!
//! Grounded in `_transaction_resubmission_task` /
//! `create_transaction_resubmission_task` /
//! `get_transaction_resubmission_task_result` in
//! `examples/original_source/pantos/common/blockchains/tasks.py`. The
//! original is expressed against Celery (`apply_async`, `self.retry`,
//! `AsyncResult`); `spec.md` §9's Design Notes deliberately specify the
//! scheduler against an abstract deferred-work runtime so it can be realized
//! over a job queue, a timer wheel, or a persistent workflow engine.
//! `SPEC_FULL.md` §5 resolves this for the reference crate with Tokio:
//! `tokio::spawn` + `tokio::time::sleep` stand in for `apply_async`/
//! `self.retry`, and a `DashMap<InternalTransactionId, LifecycleTaskState>`
//! stands in for Celery's result backend.

use crate::chain_adapter::ChainAdapter;
use crate::chain_id::ChainId;
use crate::error::{ErrorDetail, Result, TxRelayError};
use crate::registry::ChainRegistry;
use crate::resubmission::MIN_ADAPTABLE_FEE_INCREASE_FACTOR;
use crate::types::{
    InternalTransactionId, LifecycleTaskState, TransactionResubmissionRequest, TransactionStatus,
    TransactionSubmissionStartRequest,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on activations for the primary resubmission task, matching
/// `_MAX_TRANSACTION_RESUBMISSION_TASK_RETRIES` in `tasks.py`.
const MAX_RESUBMISSION_RETRIES: u32 = 1000;

/// Upper bound on activations for the dependent-transaction follower task,
/// matching `_MAX_DEPENDENT_TRANSACTION_CHECKS_TASK_RETRIES`.
const MAX_DEPENDENT_RETRIES: u32 = 100;

/// Outcome of [`Scheduler::poll_status`], matching `spec.md` §4.6's
/// "Not ready -> {completed:false}; Ready success ->
/// {completed:true,status,transaction_id}" shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    NotReady,
    Done {
        status: TransactionStatus,
        transaction_id: String,
    },
}

/// The durable, pollable handle over submit/resubmit/status lifecycle
/// tasks. One instance is shared process-wide; tasks for distinct
/// [`InternalTransactionId`]s run independently, matching `spec.md` §5.
pub struct Scheduler {
    chains: Arc<ChainRegistry>,
    results: Arc<DashMap<InternalTransactionId, LifecycleTaskState>>,
}

impl Scheduler {
    pub fn new(chains: Arc<ChainRegistry>) -> Self {
        Self {
            chains,
            results: Arc::new(DashMap::new()),
        }
    }

    /// Public entry point: validates the start request, submits once
    /// (resubmitting immediately on an initial underpriced rejection), then
    /// registers a background resubmission task keyed by a freshly
    /// generated [`InternalTransactionId`]. Grounded in
    /// `create_transaction_resubmission_task`.
    pub async fn start_transaction_submission(
        &self,
        chain: ChainId,
        start: TransactionSubmissionStartRequest,
    ) -> Result<InternalTransactionId> {
        if start.blocks_until_resubmission == 0 {
            return Err(TxRelayError::InvalidRequest {
                reason: "blocks_until_resubmission must be > 0".to_string(),
                detail: ErrorDetail::default().chain(chain),
            });
        }
        if start.adaptable_fee_increase_factor < MIN_ADAPTABLE_FEE_INCREASE_FACTOR {
            return Err(TxRelayError::InvalidRequest {
                reason: format!(
                    "adaptable fee increase factor must be >= {MIN_ADAPTABLE_FEE_INCREASE_FACTOR}"
                ),
                detail: ErrorDetail::default().chain(chain),
            });
        }

        let adapter = self.chains.get_writable(chain)?;

        let submit_result = adapter.submit_transaction(start.submission.clone()).await;
        let response = match submit_result {
            Ok(response) => response,
            Err(TxRelayError::TransactionUnderpriced { .. }) => {
                adapter
                    .resubmit_transaction(resubmission_request(&start, None))
                    .await?
            }
            Err(other) => return Err(other),
        };

        let id = InternalTransactionId::new();
        self.results.insert(id, LifecycleTaskState::Pending);

        let request = resubmission_request(&start, Some(response.adaptable_fee_per_gas));
        self.spawn_resubmission_loop(
            Arc::clone(&adapter),
            id,
            start.blocks_until_resubmission,
            response.transaction_id,
            request,
        );

        Ok(id)
    }

    /// Looks up a task's current result. Grounded in
    /// `get_transaction_resubmission_task_result`: `None` -> not ready,
    /// a `(status, transaction_id)` pair on success, else the underlying
    /// error is raised (here, wrapped with the internal id per `spec.md`
    /// §7's "Poll returns completed=false until terminal; on terminal
    /// failure, surfaces the underlying error").
    pub fn poll_status(&self, id: InternalTransactionId) -> Result<PollOutcome> {
        match self.results.get(&id).map(|entry| entry.clone()) {
            None => Err(TxRelayError::Domain {
                reason: "no lifecycle task registered for this internal transaction id"
                    .to_string(),
                detail: ErrorDetail::default().transaction_id(id),
            }),
            Some(LifecycleTaskState::Pending) => Ok(PollOutcome::NotReady),
            Some(LifecycleTaskState::Done {
                status,
                transaction_id,
            }) => Ok(PollOutcome::Done {
                status,
                transaction_id,
            }),
            Some(LifecycleTaskState::Failed { reason }) => Err(TxRelayError::Domain {
                reason,
                detail: ErrorDetail::default().transaction_id(id),
            }),
        }
    }

    /// Spawns the background activation loop for `id`. Each pass through the
    /// loop is one synchronous "activation" in `spec.md` §5's terms;
    /// `tokio::time::sleep` plays the role of `self.retry(countdown=...)`'s
    /// suspension point.
    fn spawn_resubmission_loop(
        &self,
        adapter: Arc<dyn ChainAdapter>,
        id: InternalTransactionId,
        blocks_until_resubmission: u32,
        mut last_tx_id: String,
        mut request: TransactionResubmissionRequest,
    ) {
        let results = Arc::clone(&self.results);
        tokio::spawn(async move {
            let avg_block_time = adapter.average_block_time();
            let required_confirmations = adapter.required_confirmations();
            let resubmission_delay = avg_block_time * blocks_until_resubmission.max(1);
            let confirmation_delay =
                avg_block_time * u32::try_from(required_confirmations).unwrap_or(u32::MAX);

            let mut retries: u32 = 0;
            let mut last_error: Option<TxRelayError> = None;
            loop {
                if retries >= MAX_RESUBMISSION_RETRIES {
                    let reason = last_error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "resubmission retry budget exhausted".to_string());
                    results.insert(id, LifecycleTaskState::Failed { reason });
                    return;
                }

                let status = match adapter
                    .read_transaction_status(&last_tx_id, required_confirmations)
                    .await
                {
                    Ok(status) => status,
                    Err(error) => {
                        tracing::error!(?id, %last_tx_id, %error, "unable to read the transaction status");
                        last_error = Some(error);
                        retries += 1;
                        tokio::time::sleep(resubmission_delay).await;
                        continue;
                    }
                };

                tracing::info!(?id, ?status, %last_tx_id, "transaction status");
                match status {
                    TransactionStatus::Unincluded => {
                        match adapter.resubmit_transaction(request.clone()).await {
                            Ok(response) => {
                                tracing::info!(
                                    ?id,
                                    adaptable_fee_per_gas = response.adaptable_fee_per_gas,
                                    "adaptable fee per gas increased"
                                );
                                request.min_adaptable_fee_per_gas = response.adaptable_fee_per_gas;
                                last_tx_id = response.transaction_id;
                                retries += 1;
                                tokio::time::sleep(resubmission_delay).await;
                            }
                            Err(TxRelayError::MaxTotalFeePerGasExceeded { .. }) => {
                                tracing::warn!(
                                    ?id,
                                    "unable to further increase the adaptable fee per gas"
                                );
                                // Mirrors the original's linear (not exponential) backoff —
                                // `confirmation_countdown * retries_so_far` — see the Open
                                // Question resolution recorded in DESIGN.md.
                                let countdown = confirmation_delay * retries;
                                retries += 1;
                                tokio::time::sleep(countdown).await;
                            }
                            Err(error) => {
                                tracing::error!(?id, %error, "unable to resubmit a transaction");
                                last_error = Some(error);
                                retries += 1;
                                tokio::time::sleep(resubmission_delay).await;
                            }
                        }
                    }
                    TransactionStatus::Unconfirmed => {
                        retries += 1;
                        tokio::time::sleep(confirmation_delay).await;
                    }
                    TransactionStatus::Confirmed | TransactionStatus::Reverted => {
                        results.insert(
                            id,
                            LifecycleTaskState::Done {
                                status,
                                transaction_id: last_tx_id,
                            },
                        );
                        return;
                    }
                }
            }
        });
    }

    /// Starts a follower submission that waits for a prerequisite task to
    /// reach `blocks_to_wait` confirmations before submitting `follow_up`.
    /// Supplemental feature grounded in
    /// `_dependent_transaction_submission_task`; the Open Question
    /// resolution in `DESIGN.md` records this as canonical core.
    ///
    /// This crate tracks the prerequisite's depth by re-polling
    /// `read_transaction_status` with `blocks_to_wait` as the required
    /// confirmations argument, rather than the original's separate
    /// `get_number_of_confirmations` primitive (not otherwise part of
    /// `ChainAdapter`).
    pub async fn start_dependent_submission(
        &self,
        chain: ChainId,
        prerequisite: InternalTransactionId,
        blocks_to_wait: u64,
        follow_up: TransactionSubmissionStartRequest,
    ) -> Result<InternalTransactionId> {
        let adapter = self.chains.get_writable(chain)?;
        let id = InternalTransactionId::new();
        self.results.insert(id, LifecycleTaskState::Pending);

        let results = Arc::clone(&self.results);
        let scheduler_results_for_prereq = Arc::clone(&self.results);
        let chains = Arc::clone(&self.chains);
        tokio::spawn(async move {
            let avg_block_time = adapter.average_block_time();
            let mut retries: u32 = 0;
            loop {
                if retries >= MAX_DEPENDENT_RETRIES {
                    results.insert(
                        id,
                        LifecycleTaskState::Failed {
                            reason: "dependent transaction retry budget exhausted".to_string(),
                        },
                    );
                    return;
                }
                let prerequisite_state = scheduler_results_for_prereq
                    .get(&prerequisite)
                    .map(|entry| entry.clone());
                match prerequisite_state {
                    None => {
                        results.insert(
                            id,
                            LifecycleTaskState::Failed {
                                reason: "prerequisite transaction is not registered".to_string(),
                            },
                        );
                        return;
                    }
                    Some(LifecycleTaskState::Pending) => {
                        tracing::info!(?id, ?prerequisite, "prerequisite transaction pending, retrying");
                        retries += 1;
                        tokio::time::sleep(avg_block_time).await;
                        continue;
                    }
                    Some(LifecycleTaskState::Failed { reason }) => {
                        results.insert(id, LifecycleTaskState::Failed { reason });
                        return;
                    }
                    Some(LifecycleTaskState::Done {
                        status: TransactionStatus::Reverted,
                        transaction_id,
                    }) => {
                        tracing::info!(?id, ?prerequisite, "prerequisite transaction reverted, aborting");
                        results.insert(
                            id,
                            LifecycleTaskState::Done {
                                status: TransactionStatus::Reverted,
                                transaction_id,
                            },
                        );
                        return;
                    }
                    Some(LifecycleTaskState::Done {
                        status: TransactionStatus::Confirmed,
                        transaction_id,
                    }) => {
                        let required = adapter.required_confirmations().max(blocks_to_wait);
                        match adapter
                            .read_transaction_status(&transaction_id, required)
                            .await
                        {
                            Ok(TransactionStatus::Confirmed) => {
                                tracing::info!(?id, ?prerequisite, "prerequisite transaction confirmed at required depth, submitting dependent transaction");
                                let scheduler = Scheduler {
                                    chains: Arc::clone(&chains),
                                    results: Arc::clone(&results),
                                };
                                match scheduler
                                    .start_transaction_submission(chain, follow_up)
                                    .await
                                {
                                    Ok(dependent_id) => {
                                        // Forward the follower's id as this task's own
                                        // terminal transaction id once it completes.
                                        forward_dependent_result(results, id, scheduler, dependent_id)
                                            .await;
                                    }
                                    Err(error) => {
                                        results.insert(
                                            id,
                                            LifecycleTaskState::Failed {
                                                reason: error.to_string(),
                                            },
                                        );
                                    }
                                }
                                return;
                            }
                            Ok(_) => {
                                retries += 1;
                                tokio::time::sleep(avg_block_time).await;
                                continue;
                            }
                            Err(error) => {
                                tracing::error!(?id, %error, "unable to read prerequisite confirmation depth, retrying");
                                retries += 1;
                                tokio::time::sleep(avg_block_time).await;
                                continue;
                            }
                        }
                    }
                }
            }
        });

        Ok(id)
    }
}

/// Builds a [`TransactionResubmissionRequest`] from a start request,
/// optionally overriding `min_adaptable_fee_per_gas` with the fee achieved
/// by an initial submission attempt.
fn resubmission_request(
    start: &TransactionSubmissionStartRequest,
    achieved_fee: Option<u128>,
) -> TransactionResubmissionRequest {
    let submission = &start.submission;
    TransactionResubmissionRequest {
        chain: submission.chain,
        from_address: submission.from_address.clone(),
        to_address: submission.to_address.clone(),
        data: submission.data.clone(),
        gas: submission.gas,
        nonce: submission.nonce,
        min_adaptable_fee_per_gas: achieved_fee.unwrap_or(submission.min_adaptable_fee_per_gas),
        max_total_fee_per_gas: submission.max_total_fee_per_gas,
        amount: submission.amount,
        adaptable_fee_increase_factor: start.adaptable_fee_increase_factor,
    }
}

/// Polls `scheduler` for `dependent_id`'s terminal result and republishes it
/// under `id`, so callers of the dependent-submission task observe a single
/// stable id end to end.
async fn forward_dependent_result(
    results: Arc<DashMap<InternalTransactionId, LifecycleTaskState>>,
    id: InternalTransactionId,
    scheduler: Scheduler,
    dependent_id: InternalTransactionId,
) {
    loop {
        match scheduler.poll_status(dependent_id) {
            Ok(PollOutcome::NotReady) => {
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
            Ok(PollOutcome::Done {
                status,
                transaction_id,
            }) => {
                results.insert(id, LifecycleTaskState::Done { status, transaction_id });
                return;
            }
            Err(error) => {
                results.insert(
                    id,
                    LifecycleTaskState::Failed {
                        reason: error.to_string(),
                    },
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        NodeEndpoint, NodesHealth, TransactionResubmissionResponse, TransactionSubmissionRequest,
        TransactionSubmissionResponse, UnhealthyNode,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// In-memory fake chain adapter driving a scripted sequence of statuses,
    /// so the scheduler's state machine is testable without real RPC nodes —
    /// the "fake deferred-work runtime" test tooling called for in
    /// `SPEC_FULL.md` §1.
    struct FakeAdapter {
        chain: ChainId,
        submit_calls: AtomicU32,
        statuses: Mutex<Vec<TransactionStatus>>,
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
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            Ok(TransactionSubmissionResponse {
                transaction_id: "0xhash1".to_string(),
                adaptable_fee_per_gas: 10,
            })
        }

        async fn resubmit_transaction(
            &self,
            request: TransactionResubmissionRequest,
        ) -> Result<TransactionResubmissionResponse> {
            Ok(TransactionResubmissionResponse {
                transaction_id: "0xhash2".to_string(),
                adaptable_fee_per_gas: request.min_adaptable_fee_per_gas * 2,
            })
        }

        async fn read_transaction_status(
            &self,
            _transaction_id: &str,
            _required_confirmations: u64,
        ) -> Result<TransactionStatus> {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.is_empty() {
                Ok(TransactionStatus::Confirmed)
            } else {
                Ok(statuses.remove(0))
            }
        }

        async fn unhealthy_endpoints(
            &self,
            _urls: &[NodeEndpoint],
            _timeout: Option<Duration>,
        ) -> Vec<UnhealthyNode> {
            Vec::new()
        }

        async fn health(&self) -> Result<NodesHealth> {
            unimplemented!()
        }

        fn average_block_time(&self) -> Duration {
            Duration::from_millis(5)
        }

        fn required_confirmations(&self) -> u64 {
            1
        }
    }

    fn start_request() -> TransactionSubmissionStartRequest {
        TransactionSubmissionStartRequest {
            submission: TransactionSubmissionRequest {
                chain: ChainId::Ethereum,
                from_address: "0xfrom".to_string(),
                to_address: "0xto".to_string(),
                data: vec![],
                gas: 21_000,
                min_adaptable_fee_per_gas: 10,
                max_total_fee_per_gas: 0,
                amount: 0,
                nonce: 0,
            },
            blocks_until_resubmission: 1,
            adaptable_fee_increase_factor: MIN_ADAPTABLE_FEE_INCREASE_FACTOR,
        }
    }

    #[tokio::test]
    async fn happy_path_reaches_confirmed() {
        let registry = ChainRegistry::new();
        registry.initialize(Arc::new(FakeAdapter {
            chain: ChainId::Ethereum,
            submit_calls: AtomicU32::new(0),
            statuses: Mutex::new(vec![TransactionStatus::Unincluded]),
        }));
        let scheduler = Scheduler::new(Arc::new(registry));

        let id = scheduler
            .start_transaction_submission(ChainId::Ethereum, start_request())
            .await
            .unwrap();

        assert_eq!(scheduler.poll_status(id).unwrap(), PollOutcome::NotReady);

        let outcome = loop {
            match scheduler.poll_status(id).unwrap() {
                PollOutcome::NotReady => tokio::time::sleep(Duration::from_millis(2)).await,
                done @ PollOutcome::Done { .. } => break done,
            }
        };

        match outcome {
            PollOutcome::Done { status, .. } => assert_eq!(status, TransactionStatus::Confirmed),
            PollOutcome::NotReady => unreachable!(),
        }
    }

    #[tokio::test]
    async fn unregistered_id_reports_an_error() {
        let registry = ChainRegistry::new();
        let scheduler = Scheduler::new(Arc::new(registry));
        let err = scheduler
            .poll_status(InternalTransactionId::new())
            .unwrap_err();
        assert!(matches!(err, TxRelayError::Domain { .. }));
    }

    #[tokio::test]
    async fn rejects_a_zero_resubmission_window() {
        let registry = ChainRegistry::new();
        registry.initialize(Arc::new(FakeAdapter {
            chain: ChainId::Ethereum,
            submit_calls: AtomicU32::new(0),
            statuses: Mutex::new(vec![]),
        }));
        let scheduler = Scheduler::new(Arc::new(registry));
        let mut request = start_request();
        request.blocks_until_resubmission = 0;
        let err = scheduler
            .start_transaction_submission(ChainId::Ethereum, request)
            .await
            .unwrap_err();
        assert!(matches!(err, TxRelayError::InvalidRequest { .. }));
    }
}
