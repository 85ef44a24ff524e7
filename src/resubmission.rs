//! Chain-agnostic fee-bump resubmission loop.
//!
//! Grounded in `BlockchainUtilities.resubmit_transaction` in
//! `blockchains/base.py`: a concrete method on the base class, not a
//! per-chain abstract — the loop itself never touches RPC, it only bumps
//! the adaptable fee and re-invokes the (chain-specific) Submission Engine.
//! Expressed here as a free function so [`crate::chain_adapter::ChainAdapter
//! ::resubmit_transaction`]'s default implementation can delegate to it
//! over any `submit` closure.

use crate::error::{ErrorDetail, Result, TxRelayError};
use crate::types::{
    TransactionResubmissionRequest, TransactionResubmissionResponse, TransactionSubmissionRequest,
};
use std::future::Future;

/// The minimum factor for increasing the adaptable fee per gas in
/// transaction resubmissions, matching `MIN_ADAPTABLE_FEE_INCREASE_FACTOR`.
pub const MIN_ADAPTABLE_FEE_INCREASE_FACTOR: f64 = 1.101;

/// Computes the next minimum adaptable fee per gas: `ceil(prev * factor)`,
/// floored to 1 so a previous value of 0 still produces a positive fee.
/// Never lowers the fee, matching the invariant in `spec.md` §3.
pub fn bump_fee(prev_min: u128, factor: f64) -> u128 {
    let bumped = (prev_min as f64 * factor).ceil();
    (bumped as u128).max(1)
}

/// Runs the fee-bump loop until `submit` succeeds (returns anything other
/// than [`TxRelayError::TransactionUnderpriced`]) or the bumped fee would
/// exceed `max_total_fee_per_gas`.
pub async fn resubmit<F, Fut>(
    request: TransactionResubmissionRequest,
    mut submit: F,
) -> Result<TransactionResubmissionResponse>
where
    F: FnMut(TransactionSubmissionRequest) -> Fut,
    Fut: Future<Output = Result<TransactionResubmissionResponse>>,
{
    if request.adaptable_fee_increase_factor < MIN_ADAPTABLE_FEE_INCREASE_FACTOR {
        return Err(TxRelayError::InvalidRequest {
            reason: format!(
                "adaptable fee increase factor must be >= {MIN_ADAPTABLE_FEE_INCREASE_FACTOR}"
            ),
            detail: ErrorDetail::default().chain(request.chain),
        });
    }

    let mut min_adaptable_fee_per_gas = request.min_adaptable_fee_per_gas;
    loop {
        min_adaptable_fee_per_gas = bump_fee(min_adaptable_fee_per_gas, request.adaptable_fee_increase_factor);
        if min_adaptable_fee_per_gas > request.max_total_fee_per_gas && request.max_total_fee_per_gas > 0 {
            return Err(TxRelayError::MaxTotalFeePerGasExceeded {
                detail: ErrorDetail::default().chain(request.chain),
            });
        }

        let attempt = TransactionSubmissionRequest {
            chain: request.chain,
            from_address: request.from_address.clone(),
            to_address: request.to_address.clone(),
            data: request.data.clone(),
            gas: request.gas,
            min_adaptable_fee_per_gas,
            max_total_fee_per_gas: request.max_total_fee_per_gas,
            amount: request.amount,
            nonce: request.nonce,
        };

        match submit(attempt).await {
            Ok(response) => return Ok(response),
            Err(TxRelayError::TransactionUnderpriced { .. }) => {
                tracing::warn!(
                    chain = ?request.chain,
                    min_adaptable_fee_per_gas,
                    "resubmitted transaction underpriced, bumping fee again"
                );
                continue;
            }
            Err(other) => return Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_id::ChainId;

    fn request(min_fee: u128, max_fee: u128) -> TransactionResubmissionRequest {
        TransactionResubmissionRequest {
            chain: ChainId::Ethereum,
            from_address: "0xfrom".to_string(),
            to_address: "0xto".to_string(),
            data: vec![],
            gas: 21_000,
            nonce: 0,
            min_adaptable_fee_per_gas: min_fee,
            max_total_fee_per_gas: max_fee,
            amount: 0,
            adaptable_fee_increase_factor: MIN_ADAPTABLE_FEE_INCREASE_FACTOR,
        }
    }

    #[test]
    fn bump_fee_floors_at_one_from_zero() {
        assert_eq!(bump_fee(0, MIN_ADAPTABLE_FEE_INCREASE_FACTOR), 1);
    }

    #[test]
    fn bump_fee_is_monotonically_increasing() {
        let mut fee = 1u128;
        for _ in 0..10 {
            let next = bump_fee(fee, MIN_ADAPTABLE_FEE_INCREASE_FACTOR);
            assert!(next > fee);
            fee = next;
        }
        assert!(fee >= 3);
    }

    #[tokio::test]
    async fn retries_on_underpriced_then_succeeds() {
        let req = request(0, 0);
        let mut calls = 0;
        let result = resubmit(req, |submission| {
            calls += 1;
            let fee = submission.min_adaptable_fee_per_gas;
            async move {
                if calls < 4 {
                    Err(TxRelayError::TransactionUnderpriced {
                        detail: ErrorDetail::default(),
                    })
                } else {
                    Ok(TransactionResubmissionResponse {
                        transaction_id: "0xhash".to_string(),
                        adaptable_fee_per_gas: fee,
                    })
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls, 4);
        assert!(result.adaptable_fee_per_gas > 0);
    }

    #[tokio::test]
    async fn ceiling_exceeded_is_propagated() {
        let req = request(100, 101);
        let err = resubmit(req, |_| async {
            Err(TxRelayError::TransactionUnderpriced {
                detail: ErrorDetail::default(),
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, TxRelayError::MaxTotalFeePerGasExceeded { .. }));
    }

    #[test]
    fn rejects_a_factor_below_the_minimum() {
        let req = TransactionResubmissionRequest {
            adaptable_fee_increase_factor: 1.0,
            ..request(0, 0)
        };
        assert!(req.adaptable_fee_increase_factor < MIN_ADAPTABLE_FEE_INCREASE_FACTOR);
    }
}
