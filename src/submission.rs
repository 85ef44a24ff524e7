//! Chain-agnostic pieces of the Submission Engine: request validation and
//! RPC error-message classification.
//!
//! Grounded in `BlockchainUtilities.__check_transaction_submission_request`
//! (inlined in `ethereum.py`'s `submit_transaction`) and the nonce/underpriced
//! string matching in the same module's `__send_raw_transaction`.

use crate::chain_id::ChainId;
use crate::error::{ErrorDetail, Result, TxRelayError};
use crate::types::TransactionSubmissionRequest;

const MIN_GAS: u64 = 21_000;

/// Validates a submission request's numeric preconditions.
///
/// - `gas`, if set (nonzero), must be `>= 21_000`.
/// - `max_total_fee_per_gas`, if set (nonzero), must be `>= min_adaptable_fee_per_gas`.
///
/// `min_adaptable_fee_per_gas`, `amount`, and `nonce` are unsigned and need
/// no further runtime check.
pub fn validate(request: &TransactionSubmissionRequest) -> Result<()> {
    if request.gas != 0 && request.gas < MIN_GAS {
        return Err(TxRelayError::InvalidRequest {
            reason: format!("gas must be >= {MIN_GAS} when set"),
            detail: ErrorDetail::default().chain(request.chain),
        });
    }
    if request.max_total_fee_per_gas != 0
        && request.max_total_fee_per_gas < request.min_adaptable_fee_per_gas
    {
        return Err(TxRelayError::MaxTotalFeePerGasExceeded {
            detail: ErrorDetail::default().chain(request.chain),
        });
    }
    Ok(())
}

/// Classifies a node's raw send-transaction error message into the
/// submission taxonomy, matching `ethereum.py`'s pattern match on
/// `"nonce too low"`, `"invalid nonce"`, `"ERR_INCORRECT_NONCE"`, and
/// `"transaction underpriced"`.
pub fn classify_send_error(chain: ChainId, message: &str) -> TxRelayError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("nonce too low")
        || lower.contains("invalid nonce")
        || message.contains("ERR_INCORRECT_NONCE")
    {
        return TxRelayError::TransactionNonceTooLow {
            detail: ErrorDetail::default().chain(chain),
        };
    }
    if lower.contains("transaction underpriced") {
        return TxRelayError::TransactionUnderpriced {
            detail: ErrorDetail::default().chain(chain),
        };
    }
    TxRelayError::Domain {
        reason: message.to_string(),
        detail: ErrorDetail::default().chain(chain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(gas: u64, min_fee: u128, max_fee: u128) -> TransactionSubmissionRequest {
        TransactionSubmissionRequest {
            chain: ChainId::Ethereum,
            from_address: "0xfrom".to_string(),
            to_address: "0xto".to_string(),
            data: vec![],
            gas,
            min_adaptable_fee_per_gas: min_fee,
            max_total_fee_per_gas: max_fee,
            amount: 0,
            nonce: 0,
        }
    }

    #[test]
    fn rejects_gas_below_the_floor() {
        assert!(validate(&request(20_999, 0, 0)).is_err());
    }

    #[test]
    fn zero_gas_means_unset_and_is_accepted() {
        assert!(validate(&request(0, 0, 0)).is_ok());
    }

    #[test]
    fn ceiling_below_tip_is_rejected() {
        let err = validate(&request(21_000, 100, 50)).unwrap_err();
        assert!(matches!(err, TxRelayError::MaxTotalFeePerGasExceeded { .. }));
    }

    #[test]
    fn classifies_nonce_too_low_variants() {
        for message in ["nonce too low", "Invalid Nonce", "ERR_INCORRECT_NONCE: bad"] {
            let err = classify_send_error(ChainId::Ethereum, message);
            assert!(matches!(err, TxRelayError::TransactionNonceTooLow { .. }));
        }
    }

    #[test]
    fn classifies_underpriced() {
        let err = classify_send_error(ChainId::Ethereum, "transaction underpriced");
        assert!(matches!(err, TxRelayError::TransactionUnderpriced { .. }));
    }

    #[test]
    fn anything_else_is_generic() {
        let err = classify_send_error(ChainId::Ethereum, "execution reverted");
        assert!(matches!(err, TxRelayError::Domain { .. }));
    }
}
