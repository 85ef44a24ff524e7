//! Default private key construction for the EVM adapter.
//!
//! Narrowed to a single default signer per `spec.md` §4.4's "a default
//! private key (and derived address) must exist" precondition. Env-var
//! resolution of the key material itself lives in `src/config.rs`'s
//! `LiteralOrEnv<T>`; this module only turns the resolved plaintext key into
//! a signer. The original's `decrypt_private_key(encrypted_blob, password)`
//! keystore path is modeled by [`decrypt_private_key`], kept for adapters
//! constructed programmatically from keystore material.

use crate::error::{ErrorDetail, Result, TxRelayError};
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;

/// Parses a private key string (`0x`-prefixed hex) into a signer.
pub fn signer_from_private_key(private_key: &str) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_str(private_key).map_err(|e| TxRelayError::Domain {
        reason: format!("invalid private key: {e}"),
        detail: ErrorDetail::default(),
    })
}

/// Decrypts a password-protected keystore blob into a plaintext private key.
///
/// Grounded in `EthereumUtilities.decrypt_private_key`, which loads a
/// standard Ethereum keystore JSON via `eth_account`. Not wired to any
/// config path in this crate yet (the config loader only supports plaintext
/// keys via env, see `src/config.rs`) — kept so adapters constructed
/// programmatically from keystore material have a primitive to call.
pub fn decrypt_private_key(encrypted_key_json: &str, password: &str) -> Result<String> {
    let tmp = std::env::temp_dir().join(format!("txrelay-keystore-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&tmp, encrypted_key_json).map_err(|e| TxRelayError::Domain {
        reason: format!("unable to stage keystore for decryption: {e}"),
        detail: ErrorDetail::default(),
    })?;
    let result = PrivateKeySigner::decrypt_keystore(&tmp, password).map_err(|e| TxRelayError::Domain {
        reason: format!("unable to decrypt keystore: {e}"),
        detail: ErrorDetail::default(),
    });
    let _ = std::fs::remove_file(&tmp);
    result.map(|signer| hex::encode(signer.credential().to_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0xcafe000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn parses_a_plaintext_private_key() {
        let signer = signer_from_private_key(TEST_KEY).unwrap();
        assert_eq!(signer.address().to_string().len(), 42);
    }

    #[test]
    fn rejects_a_malformed_key() {
        assert!(signer_from_private_key("not-a-key").is_err());
    }
}
