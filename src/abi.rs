//! Contract ABI resource loader with per-kind memoization.
//!
//! Grounded in `BlockchainUtilities.load_contract_abi` in
//! `blockchains/base.py`: resolves a file path from the chain name, ABI
//! kind, and protocol version (`v{major}_{minor}_{patch}/{chain}_{abikind}.abi`,
//! a JSON array), caches by kind only (not by version — see `SPEC_FULL.md`
//! §3), and raises a generic "unable to load a contract ABI" error on any
//! failure, deliberately not leaking the underlying I/O error detail.

use crate::chain_id::ChainId;
use crate::error::{ErrorDetail, TxRelayError};
use crate::types::{ContractAbiKind, ProtocolVersion};
use dashmap::DashMap;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Memoized loader for one chain's contract ABIs.
pub struct AbiLoader {
    chain: ChainId,
    root: PathBuf,
    cache: DashMap<ContractAbiKind, Value>,
}

impl AbiLoader {
    pub fn new(chain: ChainId, root: impl Into<PathBuf>) -> Self {
        Self {
            chain,
            root: root.into(),
            cache: DashMap::new(),
        }
    }

    fn resource_path(&self, kind: ContractAbiKind, version: ProtocolVersion) -> PathBuf {
        self.root.join(version.to_string()).join(format!(
            "{}_{}.abi",
            self.chain.name_in_pascal_case().to_ascii_lowercase(),
            kind.file_stem()
        ))
    }

    /// Loads (and caches, keyed by `kind` alone) the ABI for `kind` at
    /// `version`. A cache hit short-circuits resolution entirely, matching
    /// the original's per-kind memoization — a later call with a different
    /// `version` for an already-cached `kind` still returns the first
    /// version loaded.
    pub fn load(&self, kind: ContractAbiKind, version: ProtocolVersion) -> Result<Value, TxRelayError> {
        if let Some(cached) = self.cache.get(&kind) {
            return Ok(cached.clone());
        }
        let path = self.resource_path(kind, version);
        let abi = read_abi_file(&path).map_err(|reason| TxRelayError::AbiLoad {
            reason: "unable to load a contract ABI".to_string(),
            detail: ErrorDetail::default().chain(self.chain).hosts(vec![reason]),
        })?;
        self.cache.insert(kind, abi.clone());
        Ok(abi)
    }
}

fn read_abi_file(path: &Path) -> std::result::Result<Value, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let value: Value = serde_json::from_str(&contents).map_err(|e| e.to_string())?;
    if !value.is_array() {
        return Err("ABI resource is not a JSON array".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn caches_by_kind_ignoring_later_version_requests() {
        let dir = tempdir();
        let v1 = ProtocolVersion { major: 1, minor: 0, patch: 0 };
        let v2 = ProtocolVersion { major: 2, minor: 0, patch: 0 };
        write_abi(&dir, ChainId::Ethereum, ContractAbiKind::StandardToken, v1, "[1]");
        write_abi(&dir, ChainId::Ethereum, ContractAbiKind::StandardToken, v2, "[2]");

        let loader = AbiLoader::new(ChainId::Ethereum, &dir);
        let first = loader.load(ContractAbiKind::StandardToken, v1).unwrap();
        let second = loader.load(ContractAbiKind::StandardToken, v2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_resource_reports_a_generic_reason() {
        let dir = tempdir();
        let loader = AbiLoader::new(ChainId::Ethereum, &dir);
        let err = loader
            .load(
                ContractAbiKind::ProtocolHub,
                ProtocolVersion { major: 1, minor: 0, patch: 0 },
            )
            .unwrap_err();
        match err {
            TxRelayError::AbiLoad { reason, .. } => assert_eq!(reason, "unable to load a contract ABI"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn tempdir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("txrelay-abi-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_abi(
        root: &Path,
        chain: ChainId,
        kind: ContractAbiKind,
        version: ProtocolVersion,
        json: &str,
    ) {
        let dir = root.join(version.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!(
            "{}_{}.abi",
            chain.name_in_pascal_case().to_ascii_lowercase(),
            kind.file_stem()
        ));
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(json.as_bytes()).unwrap();
    }
}
