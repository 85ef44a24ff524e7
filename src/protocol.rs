//! Closed set of supported Pantos protocol versions, maintained in code.
//!
//! Grounded in `pantos.common.protocol`: `_SUPPORTED_PROTOCOL_VERSIONS` is a
//! `set[semantic_version.Version]` literal in that module, with
//! `get_latest_protocol_version`/`get_supported_protocol_versions`/
//! `is_supported_protocol_version` as read-only accessors over it. Consulted
//! by [`crate::chain_adapter::ChainAdapter::is_protocol_version_supported_by_contract`].

use crate::types::ProtocolVersion;

/// The protocol versions this crate knows how to interoperate with.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[ProtocolVersion] =
    &[ProtocolVersion { major: 0, minor: 1, patch: 0 }];

/// The latest supported protocol version, matching `get_latest_protocol_version`.
pub fn latest_protocol_version() -> ProtocolVersion {
    *SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .max()
        .expect("at least one supported protocol version is always compiled in")
}

/// All supported protocol versions in ascending order, matching
/// `get_supported_protocol_versions`.
pub fn supported_protocol_versions() -> Vec<ProtocolVersion> {
    let mut versions = SUPPORTED_PROTOCOL_VERSIONS.to_vec();
    versions.sort();
    versions
}

/// Whether `version` is one this crate supports, matching
/// `is_supported_protocol_version`.
pub fn is_supported_protocol_version(version: ProtocolVersion) -> bool {
    SUPPORTED_PROTOCOL_VERSIONS.contains(&version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_is_the_max_of_the_supported_set() {
        let latest = latest_protocol_version();
        assert!(supported_protocol_versions().iter().all(|v| *v <= latest));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        assert!(!is_supported_protocol_version(ProtocolVersion { major: 99, minor: 0, patch: 0 }));
    }
}
