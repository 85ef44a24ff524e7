//! Closed enumeration of supported chains.
//!
//! Grounded in `pantos.common.blockchains.enums.Blockchain`: a stable,
//! small integer-coded `IntEnum`, not an open CAIP-2 namespace/reference
//! pair. Adding a chain here is a schema change, matching the spec's intent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported blockchain network.
///
/// Numeric discriminants are stable identifiers (serialized form), mirroring
/// `Blockchain`'s `IntEnum` values in the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainId {
    Ethereum = 0,
    BnbChain = 1,
    Avalanche = 3,
    Solana = 4,
    Polygon = 5,
}

/// The adapter family a [`ChainId`] belongs to.
///
/// Used by the registry and dispatcher to refuse routing writes to a
/// non-EVM stub adapter (see Open Question resolution in `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFamily {
    Evm,
    NonEvm,
}

impl ChainId {
    /// All chains this crate knows the numeric identity of.
    pub const ALL: [ChainId; 5] = [
        ChainId::Ethereum,
        ChainId::BnbChain,
        ChainId::Avalanche,
        ChainId::Solana,
        ChainId::Polygon,
    ];

    /// Pascal-case name, matching `Blockchain.name_in_pascal_case`.
    pub fn name_in_pascal_case(&self) -> &'static str {
        match self {
            ChainId::Ethereum => "Ethereum",
            ChainId::BnbChain => "BnbChain",
            ChainId::Avalanche => "Avalanche",
            ChainId::Solana => "Solana",
            ChainId::Polygon => "Polygon",
        }
    }

    /// Parses a chain from its upper snake-case name, matching
    /// `Blockchain.from_name`.
    pub fn from_name(name: &str) -> Option<ChainId> {
        match name.to_ascii_uppercase().as_str() {
            "ETHEREUM" => Some(ChainId::Ethereum),
            "BNB_CHAIN" => Some(ChainId::BnbChain),
            "AVALANCHE" => Some(ChainId::Avalanche),
            "SOLANA" => Some(ChainId::Solana),
            "POLYGON" => Some(ChainId::Polygon),
            _ => None,
        }
    }

    pub fn family(&self) -> ChainFamily {
        match self {
            ChainId::Solana => ChainFamily::NonEvm,
            _ => ChainFamily::Evm,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name_in_pascal_case())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_name() {
        for chain in ChainId::ALL {
            let name = chain.name_in_pascal_case().to_ascii_uppercase();
            assert_eq!(ChainId::from_name(&name), Some(chain));
        }
    }

    #[test]
    fn solana_is_non_evm() {
        assert_eq!(ChainId::Solana.family(), ChainFamily::NonEvm);
        assert_eq!(ChainId::Ethereum.family(), ChainFamily::Evm);
    }
}
