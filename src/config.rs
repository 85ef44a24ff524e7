//! Process configuration: supported chains, their node endpoints, and
//! default signer.
//!
//! Grounded in the teacher's `config.rs` idiom — a `clap`-derived `CliArgs`
//! pointing at a JSON file (`--config`/`CONFIG` env), and a `LiteralOrEnv<T>`
//! wrapper that resolves `$VAR`/`${VAR}` references against the environment
//! at deserialize time — narrowed to this crate's data model: a per-
//! [`ChainId`] node pool, block timing, and a default signer, rather than
//! the teacher's CAIP-2 scheme/network map. The "load once, fail fast if
//! missing" shape follows `pantos.common.configuration.Config`; the
//! per-chain fields follow the `initialize(chain, primary_urls,
//! fallback_urls, avg_block_time, required_confirmations, network_id,
//! default_key?, ...)` signature in `spec.md` §6.

use crate::chain_id::ChainId;
use crate::types::NodeEndpoint;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::net::IpAddr;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// CLI arguments for the `txrelay-health` binary.
#[derive(Parser, Debug)]
#[command(name = "txrelay-health")]
#[command(about = "Reliable multi-chain transaction lifecycle engine: health facade")]
struct CliArgs {
    /// Path to the JSON configuration file.
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

// ============================================================================
// Environment Variable Resolution
// ============================================================================

/// A transparent wrapper that resolves environment variables during
/// deserialization.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"http://localhost:8545"`
/// - Simple env var: `"$EVM_PRIVATE_KEY"`
/// - Braced env var: `"${EVM_PRIVATE_KEY}"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn inner(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    /// Returns the referenced variable name if `s` matches `$VAR` or
    /// `${VAR}` syntax.
    fn parse_env_var_syntax(s: &str) -> Option<String> {
        if let Some(braced) = s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            Some(braced.to_string())
        } else if let Some(rest) = s.strip_prefix('$') {
            if !rest.is_empty() && rest.chars().all(|c| c.is_alphanumeric() || c == '_') {
                Some(rest.to_string())
            } else {
                None
            }
        } else {
            None
        }
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let value = match Self::parse_env_var_syntax(&s) {
            Some(var_name) => std::env::var(&var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "environment variable '{var_name}' not found (referenced as '{s}')"
                ))
            })?,
            None => s,
        };
        value
            .parse::<T>()
            .map(LiteralOrEnv)
            .map_err(|e| serde::de::Error::custom(format!("failed to parse value: {e}")))
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

// ============================================================================
// Per-chain configuration
// ============================================================================

/// One chain's node pool, block timing, and default signer, as loaded from
/// the JSON configuration file. Grounded in the `initialize(...)` signature
/// described in `spec.md` §6.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainEntryConfig {
    /// Primary RPC endpoints, tried first in order.
    pub primary_rpc: Vec<Url>,
    /// Fallback RPC endpoints, shared across all primary slots.
    #[serde(default)]
    pub fallback_rpc: Vec<Url>,
    /// Average block time for this chain, used to key resubmission and
    /// confirmation countdowns.
    pub avg_block_time_secs: u64,
    /// Confirmations required before a transaction is reported `Confirmed`.
    #[serde(default = "chain_entry_defaults::default_required_confirmations")]
    pub required_confirmations: u64,
    /// Chain id used to sign transactions (EIP-155); `None` lets the
    /// adapter omit it (some chains accept unsigned-chain-id legacy txs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<u64>,
    /// Per-connection timeout applied to pool construction and health
    /// probes.
    #[serde(default = "chain_entry_defaults::default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// The default private key this chain's adapter signs submissions
    /// with. A literal hex string or a `$VAR`/`${VAR}` environment
    /// reference.
    pub default_private_key: LiteralOrEnv<String>,
}

mod chain_entry_defaults {
    pub fn default_required_confirmations() -> u64 {
        12
    }

    pub fn default_connect_timeout_secs() -> u64 {
        10
    }
}

impl ChainEntryConfig {
    pub fn primary_endpoints(&self) -> Vec<NodeEndpoint> {
        self.primary_rpc.iter().cloned().map(NodeEndpoint::new).collect()
    }

    pub fn fallback_endpoints(&self) -> Vec<NodeEndpoint> {
        self.fallback_rpc.iter().cloned().map(NodeEndpoint::new).collect()
    }

    pub fn avg_block_time(&self) -> Duration {
        Duration::from_secs(self.avg_block_time_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// ============================================================================
// Top-level configuration
// ============================================================================

/// Server configuration: bind address, the per-chain node map, and the
/// bounded worker count used by the Health Probe.
///
/// Fields use serde defaults that fall back to environment variables, then
/// to hardcoded defaults, matching the teacher's convention.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "config_defaults::default_port")]
    port: u16,
    #[serde(default = "config_defaults::default_host")]
    host: IpAddr,
    chains: HashMap<ChainId, ChainEntryConfig>,
    #[serde(default = "config_defaults::default_health_concurrency")]
    health_concurrency: usize,
    #[serde(default = "config_defaults::default_abi_root")]
    abi_root: PathBuf,
}

pub mod config_defaults {
    use std::env;
    use std::net::IpAddr;
    use std::path::PathBuf;

    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_HEALTH_CONCURRENCY: usize = 8;
    pub const DEFAULT_ABI_ROOT: &str = "abi";

    /// Returns the default port value with fallback: `$PORT` env var -> 8080.
    pub fn default_port() -> u16 {
        env::var("PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_PORT)
    }

    /// Returns the default host value with fallback: `$HOST` env var -> "0.0.0.0".
    pub fn default_host() -> IpAddr {
        env::var("HOST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(IpAddr::V4(DEFAULT_HOST.parse().unwrap()))
    }

    pub fn default_health_concurrency() -> usize {
        env::var("HEALTH_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HEALTH_CONCURRENCY)
    }

    pub fn default_abi_root() -> PathBuf {
        env::var("ABI_ROOT").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_ABI_ROOT))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn chains(&self) -> &HashMap<ChainId, ChainEntryConfig> {
        &self.chains
    }

    pub fn health_concurrency(&self) -> usize {
        self.health_concurrency
    }

    pub fn abi_root(&self) -> &Path {
        &self.abi_root
    }

    /// Loads configuration from CLI arguments and a JSON file.
    ///
    /// The config file path is determined by `--config <path>` (or the
    /// `CONFIG` env var), defaulting to `./config.json`. Values not present
    /// in the config file are resolved via environment variables or
    /// defaults during deserialization.
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        Self::load_from_path(cli_args.config)
    }

    fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path, e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_or_env_passes_through_literals() {
        let parsed: LiteralOrEnv<u64> = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(*parsed.inner(), 42);
    }

    #[test]
    fn literal_or_env_resolves_simple_var_syntax() {
        // SAFETY: test-local env var, no concurrent mutation in this test.
        unsafe { std::env::set_var("TXRELAY_CONFIG_TEST_VAR", "hello") };
        let parsed: LiteralOrEnv<String> = serde_json::from_str("\"$TXRELAY_CONFIG_TEST_VAR\"").unwrap();
        assert_eq!(parsed.into_inner(), "hello");
        unsafe { std::env::remove_var("TXRELAY_CONFIG_TEST_VAR") };
    }

    #[test]
    fn literal_or_env_resolves_braced_var_syntax() {
        unsafe { std::env::set_var("TXRELAY_CONFIG_TEST_VAR_BRACED", "world") };
        let parsed: LiteralOrEnv<String> =
            serde_json::from_str("\"${TXRELAY_CONFIG_TEST_VAR_BRACED}\"").unwrap();
        assert_eq!(parsed.into_inner(), "world");
        unsafe { std::env::remove_var("TXRELAY_CONFIG_TEST_VAR_BRACED") };
    }

    #[test]
    fn missing_env_var_reports_an_error() {
        let result: Result<LiteralOrEnv<String>, _> =
            serde_json::from_str("\"$TXRELAY_CONFIG_DEFINITELY_UNSET\"");
        assert!(result.is_err());
    }

    #[test]
    fn deserializes_a_chain_map_keyed_by_chain_id() {
        let json = r#"{
            "chains": {
                "ethereum": {
                    "primary_rpc": ["http://p1:8545"],
                    "fallback_rpc": ["http://f1:8545"],
                    "avg_block_time_secs": 12,
                    "network_id": 1,
                    "default_private_key": "0xcafe000000000000000000000000000000000000000000000000000000000001"
                }
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let entry = config.chains().get(&ChainId::Ethereum).unwrap();
        assert_eq!(entry.primary_rpc.len(), 1);
        assert_eq!(entry.required_confirmations, 12);
        assert_eq!(config.port(), config_defaults::default_port());
    }
}
