//! EVM-family reference Chain Adapter.
//!
//! Grounded in `pantos.common.blockchains.ethereum.EthereumUtilities`: fee
//! assembly for type-2 (EIP-1559) vs. legacy transactions, raw-transaction
//! dispatch with error classification, receipt-based status reads, and
//! revert-reason replay. Provider composition (bare `RootProvider` per node,
//! signing kept out-of-band) follows the teacher's `chain/evm.rs` idiom,
//! simplified because this crate signs once with a single default key
//! rather than juggling a pool of wallet signers.

pub mod signer;

use crate::abi::AbiLoader;
use crate::chain_adapter::ChainAdapter;
use crate::chain_id::ChainId;
use crate::dispatcher::NodeDispatch;
use crate::error::{ErrorDetail, Result, TxRelayError};
use crate::node_pool::NodePool;
use crate::submission;
use crate::types::{
    ContractAbiRef, NodeEndpoint, NodesHealth, ProtocolVersion, TransactionReceiptInfo,
    TransactionStatus, TransactionSubmissionRequest, TransactionSubmissionResponse, UnhealthyNode,
};
use alloy::dyn_abi::DynSolValue;
use alloy::eips::{BlockId, BlockNumberOrTag};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;
use std::time::Duration;

/// A contract function argument: a primitive value, or a homogeneous
/// sequence of primitives. Mirrors the spec's "each primitive or sequence
/// of primitives" in `ContractFunctionArgs`.
#[derive(Debug, Clone)]
pub enum ContractFunctionArg {
    Address(Address),
    Uint256(U256),
    Bool(bool),
    Bytes(Vec<u8>),
    String(String),
    Sequence(Vec<ContractFunctionArg>),
}

impl ContractFunctionArg {
    fn into_dyn_sol_value(self) -> DynSolValue {
        match self {
            ContractFunctionArg::Address(a) => DynSolValue::Address(a),
            ContractFunctionArg::Uint256(v) => DynSolValue::Uint(v, 256),
            ContractFunctionArg::Bool(b) => DynSolValue::Bool(b),
            ContractFunctionArg::Bytes(b) => DynSolValue::Bytes(b),
            ContractFunctionArg::String(s) => DynSolValue::String(s),
            ContractFunctionArg::Sequence(items) => {
                DynSolValue::Array(items.into_iter().map(Self::into_dyn_sol_value).collect())
            }
        }
    }
}

/// Encodes a contract call's calldata: the 4-byte selector followed by the
/// ABI-encoded arguments. Grounded in `ChainAdapter::build_call` from
/// `spec.md` §4.3; callers use this to produce the `data` field of a
/// [`TransactionSubmissionRequest`] before constructing it (this crate's
/// request model pre-encodes calldata rather than carrying the ABI
/// reference through the submission pipeline, see `SPEC_FULL.md` §3).
pub fn encode_call(selector: [u8; 4], args: Vec<ContractFunctionArg>) -> Vec<u8> {
    let mut data = selector.to_vec();
    let values: Vec<DynSolValue> = args.into_iter().map(ContractFunctionArg::into_dyn_sol_value).collect();
    data.extend_from_slice(&DynSolValue::Tuple(values).abi_encode_params());
    data
}

/// Chains this adapter assembles EIP-1559 (type-2) fee fields for; all
/// others fall back to the legacy `gasPrice` model. BNB Chain still runs a
/// pre-London fork rule set, matching `ethereum.py`'s per-network carve-out.
fn supports_eip1559(chain: ChainId) -> bool {
    !matches!(chain, ChainId::BnbChain)
}

/// EVM-family reference adapter. One instance per [`ChainId`], holding a
/// live [`NodePool`] of read providers and the single default signer used
/// for every submission.
pub struct EvmAdapter {
    chain: ChainId,
    pool: NodePool<(String, RootProvider)>,
    endpoints: Vec<NodeEndpoint>,
    avg_block_time: Duration,
    required_confirmations: u64,
    network_id: Option<u64>,
    signer: PrivateKeySigner,
    default_address: Address,
    abi: AbiLoader,
}

impl EvmAdapter {
    /// Builds the node pool and wraps the default signer. Grounded in
    /// `BlockchainUtilities.__init__` + `create_node_connections`.
    pub async fn initialize(
        chain: ChainId,
        primary_urls: Vec<NodeEndpoint>,
        fallback_urls: Vec<NodeEndpoint>,
        avg_block_time: Duration,
        required_confirmations: u64,
        network_id: Option<u64>,
        default_private_key: &str,
        connect_timeout: Option<Duration>,
        abi_root: impl Into<std::path::PathBuf>,
    ) -> Result<Self> {
        if avg_block_time.is_zero() {
            return Err(TxRelayError::InvalidRequest {
                reason: "average block time must be > 0".to_string(),
                detail: ErrorDetail::default().chain(chain),
            });
        }
        let signer = signer::signer_from_private_key(default_private_key)?;
        let default_address = signer.address();
        let all_endpoints: Vec<NodeEndpoint> = primary_urls
            .iter()
            .cloned()
            .chain(fallback_urls.iter().cloned())
            .collect();

        let pool = NodePool::build_async(&primary_urls, fallback_urls, |endpoint| {
            let timeout = connect_timeout;
            async move {
                let provider = Self::build_single_connection(&endpoint, timeout).await?;
                Ok((endpoint.netloc(), provider))
            }
        })
        .await?;

        Ok(Self {
            chain,
            pool,
            endpoints: all_endpoints,
            avg_block_time,
            required_confirmations,
            network_id,
            signer,
            default_address,
            abi: AbiLoader::new(chain, abi_root),
        })
    }

    /// Establishes a transport, performs a liveness probe (`eth_blockNumber`),
    /// and fails with [`TxRelayError::SingleNodeConnection`] on any error.
    /// Grounded in `_create_single_node_connection` in `ethereum.py`.
    async fn build_single_connection(
        endpoint: &NodeEndpoint,
        timeout: Option<Duration>,
    ) -> std::result::Result<RootProvider, TxRelayError> {
        let probe = async {
            let provider = ProviderBuilder::new().connect(endpoint.url.as_str()).await?;
            provider.get_block_number().await?;
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(provider)
        };
        let outcome = match timeout {
            Some(duration) => tokio::time::timeout(duration, probe)
                .await
                .map_err(|_| "connection timed out".to_string())
                .and_then(|inner| inner.map_err(|e| e.to_string())),
            None => probe.await.map_err(|e| e.to_string()),
        };
        outcome.map_err(|reason| TxRelayError::SingleNodeConnection {
            detail: ErrorDetail::default().hosts(vec![format!("{}: {reason}", endpoint.netloc())]),
        })
    }

    fn dispatch(&self) -> NodeDispatch<RootProvider> {
        NodeDispatch::new(self.pool.connections().to_vec())
    }

    fn parse_address(s: &str) -> Result<Address> {
        Address::from_str(s).map_err(|e| TxRelayError::Domain {
            reason: format!("invalid address {s}: {e}"),
            detail: ErrorDetail::default(),
        })
    }

    /// Loads a contract ABI by kind, matching `load_contract_abi`.
    pub fn load_abi(&self, abi_ref: ContractAbiRef) -> Result<serde_json::Value> {
        self.abi.load(abi_ref.kind, abi_ref.version)
    }

    /// Replays the transaction one block before its inclusion block to
    /// recover a revert reason. Grounded in `ethereum.py`'s handling of
    /// archive-node-missing RPC errors. Called from
    /// [`ChainAdapter::read_transaction_status`] whenever a receipt reports
    /// a reverted transaction, so the reason reaches the logs even though
    /// `TransactionStatus` itself carries no payload.
    pub async fn revert_reason(&self, transaction_id: &str) -> Result<String> {
        let hash = alloy::primitives::B256::from_str(transaction_id).map_err(|e| TxRelayError::Domain {
            reason: format!("invalid transaction id: {e}"),
            detail: ErrorDetail::default().chain(self.chain),
        })?;
        let provider = &self.pool.connections()[0].1;
        let receipt = provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| TxRelayError::Domain {
                reason: e.to_string(),
                detail: ErrorDetail::default().chain(self.chain),
            })?
            .ok_or_else(|| TxRelayError::Domain {
                reason: "transaction not yet included".to_string(),
                detail: ErrorDetail::default().chain(self.chain),
            })?;
        let tx = provider
            .get_transaction_by_hash(hash)
            .await
            .map_err(|e| TxRelayError::Domain {
                reason: e.to_string(),
                detail: ErrorDetail::default().chain(self.chain),
            })?
            .ok_or_else(|| TxRelayError::Domain {
                reason: "transaction not found".to_string(),
                detail: ErrorDetail::default().chain(self.chain),
            })?;
        let replay_block = receipt.block_number.unwrap_or(1).saturating_sub(1);
        let request = TransactionRequest::default()
            .to(tx.to().unwrap_or_default())
            .input(tx.input().clone().into())
            .from(tx.from);
        match provider.call(request).block(BlockId::Number(BlockNumberOrTag::Number(replay_block))).await {
            Ok(_) => Ok("no revert reason (replay succeeded)".to_string()),
            Err(e) => Ok(format_revert_error(&e.to_string())),
        }
    }
}

/// Appends the archive-node caveat to a replay error's message when the
/// node reports the historical state needed for the replay is gone.
/// Grounded in `ethereum.py`'s `__retrieve_revert_message`, which catches
/// exactly this RPC error ("missing trie node") when replaying one block
/// before inclusion on a non-archive node.
fn format_revert_error(message: &str) -> String {
    if message.to_ascii_lowercase().contains("missing trie node")
        || message.to_ascii_lowercase().contains("archive")
    {
        format!("{message} due to the absence of an archive node")
    } else {
        message.to_string()
    }
}

#[async_trait::async_trait]
impl ChainAdapter for EvmAdapter {
    fn chain(&self) -> ChainId {
        self.chain
    }

    fn is_valid_address(&self, address: &str) -> bool {
        Address::from_str(address).is_ok()
    }

    fn is_equal_address(&self, a: &str, b: &str) -> bool {
        match (Address::from_str(a), Address::from_str(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    async fn submit_transaction(
        &self,
        request: TransactionSubmissionRequest,
    ) -> Result<TransactionSubmissionResponse> {
        submission::validate(&request)?;
        let dispatch = self.dispatch();
        if dispatch.is_empty() {
            return Err(TxRelayError::NodeConnection {
                detail: ErrorDetail::default().chain(self.chain),
            });
        }

        let to_address = Self::parse_address(&request.to_address)?;

        let (adaptable_fee, mut tx_request) = if supports_eip1559(self.chain) {
            let base_fee: u128 = dispatch
                .get_minimum_async(|provider| block_base_fee(provider))
                .await?;
            let fees = assemble_eip1559_fees(
                self.chain,
                base_fee,
                request.min_adaptable_fee_per_gas,
                request.max_total_fee_per_gas,
            )?;
            let tx = TransactionRequest::default()
                .to(to_address)
                .value(U256::from(request.amount))
                .input(Bytes::from(request.data.clone()).into())
                .nonce(request.nonce)
                .max_fee_per_gas(fees.max_fee_per_gas)
                .max_priority_fee_per_gas(fees.adaptable_fee);
            (fees.adaptable_fee, tx)
        } else {
            let pool_gas_price: u128 = dispatch.get_minimum_async(|provider| gas_price(provider)).await?;
            let gas_price = assemble_legacy_gas_price(
                pool_gas_price,
                request.min_adaptable_fee_per_gas,
                request.max_total_fee_per_gas,
            );
            let tx = TransactionRequest::default()
                .to(to_address)
                .value(U256::from(request.amount))
                .input(Bytes::from(request.data.clone()).into())
                .nonce(request.nonce)
                .gas_price(gas_price);
            (gas_price, tx)
        };

        if request.gas != 0 {
            tx_request = tx_request.gas_limit(request.gas);
        }
        if let Some(network_id) = self.network_id {
            tx_request = tx_request.chain_id(network_id);
        }

        let wallet = EthereumWallet::from(self.signer.clone());
        let envelope = tx_request
            .build(&wallet)
            .await
            .map_err(|e| TxRelayError::Domain {
                reason: format!("unable to sign transaction: {e}"),
                detail: ErrorDetail::default().chain(self.chain),
            })?;
        let raw = alloy::eips::eip2718::Encodable2718::encoded_2718(&envelope);

        let tx_hash = dispatch
            .write_one_async(|provider| send_raw_sync(provider, &raw))
            .await
            .map_err(|e| match e {
                TxRelayError::Domain { reason, .. } => submission::classify_send_error(self.chain, &reason),
                other => other,
            })?;

        Ok(TransactionSubmissionResponse {
            transaction_id: format!("{tx_hash:#x}"),
            adaptable_fee_per_gas: adaptable_fee,
        })
    }

    async fn read_transaction_status(
        &self,
        transaction_id: &str,
        required_confirmations: u64,
    ) -> Result<TransactionStatus> {
        let receipt = self.read_receipt(transaction_id).await?;
        let Some(block_number) = receipt.block_number else {
            return Ok(TransactionStatus::Unincluded);
        };
        if !receipt.status_code {
            // Best-effort: a failed replay (e.g. no archive node) must not
            // block reporting the terminal Reverted status itself.
            match self.revert_reason(transaction_id).await {
                Ok(reason) => tracing::warn!(%transaction_id, reason, "transaction reverted"),
                Err(err) => tracing::warn!(%transaction_id, error = %err, "transaction reverted; revert reason unavailable"),
            }
            return Ok(TransactionStatus::Reverted);
        }
        let confirmations = receipt.current_block.saturating_sub(block_number) + 1;
        let needed = required_confirmations.max(self.required_confirmations);
        if confirmations >= needed {
            Ok(TransactionStatus::Confirmed)
        } else {
            Ok(TransactionStatus::Unconfirmed)
        }
    }

    async fn unhealthy_endpoints(
        &self,
        urls: &[NodeEndpoint],
        timeout: Option<Duration>,
    ) -> Vec<UnhealthyNode> {
        let mut unhealthy = Vec::new();
        for url in urls {
            if Self::build_single_connection(url, timeout).await.is_err() {
                unhealthy.push(UnhealthyNode {
                    node_domain: url.netloc(),
                    status: "unreachable".to_string(),
                });
            }
        }
        unhealthy
    }

    async fn health(&self) -> Result<NodesHealth> {
        let unhealthy_nodes = self.unhealthy_endpoints(&self.endpoints, None).await;
        Ok(NodesHealth {
            healthy_total: self.endpoints.len() - unhealthy_nodes.len(),
            unhealthy_total: unhealthy_nodes.len(),
            unhealthy_nodes,
        })
    }

    fn average_block_time(&self) -> Duration {
        self.avg_block_time
    }

    fn required_confirmations(&self) -> u64 {
        self.required_confirmations
    }

    /// Grounded in `EthereumUtilities.get_address`.
    fn address_of(&self, private_key: &str) -> Result<String> {
        let signer = signer::signer_from_private_key(private_key)?;
        Ok(signer.address().to_string())
    }

    /// Grounded in `EthereumUtilities.decrypt_private_key`.
    fn decrypt_key(&self, encrypted_key: &str, password: &str) -> Result<String> {
        signer::decrypt_private_key(encrypted_key, password)
    }

    /// Native balance when `token_contract` is `None`, else an ERC-20-style
    /// `balanceOf(address)` call — both reconciled across the whole pool.
    /// Grounded in `EthereumUtilities.get_balance`.
    async fn balance(&self, account: &str, token_contract: Option<&str>) -> Result<u128> {
        if !self.is_valid_address(account) {
            return Err(TxRelayError::Domain {
                reason: "invalid account address".to_string(),
                detail: ErrorDetail::default().chain(self.chain),
            });
        }
        let account = Self::parse_address(account)?;
        let dispatch = self.dispatch();
        let raw = match token_contract {
            None => {
                dispatch
                    .get_matching_async(|provider| native_balance(provider, account))
                    .await?
            }
            Some(token) => {
                if !self.is_valid_address(token) {
                    return Err(TxRelayError::Domain {
                        reason: "invalid token address".to_string(),
                        detail: ErrorDetail::default().chain(self.chain),
                    });
                }
                let token = Self::parse_address(token)?;
                let calldata =
                    encode_call(ERC20_BALANCE_OF_SELECTOR, vec![ContractFunctionArg::Address(account)]);
                dispatch
                    .get_matching_async(|provider| eth_call_u256(provider, token, calldata.clone()))
                    .await?
            }
        };
        Ok(raw.to::<u128>())
    }

    /// Grounded in the receipt lookup inlined in `EthereumUtilities
    /// .read_transaction_status`.
    async fn read_receipt(&self, transaction_id: &str) -> Result<TransactionReceiptInfo> {
        let hash = alloy::primitives::B256::from_str(transaction_id).map_err(|e| TxRelayError::Domain {
            reason: format!("invalid transaction id: {e}"),
            detail: ErrorDetail::default().chain(self.chain),
        })?;
        let dispatch = self.dispatch();
        let current_block: u64 = dispatch.get_minimum_async(|provider| block_number(provider)).await?;
        let provider = &self.pool.connections()[0].1;
        let receipt = provider
            .get_transaction_receipt(hash)
            .await
            .map_err(domain_error)?;
        Ok(match receipt {
            Some(receipt) => TransactionReceiptInfo {
                block_number: receipt.block_number,
                status_code: receipt.status(),
                hash: format!("{hash:#x}"),
                current_block,
            },
            None => TransactionReceiptInfo {
                block_number: None,
                status_code: false,
                hash: format!("{hash:#x}"),
                current_block,
            },
        })
    }

    /// Calls the contract's on-chain version getter and checks the result
    /// against [`crate::protocol::SUPPORTED_PROTOCOL_VERSIONS`]. Grounded in
    /// `BlockchainUtilities.is_protocol_version_supported_by_contract`; the
    /// packed-uint256 decoding is this crate's own resolution of that
    /// method's "implementation-defined" on-contract getter (see
    /// `DESIGN.md`).
    async fn is_protocol_version_supported_by_contract(
        &self,
        contract_address: &str,
        abi_ref: ContractAbiRef,
    ) -> Result<bool> {
        self.load_abi(abi_ref)?;
        let address = Self::parse_address(contract_address)?;
        let calldata = encode_call(PROTOCOL_VERSION_SELECTOR, vec![]);
        let dispatch = self.dispatch();
        let raw = dispatch
            .get_matching_async(|provider| eth_call_u256(provider, address, calldata.clone()))
            .await?;
        let version = decode_packed_version(raw);
        Ok(crate::protocol::is_supported_protocol_version(version))
    }
}

/// 4-byte selector for `balanceOf(address)`, the ERC-20 standard token
/// interface's balance getter (`keccak256("balanceOf(address)")[:4]`).
const ERC20_BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// 4-byte selector for this crate's chosen on-contract protocol version
/// getter, `getProtocolVersion()`. Which selector a deployed contract
/// actually exposes is implementation-defined per `spec.md` §4.3; this is
/// the reference adapter's own choice (see `DESIGN.md`).
const PROTOCOL_VERSION_SELECTOR: [u8; 4] = [0x2a, 0x7c, 0x3e, 0x0d];

/// Decodes a packed `major * 1_000_000 + minor * 1_000 + patch` uint256
/// into a [`ProtocolVersion`] — this crate's chosen on-contract encoding.
fn decode_packed_version(raw: U256) -> ProtocolVersion {
    let value = raw.to::<u128>();
    ProtocolVersion {
        major: ((value / 1_000_000) % 1_000) as u32,
        minor: ((value / 1_000) % 1_000) as u32,
        patch: (value % 1_000) as u32,
    }
}

async fn native_balance(provider: &RootProvider, account: Address) -> std::result::Result<U256, TxRelayError> {
    provider.get_balance(account).await.map_err(domain_error)
}

async fn eth_call_u256(
    provider: &RootProvider,
    to: Address,
    calldata: Vec<u8>,
) -> std::result::Result<U256, TxRelayError> {
    let request = TransactionRequest::default().to(to).input(Bytes::from(calldata).into());
    let result = provider.call(request).await.map_err(domain_error)?;
    Ok(U256::from_be_slice(&result))
}

async fn block_base_fee(provider: &RootProvider) -> std::result::Result<u128, TxRelayError> {
    let block = provider
        .get_block_by_number(BlockNumberOrTag::Latest)
        .await
        .map_err(domain_error)?
        .ok_or_else(|| TxRelayError::Domain {
            reason: "latest block unavailable".to_string(),
            detail: ErrorDetail::default(),
        })?;
    Ok(block.header.base_fee_per_gas.unwrap_or_default() as u128)
}

async fn gas_price(provider: &RootProvider) -> std::result::Result<u128, TxRelayError> {
    provider.get_gas_price().await.map_err(domain_error)
}

async fn block_number(provider: &RootProvider) -> std::result::Result<u64, TxRelayError> {
    provider.get_block_number().await.map_err(domain_error)
}

async fn send_raw_sync(provider: &RootProvider, raw: &[u8]) -> std::result::Result<alloy::primitives::B256, TxRelayError> {
    provider
        .send_raw_transaction(raw)
        .await
        .map(|pending| *pending.tx_hash())
        .map_err(domain_error)
}

fn domain_error<E: std::fmt::Display>(e: E) -> TxRelayError {
    TxRelayError::Domain {
        reason: e.to_string(),
        detail: ErrorDetail::default(),
    }
}

/// The fee fields chosen for a type-2 (EIP-1559) submission.
struct Eip1559Fees {
    max_fee_per_gas: u128,
    adaptable_fee: u128,
}

/// Pure EIP-1559 fee assembly: `max_fee = 2*base + tip`, clamped to
/// `ceiling` when set and lower, raising [`TxRelayError::MaxTotalFeePerGasExceeded`]
/// if the ceiling would drop `max_fee` to or below `tip`. Grounded in
/// `ethereum.py`'s `__create_transaction_parameters`; see `SPEC_FULL.md`
/// §8 scenario 3.
fn assemble_eip1559_fees(
    chain: ChainId,
    base_fee: u128,
    tip: u128,
    ceiling: u128,
) -> Result<Eip1559Fees> {
    let unclamped_max_fee = 2 * base_fee + tip;
    if ceiling == 0 || ceiling >= unclamped_max_fee {
        return Ok(Eip1559Fees {
            max_fee_per_gas: unclamped_max_fee,
            adaptable_fee: tip,
        });
    }
    if ceiling <= tip {
        return Err(TxRelayError::MaxTotalFeePerGasExceeded {
            detail: ErrorDetail::default().chain(chain),
        });
    }
    tracing::warn!(
        chain = ?chain,
        max_fee = unclamped_max_fee,
        ceiling,
        "clamping EIP-1559 max fee per gas to the configured ceiling"
    );
    Ok(Eip1559Fees {
        max_fee_per_gas: ceiling,
        adaptable_fee: tip,
    })
}

/// Pure legacy fee assembly: `gas_price = max(pool_gas_price, tip)`, clamped
/// to `ceiling` when set and lower. Grounded in `ethereum.py`'s legacy
/// branch of `__create_transaction_parameters`.
fn assemble_legacy_gas_price(pool_gas_price: u128, tip: u128, ceiling: u128) -> u128 {
    let gas_price = pool_gas_price.max(tip);
    if ceiling != 0 && gas_price > ceiling {
        ceiling
    } else {
        gas_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bnb_chain_uses_legacy_fees() {
        assert!(!supports_eip1559(ChainId::BnbChain));
        assert!(supports_eip1559(ChainId::Ethereum));
    }

    #[test]
    fn encode_call_prefixes_the_selector() {
        let data = encode_call([0xa9, 0x05, 0x9c, 0xbb], vec![ContractFunctionArg::Uint256(U256::from(42))]);
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 32);
    }

    // SPEC_FULL §8 scenario 3: base = 1e8, tip = 1e8.
    const BASE: u128 = 100_000_000;
    const TIP: u128 = 100_000_000;

    #[test]
    fn eip1559_fee_assembly_with_no_ceiling() {
        let fees = assemble_eip1559_fees(ChainId::Ethereum, BASE, TIP, 0).unwrap();
        assert_eq!(fees.max_fee_per_gas, 3 * BASE);
        assert_eq!(fees.adaptable_fee, TIP);
    }

    #[test]
    fn eip1559_fee_assembly_clamps_to_a_ceiling_above_tip() {
        let fees = assemble_eip1559_fees(ChainId::Ethereum, BASE, TIP, 200_000_000).unwrap();
        assert_eq!(fees.max_fee_per_gas, 200_000_000);
        assert_eq!(fees.adaptable_fee, TIP);
    }

    #[test]
    fn eip1559_fee_assembly_rejects_a_ceiling_at_or_below_tip() {
        let err = assemble_eip1559_fees(ChainId::Ethereum, BASE, TIP, 100_000_000).unwrap_err();
        assert!(matches!(err, TxRelayError::MaxTotalFeePerGasExceeded { .. }));
    }

    #[test]
    fn legacy_gas_price_takes_the_higher_of_pool_and_tip() {
        assert_eq!(assemble_legacy_gas_price(50, 80, 0), 80);
        assert_eq!(assemble_legacy_gas_price(90, 80, 0), 90);
    }

    #[test]
    fn legacy_gas_price_clamps_to_a_ceiling() {
        assert_eq!(assemble_legacy_gas_price(90, 80, 85), 85);
    }

    #[test]
    fn decodes_a_packed_version() {
        let version = decode_packed_version(U256::from(1_002_003u64));
        assert_eq!(version, ProtocolVersion { major: 1, minor: 2, patch: 3 });
    }

    #[test]
    fn format_revert_error_flags_a_missing_archive_node() {
        let formatted = format_revert_error("missing trie node abc123 (path )");
        assert_eq!(
            formatted,
            "missing trie node abc123 (path ) due to the absence of an archive node"
        );
    }

    #[test]
    fn format_revert_error_passes_through_other_messages() {
        assert_eq!(format_revert_error("execution reverted: INSUFFICIENT_BALANCE"), "execution reverted: INSUFFICIENT_BALANCE");
    }
}
