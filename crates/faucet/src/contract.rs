//! Faucet contract binding
//!
//! The coordinator only sees the [`FaucetContract`] trait; any double
//! implementing these five operations is substitutable. The production
//! implementation speaks JSON-RPC to an EVM node, encodes call data with
//! ethabi, and signs legacy EIP-155 drip transactions locally.

use async_trait::async_trait;
use ethabi::{ParamType, Token};
use k256::ecdsa::SigningKey;
use rlp::RlpStream;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use spout_common::types::{Address, Hash};

use crate::config::FaucetConfig;
use crate::error::{FaucetError, FaucetResult};

/// Selector of `Error(string)`, the revert payload produced by `require`.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Client-level failures. `Revert` means the node surfaced a structured
/// revert reason; the other variants carry free text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Revert(String),

    #[error("{0}")]
    Rpc(String),

    #[error("{0}")]
    Transport(String),
}

/// A drip transaction confirmed on-chain.
#[derive(Debug, Clone, PartialEq)]
pub struct DripReceipt {
    pub tx_hash: Hash,
    pub block_number: u64,
}

/// Capability surface of the deployed faucet contract.
#[async_trait]
pub trait FaucetContract: Send + Sync {
    /// Whether `recipient` is currently eligible for a drip.
    async fn can_drip(&self, recipient: &Address) -> Result<bool, ContractError>;

    /// Seconds until `recipient` becomes eligible again.
    async fn remaining_cooldown(&self, recipient: &Address) -> Result<u64, ContractError>;

    /// Submit the drip transaction and wait until it is mined.
    async fn drip(&self, recipient: &Address) -> Result<DripReceipt, ContractError>;

    /// Fixed amount dispensed per drip, in wei.
    async fn drip_amount(&self) -> Result<String, ContractError>;

    /// Current faucet balance, in wei.
    async fn faucet_balance(&self) -> Result<String, ContractError>;
}

/// JSON-RPC implementation of [`FaucetContract`].
#[derive(Debug)]
pub struct EthFaucetClient {
    rpc_url: String,
    client: reqwest::Client,
    contract: Address,
    signing_key: SigningKey,
    sender: Address,
    gas_price: u64,
    gas_limit: u64,
    poll_interval: Duration,
}

impl EthFaucetClient {
    /// Build a client from validated configuration. Fails closed before
    /// anything network-facing is constructed.
    pub fn from_config(config: &FaucetConfig) -> FaucetResult<Self> {
        config.validate()?;

        let key_hex = config.private_key.strip_prefix("0x").unwrap_or(&config.private_key);
        let key_bytes = hex::decode(key_hex)
            .map_err(|e| FaucetError::ConfigurationError(format!("signing key is not hex: {}", e)))?;
        let key_array: [u8; 32] = key_bytes
            .try_into()
            .map_err(|_| FaucetError::ConfigurationError("signing key must be 32 bytes".to_string()))?;
        let signing_key = SigningKey::from_bytes(&key_array.into())
            .map_err(|e| FaucetError::ConfigurationError(format!("unusable signing key: {}", e)))?;

        // Derive the sender address from the verifying key.
        let public_key = signing_key.verifying_key().to_encoded_point(false);
        let digest = keccak_hash::keccak(&public_key.as_bytes()[1..]);
        let sender = Address::from_slice(&digest.0[12..]);

        let contract: Address = config
            .contract_address
            .parse()
            .map_err(|e| FaucetError::ConfigurationError(format!("contract address: {}", e)))?;

        let gas_price = config
            .gas_price
            .parse::<u64>()
            .map_err(|_| FaucetError::ConfigurationError("gas price must be an integer".to_string()))?;

        info!("faucet sender address: {}", sender.to_checksum());

        Ok(Self {
            rpc_url: config.rpc_url.clone(),
            client: reqwest::Client::new(),
            contract,
            signing_key,
            sender,
            gas_price,
            gas_limit: config.gas_limit,
            poll_interval: config.confirm_poll_interval(),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ContractError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ContractError::Transport(format!("request failed: {}", e)))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ContractError::Transport(format!("invalid response: {}", e)))?;

        if let Some(error) = body.get("error") {
            return Err(rpc_error(error));
        }

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Read-only contract call at the latest block.
    async fn eth_call(&self, data: Vec<u8>) -> Result<Vec<u8>, ContractError> {
        let result = self
            .call(
                "eth_call",
                json!([{
                    "to": self.contract.to_string(),
                    "data": format!("0x{}", hex::encode(&data)),
                }, "latest"]),
            )
            .await?;

        let hex_ret = result
            .as_str()
            .ok_or_else(|| ContractError::Transport("eth_call returned a non-string result".to_string()))?;
        hex::decode(hex_ret.trim_start_matches("0x"))
            .map_err(|e| ContractError::Transport(format!("eth_call returned invalid hex: {}", e)))
    }

    async fn transaction_count(&self) -> Result<u64, ContractError> {
        let result = self
            .call("eth_getTransactionCount", json!([self.sender.to_string(), "latest"]))
            .await?;
        parse_quantity(&result, "eth_getTransactionCount")
    }

    async fn chain_id(&self) -> Result<u64, ContractError> {
        let result = self.call("eth_chainId", json!([])).await?;
        parse_quantity(&result, "eth_chainId")
    }

    /// RLP-encode and sign a legacy EIP-155 transaction to the contract.
    fn sign_transaction(&self, nonce: u64, chain_id: u64, data: &[u8]) -> Result<Vec<u8>, ContractError> {
        let mut stream = RlpStream::new_list(9);
        stream.append(&nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        stream.append(&self.contract.0.to_vec());
        stream.append(&0u8); // value: the contract pays out, not this tx
        stream.append(&data.to_vec());
        stream.append(&chain_id);
        stream.append(&0u8);
        stream.append(&0u8);

        let signing_hash = keccak_hash::keccak(stream.out());

        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&signing_hash.0)
            .map_err(|e| ContractError::Transport(format!("signing failed: {}", e)))?;

        let v = chain_id * 2 + 35 + recovery_id.to_byte() as u64;
        let r = trim_leading_zeros(&signature.r().to_bytes());
        let s = trim_leading_zeros(&signature.s().to_bytes());

        let mut signed = RlpStream::new_list(9);
        signed.append(&nonce);
        signed.append(&self.gas_price);
        signed.append(&self.gas_limit);
        signed.append(&self.contract.0.to_vec());
        signed.append(&0u8);
        signed.append(&data.to_vec());
        signed.append(&v);
        signed.append(&r);
        signed.append(&s);

        Ok(signed.out().to_vec())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<Hash, ContractError> {
        let result = self
            .call("eth_sendRawTransaction", json!([format!("0x{}", hex::encode(raw))]))
            .await?;
        let hash_str = result
            .as_str()
            .ok_or_else(|| ContractError::Transport("node returned a non-string transaction hash".to_string()))?;
        hash_str
            .parse::<Hash>()
            .map_err(|e| ContractError::Transport(format!("node returned an invalid transaction hash: {}", e)))
    }

    /// Poll until the transaction is mined. No overall deadline:
    /// confirmation takes as long as the chain takes, and each individual
    /// poll is bounded by the transport's defaults.
    async fn wait_for_receipt(&self, tx_hash: &Hash) -> Result<u64, ContractError> {
        loop {
            let receipt = self
                .call("eth_getTransactionReceipt", json!([tx_hash.to_string()]))
                .await?;

            if !receipt.is_null() {
                let status = receipt.get("status").and_then(Value::as_str).unwrap_or("0x1");
                if u64::from_str_radix(status.trim_start_matches("0x"), 16).unwrap_or(1) == 0 {
                    return Err(ContractError::Revert("transaction reverted".to_string()));
                }
                let block = receipt.get("blockNumber").cloned().unwrap_or(Value::Null);
                return parse_quantity(&block, "eth_getTransactionReceipt");
            }

            debug!("transaction {} not yet mined", tx_hash);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl FaucetContract for EthFaucetClient {
    async fn can_drip(&self, recipient: &Address) -> Result<bool, ContractError> {
        let data = encode_call("canDrip", &[ParamType::Address], &[address_token(recipient)]);
        let ret = self.eth_call(data).await?;
        decode_bool(&ret)
    }

    async fn remaining_cooldown(&self, recipient: &Address) -> Result<u64, ContractError> {
        let data = encode_call(
            "getRemainingCooldown",
            &[ParamType::Address],
            &[address_token(recipient)],
        );
        let ret = self.eth_call(data).await?;
        let value = decode_uint(&ret)?;
        if value > ethabi::Uint::from(u64::MAX) {
            return Ok(u64::MAX);
        }
        Ok(value.as_u64())
    }

    async fn drip(&self, recipient: &Address) -> Result<DripReceipt, ContractError> {
        let nonce = self.transaction_count().await?;
        let chain_id = self.chain_id().await?;
        let data = encode_call("drip", &[ParamType::Address], &[address_token(recipient)]);

        let raw = self.sign_transaction(nonce, chain_id, &data)?;
        let tx_hash = self.send_raw_transaction(&raw).await?;
        info!("drip transaction submitted: {}", tx_hash);

        let block_number = self.wait_for_receipt(&tx_hash).await?;
        Ok(DripReceipt { tx_hash, block_number })
    }

    async fn drip_amount(&self) -> Result<String, ContractError> {
        let ret = self.eth_call(encode_call("dripAmount", &[], &[])).await?;
        decode_uint(&ret).map(|v| v.to_string())
    }

    async fn faucet_balance(&self) -> Result<String, ContractError> {
        let ret = self.eth_call(encode_call("getFaucetBalance", &[], &[])).await?;
        decode_uint(&ret).map(|v| v.to_string())
    }
}

fn encode_call(name: &str, params: &[ParamType], args: &[Token]) -> Vec<u8> {
    let mut data = ethabi::short_signature(name, params).to_vec();
    data.extend(ethabi::encode(args));
    data
}

fn address_token(address: &Address) -> Token {
    Token::Address(ethabi::Address::from(address.0))
}

fn decode_bool(ret: &[u8]) -> Result<bool, ContractError> {
    match ethabi::decode(&[ParamType::Bool], ret) {
        Ok(tokens) => match tokens.into_iter().next() {
            Some(Token::Bool(b)) => Ok(b),
            _ => Err(ContractError::Transport("contract returned a non-boolean value".to_string())),
        },
        Err(e) => Err(ContractError::Transport(format!("undecodable contract return: {}", e))),
    }
}

fn decode_uint(ret: &[u8]) -> Result<ethabi::Uint, ContractError> {
    match ethabi::decode(&[ParamType::Uint(256)], ret) {
        Ok(tokens) => match tokens.into_iter().next() {
            Some(Token::Uint(value)) => Ok(value),
            _ => Err(ContractError::Transport("contract returned a non-integer value".to_string())),
        },
        Err(e) => Err(ContractError::Transport(format!("undecodable contract return: {}", e))),
    }
}

/// Map a JSON-RPC error object, pulling out the revert reason when the
/// node attached `Error(string)` return data or an execution-revert
/// message with a reason.
fn rpc_error(error: &Value) -> ContractError {
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("RPC error")
        .to_string();

    if let Some(reason) = error.get("data").and_then(Value::as_str).and_then(decode_revert_data) {
        return ContractError::Revert(reason);
    }
    if let Some(reason) = message.strip_prefix("execution reverted: ") {
        return ContractError::Revert(reason.to_string());
    }

    ContractError::Rpc(message)
}

/// Decode the ABI `Error(string)` payload nodes return for reverts.
fn decode_revert_data(data: &str) -> Option<String> {
    let bytes = hex::decode(data.strip_prefix("0x")?).ok()?;
    if bytes.len() < 4 || bytes[..4] != ERROR_STRING_SELECTOR {
        return None;
    }
    let tokens = ethabi::decode(&[ParamType::String], &bytes[4..]).ok()?;
    match tokens.into_iter().next() {
        Some(Token::String(reason)) => Some(reason),
        _ => None,
    }
}

fn parse_quantity(value: &Value, method: &str) -> Result<u64, ContractError> {
    let quantity = value
        .as_str()
        .ok_or_else(|| ContractError::Transport(format!("{} returned a non-string result", method)))?;
    u64::from_str_radix(quantity.trim_start_matches("0x"), 16)
        .map_err(|e| ContractError::Transport(format!("{} returned an invalid quantity: {}", method, e)))
}

fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> EthFaucetClient {
        let config = FaucetConfig {
            rpc_url: "http://localhost:8545".to_string(),
            // Well-known hardhat test key.
            private_key: "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
                .to_string(),
            contract_address: "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".to_string(),
            ..FaucetConfig::default()
        };
        EthFaucetClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_from_config_fails_closed_on_missing_setup() {
        let err = EthFaucetClient::from_config(&FaucetConfig::default()).unwrap_err();
        assert!(matches!(err, FaucetError::ConfigurationError(_)));
    }

    #[test]
    fn test_from_config_rejects_short_key() {
        let config = FaucetConfig {
            rpc_url: "http://localhost:8545".to_string(),
            private_key: "0xabcd".to_string(),
            contract_address: "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".to_string(),
            ..FaucetConfig::default()
        };
        let err = EthFaucetClient::from_config(&config).unwrap_err();
        assert!(matches!(err, FaucetError::ConfigurationError(_)));
    }

    #[test]
    fn test_encode_call_layout() {
        let recipient: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        let data = encode_call("drip", &[ParamType::Address], &[address_token(&recipient)]);

        // 4-byte selector plus one 32-byte word with the address
        // right-aligned in it.
        assert_eq!(data.len(), 36);
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..36], &recipient.0);
    }

    #[test]
    fn test_signed_transaction_shape() {
        let client = test_client();
        let call_data = encode_call(
            "drip",
            &[ParamType::Address],
            &[address_token(&"0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap())],
        );

        let raw = client.sign_transaction(7, 31337, &call_data).unwrap();
        let rlp = rlp::Rlp::new(&raw);

        assert!(rlp.is_list());
        assert_eq!(rlp.item_count().unwrap(), 9);
        assert_eq!(rlp.val_at::<u64>(0).unwrap(), 7);
        assert_eq!(rlp.val_at::<u64>(2).unwrap(), client.gas_limit);
        assert_eq!(rlp.val_at::<Vec<u8>>(3).unwrap(), client.contract.0.to_vec());
        assert_eq!(rlp.val_at::<Vec<u8>>(5).unwrap(), call_data);

        // EIP-155 recovery value for chain 31337.
        let v = rlp.val_at::<u64>(6).unwrap();
        assert!(v == 31337 * 2 + 35 || v == 31337 * 2 + 36);
    }

    #[test]
    fn test_signing_is_deterministic() {
        let client = test_client();
        let a = client.sign_transaction(0, 1, &[0x01]).unwrap();
        let b = client.sign_transaction(0, 1, &[0x01]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_revert_data_decoding() {
        let mut payload = ERROR_STRING_SELECTOR.to_vec();
        payload.extend(ethabi::encode(&[Token::String("Faucet: cooldown not expired".to_string())]));
        let data = format!("0x{}", hex::encode(payload));

        assert_eq!(
            decode_revert_data(&data),
            Some("Faucet: cooldown not expired".to_string())
        );
    }

    #[test]
    fn test_revert_data_requires_error_selector() {
        assert_eq!(decode_revert_data("0xdeadbeef"), None);
        assert_eq!(decode_revert_data("0x08"), None);
        assert_eq!(decode_revert_data("not hex"), None);
    }

    #[test]
    fn test_rpc_error_extracts_reason_from_data() {
        let mut payload = ERROR_STRING_SELECTOR.to_vec();
        payload.extend(ethabi::encode(&[Token::String("Faucet: empty".to_string())]));
        let error = json!({
            "code": 3,
            "message": "execution reverted",
            "data": format!("0x{}", hex::encode(payload)),
        });

        assert_eq!(rpc_error(&error), ContractError::Revert("Faucet: empty".to_string()));
    }

    #[test]
    fn test_rpc_error_extracts_reason_from_message() {
        let error = json!({ "code": 3, "message": "execution reverted: Faucet: cooldown not expired" });
        assert_eq!(
            rpc_error(&error),
            ContractError::Revert("Faucet: cooldown not expired".to_string())
        );
    }

    #[test]
    fn test_rpc_error_passes_plain_messages_through() {
        let error = json!({ "code": -32000, "message": "nonce too low" });
        assert_eq!(rpc_error(&error), ContractError::Rpc("nonce too low".to_string()));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&json!("0x10"), "eth_chainId").unwrap(), 16);
        assert_eq!(parse_quantity(&json!("0x0"), "eth_chainId").unwrap(), 0);
        assert!(parse_quantity(&Value::Null, "eth_chainId").is_err());
        assert!(parse_quantity(&json!("0xzz"), "eth_chainId").is_err());
    }

    #[test]
    fn test_trim_leading_zeros() {
        assert_eq!(trim_leading_zeros(&[0, 0, 1, 2]), vec![1, 2]);
        assert_eq!(trim_leading_zeros(&[5]), vec![5]);
        assert_eq!(trim_leading_zeros(&[0, 0]), Vec::<u8>::new());
    }
}
