//! Drip coordination: validation, eligibility, dispatch, classification.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use spout_common::types::Address;

use crate::config::FaucetConfig;
use crate::contract::{ContractError, DripReceipt, FaucetContract};
use crate::error::{FaucetError, FaucetResult};

/// Ordered substring rules for free-text dispatch failures. First match
/// wins, so a message naming both funds and nonces reads as a balance
/// problem, matching the upstream node wording.
const MESSAGE_RULES: [(&str, FaucetError); 2] = [
    ("insufficient funds", FaucetError::InsufficientFaucetBalance),
    ("nonce", FaucetError::TransientNonceConflict),
];

/// The drip coordinator. Holds no per-request state: every request runs
/// the same validate / check / dispatch sequence against fresh contract
/// reads, and concurrency control is left to transaction ordering on-chain.
pub struct FaucetService {
    contract_address: Address,
    contract: Arc<dyn FaucetContract>,
}

impl std::fmt::Debug for FaucetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaucetService")
            .field("contract_address", &self.contract_address)
            .finish_non_exhaustive()
    }
}

/// Live faucet figures for the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetStatus {
    pub contract_address: Address,
    pub balance: String,
    pub drip_amount: String,
}

impl FaucetService {
    /// Build the coordinator over an already-constructed contract client.
    /// Fails closed when required configuration is missing, before the
    /// client is ever used.
    pub fn new(config: &FaucetConfig, contract: Arc<dyn FaucetContract>) -> FaucetResult<Self> {
        config.validate()?;

        let contract_address = config
            .contract_address
            .parse()
            .map_err(|e| FaucetError::ConfigurationError(format!("contract address: {}", e)))?;

        Ok(Self { contract_address, contract })
    }

    /// Handle one drip request end to end.
    pub async fn handle_drip(&self, recipient: &str) -> FaucetResult<DripReceipt> {
        // Purely syntactic check; nothing touches the network before it.
        let recipient: Address = recipient
            .parse()
            .map_err(|_| FaucetError::InvalidInput("Invalid Ethereum address format".to_string()))?;

        // Eligibility is read fresh from the contract on every request.
        let eligible = self.contract.can_drip(&recipient).await.map_err(classify)?;
        if !eligible {
            let remaining = self.contract.remaining_cooldown(&recipient).await.map_err(classify)?;
            warn!("cooldown active for {}: {}s remaining", recipient, remaining);
            return Err(FaucetError::CooldownActive(format!(
                "Please wait {} before requesting again",
                format_wait(remaining)
            )));
        }

        let receipt = self.contract.drip(&recipient).await.map_err(classify)?;
        info!(
            "dispensed to {}: tx {} in block {}",
            recipient, receipt.tx_hash, receipt.block_number
        );
        Ok(receipt)
    }

    pub async fn status(&self) -> FaucetResult<FaucetStatus> {
        let balance = self.contract.faucet_balance().await.map_err(classify)?;
        let drip_amount = self.contract.drip_amount().await.map_err(classify)?;
        Ok(FaucetStatus {
            contract_address: self.contract_address,
            balance,
            drip_amount,
        })
    }
}

/// Map a client failure into the user-facing taxonomy.
fn classify(err: ContractError) -> FaucetError {
    match err {
        ContractError::Revert(reason) => FaucetError::ContractRevert(reason),
        ContractError::Rpc(message) | ContractError::Transport(message) => {
            for (needle, category) in &MESSAGE_RULES {
                if message.contains(needle) {
                    return category.clone();
                }
            }
            FaucetError::Unknown(message)
        }
    }
}

/// Human wait message: whole hours once a full hour remains, whole
/// minutes otherwise. Both branches round up and are never combined.
fn format_wait(remaining_secs: u64) -> String {
    if remaining_secs >= 3600 {
        let hours = remaining_secs.div_ceil(3600);
        format!("{} hour{}", hours, if hours > 1 { "s" } else { "" })
    } else {
        let minutes = remaining_secs.div_ceil(60);
        format!("{} minute{}", minutes, if minutes > 1 { "s" } else { "" })
    }
}
