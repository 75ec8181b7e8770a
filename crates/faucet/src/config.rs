//! Faucet configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{FaucetError, FaucetResult};

/// Faucet service configuration.
///
/// The signing key, RPC endpoint and contract address have no usable
/// defaults: [`FaucetConfig::validate`] fails closed when any of them is
/// missing, and nothing may touch the network before that check passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaucetConfig {
    /// Server listen address
    pub server_addr: String,

    /// RPC endpoint of the chain hosting the faucet contract
    pub rpc_url: String,

    /// Faucet owner private key (hex), signs drip transactions
    pub private_key: String,

    /// Deployed faucet contract address
    pub contract_address: String,

    /// Gas price for drip transactions (in wei)
    pub gas_price: String,

    /// Gas limit for drip transactions
    pub gas_limit: u64,

    /// Receipt poll interval while waiting for confirmation (milliseconds)
    pub confirm_poll_interval_ms: u64,

    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:3000".to_string(),
            rpc_url: String::new(),
            private_key: String::new(),
            contract_address: String::new(),
            gas_price: "1000000000".to_string(), // 1 Gwei
            gas_limit: 100_000,
            confirm_poll_interval_ms: 2000,
            cors_enabled: true,
        }
    }
}

impl FaucetConfig {
    /// Load from environment variables with defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("FAUCET_SERVER_ADDR") {
            config.server_addr = addr;
        }

        if let Ok(rpc_url) = std::env::var("FAUCET_RPC_URL") {
            config.rpc_url = rpc_url;
        }

        if let Ok(key) = std::env::var("FAUCET_PRIVATE_KEY") {
            config.private_key = key;
        }

        if let Ok(contract) = std::env::var("FAUCET_CONTRACT_ADDRESS") {
            config.contract_address = contract;
        }

        if let Ok(gas_price) = std::env::var("FAUCET_GAS_PRICE") {
            config.gas_price = gas_price;
        }

        if let Ok(gas_limit) = std::env::var("FAUCET_GAS_LIMIT") {
            config.gas_limit = gas_limit.parse().unwrap_or(config.gas_limit);
        }

        if let Ok(interval) = std::env::var("FAUCET_CONFIRM_POLL_INTERVAL_MS") {
            config.confirm_poll_interval_ms = interval.parse().unwrap_or(config.confirm_poll_interval_ms);
        }

        if let Ok(enabled) = std::env::var("FAUCET_CORS_ENABLED") {
            config.cors_enabled = enabled.to_lowercase() == "true";
        }

        config
    }

    /// Presence check for the three required pieces of external setup.
    pub fn validate(&self) -> FaucetResult<()> {
        if self.private_key.trim().is_empty() {
            return Err(FaucetError::ConfigurationError("signing key".to_string()));
        }
        if self.rpc_url.trim().is_empty() {
            return Err(FaucetError::ConfigurationError("RPC endpoint".to_string()));
        }
        if self.contract_address.trim().is_empty() {
            return Err(FaucetError::ConfigurationError("contract address".to_string()));
        }
        Ok(())
    }

    /// Get receipt poll interval
    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }
}
