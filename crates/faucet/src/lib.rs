//! Spout: a token faucet service for EVM test networks.
//!
//! One endpoint does the work: a drip request is validated, the deployed
//! faucet contract is asked whether the recipient is eligible, and if so a
//! signed drip transaction is submitted and confirmed. Cooldown timers and
//! the dispensed balance live in the contract, not in this process.

pub mod api;
pub mod config;
pub mod contract;
pub mod error;
pub mod service;

pub use config::FaucetConfig;
pub use contract::{ContractError, DripReceipt, EthFaucetClient, FaucetContract};
pub use error::{FaucetError, FaucetResult};
pub use service::{FaucetService, FaucetStatus};
