//! Shared chain primitives for the Spout faucet.

pub mod types;

pub use types::{Address, AddressParseError, Hash, HashParseError, ADDRESS_LENGTH, HASH_LENGTH};
