//! Error types for the faucet service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure categories for a drip request. Display gives the internal
/// (loggable) form; the caller-visible body comes from [`IntoResponse`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaucetError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing or unusable server-side setup. Carries the detail for the
    /// logs only; callers get a generic message.
    #[error("missing configuration: {0}")]
    ConfigurationError(String),

    #[error("cooldown active: {0}")]
    CooldownActive(String),

    #[error("contract reverted: {0}")]
    ContractRevert(String),

    #[error("faucet balance exhausted")]
    InsufficientFaucetBalance,

    #[error("nonce conflict with a pending faucet transaction")]
    TransientNonceConflict,

    #[error("{0}")]
    Unknown(String),
}

impl FaucetError {
    pub fn status(&self) -> StatusCode {
        match self {
            FaucetError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            FaucetError::CooldownActive(_) => StatusCode::TOO_MANY_REQUESTS,
            FaucetError::ConfigurationError(_)
            | FaucetError::ContractRevert(_)
            | FaucetError::InsufficientFaucetBalance
            | FaucetError::TransientNonceConflict
            | FaucetError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message serialized to the caller. Configuration detail never
    /// crosses this boundary.
    pub fn user_message(&self) -> String {
        match self {
            FaucetError::InvalidInput(msg) => msg.clone(),
            FaucetError::ConfigurationError(_) => {
                "Server configuration error. Please contact administrator.".to_string()
            }
            FaucetError::CooldownActive(msg) => msg.clone(),
            FaucetError::ContractRevert(reason) => reason.clone(),
            FaucetError::InsufficientFaucetBalance => {
                "Faucet has insufficient balance. Please contact administrator.".to_string()
            }
            FaucetError::TransientNonceConflict => {
                "Transaction pending. Please wait a moment and try again.".to_string()
            }
            FaucetError::Unknown(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for FaucetError {
    fn into_response(self) -> Response {
        if let FaucetError::ConfigurationError(detail) = &self {
            error!("configuration error: {}", detail);
        }

        let body = Json(json!({ "error": self.user_message() }));
        (self.status(), body).into_response()
    }
}

pub type FaucetResult<T> = Result<T, FaucetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            FaucetError::InvalidInput("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FaucetError::CooldownActive("wait".into()).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            FaucetError::ConfigurationError("signing key".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            FaucetError::ContractRevert("Drip unavailable".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            FaucetError::InsufficientFaucetBalance.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            FaucetError::TransientNonceConflict.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            FaucetError::Unknown("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_configuration_detail_is_not_leaked() {
        let err = FaucetError::ConfigurationError("FAUCET_PRIVATE_KEY unset".into());
        let msg = err.user_message();
        assert!(!msg.contains("FAUCET_PRIVATE_KEY"));
        assert_eq!(msg, "Server configuration error. Please contact administrator.");
    }

    #[test]
    fn test_fixed_messages() {
        assert_eq!(
            FaucetError::InsufficientFaucetBalance.user_message(),
            "Faucet has insufficient balance. Please contact administrator."
        );
        assert_eq!(
            FaucetError::TransientNonceConflict.user_message(),
            "Transaction pending. Please wait a moment and try again."
        );
    }

    #[test]
    fn test_revert_reason_passes_through_verbatim() {
        let err = FaucetError::ContractRevert("Faucet: cooldown not expired".into());
        assert_eq!(err.user_message(), "Faucet: cooldown not expired");
    }

    #[test]
    fn test_response_status_matches() {
        let response = FaucetError::CooldownActive("wait".into()).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
