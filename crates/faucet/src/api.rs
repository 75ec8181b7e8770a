//! HTTP API for the faucet service

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{FaucetError, FaucetResult};
use crate::service::{FaucetService, FaucetStatus};

/// Drip request body. Exactly one field is accepted.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DripRequest {
    pub recipient: String,
}

/// Successful drip response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DripResponse {
    pub success: bool,
    pub tx_hash: String,
    pub block_number: u64,
    pub message: String,
}

/// Drip handler
pub async fn drip_handler(
    State(service): State<Arc<FaucetService>>,
    body: Result<Json<DripRequest>, JsonRejection>,
) -> impl IntoResponse {
    // A body without a usable `recipient` string is a client error, not a
    // framework-shaped rejection.
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            info!("rejected drip body: {}", rejection);
            return FaucetError::InvalidInput("Recipient address is required".to_string())
                .into_response();
        }
    };

    info!("drip request for {}", request.recipient);

    match service.handle_drip(&request.recipient).await {
        Ok(receipt) => Json(DripResponse {
            success: true,
            tx_hash: receipt.tx_hash.to_string(),
            block_number: receipt.block_number,
            message: "Tokens sent successfully!".to_string(),
        })
        .into_response(),
        Err(e) => {
            error!("drip failed: {}", e);
            e.into_response()
        }
    }
}

/// Status handler
pub async fn status_handler(
    State(service): State<Arc<FaucetService>>,
) -> FaucetResult<Json<FaucetStatus>> {
    Ok(Json(service.status().await?))
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Root handler with info
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Spout Faucet",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/drip": "Request tokens",
            "GET /api/status": "Faucet status",
            "GET /health": "Health check"
        }
    }))
}
