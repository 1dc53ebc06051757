use crate::{ApiError, AppState, SIGNATURE_HEADER, signature};

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use log::info;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
}

/// POST /webhook
///
/// When a secret is configured and the request carries a signature header,
/// the HMAC of the raw body must match it. Unsigned requests are accepted.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let signature_header = headers.get(SIGNATURE_HEADER);
    if let (Some(secret), Some(header)) = (state.webhook_secret.as_deref(), signature_header) {
        let provided = header.to_str().map_err(|_| ApiError::invalid_signature())?;
        let valid = signature::verify(secret, &body, provided)
            .map_err(|e| ApiError::internal(format!("HMAC setup failed: {e}")))?;
        if !valid {
            return Err(ApiError::invalid_signature());
        }
    }

    let payload: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::invalid_payload(e.to_string()))?;

    info!("Received webhook payload: {payload}");
    Ok(Json(WebhookResponse { received: true }))
}
