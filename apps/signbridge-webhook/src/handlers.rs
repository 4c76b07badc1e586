//! HTTP handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use signbridge_core::{is_xml_payload, WebhookEvent};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::{AppState, DeliveryKind, DeliveryRecord};

const SIGNATURE_HEADER: &str = "x-docusign-signature-1";

/// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "DocuSign webhook receiver is running",
        "webhookEndpoint": "/webhook/docusign",
    }))
}

/// Receive one Connect notification.
///
/// The signature is checked over the raw bytes before anything is parsed.
/// XML payloads are quarantined with a 200 so DocuSign does not redeliver
/// them; the fix for those is Connect configuration, not a retry.
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    info!(bytes = body.len(), "Received webhook delivery");

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if !state.webhooks.verify_signature(&body, signature) {
        warn!("Rejected delivery with invalid signature");
        return Err(ApiError::InvalidSignature);
    }

    if is_xml_payload(&body) {
        warn!("Received XML payload; configure Connect to deliver JSON");
        let message = "XML received but JSON preferred".to_string();
        state
            .log
            .record(
                DeliveryKind::Xml,
                None,
                None,
                message.clone(),
                json!({"rawXml": String::from_utf8_lossy(&body)}),
            )
            .await;
        return Ok(Json(json!({"message": message})));
    }

    let event =
        WebhookEvent::from_slice(&body).map_err(|e| ApiError::BadPayload(e.to_string()))?;
    info!(
        event = %event.event,
        envelope_id = %event.envelope_id,
        status = %event.status,
        "Parsed webhook event"
    );

    let result = state.webhooks.handle(&event).await;
    info!(message = %result.message, "Webhook processed");

    state
        .log
        .record(
            DeliveryKind::Event,
            Some(result.envelope_id.clone()),
            Some(result.event_type.clone()),
            result.message.clone(),
            event.raw.clone(),
        )
        .await;

    Ok(Json(json!({
        "success": result.success,
        "envelopeId": result.envelope_id,
        "event": result.event_type,
        "message": result.message,
    })))
}

/// List recent deliveries, newest first
pub async fn list_webhooks(State(state): State<Arc<AppState>>) -> Json<Value> {
    let webhooks = state.log.recent(20).await;
    Json(json!({
        "count": webhooks.len(),
        "webhooks": webhooks,
    }))
}

/// Fetch one delivery by sequence number
pub async fn get_webhook(
    State(state): State<Arc<AppState>>,
    Path(seq): Path<u64>,
) -> Result<Json<DeliveryRecord>, ApiError> {
    state
        .log
        .get(seq)
        .await
        .map(Json)
        .ok_or(ApiError::DeliveryNotFound(seq))
}
