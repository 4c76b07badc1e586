//! Connect event parsing and classification
//!
//! Connect payloads are not uniform: newer configurations nest the envelope
//! fields under `data.envelopeSummary`, older ones put them at the top
//! level, and individual fields go missing either way. Parsing is therefore
//! field-by-field tolerant; a notification with holes in it must still be
//! acknowledged, or DocuSign will retry it forever.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocusignError;
use crate::types::parse_rfc3339;

/// Payloads are JSON unless Connect was left in its default XML mode; a
/// leading marker is enough to tell them apart without attempting a parse.
pub fn is_xml_payload(body: &[u8]) -> bool {
    body.starts_with(b"<?xml")
}

/// Per-recipient status carried in a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientStatus {
    pub recipient_id: String,
    pub name: String,
    pub email: String,
    pub status: String,
    pub signed_at: Option<DateTime<Utc>>,
}

/// One envelope status-change notification, normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `envelope-completed`; derived from the status when
    /// the payload does not carry one
    pub event: String,
    pub envelope_id: String,
    pub status: String,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub recipients: Vec<RecipientStatus>,
    /// Original payload, retained for audit and replay
    pub raw: Value,
}

impl WebhookEvent {
    /// Parse a raw delivery body.
    ///
    /// Only JSON syntax errors fail; missing fields never do.
    pub fn from_slice(body: &[u8]) -> Result<Self, DocusignError> {
        let payload: Value =
            serde_json::from_slice(body).map_err(|e| DocusignError::Parse(e.to_string()))?;
        Ok(Self::from_json(payload))
    }

    /// Normalize a payload, probing the nested shape first and falling back
    /// to the flat one per field.
    pub fn from_json(payload: Value) -> Self {
        let envelope_data = payload.get("data").unwrap_or(&payload);
        let summary = envelope_data.get("envelopeSummary").unwrap_or(envelope_data);

        let envelope_id = str_field(summary, "envelopeId")
            .or_else(|| str_field(&payload, "envelopeId"))
            .unwrap_or_default()
            .to_string();
        let status = str_field(summary, "status")
            .or_else(|| str_field(&payload, "status"))
            .unwrap_or_default()
            .to_string();
        let event = str_field(&payload, "event")
            .map(str::to_string)
            .unwrap_or_else(|| format!("envelope-{}", status.to_lowercase()));
        let status_changed_at = str_field(summary, "statusChangedDateTime")
            .or_else(|| str_field(&payload, "statusChangedDateTime"))
            .and_then(parse_rfc3339);

        let sender = summary.get("sender");
        let sender_name = sender
            .and_then(|s| str_field(s, "userName").or_else(|| str_field(s, "name")))
            .map(str::to_string);
        let sender_email = sender
            .and_then(|s| str_field(s, "email"))
            .map(str::to_string);

        let recipients = summary
            .get("recipients")
            .and_then(|r| r.get("signers"))
            .and_then(Value::as_array)
            .map(|signers| signers.iter().map(parse_recipient).collect())
            .unwrap_or_default();

        Self {
            event,
            envelope_id,
            status,
            status_changed_at,
            sender_name,
            sender_email,
            recipients,
            raw: payload,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }

    pub fn is_declined(&self) -> bool {
        self.status.eq_ignore_ascii_case("declined")
    }

    pub fn is_voided(&self) -> bool {
        self.status.eq_ignore_ascii_case("voided")
    }

    /// The recipient whose signature completed the envelope: first one
    /// reported completed with a signing timestamp. With several completed
    /// recipients in one notification the pick follows payload order, which
    /// Connect leaves unspecified.
    pub fn completing_signer(&self) -> Option<&RecipientStatus> {
        self.recipients
            .iter()
            .find(|r| r.status.eq_ignore_ascii_case("completed") && r.signed_at.is_some())
    }

    /// First recipient who declined.
    pub fn declining_signer(&self) -> Option<&RecipientStatus> {
        self.recipients
            .iter()
            .find(|r| r.status.eq_ignore_ascii_case("declined"))
    }
}

fn parse_recipient(signer: &Value) -> RecipientStatus {
    RecipientStatus {
        recipient_id: str_field(signer, "recipientId").unwrap_or_default().to_string(),
        name: str_field(signer, "name").unwrap_or_default().to_string(),
        email: str_field(signer, "email").unwrap_or_default().to_string(),
        status: str_field(signer, "status").unwrap_or_default().to_string(),
        signed_at: str_field(signer, "signedDateTime").and_then(parse_rfc3339),
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
