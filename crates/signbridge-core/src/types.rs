//! Envelope domain types
//!
//! Request and response types shared by the envelope, template, and webhook
//! services. Wire-format DTOs live in [`crate::client`]; the types here are
//! what callers construct and consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Envelope lifecycle status as DocuSign reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Created,
    Sent,
    Delivered,
    Completed,
    Declined,
    Voided,
}

impl EnvelopeStatus {
    /// Wire value used in envelope definitions and status fields
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeStatus::Created => "created",
            EnvelopeStatus::Sent => "sent",
            EnvelopeStatus::Delivered => "delivered",
            EnvelopeStatus::Completed => "completed",
            EnvelopeStatus::Declined => "declined",
            EnvelopeStatus::Voided => "voided",
        }
    }

    /// Parse a status string from an API response, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "created" => Some(EnvelopeStatus::Created),
            "sent" => Some(EnvelopeStatus::Sent),
            "delivered" => Some(EnvelopeStatus::Delivered),
            "completed" => Some(EnvelopeStatus::Completed),
            "declined" => Some(EnvelopeStatus::Declined),
            "voided" => Some(EnvelopeStatus::Voided),
            _ => None,
        }
    }
}

impl std::fmt::Display for EnvelopeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate signer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signer {
    pub name: String,
    pub email: String,
    /// Stable identifier derived from the email when not supplied
    pub recipient_id: String,
}

impl Signer {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            recipient_id: derive_recipient_id(email),
        }
    }
}

/// Recipient ids only need to be unique within an envelope, so a small
/// hash of the email keeps them stable across retries of the same request.
fn derive_recipient_id(email: &str) -> String {
    let h = email
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    format!("{}", h % 10_000)
}

/// Where signature fields land on the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TabPlacement {
    /// Relative to a text marker embedded in the document
    Anchor {
        anchor_string: String,
        units: String,
        x_offset: i32,
        y_offset: i32,
    },
    /// Absolute page coordinates
    Fixed { page: u32, x: u32, y: u32 },
    /// No pre-placed fields; the signer positions them at signing time
    FreeForm,
}

impl TabPlacement {
    /// Signature anchor matching the `/sn1/` marker in the stock documents
    pub fn signature_default() -> Self {
        TabPlacement::Anchor {
            anchor_string: "/sn1/".to_string(),
            units: "pixels".to_string(),
            x_offset: 20,
            y_offset: 10,
        }
    }

    /// Date-signed field offset to the right of the same marker
    pub fn date_signed_default() -> Self {
        TabPlacement::Anchor {
            anchor_string: "/sn1/".to_string(),
            units: "pixels".to_string(),
            x_offset: 120,
            y_offset: 10,
        }
    }
}

/// Envelope-level Connect configuration, attached at send time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// HTTPS endpoint DocuSign will POST status changes to
    pub url: String,
    /// Lifecycle events forwarded to the endpoint
    pub envelope_events: Vec<String>,
    /// Embed the full document set in each delivery (large payloads)
    pub include_documents: bool,
    /// Keep delivery logs on the DocuSign side
    pub logging_enabled: bool,
    /// Retry delivery until the endpoint acknowledges with a 200
    pub require_acknowledgment: bool,
}

impl NotificationConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            envelope_events: vec![
                "completed".to_string(),
                "declined".to_string(),
                "voided".to_string(),
            ],
            include_documents: false,
            logging_enabled: true,
            require_acknowledgment: true,
        }
    }

    pub fn with_events(mut self, events: &[&str]) -> Self {
        self.envelope_events = events.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn include_documents(mut self, include: bool) -> Self {
        self.include_documents = include;
        self
    }
}

/// Request to send a document to a group of candidate signers
#[derive(Debug, Clone)]
pub struct EnvelopeRequest {
    /// Raw PDF bytes
    pub document: Vec<u8>,
    pub document_name: String,
    pub email_subject: String,
    pub email_blurb: String,
    /// Members of the temporary signing group; any one signature completes
    /// the envelope
    pub signers: Vec<Signer>,
    /// Base name for the temporary group; a unique suffix is appended
    pub group_name: String,
    pub signature_placement: TabPlacement,
    pub date_signed_placement: TabPlacement,
    /// `Sent` dispatches immediately, `Created` leaves a draft
    pub status: EnvelopeStatus,
    pub notification: Option<NotificationConfig>,
}

impl EnvelopeRequest {
    pub fn new(document: Vec<u8>, document_name: &str) -> Self {
        Self {
            document,
            document_name: document_name.to_string(),
            email_subject: "Signature requested".to_string(),
            email_blurb: "Please review and sign the attached document.".to_string(),
            signers: Vec::new(),
            group_name: "Candidate Signers".to_string(),
            signature_placement: TabPlacement::signature_default(),
            date_signed_placement: TabPlacement::date_signed_default(),
            status: EnvelopeStatus::Sent,
            notification: None,
        }
    }

    pub fn add_signer(mut self, name: &str, email: &str) -> Self {
        self.signers.push(Signer::new(name, email));
        self
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        self.email_subject = subject.to_string();
        self
    }

    pub fn with_blurb(mut self, blurb: &str) -> Self {
        self.email_blurb = blurb.to_string();
        self
    }

    pub fn with_group_name(mut self, name: &str) -> Self {
        self.group_name = name.to_string();
        self
    }

    pub fn with_signature_placement(mut self, placement: TabPlacement) -> Self {
        self.signature_placement = placement;
        self
    }

    pub fn with_date_signed_placement(mut self, placement: TabPlacement) -> Self {
        self.date_signed_placement = placement;
        self
    }

    pub fn with_notification(mut self, config: NotificationConfig) -> Self {
        self.notification = Some(config);
        self
    }

    /// Leave the envelope as a draft instead of sending immediately
    pub fn as_draft(mut self) -> Self {
        self.status = EnvelopeStatus::Created;
        self
    }

    /// Validate before any remote call is made
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_document()?;
        if self.signers.is_empty() {
            return Err(ValidationError::NoSigners);
        }
        Ok(())
    }

    /// Document-only validation, for the single-signer path where the
    /// signer arrives separately from the request.
    pub(crate) fn validate_document(&self) -> Result<(), ValidationError> {
        if self.document.is_empty() {
            return Err(ValidationError::MissingField("document"));
        }
        if self.document_name.is_empty() {
            return Err(ValidationError::MissingField("document_name"));
        }
        Ok(())
    }
}

/// Request to create a reusable template
#[derive(Debug, Clone)]
pub struct TemplateRequest {
    /// Raw PDF bytes
    pub document: Vec<u8>,
    pub document_name: String,
    pub template_name: String,
    pub description: String,
    /// Role name the placeholder recipient is keyed by at send time
    pub role_name: String,
    pub email_subject: String,
    pub email_blurb: String,
    pub signature_placement: TabPlacement,
    pub date_signed_placement: TabPlacement,
}

impl TemplateRequest {
    pub fn new(document: Vec<u8>, document_name: &str, template_name: &str) -> Self {
        Self {
            document,
            document_name: document_name.to_string(),
            template_name: template_name.to_string(),
            description: String::new(),
            role_name: "signer".to_string(),
            email_subject: "Signature requested".to_string(),
            email_blurb: "Please review and sign the attached document.".to_string(),
            signature_placement: TabPlacement::signature_default(),
            date_signed_placement: TabPlacement::date_signed_default(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_role(mut self, role_name: &str) -> Self {
        self.role_name = role_name.to_string();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.document.is_empty() {
            return Err(ValidationError::MissingField("document"));
        }
        if self.template_name.is_empty() {
            return Err(ValidationError::MissingField("template_name"));
        }
        if self.role_name.is_empty() {
            return Err(ValidationError::MissingField("role_name"));
        }
        Ok(())
    }
}

/// Envelope identity and status returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeResponse {
    pub envelope_id: String,
    pub status: EnvelopeStatus,
    pub status_datetime: Option<DateTime<Utc>>,
    pub uri: Option<String>,
}

/// A server-side signing group, alive only for the duration of one send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningGroup {
    pub group_id: String,
    pub group_name: String,
}

/// Template identity as stored on the DocuSign side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub template_id: String,
    pub name: String,
    pub description: Option<String>,
    pub uri: Option<String>,
}

/// Request validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("At least one signer is required")]
    NoSigners,
}

/// Lenient RFC 3339 parse; DocuSign timestamps are not always well formed.
pub(crate) fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            EnvelopeStatus::Created,
            EnvelopeStatus::Sent,
            EnvelopeStatus::Delivered,
            EnvelopeStatus::Completed,
            EnvelopeStatus::Declined,
            EnvelopeStatus::Voided,
        ] {
            assert_eq!(EnvelopeStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!(
            EnvelopeStatus::parse("Completed"),
            Some(EnvelopeStatus::Completed)
        );
        assert_eq!(
            EnvelopeStatus::parse("COMPLETED"),
            Some(EnvelopeStatus::Completed)
        );
        assert_eq!(EnvelopeStatus::parse("unknown"), None);
        assert_eq!(EnvelopeStatus::parse(""), None);
    }

    #[test]
    fn test_recipient_id_is_stable() {
        let a = Signer::new("Alice", "alice@example.com");
        let b = Signer::new("Alice Again", "alice@example.com");
        let c = Signer::new("Carol", "carol@example.com");

        assert_eq!(a.recipient_id, b.recipient_id);
        assert_ne!(a.recipient_id, c.recipient_id);
        assert!(a.recipient_id.len() <= 4);
    }

    #[test]
    fn test_envelope_request_builder() {
        let request = EnvelopeRequest::new(b"%PDF-1.4".to_vec(), "nda.pdf")
            .with_subject("Please sign the NDA")
            .with_group_name("Legal Team")
            .add_signer("Alice", "alice@example.com")
            .add_signer("Bob", "bob@example.com");

        assert_eq!(request.document_name, "nda.pdf");
        assert_eq!(request.email_subject, "Please sign the NDA");
        assert_eq!(request.group_name, "Legal Team");
        assert_eq!(request.signers.len(), 2);
        assert_eq!(request.status, EnvelopeStatus::Sent);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_envelope_request_requires_signers() {
        let request = EnvelopeRequest::new(b"%PDF-1.4".to_vec(), "nda.pdf");
        assert_eq!(request.validate(), Err(ValidationError::NoSigners));
    }

    #[test]
    fn test_envelope_request_requires_document() {
        let request = EnvelopeRequest::new(Vec::new(), "nda.pdf").add_signer("A", "a@example.com");
        assert_eq!(
            request.validate(),
            Err(ValidationError::MissingField("document"))
        );
    }

    #[test]
    fn test_draft_status() {
        let request = EnvelopeRequest::new(b"%PDF-1.4".to_vec(), "nda.pdf").as_draft();
        assert_eq!(request.status, EnvelopeStatus::Created);
    }

    #[test]
    fn test_notification_defaults() {
        let config = NotificationConfig::new("https://example.com/webhook/docusign");
        assert_eq!(config.envelope_events, vec!["completed", "declined", "voided"]);
        assert!(!config.include_documents);
        assert!(config.logging_enabled);
        assert!(config.require_acknowledgment);
    }

    #[test]
    fn test_template_request_validation() {
        let ok = TemplateRequest::new(b"%PDF-1.4".to_vec(), "nda.pdf", "Standard NDA");
        assert!(ok.validate().is_ok());

        let no_name = TemplateRequest::new(b"%PDF-1.4".to_vec(), "nda.pdf", "");
        assert_eq!(
            no_name.validate(),
            Err(ValidationError::MissingField("template_name"))
        );
    }

    #[test]
    fn test_parse_rfc3339_lenient() {
        assert!(parse_rfc3339("2025-06-01T12:00:00Z").is_some());
        assert!(parse_rfc3339("2025-06-01T12:00:00+09:00").is_some());
        assert!(parse_rfc3339("not a timestamp").is_none());
        assert!(parse_rfc3339("").is_none());
    }
}
