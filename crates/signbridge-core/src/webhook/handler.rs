//! Webhook event handling
//!
//! Classifies parsed events, fetches the signed document for completions,
//! and drives caller-supplied lifecycle hooks. Handling never fails for a
//! classifiable event: DocuSign redelivers anything that is not answered
//! with a 200, so downstream hiccups (artifact fetch, hook errors) are
//! logged and absorbed rather than turned into retry storms.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::client::SigningPlatform;
use crate::envelope::EnvelopeService;
use crate::webhook::event::WebhookEvent;
use crate::webhook::verify::SignatureVerifier;

/// Lifecycle callbacks invoked as envelope events arrive.
///
/// Default bodies are no-ops; implement only the outcomes you care about.
/// Redelivered events reach the hooks again, so implementations with
/// external side effects must de-duplicate on envelope id themselves.
#[async_trait]
pub trait EnvelopeHooks: Send + Sync {
    /// Called with the combined signed PDF once an envelope completes.
    /// Not called when the document could not be fetched.
    async fn on_completed(&self, event: &WebhookEvent, signed_pdf: &[u8]) -> anyhow::Result<()> {
        let _ = (event, signed_pdf);
        Ok(())
    }

    async fn on_declined(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        let _ = event;
        Ok(())
    }

    async fn on_voided(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        let _ = event;
        Ok(())
    }
}

struct NoHooks;

#[async_trait]
impl EnvelopeHooks for NoHooks {}

/// Outcome of processing one delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookResult {
    /// False only for events the pipeline could not process at all;
    /// classifiable events always acknowledge
    pub success: bool,
    pub envelope_id: String,
    pub event_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_email: Option<String>,
}

impl WebhookResult {
    fn acknowledged(event: &WebhookEvent, message: String) -> Self {
        Self {
            success: true,
            envelope_id: event.envelope_id.clone(),
            event_type: event.event.clone(),
            message,
            signer_name: None,
            signer_email: None,
        }
    }
}

/// Verification plus classification plus hook dispatch for one endpoint
pub struct WebhookService {
    envelopes: EnvelopeService,
    verifier: SignatureVerifier,
    hooks: Arc<dyn EnvelopeHooks>,
}

impl WebhookService {
    pub fn new(platform: Arc<dyn SigningPlatform>, verifier: SignatureVerifier) -> Self {
        Self {
            envelopes: EnvelopeService::new(platform),
            verifier,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn EnvelopeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Check the delivery signature against the raw body.
    pub fn verify_signature(&self, payload: &[u8], signature: &str) -> bool {
        self.verifier.verify(payload, signature)
    }

    /// Process one parsed event. Safe to call repeatedly with the same
    /// event; the result is the same each time and hooks run again.
    #[instrument(skip(self, event), fields(event = %event.event, envelope_id = %event.envelope_id))]
    pub async fn handle(&self, event: &WebhookEvent) -> WebhookResult {
        if event.is_completed() {
            self.handle_completed(event).await
        } else if event.is_declined() {
            self.handle_declined(event).await
        } else if event.is_voided() {
            self.handle_voided(event).await
        } else {
            info!(status = %event.status, "Acknowledging unclassified event");
            WebhookResult::acknowledged(event, format!("Event {} acknowledged", event.event))
        }
    }

    async fn handle_completed(&self, event: &WebhookEvent) -> WebhookResult {
        info!(envelope_id = %event.envelope_id, "Envelope completed");
        let signer = event.completing_signer();

        // DocuSign can deliver the completion before the document is
        // queryable; a failed fetch is logged and the event still succeeds.
        let signed_pdf = match self.envelopes.signed_document(&event.envelope_id).await {
            Ok(pdf) => Some(pdf),
            Err(e) => {
                error!(
                    envelope_id = %event.envelope_id,
                    error = %e,
                    "Failed to download signed document"
                );
                None
            }
        };

        if let Some(pdf) = &signed_pdf {
            if let Err(e) = self.hooks.on_completed(event, pdf).await {
                error!(envelope_id = %event.envelope_id, error = %e, "on_completed hook failed");
            }
        }

        WebhookResult {
            signer_name: signer.map(|s| s.name.clone()),
            signer_email: signer.map(|s| s.email.clone()),
            ..WebhookResult::acknowledged(event, "Envelope completed successfully".to_string())
        }
    }

    async fn handle_declined(&self, event: &WebhookEvent) -> WebhookResult {
        let decliner = event.declining_signer();
        warn!(
            envelope_id = %event.envelope_id,
            decliner = decliner.map(|d| d.email.as_str()).unwrap_or("unknown"),
            "Envelope declined"
        );

        if let Err(e) = self.hooks.on_declined(event).await {
            error!(envelope_id = %event.envelope_id, error = %e, "on_declined hook failed");
        }

        let name = decliner.map(|d| d.name.as_str()).unwrap_or("unknown");
        WebhookResult {
            signer_name: decliner.map(|d| d.name.clone()),
            signer_email: decliner.map(|d| d.email.clone()),
            ..WebhookResult::acknowledged(event, format!("Envelope declined by {name}"))
        }
    }

    async fn handle_voided(&self, event: &WebhookEvent) -> WebhookResult {
        info!(envelope_id = %event.envelope_id, "Envelope voided");

        if let Err(e) = self.hooks.on_voided(event).await {
            error!(envelope_id = %event.envelope_id, error = %e, "on_voided hook failed");
        }

        WebhookResult::acknowledged(event, "Envelope voided".to_string())
    }
}
