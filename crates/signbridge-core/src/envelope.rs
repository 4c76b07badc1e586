//! Envelope orchestration
//!
//! The signing-group flow is the centerpiece: a document goes out to N
//! candidate signers through a temporary shared group, any one signature
//! completes the envelope, and the group is removed again as soon as the
//! send has been attempted. Groups are account-level resources, so leaving
//! them behind would let them pile up across sends.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::client::{
    build_tabs, DocumentDefinition, EnvelopeDefinition, EnvelopeUpdate, EventNotificationSpec,
    RecipientDefinition, Recipients, SigningPlatform, COMBINED_DOCUMENT_ID,
};
use crate::error::DocusignError;
use crate::types::{EnvelopeRequest, EnvelopeResponse, EnvelopeStatus, Signer};

/// Envelope lifecycle operations against a [`SigningPlatform`]
pub struct EnvelopeService {
    platform: Arc<dyn SigningPlatform>,
}

impl EnvelopeService {
    pub fn new(platform: Arc<dyn SigningPlatform>) -> Self {
        Self { platform }
    }

    /// Send a document to a group of candidate signers.
    ///
    /// Creates a temporary signing group, sends the envelope bound to it,
    /// and deletes the group again whether or not the send succeeded. If the
    /// returned future is dropped between group creation and cleanup, the
    /// group leaks on the server; unique group names keep a leaked group
    /// from colliding with later sends.
    #[instrument(skip(self, request), fields(document = %request.document_name, signers = request.signers.len()))]
    pub async fn send_to_group(
        &self,
        request: &EnvelopeRequest,
    ) -> Result<EnvelopeResponse, DocusignError> {
        request.validate()?;

        let response = send_with_temporary_group(
            self.platform.as_ref(),
            &request.group_name,
            &request.signers,
            |group_id| build_group_definition(request, group_id),
        )
        .await?;

        info!(
            envelope_id = %response.envelope_id,
            status = %response.status,
            "Envelope sent to signing group"
        );
        Ok(response)
    }

    /// Send a document to a single signer, without any group involved.
    pub async fn send_to_signer(
        &self,
        document: Vec<u8>,
        document_name: &str,
        signer: &Signer,
        email_subject: &str,
    ) -> Result<EnvelopeResponse, DocusignError> {
        let request = EnvelopeRequest::new(document, document_name).with_subject(email_subject);
        request.validate_document()?;

        let definition = build_single_signer_definition(&request, signer);
        let response = self.platform.create_envelope(&definition).await?;
        info!(
            envelope_id = %response.envelope_id,
            signer = %signer.email,
            "Envelope sent to signer"
        );
        Ok(response)
    }

    /// Current status of an envelope.
    pub async fn status(&self, envelope_id: &str) -> Result<EnvelopeResponse, DocusignError> {
        self.platform.get_envelope(envelope_id).await
    }

    /// Download the combined signed PDF of a completed envelope.
    ///
    /// The status is checked first; requesting documents of an incomplete
    /// envelope fails with [`DocusignError::NotReady`] rather than returning
    /// a partially signed file.
    pub async fn signed_document(&self, envelope_id: &str) -> Result<Vec<u8>, DocusignError> {
        let envelope = self.platform.get_envelope(envelope_id).await?;
        if envelope.status != EnvelopeStatus::Completed {
            warn!(
                envelope_id = %envelope_id,
                status = %envelope.status,
                "Signed document requested before completion"
            );
            return Err(DocusignError::NotReady {
                envelope_id: envelope_id.to_string(),
            });
        }
        self.platform
            .get_document(envelope_id, COMBINED_DOCUMENT_ID)
            .await
    }

    /// Void an in-flight envelope. Recipients are notified with `reason`.
    #[instrument(skip(self))]
    pub async fn void(
        &self,
        envelope_id: &str,
        reason: &str,
    ) -> Result<EnvelopeResponse, DocusignError> {
        let update = EnvelopeUpdate {
            status: EnvelopeStatus::Voided.as_str().to_string(),
            voided_reason: Some(reason.to_string()),
        };
        let response = self.platform.update_envelope(envelope_id, &update).await?;
        info!(envelope_id = %envelope_id, "Envelope voided");
        Ok(response)
    }
}

/// Create a temporary signing group, send the envelope built by `build`
/// against it, and unconditionally delete the group afterward.
///
/// A cleanup failure is logged but never propagated: it must not mask a
/// successful send, and it must not shadow the send error either.
pub(crate) async fn send_with_temporary_group(
    platform: &dyn SigningPlatform,
    base_name: &str,
    signers: &[Signer],
    build: impl FnOnce(&str) -> EnvelopeDefinition,
) -> Result<EnvelopeResponse, DocusignError> {
    let group_name = unique_group_name(base_name);
    let group = platform.create_signing_group(&group_name, signers).await?;

    let definition = build(&group.group_id);
    let result = platform.create_envelope(&definition).await;

    if let Err(e) = platform.delete_signing_group(&group.group_id).await {
        error!(
            group_id = %group.group_id,
            group_name = %group.group_name,
            error = %e,
            "Failed to delete temporary signing group; it remains on the account"
        );
    }

    result
}

/// Group names must be unique per send so a leaked group never collides
/// with a later one.
pub(crate) fn unique_group_name(base: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", base, &suffix[..8])
}

fn build_document(request_document: &[u8], name: &str) -> DocumentDefinition {
    DocumentDefinition {
        document_base64: BASE64.encode(request_document),
        name: name.to_string(),
        file_extension: "pdf".to_string(),
        document_id: "1".to_string(),
    }
}

fn build_group_definition(request: &EnvelopeRequest, group_id: &str) -> EnvelopeDefinition {
    let recipient = RecipientDefinition {
        signing_group_id: Some(group_id.to_string()),
        recipient_id: "1".to_string(),
        routing_order: "1".to_string(),
        tabs: build_tabs(&request.signature_placement, &request.date_signed_placement),
        ..RecipientDefinition::default()
    };

    EnvelopeDefinition {
        email_subject: Some(request.email_subject.clone()),
        email_blurb: Some(request.email_blurb.clone()),
        documents: vec![build_document(&request.document, &request.document_name)],
        recipients: Some(Recipients {
            signers: vec![recipient],
        }),
        status: request.status.as_str().to_string(),
        event_notification: request
            .notification
            .as_ref()
            .map(EventNotificationSpec::from_config),
        ..EnvelopeDefinition::default()
    }
}

fn build_single_signer_definition(
    request: &EnvelopeRequest,
    signer: &Signer,
) -> EnvelopeDefinition {
    let recipient = RecipientDefinition {
        email: Some(signer.email.clone()),
        name: Some(signer.name.clone()),
        recipient_id: signer.recipient_id.clone(),
        routing_order: "1".to_string(),
        tabs: build_tabs(&request.signature_placement, &request.date_signed_placement),
        ..RecipientDefinition::default()
    };

    EnvelopeDefinition {
        email_subject: Some(request.email_subject.clone()),
        email_blurb: Some(request.email_blurb.clone()),
        documents: vec![build_document(&request.document, &request.document_name)],
        recipients: Some(Recipients {
            signers: vec![recipient],
        }),
        status: request.status.as_str().to_string(),
        event_notification: request
            .notification
            .as_ref()
            .map(EventNotificationSpec::from_config),
        ..EnvelopeDefinition::default()
    }
}
