//! Reusable envelope templates
//!
//! A template stores the document, the tab layout, and a named role
//! placeholder once; sends then only bind a recipient to the role. The
//! group send reuses the temporary-signing-group sequence from the
//! envelope service.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::{info, instrument};

use crate::client::{
    build_tabs, DocumentDefinition, EnvelopeDefinition, RecipientDefinition, Recipients,
    SigningPlatform, TemplateDefinition, TemplateRoleSpec,
};
use crate::envelope::send_with_temporary_group;
use crate::error::DocusignError;
use crate::types::{
    EnvelopeResponse, EnvelopeStatus, Signer, TemplateInfo, TemplateRequest, ValidationError,
};

/// Options applied when an envelope is created from a template
#[derive(Debug, Clone)]
pub struct TemplateSendOptions {
    /// Role the recipient is bound to; must match the template's placeholder
    pub role_name: String,
    /// Overrides the template's subject when set
    pub email_subject: Option<String>,
    pub email_blurb: Option<String>,
    pub status: EnvelopeStatus,
    /// Base name for the temporary group on group sends
    pub group_name: String,
}

impl Default for TemplateSendOptions {
    fn default() -> Self {
        Self {
            role_name: "signer".to_string(),
            email_subject: None,
            email_blurb: None,
            status: EnvelopeStatus::Sent,
            group_name: "Template Signers".to_string(),
        }
    }
}

/// Template management and template-based sends
pub struct TemplateService {
    platform: Arc<dyn SigningPlatform>,
}

impl TemplateService {
    pub fn new(platform: Arc<dyn SigningPlatform>) -> Self {
        Self { platform }
    }

    /// Create a template with one document and one role placeholder.
    #[instrument(skip(self, request), fields(template = %request.template_name))]
    pub async fn create(&self, request: &TemplateRequest) -> Result<TemplateInfo, DocusignError> {
        request.validate()?;

        let placeholder = RecipientDefinition {
            role_name: Some(request.role_name.clone()),
            recipient_id: "1".to_string(),
            routing_order: "1".to_string(),
            tabs: build_tabs(&request.signature_placement, &request.date_signed_placement),
            ..RecipientDefinition::default()
        };

        let definition = TemplateDefinition {
            name: request.template_name.clone(),
            description: (!request.description.is_empty()).then(|| request.description.clone()),
            documents: vec![DocumentDefinition {
                document_base64: BASE64.encode(&request.document),
                name: request.document_name.clone(),
                file_extension: "pdf".to_string(),
                document_id: "1".to_string(),
            }],
            recipients: Recipients {
                signers: vec![placeholder],
            },
            email_subject: Some(request.email_subject.clone()),
            email_blurb: Some(request.email_blurb.clone()),
            status: EnvelopeStatus::Created.as_str().to_string(),
        };

        self.platform.create_template(&definition).await
    }

    pub async fn get(&self, template_id: &str) -> Result<TemplateInfo, DocusignError> {
        self.platform.get_template(template_id).await
    }

    /// List templates on the account, optionally filtered by name.
    pub async fn list(&self, search_text: Option<&str>) -> Result<Vec<TemplateInfo>, DocusignError> {
        self.platform.list_templates(search_text).await
    }

    pub async fn delete(&self, template_id: &str) -> Result<(), DocusignError> {
        self.platform.delete_template(template_id).await
    }

    /// Replace the template's document, keeping tabs and roles in place.
    pub async fn replace_document(
        &self,
        template_id: &str,
        document: Vec<u8>,
        document_name: &str,
    ) -> Result<TemplateInfo, DocusignError> {
        if document.is_empty() {
            return Err(ValidationError::MissingField("document").into());
        }

        let definition = DocumentDefinition {
            document_base64: BASE64.encode(&document),
            name: document_name.to_string(),
            file_extension: "pdf".to_string(),
            document_id: "1".to_string(),
        };
        self.platform
            .update_template_document(template_id, &definition)
            .await?;

        info!(template_id = %template_id, document = %document_name, "Template document replaced");
        self.platform.get_template(template_id).await
    }

    /// Send an envelope from a template to a single signer.
    pub async fn send_to_signer(
        &self,
        template_id: &str,
        signer: &Signer,
        options: &TemplateSendOptions,
    ) -> Result<EnvelopeResponse, DocusignError> {
        let definition = EnvelopeDefinition {
            template_id: Some(template_id.to_string()),
            template_roles: vec![TemplateRoleSpec {
                email: Some(signer.email.clone()),
                name: Some(signer.name.clone()),
                role_name: options.role_name.clone(),
                ..TemplateRoleSpec::default()
            }],
            email_subject: options.email_subject.clone(),
            email_blurb: options.email_blurb.clone(),
            status: options.status.as_str().to_string(),
            ..EnvelopeDefinition::default()
        };

        let response = self.platform.create_envelope(&definition).await?;
        info!(
            envelope_id = %response.envelope_id,
            template_id = %template_id,
            signer = %signer.email,
            "Envelope sent from template"
        );
        Ok(response)
    }

    /// Send an envelope from a template to a group of candidate signers,
    /// through the same temporary-group sequence as a direct group send.
    #[instrument(skip(self, signers, options), fields(template_id = %template_id, signers = signers.len()))]
    pub async fn send_to_group(
        &self,
        template_id: &str,
        signers: &[Signer],
        options: &TemplateSendOptions,
    ) -> Result<EnvelopeResponse, DocusignError> {
        if signers.is_empty() {
            return Err(ValidationError::NoSigners.into());
        }

        let response = send_with_temporary_group(
            self.platform.as_ref(),
            &options.group_name,
            signers,
            |group_id| EnvelopeDefinition {
                template_id: Some(template_id.to_string()),
                template_roles: vec![TemplateRoleSpec {
                    signing_group_id: Some(group_id.to_string()),
                    role_name: options.role_name.clone(),
                    ..TemplateRoleSpec::default()
                }],
                email_subject: options.email_subject.clone(),
                email_blurb: options.email_blurb.clone(),
                status: options.status.as_str().to_string(),
                ..EnvelopeDefinition::default()
            },
        )
        .await?;

        info!(
            envelope_id = %response.envelope_id,
            template_id = %template_id,
            "Envelope sent from template to signing group"
        );
        Ok(response)
    }
}
