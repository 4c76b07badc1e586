//! In-memory [`SigningPlatform`] used by the service tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::{
    DocumentDefinition, EnvelopeDefinition, EnvelopeUpdate, SigningPlatform, TemplateDefinition,
};
use crate::error::DocusignError;
use crate::types::{EnvelopeResponse, EnvelopeStatus, Signer, SigningGroup, TemplateInfo};

/// Records every call and answers with canned data. Failure flags flip
/// individual operations into returning a `Remote` error.
pub(crate) struct FakePlatform {
    pub state: Mutex<FakeState>,
}

pub(crate) struct FakeState {
    pub groups_created: Vec<(String, usize)>,
    pub groups_deleted: Vec<String>,
    pub envelopes_created: Vec<EnvelopeDefinition>,
    pub envelope_updates: Vec<(String, EnvelopeUpdate)>,
    pub templates_created: Vec<TemplateDefinition>,
    pub template_documents_updated: Vec<(String, DocumentDefinition)>,
    pub documents_fetched: Vec<(String, String)>,
    pub fail_create_envelope: bool,
    pub fail_delete_group: bool,
    pub fail_get_document: bool,
    /// Status every `get_envelope` call reports
    pub envelope_status: EnvelopeStatus,
    pub document: Vec<u8>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            groups_created: Vec::new(),
            groups_deleted: Vec::new(),
            envelopes_created: Vec::new(),
            envelope_updates: Vec::new(),
            templates_created: Vec::new(),
            template_documents_updated: Vec::new(),
            documents_fetched: Vec::new(),
            fail_create_envelope: false,
            fail_delete_group: false,
            fail_get_document: false,
            envelope_status: EnvelopeStatus::Sent,
            document: b"%PDF-1.4 fake signed document".to_vec(),
        }
    }
}

impl FakePlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState::default()),
        })
    }
}

fn remote(status: u16, body: &str) -> DocusignError {
    DocusignError::Remote {
        status,
        body: body.to_string(),
    }
}

#[async_trait]
impl SigningPlatform for FakePlatform {
    async fn create_signing_group(
        &self,
        name: &str,
        members: &[Signer],
    ) -> Result<SigningGroup, DocusignError> {
        let mut state = self.state.lock().unwrap();
        state.groups_created.push((name.to_string(), members.len()));
        Ok(SigningGroup {
            group_id: format!("sg-{}", state.groups_created.len()),
            group_name: name.to_string(),
        })
    }

    async fn delete_signing_group(&self, group_id: &str) -> Result<(), DocusignError> {
        let mut state = self.state.lock().unwrap();
        state.groups_deleted.push(group_id.to_string());
        if state.fail_delete_group {
            return Err(remote(400, "cannot delete signing group"));
        }
        Ok(())
    }

    async fn create_envelope(
        &self,
        definition: &EnvelopeDefinition,
    ) -> Result<EnvelopeResponse, DocusignError> {
        let mut state = self.state.lock().unwrap();
        state.envelopes_created.push(definition.clone());
        if state.fail_create_envelope {
            return Err(remote(500, "internal server error"));
        }
        Ok(EnvelopeResponse {
            envelope_id: "env-123".to_string(),
            status: EnvelopeStatus::parse(&definition.status).unwrap_or(EnvelopeStatus::Sent),
            status_datetime: None,
            uri: Some("/envelopes/env-123".to_string()),
        })
    }

    async fn get_envelope(&self, envelope_id: &str) -> Result<EnvelopeResponse, DocusignError> {
        let state = self.state.lock().unwrap();
        Ok(EnvelopeResponse {
            envelope_id: envelope_id.to_string(),
            status: state.envelope_status,
            status_datetime: None,
            uri: None,
        })
    }

    async fn get_document(
        &self,
        envelope_id: &str,
        document_id: &str,
    ) -> Result<Vec<u8>, DocusignError> {
        let mut state = self.state.lock().unwrap();
        state
            .documents_fetched
            .push((envelope_id.to_string(), document_id.to_string()));
        if state.fail_get_document {
            return Err(remote(404, "document not found"));
        }
        Ok(state.document.clone())
    }

    async fn update_envelope(
        &self,
        envelope_id: &str,
        update: &EnvelopeUpdate,
    ) -> Result<EnvelopeResponse, DocusignError> {
        let mut state = self.state.lock().unwrap();
        state
            .envelope_updates
            .push((envelope_id.to_string(), update.clone()));
        Ok(EnvelopeResponse {
            envelope_id: envelope_id.to_string(),
            status: EnvelopeStatus::parse(&update.status).unwrap_or(EnvelopeStatus::Voided),
            status_datetime: None,
            uri: None,
        })
    }

    async fn create_template(
        &self,
        template: &TemplateDefinition,
    ) -> Result<TemplateInfo, DocusignError> {
        let mut state = self.state.lock().unwrap();
        state.templates_created.push(template.clone());
        Ok(TemplateInfo {
            template_id: format!("tpl-{}", state.templates_created.len()),
            name: template.name.clone(),
            description: template.description.clone(),
            uri: None,
        })
    }

    async fn get_template(&self, template_id: &str) -> Result<TemplateInfo, DocusignError> {
        Ok(TemplateInfo {
            template_id: template_id.to_string(),
            name: "Fake Template".to_string(),
            description: None,
            uri: Some(format!("/templates/{template_id}")),
        })
    }

    async fn list_templates(
        &self,
        _search_text: Option<&str>,
    ) -> Result<Vec<TemplateInfo>, DocusignError> {
        Ok(Vec::new())
    }

    async fn delete_template(&self, _template_id: &str) -> Result<(), DocusignError> {
        Ok(())
    }

    async fn update_template_document(
        &self,
        template_id: &str,
        document: &DocumentDefinition,
    ) -> Result<(), DocusignError> {
        let mut state = self.state.lock().unwrap();
        state
            .template_documents_updated
            .push((template_id.to_string(), document.clone()));
        Ok(())
    }
}
