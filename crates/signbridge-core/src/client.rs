//! DocuSign eSignature REST client
//!
//! The [`SigningPlatform`] trait is the seam between the services and the
//! remote API: [`DocusignClient`] is the production implementation against
//! eSignature REST v2.1, and tests substitute an in-memory fake. All wire
//! DTOs live here; the API speaks camelCase and represents numbers and
//! booleans as strings in several places, which the DTOs preserve.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::auth::{AccessToken, DocusignAuth};
use crate::error::DocusignError;
use crate::types::{
    parse_rfc3339, EnvelopeResponse, EnvelopeStatus, NotificationConfig, Signer, SigningGroup,
    TabPlacement, TemplateInfo,
};

/// Document id DocuSign uses for the merged PDF of a completed envelope
pub(crate) const COMBINED_DOCUMENT_ID: &str = "combined";

const SHARED_SIGNING_GROUP: &str = "sharedSigningGroup";

// ============================================================================
// Platform trait
// ============================================================================

/// Remote operations the envelope, template, and webhook services rely on
#[async_trait]
pub trait SigningPlatform: Send + Sync {
    async fn create_signing_group(
        &self,
        name: &str,
        members: &[Signer],
    ) -> Result<SigningGroup, DocusignError>;

    async fn delete_signing_group(&self, group_id: &str) -> Result<(), DocusignError>;

    async fn create_envelope(
        &self,
        definition: &EnvelopeDefinition,
    ) -> Result<EnvelopeResponse, DocusignError>;

    async fn get_envelope(&self, envelope_id: &str) -> Result<EnvelopeResponse, DocusignError>;

    /// Download one document of an envelope; `combined` merges them all.
    async fn get_document(
        &self,
        envelope_id: &str,
        document_id: &str,
    ) -> Result<Vec<u8>, DocusignError>;

    async fn update_envelope(
        &self,
        envelope_id: &str,
        update: &EnvelopeUpdate,
    ) -> Result<EnvelopeResponse, DocusignError>;

    async fn create_template(
        &self,
        template: &TemplateDefinition,
    ) -> Result<TemplateInfo, DocusignError>;

    async fn get_template(&self, template_id: &str) -> Result<TemplateInfo, DocusignError>;

    async fn list_templates(
        &self,
        search_text: Option<&str>,
    ) -> Result<Vec<TemplateInfo>, DocusignError>;

    async fn delete_template(&self, template_id: &str) -> Result<(), DocusignError>;

    async fn update_template_document(
        &self,
        template_id: &str,
        document: &DocumentDefinition,
    ) -> Result<(), DocusignError>;
}

// ============================================================================
// Wire DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDefinition {
    pub document_base64: String,
    pub name: String,
    pub file_extension: String,
    pub document_id: String,
}

/// One sign-here or date-signed field; offsets and coordinates go over the
/// wire as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_units: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_x_offset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_y_offset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_position: Option<String>,
}

impl TabSpec {
    /// `None` for free-form placement, where no field is pre-positioned.
    pub fn from_placement(placement: &TabPlacement) -> Option<Self> {
        match placement {
            TabPlacement::Anchor {
                anchor_string,
                units,
                x_offset,
                y_offset,
            } => Some(TabSpec {
                anchor_string: Some(anchor_string.clone()),
                anchor_units: Some(units.clone()),
                anchor_x_offset: Some(x_offset.to_string()),
                anchor_y_offset: Some(y_offset.to_string()),
                ..TabSpec::default()
            }),
            TabPlacement::Fixed { page, x, y } => Some(TabSpec {
                page_number: Some(page.to_string()),
                x_position: Some(x.to_string()),
                y_position: Some(y.to_string()),
                ..TabSpec::default()
            }),
            TabPlacement::FreeForm => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tabs {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sign_here_tabs: Vec<TabSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub date_signed_tabs: Vec<TabSpec>,
}

/// Translate placement policies into wire tabs; `None` when both are
/// free-form and the recipient should get no pre-placed fields at all.
pub(crate) fn build_tabs(
    signature: &TabPlacement,
    date_signed: &TabPlacement,
) -> Option<Tabs> {
    let sign_here = TabSpec::from_placement(signature);
    let date = TabSpec::from_placement(date_signed);
    if sign_here.is_none() && date.is_none() {
        return None;
    }
    Some(Tabs {
        sign_here_tabs: sign_here.into_iter().collect(),
        date_signed_tabs: date.into_iter().collect(),
    })
}

/// A recipient entry: either an individual (email + name), a signing group,
/// or a template role placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    pub recipient_id: String,
    pub routing_order: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Tabs>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipients {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub signers: Vec<RecipientDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeEventSpec {
    pub envelope_event_status_code: String,
}

/// Envelope-level Connect subscription; booleans are strings on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNotificationSpec {
    pub url: String,
    pub logging_enabled: String,
    pub require_acknowledgment: String,
    pub include_documents: String,
    pub envelope_events: Vec<EnvelopeEventSpec>,
}

impl EventNotificationSpec {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            url: config.url.clone(),
            logging_enabled: config.logging_enabled.to_string(),
            require_acknowledgment: config.require_acknowledgment.to_string(),
            include_documents: config.include_documents.to_string(),
            envelope_events: config
                .envelope_events
                .iter()
                .map(|event| EnvelopeEventSpec {
                    envelope_event_status_code: event.clone(),
                })
                .collect(),
        }
    }
}

/// Template role binding used when an envelope is created from a template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRoleSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_group_id: Option<String>,
    pub role_name: String,
}

/// Body of `POST /envelopes`, either from documents or from a template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_blurb: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub documents: Vec<DocumentDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Recipients>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_notification: Option<EventNotificationSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub template_roles: Vec<TemplateRoleSpec>,
}

/// Body of `PUT /envelopes/{id}`, used to void or send a draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeUpdate {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voided_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub documents: Vec<DocumentDefinition>,
    pub recipients: Recipients,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_blurb: Option<String>,
    pub status: String,
}

// ----------------------------------------------------------------------------
// Response DTOs
// ----------------------------------------------------------------------------

/// Envelope summary as returned by create, get, and update calls. Field
/// presence varies by endpoint; `statusChangedDateTime` appears on reads
/// where `statusDateTime` appears on writes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeSummary {
    envelope_id: Option<String>,
    status: Option<String>,
    status_date_time: Option<String>,
    status_changed_date_time: Option<String>,
    uri: Option<String>,
}

impl EnvelopeSummary {
    fn into_response(self, default_status: EnvelopeStatus) -> EnvelopeResponse {
        EnvelopeResponse {
            envelope_id: self.envelope_id.unwrap_or_default(),
            status: self
                .status
                .as_deref()
                .and_then(EnvelopeStatus::parse)
                .unwrap_or(default_status),
            status_datetime: self
                .status_date_time
                .as_deref()
                .or(self.status_changed_date_time.as_deref())
                .and_then(parse_rfc3339),
            uri: self.uri,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SigningGroupUser<'a> {
    user_name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SigningGroupCreate<'a> {
    group_name: &'a str,
    group_type: &'a str,
    users: Vec<SigningGroupUser<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SigningGroupCreateBody<'a> {
    groups: [SigningGroupCreate<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SigningGroupRef<'a> {
    signing_group_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SigningGroupDeleteBody<'a> {
    groups: [SigningGroupRef<'a>; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SigningGroupList {
    #[serde(default)]
    groups: Vec<SigningGroupEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SigningGroupEntry {
    signing_group_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateSummary {
    template_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateList {
    #[serde(default)]
    envelope_templates: Vec<TemplateSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateDocumentsUpdate<'a> {
    documents: [&'a DocumentDefinition; 1],
}

// ============================================================================
// Production client
// ============================================================================

/// eSignature REST v2.1 client backed by [`DocusignAuth`]
pub struct DocusignClient {
    auth: Arc<DocusignAuth>,
    http: reqwest::Client,
}

impl DocusignClient {
    pub fn new(auth: Arc<DocusignAuth>) -> Result<Self, DocusignError> {
        let http = reqwest::Client::builder()
            .timeout(auth.config().request_timeout)
            .build()?;
        Ok(Self { auth, http })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, DocusignError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), body = %body, "DocuSign API request failed");
        Err(DocusignError::Remote {
            status: status.as_u16(),
            body,
        })
    }
}

fn account_url(token: &AccessToken, path: &str) -> String {
    format!("{}/v2.1/accounts/{}{}", token.base_uri, token.account_id, path)
}

#[async_trait]
impl SigningPlatform for DocusignClient {
    async fn create_signing_group(
        &self,
        name: &str,
        members: &[Signer],
    ) -> Result<SigningGroup, DocusignError> {
        let token = self.auth.token().await?;
        let body = SigningGroupCreateBody {
            groups: [SigningGroupCreate {
                group_name: name,
                group_type: SHARED_SIGNING_GROUP,
                users: members
                    .iter()
                    .map(|signer| SigningGroupUser {
                        user_name: &signer.name,
                        email: &signer.email,
                    })
                    .collect(),
            }],
        };

        let response = self
            .http
            .post(account_url(&token, "/signing_groups"))
            .bearer_auth(&token.access_token)
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let created: SigningGroupList = response.json().await?;
        let group_id = created
            .groups
            .into_iter()
            .next()
            .and_then(|group| group.signing_group_id)
            .ok_or_else(|| DocusignError::Remote {
                status: 200,
                body: "signing group response carried no group id".to_string(),
            })?;

        info!(group_id = %group_id, group_name = %name, members = members.len(), "Created signing group");
        Ok(SigningGroup {
            group_id,
            group_name: name.to_string(),
        })
    }

    async fn delete_signing_group(&self, group_id: &str) -> Result<(), DocusignError> {
        let token = self.auth.token().await?;
        let body = SigningGroupDeleteBody {
            groups: [SigningGroupRef {
                signing_group_id: group_id,
            }],
        };

        let response = self
            .http
            .delete(account_url(&token, "/signing_groups"))
            .bearer_auth(&token.access_token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;

        info!(group_id = %group_id, "Deleted signing group");
        Ok(())
    }

    async fn create_envelope(
        &self,
        definition: &EnvelopeDefinition,
    ) -> Result<EnvelopeResponse, DocusignError> {
        let token = self.auth.token().await?;
        let response = self
            .http
            .post(account_url(&token, "/envelopes"))
            .bearer_auth(&token.access_token)
            .json(definition)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let summary: EnvelopeSummary = response.json().await?;
        let default_status =
            EnvelopeStatus::parse(&definition.status).unwrap_or(EnvelopeStatus::Sent);
        let envelope = summary.into_response(default_status);
        info!(envelope_id = %envelope.envelope_id, status = %envelope.status, "Created envelope");
        Ok(envelope)
    }

    async fn get_envelope(&self, envelope_id: &str) -> Result<EnvelopeResponse, DocusignError> {
        let token = self.auth.token().await?;
        let response = self
            .http
            .get(account_url(&token, &format!("/envelopes/{envelope_id}")))
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let summary: EnvelopeSummary = response.json().await?;
        Ok(summary.into_response(EnvelopeStatus::Created))
    }

    async fn get_document(
        &self,
        envelope_id: &str,
        document_id: &str,
    ) -> Result<Vec<u8>, DocusignError> {
        let token = self.auth.token().await?;
        let response = self
            .http
            .get(account_url(
                &token,
                &format!("/envelopes/{envelope_id}/documents/{document_id}"),
            ))
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let bytes = response.bytes().await?;
        info!(envelope_id = %envelope_id, document_id = %document_id, bytes = bytes.len(), "Downloaded document");
        Ok(bytes.to_vec())
    }

    async fn update_envelope(
        &self,
        envelope_id: &str,
        update: &EnvelopeUpdate,
    ) -> Result<EnvelopeResponse, DocusignError> {
        let token = self.auth.token().await?;
        let response = self
            .http
            .put(account_url(&token, &format!("/envelopes/{envelope_id}")))
            .bearer_auth(&token.access_token)
            .json(update)
            .send()
            .await?;
        let response = Self::check(response).await?;

        // The update response is sparse; fall back to the state we asked for.
        let summary: EnvelopeSummary = response.json().await?;
        let default_status =
            EnvelopeStatus::parse(&update.status).unwrap_or(EnvelopeStatus::Voided);
        let mut envelope = summary.into_response(default_status);
        if envelope.envelope_id.is_empty() {
            envelope.envelope_id = envelope_id.to_string();
        }
        info!(envelope_id = %envelope.envelope_id, status = %envelope.status, "Updated envelope");
        Ok(envelope)
    }

    async fn create_template(
        &self,
        template: &TemplateDefinition,
    ) -> Result<TemplateInfo, DocusignError> {
        let token = self.auth.token().await?;
        let response = self
            .http
            .post(account_url(&token, "/templates"))
            .bearer_auth(&token.access_token)
            .json(template)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let summary: TemplateSummary = response.json().await?;
        let template_id = summary.template_id.ok_or_else(|| DocusignError::Remote {
            status: 200,
            body: "template response carried no template id".to_string(),
        })?;

        info!(template_id = %template_id, name = %template.name, "Created template");
        // The create response omits the description; keep the one we sent.
        Ok(TemplateInfo {
            template_id,
            name: summary.name.unwrap_or_else(|| template.name.clone()),
            description: template.description.clone(),
            uri: summary.uri,
        })
    }

    async fn get_template(&self, template_id: &str) -> Result<TemplateInfo, DocusignError> {
        let token = self.auth.token().await?;
        let response = self
            .http
            .get(account_url(&token, &format!("/templates/{template_id}")))
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let summary: TemplateSummary = response.json().await?;
        Ok(TemplateInfo {
            template_id: summary.template_id.unwrap_or_else(|| template_id.to_string()),
            name: summary.name.unwrap_or_default(),
            description: summary.description,
            uri: summary.uri,
        })
    }

    async fn list_templates(
        &self,
        search_text: Option<&str>,
    ) -> Result<Vec<TemplateInfo>, DocusignError> {
        let token = self.auth.token().await?;
        let mut request = self
            .http
            .get(account_url(&token, "/templates"))
            .bearer_auth(&token.access_token);
        if let Some(text) = search_text {
            request = request.query(&[("search_text", text)]);
        }

        let response = request.send().await?;
        let response = Self::check(response).await?;

        let list: TemplateList = response.json().await?;
        Ok(list
            .envelope_templates
            .into_iter()
            .filter_map(|summary| {
                summary.template_id.map(|template_id| TemplateInfo {
                    template_id,
                    name: summary.name.unwrap_or_default(),
                    description: summary.description,
                    uri: summary.uri,
                })
            })
            .collect())
    }

    async fn delete_template(&self, template_id: &str) -> Result<(), DocusignError> {
        let token = self.auth.token().await?;
        let response = self
            .http
            .delete(account_url(&token, &format!("/templates/{template_id}")))
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        Self::check(response).await?;

        info!(template_id = %template_id, "Deleted template");
        Ok(())
    }

    async fn update_template_document(
        &self,
        template_id: &str,
        document: &DocumentDefinition,
    ) -> Result<(), DocusignError> {
        let token = self.auth.token().await?;
        let body = TemplateDocumentsUpdate {
            documents: [document],
        };

        let response = self
            .http
            .put(account_url(
                &token,
                &format!("/templates/{template_id}/documents"),
            ))
            .bearer_auth(&token.access_token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;

        info!(template_id = %template_id, document = %document.name, "Replaced template document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_anchor_tabs_serialize_offsets_as_strings() {
        let tab = TabSpec::from_placement(&TabPlacement::signature_default()).unwrap();
        let json = serde_json::to_value(&tab).unwrap();

        assert_eq!(json["anchorString"], "/sn1/");
        assert_eq!(json["anchorUnits"], "pixels");
        assert_eq!(json["anchorXOffset"], "20");
        assert_eq!(json["anchorYOffset"], "10");
        assert!(json.get("pageNumber").is_none());
    }

    #[test]
    fn test_fixed_tabs_serialize_coordinates_as_strings() {
        let placement = TabPlacement::Fixed { page: 2, x: 100, y: 250 };
        let tab = TabSpec::from_placement(&placement).unwrap();
        let json = serde_json::to_value(&tab).unwrap();

        assert_eq!(json["pageNumber"], "2");
        assert_eq!(json["xPosition"], "100");
        assert_eq!(json["yPosition"], "250");
        assert!(json.get("anchorString").is_none());
    }

    #[test]
    fn test_free_form_placement_has_no_tabs() {
        assert_eq!(TabSpec::from_placement(&TabPlacement::FreeForm), None);
        assert_eq!(
            build_tabs(&TabPlacement::FreeForm, &TabPlacement::FreeForm),
            None
        );
    }

    #[test]
    fn test_build_tabs_mixed_placement() {
        let tabs = build_tabs(
            &TabPlacement::signature_default(),
            &TabPlacement::FreeForm,
        )
        .unwrap();
        assert_eq!(tabs.sign_here_tabs.len(), 1);
        assert!(tabs.date_signed_tabs.is_empty());
    }

    #[test]
    fn test_group_recipient_serialization() {
        let recipient = RecipientDefinition {
            signing_group_id: Some("12345".to_string()),
            recipient_id: "1".to_string(),
            routing_order: "1".to_string(),
            tabs: build_tabs(
                &TabPlacement::signature_default(),
                &TabPlacement::date_signed_default(),
            ),
            ..RecipientDefinition::default()
        };
        let json = serde_json::to_value(&recipient).unwrap();

        assert_eq!(json["signingGroupId"], "12345");
        assert_eq!(json["recipientId"], "1");
        assert_eq!(json["routingOrder"], "1");
        // Group recipients carry no individual identity.
        assert!(json.get("email").is_none());
        assert!(json.get("name").is_none());
        assert_eq!(json["tabs"]["signHereTabs"][0]["anchorXOffset"], "20");
        assert_eq!(json["tabs"]["dateSignedTabs"][0]["anchorXOffset"], "120");
    }

    #[test]
    fn test_event_notification_booleans_are_strings() {
        let config = NotificationConfig::new("https://example.com/webhook/docusign");
        let notification = EventNotificationSpec::from_config(&config);
        let json = serde_json::to_value(&notification).unwrap();

        assert_eq!(json["loggingEnabled"], "true");
        assert_eq!(json["requireAcknowledgment"], "true");
        assert_eq!(json["includeDocuments"], "false");
        assert_eq!(
            json["envelopeEvents"][0]["envelopeEventStatusCode"],
            "completed"
        );
        assert_eq!(json["envelopeEvents"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_signing_group_create_body() {
        let signers = vec![
            Signer::new("Alice", "alice@example.com"),
            Signer::new("Bob", "bob@example.com"),
        ];
        let body = SigningGroupCreateBody {
            groups: [SigningGroupCreate {
                group_name: "Legal Team_ab12cd34",
                group_type: SHARED_SIGNING_GROUP,
                users: signers
                    .iter()
                    .map(|s| SigningGroupUser {
                        user_name: &s.name,
                        email: &s.email,
                    })
                    .collect(),
            }],
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["groups"][0]["groupType"], "sharedSigningGroup");
        assert_eq!(json["groups"][0]["users"][0]["userName"], "Alice");
        assert_eq!(json["groups"][0]["users"][1]["email"], "bob@example.com");
    }

    #[test]
    fn test_envelope_summary_accepts_both_datetime_keys() {
        let created: EnvelopeSummary = serde_json::from_value(json!({
            "envelopeId": "env-1",
            "status": "sent",
            "statusDateTime": "2025-06-01T12:00:00Z",
        }))
        .unwrap();
        let response = created.into_response(EnvelopeStatus::Sent);
        assert!(response.status_datetime.is_some());

        let fetched: EnvelopeSummary = serde_json::from_value(json!({
            "envelopeId": "env-1",
            "status": "completed",
            "statusChangedDateTime": "2025-06-02T09:30:00Z",
        }))
        .unwrap();
        let response = fetched.into_response(EnvelopeStatus::Created);
        assert_eq!(response.status, EnvelopeStatus::Completed);
        assert!(response.status_datetime.is_some());
    }

    #[test]
    fn test_envelope_summary_tolerates_sparse_update_response() {
        let summary: EnvelopeSummary = serde_json::from_value(json!({})).unwrap();
        let response = summary.into_response(EnvelopeStatus::Voided);

        assert_eq!(response.envelope_id, "");
        assert_eq!(response.status, EnvelopeStatus::Voided);
        assert_eq!(response.status_datetime, None);
    }

    #[test]
    fn test_envelope_summary_malformed_datetime_is_none() {
        let summary: EnvelopeSummary = serde_json::from_value(json!({
            "envelopeId": "env-1",
            "status": "sent",
            "statusDateTime": "last tuesday",
        }))
        .unwrap();
        let response = summary.into_response(EnvelopeStatus::Sent);
        assert_eq!(response.status_datetime, None);
    }

    #[test]
    fn test_template_envelope_definition() {
        let definition = EnvelopeDefinition {
            template_id: Some("tpl-1".to_string()),
            template_roles: vec![TemplateRoleSpec {
                signing_group_id: Some("sg-1".to_string()),
                role_name: "signer".to_string(),
                ..TemplateRoleSpec::default()
            }],
            status: "sent".to_string(),
            ..EnvelopeDefinition::default()
        };
        let json = serde_json::to_value(&definition).unwrap();

        assert_eq!(json["templateId"], "tpl-1");
        assert_eq!(json["templateRoles"][0]["roleName"], "signer");
        assert_eq!(json["templateRoles"][0]["signingGroupId"], "sg-1");
        assert!(json.get("documents").is_none());
        assert!(json.get("recipients").is_none());
    }

    #[test]
    fn test_template_list_parse() {
        let list: TemplateList = serde_json::from_value(json!({
            "envelopeTemplates": [
                {"templateId": "tpl-1", "name": "Standard NDA", "uri": "/templates/tpl-1"},
                {"name": "missing id, skipped by caller"},
            ]
        }))
        .unwrap();
        assert_eq!(list.envelope_templates.len(), 2);
        assert_eq!(
            list.envelope_templates[0].template_id.as_deref(),
            Some("tpl-1")
        );

        let empty: TemplateList = serde_json::from_value(json!({})).unwrap();
        assert!(empty.envelope_templates.is_empty());
    }
}
