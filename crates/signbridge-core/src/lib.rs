//! DocuSign eSignature integration: JWT-grant auth, signing-group envelope
//! orchestration, and Connect webhook processing.
//!
//! The crate is built around one recurring workflow: send a document to
//! several candidate signers where any single signature completes the
//! transaction, then react to the status notifications DocuSign delivers
//! asynchronously.
//!
//! ## Capabilities
//!
//! 1. **JWT grant authentication** - RS256 impersonation assertion, cached
//!    access token with proactive refresh, one-time consent URL surfacing
//! 2. **Signing-group envelopes** - a temporary shared group fans the
//!    request out to N people while one signature satisfies it; the group
//!    is created and deleted around every send
//! 3. **Single-signer envelopes** - the plain one-recipient send
//! 4. **Templates** - reusable document and role definitions, with both
//!    single-signer and signing-group sends
//! 5. **Connect webhooks** - HMAC verification, shape-tolerant parsing,
//!    event classification, signed-document retrieval, lifecycle hooks
//!
//! ## Architecture
//!
//! ```text
//! EnvelopeService ──►╮
//!                    ├─ SigningPlatform ──► eSignature REST v2.1
//! TemplateService ──►╯   (DocusignClient)
//!                              ▲
//!                              │ Bearer token
//!                        DocusignAuth (JWT grant, cached)
//!
//! DocuSign Connect ──► SignatureVerifier ──► WebhookEvent ──► WebhookService
//!                                                                  │
//!                                                          EnvelopeHooks (yours)
//! ```

use std::path::PathBuf;
use std::time::Duration;

pub mod auth;
pub mod client;
pub mod envelope;
pub mod error;
pub mod template;
pub mod types;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AccessToken, DocusignAuth};
pub use client::{DocusignClient, SigningPlatform};
pub use envelope::EnvelopeService;
pub use error::DocusignError;
pub use template::{TemplateSendOptions, TemplateService};
pub use types::{
    EnvelopeRequest, EnvelopeResponse, EnvelopeStatus, NotificationConfig, Signer, SigningGroup,
    TabPlacement, TemplateInfo, TemplateRequest, ValidationError,
};
pub use webhook::{
    is_xml_payload, EnvelopeHooks, RecipientStatus, SignatureVerifier, WebhookEvent,
    WebhookResult, WebhookService,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where users are sent to grant one-time consent for impersonation
const CONSENT_REDIRECT_URI: &str = "https://developers.docusign.com/platform/auth/consent";

/// Connection settings for one DocuSign integration key
#[derive(Debug, Clone)]
pub struct DocusignConfig {
    /// Integration key (OAuth client id)
    pub client_id: String,
    /// User the JWT grant impersonates
    pub impersonated_user_id: String,
    /// PEM-encoded RSA private key registered with the integration key
    pub private_key_path: PathBuf,
    /// OAuth host; `account-d.docusign.com` is the demo environment,
    /// `account.docusign.com` is production
    pub auth_host: String,
    /// Scopes requested with each grant
    pub scopes: Vec<String>,
    /// Bound on every HTTP request to DocuSign
    pub request_timeout: Duration,
}

impl Default for DocusignConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            impersonated_user_id: String::new(),
            private_key_path: PathBuf::from("private.key"),
            auth_host: "account-d.docusign.com".to_string(),
            scopes: vec!["signature".to_string(), "impersonation".to_string()],
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl DocusignConfig {
    /// Load configuration from environment variables, falling back to the
    /// demo-environment defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            client_id: std::env::var("DOCUSIGN_CLIENT_ID").unwrap_or(defaults.client_id),
            impersonated_user_id: std::env::var("DOCUSIGN_USER_ID")
                .unwrap_or(defaults.impersonated_user_id),
            private_key_path: std::env::var("DOCUSIGN_PRIVATE_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.private_key_path),
            auth_host: std::env::var("DOCUSIGN_AUTH_HOST").unwrap_or(defaults.auth_host),
            scopes: defaults.scopes,
            request_timeout: std::env::var("DOCUSIGN_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }

    /// URL an operator must visit once per integration key and user to
    /// grant impersonation consent. Authentication failures with
    /// [`DocusignError::is_consent_required`] set point here.
    pub fn consent_url(&self) -> String {
        format!(
            "https://{}/oauth/auth?response_type=code&scope={}&client_id={}&redirect_uri={}",
            self.auth_host,
            self.scopes.join("+"),
            self.client_id,
            CONSENT_REDIRECT_URI,
        )
    }
}
