//! Error types for the DocuSign integration

use thiserror::Error;

use crate::types::ValidationError;

/// DocuSign operation errors
#[derive(Debug, Error)]
pub enum DocusignError {
    /// JWT grant or user-info lookup failed.
    ///
    /// `consent_required` is set when the impersonated user has not yet
    /// granted consent for this integration key; callers should surface
    /// [`DocusignConfig::consent_url`](crate::DocusignConfig::consent_url)
    /// instead of retrying.
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        consent_required: bool,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The eSignature API answered with a non-success status.
    #[error("DocuSign API error ({status}): {body}")]
    Remote { status: u16, body: String },

    /// Connection or timeout failure with no HTTP response to report.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A signed document was requested before the envelope completed.
    #[error("Envelope {envelope_id} is not completed yet")]
    NotReady { envelope_id: String },

    #[error("Failed to parse webhook payload: {0}")]
    Parse(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,
}

impl DocusignError {
    /// True when authentication failed because consent has not been granted.
    pub fn is_consent_required(&self) -> bool {
        matches!(
            self,
            DocusignError::Authentication {
                consent_required: true,
                ..
            }
        )
    }
}
