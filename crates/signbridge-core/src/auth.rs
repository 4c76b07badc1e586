//! JWT grant authentication
//!
//! DocuSign's service-integration flow: sign an RS256 assertion with the
//! integration key's RSA private key, exchange it for a bearer token, then
//! resolve the impersonated user's account id and API base URI from the
//! user-info endpoint. The resulting [`AccessToken`] is cached and refreshed
//! shortly before expiry so callers never hold a stale token.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::DocusignError;
use crate::DocusignConfig;

/// Requested lifetime of each grant, in seconds
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this many minutes before they actually expire
const EXPIRY_MARGIN_MINS: i64 = 5;

const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// A bearer token plus the account routing details resolved alongside it
#[derive(Clone, PartialEq)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    /// Account the impersonated user belongs to
    pub account_id: String,
    /// REST API root for that account, e.g. `https://demo.docusign.net/restapi`
    pub base_uri: String,
}

impl AccessToken {
    /// Expired, or close enough to expiry that it should not be used for a
    /// new request.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at - Duration::minutes(EXPIRY_MARGIN_MINS)
    }
}

// The token itself stays out of logs and debug output.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("account_id", &self.account_id)
            .field("base_uri", &self.base_uri)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GrantClaims {
    iss: String,
    sub: String,
    aud: String,
    iat: i64,
    exp: i64,
    scope: String,
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    TOKEN_LIFETIME_SECS
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    accounts: Vec<UserAccount>,
}

// The OAuth user-info endpoint uses snake_case, unlike the REST API.
#[derive(Debug, Deserialize)]
struct UserAccount {
    account_id: String,
    base_uri: String,
}

/// JWT grant authenticator with a cached access token
pub struct DocusignAuth {
    config: DocusignConfig,
    http: reqwest::Client,
    token: RwLock<Option<AccessToken>>,
}

impl DocusignAuth {
    pub fn new(config: DocusignConfig) -> Result<Self, DocusignError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            config,
            http,
            token: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &DocusignConfig {
        &self.config
    }

    /// Current valid token, refreshing it first if missing or near expiry.
    pub async fn token(&self) -> Result<AccessToken, DocusignError> {
        self.authenticate(false).await
    }

    /// Authenticate, optionally bypassing the cache.
    ///
    /// Readers share the cached token through the fast path. When a refresh
    /// is needed, exactly one caller performs it while the others wait on
    /// the write lock and then reuse its result.
    pub async fn authenticate(&self, force_refresh: bool) -> Result<AccessToken, DocusignError> {
        if !force_refresh {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.clone());
                }
            }
        }

        let mut cached = self.token.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if !force_refresh {
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.clone());
                }
            }
        }

        debug!("Requesting new DocuSign access token");
        let token = self.request_token().await?;
        info!(
            account_id = %token.account_id,
            expires_at = %token.expires_at,
            "Obtained DocuSign access token"
        );
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn request_token(&self) -> Result<AccessToken, DocusignError> {
        let assertion = self.build_assertion().await?;

        let response = self
            .http
            .post(format!("https://{}/oauth/token", self.config.auth_host))
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(token_error(status.as_u16(), &body));
        }

        let grant: TokenGrant = response.json().await?;
        let userinfo = self.fetch_userinfo(&grant.access_token).await?;

        // The impersonated user's default account is listed first.
        let account = userinfo
            .accounts
            .first()
            .ok_or_else(|| DocusignError::Authentication {
                message: "No accounts associated with the impersonated user".to_string(),
                consent_required: false,
            })?;

        Ok(AccessToken {
            access_token: grant.access_token,
            expires_at: Utc::now() + Duration::seconds(grant.expires_in),
            account_id: account.account_id.clone(),
            base_uri: format!("{}/restapi", account.base_uri),
        })
    }

    /// Build the signed JWT assertion for the grant request.
    ///
    /// The key file is re-read on every refresh so a rotated key takes
    /// effect without a restart.
    async fn build_assertion(&self) -> Result<String, DocusignError> {
        let pem = tokio::fs::read(&self.config.private_key_path)
            .await
            .map_err(|e| DocusignError::Authentication {
                message: format!(
                    "Failed to read private key {}: {}",
                    self.config.private_key_path.display(),
                    e
                ),
                consent_required: false,
            })?;

        let key = EncodingKey::from_rsa_pem(&pem).map_err(|e| DocusignError::Authentication {
            message: format!("Invalid RSA private key: {e}"),
            consent_required: false,
        })?;

        let now = Utc::now().timestamp();
        let claims = GrantClaims {
            iss: self.config.client_id.clone(),
            sub: self.config.impersonated_user_id.clone(),
            aud: self.config.auth_host.clone(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
            scope: self.config.scopes.join(" "),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|e| {
            DocusignError::Authentication {
                message: format!("Failed to sign JWT assertion: {e}"),
                consent_required: false,
            }
        })
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<UserInfo, DocusignError> {
        let response = self
            .http
            .get(format!("https://{}/oauth/userinfo", self.config.auth_host))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DocusignError::Authentication {
                message: format!("User info lookup failed ({}): {}", status.as_u16(), body),
                consent_required: false,
            });
        }

        Ok(response.json().await?)
    }
}

/// Map a failed token-endpoint response, detecting the one-time-consent case.
fn token_error(status: u16, body: &str) -> DocusignError {
    DocusignError::Authentication {
        message: format!("Token request failed ({status}): {body}"),
        consent_required: body.contains("consent_required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_in(minutes: i64) -> AccessToken {
        AccessToken {
            access_token: "secret-token".to_string(),
            expires_at: Utc::now() + Duration::minutes(minutes),
            account_id: "acct-1".to_string(),
            base_uri: "https://demo.docusign.net/restapi".to_string(),
        }
    }

    #[test]
    fn test_fresh_token_is_not_expired() {
        assert!(!token_expiring_in(60).is_expired());
    }

    #[test]
    fn test_token_within_margin_is_expired() {
        assert!(token_expiring_in(4).is_expired());
        assert!(token_expiring_in(0).is_expired());
        assert!(token_expiring_in(-10).is_expired());
    }

    #[test]
    fn test_token_just_outside_margin_is_valid() {
        assert!(!token_expiring_in(6).is_expired());
    }

    #[test]
    fn test_consent_required_detection() {
        let err = token_error(400, r#"{"error":"consent_required"}"#);
        assert!(err.is_consent_required());

        let err = token_error(400, r#"{"error":"invalid_grant"}"#);
        assert!(!err.is_consent_required());
    }

    #[test]
    fn test_grant_claims_serialization() {
        let claims = GrantClaims {
            iss: "client-id".to_string(),
            sub: "user-id".to_string(),
            aud: "account-d.docusign.com".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            scope: "signature impersonation".to_string(),
        };

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["iss"], "client-id");
        assert_eq!(json["aud"], "account-d.docusign.com");
        assert_eq!(json["scope"], "signature impersonation");
        assert_eq!(json["exp"].as_i64().unwrap() - json["iat"].as_i64().unwrap(), 3600);
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = token_expiring_in(60);
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_token_grant_defaults_expiry() {
        let grant: TokenGrant =
            serde_json::from_str(r#"{"access_token":"abc","token_type":"Bearer"}"#).unwrap();
        assert_eq!(grant.expires_in, 3600);
    }
}
