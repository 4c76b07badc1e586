//! DocuSign Connect webhook pipeline
//!
//! An inbound delivery passes through three stages:
//!
//! ```text
//! raw body ──► SignatureVerifier ──► WebhookEvent ──► WebhookService
//!              (HMAC over bytes)     (parse+classify)  (hooks, artifacts)
//! ```
//!
//! Verification runs over the raw bytes, parsing tolerates both payload
//! shapes Connect emits, and handling acknowledges every classifiable
//! event so DocuSign stops redelivering it.

pub mod event;
pub mod handler;
pub mod verify;

pub use event::{is_xml_payload, RecipientStatus, WebhookEvent};
pub use handler::{EnvelopeHooks, WebhookResult, WebhookService};
pub use verify::SignatureVerifier;
