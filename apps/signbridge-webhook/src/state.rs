//! Application state
//!
//! Wires the DocuSign services together and keeps a bounded in-memory log
//! of recent deliveries for the operator endpoints. Signed documents are
//! archived to disk by [`ArchiveHooks`] as completion events arrive.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use signbridge_core::{
    DocusignAuth, DocusignClient, DocusignConfig, EnvelopeHooks, SignatureVerifier,
    SigningPlatform, WebhookEvent, WebhookService,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// How many deliveries the in-memory log retains
const DELIVERY_LOG_CAPACITY: usize = 100;

pub struct AppState {
    pub webhooks: WebhookService,
    pub log: DeliveryLog,
}

impl AppState {
    /// Production wiring from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = DocusignConfig::from_env();
        let auth = Arc::new(DocusignAuth::new(config)?);
        let platform: Arc<dyn SigningPlatform> = Arc::new(DocusignClient::new(auth)?);

        let verifier = match std::env::var("DOCUSIGN_HMAC_KEY") {
            Ok(key) if !key.is_empty() => SignatureVerifier::new(&key),
            _ => {
                warn!("DOCUSIGN_HMAC_KEY not set; webhook signatures will not be verified");
                SignatureVerifier::disabled()
            }
        };

        let output_dir = std::env::var("WEBHOOK_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("webhook_output"));
        let hooks = Arc::new(ArchiveHooks::new(output_dir));

        let webhooks = WebhookService::new(platform, verifier).with_hooks(hooks);
        Ok(Self::with_service(webhooks))
    }

    pub fn with_service(webhooks: WebhookService) -> Self {
        Self {
            webhooks,
            log: DeliveryLog::new(DELIVERY_LOG_CAPACITY),
        }
    }
}

/// What kind of delivery a log entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
    /// A JSON notification that went through the pipeline
    Event,
    /// An XML payload, quarantined rather than processed
    Xml,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    pub seq: u64,
    pub received_at: DateTime<Utc>,
    pub kind: DeliveryKind,
    pub envelope_id: Option<String>,
    pub event: Option<String>,
    pub message: String,
    /// Raw payload as received (XML bodies are wrapped in `{"rawXml": ...}`)
    pub payload: Value,
}

/// Bounded ring of recent deliveries; oldest entries fall off
pub struct DeliveryLog {
    entries: RwLock<VecDeque<DeliveryRecord>>,
    capacity: usize,
    next_seq: AtomicU64,
}

impl DeliveryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            next_seq: AtomicU64::new(1),
        }
    }

    pub async fn record(
        &self,
        kind: DeliveryKind,
        envelope_id: Option<String>,
        event: Option<String>,
        message: String,
        payload: Value,
    ) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let record = DeliveryRecord {
            seq,
            received_at: Utc::now(),
            kind,
            envelope_id,
            event,
            message,
            payload,
        };

        let mut entries = self.entries.write().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(record);
        seq
    }

    /// Most recent deliveries, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<DeliveryRecord> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub async fn get(&self, seq: u64) -> Option<DeliveryRecord> {
        let entries = self.entries.read().await;
        entries.iter().find(|record| record.seq == seq).cloned()
    }
}

/// Writes each completed envelope's signed PDF into the output directory
pub struct ArchiveHooks {
    output_dir: PathBuf,
}

impl ArchiveHooks {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

#[async_trait]
impl EnvelopeHooks for ArchiveHooks {
    async fn on_completed(&self, event: &WebhookEvent, signed_pdf: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let short_id: String = event.envelope_id.chars().take(8).collect();
        let filename = format!(
            "signed_{}_{}.pdf",
            short_id,
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let path = self.output_dir.join(filename);
        tokio::fs::write(&path, signed_pdf).await?;

        info!(path = %path.display(), bytes = signed_pdf.len(), "Archived signed document");
        Ok(())
    }

    async fn on_declined(&self, event: &WebhookEvent) -> Result<()> {
        warn!(envelope_id = %event.envelope_id, "Envelope declined; nothing to archive");
        Ok(())
    }
}
