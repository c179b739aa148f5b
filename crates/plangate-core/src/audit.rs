use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::plan::{Ceiling, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitAction {
    Allow,
    Block,
}

/// One limit decision, as written to the audit sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitEvent {
    pub tenant_id: String,
    pub plan: String,
    pub resource_kind: ResourceKind,
    pub used: u64,
    pub limit: Ceiling,
    pub action: LimitAction,
}

#[derive(Serialize)]
struct LimitEventLine<'a> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a LimitEvent,
}

/// Append-only destination for limit events.
#[async_trait]
pub trait LimitEventSink: Send + Sync + 'static {
    async fn append(&self, event: &LimitEvent) -> anyhow::Result<()>;
}

/// Writes one JSON object per line to a local file.
pub struct JsonLinesEventSink {
    path: PathBuf,
    // Serialises appends so concurrent lines never interleave.
    write_lock: Mutex<()>,
}

impl JsonLinesEventSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl LimitEventSink for JsonLinesEventSink {
    async fn append(&self, event: &LimitEvent) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(&LimitEventLine {
            timestamp: Utc::now(),
            event,
        })?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Keeps events in memory. Handy for tests and embedding.
#[derive(Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<LimitEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<LimitEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl LimitEventSink for MemoryEventSink {
    async fn append(&self, event: &LimitEvent) -> anyhow::Result<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

/// Best-effort logger for allow/block decisions.
///
/// Sink failures are reported through `tracing` and never reach the caller.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Option<Arc<dyn LimitEventSink>>,
}

impl AuditLogger {
    pub fn new(enabled: bool, sink: Arc<dyn LimitEventSink>) -> Self {
        Self {
            sink: enabled.then_some(sink),
        }
    }

    pub async fn log_limit_event(&self, event: LimitEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.append(&event).await {
            tracing::warn!(
                tenant_id = %event.tenant_id,
                resource = %event.resource_kind,
                action = ?event.action,
                error = %e,
                "Failed to write limit audit event"
            );
        }
    }
}
