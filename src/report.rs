//! Import event reporting.
//!
//! The importer never logs directly: skipped links, save retries and file
//! outcomes are sent to an [`ImportReporter`] chosen by the caller. The
//! default [`TracingReporter`] turns them into `tracing` events;
//! [`JsonReporter`] writes one JSON object per line on **stderr** so stdout
//! stays parseable for scripts.

use std::io::Write;
use std::sync::Mutex;

/// A single event raised while importing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportEvent {
    /// A local image could not be ingested; the original link stays in place.
    LinkSkipped {
        file: String,
        link: String,
        reason: String,
    },
    /// A local image was stored and its link rewritten.
    LinkRewritten {
        file: String,
        link: String,
        reference: String,
    },
    /// The first save failed; the domain is being provisioned before retrying.
    SaveRetry {
        file: String,
        domain: String,
        reason: String,
    },
    /// Provisioning the domain during a retry failed. The second save still runs.
    DomainProvisionFailed { domain: String, reason: String },
    /// A document was persisted.
    Imported { file: String, slug: String },
    /// The import of a file was abandoned.
    Failed { file: String, reason: String },
}

/// Receives events from the import pipeline.
pub trait ImportReporter: Send + Sync {
    fn report(&self, event: ImportEvent);
}

/// Emits every event through `tracing`: link skips and retries at `warn`,
/// failures at `error`, the rest at `info`/`debug`.
pub struct TracingReporter;

impl ImportReporter for TracingReporter {
    fn report(&self, event: ImportEvent) {
        match event {
            ImportEvent::LinkSkipped { file, link, reason } => {
                tracing::warn!(%file, %link, %reason, "link not processed");
            }
            ImportEvent::LinkRewritten {
                file,
                link,
                reference,
            } => {
                tracing::debug!(%file, %link, %reference, "link rewritten");
            }
            ImportEvent::SaveRetry {
                file,
                domain,
                reason,
            } => {
                tracing::warn!(%file, %domain, %reason, "save failed, creating domain with default password");
            }
            ImportEvent::DomainProvisionFailed { domain, reason } => {
                tracing::error!(%domain, %reason, "could not create domain");
            }
            ImportEvent::Imported { file, slug } => {
                tracing::info!(%file, %slug, "imported");
            }
            ImportEvent::Failed { file, reason } => {
                tracing::error!(%file, %reason, "import failed");
            }
        }
    }
}

/// Machine-readable events: one JSON object per line on stderr.
pub struct JsonReporter;

impl JsonReporter {
    fn to_json(event: &ImportEvent) -> serde_json::Value {
        match event {
            ImportEvent::LinkSkipped { file, link, reason } => serde_json::json!({
                "event": "link_skipped",
                "file": file,
                "link": link,
                "reason": reason
            }),
            ImportEvent::LinkRewritten {
                file,
                link,
                reference,
            } => serde_json::json!({
                "event": "link_rewritten",
                "file": file,
                "link": link,
                "reference": reference
            }),
            ImportEvent::SaveRetry {
                file,
                domain,
                reason,
            } => serde_json::json!({
                "event": "save_retry",
                "file": file,
                "domain": domain,
                "reason": reason
            }),
            ImportEvent::DomainProvisionFailed { domain, reason } => serde_json::json!({
                "event": "domain_provision_failed",
                "domain": domain,
                "reason": reason
            }),
            ImportEvent::Imported { file, slug } => serde_json::json!({
                "event": "imported",
                "file": file,
                "slug": slug
            }),
            ImportEvent::Failed { file, reason } => serde_json::json!({
                "event": "failed",
                "file": file,
                "reason": reason
            }),
        }
    }
}

impl ImportReporter for JsonReporter {
    fn report(&self, event: ImportEvent) {
        if let Ok(line) = serde_json::to_string(&Self::to_json(&event)) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when reporting is disabled.
pub struct NoReport;

impl ImportReporter for NoReport {
    fn report(&self, _event: ImportEvent) {}
}

/// Keeps every event in memory, in arrival order.
#[derive(Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<ImportEvent>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ImportEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ImportReporter for CollectingReporter {
    fn report(&self, event: ImportEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

/// Report mode for the CLI: tracing logs, JSON lines, or nothing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReportMode {
    Log,
    Json,
    Off,
}

impl ReportMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "log" => Some(ReportMode::Log),
            "json" => Some(ReportMode::Json),
            "off" => Some(ReportMode::Off),
            _ => None,
        }
    }

    pub fn reporter(&self) -> Box<dyn ImportReporter> {
        match self {
            ReportMode::Log => Box::new(TracingReporter),
            ReportMode::Json => Box::new(JsonReporter),
            ReportMode::Off => Box::new(NoReport),
        }
    }
}
