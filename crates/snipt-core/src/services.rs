//! Collaborators the expansion core talks to.
//!
//! Storage, messaging, notification and clipboard live outside the core;
//! these traits are the seams. Implementations are injected once per
//! attachment and shared by reference.

use crate::error::Result;
use crate::models::{Notification, Snippet, UsageReport};
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves a normalized shortcut to its snippet. Must be side-effect free.
#[async_trait]
pub trait SnippetLookup: Send + Sync {
    async fn find_by_shortcut(&self, shortcut: &str) -> Result<Option<Snippet>>;
}

/// Receives a report after every completed expansion
#[async_trait]
pub trait UsageReporter: Send + Sync {
    async fn report_usage(&self, report: UsageReport) -> Result<()>;
}

/// Fire-and-forget toast display
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Asks the user for variable values of a dynamic snippet.
/// `None` means the user dismissed the prompt.
#[async_trait]
pub trait ValuePrompt: Send + Sync {
    async fn request_values(&self, snippet: &Snippet) -> Option<HashMap<String, String>>;
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        tracing::info!(
            title = %notification.title,
            severity = ?notification.severity,
            "{}",
            notification.message
        );
    }
}

/// Usage reporter that drops reports
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUsageTracking;

#[async_trait]
impl UsageReporter for NoUsageTracking {
    async fn report_usage(&self, report: UsageReport) -> Result<()> {
        tracing::trace!(snippet_id = %report.snippet_id, "usage report dropped");
        Ok(())
    }
}
