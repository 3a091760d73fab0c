//! Request/response messaging between the page-side agent and the context
//! that owns storage.

use crate::error::{Result, SniptError};
use crate::models::{Snippet, UsageReport};
use crate::services::{SnippetLookup, UsageReporter};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

pub enum RuntimeRequest {
    GetSnippet {
        shortcut: String,
        reply: oneshot::Sender<Result<Option<Snippet>>>,
    },
    TrackUsage {
        report: UsageReport,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Page-side handle; cheap to clone
#[derive(Debug, Clone)]
pub struct ChannelClient {
    sender: mpsc::Sender<RuntimeRequest>,
}

/// Create a connected client and the receiver the owning context serves
pub fn channel(capacity: usize) -> (ChannelClient, mpsc::Receiver<RuntimeRequest>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (ChannelClient { sender }, receiver)
}

impl ChannelClient {
    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> RuntimeRequest,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| SniptError::Messaging("receiving end is closed".to_string()))?;
        response
            .await
            .map_err(|_| SniptError::Messaging("request dropped without a response".to_string()))?
    }
}

#[async_trait]
impl SnippetLookup for ChannelClient {
    async fn find_by_shortcut(&self, shortcut: &str) -> Result<Option<Snippet>> {
        let shortcut = shortcut.to_ascii_lowercase();
        self.call(|reply| RuntimeRequest::GetSnippet { shortcut, reply })
            .await
    }
}

#[async_trait]
impl UsageReporter for ChannelClient {
    async fn report_usage(&self, report: UsageReport) -> Result<()> {
        self.call(|reply| RuntimeRequest::TrackUsage { report, reply })
            .await
    }
}

/// Answer requests until every client is dropped
pub async fn serve_requests<S>(store: Arc<S>, mut receiver: mpsc::Receiver<RuntimeRequest>)
where
    S: SnippetLookup + UsageReporter + ?Sized,
{
    tracing::debug!("message server started");

    while let Some(request) = receiver.recv().await {
        match request {
            RuntimeRequest::GetSnippet { shortcut, reply } => {
                let result = store.find_by_shortcut(&shortcut).await;
                if reply.send(result).is_err() {
                    tracing::debug!(%shortcut, "lookup caller went away");
                }
            }
            RuntimeRequest::TrackUsage { report, reply } => {
                let result = store.report_usage(report).await;
                if reply.send(result).is_err() {
                    tracing::debug!("usage caller went away");
                }
            }
        }
    }

    tracing::debug!("message server stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SurfaceSummary;
    use crate::storage::MemorySnippetStore;
    use chrono::Utc;
    use std::collections::HashMap;

    #[tokio::test]
    async fn round_trip_through_channel() {
        let snippet = Snippet::new("thanks", "Thank you.");
        let store = Arc::new(MemorySnippetStore::from_snippets(vec![snippet.clone()]).unwrap());
        let (client, receiver) = channel(8);
        let server = tokio::spawn(serve_requests(Arc::clone(&store), receiver));

        let found = client.find_by_shortcut("Thanks").await.unwrap();
        assert_eq!(found.map(|s| s.id), Some(snippet.id.clone()));

        client
            .report_usage(UsageReport {
                snippet_id: snippet.id.clone(),
                shortcut: snippet.shortcut.clone(),
                surface: SurfaceSummary::default(),
                variables: HashMap::new(),
                strategy: "direct".to_string(),
                expanded_at: Utc::now(),
            })
            .await
            .unwrap();
        assert_eq!(store.get("thanks").unwrap().usage_count, 1);

        drop(client);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn closed_channel_is_a_messaging_error() {
        let (client, receiver) = channel(1);
        drop(receiver);
        assert!(matches!(
            client.find_by_shortcut("x").await,
            Err(SniptError::Messaging(_))
        ));
    }
}
