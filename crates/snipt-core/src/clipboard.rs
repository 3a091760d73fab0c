use crate::error::{Result, SniptError};
use arboard::Clipboard;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Plain-text plus optional HTML flavour of clipboard data
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClipboardPayload {
    pub text: String,
    pub html: Option<String>,
}

impl ClipboardPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }
}

/// Shared, possibly unavailable clipboard. The user's content is theirs:
/// callers must not assume exclusive ownership.
#[async_trait]
pub trait ClipboardProvider: Send + Sync {
    async fn read_text(&self) -> Result<String>;
    async fn write(&self, payload: &ClipboardPayload) -> Result<()>;
}

/// The operating system clipboard
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[async_trait]
impl ClipboardProvider for SystemClipboard {
    async fn read_text(&self) -> Result<String> {
        get_clipboard_text()
    }

    async fn write(&self, payload: &ClipboardPayload) -> Result<()> {
        let mut clipboard = Clipboard::new().map_err(|e| SniptError::Clipboard(e.to_string()))?;
        match &payload.html {
            Some(html) => clipboard
                .set_html(html.as_str(), Some(payload.text.as_str()))
                .map_err(|e| SniptError::Clipboard(e.to_string())),
            None => clipboard
                .set_text(payload.text.as_str())
                .map_err(|e| SniptError::Clipboard(e.to_string())),
        }
    }
}

/// A clipboard that is never available
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClipboard;

#[async_trait]
impl ClipboardProvider for NoClipboard {
    async fn read_text(&self) -> Result<String> {
        Err(SniptError::Clipboard("clipboard unavailable".to_string()))
    }

    async fn write(&self, _payload: &ClipboardPayload) -> Result<()> {
        Err(SniptError::Clipboard("clipboard unavailable".to_string()))
    }
}

/// Get the current clipboard content as text
pub fn get_clipboard_text() -> Result<String> {
    let mut clipboard = Clipboard::new().map_err(|e| SniptError::Clipboard(e.to_string()))?;
    clipboard
        .get_text()
        .map_err(|e| SniptError::Clipboard(e.to_string()))
}

/// Read the clipboard for a `{clipboard}` placeholder, degrading to `None`
pub async fn read_for_expansion(provider: &dyn ClipboardProvider) -> Option<String> {
    match provider.read_text().await {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(error = %e, "clipboard read failed, substituting empty text");
            None
        }
    }
}
