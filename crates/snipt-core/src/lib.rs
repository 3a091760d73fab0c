pub mod clipboard;
pub mod config;
pub mod error;
pub mod matcher;
pub mod messaging;
pub mod models;
pub mod services;
pub mod storage;
pub mod variables;

// Re-export common items for convenience
pub use clipboard::{ClipboardPayload, ClipboardProvider, NoClipboard, SystemClipboard};
pub use config::{get_config_dir, Settings, TriggerKey};
pub use error::{Result, SniptError};
pub use matcher::{find_last_occurrence, find_registered_shortcuts, find_shortcut_at_cursor, ShortcutMatch};
pub use models::{
    validate_shortcut, Notification, Severity, Snippet, SurfaceSummary, UsageReport, Variable,
    VariableKind,
};
pub use services::{LogNotifier, NoUsageTracking, Notifier, SnippetLookup, UsageReporter, ValuePrompt};
pub use storage::{load_snippets_from, save_snippets_to, MemorySnippetStore};
pub use variables::{expand, validate_content, BuiltinContext, ContentError};
