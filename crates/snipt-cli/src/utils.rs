use snipt_core::{Result, Settings};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` when set
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // a second init (tests driving several commands) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Settings from `path`, or from the default settings file
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };
    settings.validate()?;
    Ok(settings)
}

/// Parse a `name=value` pair
pub fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

/// Cursor offset, defaulting to the end of `text` and clamped to it
pub fn cursor_or_end(text: &str, cursor: Option<usize>) -> usize {
    let len = text.chars().count();
    cursor.map_or(len, |cursor| cursor.min(len))
}
