use crate::error::{Result, SniptError};
use crate::models::{validate_shortcut, Snippet, UsageReport};
use crate::services::{SnippetLookup, UsageReporter};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Load all snippets from a JSON file
pub fn load_snippets_from(path: &Path) -> Result<Vec<Snippet>> {
    if !path.exists() {
        return Err(SniptError::StoreNotFound(path.to_string_lossy().to_string()));
    }

    let content = fs::read_to_string(path)?;

    // Handle empty snippets file
    if content.trim().is_empty() {
        return Ok(vec![]);
    }

    serde_json::from_str(&content).map_err(|e| e.into())
}

/// Save snippets to a JSON file
pub fn save_snippets_to(path: &Path, snippets: &[Snippet]) -> Result<()> {
    let serialized = serde_json::to_string_pretty(&snippets)?;
    fs::write(path, serialized)?;
    Ok(())
}

/// In-memory snippet map keyed by normalized shortcut.
///
/// Stands in for the extension's key-value storage: serves lookups and
/// counts usage. Disabled snippets are kept but never returned by lookup.
#[derive(Debug, Default)]
pub struct MemorySnippetStore {
    snippets: RwLock<BTreeMap<String, Snippet>>,
    path: Option<PathBuf>,
}

impl MemorySnippetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from snippets, rejecting invalid or duplicate shortcuts
    pub fn from_snippets(snippets: Vec<Snippet>) -> Result<Self> {
        let store = Self::new();
        for snippet in snippets {
            store.insert(snippet)?;
        }
        Ok(store)
    }

    /// Load a store backed by a JSON file; usage updates are written back
    pub fn open(path: &Path) -> Result<Self> {
        let mut store = Self::from_snippets(load_snippets_from(path)?)?;
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    pub fn insert(&self, mut snippet: Snippet) -> Result<()> {
        let shortcut = validate_shortcut(&snippet.shortcut)?;
        let mut snippets = self.snippets.write();
        if snippets.contains_key(&shortcut) {
            return Err(SniptError::DuplicateShortcut(shortcut));
        }
        snippet.shortcut = shortcut.clone();
        snippets.insert(shortcut, snippet);
        Ok(())
    }

    pub fn get(&self, shortcut: &str) -> Option<Snippet> {
        self.snippets.read().get(&shortcut.to_ascii_lowercase()).cloned()
    }

    pub fn snippets(&self) -> Vec<Snippet> {
        self.snippets.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snippets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.read().is_empty()
    }

    fn persist(&self) -> Result<()> {
        if let Some(path) = &self.path {
            save_snippets_to(path, &self.snippets())?;
        }
        Ok(())
    }
}

#[async_trait]
impl SnippetLookup for MemorySnippetStore {
    async fn find_by_shortcut(&self, shortcut: &str) -> Result<Option<Snippet>> {
        Ok(self.get(shortcut).filter(|snippet| snippet.enabled))
    }
}

#[async_trait]
impl UsageReporter for MemorySnippetStore {
    async fn report_usage(&self, report: UsageReport) -> Result<()> {
        {
            let mut snippets = self.snippets.write();
            let snippet = snippets
                .values_mut()
                .find(|snippet| snippet.id == report.snippet_id)
                .ok_or_else(|| SniptError::SnippetNotFound(report.snippet_id.clone()))?;
            snippet.record_usage();
        }
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SNIPPETS_FILENAME;
    use crate::models::SurfaceSummary;
    use chrono::Utc;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn report_for(snippet: &Snippet) -> UsageReport {
        UsageReport {
            snippet_id: snippet.id.clone(),
            shortcut: snippet.shortcut.clone(),
            surface: SurfaceSummary::default(),
            variables: HashMap::new(),
            strategy: "direct".to_string(),
            expanded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive_and_skips_disabled() {
        let mut off = Snippet::new("off", "never");
        off.enabled = false;
        let store =
            MemorySnippetStore::from_snippets(vec![Snippet::new("Hello", "Hello, World!"), off]).unwrap();

        let found = store.find_by_shortcut("HELLO").await.unwrap().unwrap();
        assert_eq!(found.content, "Hello, World!");
        assert!(store.find_by_shortcut("off").await.unwrap().is_none());
        assert!(store.find_by_shortcut("missing").await.unwrap().is_none());
    }

    #[test]
    fn duplicate_and_invalid_shortcuts_are_rejected() {
        let store = MemorySnippetStore::new();
        store.insert(Snippet::new("sig", "a")).unwrap();
        assert!(matches!(
            store.insert(Snippet::new("SIG", "b")),
            Err(SniptError::DuplicateShortcut(_))
        ));
        assert!(matches!(
            store.insert(Snippet::new("9x", "b")),
            Err(SniptError::InvalidShortcut { .. })
        ));
    }

    #[tokio::test]
    async fn usage_is_counted_and_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SNIPPETS_FILENAME);
        let snippet = Snippet::new("addr", "1 Main St");
        save_snippets_to(&path, &[snippet.clone()]).unwrap();

        let store = MemorySnippetStore::open(&path).unwrap();
        store.report_usage(report_for(&snippet)).await.unwrap();
        store.report_usage(report_for(&snippet)).await.unwrap();

        let reloaded = load_snippets_from(&path).unwrap();
        assert_eq!(reloaded[0].usage_count, 2);
    }

    #[tokio::test]
    async fn usage_for_unknown_snippet_fails() {
        let store = MemorySnippetStore::new();
        let ghost = Snippet::new("ghost", "boo");
        assert!(matches!(
            store.report_usage(report_for(&ghost)).await,
            Err(SniptError::SnippetNotFound(_))
        ));
    }

    #[test]
    fn empty_file_loads_as_no_snippets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SNIPPETS_FILENAME);
        fs::write(&path, "").unwrap();
        assert!(load_snippets_from(&path).unwrap().is_empty());
        assert!(matches!(
            load_snippets_from(&dir.path().join("missing.json")),
            Err(SniptError::StoreNotFound(_))
        ));
    }
}
