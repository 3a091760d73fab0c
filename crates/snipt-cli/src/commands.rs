use crate::cli::{Commands, GlobalOpts};
use crate::utils::{cursor_or_end, load_settings};
use async_trait::async_trait;
use snipt_core::config::{ensure_config_dir, get_snippets_file_path};
use snipt_core::models::Snippet;
use snipt_core::services::ValuePrompt;
use snipt_core::storage::load_snippets_from;
use snipt_core::{find_shortcut_at_cursor, MemorySnippetStore, Result, Settings, SniptError, SystemClipboard};
use snipt_dom::Document;
use snipt_engine::{CheckOutcome, Orchestrator};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn handle_command(command: Commands, global: &GlobalOpts) -> Result<()> {
    match command {
        Commands::Match { text, cursor } => handle_match(&text, cursor),
        Commands::Expand {
            text,
            snippets,
            cursor,
            vars,
        } => {
            let settings = load_settings(global.settings.as_deref())?;
            handle_expand(settings, &snippets_path(snippets), &text, cursor, vars)
        }
        Commands::Validate { snippets } => handle_validate(&snippets_path(snippets)),
        Commands::Init => {
            let dir = ensure_config_dir()?;
            println!("Configuration directory ready at {}", dir.display());
            Ok(())
        }
    }
}

fn snippets_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(get_snippets_file_path)
}

fn handle_match(text: &str, cursor: Option<usize>) -> Result<()> {
    let cursor = cursor_or_end(text, cursor);
    match find_shortcut_at_cursor(text, cursor) {
        Some(found) => println!("'{}' at {}..{}", found.token, found.start, found.end),
        None => println!("No shortcut at offset {}", cursor),
    }
    Ok(())
}

fn handle_expand(
    settings: Settings,
    snippets: &Path,
    text: &str,
    cursor: Option<usize>,
    vars: Vec<(String, String)>,
) -> Result<()> {
    let store = Arc::new(MemorySnippetStore::open(snippets)?);
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let result = runtime.block_on(expand_text(settings, store, text, cursor, vars.into_iter().collect()))?;

    match &result.outcome {
        CheckOutcome::Expanded { strategy, .. } => println!("Expanded using {}", strategy),
        other => println!("Not expanded: {:?}", other),
    }
    println!("{}", result.value);
    println!("caret: {}", result.caret);
    Ok(())
}

/// What an expansion run left behind in the input
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandResult {
    pub outcome: CheckOutcome,
    pub value: String,
    pub caret: usize,
}

/// Variable values given up front on the command line
struct ProvidedValues(HashMap<String, String>);

#[async_trait]
impl ValuePrompt for ProvidedValues {
    async fn request_values(&self, _snippet: &Snippet) -> Option<HashMap<String, String>> {
        Some(self.0.clone())
    }
}

/// Type `text` into a fresh input, put the caret at `cursor` and run one
/// expansion check against it
pub async fn expand_text(
    settings: Settings,
    store: Arc<MemorySnippetStore>,
    text: &str,
    cursor: Option<usize>,
    values: HashMap<String, String>,
) -> Result<ExpandResult> {
    let document = Document::new().into_shared();
    let input = {
        let mut doc = document.lock();
        let input = doc.create_element("input");
        let body = doc.body();
        doc.append_child(body, input).map_err(dom_error)?;
        doc.set_value(input, text).map_err(dom_error)?;
        let cursor = cursor_or_end(text, cursor);
        doc.set_selection_range(input, cursor, cursor).map_err(dom_error)?;
        doc.focus(input).map_err(dom_error)?;
        input
    };

    let orchestrator = Orchestrator::builder(Arc::clone(&document), store.clone())
        .settings(&settings)
        .usage(store)
        .clipboard(Arc::new(SystemClipboard))
        .prompt(Arc::new(ProvidedValues(values)))
        .build();
    let outcome = orchestrator.check_now(input).await;

    let doc = document.lock();
    Ok(ExpandResult {
        outcome,
        value: doc.value(input).unwrap_or_default().to_string(),
        caret: doc.selection_range(input).map_or(0, |(_, end)| end),
    })
}

fn dom_error(e: snipt_dom::DomError) -> SniptError {
    SniptError::Other(e.to_string())
}

fn handle_validate(path: &Path) -> Result<()> {
    let snippets = load_snippets_from(path)?;
    let problems = validate_snippets(&snippets);
    for problem in &problems {
        println!("{}", problem);
    }

    if problems.is_empty() {
        println!("{} snippet(s) OK", snippets.len());
        Ok(())
    } else {
        Err(SniptError::Other(format!(
            "{} problem(s) in {}",
            problems.len(),
            path.display()
        )))
    }
}

/// Every shortcut, content and duplicate problem, one line each
pub fn validate_snippets(snippets: &[Snippet]) -> Vec<String> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for snippet in snippets {
        if let Err(found) = snippet.validate() {
            if let Some(shortcut) = found.shortcut {
                problems.push(shortcut);
            }
            for error in found.content {
                problems.push(format!("'{}': {}", snippet.shortcut, error));
            }
        }
        if !seen.insert(snippet.shortcut.to_ascii_lowercase()) {
            problems.push(format!("'{}': duplicate shortcut", snippet.shortcut));
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use snipt_engine::Strategy;

    fn store(snippets: Vec<Snippet>) -> Arc<MemorySnippetStore> {
        Arc::new(MemorySnippetStore::from_snippets(snippets).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn expands_at_the_end_of_the_text() {
        let store = store(vec![Snippet::new("hello", "Hello, World!")]);

        let result = expand_text(Settings::default(), store.clone(), "Type hello ", None, HashMap::new())
            .await
            .unwrap();

        assert_eq!(
            result,
            ExpandResult {
                outcome: CheckOutcome::Expanded {
                    snippet_id: store.get("hello").unwrap().id,
                    strategy: Strategy::DirectAssignment,
                },
                value: "Type Hello, World! ".to_string(),
                caret: 18,
            }
        );
        assert_eq!(store.get("hello").unwrap().usage_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn command_line_values_fill_variables() {
        let snippet = Snippet::new("greet", "Hi {name}, {missing}!")
            .with_variable(snipt_core::models::Variable::new("name"));
        let values = HashMap::from([("name".to_string(), "Ada".to_string())]);

        let result = expand_text(Settings::default(), store(vec![snippet]), "greet", None, values)
            .await
            .unwrap();

        assert_eq!(result.value, "Hi Ada, !");
    }

    #[tokio::test(start_paused = true)]
    async fn cursor_inside_a_word_matches_nothing() {
        let store = store(vec![Snippet::new("hello", "Hello, World!")]);

        let result = expand_text(Settings::default(), store, "hello there", Some(3), HashMap::new())
            .await
            .unwrap();

        assert_eq!(result.outcome, CheckOutcome::NoMatch);
        assert_eq!(result.value, "hello there");
    }

    #[test]
    fn validation_lists_every_problem() {
        let mut bad_shortcut = Snippet::new("ok", "fine");
        bad_shortcut.shortcut = "9lives".to_string();
        let snippets = vec![
            Snippet::new("sig", "Best, {name"),
            Snippet::new("sig", "again"),
            bad_shortcut,
            Snippet::new("fine", "{}"),
        ];

        let problems = validate_snippets(&snippets);

        assert_eq!(problems.len(), 4);
        assert!(problems[0].contains("unmatched opening brace"));
        assert!(problems[1].contains("duplicate shortcut"));
        assert!(problems[2].contains("9lives"));
        assert!(problems[3].contains("empty variable name"));
    }

    #[test]
    fn validate_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");
        snipt_core::storage::save_snippets_to(&path, &[Snippet::new("brb", "be right back")]).unwrap();

        assert!(handle_validate(&path).is_ok());
        assert!(handle_validate(&dir.path().join("missing.json")).is_err());
    }
}
