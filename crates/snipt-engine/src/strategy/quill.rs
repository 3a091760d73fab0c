use super::locate::{self, LocatedShortcut};
use super::{Attempt, StrategyError};
use snipt_dom::{Document, EditorHandle, NodeId};

/// Ancestor levels searched for an attached instance
const INSTANCE_DEPTH: usize = 3;

fn find_instance(doc: &Document, element: NodeId) -> Option<EditorHandle> {
    std::iter::once(element)
        .chain(doc.ancestors(element).into_iter().take(INSTANCE_DEPTH))
        .find_map(|node| doc.editor(node))
}

/// Edit through the editor's own text model: delete the shortcut, insert the
/// content at the same index and put the selection after it.
pub(crate) async fn run(attempt: &Attempt<'_>, located: &LocatedShortcut) -> Result<(), StrategyError> {
    {
        let mut doc = attempt.document.lock();
        let handle = find_instance(&doc, attempt.element).ok_or(StrategyError::NoEditorInstance)?;
        let mut editor = handle.lock();

        // the editor's text has newlines between blocks, so match by rank from the end
        let token = attempt.span.token.as_str();
        let text: Vec<char> = editor.text(&doc).chars().collect();
        let after = locate::occurrences_after(&doc, attempt.element, located, token);
        let index = locate::nth_last_occurrence(&text, token, after)
            .ok_or_else(|| StrategyError::ShortcutNotFound(token.to_string()))?;

        editor.delete_text(&mut doc, index, located.len);
        editor.insert_text(&mut doc, index, attempt.content);
        editor.set_selection(&mut doc, index + attempt.content.chars().count(), 0);
    }

    attempt.settle().await;
    attempt.verify()
}
