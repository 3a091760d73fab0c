//! Selection step: find the shortcut among the surface's text nodes and
//! select exactly its characters.

use super::StrategyError;
use snipt_core::matcher::{exact_occurrence_at, ShortcutMatch};
use snipt_dom::{Document, NodeId, Position, Range};

/// Where the shortcut was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedShortcut {
    pub node: NodeId,
    /// Char offset inside `node`
    pub node_offset: usize,
    /// Char offset in the surface's text projection
    pub start: usize,
    pub len: usize,
}

/// Search text nodes from the last one backward, boundary-checking against
/// the whole projection. Only the token exactly as typed counts. An
/// occurrence at the expected start wins, otherwise the one closest to the end.
pub fn select_shortcut(
    doc: &mut Document,
    element: NodeId,
    span: &ShortcutMatch,
) -> Result<LocatedShortcut, StrategyError> {
    let needle: Vec<char> = span.token.chars().collect();
    let nodes = doc.text_nodes(element);

    let mut projection = Vec::new();
    let mut starts = Vec::with_capacity(nodes.len());
    for node in &nodes {
        starts.push(projection.len());
        projection.extend(doc.text(*node).unwrap_or_default().chars());
    }

    let mut closest = None;
    for (index, node) in nodes.iter().enumerate().rev() {
        let len = doc.text_len(*node);
        if needle.is_empty() || len < needle.len() {
            continue;
        }

        for local in (0..=len - needle.len()).rev() {
            let start = starts[index] + local;
            if !exact_occurrence_at(&projection, &needle, start) {
                continue;
            }
            let found = LocatedShortcut {
                node: *node,
                node_offset: local,
                start,
                len: needle.len(),
            };
            if start == span.start {
                return select(doc, found);
            }
            closest.get_or_insert(found);
        }
    }

    match closest {
        Some(found) => select(doc, found),
        None => Err(StrategyError::ShortcutNotFound(span.token.clone())),
    }
}

fn select(doc: &mut Document, found: LocatedShortcut) -> Result<LocatedShortcut, StrategyError> {
    doc.set_selection(Range::new(
        Position::new(found.node, found.node_offset),
        Position::new(found.node, found.node_offset + found.len),
    ))?;
    Ok(found)
}

/// The shortcut characters are still where they were found
pub fn still_present(doc: &Document, found: &LocatedShortcut, token: &str) -> bool {
    let Some(text) = doc.text(found.node) else {
        return false;
    };
    let run: String = text.chars().skip(found.node_offset).take(found.len).collect();
    doc.is_connected(found.node) && run == token
}

/// Number of bounded occurrences of `token` after `found` in the projection
pub fn occurrences_after(doc: &Document, element: NodeId, found: &LocatedShortcut, token: &str) -> usize {
    let projection: Vec<char> = doc.text_content(element).chars().collect();
    let needle: Vec<char> = token.chars().collect();
    (found.start + 1..projection.len())
        .filter(|start| exact_occurrence_at(&projection, &needle, *start))
        .count()
}

/// Start of the occurrence of `token` that has `skip` occurrences after it
pub fn nth_last_occurrence(chars: &[char], token: &str, skip: usize) -> Option<usize> {
    let needle: Vec<char> = token.chars().collect();
    if needle.is_empty() || needle.len() > chars.len() {
        return None;
    }
    (0..=chars.len() - needle.len())
        .rev()
        .filter(|start| exact_occurrence_at(chars, &needle, *start))
        .nth(skip)
}
