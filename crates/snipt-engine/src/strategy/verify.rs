use crate::positioner::SavedSelection;
use snipt_dom::{Document, DomError, Fragment, NodeId};
use std::ops::Range;

/// Decides whether inserted content showed up in a surface.
///
/// Every non-empty line has to be present, and at least one of them has to
/// occur more often than before the attempt, so text that was already on
/// the page does not count as success. The shortcut is left out of the
/// before-count, and it must be gone unless the content brings it back.
#[derive(Debug, Clone)]
pub struct ContentCheck {
    lines: Vec<String>,
    baseline: Vec<usize>,
    original: String,
    shortcut: String,
    shortcut_limit: usize,
}

impl ContentCheck {
    /// `shortcut` is the char range the shortcut occupies in `before`
    pub fn new(content: &str, before: &str, shortcut: Range<usize>) -> Self {
        let lines: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        let (token, remaining): (String, String) = {
            let (inside, outside): (Vec<_>, Vec<_>) =
                before.chars().enumerate().partition(|(index, _)| shortcut.contains(index));
            (
                inside.into_iter().map(|(_, c)| c).collect(),
                outside.into_iter().map(|(_, c)| c).collect(),
            )
        };
        let baseline = lines.iter().map(|line| occurrences(&remaining, line)).collect();
        let shortcut_limit = if token.is_empty() {
            0
        } else {
            occurrences(&remaining, &token) + occurrences(content, &token)
        };

        Self {
            lines,
            baseline,
            original: before.to_string(),
            shortcut: token,
            shortcut_limit,
        }
    }

    pub fn is_satisfied_by(&self, text: &str) -> bool {
        if !self.shortcut.is_empty() && occurrences(text, &self.shortcut) > self.shortcut_limit {
            return false;
        }

        // whitespace-only content can only be judged by the text changing
        if self.lines.is_empty() {
            return text != self.original;
        }

        let counts: Vec<usize> = self.lines.iter().map(|line| occurrences(text, line)).collect();
        counts.iter().all(|count| *count > 0)
            && counts.iter().zip(&self.baseline).any(|(now, before)| now > before)
    }
}

fn occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// Markup and selection of a surface before a strategy touched it
#[derive(Debug, Clone)]
pub struct SurfaceSnapshot {
    children: Vec<Fragment>,
    html: String,
    selection: SavedSelection,
}

impl SurfaceSnapshot {
    pub fn take(doc: &Document, element: NodeId) -> Result<Self, DomError> {
        Ok(Self {
            children: doc.children_fragments(element)?,
            html: doc.inner_html(element),
            selection: SavedSelection::save(doc, element),
        })
    }

    pub fn is_intact(&self, doc: &Document, element: NodeId) -> bool {
        doc.inner_html(element) == self.html
    }

    /// Swap the saved markup back in. Returns whether anything had changed.
    pub fn restore(&self, doc: &mut Document, element: NodeId) -> Result<bool, DomError> {
        if self.is_intact(doc, element) {
            return Ok(false);
        }
        doc.replace_children(element, &self.children)?;
        self.selection.restore(doc, element);
        Ok(true)
    }
}
