//! Caret placement and selection save/restore.
//!
//! Nothing here fails outward: when the caret cannot be placed exactly it
//! degrades to the end of the element, and from there to focus only.

use snipt_dom::{Document, NodeId, Range};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPlacement {
    /// Caret sits at the requested offset
    Exact,
    /// Offset could not be resolved; caret collapsed to the end of the element
    End,
    /// Only focus could be given to the element
    FocusOnly,
}

/// Place a collapsed caret at `offset` chars into the element's text
pub fn place_cursor(doc: &mut Document, element: NodeId, offset: usize) -> CursorPlacement {
    if let Err(e) = doc.focus(element) {
        debug!(error = %e, "could not focus surface");
    }

    if doc.is_form_control(element) {
        return match doc.set_selection_range(element, offset, offset) {
            Ok(()) => CursorPlacement::Exact,
            Err(e) => {
                debug!(error = %e, offset, "caret offset out of range, moving to end");
                let end = doc.value(element).map(|v| v.chars().count()).unwrap_or(0);
                match doc.set_selection_range(element, end, end) {
                    Ok(()) => CursorPlacement::End,
                    Err(_) => CursorPlacement::FocusOnly,
                }
            }
        };
    }

    if let Some(position) = doc.position_at(element, offset) {
        if doc.collapse(position).is_ok() {
            return CursorPlacement::Exact;
        }
    }

    match doc.collapse_to_end(element) {
        Ok(()) => {
            debug!(offset, "no text position for caret, collapsed to end");
            CursorPlacement::End
        }
        Err(e) => {
            debug!(error = %e, "could not place caret");
            CursorPlacement::FocusOnly
        }
    }
}

/// Selection state of one surface, restorable after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedSelection {
    FormControl { start: usize, end: usize },
    Text { start: usize, end: usize },
    None,
}

impl SavedSelection {
    pub fn save(doc: &Document, element: NodeId) -> Self {
        if let Some((start, end)) = doc.selection_range(element) {
            return SavedSelection::FormControl { start, end };
        }

        let offsets = doc.selection().and_then(|range| {
            Some((
                doc.offset_in(element, range.start)?,
                doc.offset_in(element, range.end)?,
            ))
        });
        match offsets {
            Some((start, end)) => SavedSelection::Text { start, end },
            None => SavedSelection::None,
        }
    }

    /// Reapply by text offsets, since the nodes may have been rebuilt
    pub fn restore(&self, doc: &mut Document, element: NodeId) {
        let restored = match *self {
            SavedSelection::FormControl { start, end } => {
                doc.set_selection_range(element, start, end).is_ok()
            }
            SavedSelection::Text { start, end } => {
                match (doc.position_at(element, start), doc.position_at(element, end)) {
                    (Some(start), Some(end)) => doc.set_selection(Range::new(start, end)).is_ok(),
                    _ => false,
                }
            }
            SavedSelection::None => true,
        };
        if !restored {
            debug!(selection = ?self, "saved selection no longer fits the surface");
        }
    }
}
