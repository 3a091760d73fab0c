//! Persistent DOM rewrite: swap the block holding the shortcut for freshly
//! built markup, and keep doing it while the host reverts the edit.

use super::layout::{self, Layout};
use super::locate::{self, LocatedShortcut};
use super::verify::SurfaceSnapshot;
use super::{Attempt, StrategyError};
use crate::positioner::place_cursor;
use snipt_dom::{Document, EventKind, InputType, NodeId, Position};
use tracing::debug;

pub(crate) async fn run(attempt: &Attempt<'_>, snapshot: &SurfaceSnapshot) -> Result<(), StrategyError> {
    let attempts = attempt.config.rewrite_max_attempts.max(1);
    let mut last_error = StrategyError::VerificationFailed;

    for round in 0..attempts {
        if round > 0 {
            tokio::time::sleep(attempt.config.rewrite_backoff(round - 1)).await;
        }

        {
            let mut doc = attempt.document.lock();
            attempt.ensure_live(&doc)?;

            // every round starts from the original markup
            snapshot.restore(&mut doc, attempt.element)?;
            let located = locate::select_shortcut(&mut doc, attempt.element, attempt.span)?;
            rewrite_block(&mut doc, attempt, &located)?;

            place_cursor(&mut doc, attempt.element, attempt.caret_offset());
            doc.dispatch_event(
                attempt.element,
                EventKind::input(InputType::InsertReplacementText, Some(attempt.content.to_string())),
                false,
            );
            doc.dispatch_event(attempt.element, EventKind::Change, false);
        }

        attempt.settle().await;
        match attempt.verify() {
            Ok(()) => return Ok(()),
            Err(StrategyError::Detached) => return Err(StrategyError::Detached),
            Err(e) => {
                debug!(attempt = round + 1, of = attempts, "rewrite did not stick");
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// The child of `element` that holds `node`, or `node` itself when it sits
/// directly under the element
fn block_of(doc: &Document, element: NodeId, node: NodeId) -> NodeId {
    let mut current = node;
    while let Some(parent) = doc.parent(current) {
        if parent == element {
            break;
        }
        current = parent;
    }
    current
}

fn rewrite_block(doc: &mut Document, attempt: &Attempt<'_>, located: &LocatedShortcut) -> Result<(), StrategyError> {
    let block = block_of(doc, attempt.element, located.node);
    let relative = doc
        .offset_in(block, Position::new(located.node, located.node_offset))
        .ok_or_else(|| StrategyError::ShortcutNotFound(attempt.span.token.clone()))?;

    let chars: Vec<char> = doc.text_content(block).chars().collect();
    let mut text: String = chars[..relative].iter().collect();
    text.push_str(attempt.content);
    text.extend(&chars[(relative + located.len).min(chars.len())..]);

    let fragments = match doc.tag(block) {
        Some(tag) => Layout::for_family(attempt.family).rebuild_block(tag, &text),
        // a bare text node: keep it inline
        None => layout::inline(&text),
    };
    doc.replace_with(block, &fragments)?;
    Ok(())
}
