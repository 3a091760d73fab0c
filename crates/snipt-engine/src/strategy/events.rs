//! Strategies that only dispatch events and let the host's editor do the edit.

use super::locate::{self, LocatedShortcut};
use super::{Attempt, StrategyError};
use snipt_dom::{EventKind, InputType};

/// Cancelable delete-backward over the selected shortcut, then insert-text
/// carrying the content.
pub(crate) async fn input_events(attempt: &Attempt<'_>, located: &LocatedShortcut) -> Result<(), StrategyError> {
    {
        let mut doc = attempt.document.lock();
        let element = attempt.element;

        let allowed = doc.dispatch_event(
            element,
            EventKind::before_input(InputType::DeleteContentBackward, None),
            true,
        );
        // canceled while the shortcut is still there means the editor refused
        if !allowed && locate::still_present(&doc, located, &attempt.span.token) {
            return Err(StrategyError::Rejected("deleteContentBackward"));
        }

        let data = Some(attempt.content.to_string());
        doc.dispatch_event(
            element,
            EventKind::before_input(InputType::InsertText, data.clone()),
            true,
        );
        doc.dispatch_event(element, EventKind::input(InputType::InsertText, data), false);
        doc.clear_selection();
    }

    attempt.settle().await;
    attempt.verify()
}

/// Composition over the selected shortcut, the way an IME commits text
pub(crate) async fn composition(attempt: &Attempt<'_>) -> Result<(), StrategyError> {
    {
        let mut doc = attempt.document.lock();
        let element = attempt.element;
        let data = attempt.content.to_string();

        doc.dispatch_event(element, EventKind::CompositionStart, false);
        doc.dispatch_event(element, EventKind::CompositionUpdate { data: data.clone() }, false);
        doc.dispatch_event(
            element,
            EventKind::before_input(InputType::InsertCompositionText, Some(data.clone())),
            false,
        );
        doc.dispatch_event(
            element,
            EventKind::input(InputType::InsertCompositionText, Some(data.clone())),
            false,
        );
        doc.dispatch_event(element, EventKind::CompositionEnd { data }, false);
        doc.clear_selection();
    }

    attempt.settle().await;
    attempt.verify()
}
