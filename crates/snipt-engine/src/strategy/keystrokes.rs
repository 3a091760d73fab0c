use super::locate::LocatedShortcut;
use super::{Attempt, StrategyError};
use snipt_dom::{Document, EventKind, InputType, NodeId, Position};

/// One simulated key: keydown, keypress for printable keys, beforeinput and
/// input unless the keydown was canceled, then keyup
fn press(doc: &mut Document, element: NodeId, key: &str, input_type: InputType, data: Option<String>) {
    let handled = !doc.dispatch_event(element, EventKind::KeyDown { key: key.to_string() }, true);

    if !handled {
        if data.is_some() {
            doc.dispatch_event(element, EventKind::KeyPress { key: key.to_string() }, true);
        }
        let allowed = doc.dispatch_event(element, EventKind::before_input(input_type, data.clone()), true);
        if allowed {
            doc.dispatch_event(element, EventKind::input(input_type, data), false);
        }
    }

    doc.dispatch_event(element, EventKind::KeyUp { key: key.to_string() }, false);
}

/// Backspace over the shortcut, then type the content one key at a time
pub(crate) async fn run(attempt: &Attempt<'_>, located: &LocatedShortcut) -> Result<(), StrategyError> {
    let element = attempt.element;
    let delay = attempt.config.keystroke_delay;

    {
        let mut doc = attempt.document.lock();
        doc.collapse(Position::new(located.node, located.node_offset + located.len))?;
    }

    for _ in 0..located.len {
        {
            let mut doc = attempt.document.lock();
            attempt.ensure_live(&doc)?;
            press(&mut doc, element, "Backspace", InputType::DeleteContentBackward, None);
        }
        tokio::time::sleep(delay).await;
    }

    for c in attempt.content.chars() {
        {
            let mut doc = attempt.document.lock();
            attempt.ensure_live(&doc)?;
            match c {
                '\n' => press(&mut doc, element, "Enter", InputType::InsertParagraph, None),
                _ => press(&mut doc, element, &c.to_string(), InputType::InsertText, Some(c.to_string())),
            }
        }
        tokio::time::sleep(delay).await;
    }

    attempt.settle().await;
    attempt.verify()
}
