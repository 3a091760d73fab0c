use super::layout::Layout;
use super::{Attempt, StrategyError};
use snipt_dom::{DataTransfer, EventKind};

/// Synthetic paste over the selected shortcut. The payload lives only in the
/// event; the system clipboard is left alone.
pub(crate) async fn run(attempt: &Attempt<'_>) -> Result<(), StrategyError> {
    let payload = DataTransfer {
        text: attempt.content.to_string(),
        html: Some(Layout::for_family(attempt.family).paste_html(attempt.content)),
    };

    {
        let mut doc = attempt.document.lock();
        let handled = !doc.dispatch_event(attempt.element, EventKind::Paste(payload), true);
        tracing::trace!(handled, "paste dispatched");
        doc.clear_selection();
    }

    attempt.settle().await;
    attempt.verify()
}
