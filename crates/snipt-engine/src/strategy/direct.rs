use super::StrategyError;
use crate::positioner::{place_cursor, CursorPlacement};
use snipt_core::matcher::{exact_occurrence_at, ShortcutMatch};
use snipt_dom::{Document, EventKind, InputType, NodeId};

/// Rebuild the surface's flat text around the span and assign it.
///
/// Form controls get a new value; other elements lose their structure and
/// keep a single text node. Authoritative, so there is no verification.
pub fn replace_flat(
    doc: &mut Document,
    element: NodeId,
    span: &ShortcutMatch,
    content: &str,
) -> Result<CursorPlacement, StrategyError> {
    let form_control = doc.is_form_control(element);
    let current: Vec<char> = if form_control {
        doc.value(element).unwrap_or_default().chars().collect()
    } else {
        doc.text_content(element).chars().collect()
    };

    let needle: Vec<char> = span.token.chars().collect();
    if span.end > current.len() || !exact_occurrence_at(&current, &needle, span.start) {
        return Err(StrategyError::ShortcutNotFound(span.token.clone()));
    }

    let mut replaced: String = current[..span.start].iter().collect();
    replaced.push_str(content);
    replaced.extend(&current[span.end..]);

    if form_control {
        doc.set_value(element, &replaced)?;
    } else {
        doc.set_text_content(element, &replaced)?;
    }

    // let the page's own listeners see the new value
    doc.dispatch_event(
        element,
        EventKind::input(InputType::InsertReplacementText, Some(content.to_string())),
        false,
    );

    Ok(place_cursor(doc, element, span.start + content.chars().count()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipt_core::matcher::find_shortcut_at_cursor;

    #[test]
    fn rewrites_an_input_value() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        doc.append_child(doc.body(), input).unwrap();
        doc.set_value(input, "Type hello ").unwrap();

        let span = find_shortcut_at_cursor("Type hello ", 11).unwrap();
        assert_eq!((span.start, span.end), (5, 10));

        let placement = replace_flat(&mut doc, input, &span, "Hello, World!").unwrap();
        assert_eq!(placement, CursorPlacement::Exact);
        assert_eq!(doc.value(input), Some("Type Hello, World! "));
        assert_eq!(doc.selection_range(input), Some((18, 18)));
    }

    #[test]
    fn refuses_a_stale_span() {
        let mut doc = Document::new();
        let input = doc.create_element("textarea");
        doc.append_child(doc.body(), input).unwrap();
        doc.set_value(input, "hey").unwrap();

        let span = ShortcutMatch {
            token: "hello".into(),
            start: 0,
            end: 5,
        };
        assert!(replace_flat(&mut doc, input, &span, "x").is_err());
        assert_eq!(doc.value(input), Some("hey"));
    }

    #[test]
    fn refuses_the_span_once_expanded_content_covers_it() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        doc.append_child(doc.body(), input).unwrap();
        doc.set_value(input, "Type Hello, World! ").unwrap();

        let span = ShortcutMatch {
            token: "hello".into(),
            start: 5,
            end: 10,
        };
        assert!(replace_flat(&mut doc, input, &span, "Hello, World!").is_err());
        assert_eq!(doc.value(input), Some("Type Hello, World! "));
    }
}
