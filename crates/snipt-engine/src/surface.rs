use crate::classifier::{classify, Classification};
use snipt_core::models::SurfaceSummary;
use snipt_dom::{Document, NodeId};

/// `input` types whose value is free text
const TEXT_INPUT_TYPES: [&str; 6] = ["text", "search", "email", "url", "tel", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Input,
    TextArea,
    ContentEditable,
    Unsupported,
}

impl SurfaceKind {
    pub fn of(doc: &Document, element: NodeId) -> Self {
        match doc.tag(element) {
            Some("input") => {
                let input_type = doc.attribute(element, "type").unwrap_or_default().to_ascii_lowercase();
                if TEXT_INPUT_TYPES.contains(&input_type.as_str()) {
                    SurfaceKind::Input
                } else {
                    SurfaceKind::Unsupported
                }
            }
            Some("textarea") => SurfaceKind::TextArea,
            Some(_) if doc.is_content_editable(element) => SurfaceKind::ContentEditable,
            _ => SurfaceKind::Unsupported,
        }
    }

    pub fn is_form_control(&self) -> bool {
        matches!(self, SurfaceKind::Input | SurfaceKind::TextArea)
    }
}

/// The editable element an event target belongs to
pub fn locate_surface(doc: &Document, target: NodeId) -> Option<NodeId> {
    if doc.is_form_control(target) {
        return Some(target);
    }
    doc.editing_host(target)
}

/// Snapshot of an editable element taken at the start of an expansion check.
/// Offsets are chars into [`SurfaceDescriptor::text`].
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDescriptor {
    pub element: NodeId,
    pub kind: SurfaceKind,
    pub text: String,
    pub selection_start: usize,
    pub selection_end: usize,
    pub classification: Classification,
}

impl SurfaceDescriptor {
    pub fn capture(doc: &Document, element: NodeId) -> Self {
        let kind = SurfaceKind::of(doc, element);

        let (text, selection) = match kind {
            SurfaceKind::Input | SurfaceKind::TextArea => {
                let text = doc.value(element).unwrap_or_default().to_string();
                let selection = doc.selection_range(element);
                (text, selection)
            }
            SurfaceKind::ContentEditable => {
                let text = doc.text_content(element);
                let selection = doc.selection().and_then(|range| {
                    let start = doc.offset_in(element, range.start)?;
                    let end = doc.offset_in(element, range.end)?;
                    Some((start.min(end), start.max(end)))
                });
                (text, selection)
            }
            SurfaceKind::Unsupported => (String::new(), None),
        };

        // without a caret inside the surface, assume typing happened at the end
        let len = text.chars().count();
        let (selection_start, selection_end) = selection.unwrap_or((len, len));

        Self {
            element,
            kind,
            text,
            selection_start,
            selection_end,
            classification: classify(doc, element),
        }
    }

    pub fn cursor(&self) -> usize {
        self.selection_end
    }

    pub fn is_supported(&self) -> bool {
        self.kind != SurfaceKind::Unsupported
    }

    pub fn is_complex(&self) -> bool {
        self.classification.is_complex
    }

    /// Serializable description for usage reports
    pub fn summary(&self, doc: &Document) -> SurfaceSummary {
        SurfaceSummary {
            tag_name: doc.tag(self.element).unwrap_or_default().to_ascii_uppercase(),
            id: doc.attribute(self.element, "id").map(str::to_string),
            class_name: doc.attribute(self.element, "class").map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipt_dom::{Fragment, Position, Range};

    #[test]
    fn captures_form_controls() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        doc.set_attribute(input, "id", "q").unwrap();
        doc.append_child(doc.body(), input).unwrap();
        doc.set_value(input, "Type hello ").unwrap();

        let surface = SurfaceDescriptor::capture(&doc, input);
        assert_eq!(surface.kind, SurfaceKind::Input);
        assert_eq!(surface.cursor(), 11);
        assert!(!surface.is_complex());
        assert_eq!(surface.summary(&doc).tag_name, "INPUT");
        assert_eq!(surface.summary(&doc).id.as_deref(), Some("q"));

        let checkbox = doc.create_element("input");
        doc.set_attribute(checkbox, "type", "checkbox").unwrap();
        assert_eq!(SurfaceKind::of(&doc, checkbox), SurfaceKind::Unsupported);
    }

    #[test]
    fn captures_contenteditable_selection() {
        let mut doc = Document::new();
        let element = doc.create_element("div");
        doc.set_attribute(element, "contenteditable", "true").unwrap();
        doc.append_child(doc.body(), element).unwrap();
        let blocks = doc
            .replace_children(element, &[Fragment::wrap_line("p", "foo"), Fragment::wrap_line("p", "bar ")])
            .unwrap();
        let second = doc.children(blocks[1])[0];
        doc.set_selection(Range::collapsed(Position::new(second, 2))).unwrap();

        let surface = SurfaceDescriptor::capture(&doc, element);
        assert_eq!(surface.kind, SurfaceKind::ContentEditable);
        assert_eq!(surface.text, "foobar ");
        assert_eq!((surface.selection_start, surface.selection_end), (5, 5));
        assert!(surface.is_complex());
        assert_eq!(locate_surface(&doc, second), Some(element));
    }

    #[test]
    fn caret_defaults_to_end() {
        let mut doc = Document::new();
        let element = doc.create_element("div");
        doc.set_attribute(element, "contenteditable", "").unwrap();
        doc.append_child(doc.body(), element).unwrap();
        doc.set_text_content(element, "abc").unwrap();
        assert_eq!(SurfaceDescriptor::capture(&doc, element).cursor(), 3);
    }
}
