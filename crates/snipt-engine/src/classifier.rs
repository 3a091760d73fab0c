//! Decides how an editable element has to be written to.
//!
//! Classification is a pure function of the current tree: nothing is cached,
//! so calling [`classify`] twice without a mutation in between gives the same
//! answer.

use serde::Serialize;
use snipt_dom::{Document, NodeId};

/// Ancestor levels searched for an editor class signature
const SIGNATURE_DEPTH: usize = 5;
/// Ancestor levels searched for a Quill/ProseMirror container
const CONTAINER_DEPTH: usize = 3;

const STRUCTURAL_TAGS: [&str; 4] = ["p", "span", "div", "br"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditorFamily {
    None,
    Generic,
    ProseMirror,
    CodeMirror,
    Quill,
    FrameworkOwned,
}

impl EditorFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorFamily::None => "none",
            EditorFamily::Generic => "generic-contenteditable",
            EditorFamily::ProseMirror => "prosemirror",
            EditorFamily::CodeMirror => "codemirror",
            EditorFamily::Quill => "quill",
            EditorFamily::FrameworkOwned => "framework-owned",
        }
    }
}

/// Class-name substrings of known rich-text editors
const EDITOR_SIGNATURES: [(&str, EditorFamily); 16] = [
    ("ql-editor", EditorFamily::Quill),
    ("ProseMirror", EditorFamily::ProseMirror),
    ("CodeMirror", EditorFamily::CodeMirror),
    ("cm-content", EditorFamily::CodeMirror),
    ("cm-editor", EditorFamily::CodeMirror),
    ("DraftEditor", EditorFamily::Generic),
    ("public-DraftEditor", EditorFamily::Generic),
    ("mce-content-body", EditorFamily::Generic),
    ("tox-edit-area", EditorFamily::Generic),
    ("ck-editor__editable", EditorFamily::Generic),
    ("ck-content", EditorFamily::Generic),
    ("fr-element", EditorFamily::Generic),
    ("note-editable", EditorFamily::Generic),
    ("trix-content", EditorFamily::Generic),
    ("medium-editor-element", EditorFamily::Generic),
    ("redactor-editor", EditorFamily::Generic),
];

/// Attributes editors stamp on their root
const EDITOR_ATTRIBUTES: [&str; 3] = ["data-slate-editor", "data-lexical-editor", "data-gramm"];

/// Classes of the non-editable container an editor root sits in
const CONTAINER_SIGNATURES: [(&str, EditorFamily); 6] = [
    ("ql-container", EditorFamily::Quill),
    ("ql-snow", EditorFamily::Quill),
    ("ql-bubble", EditorFamily::Quill),
    ("ProseMirror", EditorFamily::ProseMirror),
    ("tiptap", EditorFamily::ProseMirror),
    ("remirror-editor", EditorFamily::ProseMirror),
];

const FRAMEWORK_PREFIXES: [&str; 6] = ["data-react", "data-v-", "data-vue", "_ngcontent", "_nghost", "ng-"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub is_complex: bool,
    pub family: EditorFamily,
}

impl Classification {
    pub const SIMPLE: Classification = Classification {
        is_complex: false,
        family: EditorFamily::None,
    };

    pub fn complex(family: EditorFamily) -> Self {
        Self {
            is_complex: true,
            family,
        }
    }
}

pub fn classify(doc: &Document, element: NodeId) -> Classification {
    if doc.is_form_control(element) || !doc.is_element(element) {
        return Classification::SIMPLE;
    }

    if let Some(family) = editor_signature(doc, element) {
        return Classification::complex(family);
    }

    if let Some(family) = container_signature(doc, element) {
        return Classification::complex(family);
    }

    if has_framework_signals(doc, element) {
        return Classification::complex(EditorFamily::FrameworkOwned);
    }

    if doc.is_content_editable(element) && has_structure(doc, element) {
        return Classification::complex(EditorFamily::Generic);
    }

    Classification::SIMPLE
}

fn lineage(doc: &Document, element: NodeId, depth: usize) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::once(element).chain(doc.ancestors(element).into_iter().take(depth))
}

fn editor_signature(doc: &Document, element: NodeId) -> Option<EditorFamily> {
    lineage(doc, element, SIGNATURE_DEPTH).find_map(|node| {
        let class_name = doc.attribute(node, "class").unwrap_or_default();
        EDITOR_SIGNATURES
            .iter()
            .find(|(signature, _)| class_name.contains(signature))
            .map(|(_, family)| *family)
            .or_else(|| {
                EDITOR_ATTRIBUTES
                    .iter()
                    .any(|name| doc.attribute(node, name).is_some())
                    .then_some(EditorFamily::Generic)
            })
    })
}

fn container_signature(doc: &Document, element: NodeId) -> Option<EditorFamily> {
    doc.ancestors(element)
        .into_iter()
        .take(CONTAINER_DEPTH)
        .find_map(|node| {
            CONTAINER_SIGNATURES
                .iter()
                .find(|(signature, _)| doc.has_class(node, signature))
                .map(|(_, family)| *family)
        })
}

fn has_framework_signals(doc: &Document, element: NodeId) -> bool {
    doc.has_shadow_root(element)
        || doc.attributes(element).iter().any(|(name, _)| {
            let name = name.to_ascii_lowercase();
            FRAMEWORK_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
        })
}

/// Block or format children, or text spread over several nodes
fn has_structure(doc: &Document, element: NodeId) -> bool {
    let structural_child = doc
        .children(element)
        .iter()
        .any(|child| doc.tag(*child).is_some_and(|tag| STRUCTURAL_TAGS.contains(&tag)));

    structural_child
        || doc
            .text_nodes(element)
            .into_iter()
            .filter(|node| doc.text_len(*node) > 0)
            .count()
            > 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipt_dom::Fragment;

    fn editable(doc: &mut Document, parent: NodeId) -> NodeId {
        let element = doc.create_element("div");
        doc.set_attribute(element, "contenteditable", "true").unwrap();
        doc.append_child(parent, element).unwrap();
        element
    }

    #[test]
    fn form_controls_are_simple() {
        let mut doc = Document::new();
        for tag in ["input", "textarea"] {
            let element = doc.create_element(tag);
            doc.set_attribute(element, "class", "ProseMirror").unwrap();
            doc.append_child(doc.body(), element).unwrap();
            assert_eq!(classify(&doc, element), Classification::SIMPLE);
        }
    }

    #[test]
    fn flat_contenteditable_is_simple() {
        let mut doc = Document::new();
        let body = doc.body();
        let element = editable(&mut doc, body);
        doc.set_text_content(element, "hello there").unwrap();
        assert_eq!(classify(&doc, element), Classification::SIMPLE);
    }

    #[test]
    fn structure_makes_contenteditable_complex() {
        let mut doc = Document::new();
        let body = doc.body();
        let element = editable(&mut doc, body);
        doc.replace_children(element, &[Fragment::wrap_line("p", "foo")]).unwrap();
        assert_eq!(classify(&doc, element), Classification::complex(EditorFamily::Generic));

        let split = editable(&mut doc, body);
        doc.replace_children(split, &[Fragment::text("a"), Fragment::text(""), Fragment::text("b")])
            .unwrap();
        assert!(classify(&doc, split).is_complex);
    }

    #[test]
    fn editor_signatures_on_ancestors() {
        let mut doc = Document::new();
        let wrapper = doc.create_element("div");
        doc.set_attribute(wrapper, "class", "cm-editor theme-dark").unwrap();
        doc.append_child(doc.body(), wrapper).unwrap();
        let element = editable(&mut doc, wrapper);
        assert_eq!(classify(&doc, element), Classification::complex(EditorFamily::CodeMirror));

        let body = doc.body();
        let slate = editable(&mut doc, body);
        doc.set_attribute(slate, "data-slate-editor", "true").unwrap();
        assert_eq!(classify(&doc, slate).family, EditorFamily::Generic);
    }

    #[test]
    fn quill_container_is_recognised() {
        let mut doc = Document::new();
        let container = doc.create_element("div");
        doc.set_attribute(container, "class", "ql-container ql-snow").unwrap();
        doc.append_child(doc.body(), container).unwrap();
        let element = editable(&mut doc, container);
        doc.set_text_content(element, "x").unwrap();
        assert_eq!(classify(&doc, element), Classification::complex(EditorFamily::Quill));
    }

    #[test]
    fn framework_owned_nodes() {
        let mut doc = Document::new();
        let body = doc.body();
        let vue = editable(&mut doc, body);
        doc.set_attribute(vue, "data-v-7ba5bd90", "").unwrap();
        assert_eq!(classify(&doc, vue).family, EditorFamily::FrameworkOwned);

        let shadow = editable(&mut doc, body);
        doc.attach_shadow(shadow).unwrap();
        assert!(classify(&doc, shadow).is_complex);
    }

    #[test]
    fn classification_is_idempotent() {
        let mut doc = Document::new();
        let body = doc.body();
        let element = editable(&mut doc, body);
        doc.replace_children(element, &[Fragment::wrap_line("p", ""), Fragment::wrap_line("p", "x")])
            .unwrap();
        assert_eq!(classify(&doc, element), classify(&doc, element));
    }
}
