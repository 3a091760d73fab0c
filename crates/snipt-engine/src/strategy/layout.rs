//! Markup shapes each editor family expects for multi-line content.

use crate::classifier::EditorFamily;
use snipt_dom::{render_html, Fragment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `<p>` per pasted line; rebuilt blocks keep the host's tag
    Paragraphs,
    /// one block, lines joined by `<br>`
    LineBreaks,
    /// one block per line, keeping the host's block tag (`<div>` when there is none)
    Divs,
}

impl Layout {
    pub fn for_family(family: EditorFamily) -> Self {
        match family {
            EditorFamily::ProseMirror | EditorFamily::Quill => Layout::Paragraphs,
            EditorFamily::CodeMirror => Layout::LineBreaks,
            EditorFamily::Generic | EditorFamily::FrameworkOwned | EditorFamily::None => Layout::Divs,
        }
    }

    /// HTML flavour of `content` for a paste payload
    pub fn paste_html(&self, content: &str) -> String {
        match self {
            Layout::LineBreaks => render_html(&inline(content)),
            Layout::Paragraphs => render_html(&blocks("p", content)),
            Layout::Divs => render_html(&blocks("div", content)),
        }
    }

    /// Replacement for a block whose text became `text`
    pub fn rebuild_block(&self, tag: &str, text: &str) -> Vec<Fragment> {
        match self {
            Layout::Paragraphs | Layout::Divs => blocks(tag, text),
            Layout::LineBreaks => vec![Fragment::element(tag).with_children(inline(text))],
        }
    }
}

fn blocks(tag: &str, text: &str) -> Vec<Fragment> {
    text.split('\n').map(|line| Fragment::wrap_line(tag, line)).collect()
}

/// Text runs separated by `<br>`
pub fn inline(text: &str) -> Vec<Fragment> {
    let mut out = Vec::new();
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push(Fragment::line_break());
        }
        if !line.is_empty() {
            out.push(Fragment::text(line));
        }
    }
    out
}
