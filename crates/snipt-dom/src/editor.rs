use crate::document::Document;
use parking_lot::Mutex;
use std::sync::Arc;

/// Text-model API of a rich-text editor instance attached to an element
/// (Quill keeps one on its container). Indices count characters of the
/// editor's own text, where each paragraph ends with `\n`.
pub trait EditorInstance: Send {
    fn text(&self, document: &Document) -> String;

    fn delete_text(&mut self, document: &mut Document, index: usize, length: usize);

    fn insert_text(&mut self, document: &mut Document, index: usize, text: &str);

    fn set_selection(&mut self, document: &mut Document, index: usize, length: usize);
}

pub type EditorHandle = Arc<Mutex<dyn EditorInstance>>;

pub fn editor_handle<E: EditorInstance + 'static>(editor: E) -> EditorHandle {
    Arc::new(Mutex::new(editor))
}
