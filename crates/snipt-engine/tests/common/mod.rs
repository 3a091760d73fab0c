//! Host-page fixtures: surfaces, editors that react to events, and
//! collaborators that record what they were asked.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use snipt_core::clipboard::{ClipboardPayload, ClipboardProvider};
use snipt_core::error::{Result, SniptError};
use snipt_core::matcher::find_last_occurrence;
use snipt_core::models::{Notification, Snippet, UsageReport};
use snipt_core::services::{Notifier, SnippetLookup, UsageReporter, ValuePrompt};
use snipt_dom::{
    Document, EditorInstance, Event, EventKind, Fragment, InputType, NodeId, Position, Range, SharedDocument,
};
use snipt_engine::{
    EngineConfig, ExpansionGate, GateGuard, ReplacementEngine, ReplacementOutcome, ReplacementRequest, SurfaceDescriptor,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ---- surfaces ---------------------------------------------------------

pub fn text_input(doc: &mut Document, value: &str) -> NodeId {
    let input = doc.create_element("input");
    doc.set_attribute(input, "id", "subject").unwrap();
    doc.append_child(doc.body(), input).unwrap();
    doc.set_value(input, value).unwrap();
    input
}

/// `<div contenteditable>` with one `<p>` per line, caret at the end
pub fn rich_editor(doc: &mut Document, class: Option<&str>, lines: &[&str]) -> NodeId {
    let body = doc.body();
    rich_editor_in(doc, body, class, lines)
}

pub fn rich_editor_in(doc: &mut Document, parent: NodeId, class: Option<&str>, lines: &[&str]) -> NodeId {
    let element = doc.create_element("div");
    doc.set_attribute(element, "contenteditable", "true").unwrap();
    if let Some(class) = class {
        doc.set_attribute(element, "class", class).unwrap();
    }
    doc.append_child(parent, element).unwrap();
    let blocks: Vec<Fragment> = lines.iter().map(|line| Fragment::wrap_line("p", line)).collect();
    doc.replace_children(element, &blocks).unwrap();
    caret_at_end(doc, element);
    element
}

pub fn caret_at_end(doc: &mut Document, element: NodeId) {
    match doc.text_nodes(element).last() {
        Some(last) => {
            let len = doc.text_len(*last);
            doc.collapse(Position::new(*last, len)).unwrap();
        }
        None => doc.collapse_to_end(element).unwrap(),
    }
}

/// Set an input's value as if typed, firing the input event
pub fn type_into(document: &SharedDocument, input: NodeId, value: &str) {
    let mut doc = document.lock();
    doc.set_value(input, value).unwrap();
    doc.dispatch_event(input, EventKind::input(InputType::InsertText, value.chars().last().map(String::from)), false);
}

pub async fn settle_for(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

/// Run the engine directly against the last occurrence of `token`
pub async fn run_replacement(document: &SharedDocument, element: NodeId, token: &str, content: &str) -> ReplacementOutcome {
    let gate = ExpansionGate::new();
    let guard = gate.try_acquire().unwrap();
    run_replacement_guarded(document, element, token, content, &guard).await
}

pub async fn run_replacement_guarded(
    document: &SharedDocument,
    element: NodeId,
    token: &str,
    content: &str,
    guard: &GateGuard,
) -> ReplacementOutcome {
    let surface = SurfaceDescriptor::capture(&document.lock(), element);
    let span = find_last_occurrence(&surface.text, token, Some(surface.cursor())).unwrap();
    let engine = ReplacementEngine::new(EngineConfig::default());
    let request = ReplacementRequest {
        surface: &surface,
        span: &span,
        content,
    };
    engine.replace(document, request, guard).await
}

// ---- editing helpers used by simulated editors ----------------------

/// Replace the live selection (within one text node) with `text`
pub fn replace_selection(doc: &mut Document, text: &str) -> bool {
    let Some(range) = doc.selection() else {
        return false;
    };
    if range.start.node != range.end.node || !doc.is_text(range.start.node) {
        return false;
    }
    let node = range.start.node;
    let chars: Vec<char> = doc.text(node).unwrap_or_default().chars().collect();
    let mut updated: String = chars[..range.start.offset].iter().collect();
    updated.push_str(text);
    updated.extend(&chars[range.end.offset..]);
    doc.set_text(node, &updated).unwrap();
    doc.collapse(Position::new(node, range.start.offset + text.chars().count()))
        .unwrap();
    true
}

/// Delete the character before a collapsed caret
pub fn delete_backward(doc: &mut Document) -> bool {
    let Some(range) = doc.selection() else {
        return false;
    };
    if !range.is_collapsed() || range.start.offset == 0 || !doc.is_text(range.start.node) {
        return false;
    }
    let caret = range.start;
    doc.set_selection(Range::new(Position::new(caret.node, caret.offset - 1), caret))
        .unwrap();
    replace_selection(doc, "")
}

// ---- simulated host editors -------------------------------------------

/// An editor that performs edits from `beforeinput`, the way ProseMirror does
pub fn handles_before_input(doc: &mut Document, element: NodeId) {
    doc.add_event_listener(Some(element), |doc: &mut Document, event: &mut Event| {
        if let EventKind::BeforeInput { input_type, data } = event.kind.clone() {
            let handled = match input_type {
                InputType::DeleteContentBackward => replace_selection(doc, ""),
                InputType::InsertText => replace_selection(doc, data.as_deref().unwrap_or_default()),
                _ => false,
            };
            if handled {
                event.prevent_default();
            }
        }
    });
}

/// An editor that cancels `beforeinput` without doing anything
pub fn rejects_before_input(doc: &mut Document, element: NodeId) {
    doc.add_event_listener(Some(element), |_doc: &mut Document, event: &mut Event| {
        if matches!(event.kind, EventKind::BeforeInput { .. }) {
            event.prevent_default();
        }
    });
}

/// An editor that only accepts pasted content. Records the HTML it was given.
pub fn handles_paste(doc: &mut Document, element: NodeId) -> Arc<Mutex<Option<String>>> {
    let seen = Arc::new(Mutex::new(None));
    let record = Arc::clone(&seen);
    doc.add_event_listener(Some(element), move |doc: &mut Document, event: &mut Event| {
        if let EventKind::Paste(payload) = event.kind.clone() {
            *record.lock() = payload.html.clone();
            if replace_selection(doc, &payload.text) {
                event.prevent_default();
            }
        }
    });
    seen
}

/// An editor that handles raw key presses itself
pub fn handles_keys(doc: &mut Document, element: NodeId) {
    doc.add_event_listener(Some(element), |doc: &mut Document, event: &mut Event| {
        if let EventKind::KeyDown { key } = event.kind.clone() {
            let handled = match key.as_str() {
                "Backspace" => delete_backward(doc),
                printable if printable.chars().count() == 1 => replace_selection(doc, printable),
                _ => false,
            };
            if handled {
                event.prevent_default();
            }
        }
    });
}

/// An editor that only commits text when a composition ends
pub fn handles_composition(doc: &mut Document, element: NodeId) {
    doc.add_event_listener(Some(element), |doc: &mut Document, event: &mut Event| {
        if let EventKind::CompositionEnd { data } = event.kind.clone() {
            replace_selection(doc, &data);
        }
    });
}

/// Page script that puts the original markup back after the next `times`
/// change events. Returns how often it reverted.
pub fn reverts_changes(doc: &mut Document, element: NodeId, times: usize) -> Arc<AtomicUsize> {
    let original = doc.children_fragments(element).unwrap();
    let reverted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reverted);
    doc.add_event_listener(Some(element), move |doc: &mut Document, event: &mut Event| {
        if event.kind != EventKind::Change || counter.load(Ordering::SeqCst) >= times {
            return;
        }
        counter.fetch_add(1, Ordering::SeqCst);
        let original = original.clone();
        doc.queue_host_task(move |doc: &mut Document| {
            doc.replace_children(element, &original).unwrap();
        });
    });
    reverted
}

/// Quill-style instance: text is every block followed by `\n`
pub struct QuillInstance {
    pub root: NodeId,
    pub calls: Arc<AtomicUsize>,
}

impl QuillInstance {
    fn position(&self, doc: &Document, mut index: usize) -> Option<Position> {
        for block in doc.children(self.root).to_vec() {
            let len = doc.text_content(block).chars().count();
            if index <= len {
                return doc.position_at(block, index);
            }
            index -= len + 1;
        }
        None
    }

    fn splice(&self, doc: &mut Document, index: usize, delete: usize, insert: &str) {
        let Some(position) = self.position(doc, index) else {
            return;
        };
        let chars: Vec<char> = doc.text(position.node).unwrap_or_default().chars().collect();
        let end = (position.offset + delete).min(chars.len());
        let mut updated: String = chars[..position.offset].iter().collect();
        updated.push_str(insert);
        updated.extend(&chars[end..]);
        doc.set_text(position.node, &updated).unwrap();
    }
}

impl EditorInstance for QuillInstance {
    fn text(&self, doc: &Document) -> String {
        doc.children(self.root)
            .iter()
            .map(|block| format!("{}\n", doc.text_content(*block)))
            .collect()
    }

    fn delete_text(&mut self, doc: &mut Document, index: usize, length: usize) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.splice(doc, index, length, "");
    }

    fn insert_text(&mut self, doc: &mut Document, index: usize, text: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.splice(doc, index, 0, text);
    }

    fn set_selection(&mut self, doc: &mut Document, index: usize, _length: usize) {
        if let Some(position) = self.position(doc, index) {
            let _ = doc.collapse(position);
        }
    }
}

// ---- collaborators ----------------------------------------------------

#[derive(Default)]
pub struct RecordingUsage {
    pub reports: Mutex<Vec<UsageReport>>,
}

#[async_trait]
impl UsageReporter for RecordingUsage {
    async fn report_usage(&self, report: UsageReport) -> Result<()> {
        self.reports.lock().push(report);
        Ok(())
    }
}

pub struct FailingUsage;

#[async_trait]
impl UsageReporter for FailingUsage {
    async fn report_usage(&self, _report: UsageReport) -> Result<()> {
        Err(SniptError::Messaging("background context went away".into()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notifications: Mutex<Vec<Notification>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

/// Fixed snippets; counts lookups
pub struct CountingLookup {
    snippets: HashMap<String, Snippet>,
    pub calls: AtomicUsize,
}

impl CountingLookup {
    pub fn new(snippets: Vec<Snippet>) -> Self {
        Self {
            snippets: snippets.into_iter().map(|s| (s.shortcut.clone(), s)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnippetLookup for CountingLookup {
    async fn find_by_shortcut(&self, shortcut: &str) -> Result<Option<Snippet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snippets.get(shortcut).cloned())
    }
}

/// Answers from a snippet list after a fixed delay
pub struct SlowLookup {
    snippets: HashMap<String, Snippet>,
    delay: Duration,
}

impl SlowLookup {
    pub fn new(snippets: Vec<Snippet>, delay: Duration) -> Self {
        Self {
            snippets: snippets.into_iter().map(|s| (s.shortcut.clone(), s)).collect(),
            delay,
        }
    }
}

#[async_trait]
impl SnippetLookup for SlowLookup {
    async fn find_by_shortcut(&self, shortcut: &str) -> Result<Option<Snippet>> {
        tokio::time::sleep(self.delay).await;
        Ok(self.snippets.get(shortcut).cloned())
    }
}

pub struct FailingLookup;

#[async_trait]
impl SnippetLookup for FailingLookup {
    async fn find_by_shortcut(&self, _shortcut: &str) -> Result<Option<Snippet>> {
        Err(SniptError::Messaging("receiving end does not exist".into()))
    }
}

/// Edits the input while the lookup is in flight
pub struct MutatingLookup {
    pub document: SharedDocument,
    pub input: NodeId,
    pub replacement_value: String,
    pub snippet: Snippet,
}

#[async_trait]
impl SnippetLookup for MutatingLookup {
    async fn find_by_shortcut(&self, _shortcut: &str) -> Result<Option<Snippet>> {
        self.document
            .lock()
            .set_value(self.input, &self.replacement_value)
            .unwrap();
        Ok(Some(self.snippet.clone()))
    }
}

pub struct FixedPrompt(pub Option<HashMap<String, String>>);

#[async_trait]
impl ValuePrompt for FixedPrompt {
    async fn request_values(&self, _snippet: &Snippet) -> Option<HashMap<String, String>> {
        self.0.clone()
    }
}

pub struct FixedClipboard(pub String);

#[async_trait]
impl ClipboardProvider for FixedClipboard {
    async fn read_text(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    async fn write(&self, _payload: &ClipboardPayload) -> Result<()> {
        Ok(())
    }
}
