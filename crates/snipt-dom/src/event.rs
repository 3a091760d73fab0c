//! Events the engine dispatches and host-page listeners observe.
//!
//! Dispatched events are synthetic: the document performs no default action
//! for them. Whatever changes content does so from a listener.

use crate::document::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    InsertText,
    InsertParagraph,
    InsertLineBreak,
    InsertFromPaste,
    InsertCompositionText,
    InsertReplacementText,
    DeleteContentBackward,
}

impl InputType {
    /// The `InputEvent.inputType` string
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::InsertText => "insertText",
            InputType::InsertParagraph => "insertParagraph",
            InputType::InsertLineBreak => "insertLineBreak",
            InputType::InsertFromPaste => "insertFromPaste",
            InputType::InsertCompositionText => "insertCompositionText",
            InputType::InsertReplacementText => "insertReplacementText",
            InputType::DeleteContentBackward => "deleteContentBackward",
        }
    }
}

/// Clipboard data carried by a paste event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataTransfer {
    pub text: String,
    pub html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    BeforeInput {
        input_type: InputType,
        data: Option<String>,
    },
    Input {
        input_type: InputType,
        data: Option<String>,
    },
    Change,
    Paste(DataTransfer),
    KeyDown { key: String },
    KeyPress { key: String },
    KeyUp { key: String },
    CompositionStart,
    CompositionUpdate { data: String },
    CompositionEnd { data: String },
    Focus,
    Blur,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::BeforeInput { .. } => "beforeinput",
            EventKind::Input { .. } => "input",
            EventKind::Change => "change",
            EventKind::Paste(_) => "paste",
            EventKind::KeyDown { .. } => "keydown",
            EventKind::KeyPress { .. } => "keypress",
            EventKind::KeyUp { .. } => "keyup",
            EventKind::CompositionStart => "compositionstart",
            EventKind::CompositionUpdate { .. } => "compositionupdate",
            EventKind::CompositionEnd { .. } => "compositionend",
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
        }
    }

    pub fn input(input_type: InputType, data: Option<String>) -> Self {
        EventKind::Input { input_type, data }
    }

    pub fn before_input(input_type: InputType, data: Option<String>) -> Self {
        EventKind::BeforeInput { input_type, data }
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub target: NodeId,
    pub current_target: Option<NodeId>,
    pub kind: EventKind,
    pub cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    pub fn new(target: NodeId, kind: EventKind, cancelable: bool) -> Self {
        Self {
            target,
            current_target: None,
            kind,
            cancelable,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Has no effect on non-cancelable events
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Host-page script reacting to dispatched events
pub trait EventListener: Send {
    fn handle_event(&mut self, document: &mut Document, event: &mut Event);
}

impl<F> EventListener for F
where
    F: FnMut(&mut Document, &mut Event) + Send,
{
    fn handle_event(&mut self, document: &mut Document, event: &mut Event) {
        self(document, event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Deferred host-page work, run when the document settles
pub type HostTask = Box<dyn FnOnce(&mut Document) + Send>;
