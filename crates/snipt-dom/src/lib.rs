//! A small editable document model: the surfaces snippets expand into.
//!
//! Host pages are modeled by event listeners and queued host tasks, which
//! is how rich editors that own their DOM get to accept, reject, or revert
//! the edits the engine makes.

pub mod document;
pub mod editor;
pub mod error;
pub mod event;
pub mod fragment;

pub use document::{Document, FormControl, NodeId, Position, Range, SharedDocument};
pub use editor::{editor_handle, EditorHandle, EditorInstance};
pub use error::{DomError, Result};
pub use event::{DataTransfer, Event, EventKind, EventListener, HostTask, InputType, ListenerId};
pub use fragment::{render_html, Fragment};
