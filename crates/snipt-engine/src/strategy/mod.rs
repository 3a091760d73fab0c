//! Replacement strategy engine.
//!
//! Simple surfaces get their value assigned directly. Complex surfaces walk
//! an ordered chain of strategies; each one is verified after a settling
//! delay, and a failed attempt is rolled back to the snapshot taken before
//! the chain started, so the next strategy sees the original surface.

mod direct;
mod events;
mod keystrokes;
pub mod layout;
pub mod locate;
mod paste;
mod quill;
mod rewrite;
pub mod verify;

use crate::classifier::EditorFamily;
use crate::config::EngineConfig;
use crate::gate::GateGuard;
use crate::positioner::{place_cursor, CursorPlacement};
use crate::surface::SurfaceDescriptor;
use locate::LocatedShortcut;
use serde::Serialize;
use snipt_core::matcher::ShortcutMatch;
use snipt_dom::{Document, DomError, NodeId, SharedDocument};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};
use verify::{ContentCheck, SurfaceSnapshot};

pub use layout::Layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Assign the new value of a simple surface
    DirectAssignment,
    /// Flatten a complex surface whose shortcut could not be selected
    FlatFallback,
    QuillApi,
    InputEvents,
    ClipboardPaste,
    DomRewrite,
    Keystrokes,
    Composition,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::DirectAssignment => "direct-assignment",
            Strategy::FlatFallback => "flat-fallback",
            Strategy::QuillApi => "quill-api",
            Strategy::InputEvents => "input-events",
            Strategy::ClipboardPaste => "clipboard-paste",
            Strategy::DomRewrite => "dom-rewrite",
            Strategy::Keystrokes => "keystrokes",
            Strategy::Composition => "composition",
        }
    }

    /// Strategies tried, in order, on a complex surface of `family`
    pub fn chain(family: EditorFamily) -> Vec<Strategy> {
        let mut chain = Vec::with_capacity(6);
        if family == EditorFamily::Quill {
            chain.push(Strategy::QuillApi);
        }
        chain.extend([
            Strategy::InputEvents,
            Strategy::ClipboardPaste,
            Strategy::DomRewrite,
            Strategy::Keystrokes,
            Strategy::Composition,
        ]);
        chain
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a single strategy did not succeed. Never leaves this module.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("inserted content did not appear after settling")]
    VerificationFailed,
    #[error("host rejected the {0} event")]
    Rejected(&'static str),
    #[error("no editor instance attached to the surface")]
    NoEditorInstance,
    #[error("shortcut {0:?} not found in the surface")]
    ShortcutNotFound(String),
    #[error("surface was removed from the document")]
    Detached,
    #[error("expansion is no longer in progress")]
    GateReleased,
    #[error(transparent)]
    Dom(#[from] DomError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    GateReleased,
    Detached,
    /// The shortcut was no longer where the request said
    ShortcutMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementOutcome {
    Replaced {
        strategy: Strategy,
        cursor: CursorPlacement,
    },
    Aborted(AbortReason),
    /// Every strategy failed; the surface was restored
    Exhausted,
}

impl ReplacementOutcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, ReplacementOutcome::Replaced { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReplacementRequest<'a> {
    pub surface: &'a SurfaceDescriptor,
    pub span: &'a ShortcutMatch,
    pub content: &'a str,
}

/// Length of `content` in a tree's text projection, where line breaks are structure
fn projected_len(content: &str) -> usize {
    content.chars().filter(|c| *c != '\n').count()
}

/// Shared state of one complex replacement
pub(crate) struct Attempt<'a> {
    document: &'a SharedDocument,
    element: NodeId,
    family: EditorFamily,
    span: &'a ShortcutMatch,
    content: &'a str,
    config: &'a EngineConfig,
    check: ContentCheck,
    guard: &'a GateGuard,
}

impl Attempt<'_> {
    fn ensure_live(&self, doc: &Document) -> Result<(), StrategyError> {
        if !self.guard.is_current() {
            return Err(StrategyError::GateReleased);
        }
        if !doc.is_connected(self.element) {
            return Err(StrategyError::Detached);
        }
        Ok(())
    }

    /// Give the host a moment, then let its deferred reactions run
    async fn settle(&self) {
        tokio::time::sleep(self.config.settle).await;
        let ran = self.document.lock().run_host_tasks();
        if ran > 0 {
            debug!(tasks = ran, "host reacted while settling");
        }
    }

    fn verify(&self) -> Result<(), StrategyError> {
        let doc = self.document.lock();
        if !doc.is_connected(self.element) {
            return Err(StrategyError::Detached);
        }
        if self.check.is_satisfied_by(&doc.text_content(self.element)) {
            Ok(())
        } else {
            Err(StrategyError::VerificationFailed)
        }
    }

    fn caret_offset(&self) -> usize {
        self.span.start + projected_len(self.content)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplacementEngine {
    config: EngineConfig,
}

impl ReplacementEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the shortcut span with `content`. Internal failures are
    /// logged and folded into the outcome.
    pub async fn replace(
        &self,
        document: &SharedDocument,
        request: ReplacementRequest<'_>,
        guard: &GateGuard,
    ) -> ReplacementOutcome {
        if !guard.is_current() {
            return ReplacementOutcome::Aborted(AbortReason::GateReleased);
        }

        if request.surface.is_complex() {
            return self.replace_complex(document, request, guard).await;
        }

        let mut doc = document.lock();
        if !doc.is_connected(request.surface.element) {
            return ReplacementOutcome::Aborted(AbortReason::Detached);
        }
        flat_replace(&mut doc, request, Strategy::DirectAssignment)
    }

    async fn replace_complex(
        &self,
        document: &SharedDocument,
        request: ReplacementRequest<'_>,
        guard: &GateGuard,
    ) -> ReplacementOutcome {
        let element = request.surface.element;
        let family = request.surface.classification.family;

        let prepared = {
            let mut doc = document.lock();
            if !doc.is_connected(element) {
                return ReplacementOutcome::Aborted(AbortReason::Detached);
            }
            let before = doc.text_content(element);
            SurfaceSnapshot::take(&doc, element).map(|snapshot| {
                let selected = locate::select_shortcut(&mut doc, element, request.span);
                let shortcut = selected.as_ref().map_or(request.span.start..request.span.end, |found| {
                    found.start..found.start + found.len
                });
                (snapshot, ContentCheck::new(request.content, &before, shortcut), selected)
            })
        };

        let (snapshot, check) = match prepared {
            Ok((snapshot, check, Ok(_))) => (snapshot, check),
            Ok((_, _, Err(e))) => {
                // without a selection none of the chain can run
                warn!(error = %e, family = family.as_str(), "selection step failed, flattening surface");
                let mut doc = document.lock();
                return flat_replace(&mut doc, request, Strategy::FlatFallback);
            }
            Err(e) => {
                debug!(error = %e, "could not snapshot surface");
                return ReplacementOutcome::Aborted(AbortReason::Detached);
            }
        };

        let attempt = Attempt {
            document,
            element,
            family,
            span: request.span,
            content: request.content,
            config: &self.config,
            check,
            guard,
        };

        for strategy in Strategy::chain(family) {
            match self.run(strategy, &attempt, &snapshot).await {
                Ok(()) => {
                    let cursor = {
                        let mut doc = document.lock();
                        place_cursor(&mut doc, element, attempt.caret_offset())
                    };
                    info!(strategy = strategy.name(), family = family.as_str(), "replacement verified");
                    return ReplacementOutcome::Replaced { strategy, cursor };
                }
                Err(StrategyError::Detached) => {
                    debug!(strategy = strategy.name(), "surface detached mid-attempt");
                    return ReplacementOutcome::Aborted(AbortReason::Detached);
                }
                Err(StrategyError::GateReleased) => {
                    debug!(strategy = strategy.name(), "gate released mid-attempt");
                    self.rollback(document, element, &snapshot);
                    return ReplacementOutcome::Aborted(AbortReason::GateReleased);
                }
                Err(e) => {
                    debug!(strategy = strategy.name(), error = %e, "strategy failed");
                    self.rollback(document, element, &snapshot);
                }
            }
        }

        warn!(
            shortcut = %request.span.token,
            family = family.as_str(),
            "all replacement strategies failed"
        );
        self.rollback(document, element, &snapshot);
        ReplacementOutcome::Exhausted
    }

    async fn run(
        &self,
        strategy: Strategy,
        attempt: &Attempt<'_>,
        snapshot: &SurfaceSnapshot,
    ) -> Result<(), StrategyError> {
        if strategy == Strategy::DomRewrite {
            return rewrite::run(attempt, snapshot).await;
        }

        let located: LocatedShortcut = {
            let mut doc = attempt.document.lock();
            attempt.ensure_live(&doc)?;
            locate::select_shortcut(&mut doc, attempt.element, attempt.span)?
        };

        match strategy {
            Strategy::QuillApi => quill::run(attempt, &located).await,
            Strategy::InputEvents => events::input_events(attempt, &located).await,
            Strategy::ClipboardPaste => paste::run(attempt).await,
            Strategy::Keystrokes => keystrokes::run(attempt, &located).await,
            Strategy::Composition => events::composition(attempt).await,
            Strategy::DirectAssignment | Strategy::FlatFallback | Strategy::DomRewrite => {
                Err(StrategyError::VerificationFailed)
            }
        }
    }

    fn rollback(&self, document: &SharedDocument, element: NodeId, snapshot: &SurfaceSnapshot) {
        let mut doc = document.lock();
        if !doc.is_connected(element) {
            return;
        }
        match snapshot.restore(&mut doc, element) {
            Ok(true) => debug!("surface restored from snapshot"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "could not restore surface"),
        }
    }
}

fn flat_replace(doc: &mut Document, request: ReplacementRequest<'_>, strategy: Strategy) -> ReplacementOutcome {
    match direct::replace_flat(doc, request.surface.element, request.span, request.content) {
        Ok(cursor) => ReplacementOutcome::Replaced { strategy, cursor },
        Err(e) => {
            debug!(error = %e, strategy = strategy.name(), "flat replacement not applied");
            ReplacementOutcome::Aborted(AbortReason::ShortcutMissing)
        }
    }
}
