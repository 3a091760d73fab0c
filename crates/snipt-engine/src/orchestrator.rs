//! Per-keystroke driver.
//!
//! Idle → Checking → LookingUp → Expanding → Idle. Input events schedule a
//! debounced check; the configured trigger key schedules one directly. The
//! expansion gate allows one expansion at a time and is released on every
//! exit path because it lives in a guard.

use crate::config::EngineConfig;
use crate::debounce::Debouncer;
use crate::gate::{ExpansionGate, GateGuard};
use crate::strategy::{AbortReason, ReplacementEngine, ReplacementOutcome, ReplacementRequest, Strategy};
use crate::surface::{locate_surface, SurfaceDescriptor};
use chrono::Utc;
use parking_lot::Mutex;
use snipt_core::clipboard::{read_for_expansion, ClipboardProvider, NoClipboard};
use snipt_core::config::Settings;
use snipt_core::matcher::{find_shortcut_at_cursor, ShortcutMatch};
use snipt_core::models::{Notification, Snippet, SurfaceSummary, UsageReport};
use snipt_core::services::{LogNotifier, NoUsageTracking, Notifier, SnippetLookup, UsageReporter, ValuePrompt};
use snipt_core::variables::{self, BuiltinContext};
use snipt_dom::{Document, Event, EventKind, ListenerId, NodeId, SharedDocument};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Checking,
    LookingUp,
    Expanding,
}

/// How an expansion check ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Disabled,
    /// Another expansion holds the gate
    Busy,
    /// Target is not an editable surface, or no shortcut sits at the caret
    NoMatch,
    /// The candidate is not a registered shortcut
    NotFound,
    LookupFailed,
    /// The shortcut text changed before it could be replaced
    Stale,
    /// Prompt dismissed, or the expansion was called off mid-way
    Cancelled,
    Detached,
    Expanded { snippet_id: String, strategy: Strategy },
    /// Every strategy failed
    Failed,
}

/// What a finished expansion reports
struct Expansion {
    strategy: Strategy,
    surface: SurfaceSummary,
    variables: HashMap<String, String>,
}

pub struct OrchestratorBuilder {
    document: SharedDocument,
    lookup: Arc<dyn SnippetLookup>,
    config: EngineConfig,
    usage: Arc<dyn UsageReporter>,
    notifier: Arc<dyn Notifier>,
    clipboard: Arc<dyn ClipboardProvider>,
    prompt: Option<Arc<dyn ValuePrompt>>,
}

impl OrchestratorBuilder {
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.config = EngineConfig::from(settings);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn usage(mut self, usage: Arc<dyn UsageReporter>) -> Self {
        self.usage = usage;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn clipboard(mut self, clipboard: Arc<dyn ClipboardProvider>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn prompt(mut self, prompt: Arc<dyn ValuePrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            inner: Arc::new(Inner {
                debouncer: Debouncer::new(self.config.debounce),
                engine: ReplacementEngine::new(self.config.clone()),
                config: self.config,
                document: self.document,
                lookup: self.lookup,
                usage: self.usage,
                notifier: self.notifier,
                clipboard: self.clipboard,
                prompt: self.prompt,
                gate: ExpansionGate::new(),
                state: Mutex::new(OrchestratorState::Idle),
                current_surface: Mutex::new(None),
                listener: Mutex::new(None),
            }),
        }
    }
}

struct Inner {
    document: SharedDocument,
    config: EngineConfig,
    engine: ReplacementEngine,
    lookup: Arc<dyn SnippetLookup>,
    usage: Arc<dyn UsageReporter>,
    notifier: Arc<dyn Notifier>,
    clipboard: Arc<dyn ClipboardProvider>,
    prompt: Option<Arc<dyn ValuePrompt>>,
    gate: Arc<ExpansionGate>,
    debouncer: Debouncer,
    state: Mutex<OrchestratorState>,
    current_surface: Mutex<Option<NodeId>>,
    listener: Mutex<Option<ListenerId>>,
}

/// Cheap to clone; clones drive the same gate and debouncer
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.state())
            .field("gate_held", &self.inner.gate.is_held())
            .field("current_surface", &self.current_surface())
            .finish()
    }
}

impl Orchestrator {
    /// Defaults: settings defaults, no usage tracking, log-only notifications,
    /// no clipboard and no value prompt
    pub fn builder(document: SharedDocument, lookup: Arc<dyn SnippetLookup>) -> OrchestratorBuilder {
        OrchestratorBuilder {
            document,
            lookup,
            config: EngineConfig::default(),
            usage: Arc::new(NoUsageTracking),
            notifier: Arc::new(LogNotifier),
            clipboard: Arc::new(NoClipboard),
            prompt: None,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        *self.inner.state.lock()
    }

    fn set_state(&self, state: OrchestratorState) {
        *self.inner.state.lock() = state;
    }

    pub fn gate(&self) -> &Arc<ExpansionGate> {
        &self.inner.gate
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Element of the last qualifying event
    pub fn current_surface(&self) -> Option<NodeId> {
        *self.inner.current_surface.lock()
    }

    pub fn is_check_pending(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    /// Listen for input and keydown events anywhere in the document.
    /// The listener holds a weak reference, so it goes quiet once every
    /// handle to this orchestrator is dropped.
    pub fn attach(&self) -> ListenerId {
        let weak = Arc::downgrade(&self.inner);
        let listener = move |_doc: &mut Document, event: &mut Event| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let orchestrator = Orchestrator { inner };
            match &event.kind {
                EventKind::Input { .. } => orchestrator.handle_input(event.target),
                EventKind::KeyDown { key } => orchestrator.handle_keydown(event.target, key),
                _ => {}
            }
        };

        let id = self.inner.document.lock().add_event_listener(None, listener);
        if let Some(previous) = self.inner.listener.lock().replace(id) {
            self.inner.document.lock().remove_event_listener(previous);
        }
        id
    }

    pub fn detach(&self) {
        if let Some(id) = self.inner.listener.lock().take() {
            self.inner.document.lock().remove_event_listener(id);
        }
        self.inner.debouncer.cancel();
    }

    /// Input on `target`: schedule a debounced check. Ignored while an
    /// expansion is running, which also covers the input the expansion causes.
    pub fn handle_input(&self, target: NodeId) {
        let config = &self.inner.config;
        if !config.enabled || !config.expand_on_input {
            return;
        }
        if self.inner.gate.is_held() {
            trace!(?target, "input during expansion ignored");
            return;
        }

        *self.inner.current_surface.lock() = Some(target);
        let orchestrator = self.clone();
        self.inner.debouncer.trigger(move || async move {
            orchestrator.check_now(target).await;
        });
    }

    /// Keydown on `target`: only the trigger key schedules a check, which runs
    /// once the key has had a chance to land in the text
    pub fn handle_keydown(&self, target: NodeId, key: &str) {
        let config = &self.inner.config;
        if !config.enabled || !config.trigger_key.matches_key(key) {
            return;
        }
        if self.inner.gate.is_held() {
            trace!(?target, key, "trigger key during expansion ignored");
            return;
        }

        *self.inner.current_surface.lock() = Some(target);
        let orchestrator = self.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            orchestrator.check_now(target).await;
        });
    }

    /// Run one expansion check against `target` right away
    pub async fn check_now(&self, target: NodeId) -> CheckOutcome {
        let outcome = self.run_check(target).await;
        self.set_state(OrchestratorState::Idle);
        debug!(?target, ?outcome, "expansion check finished");
        outcome
    }

    async fn run_check(&self, target: NodeId) -> CheckOutcome {
        let inner = &self.inner;
        if !inner.config.enabled {
            return CheckOutcome::Disabled;
        }
        if inner.gate.is_held() {
            return CheckOutcome::Busy;
        }

        self.set_state(OrchestratorState::Checking);
        let candidate = {
            let doc = inner.document.lock();
            match locate_surface(&doc, target) {
                Some(element) if doc.is_connected(element) => {
                    let surface = SurfaceDescriptor::capture(&doc, element);
                    if surface.is_supported() {
                        Ok(find_shortcut_at_cursor(&surface.text, surface.cursor()).map(|m| (element, m)))
                    } else {
                        Ok(None)
                    }
                }
                Some(_) => Err(CheckOutcome::Detached),
                None => Ok(None),
            }
        };
        let (element, candidate) = match candidate {
            Ok(Some(found)) => found,
            Ok(None) => return CheckOutcome::NoMatch,
            Err(outcome) => return outcome,
        };

        self.set_state(OrchestratorState::LookingUp);
        let shortcut = candidate.token.to_ascii_lowercase();
        let snippet = match inner.lookup.find_by_shortcut(&shortcut).await {
            Ok(Some(snippet)) => snippet,
            Ok(None) => {
                trace!(shortcut = %shortcut, "no snippet for candidate");
                return CheckOutcome::NotFound;
            }
            Err(e) => {
                warn!(shortcut = %shortcut, error = %e, "snippet lookup failed");
                return CheckOutcome::LookupFailed;
            }
        };

        let Some(guard) = inner.gate.try_acquire() else {
            debug!(shortcut = %shortcut, "expansion already in progress");
            return CheckOutcome::Busy;
        };
        self.set_state(OrchestratorState::Expanding);

        let result = self.expand(&guard, element, &snippet, &candidate).await;

        // release before reporting, and drop the check our own edit scheduled
        drop(guard);
        inner.debouncer.cancel();

        match result {
            Ok(expansion) => {
                self.report(&snippet, expansion.strategy, expansion.surface, expansion.variables)
                    .await;
                CheckOutcome::Expanded {
                    snippet_id: snippet.id.clone(),
                    strategy: expansion.strategy,
                }
            }
            Err(outcome) => outcome,
        }
    }

    async fn expand(
        &self,
        guard: &GateGuard,
        element: NodeId,
        snippet: &Snippet,
        candidate: &ShortcutMatch,
    ) -> Result<Expansion, CheckOutcome> {
        let inner = &self.inner;

        let clipboard = if variables::needs_clipboard(&snippet.content) {
            read_for_expansion(inner.clipboard.as_ref()).await
        } else {
            None
        };

        let values = match &inner.prompt {
            Some(prompt) if snippet.is_dynamic && !snippet.variables.is_empty() => {
                let Some(values) = prompt.request_values(snippet).await else {
                    debug!(shortcut = %snippet.shortcut, "value prompt dismissed");
                    return Err(CheckOutcome::Cancelled);
                };
                let missing = snippet.missing_required(&values);
                if !missing.is_empty() {
                    debug!(shortcut = %snippet.shortcut, ?missing, "required values missing");
                    return Err(CheckOutcome::Cancelled);
                }
                values
            }
            _ => HashMap::new(),
        };

        let content = variables::expand(
            &snippet.content,
            &snippet.variables,
            &values,
            &BuiltinContext::now().with_clipboard(clipboard),
        );

        // the text may have moved on while we were looking up and prompting;
        // only the exact token that was looked up, still at the caret, expands
        let (surface, span, summary) = {
            let doc = inner.document.lock();
            if !doc.is_connected(element) {
                return Err(CheckOutcome::Detached);
            }
            let surface = SurfaceDescriptor::capture(&doc, element);
            let span =
                find_shortcut_at_cursor(&surface.text, surface.cursor()).filter(|found| found == candidate);
            let summary = surface.summary(&doc);
            (surface, span, summary)
        };
        let Some(span) = span else {
            debug!(shortcut = %snippet.shortcut, "shortcut no longer present");
            return Err(CheckOutcome::Stale);
        };

        let request = ReplacementRequest {
            surface: &surface,
            span: &span,
            content: &content,
        };
        match inner.engine.replace(&inner.document, request, guard).await {
            ReplacementOutcome::Replaced { strategy, .. } => Ok(Expansion {
                strategy,
                surface: summary,
                variables: values,
            }),
            ReplacementOutcome::Aborted(AbortReason::Detached) => Err(CheckOutcome::Detached),
            ReplacementOutcome::Aborted(AbortReason::ShortcutMissing) => Err(CheckOutcome::Stale),
            ReplacementOutcome::Aborted(AbortReason::GateReleased) => Err(CheckOutcome::Cancelled),
            ReplacementOutcome::Exhausted => Err(CheckOutcome::Failed),
        }
    }

    async fn report(
        &self,
        snippet: &Snippet,
        strategy: Strategy,
        surface: SurfaceSummary,
        variables: HashMap<String, String>,
    ) {
        let report = UsageReport {
            snippet_id: snippet.id.clone(),
            shortcut: snippet.shortcut.clone(),
            surface,
            variables,
            strategy: strategy.name().to_string(),
            expanded_at: Utc::now(),
        };
        if let Err(e) = self.inner.usage.report_usage(report).await {
            warn!(snippet_id = %snippet.id, error = %e, "usage report failed");
        }

        let config = &self.inner.config;
        if config.show_notifications {
            self.inner
                .notifier
                .notify(Notification::expanded(snippet, config.notification_duration));
        }
    }
}
