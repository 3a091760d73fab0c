//! Expansion engine for snipt-web.
//!
//! Flow: an input or trigger-key event reaches the [`Orchestrator`], which
//! runs the matcher over the surface text, looks the candidate up, classifies
//! the surface and hands the resolved content to the [`ReplacementEngine`].

pub mod classifier;
pub mod config;
pub mod debounce;
pub mod gate;
pub mod orchestrator;
pub mod positioner;
pub mod strategy;
pub mod surface;

pub use classifier::{classify, Classification, EditorFamily};
pub use config::EngineConfig;
pub use debounce::Debouncer;
pub use gate::{ExpansionGate, GateGuard};
pub use orchestrator::{CheckOutcome, Orchestrator, OrchestratorBuilder, OrchestratorState};
pub use positioner::{place_cursor, CursorPlacement, SavedSelection};
pub use strategy::{
    AbortReason, Layout, ReplacementEngine, ReplacementOutcome, ReplacementRequest, Strategy, StrategyError,
};
pub use surface::{locate_surface, SurfaceDescriptor, SurfaceKind};
