//! Intent handlers
//!
//! One handler per intent category, each implementing the streaming
//! execution contract from `pocket-core`, plus the enum-keyed registry
//! that wires intents to handlers at startup.

pub mod briefing;
pub mod chat;
pub mod home;
pub mod integrations;
pub mod planner;
pub mod registry;
pub mod web;

pub use briefing::BriefingHandler;
pub use chat::ChatHandler;
pub use home::HomeAutomationHandler;
pub use integrations::{HttpBriefingSource, HttpSearchBackend, StaticDeviceController};
pub use planner::PlannerHandler;
pub use registry::{HandlerRegistry, RegistryError};
pub use web::WebAgentHandler;

use pocket_core::{Error, ErrorKind, StreamChunk};

/// Convert a backend error into the terminal chunk a handler emits.
///
/// This is the single place backend-specific failures become the shared
/// user-facing taxonomy.
pub(crate) fn backend_error_chunk(handler: &str, err: Error) -> StreamChunk {
    tracing::warn!(handler, error = %err, "Handler backend call failed");
    StreamChunk::error(ErrorKind::HandlerBackend, err.to_string())
}
