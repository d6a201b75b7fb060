//! Intent routing and response orchestration
//!
//! The pipeline that turns one user utterance into one coherent,
//! incrementally-updating response:
//! - `classifier`: keyword pass plus model fallback
//! - `merger`: drains a handler's chunk stream into the UI and speech
//!   sinks with sentence-boundary speech buffering
//! - `session`: per-conversation state with the single-in-flight rule
//! - `orchestrator`: the state machine tying it together

pub mod classifier;
pub mod merger;
pub mod orchestrator;
pub mod sentence;
pub mod session;

pub use classifier::{IntentClassifier, KeywordTable};
pub use merger::{DrainReport, ResponseStreamMerger};
pub use orchestrator::Orchestrator;
pub use sentence::SentenceBuffer;
pub use session::{Session, SessionManager, SessionPhase};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// One in-flight request per session; cancel or wait first
    #[error("Session is busy with an in-flight request")]
    SessionBusy,

    #[error("Session error: {0}")]
    Session(String),
}
