//! Core traits and types for the Pocket assistant
//!
//! This crate provides foundational types used across all other crates:
//! - The closed intent set and classification results
//! - Stream chunk and terminal-status types
//! - Seam traits for pluggable backends (LLM, devices, planner, ...)
//! - Execution requests with cooperative cancellation
//! - Error types

pub mod chunk;
pub mod error;
pub mod intent;
pub mod llm_types;
pub mod request;
pub mod traits;
pub mod utterance;

pub use chunk::{DrainStatus, ErrorKind, StreamChunk, UiEvent};
pub use error::{Error, Result};
pub use intent::{ClassifiedIntent, Intent, Trigger};
pub use llm_types::{GenerateRequest, Message, ModelPrediction, Role, TokenDelta};
pub use request::{CancelToken, ExecutionRequest};
pub use utterance::{Turn, TurnRole, Utterance};

pub use traits::{
    BriefingSource, ChunkStream, DeviceController, DeviceDescriptor, DeviceState, EventRange,
    GenerateResponse, Handler, IntentModel, LanguageModel, NewEvent, PlannerEvent, PlannerStore,
    SearchBackend, SearchHit, SpeechSink, Story, UiSink,
};
