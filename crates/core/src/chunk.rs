//! Stream chunk and terminal-status types
//!
//! One invocation produces a totally ordered, finite sequence of
//! [`StreamChunk`]s terminated by exactly one `Done` or `Error`.

use serde::{Deserialize, Serialize};

/// User-facing failure taxonomy.
///
/// Every backend-specific error is converted to one of these before it
/// reaches the response stream or the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Intent model failed to load or infer; degrades to chat, not fatal
    ClassificationUnavailable,
    /// No handler registered for the routed intent
    UnregisteredIntent,
    /// Network/device/storage failure inside a handler
    HandlerBackend,
    /// User-initiated cancellation; not an error
    Cancelled,
    /// Uncaught fault at the orchestrator boundary
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ClassificationUnavailable => "classification_unavailable",
            ErrorKind::UnregisteredIntent => "unregistered_intent",
            ErrorKind::HandlerBackend => "handler_backend",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of incremental output from a handler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    /// User-facing answer text
    TextDelta { text: String },
    /// Model reasoning tokens; displayed but never spoken
    ThinkingDelta { text: String },
    /// Structured notice from a backend action
    ToolEvent {
        name: String,
        payload: serde_json::Value,
    },
    /// Terminal failure
    Error { kind: ErrorKind, message: String },
    /// Terminal success marker
    Done,
}

impl StreamChunk {
    /// Create a text delta
    pub fn text(text: impl Into<String>) -> Self {
        StreamChunk::TextDelta { text: text.into() }
    }

    /// Create a thinking delta
    pub fn thinking(text: impl Into<String>) -> Self {
        StreamChunk::ThinkingDelta { text: text.into() }
    }

    /// Create a tool event
    pub fn tool_event(name: impl Into<String>, payload: serde_json::Value) -> Self {
        StreamChunk::ToolEvent {
            name: name.into(),
            payload,
        }
    }

    /// Create a terminal error chunk
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        StreamChunk::Error {
            kind,
            message: message.into(),
        }
    }

    /// Terminal cancellation marker, permitted as the last chunk of a
    /// cancelled invocation
    pub fn cancelled() -> Self {
        Self::error(ErrorKind::Cancelled, "cancelled")
    }

    /// Check if this chunk terminates the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamChunk::Done | StreamChunk::Error { .. })
    }
}

/// Terminal status of one drained invocation, surfaced to the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainStatus {
    /// Stream ended with `Done`
    Completed,
    /// Invocation was cancelled mid-stream
    Cancelled,
    /// Stream ended with an error of the given kind
    Failed(ErrorKind),
}

impl DrainStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, DrainStatus::Completed)
    }
}

/// Events forwarded to the UI sink by the merger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// Answer text to append to the current response
    Text { text: String },
    /// Reasoning text, rendered visually distinct
    Thinking { text: String },
    /// Structured notice (device toggled, event added, ...)
    Notice {
        name: String,
        payload: serde_json::Value,
    },
    /// Single human-readable failure message for this request
    Failure { kind: ErrorKind, message: String },
}
