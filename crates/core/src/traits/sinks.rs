//! Output sink contracts

use async_trait::async_trait;

use crate::{Result, UiEvent};

/// Receives merged response events for display.
///
/// Must be cheap and non-blocking; the merger calls it inline between
/// chunks. Tolerates ToolEvent/TextDelta interleaving as the merger
/// produces it, with no additional buffering required.
pub trait UiSink: Send + Sync {
    /// Render one event
    fn render(&self, event: UiEvent);
}

/// Speech synthesis sink.
///
/// Implementations hold the audio-output resource as a scoped acquisition:
/// it is released when playback completes or the invocation is cancelled.
/// The merger only ever forwards complete sentences here.
#[async_trait]
pub trait SpeechSink: Send + Sync {
    /// Speak one complete sentence
    async fn speak(&self, text: &str) -> Result<()>;
}
