//! Speech sink placeholder
//!
//! The real synthesis engine (the piper voice the assistant ships with)
//! sits behind `SpeechSink`; this stand-in logs each sentence it would
//! speak. Acquiring and releasing the audio device is the engine's
//! responsibility, scoped to each `speak` call.

use async_trait::async_trait;

use pocket_core::{Result, SpeechSink};

/// Logs sentences instead of synthesizing them
#[derive(Default)]
pub struct TracingSpeechSink;

impl TracingSpeechSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SpeechSink for TracingSpeechSink {
    async fn speak(&self, text: &str) -> Result<()> {
        tracing::info!(target: "speech", sentence = text, "speak");
        Ok(())
    }
}
