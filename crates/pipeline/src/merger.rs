//! Response stream merger
//!
//! Drains one handler invocation into the UI and speech sinks. Text goes
//! to the UI as it arrives; speech is buffered to sentence boundaries.
//! The merger is also where a mid-stream cancellation takes effect: no
//! further chunks are forwarded and the unspoken fragment is discarded.

use futures::StreamExt;

use pocket_core::{
    CancelToken, ChunkStream, DrainStatus, ErrorKind, SpeechSink, StreamChunk, UiEvent, UiSink,
};

use crate::sentence::SentenceBuffer;

/// Outcome of draining one invocation
#[derive(Debug)]
pub struct DrainReport {
    /// Terminal status surfaced to the caller
    pub status: DrainStatus,
    /// Accumulated answer text (for turn history)
    pub transcript: String,
}

impl DrainReport {
    fn new(status: DrainStatus, transcript: String) -> Self {
        Self { status, transcript }
    }
}

/// Drains handler chunk streams into the sinks
pub struct ResponseStreamMerger;

impl ResponseStreamMerger {
    /// Consume the stream until its terminal chunk, a cancellation, or
    /// exhaustion. Chunks are forwarded in production order; the only
    /// buffering is the sentence buffer feeding the speech sink.
    pub async fn drain(
        mut stream: ChunkStream,
        ui: &dyn UiSink,
        speech: &dyn SpeechSink,
        speech_enabled: bool,
        mut cancel: CancelToken,
    ) -> DrainReport {
        let mut transcript = String::new();
        let mut sentences = SentenceBuffer::new();

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    sentences.clear();
                    tracing::debug!("Drain cancelled mid-stream");
                    return DrainReport::new(DrainStatus::Cancelled, transcript);
                }
                chunk = stream.next() => chunk,
            };

            match chunk {
                Some(StreamChunk::TextDelta { text }) => {
                    transcript.push_str(&text);
                    ui.render(UiEvent::Text { text: text.clone() });

                    if speech_enabled {
                        for sentence in sentences.push(&text) {
                            Self::speak(speech, &sentence).await;
                        }
                    }
                }

                Some(StreamChunk::ThinkingDelta { text }) => {
                    // Display only; reasoning is never spoken and does not
                    // feed sentence detection.
                    ui.render(UiEvent::Thinking { text });
                }

                Some(StreamChunk::ToolEvent { name, payload }) => {
                    // Spoken only when the handler supplied readable text.
                    if speech_enabled {
                        if let Some(line) = payload.get("speech").and_then(|v| v.as_str()) {
                            Self::speak(speech, line).await;
                        }
                    }
                    ui.render(UiEvent::Notice { name, payload });
                }

                Some(StreamChunk::Error { kind, message }) => {
                    sentences.clear();
                    if kind == ErrorKind::Cancelled {
                        return DrainReport::new(DrainStatus::Cancelled, transcript);
                    }
                    ui.render(UiEvent::Failure { kind, message });
                    return DrainReport::new(DrainStatus::Failed(kind), transcript);
                }

                Some(StreamChunk::Done) => {
                    if speech_enabled {
                        if let Some(rest) = sentences.flush() {
                            Self::speak(speech, &rest).await;
                        }
                    }
                    return DrainReport::new(DrainStatus::Completed, transcript);
                }

                None => {
                    // A handler must terminate with Done or Error; a bare
                    // end of stream is a contract violation.
                    sentences.clear();
                    tracing::error!("Handler stream ended without a terminal chunk");
                    ui.render(UiEvent::Failure {
                        kind: ErrorKind::Internal,
                        message: "The response ended unexpectedly.".to_string(),
                    });
                    return DrainReport::new(DrainStatus::Failed(ErrorKind::Internal), transcript);
                }
            }
        }
    }

    /// Speech is best-effort: a sink failure is logged, never fatal to
    /// the request.
    async fn speak(speech: &dyn SpeechSink, text: &str) {
        if let Err(err) = speech.speak(text).await {
            tracing::warn!(error = %err, "Speech sink failed");
        }
    }
}
