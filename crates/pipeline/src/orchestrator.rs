//! Orchestrator
//!
//! Top-level coordinator: classify, resolve, run, drain. Owns the
//! per-session phase transitions and is the last line of defense for
//! faults; nothing escapes `submit` as a raw panic or backend error.

use std::sync::Arc;

use pocket_core::{
    DrainStatus, ErrorKind, ExecutionRequest, SpeechSink, Turn, UiEvent, UiSink, Utterance,
};
use pocket_handlers::HandlerRegistry;

use crate::classifier::IntentClassifier;
use crate::merger::ResponseStreamMerger;
use crate::session::{Session, SessionPhase};
use crate::PipelineError;

/// Intent routing and response orchestration
pub struct Orchestrator {
    classifier: IntentClassifier,
    registry: Arc<HandlerRegistry>,
    ui: Arc<dyn UiSink>,
    speech: Arc<dyn SpeechSink>,
    max_history: usize,
}

impl Orchestrator {
    /// Create an orchestrator over a validated registry
    pub fn new(
        classifier: IntentClassifier,
        registry: Arc<HandlerRegistry>,
        ui: Arc<dyn UiSink>,
        speech: Arc<dyn SpeechSink>,
        max_history: usize,
    ) -> Self {
        Self {
            classifier,
            registry,
            ui,
            speech,
            max_history,
        }
    }

    /// Route one utterance through its handler and drain the response.
    ///
    /// Rejected with `SessionBusy` unless the session is idle; there is
    /// no queueing. Every other outcome, including handler panics, comes
    /// back as a terminal [`DrainStatus`] and the session returns to
    /// idle, ready for the next submission.
    pub async fn submit(
        &self,
        session: &Arc<Session>,
        text: &str,
    ) -> Result<DrainStatus, PipelineError> {
        session.try_begin()?;
        session.touch();

        let utterance = Utterance::new(text, &session.id);
        let history = session.history_window(self.max_history);

        let classified = self.classifier.classify(text, &history).await;
        tracing::info!(
            session_id = %session.id,
            intent = %classified.intent,
            confidence = classified.confidence,
            "Utterance classified"
        );

        let handler = match self.registry.resolve(classified.intent) {
            Ok(handler) => handler,
            Err(err) => {
                tracing::error!(error = %err, "Handler resolution failed");
                self.ui.render(UiEvent::Failure {
                    kind: ErrorKind::UnregisteredIntent,
                    message: format!("No handler can take this request ({}).", err),
                });
                session.record_turn(Turn::user(text));
                session.finish();
                return Ok(DrainStatus::Failed(ErrorKind::UnregisteredIntent));
            }
        };

        session.set_phase(SessionPhase::Dispatched);
        let cancel = session.arm_cancel();
        let request = ExecutionRequest::new(utterance, classified, history, cancel.clone());
        session.record_turn(Turn::user(text));
        session.set_phase(SessionPhase::Streaming);

        let ui = Arc::clone(&self.ui);
        let speech = Arc::clone(&self.speech);
        let speech_enabled = session.speech_enabled();

        // The invocation runs in its own task so a panic in the handler
        // or merger surfaces as a join error here instead of unwinding
        // through the caller.
        let invocation = tokio::spawn(async move {
            let stream = handler.run(request);
            ResponseStreamMerger::drain(stream, ui.as_ref(), speech.as_ref(), speech_enabled, cancel)
                .await
        });

        let report = match invocation.await {
            Ok(report) => report,
            Err(join_err) => {
                tracing::error!(error = %join_err, "Invocation task failed");
                self.ui.render(UiEvent::Failure {
                    kind: ErrorKind::Internal,
                    message: "Something went wrong handling that request.".to_string(),
                });
                session.finish();
                return Ok(DrainStatus::Failed(ErrorKind::Internal));
            }
        };

        if !report.transcript.is_empty() {
            session.record_turn(Turn::assistant(report.transcript));
        }
        session.finish();

        tracing::info!(session_id = %session.id, status = ?report.status, "Request finished");
        Ok(report.status)
    }

    /// Cancel the session's active invocation, if it is streaming.
    /// Idempotent; a no-op in any other phase.
    pub fn cancel(&self, session: &Session) {
        session.cancel();
    }
}
