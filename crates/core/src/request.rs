//! Execution request and cooperative cancellation

use tokio::sync::watch;

use crate::{ClassifiedIntent, Turn, Utterance};

/// Advisory cancellation signal.
///
/// Cancellation is cooperative: producers observe the token at their
/// natural suspension points and stop within one such point. An in-flight
/// backend call that cannot be interrupted is allowed to complete; its
/// result is discarded.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create a linked sender/token pair. Sending `true` cancels.
    pub fn channel() -> (watch::Sender<bool>, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (tx, CancelToken { rx })
    }

    /// A token that can never fire, for requests without a controller.
    pub fn never() -> CancelToken {
        let (tx, rx) = watch::channel(false);
        // Keep the sender alive forever so the channel never closes.
        std::mem::forget(tx);
        CancelToken { rx }
    }

    /// Check the signal without waiting
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the signal fires. Also resolves if the controlling side
    /// is dropped, so a waiter can never hang on an abandoned invocation.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Everything one handler invocation needs.
///
/// Owned exclusively by the active invocation; dropped when it completes
/// or is cancelled.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// The submitted utterance
    pub utterance: Utterance,
    /// Classification that routed this request
    pub intent: ClassifiedIntent,
    /// History window for context-aware handlers
    pub history: Vec<Turn>,
    /// Cancellation signal for this invocation
    pub cancel: CancelToken,
}

impl ExecutionRequest {
    /// Build a request for one invocation
    pub fn new(
        utterance: Utterance,
        intent: ClassifiedIntent,
        history: Vec<Turn>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            utterance,
            intent,
            history,
            cancel,
        }
    }
}
