//! Session management
//!
//! One session per conversation, with at most one in-flight request.
//! The phase machine is the single place the in-flight rule is enforced;
//! only the orchestrator drives transitions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use pocket_core::{CancelToken, Turn};

use crate::PipelineError;

/// Per-session request phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No request in flight; submissions are accepted
    Idle,
    /// Classifying the submitted utterance
    Classifying,
    /// Handler resolved, invocation starting
    Dispatched,
    /// Handler output is being drained
    Streaming,
}

/// One conversation's state
pub struct Session {
    /// Session ID
    pub id: String,
    /// Creation time
    created_at: Instant,
    /// Last activity
    last_activity: RwLock<Instant>,
    /// Turn history
    history: RwLock<Vec<Turn>>,
    /// Whether responses are spoken
    speech_enabled: RwLock<bool>,
    /// Request phase; guards the single-in-flight invariant
    phase: Mutex<SessionPhase>,
    /// Cancel signal for the active invocation, present only while one
    /// is in flight
    cancel_tx: Mutex<Option<watch::Sender<bool>>>,
}

impl Session {
    /// Create a new session
    pub fn new(id: impl Into<String>, speech_enabled: bool) -> Self {
        Self {
            id: id.into(),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
            history: RwLock::new(Vec::new()),
            speech_enabled: RwLock::new(speech_enabled),
            phase: Mutex::new(SessionPhase::Idle),
            cancel_tx: Mutex::new(None),
        }
    }

    /// Current phase
    pub fn phase(&self) -> SessionPhase {
        *self.phase.lock()
    }

    /// Begin a request: Idle -> Classifying, or SessionBusy.
    pub(crate) fn try_begin(&self) -> Result<(), PipelineError> {
        let mut phase = self.phase.lock();
        if *phase != SessionPhase::Idle {
            return Err(PipelineError::SessionBusy);
        }
        *phase = SessionPhase::Classifying;
        Ok(())
    }

    pub(crate) fn set_phase(&self, next: SessionPhase) {
        *self.phase.lock() = next;
    }

    /// Create the cancel channel for the invocation about to start.
    pub(crate) fn arm_cancel(&self) -> CancelToken {
        let (tx, token) = CancelToken::channel();
        *self.cancel_tx.lock() = Some(tx);
        token
    }

    /// Return the session to Idle and drop the cancel handle.
    pub(crate) fn finish(&self) {
        *self.cancel_tx.lock() = None;
        *self.phase.lock() = SessionPhase::Idle;
    }

    /// Signal cancellation of the active invocation.
    ///
    /// Valid only while Streaming; calling at any other time is a no-op,
    /// so repeated cancels are harmless.
    pub fn cancel(&self) -> bool {
        if *self.phase.lock() != SessionPhase::Streaming {
            return false;
        }
        if let Some(tx) = self.cancel_tx.lock().as_ref() {
            let _ = tx.send(true);
            tracing::debug!(session_id = %self.id, "Cancellation signalled");
            return true;
        }
        false
    }

    /// Append a turn to the history
    pub(crate) fn record_turn(&self, turn: Turn) {
        self.history.write().push(turn);
    }

    /// The most recent `n` turns
    pub fn history_window(&self, n: usize) -> Vec<Turn> {
        let history = self.history.read();
        let skip = history.len().saturating_sub(n);
        history[skip..].to_vec()
    }

    /// Total turns recorded
    pub fn turn_count(&self) -> usize {
        self.history.read().len()
    }

    /// Whether responses are spoken
    pub fn speech_enabled(&self) -> bool {
        *self.speech_enabled.read()
    }

    /// Toggle speech for this session
    pub fn set_speech_enabled(&self, enabled: bool) {
        *self.speech_enabled.write() = enabled;
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Check if session has been idle longer than `timeout`
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    /// Session age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Owns sessions by id, with a capacity bound and idle expiry.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    speech_default: bool,
}

impl SessionManager {
    /// Create a manager
    pub fn new(max_sessions: usize, session_timeout: Duration, speech_default: bool) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            speech_default,
        }
    }

    /// Create a new session
    pub fn create(&self) -> Result<Arc<Session>, PipelineError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);

            if sessions.len() >= self.max_sessions {
                return Err(PipelineError::Session("Max sessions reached".to_string()));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(&id, self.speech_default));
        sessions.insert(id.clone(), session.clone());

        tracing::info!(session_id = %id, "Created session");

        Ok(session)
    }

    /// Get a session by ID
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session
    pub fn remove(&self, id: &str) {
        if self.sessions.write().remove(id).is_some() {
            tracing::info!(session_id = %id, "Removed session");
        }
    }

    /// Active session count
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Cleanup expired sessions
    pub fn cleanup_expired(&self) {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions);
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) {
        let timeout = self.session_timeout;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(timeout) && s.phase() == SessionPhase::Idle)
            .map(|(id, _)| id.clone())
            .collect();

        for id in expired {
            sessions.remove(&id);
            tracing::info!(session_id = %id, "Expired session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_machine() {
        let session = Session::new("s1", true);
        assert_eq!(session.phase(), SessionPhase::Idle);

        session.try_begin().unwrap();
        assert_eq!(session.phase(), SessionPhase::Classifying);

        // Second begin while busy is rejected.
        assert!(matches!(
            session.try_begin(),
            Err(PipelineError::SessionBusy)
        ));

        session.finish();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.try_begin().is_ok());
    }

    #[test]
    fn test_cancel_only_while_streaming() {
        let session = Session::new("s1", true);
        let token = session.arm_cancel();

        // Not streaming yet: no-op.
        assert!(!session.cancel());
        assert!(!token.is_cancelled());

        session.set_phase(SessionPhase::Streaming);
        assert!(session.cancel());
        assert!(token.is_cancelled());

        // Idempotent.
        assert!(session.cancel());
        session.finish();
        assert!(!session.cancel());
    }

    #[test]
    fn test_history_window() {
        let session = Session::new("s1", false);
        for i in 0..10 {
            session.record_turn(Turn::user(format!("msg {}", i)));
        }

        let window = session.history_window(3);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].content, "msg 7");
        assert_eq!(session.turn_count(), 10);
    }

    #[test]
    fn test_manager_capacity() {
        let manager = SessionManager::new(2, Duration::from_secs(3600), true);
        manager.create().unwrap();
        manager.create().unwrap();

        assert!(manager.create().is_err());
        assert_eq!(manager.count(), 2);
    }

    #[test]
    fn test_manager_get_and_remove() {
        let manager = SessionManager::new(4, Duration::from_secs(3600), true);
        let session = manager.create().unwrap();
        let id = session.id.clone();

        assert!(manager.get(&id).is_some());
        manager.remove(&id);
        assert!(manager.get(&id).is_none());
    }

    #[test]
    fn test_expiry_skips_busy_sessions() {
        let manager = SessionManager::new(4, Duration::from_millis(0), true);
        let idle = manager.create().unwrap();
        let busy = manager.create().unwrap();
        busy.try_begin().unwrap();

        std::thread::sleep(Duration::from_millis(5));
        manager.cleanup_expired();

        assert!(manager.get(&idle.id).is_none());
        assert!(manager.get(&busy.id).is_some());
    }
}
