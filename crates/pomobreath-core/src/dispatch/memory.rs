//! In-memory collaborators. Clones share their contents, so a caller can
//! hand one to a dispatcher and keep another for inspection.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{Feedback, FeedbackSink, NotificationRequest, NotificationScheduler, SessionRecorder};
use crate::error::{CoreError, Result};
use crate::session::CompletedSession;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    sessions: Arc<Mutex<Vec<CompletedSession>>>,
    fail: bool,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose every write fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sessions(&self) -> Vec<CompletedSession> {
        lock(&self.sessions).clone()
    }
}

impl SessionRecorder for MemoryRecorder {
    fn record(&mut self, session: &CompletedSession) -> Result<()> {
        if self.fail {
            return Err(CoreError::Custom("storage unavailable".into()));
        }
        lock(&self.sessions).push(session.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct NotifierState {
    pending: Option<NotificationRequest>,
    scheduled: usize,
    cancelled: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    state: Arc<Mutex<NotifierState>>,
    denied: bool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaves like a platform where the user refused notifications.
    pub fn denied() -> Self {
        Self {
            denied: true,
            ..Self::default()
        }
    }

    pub fn pending(&self) -> Option<NotificationRequest> {
        lock(&self.state).pending.clone()
    }

    pub fn scheduled_count(&self) -> usize {
        lock(&self.state).scheduled
    }

    pub fn cancelled_count(&self) -> usize {
        lock(&self.state).cancelled
    }
}

impl NotificationScheduler for MemoryNotifier {
    fn schedule(&mut self, request: &NotificationRequest) -> Result<()> {
        if self.denied {
            return Err(CoreError::Notification("authorization denied".into()));
        }
        let mut state = lock(&self.state);
        state.pending = Some(request.clone());
        state.scheduled += 1;
        Ok(())
    }

    fn cancel_pending(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.pending.take().is_some() {
            state.cancelled += 1;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFeedback {
    signals: Arc<Mutex<Vec<Feedback>>>,
}

impl MemoryFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<Feedback> {
        lock(&self.signals).clone()
    }
}

impl FeedbackSink for MemoryFeedback {
    fn emit(&mut self, feedback: Feedback) {
        lock(&self.signals).push(feedback);
    }
}

/// Discards every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn emit(&mut self, _feedback: Feedback) {}
}
