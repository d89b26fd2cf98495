//! Collaborators that react to sequencer events.
//!
//! The sequencer never touches persistence, notifications or haptics. The
//! [`EventDispatcher`] forwards its events to these traits; a failing
//! collaborator is logged and otherwise ignored.

mod dispatcher;
mod memory;
mod notification;

pub use dispatcher::EventDispatcher;
pub use memory::{MemoryFeedback, MemoryNotifier, MemoryRecorder, NullFeedback};
pub use notification::{NotificationContent, NotificationRequest};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::CompletedSession;
use crate::timer::PhaseKind;

/// Receives naturally completed sessions. Append-only; retention is the
/// implementor's business.
pub trait SessionRecorder: Send {
    fn record(&mut self, session: &CompletedSession) -> Result<()>;
}

/// Schedules the local "phase finished" alert. Only one entry may be
/// pending at a time, so `schedule` replaces whatever was there.
pub trait NotificationScheduler: Send {
    fn schedule(&mut self, request: &NotificationRequest) -> Result<()>;

    fn cancel_pending(&mut self) -> Result<()>;
}

/// Categorical haptic/feedback signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "phase", rename_all = "snake_case")]
pub enum Feedback {
    PhaseStart(PhaseKind),
    Pause,
    Skip,
    Success,
}

pub trait FeedbackSink: Send {
    fn emit(&mut self, feedback: Feedback);
}
