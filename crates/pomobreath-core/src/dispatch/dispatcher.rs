use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::{
    Feedback, FeedbackSink, NotificationRequest, NotificationScheduler, NullFeedback,
    SessionRecorder,
};
use crate::events::Event;
use crate::session::CompletedSession;
use crate::timer::PhaseKind;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Routes sequencer events to the collaborators, in emission order.
pub struct EventDispatcher {
    recorder: Box<dyn SessionRecorder>,
    notifier: Box<dyn NotificationScheduler>,
    feedback: Box<dyn FeedbackSink>,
    feedback_enabled: bool,
    notifications_enabled: bool,
    events: broadcast::Sender<Event>,
}

impl EventDispatcher {
    pub fn new(
        recorder: impl SessionRecorder + 'static,
        notifier: impl NotificationScheduler + 'static,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            recorder: Box::new(recorder),
            notifier: Box::new(notifier),
            feedback: Box::new(NullFeedback),
            feedback_enabled: true,
            notifications_enabled: true,
            events,
        }
    }

    pub fn with_feedback(mut self, feedback: impl FeedbackSink + 'static) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    pub fn with_feedback_enabled(mut self, enabled: bool) -> Self {
        self.feedback_enabled = enabled;
        self
    }

    pub fn with_notifications_enabled(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }

    /// Every dispatched event is also published here.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Apply side effects for `events`. `label` is the task title attached
    /// to notifications.
    ///
    /// A batch from one catch-up tick may advance through several phases;
    /// only the last of them still has a future end worth announcing.
    pub fn dispatch(&mut self, events: &[Event], label: Option<&str>) {
        let last_advance = events
            .iter()
            .rposition(|e| matches!(e, Event::PhaseAdvanced { .. }));
        for (i, event) in events.iter().enumerate() {
            let superseded = last_advance.is_some_and(|last| i < last);
            self.handle(event, label, superseded);
            // No subscribers is fine.
            let _ = self.events.send(event.clone());
        }
    }

    fn handle(&mut self, event: &Event, label: Option<&str>, superseded: bool) {
        match event {
            Event::TimerStarted {
                phase,
                remaining_ms,
                at,
                ..
            } => {
                self.cancel_notification();
                self.arm_notification(*at, *remaining_ms, *phase, label);
                self.signal(Feedback::PhaseStart(*phase));
            }
            Event::TimerPaused { .. } => {
                self.cancel_notification();
                self.signal(Feedback::Pause);
            }
            Event::TimerReset { .. } => {
                self.cancel_notification();
            }
            Event::PhaseCompleted { session, .. } => {
                self.cancel_notification();
                self.record(session);
            }
            Event::PhaseAdvanced {
                phase,
                duration_secs,
                running,
                at,
                ..
            } => {
                if *running && !superseded {
                    self.arm_notification(*at, duration_secs * 1000, *phase, label);
                    self.signal(Feedback::PhaseStart(*phase));
                }
            }
            Event::PhaseSkipped {
                to_phase,
                running,
                remaining_ms,
                at,
                ..
            } => {
                self.cancel_notification();
                self.signal(Feedback::Skip);
                if let (Some(phase), true) = (*to_phase, *running) {
                    self.arm_notification(*at, *remaining_ms, phase, label);
                }
            }
            Event::PlanCompleted { .. } => {
                self.cancel_notification();
                self.signal(Feedback::Success);
            }
            Event::StateSnapshot { .. } => {}
        }
    }

    fn record(&mut self, session: &CompletedSession) {
        if !session.phase.is_recorded() {
            return;
        }
        if let Err(e) = self.recorder.record(session) {
            tracing::warn!(error = %e, phase = session.phase.as_str(), "failed to record session");
        }
    }

    fn arm_notification(
        &mut self,
        from: DateTime<Utc>,
        remaining_ms: u64,
        phase: PhaseKind,
        label: Option<&str>,
    ) {
        if !self.notifications_enabled {
            return;
        }
        let fires_at = from + chrono::Duration::milliseconds(remaining_ms as i64);
        let request = NotificationRequest::new(fires_at, phase, label.map(str::to_string));
        if let Err(e) = self.notifier.schedule(&request) {
            tracing::warn!(error = %e, "failed to schedule notification");
        }
    }

    fn cancel_notification(&mut self) {
        if let Err(e) = self.notifier.cancel_pending() {
            tracing::warn!(error = %e, "failed to cancel pending notification");
        }
    }

    fn signal(&mut self, feedback: Feedback) {
        if self.feedback_enabled {
            self.feedback.emit(feedback);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("feedback_enabled", &self.feedback_enabled)
            .field("notifications_enabled", &self.notifications_enabled)
            .finish_non_exhaustive()
    }
}
