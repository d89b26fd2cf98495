//! Terminal stand-ins for the platform notification and haptics services.

use std::io::Write;

use pomobreath_core::error::{CoreError, Result};
use pomobreath_core::{Feedback, FeedbackSink, NotificationRequest, NotificationScheduler};
use tokio::task::JoinHandle;

/// Prints the alert to stderr when the phase is due. At most one is pending.
#[derive(Debug, Default)]
pub struct TerminalNotifier {
    pending: Option<JoinHandle<()>>,
}

impl NotificationScheduler for TerminalNotifier {
    fn schedule(&mut self, request: &NotificationRequest) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::Notification(e.to_string()))?;
        self.cancel_pending()?;

        let content = request.content();
        let delay = (request.fires_at - chrono::Utc::now())
            .to_std()
            .unwrap_or_default();
        tracing::info!(
            fires_at = %request.fires_at,
            phase = request.phase_label(),
            "notification scheduled"
        );
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            eprintln!("\n{}: {}", content.title, content.body);
        }));
        Ok(())
    }

    fn cancel_pending(&mut self) -> Result<()> {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                tracing::debug!("pending notification cancelled");
            }
            handle.abort();
        }
        Ok(())
    }
}

impl Drop for TerminalNotifier {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

/// Rings the terminal bell on phase starts and on completion.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalFeedback;

impl FeedbackSink for TerminalFeedback {
    fn emit(&mut self, feedback: Feedback) {
        tracing::debug!(?feedback, "feedback");
        if matches!(feedback, Feedback::PhaseStart(_) | Feedback::Success) {
            let mut stderr = std::io::stderr();
            // Best effort.
            let _ = stderr.write_all(b"\x07").and_then(|()| stderr.flush());
        }
    }
}
