use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::PhaseKind;

/// A request to alert the user when `phase` ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub fires_at: DateTime<Utc>,
    pub phase: PhaseKind,
    pub task_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

impl NotificationRequest {
    pub fn new(fires_at: DateTime<Utc>, phase: PhaseKind, task_title: Option<String>) -> Self {
        Self {
            fires_at,
            phase,
            task_title,
        }
    }

    pub fn phase_label(&self) -> &'static str {
        self.phase.title()
    }

    pub fn content(&self) -> NotificationContent {
        let (title, body) = match self.phase {
            PhaseKind::Work => {
                let body = match self.task_title.as_deref().filter(|t| !t.is_empty()) {
                    Some(task) => format!("You focused on “{task}”. Time for a break!"),
                    None => "Great job! Time for a break.".to_string(),
                };
                ("Work session complete".to_string(), body)
            }
            PhaseKind::Break => (
                "Break is over".to_string(),
                "Let’s get back to focus.".to_string(),
            ),
            kind => (
                format!("{} complete", kind.title()),
                "Next: keep breathing.".to_string(),
            ),
        };
        NotificationContent { title, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_content_mentions_task() {
        let req = NotificationRequest::new(Utc::now(), PhaseKind::Work, Some("Write report".into()));
        let content = req.content();
        assert_eq!(content.title, "Work session complete");
        assert!(content.body.contains("Write report"));
    }

    #[test]
    fn work_content_without_task() {
        let req = NotificationRequest::new(Utc::now(), PhaseKind::Work, Some(String::new()));
        assert_eq!(req.content().body, "Great job! Time for a break.");
    }

    #[test]
    fn breathing_content() {
        let req = NotificationRequest::new(Utc::now(), PhaseKind::Exhale, None);
        assert_eq!(req.content().title, "Exhale complete");
        assert_eq!(req.phase_label(), "Exhale");
    }
}
