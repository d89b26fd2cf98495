use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::PhaseKind;

/// One naturally finished phase. Skipped phases never produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub id: Uuid,
    pub phase: PhaseKind,
    /// Task title for focus sessions.
    pub label: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl CompletedSession {
    pub fn new(
        phase: PhaseKind,
        label: Option<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase,
            label,
            started_at,
            ended_at,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration().num_seconds().max(0) as u64
    }

    /// `MM:SS`, minutes unbounded.
    pub fn duration_text(&self) -> String {
        let total = self.duration_secs();
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}
