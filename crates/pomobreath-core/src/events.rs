use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::CompletedSession;
use crate::timer::{PhaseKind, TimerState};

/// Every state change of the sequencer produces an Event.
/// The owning controller dispatches them to collaborators and subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Timer began or resumed running the current phase.
    TimerStarted {
        phase_index: usize,
        cycle: u32,
        phase: PhaseKind,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// A phase ran to zero on its own.
    PhaseCompleted {
        session: CompletedSession,
        at: DateTime<Utc>,
    },
    /// Sequencer entered a new phase after a natural completion.
    PhaseAdvanced {
        phase_index: usize,
        cycle: u32,
        phase: PhaseKind,
        duration_secs: u64,
        /// False when the new phase waits for an explicit start.
        running: bool,
        at: DateTime<Utc>,
    },
    /// User skipped a phase. `to_phase` is `None` when the skip ended the plan.
    PhaseSkipped {
        from_index: usize,
        from_phase: PhaseKind,
        to_index: Option<usize>,
        to_phase: Option<PhaseKind>,
        cycle: u32,
        running: bool,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    PlanCompleted {
        cycles: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        phase_index: usize,
        cycle: u32,
        repeat: u32,
        phase: PhaseKind,
        phase_label: String,
        remaining_ms: u64,
        total_ms: u64,
        phase_progress: f64,
        plan_progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerReset { at }
            | Event::PhaseCompleted { at, .. }
            | Event::PhaseAdvanced { at, .. }
            | Event::PhaseSkipped { at, .. }
            | Event::PlanCompleted { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }

    /// Phase-to-phase transitions (natural or skipped).
    pub fn is_transition(&self) -> bool {
        matches!(self, Event::PhaseAdvanced { .. } | Event::PhaseSkipped { .. })
    }
}
