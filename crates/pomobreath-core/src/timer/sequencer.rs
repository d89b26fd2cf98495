//! Phase sequencer implementation.
//!
//! The sequencer is a pure state machine over a [`PhasePlan`]. It has no
//! clock and no thread of its own: the caller feeds it measured elapsed time
//! through `tick()`, and every command returns the events it produced.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused | Idle | Completed)
//! Paused -> Running
//! any -> Idle (reset)
//! ```
//!
//! Remaining time is driven only by accumulated elapsed deltas. Wall-clock
//! timestamps are kept for session records and never feed back into the
//! countdown, so a suspended process cannot fast-forward a phase.
//!
//! ## Usage
//!
//! ```ignore
//! let mut seq = PhaseSequencer::new(plan);
//! seq.start();
//! // On every wake of the driver:
//! for event in seq.tick(elapsed) { /* dispatch */ }
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::{PhaseKind, PhasePlan, PhaseSpec};
use crate::events::Event;
use crate::session::CompletedSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Not running, positioned at the start of a phase.
    Idle,
    Running,
    /// Not running, part-way through a phase.
    Paused,
    /// Every cycle of the plan has finished.
    Completed,
}

/// Core phase state machine.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseSequencer {
    plan: PhasePlan,
    state: TimerState,
    phase_index: usize,
    cycle: u32,
    remaining: Duration,
    /// Set while running; used only to timestamp completed sessions.
    #[serde(default)]
    phase_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    label: Option<String>,
}

impl PhaseSequencer {
    /// Create a sequencer positioned at the plan's first active phase.
    pub fn new(plan: PhasePlan) -> Self {
        let phase_index = plan.first_active_index();
        let remaining = plan
            .phase(phase_index)
            .map(PhaseSpec::duration)
            .unwrap_or_default();
        Self {
            plan,
            state: TimerState::Idle,
            phase_index,
            cycle: 0,
            remaining,
            phase_started_at: None,
            label: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining.as_millis() as u64
    }

    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    pub fn current_phase(&self) -> &PhaseSpec {
        // Holds for constructed and deserialized sequencers alike.
        &self.plan.phases()[self.phase_index]
    }

    pub fn phase_started_at(&self) -> Option<DateTime<Utc>> {
        self.phase_started_at
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Free-text label attached to sessions completed from now on.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label.filter(|l| !l.trim().is_empty());
    }

    pub fn total_ms(&self) -> u64 {
        self.current_phase().duration_ms()
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        let total = self.current_phase().duration();
        if total.is_zero() {
            return 0.0;
        }
        (1.0 - self.remaining.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// 0.0 .. 100.0 progress across the whole plan.
    pub fn plan_progress_pct(&self) -> f64 {
        if self.state == TimerState::Completed {
            return 100.0;
        }
        let total = self.plan.total_duration_secs() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let done = self.plan.cumulative_secs(self.cycle, self.phase_index) as f64;
        let in_phase = self.current_phase().duration().as_secs_f64() - self.remaining.as_secs_f64();
        ((done + in_phase) / total * 100.0).clamp(0.0, 100.0)
    }

    /// Wall-clock instant at which the current phase will expire, if running.
    pub fn expected_end(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.is_running().then(|| now + to_chrono(self.remaining))
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let phase = self.current_phase();
        Event::StateSnapshot {
            state: self.state,
            phase_index: self.phase_index,
            cycle: self.cycle,
            repeat: self.plan.repeat(),
            phase: phase.kind,
            phase_label: phase.kind.title().to_string(),
            remaining_ms: self.remaining_ms(),
            total_ms: self.total_ms(),
            phase_progress: self.phase_progress(),
            plan_progress_pct: self.plan_progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(Utc::now())
    }

    /// Start or resume the current phase. No-op while already running.
    pub fn start_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match self.state {
            TimerState::Running => None,
            TimerState::Idle | TimerState::Paused | TimerState::Completed => {
                if self.state == TimerState::Completed || self.remaining.is_zero() {
                    self.rewind();
                }
                self.state = TimerState::Running;
                self.phase_started_at = Some(now);
                tracing::debug!(
                    phase = self.current_phase().kind.as_str(),
                    cycle = self.cycle,
                    remaining_ms = self.remaining_ms(),
                    "sequencer started"
                );
                Some(Event::TimerStarted {
                    phase_index: self.phase_index,
                    cycle: self.cycle,
                    phase: self.current_phase().kind,
                    remaining_ms: self.remaining_ms(),
                    at: now,
                })
            }
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(Utc::now())
    }

    /// Freeze remaining time. No-op unless running.
    pub fn pause_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        self.phase_started_at = None;
        Some(Event::TimerPaused {
            remaining_ms: self.remaining_ms(),
            at: now,
        })
    }

    pub fn reset(&mut self) -> Event {
        self.reset_at(Utc::now())
    }

    /// Return to the first phase of cycle 0, not running, from any state.
    pub fn reset_at(&mut self, now: DateTime<Utc>) -> Event {
        self.pause_at(now);
        self.rewind();
        Event::TimerReset { at: now }
    }

    pub fn skip_phase(&mut self) -> Vec<Event> {
        self.skip_phase_at(Utc::now())
    }

    /// Abandon the current phase without recording it and move on.
    ///
    /// Keeps running if it was running. Skipping the last phase of the last
    /// cycle completes the plan.
    pub fn skip_phase_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.state == TimerState::Completed {
            return Vec::new();
        }
        let was_running = self.is_running();
        let from_index = self.phase_index;
        let from_phase = self.current_phase().kind;

        match self.next_position() {
            Some((index, cycle)) => {
                self.enter(index, cycle);
                if was_running {
                    self.phase_started_at = Some(now);
                } else {
                    self.state = TimerState::Idle;
                    self.phase_started_at = None;
                }
                vec![Event::PhaseSkipped {
                    from_index,
                    from_phase,
                    to_index: Some(index),
                    to_phase: Some(self.current_phase().kind),
                    cycle,
                    running: was_running,
                    remaining_ms: self.remaining_ms(),
                    at: now,
                }]
            }
            None => {
                self.finish();
                vec![
                    Event::PhaseSkipped {
                        from_index,
                        from_phase,
                        to_index: None,
                        to_phase: None,
                        cycle: self.cycle,
                        running: false,
                        remaining_ms: 0,
                        at: now,
                    },
                    Event::PlanCompleted {
                        cycles: self.cycle,
                        at: now,
                    },
                ]
            }
        }
    }

    pub fn tick(&mut self, elapsed: Duration) -> Vec<Event> {
        self.tick_at(elapsed, Utc::now())
    }

    /// Advance by `elapsed` of measured time.
    ///
    /// A single call may cross any number of phase boundaries. Sessions that
    /// ended inside the interval are back-dated by the time still unconsumed
    /// at their boundary.
    pub fn tick_at(&mut self, elapsed: Duration, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        if self.state != TimerState::Running {
            return events;
        }

        let mut budget = elapsed;
        loop {
            if budget < self.remaining {
                self.remaining -= budget;
                break;
            }
            budget -= self.remaining;
            self.remaining = Duration::ZERO;

            let boundary = now - to_chrono(budget);
            let finished = self.current_phase();
            let started_at = self
                .phase_started_at
                .unwrap_or_else(|| boundary - to_chrono(finished.duration()));
            events.push(Event::PhaseCompleted {
                session: CompletedSession::new(
                    finished.kind,
                    self.label.clone(),
                    started_at,
                    boundary,
                ),
                at: boundary,
            });

            let Some((index, cycle)) = self.next_position() else {
                self.finish();
                tracing::debug!(cycles = self.cycle, "plan completed");
                events.push(Event::PlanCompleted {
                    cycles: self.cycle,
                    at: boundary,
                });
                break;
            };

            self.enter(index, cycle);
            let auto_start = self.current_phase().auto_start;
            tracing::debug!(
                phase = self.current_phase().kind.as_str(),
                cycle,
                auto_start,
                "phase advanced"
            );
            events.push(Event::PhaseAdvanced {
                phase_index: index,
                cycle,
                phase: self.current_phase().kind,
                duration_secs: self.current_phase().duration_secs,
                running: auto_start,
                at: boundary,
            });

            if auto_start {
                self.phase_started_at = Some(boundary);
            } else {
                // Leftover time is dropped; the phase waits for `start()`.
                self.state = TimerState::Idle;
                self.phase_started_at = None;
                break;
            }
        }
        events
    }

    pub fn apply_plan(&mut self, plan: PhasePlan) -> Option<Event> {
        self.apply_plan_at(plan, Utc::now())
    }

    /// Replace the plan.
    ///
    /// Idle and completed sequencers are reinitialised. Running and paused
    /// ones keep their position if the layout is unchanged, with remaining
    /// time clamped to the new phase duration. A running sequencer given a
    /// new layout starts that plan from its first phase and keeps running;
    /// a paused one is reset.
    pub fn apply_plan_at(&mut self, plan: PhasePlan, now: DateTime<Utc>) -> Option<Event> {
        if matches!(self.state, TimerState::Idle | TimerState::Completed) {
            self.plan = plan;
            return Some(self.reset_at(now));
        }

        let keep_position = self.plan.same_layout(&plan)
            && plan
                .phase(self.phase_index)
                .is_some_and(PhaseSpec::is_active);
        self.plan = plan;

        if keep_position {
            let limit = self.current_phase().duration();
            self.remaining = self.remaining.min(limit);
            self.cycle = self.cycle.min(self.plan.repeat() - 1);
            if !self.is_running() {
                return None;
            }
        } else if self.is_running() {
            self.rewind();
            self.state = TimerState::Running;
            self.phase_started_at = Some(now);
        } else {
            return Some(self.reset_at(now));
        }

        Some(Event::TimerStarted {
            phase_index: self.phase_index,
            cycle: self.cycle,
            phase: self.current_phase().kind,
            remaining_ms: self.remaining_ms(),
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Position after the current phase, or `None` once the plan is exhausted.
    fn next_position(&self) -> Option<(usize, u32)> {
        if let Some(index) = self.plan.next_active_index(self.phase_index) {
            return Some((index, self.cycle));
        }
        let next_cycle = self.cycle + 1;
        (next_cycle < self.plan.repeat()).then(|| (self.plan.first_active_index(), next_cycle))
    }

    fn enter(&mut self, index: usize, cycle: u32) {
        self.phase_index = index;
        self.cycle = cycle;
        self.remaining = self.current_phase().duration();
    }

    fn rewind(&mut self) {
        self.state = TimerState::Idle;
        self.phase_started_at = None;
        self.enter(self.plan.first_active_index(), 0);
    }

    fn finish(&mut self) {
        self.state = TimerState::Completed;
        self.remaining = Duration::ZERO;
        self.phase_started_at = None;
        self.cycle = self.plan.repeat();
    }
}

// Restored sequencers are checked against their own plan.
impl<'de> Deserialize<'de> for PhaseSequencer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct Raw {
            plan: PhasePlan,
            state: TimerState,
            phase_index: usize,
            cycle: u32,
            remaining: Duration,
            #[serde(default)]
            phase_started_at: Option<DateTime<Utc>>,
            #[serde(default)]
            label: Option<String>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let phase = raw.plan.phase(raw.phase_index).ok_or_else(|| {
            D::Error::custom(format!(
                "phase_index {} out of range for {} phases",
                raw.phase_index,
                raw.plan.phases().len()
            ))
        })?;
        let completed = raw.state == TimerState::Completed;
        if !completed && !phase.is_active() {
            return Err(D::Error::custom(format!(
                "phase_index {} points at an inactive phase",
                raw.phase_index
            )));
        }
        if raw.remaining > phase.duration() {
            return Err(D::Error::custom(format!(
                "remaining {:?} exceeds phase duration {:?}",
                raw.remaining,
                phase.duration()
            )));
        }
        let cycle_ok = if completed {
            raw.cycle <= raw.plan.repeat()
        } else {
            raw.cycle < raw.plan.repeat()
        };
        if !cycle_ok {
            return Err(D::Error::custom(format!(
                "cycle {} out of range for repeat {}",
                raw.cycle,
                raw.plan.repeat()
            )));
        }

        Ok(Self {
            plan: raw.plan,
            state: raw.state,
            phase_index: raw.phase_index,
            cycle: raw.cycle,
            remaining: raw.remaining,
            phase_started_at: raw.phase_started_at,
            label: raw.label,
        })
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::plan::PhaseSpec;

    fn focus_plan() -> PhasePlan {
        PhasePlan::new(
            vec![
                PhaseSpec::new(PhaseKind::Work, 1500),
                PhaseSpec::new(PhaseKind::Break, 300),
            ],
            1,
        )
        .unwrap()
    }

    fn breathing_plan(hold: u64, cycles: u32) -> PhasePlan {
        PhasePlan::new(
            vec![
                PhaseSpec::new(PhaseKind::Inhale, 4),
                PhaseSpec::new(PhaseKind::Hold, hold).optional(),
                PhaseSpec::new(PhaseKind::Exhale, 4),
            ],
            cycles,
        )
        .unwrap()
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn start_pause_resume() {
        let mut seq = PhaseSequencer::new(focus_plan());
        assert_eq!(seq.state(), TimerState::Idle);

        assert!(seq.start().is_some());
        assert_eq!(seq.state(), TimerState::Running);
        assert!(seq.phase_started_at().is_some());
        assert!(seq.start().is_none());

        seq.tick(secs(100));
        assert!(seq.pause().is_some());
        assert_eq!(seq.state(), TimerState::Paused);
        assert!(seq.phase_started_at().is_none());
        assert!(seq.pause().is_none());

        assert!(seq.start().is_some());
        assert_eq!(seq.remaining(), secs(1400));
    }

    #[test]
    fn ticks_while_paused_change_nothing() {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start();
        seq.tick(secs(10));
        seq.pause();
        for _ in 0..5 {
            assert!(seq.tick(secs(1000)).is_empty());
        }
        assert_eq!(seq.remaining(), secs(1490));
        assert_eq!(seq.phase_index(), 0);
    }

    #[test]
    fn default_focus_scenario() {
        let t0 = Utc::now();
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start_at(t0);

        let events = seq.tick_at(secs(1500), t0 + chrono::Duration::seconds(1500));
        assert_eq!(events.len(), 2);
        match &events[0] {
            Event::PhaseCompleted { session, .. } => {
                assert_eq!(session.phase, PhaseKind::Work);
                assert_eq!(session.duration_secs(), 1500);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            events[1],
            Event::PhaseAdvanced { phase: PhaseKind::Break, running: true, .. }
        ));
        assert_eq!(seq.remaining(), secs(300));

        let events = seq.tick_at(secs(300), t0 + chrono::Duration::seconds(1800));
        assert_eq!(events.len(), 2);
        match &events[0] {
            Event::PhaseCompleted { session, .. } => {
                assert_eq!(session.phase, PhaseKind::Break);
                assert_eq!(session.duration_secs(), 300);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(events[1], Event::PlanCompleted { cycles: 1, .. }));
        assert_eq!(seq.state(), TimerState::Completed);
        assert!(!seq.is_running());
    }

    #[test]
    fn zero_hold_transitions_inhale_to_exhale_in_one_event() {
        let mut seq = PhaseSequencer::new(breathing_plan(0, 6));
        seq.start();
        let events = seq.tick(secs(4));
        let transitions: Vec<_> = events.iter().filter(|e| e.is_transition()).collect();
        assert_eq!(transitions.len(), 1);
        assert!(matches!(
            transitions[0],
            Event::PhaseAdvanced { phase: PhaseKind::Exhale, phase_index: 2, .. }
        ));
    }

    #[test]
    fn box_breathing_completes_after_72_seconds() {
        let mut seq = PhaseSequencer::new(breathing_plan(4, 6));
        seq.start();
        let mut advanced = 0;
        let mut completed = false;
        for _ in 0..72 {
            for event in seq.tick(secs(1)) {
                match event {
                    Event::PhaseAdvanced { .. } => advanced += 1,
                    Event::PlanCompleted { .. } => completed = true,
                    _ => {}
                }
            }
        }
        assert!(completed);
        assert_eq!(advanced, 17);
        assert_eq!(seq.state(), TimerState::Completed);
    }

    #[test]
    fn large_tick_crosses_cycles() {
        let mut seq = PhaseSequencer::new(breathing_plan(4, 6));
        seq.start();
        seq.tick(secs(12 * 2 + 5));
        assert_eq!(seq.cycle(), 2);
        assert_eq!(seq.phase_index(), 1);
        assert_eq!(seq.remaining(), secs(3));
        assert!(seq.is_running());
    }

    #[test]
    fn huge_tick_completes_plan_once() {
        let mut seq = PhaseSequencer::new(breathing_plan(4, 2));
        seq.start();
        let events = seq.tick(secs(10_000));
        let plan_done = events
            .iter()
            .filter(|e| matches!(e, Event::PlanCompleted { .. }))
            .count();
        assert_eq!(plan_done, 1);
        assert!(seq.tick(secs(10)).is_empty());
    }

    #[test]
    fn backdated_boundaries_within_one_tick() {
        let t0 = Utc::now();
        let mut seq = PhaseSequencer::new(breathing_plan(4, 1));
        seq.start_at(t0);
        let now = t0 + chrono::Duration::seconds(10);
        let events = seq.tick_at(secs(10), now);
        let sessions: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::PhaseCompleted { session, .. } => Some(session.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].ended_at, t0 + chrono::Duration::seconds(4));
        assert_eq!(sessions[1].started_at, t0 + chrono::Duration::seconds(4));
        assert_eq!(sessions[1].ended_at, t0 + chrono::Duration::seconds(8));
    }

    #[test]
    fn no_auto_start_stops_at_new_phase() {
        let plan = PhasePlan::new(
            vec![
                PhaseSpec::new(PhaseKind::Work, 60),
                PhaseSpec::new(PhaseKind::Break, 30).with_auto_start(false),
            ],
            2,
        )
        .unwrap();
        let mut seq = PhaseSequencer::new(plan);
        seq.start();
        let events = seq.tick(secs(75));
        assert!(matches!(events.last(), Some(Event::PhaseAdvanced { running: false, .. })));
        assert_eq!(seq.state(), TimerState::Idle);
        assert_eq!(seq.remaining(), secs(30));

        seq.start();
        assert_eq!(seq.remaining(), secs(30));
    }

    #[test]
    fn skip_emits_one_transition_and_no_session() {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start();
        seq.tick(secs(42));
        let events = seq.skip_phase();
        assert_eq!(events.len(), 1);
        assert!(events.iter().all(|e| !matches!(e, Event::PhaseCompleted { .. })));
        assert!(matches!(
            events[0],
            Event::PhaseSkipped { to_phase: Some(PhaseKind::Break), running: true, .. }
        ));
        assert!(seq.is_running());
        assert_eq!(seq.remaining(), secs(300));
    }

    #[test]
    fn skip_while_paused_stays_stopped() {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start();
        seq.pause();
        seq.skip_phase();
        assert_eq!(seq.state(), TimerState::Idle);
        assert_eq!(seq.phase_index(), 1);
        assert!(seq.phase_started_at().is_none());
    }

    #[test]
    fn skip_last_phase_completes_plan() {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start();
        seq.skip_phase();
        let events = seq.skip_phase();
        let transitions = events.iter().filter(|e| e.is_transition()).count();
        assert_eq!(transitions, 1);
        assert!(matches!(events.last(), Some(Event::PlanCompleted { .. })));
        assert_eq!(seq.state(), TimerState::Completed);
        assert!(seq.skip_phase().is_empty());
    }

    #[test]
    fn reset_goes_to_beginning() {
        let mut seq = PhaseSequencer::new(breathing_plan(4, 3));
        seq.start();
        seq.tick(secs(30));
        seq.reset();
        assert_eq!(seq.phase_index(), 0);
        assert_eq!(seq.cycle(), 0);
        assert_eq!(seq.remaining(), secs(4));
        assert_eq!(seq.state(), TimerState::Idle);
        assert!(seq.phase_started_at().is_none());
    }

    #[test]
    fn start_after_completion_restarts_plan() {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start();
        seq.tick(secs(1800));
        assert_eq!(seq.state(), TimerState::Completed);
        seq.start();
        assert_eq!(seq.phase_index(), 0);
        assert_eq!(seq.cycle(), 0);
        assert_eq!(seq.remaining(), secs(1500));
    }

    #[test]
    fn apply_plan_while_running_clamps_remaining() {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start();
        seq.tick(secs(100));
        let shorter = PhasePlan::new(
            vec![
                PhaseSpec::new(PhaseKind::Work, 600),
                PhaseSpec::new(PhaseKind::Break, 300),
            ],
            1,
        )
        .unwrap();
        seq.apply_plan(shorter);
        assert!(seq.is_running());
        assert_eq!(seq.remaining(), secs(600));

        let longer = focus_plan();
        seq.apply_plan(longer);
        assert_eq!(seq.remaining(), secs(600));
    }

    #[test]
    fn apply_plan_while_idle_reinitialises() {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.skip_phase();
        seq.apply_plan(breathing_plan(4, 6));
        assert_eq!(seq.phase_index(), 0);
        assert_eq!(seq.remaining(), secs(4));
        assert_eq!(seq.state(), TimerState::Idle);
    }

    #[test]
    fn apply_plan_while_paused_keeps_position() {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start();
        seq.tick(secs(1600));
        seq.pause();
        assert_eq!(seq.phase_index(), 1);
        assert_eq!(seq.remaining(), secs(200));

        let shorter_break = PhasePlan::new(
            vec![
                PhaseSpec::new(PhaseKind::Work, 1500),
                PhaseSpec::new(PhaseKind::Break, 240),
            ],
            1,
        )
        .unwrap();
        assert!(seq.apply_plan(shorter_break).is_none());
        assert_eq!(seq.phase_index(), 1);
        assert_eq!(seq.remaining(), secs(200));
        assert_eq!(seq.state(), TimerState::Paused);

        let tiny_break = PhasePlan::new(
            vec![
                PhaseSpec::new(PhaseKind::Work, 1500),
                PhaseSpec::new(PhaseKind::Break, 60),
            ],
            1,
        )
        .unwrap();
        seq.apply_plan(tiny_break);
        assert_eq!(seq.remaining(), secs(60));
        assert_eq!(seq.state(), TimerState::Paused);
    }

    #[test]
    fn apply_plan_while_paused_with_new_layout_resets() {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start();
        seq.tick(secs(100));
        seq.pause();
        let event = seq.apply_plan(breathing_plan(4, 6));
        assert!(matches!(event, Some(Event::TimerReset { .. })));
        assert_eq!(seq.state(), TimerState::Idle);
        assert_eq!(seq.current_phase().kind, PhaseKind::Inhale);
    }

    #[test]
    fn apply_plan_with_new_layout_restarts_running() {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start();
        seq.tick(secs(100));
        seq.apply_plan(breathing_plan(4, 6));
        assert!(seq.is_running());
        assert_eq!(seq.current_phase().kind, PhaseKind::Inhale);
        assert_eq!(seq.remaining(), secs(4));
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let seq = PhaseSequencer::new(focus_plan());
        match seq.snapshot() {
            Event::StateSnapshot {
                state,
                phase_index,
                remaining_ms,
                plan_progress_pct,
                ..
            } => {
                assert_eq!(state, TimerState::Idle);
                assert_eq!(phase_index, 0);
                assert_eq!(remaining_ms, 1500 * 1000);
                assert_eq!(plan_progress_pct, 0.0);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    #[test]
    fn serde_roundtrip_keeps_position() {
        let mut seq = PhaseSequencer::new(breathing_plan(4, 6));
        seq.start();
        seq.tick(Duration::from_millis(5_250));
        let json = serde_json::to_string(&seq).unwrap();
        let back: PhaseSequencer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phase_index(), 1);
        assert_eq!(back.remaining(), Duration::from_millis(2_750));
        assert_eq!(back.state(), TimerState::Running);
    }

    fn saved_focus() -> serde_json::Value {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start();
        seq.tick(secs(100));
        serde_json::to_value(&seq).unwrap()
    }

    #[test]
    fn deserialize_rejects_out_of_range_index() {
        let mut json = saved_focus();
        json["phase_index"] = serde_json::json!(7);
        let err = serde_json::from_value::<PhaseSequencer>(json).unwrap_err();
        assert!(err.to_string().contains("phase_index 7"));
    }

    #[test]
    fn deserialize_rejects_remaining_beyond_phase() {
        let mut json = saved_focus();
        json["remaining"] = serde_json::json!({ "secs": 99_999, "nanos": 0 });
        assert!(serde_json::from_value::<PhaseSequencer>(json).is_err());
    }

    #[test]
    fn deserialize_rejects_cycle_past_repeat_and_inactive_phase() {
        let mut json = saved_focus();
        json["cycle"] = serde_json::json!(1);
        assert!(serde_json::from_value::<PhaseSequencer>(json).is_err());

        let mut seq = PhaseSequencer::new(breathing_plan(0, 2));
        seq.start();
        let mut json = serde_json::to_value(&seq).unwrap();
        json["phase_index"] = serde_json::json!(1);
        json["remaining"] = serde_json::json!({ "secs": 0, "nanos": 0 });
        assert!(serde_json::from_value::<PhaseSequencer>(json).is_err());
    }

    #[test]
    fn deserialize_accepts_completed_sequencer() {
        let mut seq = PhaseSequencer::new(focus_plan());
        seq.start();
        seq.tick(secs(1800));
        let json = serde_json::to_string(&seq).unwrap();
        let back: PhaseSequencer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.state(), TimerState::Completed);
        assert_eq!(back.cycle(), 1);
    }
}
