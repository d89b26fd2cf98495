//! Async owner of one running timer.
//!
//! All commands and every driver tick go through a single mutex, so the
//! sequencer state has exactly one writer at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};

use crate::dispatch::EventDispatcher;
use crate::events::Event;
use crate::timer::{DriveTarget, PhasePlan, PhaseSequencer, TickDriver, TimerState};

/// Sequencer plus its side-effect router and tick loop.
#[derive(Debug)]
pub struct TimerCore {
    sequencer: PhaseSequencer,
    dispatcher: EventDispatcher,
    driver: TickDriver,
}

impl TimerCore {
    pub fn sequencer(&self) -> &PhaseSequencer {
        &self.sequencer
    }

    fn dispatch(&mut self, events: &[Event]) {
        if !events.is_empty() {
            self.dispatcher.dispatch(events, self.sequencer.label());
        }
    }

    /// Credit the time since the driver's last wake before a command
    /// changes the phase.
    fn flush(&mut self) -> Vec<Event> {
        if !self.sequencer.is_running() {
            return Vec::new();
        }
        let elapsed = self.driver.flush();
        let events = self.sequencer.tick(elapsed);
        self.dispatch(&events);
        events
    }
}

impl DriveTarget for TimerCore {
    fn is_running(&self) -> bool {
        self.sequencer.is_running()
    }

    fn on_tick(&mut self, elapsed: Duration) {
        let events = self.sequencer.tick(elapsed);
        self.dispatch(&events);
    }
}

#[derive(Debug, Clone)]
pub struct TimerController {
    core: Arc<Mutex<TimerCore>>,
}

impl TimerController {
    pub fn new(plan: PhasePlan, dispatcher: EventDispatcher, tick_interval: Duration) -> Self {
        Self::with_sequencer(PhaseSequencer::new(plan), dispatcher, tick_interval)
    }

    /// Resume from a previously saved sequencer. A saved `Running` state is
    /// paused until `start()` is called again.
    pub fn with_sequencer(
        mut sequencer: PhaseSequencer,
        dispatcher: EventDispatcher,
        tick_interval: Duration,
    ) -> Self {
        sequencer.pause();
        Self {
            core: Arc::new(Mutex::new(TimerCore {
                sequencer,
                dispatcher,
                driver: TickDriver::new(tick_interval),
            })),
        }
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.core.lock().await.dispatcher.subscribe()
    }

    pub async fn start(&self) -> Vec<Event> {
        let mut core = self.core.lock().await;
        let Some(event) = core.sequencer.start() else {
            return Vec::new();
        };
        let events = vec![event];
        core.dispatch(&events);
        core.driver.start(&self.core);
        events
    }

    pub async fn pause(&self) -> Vec<Event> {
        let mut core = self.core.lock().await;
        let mut events = core.flush();
        core.driver.cancel();
        if let Some(event) = core.sequencer.pause() {
            core.dispatch(std::slice::from_ref(&event));
            events.push(event);
        }
        events
    }

    pub async fn toggle(&self) -> Vec<Event> {
        if self.state().await == TimerState::Running {
            self.pause().await
        } else {
            self.start().await
        }
    }

    pub async fn reset(&self) -> Event {
        let mut core = self.core.lock().await;
        core.driver.cancel();
        let event = core.sequencer.reset();
        core.dispatch(std::slice::from_ref(&event));
        event
    }

    pub async fn skip_phase(&self) -> Vec<Event> {
        let mut core = self.core.lock().await;
        let mut events = core.flush();
        let skipped = core.sequencer.skip_phase();
        core.dispatch(&skipped);
        events.extend(skipped);
        self.rearm(&mut core);
        events
    }

    /// Replace the plan, e.g. after settings changed.
    pub async fn apply_plan(&self, plan: PhasePlan) -> Vec<Event> {
        let mut core = self.core.lock().await;
        let mut events = core.flush();
        if let Some(event) = core.sequencer.apply_plan(plan) {
            core.dispatch(std::slice::from_ref(&event));
            events.push(event);
        }
        self.rearm(&mut core);
        events
    }

    pub async fn set_label(&self, label: Option<String>) {
        self.core.lock().await.sequencer.set_label(label);
    }

    pub async fn state(&self) -> TimerState {
        self.core.lock().await.sequencer.state()
    }

    pub async fn snapshot(&self) -> Event {
        self.core.lock().await.sequencer.snapshot()
    }

    /// Copy of the current sequencer, e.g. for persisting.
    pub async fn sequencer(&self) -> PhaseSequencer {
        self.core.lock().await.sequencer.clone()
    }

    pub async fn is_driving(&self) -> bool {
        self.core.lock().await.driver.is_active()
    }

    /// Fresh loop if still running (restarting the elapsed baseline), none otherwise.
    fn rearm(&self, core: &mut TimerCore) {
        if core.sequencer.is_running() {
            core.driver.start(&self.core);
        } else {
            core.driver.cancel();
        }
    }
}
