//! # Pomobreath Core Library
//!
//! This library provides the core logic for the Pomobreath focus and
//! breathing timers. Everything is usable from the standalone CLI binary;
//! any other front end is a thin layer over the same types.
//!
//! ## Architecture
//!
//! - **Timer**: [`PhasePlan`]s built from focus or breathing settings, a pure
//!   [`PhaseSequencer`] state machine advanced by elapsed time, and a
//!   [`TickDriver`] that feeds it on a tokio interval
//! - **Dispatch**: Routes sequencer [`Event`]s to session recording,
//!   notification scheduling and feedback collaborators
//! - **Storage**: SQLite-based session/task storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerController`]: Async owner of one sequencer and its driver
//! - [`EventDispatcher`]: Side-effect router
//! - [`Database`]: Session, task and statistics persistence
//! - [`Config`]: Application configuration management

pub mod controller;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use controller::TimerController;
pub use dispatch::{
    EventDispatcher, Feedback, FeedbackSink, NotificationContent, NotificationRequest,
    NotificationScheduler, SessionRecorder,
};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use session::CompletedSession;
pub use storage::{Config, Database, FocusTask, Stats};
pub use timer::{
    BreathingPattern, BreathingTechnique, FocusSettings, PhaseKind, PhasePlan, PhaseSequencer,
    PhaseSpec, TickDriver, TimerState,
};
