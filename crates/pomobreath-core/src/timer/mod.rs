mod driver;
mod plan;
mod presets;
mod sequencer;

pub use driver::{DriveTarget, TickDriver, DEFAULT_TICK_INTERVAL};
pub use plan::{PhaseKind, PhasePlan, PhaseSpec};
pub use presets::{
    BreathingPattern, BreathingTechnique, FocusSettings, BREAK_MINUTES_RANGE, CYCLES_RANGE,
    EXHALE_SECS_RANGE, HOLD_SECS_RANGE, INHALE_SECS_RANGE, ROUNDS_RANGE, WORK_MINUTES_RANGE,
};
pub(crate) use presets::check_range;
pub use sequencer::{PhaseSequencer, TimerState};
