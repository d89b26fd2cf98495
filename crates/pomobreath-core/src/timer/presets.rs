//! Adapters that turn user-facing settings into [`PhasePlan`]s.
//!
//! Focus sessions alternate work and break; breathing sessions cycle
//! inhale, hold and exhale. Both end up as plain plans for the sequencer.

use serde::{Deserialize, Serialize};

use super::plan::{PhaseKind, PhasePlan, PhaseSpec};
use crate::error::ValidationError;

pub const WORK_MINUTES_RANGE: (u64, u64) = (5, 120);
pub const BREAK_MINUTES_RANGE: (u64, u64) = (1, 60);
pub const ROUNDS_RANGE: (u64, u64) = (1, 12);
pub const INHALE_SECS_RANGE: (u64, u64) = (1, 12);
pub const HOLD_SECS_RANGE: (u64, u64) = (0, 12);
pub const EXHALE_SECS_RANGE: (u64, u64) = (1, 12);
pub const CYCLES_RANGE: (u64, u64) = (1, 20);

pub(crate) fn check_range(
    field: &str,
    value: u64,
    (min, max): (u64, u64),
) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Pomodoro settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSettings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    #[serde(default = "default_true")]
    pub auto_start_break: bool,
    #[serde(default)]
    pub auto_start_work: bool,
    /// Number of work/break rounds in one session.
    #[serde(default = "default_rounds")]
    pub rounds: u32,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_rounds() -> u32 {
    1
}
fn default_true() -> bool {
    true
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            auto_start_break: true,
            auto_start_work: false,
            rounds: default_rounds(),
        }
    }
}

impl FocusSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("focus.work_minutes", self.work_minutes as u64, WORK_MINUTES_RANGE)?;
        check_range("focus.break_minutes", self.break_minutes as u64, BREAK_MINUTES_RANGE)?;
        check_range("focus.rounds", self.rounds as u64, ROUNDS_RANGE)?;
        Ok(())
    }

    /// `[work, break] x rounds`.
    pub fn plan(&self) -> Result<PhasePlan, ValidationError> {
        self.validate()?;
        PhasePlan::new(
            vec![
                PhaseSpec::new(PhaseKind::Work, self.work_minutes as u64 * 60)
                    .with_auto_start(self.auto_start_work),
                PhaseSpec::new(PhaseKind::Break, self.break_minutes as u64 * 60)
                    .with_auto_start(self.auto_start_break),
            ],
            self.rounds,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathingPattern {
    pub inhale_secs: u32,
    pub hold_secs: u32,
    pub exhale_secs: u32,
    pub cycles: u32,
}

impl Default for BreathingPattern {
    fn default() -> Self {
        Self::new(4, 4, 4, 6)
    }
}

impl BreathingPattern {
    pub const fn new(inhale_secs: u32, hold_secs: u32, exhale_secs: u32, cycles: u32) -> Self {
        Self {
            inhale_secs,
            hold_secs,
            exhale_secs,
            cycles,
        }
    }

    pub fn seconds_per_cycle(&self) -> u32 {
        self.inhale_secs + self.hold_secs + self.exhale_secs
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("breathing.inhale_secs", self.inhale_secs as u64, INHALE_SECS_RANGE)?;
        check_range("breathing.hold_secs", self.hold_secs as u64, HOLD_SECS_RANGE)?;
        check_range("breathing.exhale_secs", self.exhale_secs as u64, EXHALE_SECS_RANGE)?;
        check_range("breathing.cycles", self.cycles as u64, CYCLES_RANGE)?;
        Ok(())
    }

    /// `[inhale, hold?, exhale] x cycles`. A zero hold is passed through.
    pub fn plan(&self) -> Result<PhasePlan, ValidationError> {
        self.validate()?;
        PhasePlan::new(
            vec![
                PhaseSpec::new(PhaseKind::Inhale, self.inhale_secs as u64),
                PhaseSpec::new(PhaseKind::Hold, self.hold_secs as u64).optional(),
                PhaseSpec::new(PhaseKind::Exhale, self.exhale_secs as u64),
            ],
            self.cycles,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreathingTechnique {
    EnergyBoost,
    Reset,
    CalmDown,
    Box,
    /// Uses the configured defaults.
    Custom,
}

impl BreathingTechnique {
    pub const ALL: [BreathingTechnique; 5] = [
        BreathingTechnique::EnergyBoost,
        BreathingTechnique::Reset,
        BreathingTechnique::CalmDown,
        BreathingTechnique::Box,
        BreathingTechnique::Custom,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            BreathingTechnique::EnergyBoost => "Energy Boost",
            BreathingTechnique::Reset => "Reset",
            BreathingTechnique::CalmDown => "Calm Down",
            BreathingTechnique::Box => "Box Breathing",
            BreathingTechnique::Custom => "Custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BreathingTechnique::EnergyBoost => "Quick pick-me-up. Short exhales.",
            BreathingTechnique::Reset => "Balanced reset. Even breaths.",
            BreathingTechnique::CalmDown => "Long exhales to relax.",
            BreathingTechnique::Box => "Inhale, hold and exhale evenly.",
            BreathingTechnique::Custom => "Uses your default settings.",
        }
    }

    pub fn pattern(&self, defaults: BreathingPattern) -> BreathingPattern {
        match self {
            BreathingTechnique::EnergyBoost => BreathingPattern::new(3, 2, 3, 6),
            BreathingTechnique::Reset => BreathingPattern::new(4, 2, 4, 8),
            BreathingTechnique::CalmDown => BreathingPattern::new(4, 2, 6, 6),
            BreathingTechnique::Box => BreathingPattern::new(4, 4, 4, 6),
            BreathingTechnique::Custom => defaults,
        }
    }

    pub fn plan(&self, defaults: BreathingPattern) -> Result<PhasePlan, ValidationError> {
        self.pattern(defaults).plan()
    }
}

impl std::str::FromStr for BreathingTechnique {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "energy_boost" => Ok(BreathingTechnique::EnergyBoost),
            "reset" => Ok(BreathingTechnique::Reset),
            "calm_down" => Ok(BreathingTechnique::CalmDown),
            "box" => Ok(BreathingTechnique::Box),
            "custom" => Ok(BreathingTechnique::Custom),
            other => Err(ValidationError::InvalidValue {
                field: "technique".into(),
                message: format!("unknown breathing technique '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_focus_plan_is_25_5() {
        let plan = FocusSettings::default().plan().unwrap();
        assert_eq!(plan.phases()[0].duration_secs, 1500);
        assert_eq!(plan.phases()[1].duration_secs, 300);
        assert_eq!(plan.repeat(), 1);
        assert!(!plan.phases()[0].auto_start);
        assert!(plan.phases()[1].auto_start);
    }

    #[test]
    fn focus_out_of_range_rejected() {
        let settings = FocusSettings {
            work_minutes: 4,
            ..FocusSettings::default()
        };
        assert!(matches!(
            settings.plan(),
            Err(ValidationError::OutOfRange { min: 5, max: 120, .. })
        ));
    }

    #[test]
    fn box_technique_plan() {
        let plan = BreathingTechnique::Box.plan(BreathingPattern::default()).unwrap();
        assert_eq!(plan.cycle_duration_secs(), 12);
        assert_eq!(plan.repeat(), 6);
    }

    #[test]
    fn custom_uses_defaults_and_allows_zero_hold() {
        let defaults = BreathingPattern::new(5, 0, 7, 3);
        let plan = BreathingTechnique::Custom.plan(defaults).unwrap();
        assert_eq!(plan.active_phase_count(), 2);
        assert_eq!(plan.total_duration_secs(), 36);
    }

    #[test]
    fn zero_inhale_rejected() {
        assert!(BreathingPattern::new(0, 4, 4, 6).plan().is_err());
    }

    #[test]
    fn technique_from_str() {
        assert_eq!("calm-down".parse::<BreathingTechnique>().unwrap(), BreathingTechnique::CalmDown);
        assert!("yoga".parse::<BreathingTechnique>().is_err());
    }
}
