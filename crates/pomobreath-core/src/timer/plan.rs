use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identity of a phase. Focus and breathing sessions share one sequencer,
/// so their phases live in a single tagged enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Work,
    Break,
    Inhale,
    Hold,
    Exhale,
}

impl PhaseKind {
    pub fn title(&self) -> &'static str {
        match self {
            PhaseKind::Work => "Work",
            PhaseKind::Break => "Break",
            PhaseKind::Inhale => "Inhale",
            PhaseKind::Hold => "Hold",
            PhaseKind::Exhale => "Exhale",
        }
    }

    /// Whether a natural completion of this phase belongs in session history.
    /// Only focus phases are recorded.
    pub fn is_recorded(&self) -> bool {
        matches!(self, PhaseKind::Work | PhaseKind::Break)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Work => "work",
            PhaseKind::Break => "break",
            PhaseKind::Inhale => "inhale",
            PhaseKind::Hold => "hold",
            PhaseKind::Exhale => "exhale",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "work" => Some(PhaseKind::Work),
            "break" => Some(PhaseKind::Break),
            "inhale" => Some(PhaseKind::Inhale),
            "hold" => Some(PhaseKind::Hold),
            "exhale" => Some(PhaseKind::Exhale),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub kind: PhaseKind,
    /// Duration in whole seconds.
    pub duration_secs: u64,
    /// The single phase allowed to be zero seconds long (passed through).
    #[serde(default)]
    pub optional: bool,
    /// Whether a natural transition into this phase keeps the timer running.
    #[serde(default = "default_true")]
    pub auto_start: bool,
}

fn default_true() -> bool {
    true
}

impl PhaseSpec {
    pub fn new(kind: PhaseKind, duration_secs: u64) -> Self {
        Self {
            kind,
            duration_secs,
            optional: false,
            auto_start: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn is_active(&self) -> bool {
        self.duration_secs > 0
    }

    pub fn duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.duration_secs)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_secs.saturating_mul(1000)
    }
}

/// Ordered, repeating sequence of phases.
///
/// Immutable once built; validated so that every run visits
/// `active_phase_count() * repeat()` phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhasePlan {
    phases: Vec<PhaseSpec>,
    repeat: u32,
}

impl PhasePlan {
    /// Build and validate a plan.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if the phase list is empty, `repeat` is 0,
    /// a required phase has zero duration, more than one phase is zero-length,
    /// or no phase has a positive duration.
    pub fn new(phases: Vec<PhaseSpec>, repeat: u32) -> Result<Self, ValidationError> {
        if phases.is_empty() {
            return Err(ValidationError::EmptyCollection("phases".into()));
        }
        if repeat == 0 {
            return Err(ValidationError::InvalidValue {
                field: "repeat".into(),
                message: "must be at least 1".into(),
            });
        }
        let mut zero_count = 0;
        for phase in &phases {
            if phase.duration_secs == 0 {
                if !phase.optional {
                    return Err(ValidationError::InvalidValue {
                        field: phase.kind.as_str().into(),
                        message: "required phase must have a positive duration".into(),
                    });
                }
                zero_count += 1;
            }
        }
        if zero_count > 1 {
            return Err(ValidationError::InvalidValue {
                field: "phases".into(),
                message: "at most one phase may have zero duration".into(),
            });
        }
        if zero_count == phases.len() {
            return Err(ValidationError::InvalidValue {
                field: "phases".into(),
                message: "plan has no phase with a positive duration".into(),
            });
        }
        Ok(Self { phases, repeat })
    }

    pub fn phases(&self) -> &[PhaseSpec] {
        &self.phases
    }

    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    pub fn phase(&self, index: usize) -> Option<&PhaseSpec> {
        self.phases.get(index)
    }

    /// Index of the first phase with a positive duration.
    pub fn first_active_index(&self) -> usize {
        self.phases.iter().position(PhaseSpec::is_active).unwrap_or(0)
    }

    /// Next active phase after `index` within the same cycle, if any.
    pub fn next_active_index(&self, index: usize) -> Option<usize> {
        self.phases
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, p)| p.is_active())
            .map(|(i, _)| i)
    }

    pub fn active_phase_count(&self) -> usize {
        self.phases.iter().filter(|p| p.is_active()).count()
    }

    /// Number of phases entered over one full run.
    pub fn visits_per_run(&self) -> usize {
        self.active_phase_count() * self.repeat as usize
    }

    pub fn cycle_duration_secs(&self) -> u64 {
        self.phases.iter().map(|p| p.duration_secs).sum()
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.cycle_duration_secs().saturating_mul(self.repeat as u64)
    }

    /// Seconds elapsed in a run before entering `index` of cycle `cycle`.
    pub fn cumulative_secs(&self, cycle: u32, index: usize) -> u64 {
        let within: u64 = self.phases.iter().take(index).map(|p| p.duration_secs).sum();
        self.cycle_duration_secs()
            .saturating_mul(cycle as u64)
            .saturating_add(within)
    }

    /// Whether `other` has the same phase layout (count and kinds in order).
    pub fn same_layout(&self, other: &PhasePlan) -> bool {
        self.phases.len() == other.phases.len()
            && self
                .phases
                .iter()
                .zip(&other.phases)
                .all(|(a, b)| a.kind == b.kind)
    }
}

// Deserialization goes through `new` so stored plans are validated too.
impl<'de> Deserialize<'de> for PhasePlan {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            phases: Vec<PhaseSpec>,
            repeat: u32,
        }
        let raw = Raw::deserialize(deserializer)?;
        PhasePlan::new(raw.phases, raw.repeat).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breathing(hold: u64) -> PhasePlan {
        PhasePlan::new(
            vec![
                PhaseSpec::new(PhaseKind::Inhale, 4),
                PhaseSpec::new(PhaseKind::Hold, hold).optional(),
                PhaseSpec::new(PhaseKind::Exhale, 4),
            ],
            6,
        )
        .unwrap()
    }

    #[test]
    fn visits_per_run_counts_only_active_phases() {
        assert_eq!(breathing(4).visits_per_run(), 18);
        assert_eq!(breathing(0).visits_per_run(), 12);
    }

    #[test]
    fn next_active_index_skips_zero_phase() {
        let plan = breathing(0);
        assert_eq!(plan.next_active_index(0), Some(2));
        assert_eq!(plan.next_active_index(2), None);
    }

    #[test]
    fn rejects_zero_required_phase() {
        let err = PhasePlan::new(vec![PhaseSpec::new(PhaseKind::Work, 0)], 1).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_two_zero_phases() {
        let result = PhasePlan::new(
            vec![
                PhaseSpec::new(PhaseKind::Inhale, 4),
                PhaseSpec::new(PhaseKind::Hold, 0).optional(),
                PhaseSpec::new(PhaseKind::Exhale, 0).optional(),
            ],
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_and_zero_repeat() {
        assert!(PhasePlan::new(vec![], 1).is_err());
        assert!(PhasePlan::new(vec![PhaseSpec::new(PhaseKind::Work, 60)], 0).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let json = r#"{"phases":[{"kind":"work","duration_secs":0}],"repeat":1}"#;
        assert!(serde_json::from_str::<PhasePlan>(json).is_err());

        let json = r#"{"phases":[{"kind":"work","duration_secs":60}],"repeat":2}"#;
        let plan: PhasePlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.total_duration_secs(), 120);
        assert!(plan.phases()[0].auto_start);
    }

    #[test]
    fn cumulative_secs_spans_cycles() {
        let plan = breathing(4);
        assert_eq!(plan.cumulative_secs(0, 2), 8);
        assert_eq!(plan.cumulative_secs(2, 1), 28);
    }
}
