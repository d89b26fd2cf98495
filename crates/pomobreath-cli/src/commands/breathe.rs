use clap::{Args, Subcommand};
use pomobreath_core::{BreathingPattern, BreathingTechnique, Config, Database, PhasePlan};
use serde::Serialize;

use super::session::{self, RunOptions};

pub const STATE_KEY: &str = "sequencer.breathing";

#[derive(Args, Debug, Default)]
pub struct PatternArgs {
    /// energy-boost, reset, calm-down, box or custom
    #[arg(long)]
    technique: Option<BreathingTechnique>,
    /// Inhale seconds (custom pattern)
    #[arg(long)]
    inhale: Option<u32>,
    /// Hold seconds, 0 to skip (custom pattern)
    #[arg(long)]
    hold: Option<u32>,
    /// Exhale seconds (custom pattern)
    #[arg(long)]
    exhale: Option<u32>,
    /// Number of breaths (custom pattern)
    #[arg(long)]
    cycles: Option<u32>,
}

impl PatternArgs {
    fn has_overrides(&self) -> bool {
        self.inhale.is_some() || self.hold.is_some() || self.exhale.is_some() || self.cycles.is_some()
    }

    /// Explicit overrides imply the custom technique.
    fn plan(&self, config: &Config) -> Result<PhasePlan, Box<dyn std::error::Error>> {
        let technique = match self.technique {
            Some(t) => t,
            None if self.has_overrides() => BreathingTechnique::Custom,
            None => config.breathing.technique,
        };
        let base = config.breathing.pattern();
        let custom = BreathingPattern::new(
            self.inhale.unwrap_or(base.inhale_secs),
            self.hold.unwrap_or(base.hold_secs),
            self.exhale.unwrap_or(base.exhale_secs),
            self.cycles.unwrap_or(base.cycles),
        );
        Ok(technique.plan(custom)?)
    }
}

#[derive(Subcommand)]
pub enum BreatheAction {
    /// Run a breathing session in the foreground
    Run {
        #[command(flatten)]
        pattern: PatternArgs,
        /// Disable the phase-change bell
        #[arg(long)]
        no_haptics: bool,
        /// Continue the session interrupted with Ctrl-C
        #[arg(long)]
        resume: bool,
    },
    /// List the built-in techniques
    Techniques,
    /// Print the plan a run would use
    Plan {
        #[command(flatten)]
        pattern: PatternArgs,
    },
    /// Show the interrupted session, if any
    Status,
    /// Forget the interrupted session
    Discard,
}

#[derive(Serialize)]
struct TechniqueInfo {
    technique: BreathingTechnique,
    title: &'static str,
    description: &'static str,
    pattern: BreathingPattern,
    seconds: u32,
}

pub async fn run(action: BreatheAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        BreatheAction::Run {
            pattern,
            no_haptics,
            resume,
        } => {
            let plan = pattern.plan(&config)?;
            let opts = RunOptions {
                state_key: STATE_KEY,
                label: None,
                feedback: config.breathing.haptics && !no_haptics,
                resume,
            };
            session::run(plan, &config, opts).await?;
        }
        BreatheAction::Techniques => {
            let defaults = config.breathing.pattern();
            let list: Vec<TechniqueInfo> = BreathingTechnique::ALL
                .iter()
                .map(|t| {
                    let pattern = t.pattern(defaults);
                    TechniqueInfo {
                        technique: *t,
                        title: t.title(),
                        description: t.description(),
                        pattern,
                        seconds: pattern.seconds_per_cycle() * pattern.cycles,
                    }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        BreatheAction::Plan { pattern } => {
            let plan = pattern.plan(&config)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        BreatheAction::Status => {
            let db = Database::open()?;
            match session::load_saved(&db, STATE_KEY) {
                Some(seq) => println!("{}", serde_json::to_string_pretty(&seq.snapshot())?),
                None => println!("no interrupted breathing session"),
            }
        }
        BreatheAction::Discard => {
            Database::open()?.kv_delete(STATE_KEY)?;
            println!("ok");
        }
    }
    Ok(())
}
