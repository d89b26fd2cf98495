use clap::{Args, Subcommand};
use pomobreath_core::{Config, Database, FocusSettings};

use super::session::{self, RunOptions};

pub const STATE_KEY: &str = "sequencer.focus";

#[derive(Args, Debug, Default)]
pub struct FocusOverrides {
    /// Work minutes (default from config)
    #[arg(long)]
    work: Option<u32>,
    /// Break minutes (default from config)
    #[arg(long = "break")]
    break_minutes: Option<u32>,
    /// Number of work/break rounds
    #[arg(long)]
    rounds: Option<u32>,
}

impl FocusOverrides {
    fn apply(&self, mut settings: FocusSettings) -> FocusSettings {
        if let Some(work) = self.work {
            settings.work_minutes = work;
        }
        if let Some(minutes) = self.break_minutes {
            settings.break_minutes = minutes;
        }
        if let Some(rounds) = self.rounds {
            settings.rounds = rounds;
        }
        settings
    }
}

#[derive(Subcommand)]
pub enum FocusAction {
    /// Run a focus session in the foreground
    Run {
        /// Task title attached to the recorded work sessions
        #[arg(long)]
        task: Option<String>,
        #[command(flatten)]
        overrides: FocusOverrides,
        /// Continue the session interrupted with Ctrl-C
        #[arg(long, conflicts_with_all = ["work", "break_minutes", "rounds"])]
        resume: bool,
    },
    /// Print the plan a run would use
    Plan {
        #[command(flatten)]
        overrides: FocusOverrides,
    },
    /// Show the interrupted session, if any
    Status,
    /// Forget the interrupted session
    Discard,
}

pub async fn run(action: FocusAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        FocusAction::Run {
            task,
            overrides,
            resume,
        } => {
            let plan = overrides.apply(config.focus.clone()).plan()?;
            let opts = RunOptions {
                state_key: STATE_KEY,
                label: task,
                feedback: true,
                resume,
            };
            session::run(plan, &config, opts).await?;
        }
        FocusAction::Plan { overrides } => {
            let plan = overrides.apply(config.focus.clone()).plan()?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        FocusAction::Status => {
            let db = Database::open()?;
            match session::load_saved(&db, STATE_KEY) {
                Some(seq) => println!("{}", serde_json::to_string_pretty(&seq.snapshot())?),
                None => println!("no interrupted focus session"),
            }
        }
        FocusAction::Discard => {
            Database::open()?.kv_delete(STATE_KEY)?;
            println!("ok");
        }
    }
    Ok(())
}
