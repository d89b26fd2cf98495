use clap::Subcommand;
use pomobreath_core::{CompletedSession, Config, Database};
use serde::Serialize;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded sessions, newest first
    List {
        /// Maximum number of sessions
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Hide break sessions regardless of `history.show_breaks`
        #[arg(long)]
        no_breaks: bool,
    },
    /// Delete one session
    Delete {
        /// Session ID
        id: Uuid,
    },
    /// Delete every recorded session
    Clear,
    /// Apply `history.keep_count` now
    Trim,
}

#[derive(Serialize)]
struct SessionRow<'a> {
    #[serde(flatten)]
    session: &'a CompletedSession,
    duration: String,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit, no_breaks } => {
            let include_breaks = config.history.show_breaks && !no_breaks;
            let sessions = db.list_sessions(limit, include_breaks)?;
            let rows: Vec<SessionRow<'_>> = sessions
                .iter()
                .map(|session| SessionRow {
                    session,
                    duration: session.duration_text(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        HistoryAction::Delete { id } => {
            if !db.delete_session(id)? {
                return Err(format!("session not found: {id}").into());
            }
            println!("ok");
        }
        HistoryAction::Clear => {
            let removed = db.clear_history()?;
            println!("removed {removed} session(s)");
        }
        HistoryAction::Trim => {
            let removed = db.trim_history(config.history.keep_count)?;
            println!("removed {removed} session(s)");
        }
    }
    Ok(())
}
