//! Recent focus task commands.

use clap::Subcommand;
use pomobreath_core::Database;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Remember a task title (reuses a title that matches ignoring case)
    Add {
        /// Task title
        title: String,
    },
    /// List tasks, most recently used first
    List,
    /// Mark a task as just used
    Touch {
        /// Task ID
        id: Uuid,
    },
    /// Forget a task
    Delete {
        /// Task ID
        id: Uuid,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TaskAction::Add { title } => {
            let task = db.add_task(&title)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List => {
            let tasks = db.list_tasks()?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TaskAction::Touch { id } => {
            if !db.touch_task(id)? {
                return Err(format!("task not found: {id}").into());
            }
            println!("ok");
        }
        TaskAction::Delete { id } => {
            if !db.delete_task(id)? {
                return Err(format!("task not found: {id}").into());
            }
            println!("ok");
        }
    }
    Ok(())
}
