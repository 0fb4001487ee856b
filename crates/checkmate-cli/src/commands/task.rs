use chrono::Utc;
use clap::Subcommand;
use checkmate_core::{SqliteStore, TaskList};

use super::CliResult;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the end of the list
    Add {
        /// Task text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List tasks in order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task done, or not done again
    Toggle {
        /// Task id, id prefix, or position
        task: String,
    },
    /// Delete a task
    Delete {
        /// Task id, id prefix, or position
        task: String,
    },
    /// Move a task to a new position
    Move {
        /// Task id, id prefix, or position
        task: String,
        /// New 1-based position
        position: usize,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let mut store = SqliteStore::open()?;
    let mut list = TaskList::load(&store)?;

    match action {
        TaskAction::Add { text } => {
            let task = list.add(&text.join(" "), Utc::now())?;
            println!("Task added: {} ({})", task.text, task.id);
        }
        TaskAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(list.tasks())?);
            } else if list.is_empty() {
                println!("No tasks.");
            } else {
                for task in list.tasks() {
                    let mark = if task.completed { "x" } else { " " };
                    let short_id = task.id.get(..8).unwrap_or(&task.id);
                    println!("{:>3}. [{mark}] {}  {short_id}", task.priority, task.text);
                }
            }
            return Ok(());
        }
        TaskAction::Toggle { task } => {
            let id = list.resolve(&task)?.to_string();
            let done = list.toggle(&id)?;
            println!("{}", if done { "done" } else { "not done" });
        }
        TaskAction::Delete { task } => {
            let id = list.resolve(&task)?.to_string();
            let removed = list.delete(&id)?;
            println!("Task deleted: {}", removed.text);
        }
        TaskAction::Move { task, position } => {
            let id = list.resolve(&task)?.to_string();
            list.move_to(&id, position.saturating_sub(1))?;
            println!("ok");
        }
    }

    list.save(&mut store)?;
    Ok(())
}
