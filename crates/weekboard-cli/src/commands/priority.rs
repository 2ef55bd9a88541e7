//! Weekly priorities commands.

use clap::Subcommand;
use weekboard_core::DocId;

use crate::common::AppContext;

#[derive(Subcommand)]
pub enum PriorityAction {
    /// Add a priority
    Add {
        /// Priority text
        text: String,
    },
    /// List priorities
    List,
    /// Mark a priority as done
    Done {
        /// Priority ID
        id: String,
    },
    /// Mark a priority as not done
    Undo {
        /// Priority ID
        id: String,
    },
    /// Delete a priority
    Rm {
        /// Priority ID
        id: String,
    },
}

pub async fn run(action: PriorityAction, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::connect().await?;
    let panel = ctx.priorities();

    match action {
        PriorityAction::Add { text } => {
            let id = panel.add(&text).await?;
            println!("Priority added: {id}");
        }
        PriorityAction::List => {
            let priorities = panel.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&priorities)?);
            } else if priorities.is_empty() {
                println!("No priorities yet.");
            } else {
                for p in &priorities {
                    let mark = if p.completed { "x" } else { " " };
                    println!("[{mark}] {}  ({})", p.text, p.id);
                }
            }
        }
        PriorityAction::Done { id } => {
            let id = DocId::new(id);
            panel.set_completed(&id, true).await?;
            println!("Priority done: {id}");
        }
        PriorityAction::Undo { id } => {
            let id = DocId::new(id);
            panel.set_completed(&id, false).await?;
            println!("Priority reopened: {id}");
        }
        PriorityAction::Rm { id } => {
            let id = DocId::new(id);
            panel.remove(&id).await?;
            println!("Priority deleted: {id}");
        }
    }
    Ok(())
}
