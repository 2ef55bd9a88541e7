//! Habit grid commands.
//!
//! All actions run against the active week (`--week-offset` moves it).
//! The carry-over check runs before any action, matching what a board
//! view would have done first.

use clap::Subcommand;
use weekboard_core::{DocId, DAY_LABELS};

use crate::common::{week_for_offset, AppContext};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Add a habit to the active week
    Add {
        /// Habit name
        name: String,
    },
    /// List the active week's habits
    List,
    /// Toggle one day of a habit
    Toggle {
        /// Habit ID
        id: String,
        /// Day index, 0 = Monday through 6 = Sunday
        day: usize,
    },
    /// Delete a habit from the active week
    Rm {
        /// Habit ID
        id: String,
    },
}

pub async fn run(
    action: HabitAction,
    week_offset: i64,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::connect().await?;
    let panel = ctx.habits(week_for_offset(week_offset)?);
    panel.activate().await?;

    match action {
        HabitAction::Add { name } => {
            let id = panel.add(&name).await?;
            println!("Habit added to week {}: {id}", panel.week());
        }
        HabitAction::List => {
            let habits = panel.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&habits)?);
            } else if habits.is_empty() {
                println!("No habits in week {}.", panel.week());
            } else {
                for h in &habits {
                    let days: String = h
                        .progress
                        .iter()
                        .map(|&done| if done { 'x' } else { '.' })
                        .collect();
                    println!("{days} {}  ({})", h.name, h.id);
                }
            }
        }
        HabitAction::Toggle { id, day } => {
            let id = DocId::new(id);
            panel.toggle_day(&id, day).await?;
            println!("Toggled {} for habit {id}", DAY_LABELS[day]);
        }
        HabitAction::Rm { id } => {
            let id = DocId::new(id);
            panel.remove(&id).await?;
            println!("Habit deleted from week {}: {id}", panel.week());
        }
    }
    Ok(())
}
