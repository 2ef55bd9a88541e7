//! Weekly board view: priorities checklist above the habit grid.

use std::fmt::Write as _;

use weekboard_core::{Habit, Priority, WeekId, DAY_LABELS};

use crate::common::{week_for_offset, AppContext};

pub async fn run(week_offset: i64, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::connect().await?;
    let week = week_for_offset(week_offset)?;

    let habits_panel = ctx.habits(week);
    habits_panel.activate().await?;

    let priorities = ctx.priorities().list().await?;
    let habits = habits_panel.list().await?;

    if json {
        println!("{}", board_json(week, &priorities, &habits)?);
    } else {
        print!("{}", render_board(week, &priorities, &habits));
    }
    Ok(())
}

pub fn board_json(
    week: WeekId,
    priorities: &[Priority],
    habits: &[Habit],
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "week": week.to_string(),
        "week_start": week.start().to_string(),
        "priorities": priorities,
        "habits": habits,
    }))
}

/// Plain-text rendering, shared with `watch`.
pub fn render_board(week: WeekId, priorities: &[Priority], habits: &[Habit]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Week of {}", week.start().format("%B %-d, %Y"));

    let _ = writeln!(out);
    let _ = writeln!(out, "Priorities");
    if priorities.is_empty() {
        let _ = writeln!(out, "  (none)");
    } else {
        for p in priorities {
            let mark = if p.completed { "x" } else { " " };
            let _ = writeln!(out, "  [{mark}] {}  ({})", p.text, p.id);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Habits");
    if habits.is_empty() {
        let _ = writeln!(out, "  (none)");
        return out;
    }

    let name_width = habits.iter().map(|h| h.name.len()).max().unwrap_or(0);
    let _ = write!(out, "  {:name_width$}", "");
    for label in DAY_LABELS {
        let _ = write!(out, "  {label}");
    }
    let _ = writeln!(out);

    for habit in habits {
        let _ = write!(out, "  {:<name_width$}", habit.name);
        for &done in &habit.progress {
            let cell = if done { "x" } else { "." };
            let _ = write!(out, "  {cell:^3}");
        }
        let _ = writeln!(out, "  ({})", habit.id);
    }
    out
}
