//! Live board following.
//!
//! Subscribes to both panels and reprints the board on every snapshot
//! delivery. A timer watches for the week rolling over while the
//! process stays open; when it does, the habit feed is rebuilt for the
//! new week and the carry-over check runs again.

use std::error::Error;
use std::time::Duration;

use tracing::info;
use weekboard_core::{Habit, Priority, WeekId};

use crate::commands::board::render_board;
use crate::common::{week_for_offset, AppContext};

const ROLLOVER_CHECK: Duration = Duration::from_secs(60);

pub async fn run(week_offset: i64) -> Result<(), Box<dyn Error>> {
    eprintln!("Connecting...");
    let ctx = AppContext::connect().await?;
    eprintln!("Connected as {}", ctx.session.user_id());

    let priorities_panel = ctx.priorities();
    let mut week = week_for_offset(week_offset)?;
    let mut habits_panel = ctx.habits(week);
    habits_panel.activate().await?;

    let mut priorities_feed = priorities_panel.subscribe().await?;
    let mut habits_feed = habits_panel.subscribe().await?;

    let mut priorities: Vec<Priority> = priorities_feed.recv().await?;
    let mut habits: Vec<Habit> = habits_feed.recv().await?;
    repaint(week, &priorities, &habits);

    loop {
        tokio::select! {
            snapshot = priorities_feed.recv() => {
                priorities = snapshot?;
                repaint(week, &priorities, &habits);
            }
            snapshot = habits_feed.recv() => {
                habits = snapshot?;
                repaint(week, &priorities, &habits);
            }
            _ = tokio::time::sleep(ROLLOVER_CHECK) => {
                let now = week_for_offset(week_offset)?;
                if now != week {
                    info!(from = %week, to = %now, "week rolled over");
                    week = now;
                    habits_panel = habits_panel.for_week(week);
                    habits_panel.activate().await?;
                    habits_feed = habits_panel.subscribe().await?;
                    habits = habits_feed.recv().await?;
                    repaint(week, &priorities, &habits);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Stopped.");
                return Ok(());
            }
        }
    }
}

fn repaint(week: WeekId, priorities: &[Priority], habits: &[Habit]) {
    println!("{}", render_board(week, priorities, habits));
}
