//! Week information.

use weekboard_core::DAY_LABELS;

use crate::common::week_for_offset;

pub fn run(week_offset: i64, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let week = week_for_offset(week_offset)?;
    let days = week.days();

    if json {
        let value = serde_json::json!({
            "id": week.to_string(),
            "start": week.start().to_string(),
            "offset": week_offset,
            "days": days.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Week {} (starts {})", week, week.start());
    for (label, date) in DAY_LABELS.iter().zip(days.iter()) {
        println!("  {label} {date}");
    }
    Ok(())
}
