use chrono::Utc;
use quorum_core::UserId;
use serde::Serialize;

use crate::commands::common::{format_relative_time, parse_id, print_json, CliContext};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct PointsReport {
    user_id: UserId,
    total: i64,
    entries: Vec<quorum_core::models::PointsEntry>,
}

pub fn run_points(
    ctx: &CliContext,
    user: Option<&str>,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let user_id: UserId = match user {
        Some(raw) => parse_id("user", raw)?,
        None => ctx.actor()?,
    };
    let service = ctx.open_service()?;
    let report = PointsReport {
        user_id,
        total: service.points_total(&user_id)?,
        entries: service.points_history(&user_id, limit)?,
    };

    if as_json {
        print_json(&report)?;
        return Ok(());
    }

    println!("{} points", report.total);
    let now_ms = Utc::now().timestamp_millis();
    for entry in &report.entries {
        println!(
            "  {:+4}  {:<40}  {}",
            entry.amount,
            entry.reason,
            format_relative_time(entry.awarded_at, now_ms)
        );
    }
    Ok(())
}
