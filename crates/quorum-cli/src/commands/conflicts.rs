use quorum_core::models::SuggestionConflict;
use quorum_core::{ConflictId, IdeaId, MergeService, UserId};

use crate::commands::common::{
    ensure_can_act, format_conflict_lines, parse_id, print_json, CliContext,
};
use crate::error::CliError;

pub fn run_list(ctx: &CliContext, idea: &str, as_json: bool) -> Result<(), CliError> {
    let idea_id: IdeaId = parse_id("idea", idea)?;
    let service = ctx.open_service()?;
    let conflicts = service.unresolved_conflicts(&idea_id)?;

    if as_json {
        print_json(&conflicts)?;
    } else {
        for line in format_conflict_lines(&conflicts) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn run_resolve(
    ctx: &CliContext,
    conflict: &str,
    notes: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let (service, conflict_id, actor) = authorize_on_conflict(ctx, conflict)?;
    let conflict = service.resolve_conflict(&conflict_id, &actor, notes)?;
    print_conflict(&conflict, as_json)
}

pub fn run_ignore(
    ctx: &CliContext,
    conflict: &str,
    notes: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let (service, conflict_id, actor) = authorize_on_conflict(ctx, conflict)?;
    let conflict = service.ignore_conflict(&conflict_id, &actor, notes)?;
    print_conflict(&conflict, as_json)
}

fn authorize_on_conflict(
    ctx: &CliContext,
    conflict: &str,
) -> Result<(MergeService, ConflictId, UserId), CliError> {
    let conflict_id: ConflictId = parse_id("conflict", conflict)?;
    let actor = ctx.actor()?;
    let service = ctx.open_service()?;
    let conflict = service
        .get_conflict(&conflict_id)?
        .ok_or_else(|| CliError::NotFound(format!("Conflict {conflict_id}")))?;
    ensure_can_act(&service, &actor, &conflict.idea_id)?;
    Ok((service, conflict_id, actor))
}

fn print_conflict(conflict: &SuggestionConflict, as_json: bool) -> Result<(), CliError> {
    if as_json {
        print_json(conflict)?;
    } else {
        println!("{} {}", conflict.id, conflict.resolution_status);
    }
    Ok(())
}
