use std::collections::HashMap;

use quorum_core::db::{StateFilter, SuggestionFilter, SuggestionThread};
use quorum_core::models::SuggestionKind;
use quorum_core::{IdeaId, Suggestion, SuggestionId};

use crate::commands::common::{
    ensure_can_act, format_suggestion_lines, normalize_content, parse_id, print_json, CliContext,
};
use crate::error::CliError;

pub fn run_add(
    ctx: &CliContext,
    idea: &str,
    content_parts: &[String],
    kind: &str,
    parent: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let idea_id: IdeaId = parse_id("idea", idea)?;
    let content = normalize_content(content_parts).ok_or(CliError::EmptyContent)?;
    let kind: SuggestionKind = kind.parse()?;
    let parent = parent
        .map(|raw| parse_id::<SuggestionId>("parent suggestion", raw))
        .transpose()?;
    let actor = ctx.actor()?;

    let service = ctx.open_service()?;
    let suggestion = service.create_suggestion(&idea_id, &actor, &content, kind, parent)?;
    print_suggestion(&suggestion, as_json)
}

pub fn run_list(
    ctx: &CliContext,
    idea: &str,
    state: Option<&str>,
    kind: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let idea_id: IdeaId = parse_id("idea", idea)?;
    let filter = SuggestionFilter {
        kind: kind.map(str::parse::<SuggestionKind>).transpose()?,
        state: state.map(str::parse::<StateFilter>).transpose()?,
    };
    let service = ctx.open_service()?;
    let suggestions = service.list_suggestions(&idea_id, &filter)?;

    if as_json {
        print_json(&suggestions)?;
    } else {
        for line in format_suggestion_lines(&suggestions) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn run_thread(ctx: &CliContext, id: &str, as_json: bool) -> Result<(), CliError> {
    let suggestion_id: SuggestionId = parse_id("suggestion", id)?;
    let service = ctx.open_service()?;
    let thread = service.suggestion_thread(&suggestion_id)?;

    if as_json {
        print_json(&thread)?;
    } else {
        for line in format_thread_lines(&thread) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Root first, then each reply indented one step per ancestor below the root
pub fn format_thread_lines(thread: &SuggestionThread) -> Vec<String> {
    let mut depths: HashMap<SuggestionId, usize> = HashMap::new();
    depths.insert(thread.root.id, 0);
    let mut lines = format_suggestion_lines(std::slice::from_ref(&thread.root));

    for (reply, line) in thread
        .replies
        .iter()
        .zip(format_suggestion_lines(&thread.replies))
    {
        let depth = reply
            .parent_id
            .and_then(|parent| depths.get(&parent).copied())
            .map_or(1, |parent_depth| parent_depth + 1);
        depths.insert(reply.id, depth);
        lines.push(format!("{}{line}", "  ".repeat(depth)));
    }
    lines
}

pub fn run_accept(ctx: &CliContext, id: &str, as_json: bool) -> Result<(), CliError> {
    let (service, suggestion_id, actor) = authorize_on_suggestion(ctx, id)?;
    let suggestion = service.accept_suggestion(&suggestion_id, &actor)?;
    print_suggestion(&suggestion, as_json)
}

pub fn run_reject(ctx: &CliContext, id: &str, as_json: bool) -> Result<(), CliError> {
    let (service, suggestion_id, _) = authorize_on_suggestion(ctx, id)?;
    let suggestion = service.reject_suggestion(&suggestion_id)?;
    print_suggestion(&suggestion, as_json)
}

pub fn run_stats(ctx: &CliContext, idea: &str, as_json: bool) -> Result<(), CliError> {
    let idea_id: IdeaId = parse_id("idea", idea)?;
    let service = ctx.open_service()?;
    let stats = service.suggestion_stats(&idea_id)?;

    if as_json {
        print_json(&stats)?;
    } else {
        println!("total     {}", stats.total);
        println!("pending   {}", stats.pending);
        println!("accepted  {} ({} merged)", stats.accepted, stats.merged);
        println!("rejected  {}", stats.rejected);
        for (kind, count) in &stats.by_kind {
            println!("  {kind:<11} {count}");
        }
    }
    Ok(())
}

/// Only the owner of the suggestion's idea may accept or reject it
fn authorize_on_suggestion(
    ctx: &CliContext,
    id: &str,
) -> Result<(quorum_core::MergeService, SuggestionId, quorum_core::UserId), CliError> {
    let suggestion_id: SuggestionId = parse_id("suggestion", id)?;
    let actor = ctx.actor()?;
    let service = ctx.open_service()?;
    let suggestion = service
        .get_suggestion(&suggestion_id)?
        .ok_or_else(|| CliError::NotFound(format!("Suggestion {suggestion_id}")))?;
    ensure_can_act(&service, &actor, &suggestion.idea_id)?;
    Ok((service, suggestion_id, actor))
}

fn print_suggestion(suggestion: &Suggestion, as_json: bool) -> Result<(), CliError> {
    if as_json {
        print_json(suggestion)?;
    } else {
        println!("{}", suggestion.id);
    }
    Ok(())
}
