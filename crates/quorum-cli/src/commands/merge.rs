use quorum_core::models::Change;
use quorum_core::{IdeaId, MergeOptions, SuggestionId};

use crate::commands::common::{
    ensure_can_act, format_merge_lines, parse_id, parse_ids, preview, print_json, CliContext,
};
use crate::error::CliError;

/// Flags of `quorum merge` beyond the IDs
pub struct MergeArgs<'a> {
    pub strategy: &'a str,
    pub auto: bool,
    pub resolution: Option<&'a str>,
}

impl MergeArgs<'_> {
    pub fn to_options(&self) -> Result<MergeOptions, CliError> {
        let mut options = MergeOptions::default()
            .with_strategy_name(self.strategy.trim())
            .auto(self.auto);
        if let Some(raw) = self.resolution {
            let payload = serde_json::from_str(raw)
                .map_err(|error| CliError::InvalidResolution(error.to_string()))?;
            options = options.with_conflict_resolution(payload);
        }
        Ok(options)
    }
}

pub fn run_merge(
    ctx: &CliContext,
    idea: &str,
    suggestions: &[String],
    args: &MergeArgs<'_>,
    as_json: bool,
) -> Result<(), CliError> {
    let idea_id: IdeaId = parse_id("idea", idea)?;
    let suggestion_ids: Vec<SuggestionId> = parse_ids("suggestion", suggestions)?;
    let options = args.to_options()?;
    let actor = ctx.actor()?;

    let service = ctx.open_service()?;
    ensure_can_act(&service, &actor, &idea_id)?;
    let merge = service.merge(&idea_id, &suggestion_ids, &actor, &options)?;

    if as_json {
        print_json(&merge)?;
        return Ok(());
    }

    println!("{}", merge.id);
    println!("{}", merge.merge_summary);
    for change in &merge.changes_applied {
        println!("  {}", format_change_line(change));
    }
    if merge.has_conflicts {
        println!("Conflicts were recorded; see `quorum conflicts {idea_id}`");
    }
    Ok(())
}

pub fn run_history(ctx: &CliContext, idea: &str, as_json: bool) -> Result<(), CliError> {
    let idea_id: IdeaId = parse_id("idea", idea)?;
    let service = ctx.open_service()?;
    let history = service.merge_history(&idea_id)?;

    if as_json {
        print_json(&history)?;
    } else {
        for line in format_merge_lines(&history) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_change_line(change: &Change) -> String {
    match change {
        Change::Consensus {
            content,
            support_count,
            ..
        } => format!("[consensus x{support_count}] {}", preview(content, 60)),
        Change::Priority {
            content,
            author_points,
            ..
        } => format!("[priority {author_points} pts] {}", preview(content, 60)),
        Change::Latest { content, .. } => format!("[latest] {}", preview(content, 60)),
    }
}
