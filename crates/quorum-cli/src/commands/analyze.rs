use quorum_core::{IdeaId, SuggestionId};

use crate::commands::common::{format_descriptor_line, parse_id, parse_ids, print_json, CliContext};
use crate::error::CliError;

pub fn run_analyze(
    ctx: &CliContext,
    idea: &str,
    suggestions: &[String],
    as_json: bool,
) -> Result<(), CliError> {
    let idea_id: IdeaId = parse_id("idea", idea)?;
    let suggestion_ids: Vec<SuggestionId> = parse_ids("suggestion", suggestions)?;
    let service = ctx.open_service()?;
    let analysis = service.analyze(&idea_id, &suggestion_ids)?;

    if as_json {
        print_json(&analysis)?;
        return Ok(());
    }

    println!(
        "{} pending suggestions, {} conflicts",
        analysis.suggestions_count,
        analysis.conflicts.len()
    );
    for descriptor in &analysis.conflicts {
        println!("  {}", format_descriptor_line(descriptor));
    }
    println!(
        "{}",
        if analysis.can_merge {
            "Ready to merge"
        } else {
            "Not ready to merge"
        }
    );
    Ok(())
}
