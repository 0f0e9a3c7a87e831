use crate::commands::common::{normalize_content, parse_id, print_json, CliContext};
use crate::error::CliError;
use quorum_core::IdeaId;

pub fn run_create(ctx: &CliContext, title_parts: &[String], as_json: bool) -> Result<(), CliError> {
    let title = normalize_content(title_parts).ok_or(CliError::EmptyContent)?;
    let actor = ctx.actor()?;
    let service = ctx.open_service()?;
    let idea = service.create_idea(&actor, &title)?;

    if as_json {
        print_json(&idea)?;
    } else {
        println!("{}", idea.id);
    }
    Ok(())
}

pub fn run_show(ctx: &CliContext, idea: &str, as_json: bool) -> Result<(), CliError> {
    let idea_id: IdeaId = parse_id("idea", idea)?;
    let service = ctx.open_service()?;
    let idea = service
        .get_idea(&idea_id)?
        .ok_or_else(|| CliError::NotFound(format!("Idea {idea_id}")))?;

    if as_json {
        print_json(&idea)?;
    } else {
        println!("{}  {}", idea.id, idea.title);
        println!("owner: {}", idea.author_id);
    }
    Ok(())
}
