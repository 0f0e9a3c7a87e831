//! Quorum CLI - conflict detection and merging for idea suggestions
//!
//! Drives the merge engine against a local database.

mod cli;
mod commands;
mod error;


use std::error::Error as _;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, IdeaCommands, SuggestionCommands};
use crate::commands::common::{resolve_config_path, resolve_db_path, CliContext};
use crate::commands::{
    analyze, completions, conflicts, idea, merge, points, recommend, suggestion,
};
use crate::error::CliError;

fn main() {
    if let Err(error) = run() {
        eprintln!("Error: {error}");
        let mut source = error.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quorum=info")),
        )
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Commands::Completions { shell, output } = &command {
        return completions::run_completions(*shell, output.as_deref());
    }

    let ctx = CliContext::new(
        resolve_db_path(cli.db_path),
        resolve_config_path(cli.config),
        cli.actor,
    );

    match command {
        Commands::Idea { command } => match command {
            IdeaCommands::Create { title, json } => idea::run_create(&ctx, &title, json)?,
            IdeaCommands::Show { idea, json } => idea::run_show(&ctx, &idea, json)?,
        },
        Commands::Suggestion { command } => match command {
            SuggestionCommands::Add {
                idea,
                content,
                kind,
                parent,
                json,
            } => suggestion::run_add(&ctx, &idea, &content, &kind, parent.as_deref(), json)?,
            SuggestionCommands::List {
                idea,
                pending,
                state,
                kind,
                json,
            } => {
                let state = if pending { Some("pending") } else { state.as_deref() };
                suggestion::run_list(&ctx, &idea, state, kind.as_deref(), json)?;
            }
            SuggestionCommands::Thread { id, json } => suggestion::run_thread(&ctx, &id, json)?,
            SuggestionCommands::Accept { id, json } => suggestion::run_accept(&ctx, &id, json)?,
            SuggestionCommands::Reject { id, json } => suggestion::run_reject(&ctx, &id, json)?,
            SuggestionCommands::Stats { idea, json } => suggestion::run_stats(&ctx, &idea, json)?,
        },
        Commands::Analyze {
            idea,
            suggestions,
            json,
        } => analyze::run_analyze(&ctx, &idea, &suggestions, json)?,
        Commands::Merge {
            idea,
            suggestions,
            strategy,
            auto,
            resolution,
            json,
        } => merge::run_merge(
            &ctx,
            &idea,
            &suggestions,
            &merge::MergeArgs {
                strategy: &strategy,
                auto,
                resolution: resolution.as_deref(),
            },
            json,
        )?,
        Commands::History { idea, json } => merge::run_history(&ctx, &idea, json)?,
        Commands::Conflicts { idea, json } => conflicts::run_list(&ctx, &idea, json)?,
        Commands::Resolve {
            conflict,
            notes,
            json,
        } => conflicts::run_resolve(&ctx, &conflict, notes.as_deref(), json)?,
        Commands::Ignore {
            conflict,
            notes,
            json,
        } => conflicts::run_ignore(&ctx, &conflict, notes.as_deref(), json)?,
        Commands::Recommend { idea, json } => recommend::run_recommend(&ctx, &idea, json)?,
        Commands::Points { user, limit, json } => {
            points::run_points(&ctx, user.as_deref(), limit, json)?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
