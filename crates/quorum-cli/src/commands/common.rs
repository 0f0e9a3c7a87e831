use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use quorum_core::models::{ConflictDescriptor, SuggestionConflict, SuggestionMerge, SuggestionState};
use quorum_core::{IdeaId, MergeConfig, MergeService, Suggestion, UserId};
use serde::Serialize;

use crate::error::CliError;

/// Paths and identity resolved once per invocation
pub struct CliContext {
    pub db_path: PathBuf,
    pub config_path: PathBuf,
    actor: Option<String>,
}

impl CliContext {
    pub fn new(db_path: PathBuf, config_path: PathBuf, cli_actor: Option<String>) -> Self {
        Self {
            db_path,
            config_path,
            actor: cli_actor.or_else(|| env::var("QUORUM_ACTOR").ok()),
        }
    }

    pub fn open_service(&self) -> Result<MergeService, CliError> {
        open_service(&self.db_path, &self.config_path)
    }

    /// The acting user, required by every command that writes
    pub fn actor(&self) -> Result<UserId, CliError> {
        let raw = self
            .actor
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or(CliError::MissingActor)?;
        parse_id("user", raw)
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("QUORUM_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quorum")
        .join("quorum.db")
}

pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> PathBuf {
    cli_config_path
        .or_else(|| env::var_os("QUORUM_CONFIG").map(PathBuf::from))
        .unwrap_or_else(default_config_path)
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quorum")
        .join("config.json")
}

pub fn open_service(db_path: &Path, config_path: &Path) -> Result<MergeService, CliError> {
    let config = MergeConfig::load_from_path(config_path)?;
    Ok(MergeService::open(db_path, config)?)
}

/// Parse a user-supplied identifier, naming the kind of ID in errors
pub fn parse_id<T>(kind: &'static str, raw: &str) -> Result<T, CliError>
where
    T: FromStr,
    T::Err: Display,
{
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyId(kind));
    }
    trimmed.parse().map_err(|_| CliError::InvalidId {
        kind,
        value: trimmed.to_string(),
    })
}

pub fn parse_ids<T>(kind: &'static str, raw: &[String]) -> Result<Vec<T>, CliError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.iter().map(|value| parse_id(kind, value)).collect()
}

/// Fail unless `actor` owns `idea`
pub fn ensure_can_act(
    service: &MergeService,
    actor: &UserId,
    idea: &IdeaId,
) -> Result<(), CliError> {
    if service.can_act(actor, idea)? {
        Ok(())
    } else {
        Err(CliError::Forbidden {
            actor: actor.to_string(),
            idea: idea.to_string(),
        })
    }
}

/// Join positional words into one trimmed text
pub fn normalize_content(parts: &[String]) -> Option<String> {
    let joined = parts.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn short_id(id: &impl Display) -> String {
    id.to_string().chars().take(13).collect()
}

pub fn preview(content: &str, max_chars: usize) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else {
        format!("{}d ago", diff / day)
    }
}

pub fn state_label(state: &SuggestionState) -> &'static str {
    if state.is_merged() {
        "merged"
    } else {
        state.name()
    }
}

pub fn format_suggestion_lines(suggestions: &[Suggestion]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    suggestions
        .iter()
        .map(|suggestion| {
            let id = short_id(&suggestion.id);
            let kind = suggestion.kind.as_str();
            let state = state_label(&suggestion.state);
            let content = preview(&suggestion.content, 40);
            let relative_time = format_relative_time(suggestion.created_at, now_ms);
            let marker = if suggestion.is_reply() { "↳ " } else { "" };
            format!("{id:<13}  {kind:<11}  {state:<8}  {marker}{content:<40}  {relative_time}")
        })
        .collect()
}

pub fn format_descriptor_line(descriptor: &ConflictDescriptor) -> String {
    match descriptor {
        ConflictDescriptor::ContentOverlap {
            first,
            second,
            similarity,
            ..
        } => format!(
            "overlap   {} ~ {}  similarity {similarity:.2}",
            short_id(first),
            short_id(second)
        ),
        ConflictDescriptor::LogicalConflict {
            positive_count,
            negative_count,
            ..
        } => format!("logical   {positive_count} additive vs {negative_count} subtractive"),
    }
}

pub fn format_conflict_lines(conflicts: &[SuggestionConflict]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{}  {} ~ {}  {}  {}",
                conflict.id,
                short_id(&conflict.suggestion_1_id),
                short_id(&conflict.suggestion_2_id),
                conflict.conflict_type.as_str(),
                format_relative_time(conflict.created_at, now_ms)
            )
        })
        .collect()
}

pub fn format_merge_lines(merges: &[SuggestionMerge]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    merges
        .iter()
        .map(|merge| {
            let conflicts = if merge.has_conflicts { "  (had conflicts)" } else { "" };
            format!(
                "{}  {:<6}  {}  {}{conflicts}",
                short_id(&merge.id),
                merge.merge_type.as_str(),
                merge.merge_summary,
                format_relative_time(merge.created_at, now_ms)
            )
        })
        .collect()
}
