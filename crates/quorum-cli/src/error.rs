use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] quorum_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No content provided")]
    EmptyContent,
    #[error("{0} ID cannot be empty")]
    EmptyId(&'static str),
    #[error("Invalid {kind} ID '{value}'")]
    InvalidId { kind: &'static str, value: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("No acting user. Pass --actor <USER_ID> or set QUORUM_ACTOR.")]
    MissingActor,
    #[error("User {actor} may not act on idea {idea}")]
    Forbidden { actor: String, idea: String },
    #[error("Invalid --resolution payload: {0}")]
    InvalidResolution(String),
}
