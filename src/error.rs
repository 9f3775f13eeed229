// ABOUTME: Application-wide error types for stackdock.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::stack::StackError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    #[error(
        "architecture {arch} is not supported by profile {profile} (supported: {supported})"
    )]
    UnsupportedArchitecture {
        arch: String,
        profile: String,
        supported: String,
    },

    #[error(transparent)]
    Runtime(#[from] crate::runtime::RuntimeError),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
