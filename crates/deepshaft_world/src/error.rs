//! # World Error Types
//!
//! Errors raised while building a world or decoding persisted data.
//! Gameplay queries and mutations never produce these.

use thiserror::Error;

/// Errors that can occur while configuring or restoring a world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// Configuration values violate an invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    /// A file could not be read.
    #[error("i/o error: {0}")]
    Io(String),

    /// A sparse map key was not of the form `"x,y"`.
    #[error("invalid coordinate key: {0:?}")]
    InvalidCoordinate(String),

    /// A block name or id is not known.
    #[error("unknown block: {0}")]
    UnknownBlock(String),

    /// A binary snapshot failed to decompress or has the wrong layout.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

impl From<std::io::Error> for WorldError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for WorldError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}

/// Result type for world construction and persistence.
pub type WorldResult<T> = Result<T, WorldError>;
