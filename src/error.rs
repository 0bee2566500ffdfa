//! Error types for vrm-idle

use thiserror::Error;

/// Main error type for vrm-idle
#[derive(Error, Debug)]
pub enum VrmIdleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Avatar error: {0}")]
    Avatar(#[from] AvatarError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Avatar asset loading errors. All of these are terminal for the avatar.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse model: {0}")]
    Parse(String),

    #[error("Model has no skeleton joints")]
    NoSkeleton,
}

/// Recoverable avatar errors raised by the pose control surface
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AvatarError {
    #[error("Avatar is not loaded")]
    NotLoaded,

    #[error("Unknown side: {0} (expected \"left\" or \"right\")")]
    UnknownSide(String),
}

/// Result type alias for vrm-idle operations
pub type Result<T> = std::result::Result<T, VrmIdleError>;

/// Stdin command parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{command}: expected {expected} arguments, got {got}")]
    Arity {
        command: String,
        expected: usize,
        got: usize,
    },

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error(transparent)]
    Side(#[from] AvatarError),
}
