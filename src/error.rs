//! Error types for format lookup and rendering.

/// Errors raised while building or rendering access-log formats.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoggerError {
    /// A template references a token that is not registered.
    #[error("Unknown token ':{0}'")]
    UnknownToken(String),

    /// No format name was given and no default format is configured.
    #[error("Format name is empty and no default format is defined")]
    EmptyFormat,
}
