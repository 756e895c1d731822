use thiserror::Error as ThisError;

/// Errors that can occur while configuring or running the logger
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
    /// An option was applied after the global logger was built.
    #[error("logger already initialized before applying the {0} option")]
    AlreadyInitialized(&'static str),
    /// Time formatting or parsing failed.
    #[error("Time error: {0}")]
    Time(#[from] time::error::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
