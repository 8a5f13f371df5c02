use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Please enter the video URL.")]
    MissingUrl,

    #[error("Please choose the destination folder.")]
    MissingDestination,

    #[error("A download is already in progress")]
    Busy,

    #[error("Failed to start {0}")]
    Spawn(String),

    #[error("{0}")]
    Engine(String),

    #[error("Remux failed: {0}")]
    Remux(String),

    #[error("Could not determine the final file path.")]
    MissingOutput,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Settings error: {0}")]
    Config(String),
}
