use thiserror::Error;

#[derive(Error, Debug)]
pub enum MentionWatchError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    ConfigMissing(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Session cache error: {0}")]
    Session(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
