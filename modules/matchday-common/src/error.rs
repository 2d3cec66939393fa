use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchdayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Source blocked the fetch after {attempts} attempts")]
    Blocked { attempts: u32 },

    #[error("Update conflict: another pipeline run is in progress")]
    UpdateInProgress,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
