use thiserror::Error;

pub type Result<T> = std::result::Result<T, TelegramError>;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        TelegramError::Network(err.to_string())
    }
}
