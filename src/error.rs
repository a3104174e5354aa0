use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Exchange API error: {0}")]
    ExchangeApi(String),

    #[error("Signal log error: {0}")]
    SignalLog(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
