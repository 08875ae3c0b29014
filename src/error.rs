use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database connection error: {0}")]
    Connection(#[from] tokio_rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("No item named '{0}' in the catalog")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("'{slug}' is a {kind} and cannot be probed directly; expand it into episodes first")]
    NotProbableKind { slug: String, kind: String },

    #[error("Invalid URL template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
