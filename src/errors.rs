use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Unknown selector value: '{0}'")]
    InvalidSelector(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Error::FrameworkError(Box::new(value))
    }
}

impl Error {
    /// Message safe to show the end user. Recoverable input errors render
    /// their own text; storage and framework failures render a generic line
    /// (the detailed error is for the logs only).
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(_) | Error::NotFound(_) | Error::InvalidSelector(_) => {
                format!("❌ {}", self)
            }
            _ => "❌ Something went wrong on our side. Please try again later.".to_string(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
