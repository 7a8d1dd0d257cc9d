use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcademyError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AcademyError {
    pub fn not_found(what: &str) -> Self {
        AcademyError::NotFound(format!("{what} not found"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AcademyError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AcademyError::Conflict(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AcademyError>;
