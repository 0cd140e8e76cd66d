use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropOpsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Actuator error: {0}")]
    Actuator(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, CropOpsError>;
