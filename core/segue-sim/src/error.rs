use segue_core::SegueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] SegueError),

    #[error("Invalid click '{value}': {details}")]
    InvalidClick { value: String, details: String },

    #[error("Failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
