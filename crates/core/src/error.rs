#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid number '{input}': {reason}")]
    InvalidNumber { input: String, reason: &'static str },
}
