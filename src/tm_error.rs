use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed trace line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("trace ended early: expected {0}")]
    UnexpectedEof(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SimError {
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        SimError::MalformedLine {
            line,
            reason: reason.into(),
        }
    }
}
