use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Missing snapshots and unmet hard minimums both surface to callers as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, AnalysisError::NotFound(_) | AnalysisError::InsufficientData(_))
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
