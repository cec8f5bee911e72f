use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cyclic dependency detected involving task {task_id}")]
    CyclicDependency { task_id: i64 },
    #[error("not found: {0}")]
    NotFound(String),
}

impl AnalysisError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AnalysisError::InvalidInput(message.into())
    }

    /// Stable machine-readable name, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InvalidInput(_) => "invalid_input",
            AnalysisError::CyclicDependency { .. } => "cyclic_dependency",
            AnalysisError::NotFound(_) => "not_found",
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
