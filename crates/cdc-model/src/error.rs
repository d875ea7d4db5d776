//! Error types for model parsing

/// Errors raised when turning user-entered text into typed field values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Max records must be a positive integer
    #[error("invalid max records {0:?}: expected a positive integer")]
    InvalidMaxRecords(String),

    /// Goal must be a finite number without any other characters
    #[error("invalid goal {0:?}: expected a plain number")]
    InvalidGoal(String),

    /// Sort order string not recognized
    #[error("unknown sort order: {0:?}")]
    UnknownSortOrder(String),

    /// Chart type string not recognized
    #[error("unknown chart type: {0:?}")]
    UnknownChartType(String),
}
