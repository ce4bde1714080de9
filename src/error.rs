use thiserror::Error;

/// Why a raw statement could not be translated into a builder call.
///
/// This is not a failure of the store: nothing was sent anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedReason {
    /// The statement does not match any recognized shape.
    #[error("statement shape not recognized")]
    ClassificationMiss,

    /// Placeholders, values or columns do not line up with what was supplied.
    #[error("expected {expected} value(s), got {actual}")]
    ExtractionMismatch { expected: usize, actual: usize },

    /// The WHERE clause holds more than one condition.
    #[error("WHERE clause has more than one condition")]
    AmbiguousPredicate,

    /// The WHERE clause compares against a literal and literal predicates are disabled.
    #[error("WHERE clause compares against a literal")]
    LiteralPredicate,
}

/// Error type for sqlshim operations
#[derive(Debug, Error)]
pub enum ShimError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Store request failed: {0}")]
    StoreFailed(String),

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("No row in {table} with id {id}")]
    NotFound { table: String, id: String },

    #[error("Unsupported statement: {0}")]
    Unsupported(UnsupportedReason),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for sqlshim operations
pub type Result<T> = std::result::Result<T, ShimError>;
