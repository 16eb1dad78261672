use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// A single field-level validation failure, suitable for display next to
/// the offending input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validation failures for one submitted reading form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message for a specific field, if that field failed.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for e in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// meterlog error types
#[derive(Error, Debug)]
pub enum MeterlogError {
    /// Reading form rejected before reaching the calculator
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A reading already exists for this date
    #[error("a reading for {0} already exists")]
    DuplicateDate(NaiveDate),

    /// No reading with the given id
    #[error("no reading with id {0}")]
    UnknownReading(Uuid),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Store file could not be read or written
    #[error("store error: {0}")]
    Store(String),

    /// Export document malformed or missing required sections
    #[error("import error: {0}")]
    Import(String),
}

/// Result type alias for meterlog
pub type Result<T> = std::result::Result<T, MeterlogError>;
