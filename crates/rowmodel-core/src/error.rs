//! Error types for Rowmodel operations.

use std::fmt;

/// The primary error type for all Rowmodel operations.
#[derive(Debug)]
pub enum Error {
    /// Configuration errors (malformed descriptors, unknown models/relations)
    Config(ConfigError),
    /// Query execution errors reported by the execution collaborator
    Query(QueryError),
    /// Type conversion errors (filter coercion, row access)
    Type(TypeError),
    /// Validation errors
    Validation(ValidationError),
    /// Deleting a record that has no primary-key value yet
    EmptyDelete {
        /// Model the record belongs to
        model: String,
    },
    /// I/O errors
    Io(std::io::Error),
    /// Custom error with message
    Custom(String),
}

/// A configuration problem: bad descriptor shape, unknown key, unresolvable
/// model or relation name. Never retried; fatal to the current operation.
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A failure reported while executing a query.
#[derive(Debug)]
pub struct QueryError {
    pub message: String,
    /// Preview of the fragment sequence that failed, if available
    pub sql: Option<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

/// A value could not be coerced to the expected type.
#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    /// Attribute or column the coercion was applied to, if known
    pub attribute: Option<String>,
}

impl TypeError {
    pub fn new(expected: &'static str, actual: impl Into<String>) -> Self {
        Self {
            expected,
            actual: actual.into(),
            attribute: None,
        }
    }

    #[must_use]
    pub fn on_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

/// Validation error container for attribute-level checks.
#[derive(Debug, Clone, Default)]
pub struct ValidationError {
    /// The individual failures, in the order they were produced
    pub errors: Vec<FieldValidationError>,
}

/// A single validation failure for one attribute.
#[derive(Debug, Clone)]
pub struct FieldValidationError {
    /// The attribute that failed validation
    pub field: String,
    /// The kind of validation that failed
    pub kind: ValidationErrorKind,
    /// Human-readable error message
    pub message: String,
}

/// The type of validation constraint that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Required attribute is missing or null
    Required,
    /// Value is not numeric
    Numeric,
    /// String is shorter than minimum length
    MinLength,
    /// String is longer than maximum length
    MaxLength,
    /// Value is not text
    NotText,
    /// Value is not in the allowed set
    NotIn,
    /// Value does not match the pattern
    Pattern,
    /// Custom callback check failed
    Custom,
}

impl ValidationError {
    /// Create a new empty validation error container.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Check if there are any validation errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Add a validation error.
    pub fn add(
        &mut self,
        field: impl Into<String>,
        kind: ValidationErrorKind,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldValidationError {
            field: field.into(),
            kind,
            message: message.into(),
        });
    }

    /// Add a required-attribute error.
    pub fn add_required(&mut self, field: impl Into<String>) {
        self.add(field, ValidationErrorKind::Required, "can not be empty");
    }

    /// Add a min length error.
    pub fn add_min_length(&mut self, field: impl Into<String>, min: usize, actual: usize) {
        self.add(
            field,
            ValidationErrorKind::MinLength,
            format!("can not be shorter than {min} characters, got {actual}"),
        );
    }

    /// Add a max length error.
    pub fn add_max_length(&mut self, field: impl Into<String>, max: usize, actual: usize) {
        self.add(
            field,
            ValidationErrorKind::MaxLength,
            format!("can not be longer than {max} characters, got {actual}"),
        );
    }

    /// Add a custom validation error.
    pub fn add_custom(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.add(field, ValidationErrorKind::Custom, message);
    }

    /// All failures recorded for one attribute.
    pub fn for_field(&self, field: &str) -> Vec<&FieldValidationError> {
        self.errors.iter().filter(|e| e.field == field).collect()
    }

    /// Convert to Result, returning Ok(()) if no errors, Err(self) otherwise.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Query(e) => write!(f, "Query error: {}", e.message),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::EmptyDelete { model } => {
                write!(f, "Unable to delete new '{}' record", model)
            }
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sql) = &self.sql {
            write!(f, "{} (query: {})", self.message, sql)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(attr) = &self.attribute {
            write!(
                f,
                "expected {} for attribute '{}', found {}",
                self.expected, attr, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "validation passed")
        } else if self.errors.len() == 1 {
            let err = &self.errors[0];
            write!(f, "attribute '{}' {}", err.field, err.message)
        } else {
            writeln!(f, "validation errors:")?;
            for err in &self.errors {
                writeln!(f, "  - {}: {}", err.field, err.message)?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

/// Result type alias for Rowmodel operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_container_aggregates() {
        let mut errors = ValidationError::new();
        assert!(errors.is_empty());

        errors.add_required("name");
        errors.add_min_length("name", 3, 1);
        errors.add_custom("age", "must be positive");

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.for_field("name").len(), 2);
        assert_eq!(errors.for_field("age").len(), 1);
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn display_formats() {
        let err = Error::EmptyDelete {
            model: "User".to_string(),
        };
        assert_eq!(err.to_string(), "Unable to delete new 'User' record");

        let err = Error::Config(ConfigError::new("unknown criteria key 'foo'"));
        assert_eq!(
            err.to_string(),
            "Configuration error: unknown criteria key 'foo'"
        );

        let type_err = TypeError::new("TEXT", "BIGINT").on_attribute("meta");
        assert_eq!(
            type_err.to_string(),
            "expected TEXT for attribute 'meta', found BIGINT"
        );
    }
}
