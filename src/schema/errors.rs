//! Schema error types
//!
//! Error codes:
//! - ROW_INVALID_MODEL
//! - ROW_COLUMN_KIND_CONFLICT
//! - ROW_READ_WRITE_CONFLICT
//! - ROW_UNKNOWN_COLUMN
//! - ROW_MISSING_PRIMARY
//! - ROW_MISSING_REQUIRED_FIELD
//! - ROW_READ_ONLY_VIOLATION
//! - ROW_UNSUPPORTED_SHAPE
//! - ROW_REGISTRY_SEALED
//! - ROW_INVALID_ANNOTATION
//! - ROW_VALIDATION_FAILED
//! - ROW_ENTITY_DECODE

use std::fmt;

use thiserror::Error;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Type has no storage record
    InvalidModel,
    /// Name declared real while virtual, or the reverse
    ColumnKindConflict,
    /// Read-only and write-only applied to the same column
    ReadWriteConflict,
    /// Column name absent from the target type
    UnknownColumn,
    /// Primary lookup on a type without a primary column
    MissingPrimary,
    /// Strict materialization omitted a required column
    MissingRequiredField,
    /// Input supplied a value for a read-only column
    ReadOnlyViolation,
    /// Input shape does not match the declared format
    UnsupportedShape,
    /// Declaration attempted after the registry was sealed
    RegistrySealed,
    /// Annotation applied to a target it cannot describe
    InvalidAnnotation,
    /// Value rejected by every validator of a column
    ValidationFailed,
    /// Materialized entity could not be decoded into a model
    EntityDecode,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::InvalidModel => "ROW_INVALID_MODEL",
            SchemaErrorCode::ColumnKindConflict => "ROW_COLUMN_KIND_CONFLICT",
            SchemaErrorCode::ReadWriteConflict => "ROW_READ_WRITE_CONFLICT",
            SchemaErrorCode::UnknownColumn => "ROW_UNKNOWN_COLUMN",
            SchemaErrorCode::MissingPrimary => "ROW_MISSING_PRIMARY",
            SchemaErrorCode::MissingRequiredField => "ROW_MISSING_REQUIRED_FIELD",
            SchemaErrorCode::ReadOnlyViolation => "ROW_READ_ONLY_VIOLATION",
            SchemaErrorCode::UnsupportedShape => "ROW_UNSUPPORTED_SHAPE",
            SchemaErrorCode::RegistrySealed => "ROW_REGISTRY_SEALED",
            SchemaErrorCode::InvalidAnnotation => "ROW_INVALID_ANNOTATION",
            SchemaErrorCode::ValidationFailed => "ROW_VALIDATION_FAILED",
            SchemaErrorCode::EntityDecode => "ROW_ENTITY_DECODE",
        }
    }

    /// Returns true for errors raised while declaring schemas, as opposed
    /// to errors raised while reading or materializing.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            SchemaErrorCode::ColumnKindConflict
                | SchemaErrorCode::ReadWriteConflict
                | SchemaErrorCode::RegistrySealed
                | SchemaErrorCode::InvalidAnnotation
        )
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Field path (e.g., "address.city")
    pub field: String,
    /// Expected formats or condition
    pub expected: String,
    /// Actual value kind found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}': expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Schema error type with full context
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct SchemaError {
    /// Error code
    code: SchemaErrorCode,
    /// Human-readable message
    message: String,
    /// Storage or type name if applicable
    storage: Option<String>,
    /// Column name if applicable
    column: Option<String>,
    /// Validation details if applicable
    details: Option<ValidationDetails>,
}

impl SchemaError {
    fn with_context(
        code: SchemaErrorCode,
        message: String,
        storage: Option<String>,
        column: Option<String>,
    ) -> Self {
        Self {
            code,
            message,
            storage,
            column,
            details: None,
        }
    }

    /// Create an invalid model error
    pub fn invalid_model(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::with_context(
            SchemaErrorCode::InvalidModel,
            format!("'{}' is not a registered entity", model),
            Some(model),
            None,
        )
    }

    /// Create a column kind conflict error.
    ///
    /// `existing` names the kind the column already has.
    pub fn column_kind_conflict(
        storage: impl Into<String>,
        column: impl Into<String>,
        existing: &str,
    ) -> Self {
        let storage = storage.into();
        let column = column.into();
        Self::with_context(
            SchemaErrorCode::ColumnKindConflict,
            format!(
                "Column '{}' of '{}' is already declared {}",
                column, storage, existing
            ),
            Some(storage),
            Some(column),
        )
    }

    /// Create a read-only / write-only conflict error
    pub fn read_write_conflict(storage: impl Into<String>, column: impl Into<String>) -> Self {
        let storage = storage.into();
        let column = column.into();
        Self::with_context(
            SchemaErrorCode::ReadWriteConflict,
            format!(
                "Column '{}' of '{}' cannot be both read-only and write-only",
                column, storage
            ),
            Some(storage),
            Some(column),
        )
    }

    /// Create an unknown column error
    pub fn unknown_column(storage: impl Into<String>, column: impl Into<String>) -> Self {
        let storage = storage.into();
        let column = column.into();
        Self::with_context(
            SchemaErrorCode::UnknownColumn,
            format!("Column '{}' not found in '{}'", column, storage),
            Some(storage),
            Some(column),
        )
    }

    /// Create a missing primary column error
    pub fn missing_primary(storage: impl Into<String>) -> Self {
        let storage = storage.into();
        Self::with_context(
            SchemaErrorCode::MissingPrimary,
            format!("'{}' declares no primary column", storage),
            Some(storage),
            None,
        )
    }

    /// Create a missing required field error
    pub fn missing_required_field(storage: impl Into<String>, column: impl Into<String>) -> Self {
        let storage = storage.into();
        let column = column.into();
        Self::with_context(
            SchemaErrorCode::MissingRequiredField,
            format!("Required field '{}' of '{}' is missing", column, storage),
            Some(storage),
            Some(column),
        )
    }

    /// Create a read-only violation error
    pub fn read_only_violation(storage: impl Into<String>, column: impl Into<String>) -> Self {
        let storage = storage.into();
        let column = column.into();
        Self::with_context(
            SchemaErrorCode::ReadOnlyViolation,
            format!("Field '{}' of '{}' is read-only", column, storage),
            Some(storage),
            Some(column),
        )
    }

    /// Create an unsupported shape error
    pub fn unsupported_shape(
        storage: impl Into<String>,
        column: impl Into<String>,
        expected: &str,
        actual: &str,
    ) -> Self {
        let storage = storage.into();
        let column = column.into();
        Self::with_context(
            SchemaErrorCode::UnsupportedShape,
            format!(
                "Field '{}' of '{}' expects {}, got {}",
                column, storage, expected, actual
            ),
            Some(storage),
            Some(column),
        )
    }

    /// Create a registry sealed error
    pub fn registry_sealed(storage: impl Into<String>) -> Self {
        let storage = storage.into();
        Self::with_context(
            SchemaErrorCode::RegistrySealed,
            format!("Registry is sealed, cannot declare on '{}'", storage),
            Some(storage),
            None,
        )
    }

    /// Create an invalid annotation error
    pub fn invalid_annotation(storage: impl Into<String>, reason: impl Into<String>) -> Self {
        let storage = storage.into();
        Self::with_context(
            SchemaErrorCode::InvalidAnnotation,
            format!("Invalid annotation on '{}': {}", storage, reason.into()),
            Some(storage),
            None,
        )
    }

    /// Create a validation failed error
    pub fn validation_failed(storage: impl Into<String>, details: ValidationDetails) -> Self {
        let storage = storage.into();
        Self {
            code: SchemaErrorCode::ValidationFailed,
            message: format!("Validation failed: {}", details),
            column: Some(details.field.clone()),
            storage: Some(storage),
            details: Some(details),
        }
    }

    /// Create an entity decode error
    pub fn entity_decode(storage: impl Into<String>, reason: impl fmt::Display) -> Self {
        let storage = storage.into();
        Self::with_context(
            SchemaErrorCode::EntityDecode,
            format!("Cannot decode '{}': {}", storage, reason),
            Some(storage),
            None,
        )
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the storage name if applicable
    pub fn storage(&self) -> Option<&str> {
        self.storage.as_deref()
    }

    /// Returns the column name if applicable
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// Returns validation details if applicable
    pub fn details(&self) -> Option<&ValidationDetails> {
        self.details.as_ref()
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::InvalidModel.code(), "ROW_INVALID_MODEL");
        assert_eq!(
            SchemaErrorCode::ColumnKindConflict.code(),
            "ROW_COLUMN_KIND_CONFLICT"
        );
        assert_eq!(
            SchemaErrorCode::MissingRequiredField.code(),
            "ROW_MISSING_REQUIRED_FIELD"
        );
        assert_eq!(SchemaErrorCode::UnsupportedShape.code(), "ROW_UNSUPPORTED_SHAPE");
    }

    #[test]
    fn test_declaration_codes() {
        assert!(SchemaErrorCode::ReadWriteConflict.is_declaration());
        assert!(SchemaErrorCode::RegistrySealed.is_declaration());
        assert!(!SchemaErrorCode::ReadOnlyViolation.is_declaration());
        assert!(!SchemaErrorCode::InvalidModel.is_declaration());
    }

    #[test]
    fn test_error_carries_context() {
        let err = SchemaError::missing_required_field("people", "name");
        assert_eq!(err.code(), SchemaErrorCode::MissingRequiredField);
        assert_eq!(err.storage(), Some("people"));
        assert_eq!(err.column(), Some("name"));

        let display = err.to_string();
        assert!(display.starts_with("ROW_MISSING_REQUIRED_FIELD"));
        assert!(display.contains("people"));
        assert!(display.contains("name"));
    }

    #[test]
    fn test_validation_details_display() {
        let details = ValidationDetails::new("age", "INTEGER", "string");
        let err = SchemaError::validation_failed("people", details);
        assert_eq!(err.column(), Some("age"));
        assert!(err.message().contains("INTEGER"));
        assert!(err.details().unwrap().actual.contains("string"));
    }
}
