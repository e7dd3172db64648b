//! Error taxonomy for schema normalization.

use thiserror::Error;

use crate::document::MessageKind;

/// A malformed or incomplete message or field definition.
///
/// Raised while normalizing the offending message; no record is produced for it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unsupported type '{tag}' for field '{field}' in message '{message}'")]
    UnsupportedType {
        message: String,
        field: String,
        tag: String,
    },

    #[error("enum field '{field}' in message '{message}' is missing 'enumName'")]
    MissingEnumName { message: String, field: String },

    #[error("enum field '{field}' in message '{message}' is missing 'values'")]
    MissingEnumValues { message: String, field: String },

    #[error("enum field '{field}' in message '{message}' must list at least one value")]
    EmptyEnumValues { message: String, field: String },

    #[error(
        "enum field '{field}' in message '{message}' lists {count} values, at most 256 fit in one byte"
    )]
    TooManyEnumValues {
        message: String,
        field: String,
        count: usize,
    },

    #[error("enum field '{field}' in message '{message}' repeats value '{value}'")]
    DuplicateEnumValue {
        message: String,
        field: String,
        value: String,
    },

    #[error(
        "enum field '{field}' in message '{message}' reuses enumName '{enum_name}' of another field"
    )]
    DuplicateEnumName {
        message: String,
        field: String,
        enum_name: String,
    },

    #[error("{tag} field '{field}' in message '{message}' is missing '{key}'")]
    MissingLength {
        message: String,
        field: String,
        tag: &'static str,
        key: &'static str,
    },

    #[error(
        "{tag} field '{field}' in message '{message}' has length {length}, expected {min}..={max}"
    )]
    LengthOutOfRange {
        message: String,
        field: String,
        tag: &'static str,
        length: u64,
        min: u64,
        max: u64,
    },

    #[error("field '{field}' appears more than once in message '{message}'")]
    DuplicateField { message: String, field: String },

    #[error("empty identifier in {location} of message '{message}'")]
    EmptyIdentifier { message: String, location: String },

    #[error("invalid identifier '{identifier}' in {location} of message '{message}': {reason}")]
    InvalidIdentifier {
        message: String,
        location: String,
        identifier: String,
        reason: &'static str,
    },

    #[error("{kind} '{message}' cannot declare '{key}'")]
    MisplacedFields {
        message: String,
        kind: MessageKind,
        key: &'static str,
    },

    #[error("telemetry '{message}' cannot declare return fields")]
    UnexpectedReturns { message: String },

    #[error("telecommand '{message}' declares both 'return' and 'returns'")]
    ConflictingReturns { message: String },

    #[error("invalid default for field '{field}' in message '{message}': {reason}")]
    InvalidDefault {
        message: String,
        field: String,
        reason: String,
    },
}

/// Caller-level problems spanning several messages.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{kind} id {id} is used by both '{first}' and '{second}'")]
    DuplicateId {
        kind: MessageKind,
        id: u32,
        first: String,
        second: String,
    },
}
