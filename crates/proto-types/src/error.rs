//! Error types for the dynproto codec.
//!
//! Each stage has its own error enum; [`Error`] wraps all of them so callers
//! can use a single `Result` type across loading, mapping and wire coding.

use crate::wire::WireType;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a schema or resolving a message type.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Syntax errors and everything `protobuf-parse` rejects while
    /// type-checking, including duplicate field numbers and references to
    /// undefined types in `.proto` text.
    #[error("Protobuf parse error: {0}")]
    Parse(String),

    #[error("Failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised when a descriptor is assembled by hand through
    /// `MessageDescriptor::new`.
    #[error("Duplicate field number {number} in message {message}")]
    DuplicateFieldNumber { message: String, number: u32 },

    /// A type reference the parsed files do not define as the expected kind.
    #[error("Unresolved type '{type_name}' referenced by field {message}.{field}")]
    UnresolvedType {
        message: String,
        field: String,
        type_name: String,
    },

    #[error("Field {message}.{field} is a group, which is not supported")]
    UnsupportedGroup { message: String, field: String },

    #[error("Message type not found: {0}")]
    MessageNotFound(String),
}

/// Errors raised when an input value does not fit the message descriptor.
#[derive(Error, Debug)]
pub enum ValueError {
    #[error("Expected an object for message {message}, got {actual}")]
    NotAnObject {
        message: String,
        actual: &'static str,
    },

    #[error("Invalid value for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: &'static str,
    },

    #[error("Value {value} is out of range for field '{field}' of type {field_type}")]
    OutOfRange {
        field: String,
        field_type: String,
        value: String,
    },

    #[error("Unknown value '{value}' for enum {enum_name} in field '{field}'")]
    UnknownEnumValue {
        field: String,
        enum_name: String,
        value: String,
    },

    #[error("Invalid bytes for field '{field}': {reason}")]
    InvalidBytes { field: String, reason: String },

    #[error("Invalid map key '{key}' for field '{field}': {reason}")]
    InvalidMapKey {
        field: String,
        key: String,
        reason: String,
    },

    #[error("Unknown field '{field}' in message {message}")]
    UnknownField { message: String, field: String },

    #[error("Missing required field: {message}.{field}")]
    MissingRequired { message: String, field: String },

    #[error("Fields '{first}' and '{second}' of oneof {message}.{oneof} are both set")]
    OneofConflict {
        message: String,
        oneof: String,
        first: String,
        second: String,
    },
}

/// Structural violations detected while serializing.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Missing required field: {message}.{field}")]
    MissingRequired { message: String, field: String },

    #[error("Value for field '{field}' does not match its type: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: &'static str,
    },

    #[error("Message type not found while encoding: {0}")]
    UnknownMessage(String),

    #[error("Protobuf encoding error: {0}")]
    Io(String),
}

/// Errors raised for malformed or truncated wire bytes.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Truncated input while reading {0}")]
    Truncated(String),

    #[error("Field {field_number} declares {declared} bytes but only {remaining} remain")]
    LengthOverrun {
        field_number: u32,
        declared: u64,
        remaining: u64,
    },

    #[error("Field '{field}' expects wire type {expected}, got {actual}")]
    WireTypeMismatch {
        field: String,
        expected: WireType,
        actual: WireType,
    },

    #[error("Invalid tag: {0:#x}")]
    InvalidTag(u64),

    #[error("Invalid UTF-8 in string field '{field}'")]
    InvalidUtf8 { field: String },

    #[error("Groups are not supported (field number {field_number})")]
    UnsupportedGroup { field_number: u32 },

    #[error("Missing required field: {message}.{field}")]
    MissingRequired { message: String, field: String },

    #[error("Message type not found while decoding: {0}")]
    UnknownMessage(String),

    #[error("Message nesting exceeds the limit of {limit} levels")]
    RecursionLimit { limit: u32 },

    #[error("Protobuf decode error: {0}")]
    Malformed(String),
}

/// Any error produced by the codec.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;
