//! JSON mapping for dynamically typed protobuf messages.
//!
//! Converts loosely typed JSON input into a strictly typed [`ProtoMessage`]
//! validated against a runtime message descriptor, and back.
//!
//! # Modules
//!
//! - [`forward`] - JSON value → ProtoMessage (validation and coercion)
//! - [`reverse`] - ProtoMessage → JSON value
//!
//! # Example
//!
//! ```ignore
//! use proto_json::{from_typed, to_typed, MapperOptions};
//!
//! let message = to_typed(&schema, &serde_json::json!({"name": "A"}), &MapperOptions::default())?;
//! let json = from_typed(&schema, &message)?;
//! ```

pub mod forward;
pub mod reverse;

pub use forward::to_typed;
pub use reverse::from_typed;

/// Options controlling JSON → message mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapperOptions {
    /// Fail on object keys that match no field instead of ignoring them.
    pub reject_unknown_fields: bool,
}

impl MapperOptions {
    /// Options that reject unknown fields.
    pub fn strict() -> Self {
        Self {
            reject_unknown_fields: true,
        }
    }
}

/// Name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
