//! dynproto library
//!
//! Encode and decode protobuf messages against `.proto` schemas that are
//! parsed at runtime, with no generated code.
//!
//! # Crates
//!
//! - `proto-types` - descriptors, typed values, wire tags and errors
//! - `proto-schema` - `.proto` parsing and the descriptor cache
//! - `proto-json` - JSON ↔ typed message mapping
//! - `proto-wire` - binary encoding, decoding and length-delimited framing
//!
//! # Example
//!
//! ```ignore
//! use dynproto::ProtoFile;
//! use serde_json::json;
//!
//! let countries = ProtoFile::load("example/v1/example.proto", "CountryList")?;
//! let bytes = countries.encode(&json!({"countries": [{"name": "A", "code": 1}]}))?;
//! assert_eq!(bytes, [0x0a, 0x05, 0x0a, 0x01, 0x41, 0x10, 0x01]);
//!
//! let value = countries.decode(&bytes)?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! echo '{"countries": [{"name": "A", "code": 1}]}' \
//!   | dynproto encode --proto example.proto --message CountryList > out.bin
//! dynproto decode --proto example.proto --message CountryList --input out.bin
//! ```

use clap::Parser;
use serde_json::Value;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use proto_json::MapperOptions;
pub use proto_schema::SchemaSource;
pub use proto_types::{
    DecodeError, EncodeError, Error, MessageSchema, ProtoFieldValue, ProtoMessage, Result,
    SchemaError, ValueError,
};

/// Schema selection shared by every CLI command.
#[derive(Parser, Clone, Debug)]
pub struct CodecOpts {
    /// Path to the .proto schema file
    #[arg(long = "proto", value_name = "FILE", env = "DYNPROTO_PROTO")]
    pub proto: PathBuf,

    /// Message type, package-relative or fully qualified (e.g. Outer.Inner)
    #[arg(long, value_name = "NAME", env = "DYNPROTO_MESSAGE")]
    pub message: String,

    /// Extra import root, searched after the schema's own directory (repeatable)
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    pub include_paths: Vec<PathBuf>,
}

impl CodecOpts {
    pub fn open(&self) -> Result<ProtoFile> {
        let source = self
            .include_paths
            .iter()
            .fold(SchemaSource::file(&self.proto), |source, dir| {
                source.with_include_path(dir)
            });
        ProtoFile::from_source(&source, &self.message)
    }
}

/// A message type bound to its schema, with JSON-in/JSON-out codec methods.
///
/// Cloning is cheap: the resolved schema is shared.
#[derive(Debug, Clone)]
pub struct ProtoFile {
    schema: Arc<MessageSchema>,
    options: MapperOptions,
}

impl ProtoFile {
    /// Load `message` from a `.proto` file. Parsed schemas are cached per
    /// canonical path for the life of the process.
    ///
    /// Imports resolve against the file's directory, then the working
    /// directory. Use [`SchemaSource::with_include_path`] with
    /// [`ProtoFile::from_source`] for other roots.
    pub fn load(path: impl AsRef<Path>, message: &str) -> Result<Self> {
        Self::from_source(&SchemaSource::file(path.as_ref()), message)
    }

    pub fn from_source(source: &SchemaSource, message: &str) -> Result<Self> {
        let schema = proto_schema::load(source, message)?;
        Ok(Self {
            schema,
            options: MapperOptions::default(),
        })
    }

    /// Replace the JSON mapping options.
    pub fn with_options(mut self, options: MapperOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &MessageSchema {
        &self.schema
    }

    /// Fully qualified name of the bound message type.
    pub fn message_name(&self) -> &str {
        self.schema.name()
    }

    pub fn to_typed(&self, value: &Value) -> Result<ProtoMessage> {
        proto_json::to_typed(&self.schema, value, &self.options)
    }

    pub fn from_typed(&self, message: &ProtoMessage) -> Result<Value> {
        proto_json::from_typed(&self.schema, message)
    }

    pub fn encode_message(&self, message: &ProtoMessage) -> Result<Vec<u8>> {
        proto_wire::encode(&self.schema, message)
    }

    pub fn decode_message(&self, data: &[u8]) -> Result<ProtoMessage> {
        proto_wire::decode(&self.schema, data)
    }

    /// JSON value → protobuf bytes.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        self.encode_message(&self.to_typed(value)?)
    }

    /// Protobuf bytes → JSON value keyed by proto field names.
    pub fn decode(&self, data: &[u8]) -> Result<Value> {
        self.from_typed(&self.decode_message(data)?)
    }

    pub fn encode_delimited(&self, value: &Value) -> Result<Vec<u8>> {
        proto_wire::encode_delimited(&self.schema, &self.to_typed(value)?)
    }

    /// Decode the first length-prefixed frame; trailing bytes are ignored.
    pub fn decode_delimited(&self, data: &[u8]) -> Result<Value> {
        self.from_typed(&proto_wire::decode_delimited(&self.schema, data)?)
    }

    /// Decode the first frame and report how many bytes it used.
    pub fn decode_delimited_prefix(&self, data: &[u8]) -> Result<(Value, usize)> {
        let (message, consumed) = proto_wire::decode_delimited_prefix(&self.schema, data)?;
        Ok((self.from_typed(&message)?, consumed))
    }

    /// Human-readable outline of the bound message type.
    pub fn describe(&self) -> String {
        let descriptor = self.schema.descriptor();
        let mut out = String::new();
        let _ = writeln!(out, "message {}", descriptor.name);
        for field in descriptor.fields() {
            let label = match field.cardinality {
                proto_types::Cardinality::Optional => "optional",
                proto_types::Cardinality::Required => "required",
                proto_types::Cardinality::Repeated if field.packed => "repeated packed",
                proto_types::Cardinality::Repeated => "repeated",
                proto_types::Cardinality::Map => "map",
            };
            let _ = write!(
                out,
                "  {} {} = {} [{}] ({})",
                label, field.field_type, field.number, field.name, field.json_name
            );
            if let Some(index) = field.oneof_index {
                let oneof = descriptor.oneofs.get(index).map(String::as_str).unwrap_or("?");
                let _ = write!(out, " oneof {oneof}");
            }
            out.push('\n');
        }
        for nested in &descriptor.nested_messages {
            let _ = writeln!(out, "  nested message {nested}");
        }
        for nested in &descriptor.nested_enums {
            let _ = writeln!(out, "  nested enum {nested}");
        }
        out
    }
}
