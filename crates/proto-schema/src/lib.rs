//! Runtime `.proto` schema loading for dynproto.
//!
//! Parses protobuf interface definitions at runtime (no code generation) and
//! resolves a named message type, possibly nested (`Outer.Inner`), into a
//! [`MessageSchema`] handle that the mapper and wire codec work from.
//!
//! ```ignore
//! use proto_schema::{load, SchemaSource};
//!
//! let schema = load(&SchemaSource::file("example/v1/example.proto"), "CountryList")?;
//! for field in schema.descriptor().fields() {
//!     println!("{} = {}", field.name, field.number);
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

pub mod cache;
pub mod parser;

pub use cache::{SchemaCache, SchemaKey};
pub use parser::{parse_file, parse_file_with_includes, parse_str, to_json_name};
pub use proto_types::{MessageSchema, SchemaError};

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Where schema text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// A `.proto` file on disk. Imports resolve against its directory, then
    /// `include_paths`, then the working directory.
    File {
        path: PathBuf,
        include_paths: Vec<PathBuf>,
    },
    /// In-memory schema text with a file name used in diagnostics.
    Text { name: String, content: String },
}

impl SchemaSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SchemaSource::File {
            path: path.into(),
            include_paths: Vec::new(),
        }
    }

    /// Add an import root. Text sources are unaffected.
    pub fn with_include_path(mut self, dir: impl Into<PathBuf>) -> Self {
        if let SchemaSource::File { include_paths, .. } = &mut self {
            include_paths.push(dir.into());
        }
        self
    }

    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        SchemaSource::Text {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Load a message type through the process-wide [`SchemaCache`].
pub fn load(source: &SchemaSource, message_name: &str) -> Result<Arc<MessageSchema>> {
    SchemaCache::global().load(source, message_name)
}
