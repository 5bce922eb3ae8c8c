//! Protobuf descriptor definitions.
//!
//! Descriptors are structural metadata built once by the schema loader and
//! shared read-only by the mapper, encoder and decoder. Type references
//! (`ProtoType::Message`, `ProtoType::Enum`) hold fully qualified names
//! without a leading dot and are looked up through the [`DescriptorPool`].

use crate::error::SchemaError;
use crate::wire::{WireTag, WireType};
use std::collections::HashMap;
use std::sync::Arc;

/// Schema syntax of the file a descriptor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Proto2,
    Proto3,
}

/// Protobuf field types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtoType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Message(String), // Fully qualified message name
    Enum(String),    // Fully qualified enum name
}

impl std::fmt::Display for ProtoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

impl ProtoType {
    /// Get the human-readable type name.
    pub fn type_name(&self) -> String {
        match self {
            ProtoType::Double => "double".to_string(),
            ProtoType::Float => "float".to_string(),
            ProtoType::Int32 => "int32".to_string(),
            ProtoType::Int64 => "int64".to_string(),
            ProtoType::Uint32 => "uint32".to_string(),
            ProtoType::Uint64 => "uint64".to_string(),
            ProtoType::Sint32 => "sint32".to_string(),
            ProtoType::Sint64 => "sint64".to_string(),
            ProtoType::Fixed32 => "fixed32".to_string(),
            ProtoType::Fixed64 => "fixed64".to_string(),
            ProtoType::Sfixed32 => "sfixed32".to_string(),
            ProtoType::Sfixed64 => "sfixed64".to_string(),
            ProtoType::Bool => "bool".to_string(),
            ProtoType::String => "string".to_string(),
            ProtoType::Bytes => "bytes".to_string(),
            ProtoType::Message(name) => format!("message:{name}"),
            ProtoType::Enum(name) => format!("enum:{name}"),
        }
    }

    /// Wire type used for a single, unpacked value of this type.
    pub fn wire_type(&self) -> WireType {
        match self {
            ProtoType::Int32
            | ProtoType::Int64
            | ProtoType::Uint32
            | ProtoType::Uint64
            | ProtoType::Sint32
            | ProtoType::Sint64
            | ProtoType::Bool
            | ProtoType::Enum(_) => WireType::Varint,
            ProtoType::Fixed64 | ProtoType::Sfixed64 | ProtoType::Double => WireType::Fixed64,
            ProtoType::Fixed32 | ProtoType::Sfixed32 | ProtoType::Float => WireType::Fixed32,
            ProtoType::String | ProtoType::Bytes | ProtoType::Message(_) => {
                WireType::LengthDelimited
            }
        }
    }

    /// Whether repeated values of this type may use packed encoding.
    pub fn is_packable(&self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }
}

/// How many values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Optional,
    Required,
    Repeated,
    Map,
}

/// Whether "unset" is distinguishable from the zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Set fields are always encoded (proto2, proto3 `optional`, oneofs, messages).
    Explicit,
    /// Zero values are not encoded (proto3 singular scalars).
    Implicit,
}

/// Describes a single field in a message.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name as written in the schema
    pub name: String,
    /// lowerCamelCase name accepted as an alias on input
    pub json_name: String,
    /// Field number (tag)
    pub number: u32,
    /// Field type. For map fields this is the synthesized entry message.
    pub field_type: ProtoType,
    pub cardinality: Cardinality,
    /// Whether repeated values are written as one length-delimited run
    pub packed: bool,
    pub presence: Presence,
    /// Index into [`MessageDescriptor::oneofs`] for real (non-synthetic) oneof members
    pub oneof_index: Option<usize>,
}

impl FieldDescriptor {
    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    pub fn is_map(&self) -> bool {
        self.cardinality == Cardinality::Map
    }

    pub fn is_required(&self) -> bool {
        self.cardinality == Cardinality::Required
    }

    /// Wire type the encoder uses for this field.
    pub fn wire_type(&self) -> WireType {
        if self.packed && self.is_repeated() {
            WireType::LengthDelimited
        } else {
            self.field_type.wire_type()
        }
    }

    pub fn wire_tag(&self) -> WireTag {
        WireTag::new(self.number, self.wire_type())
    }
}

/// Describes a protobuf message type (schema).
#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    /// Fully qualified message name (e.g., "mypackage.Outer.Inner")
    pub name: String,
    /// Fully qualified names of messages declared inside this one
    pub nested_messages: Vec<String>,
    /// Fully qualified names of enums declared inside this one
    pub nested_enums: Vec<String>,
    /// Names of the real oneofs declared in this message
    pub oneofs: Vec<String>,
    /// Set for the synthesized `XxxEntry` record backing a map field
    pub map_entry: bool,
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
    by_json_name: HashMap<String, usize>,
    by_number: HashMap<u32, usize>,
}

impl MessageDescriptor {
    /// Build a descriptor, rejecting duplicate field numbers.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut by_name = HashMap::with_capacity(fields.len());
        let mut by_json_name = HashMap::with_capacity(fields.len());
        let mut by_number = HashMap::with_capacity(fields.len());

        for (index, field) in fields.iter().enumerate() {
            if by_number.insert(field.number, index).is_some() {
                return Err(SchemaError::DuplicateFieldNumber {
                    message: name,
                    number: field.number,
                });
            }
            by_name.insert(field.name.clone(), index);
            by_json_name.insert(field.json_name.clone(), index);
        }

        Ok(Self {
            name,
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            oneofs: Vec::new(),
            map_entry: false,
            fields,
            by_name,
            by_json_name,
            by_number,
        })
    }

    /// Unqualified message name (last path segment).
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Get a field descriptor by its schema name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Get a field descriptor by schema name, falling back to the JSON name.
    pub fn get_field_by_any_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.get_field(name)
            .or_else(|| self.by_json_name.get(name).map(|&i| &self.fields[i]))
    }

    pub fn get_field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.by_number.get(&number).map(|&i| &self.fields[i])
    }

    /// List all field names in declaration order.
    pub fn list_fields(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Fields belonging to the oneof at `index`.
    pub fn oneof_members(&self, index: usize) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(move |f| f.oneof_index == Some(index))
    }

    /// Key field of a map entry record.
    pub fn map_key(&self) -> Option<&FieldDescriptor> {
        self.get_field_by_number(1)
    }

    /// Value field of a map entry record.
    pub fn map_value(&self) -> Option<&FieldDescriptor> {
        self.get_field_by_number(2)
    }
}

/// One symbolic value of an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
}

/// Describes a protobuf enum type.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    /// Fully qualified enum name
    pub name: String,
    pub values: Vec<EnumValueDescriptor>,
    /// proto2 enums are closed: only declared numbers are valid
    pub closed: bool,
}

impl EnumDescriptor {
    pub fn value_by_name(&self, name: &str) -> Option<&EnumValueDescriptor> {
        self.values.iter().find(|v| v.name == name)
    }

    /// First declared value with this number (aliases share numbers).
    pub fn value_by_number(&self, number: i32) -> Option<&EnumValueDescriptor> {
        self.values.iter().find(|v| v.number == number)
    }
}

/// All message and enum descriptors of one parsed schema.
#[derive(Debug, Clone)]
pub struct DescriptorPool {
    pub package: Option<String>,
    pub syntax: Syntax,
    messages: HashMap<String, Arc<MessageDescriptor>>,
    enums: HashMap<String, EnumDescriptor>,
}

impl DescriptorPool {
    pub fn new(package: Option<String>, syntax: Syntax) -> Self {
        Self {
            package,
            syntax,
            messages: HashMap::new(),
            enums: HashMap::new(),
        }
    }

    pub fn add_message(&mut self, message: MessageDescriptor) {
        self.messages.insert(message.name.clone(), Arc::new(message));
    }

    pub fn add_enum(&mut self, descriptor: EnumDescriptor) {
        self.enums.insert(descriptor.name.clone(), descriptor);
    }

    /// Get a message descriptor by fully qualified name.
    pub fn get_message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(full_name).map(Arc::as_ref)
    }

    /// Get an enum descriptor by fully qualified name.
    pub fn get_enum(&self, full_name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(full_name)
    }

    /// List all message type names in the schema, sorted.
    pub fn list_messages(&self) -> Vec<String> {
        let mut names: Vec<String> = self.messages.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve a user supplied message name to its fully qualified form.
    ///
    /// Accepts fully qualified names (with or without a leading dot) and
    /// names relative to the file package, including dotted nested paths
    /// such as `Outer.Inner`.
    pub fn resolve_message_name(&self, name: &str) -> Option<&str> {
        let name = name.strip_prefix('.').unwrap_or(name);
        if let Some((full, _)) = self.messages.get_key_value(name) {
            return Some(full.as_str());
        }
        let package = self.package.as_deref().filter(|p| !p.is_empty())?;
        let qualified = format!("{package}.{name}");
        self.messages
            .get_key_value(&qualified)
            .map(|(full, _)| full.as_str())
    }
}

/// A resolved message type together with the pool its references point into.
///
/// This is the handle the schema loader caches and hands out; the mapper and
/// the wire codec walk nested types through [`MessageSchema::pool`].
#[derive(Debug, Clone)]
pub struct MessageSchema {
    pool: Arc<DescriptorPool>,
    descriptor: Arc<MessageDescriptor>,
}

impl MessageSchema {
    /// Resolve `message_name` in `pool`.
    pub fn new(pool: Arc<DescriptorPool>, message_name: &str) -> Result<Self, SchemaError> {
        let descriptor = pool
            .resolve_message_name(message_name)
            .and_then(|full| pool.messages.get(full))
            .cloned()
            .ok_or_else(|| SchemaError::MessageNotFound(message_name.to_string()))?;
        Ok(Self { pool, descriptor })
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    /// Fully qualified name of the resolved message.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}
