//! Shared types for the dynproto codec.
//!
//! This crate provides the data model used by every stage of the codec:
//!
//! ```text
//! proto-schema:  .proto text  → DescriptorPool / MessageDescriptor
//! proto-json:    JSON value   ⇄ ProtoMessage (ProtoFieldValue per field)
//! proto-wire:    ProtoMessage ⇄ protobuf binary (optionally length-delimited)
//! ```
//!
//! # Modules
//!
//! - [`descriptor`] - Schema metadata built once at load time
//! - [`value`] - Typed runtime representation of one message instance
//! - [`wire`] - Wire types and tags
//! - [`error`] - Error taxonomy shared by all stages

pub mod descriptor;
pub mod error;
pub mod value;
pub mod wire;

// Re-export main types for convenient access
pub use descriptor::{
    Cardinality, DescriptorPool, EnumDescriptor, EnumValueDescriptor, FieldDescriptor,
    MessageDescriptor, MessageSchema, Presence, ProtoType, Syntax,
};
pub use error::{DecodeError, EncodeError, Error, Result, SchemaError, ValueError};
pub use value::{MapKey, ProtoFieldValue, ProtoMessage};
pub use wire::{WireTag, WireType, MAX_FIELD_NUMBER};
