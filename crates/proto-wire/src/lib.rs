//! Protobuf binary wire format for dynamically typed messages.
//!
//! - [`encoder`] - ProtoMessage → bytes
//! - [`decoder`] - bytes → ProtoMessage
//! - [`delimited`] - varint length-prefixed framing
//!
//! All entry points take a [`MessageSchema`](proto_types::MessageSchema)
//! resolved by `proto-schema`; nothing here parses `.proto` text.

pub mod decoder;
pub mod delimited;
pub mod encoder;
mod reader;

pub use decoder::{decode, RECURSION_LIMIT};
pub use delimited::{decode_delimited, decode_delimited_prefix, encode_delimited};
pub use encoder::encode;
