//! Protobuf binary → typed message decoding.
//!
//! Decoding merges repeated occurrences the way protobuf parsers do: singular
//! scalars keep the last value, singular messages are merged, repeated fields
//! and maps accumulate. Unknown field numbers are skipped and dropped.

use crate::reader::WireReader;
use proto_types::{
    Cardinality, DecodeError, DescriptorPool, FieldDescriptor, MapKey, MessageDescriptor,
    MessageSchema, ProtoFieldValue, ProtoMessage, ProtoType, Result, WireType,
};
use std::collections::BTreeMap;
use tracing::trace;

/// Deepest message nesting accepted, the same default the `protobuf` crate
/// applies to generated messages. Map entries count as a level.
pub const RECURSION_LIMIT: u32 = 100;

/// Decode a protobuf message from bytes.
///
/// Proto2 `required` fields are checked once the whole buffer has been read,
/// so a required field supplied by a later merged occurrence is accepted.
pub fn decode(schema: &MessageSchema, data: &[u8]) -> Result<ProtoMessage> {
    let message = decode_message(schema.pool(), schema.descriptor(), data, 0)?;
    check_required(schema.pool(), schema.descriptor(), &message)?;
    Ok(message)
}

fn decode_message(
    pool: &DescriptorPool,
    descriptor: &MessageDescriptor,
    data: &[u8],
    depth: u32,
) -> Result<ProtoMessage> {
    let mut reader = WireReader::new(data);
    let mut message = ProtoMessage::new(descriptor.name.clone());

    while !reader.at_end()? {
        let tag = reader.read_tag()?;

        let Some(field) = descriptor.get_field_by_number(tag.field_number) else {
            trace!(
                "Skipping unknown field {} ({}) in {}",
                tag.field_number,
                tag.wire_type,
                descriptor.name
            );
            reader.skip(tag)?;
            continue;
        };

        let value = decode_field(pool, &mut reader, field, tag.wire_type, depth)?;
        merge_field(pool, descriptor, &mut message, field, value);
    }

    Ok(message)
}

/// Read one occurrence of `field`, shaped as the value it contributes.
///
/// Repeated occurrences come back as a `Repeated` (or `Map`) holding only
/// the elements read here; [`merge_field`] appends them.
fn decode_field(
    pool: &DescriptorPool,
    reader: &mut WireReader,
    field: &FieldDescriptor,
    wire_type: WireType,
    depth: u32,
) -> Result<ProtoFieldValue> {
    let element_wire_type = field.field_type.wire_type();

    match field.cardinality {
        Cardinality::Map => {
            expect_wire_type(field, WireType::LengthDelimited, wire_type)?;
            let body = reader.read_length_delimited(field.number)?;
            let (key, value) = decode_map_entry(pool, field, body, depth)?;
            Ok(ProtoFieldValue::Map(BTreeMap::from([(key, value)])))
        }
        Cardinality::Repeated => {
            if wire_type == WireType::LengthDelimited && field.field_type.is_packable() {
                let run = reader.read_length_delimited(field.number)?;
                let mut packed = WireReader::new(run);
                let mut items = Vec::new();
                while !packed.at_end()? {
                    items.push(read_value(pool, &mut packed, field, &field.field_type, depth)?);
                }
                Ok(ProtoFieldValue::Repeated(items))
            } else {
                expect_wire_type(field, element_wire_type, wire_type)?;
                let item = read_value(pool, reader, field, &field.field_type, depth)?;
                Ok(ProtoFieldValue::Repeated(vec![item]))
            }
        }
        Cardinality::Optional | Cardinality::Required => {
            expect_wire_type(field, element_wire_type, wire_type)?;
            read_value(pool, reader, field, &field.field_type, depth)
        }
    }
}

fn expect_wire_type(
    field: &FieldDescriptor,
    expected: WireType,
    actual: WireType,
) -> std::result::Result<(), DecodeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DecodeError::WireTypeMismatch {
            field: field.name.clone(),
            expected,
            actual,
        })
    }
}

/// Read a single value payload (the tag has already been consumed).
fn read_value(
    pool: &DescriptorPool,
    reader: &mut WireReader,
    field: &FieldDescriptor,
    field_type: &ProtoType,
    depth: u32,
) -> Result<ProtoFieldValue> {
    let value = match field_type {
        ProtoType::Double => {
            ProtoFieldValue::Double(reader.read_fixed(8, "double", |s| s.read_double())?)
        }
        ProtoType::Float => {
            ProtoFieldValue::Float(reader.read_fixed(4, "float", |s| s.read_float())?)
        }
        ProtoType::Int32 => {
            ProtoFieldValue::Int32(reader.read_varint("int32", |s| s.read_int32())?)
        }
        ProtoType::Sint32 => {
            ProtoFieldValue::Int32(reader.read_varint("sint32", |s| s.read_sint32())?)
        }
        ProtoType::Sfixed32 => {
            ProtoFieldValue::Int32(reader.read_fixed(4, "sfixed32", |s| s.read_sfixed32())?)
        }
        ProtoType::Int64 => {
            ProtoFieldValue::Int64(reader.read_varint("int64", |s| s.read_int64())?)
        }
        ProtoType::Sint64 => {
            ProtoFieldValue::Int64(reader.read_varint("sint64", |s| s.read_sint64())?)
        }
        ProtoType::Sfixed64 => {
            ProtoFieldValue::Int64(reader.read_fixed(8, "sfixed64", |s| s.read_sfixed64())?)
        }
        ProtoType::Uint32 => {
            ProtoFieldValue::Uint32(reader.read_varint("uint32", |s| s.read_uint32())?)
        }
        ProtoType::Fixed32 => {
            ProtoFieldValue::Uint32(reader.read_fixed(4, "fixed32", |s| s.read_fixed32())?)
        }
        ProtoType::Uint64 => {
            ProtoFieldValue::Uint64(reader.read_varint("uint64", |s| s.read_uint64())?)
        }
        ProtoType::Fixed64 => {
            ProtoFieldValue::Uint64(reader.read_fixed(8, "fixed64", |s| s.read_fixed64())?)
        }
        ProtoType::Bool => ProtoFieldValue::Bool(reader.read_varint("bool", |s| s.read_bool())?),
        // Enum numbers are kept even when the enum does not define them.
        ProtoType::Enum(_) => {
            ProtoFieldValue::Enum(reader.read_varint("enum", |s| s.read_int32())?)
        }
        ProtoType::String => {
            let bytes = reader.read_length_delimited(field.number)?;
            let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 {
                field: field.name.clone(),
            })?;
            ProtoFieldValue::String(text.to_string())
        }
        ProtoType::Bytes => {
            ProtoFieldValue::Bytes(reader.read_length_delimited(field.number)?.to_vec())
        }
        ProtoType::Message(name) => {
            let descriptor = pool
                .get_message(name)
                .ok_or_else(|| DecodeError::UnknownMessage(name.clone()))?;
            let body = reader.read_length_delimited(field.number)?;
            let nested = decode_message(pool, descriptor, body, nested_depth(depth)?)?;
            ProtoFieldValue::Message(Box::new(nested))
        }
    };
    Ok(value)
}

/// Decode one `{key = 1, value = 2}` entry record. Absent halves take the
/// zero value of their type.
fn decode_map_entry(
    pool: &DescriptorPool,
    field: &FieldDescriptor,
    body: &[u8],
    depth: u32,
) -> Result<(MapKey, ProtoFieldValue)> {
    let ProtoType::Message(entry_name) = &field.field_type else {
        return Err(DecodeError::UnknownMessage(field.field_type.to_string()).into());
    };
    let entry = pool
        .get_message(entry_name)
        .ok_or_else(|| DecodeError::UnknownMessage(entry_name.clone()))?;
    let (Some(key_field), Some(value_field)) = (entry.map_key(), entry.map_value()) else {
        return Err(DecodeError::UnknownMessage(entry_name.clone()).into());
    };

    let mut decoded = decode_message(pool, entry, body, nested_depth(depth)?)?;
    let key = decoded
        .remove(&key_field.name)
        .or_else(|| ProtoFieldValue::default_for(&key_field.field_type))
        .and_then(MapKey::from_value)
        .ok_or_else(|| {
            DecodeError::Malformed(format!("map field '{}' has an invalid key", field.name))
        })?;

    let value = match decoded.remove(&value_field.name) {
        Some(value) => value,
        None => match &value_field.field_type {
            ProtoType::Message(name) => ProtoFieldValue::Message(Box::new(ProtoMessage::new(
                name.clone(),
            ))),
            other => ProtoFieldValue::default_for(other).ok_or_else(|| {
                DecodeError::Malformed(format!("map field '{}' has no value", field.name))
            })?,
        },
    };

    Ok((key, value))
}

fn nested_depth(depth: u32) -> std::result::Result<u32, DecodeError> {
    if depth >= RECURSION_LIMIT {
        return Err(DecodeError::RecursionLimit {
            limit: RECURSION_LIMIT,
        });
    }
    Ok(depth + 1)
}

/// Fold one decoded occurrence into `target`.
///
/// Setting a oneof member clears its siblings.
fn merge_field(
    pool: &DescriptorPool,
    descriptor: &MessageDescriptor,
    target: &mut ProtoMessage,
    field: &FieldDescriptor,
    value: ProtoFieldValue,
) {
    if let Some(index) = field.oneof_index {
        for sibling in descriptor.oneof_members(index) {
            if sibling.number != field.number {
                target.remove(&sibling.name);
            }
        }
    }

    let replacement = match (target.fields.get_mut(&field.name), value) {
        (Some(ProtoFieldValue::Repeated(items)), ProtoFieldValue::Repeated(more)) => {
            items.extend(more);
            None
        }
        (Some(ProtoFieldValue::Map(entries)), ProtoFieldValue::Map(more)) => {
            entries.extend(more);
            None
        }
        (Some(ProtoFieldValue::Message(existing)), ProtoFieldValue::Message(incoming)) => {
            match nested_descriptor(pool, field) {
                Some(nested) => {
                    merge_message(pool, nested, existing, *incoming);
                    None
                }
                None => Some(ProtoFieldValue::Message(incoming)),
            }
        }
        (_, value) => Some(value),
    };

    if let Some(value) = replacement {
        target.set(field.name.clone(), value);
    }
}

fn merge_message(
    pool: &DescriptorPool,
    descriptor: &MessageDescriptor,
    target: &mut ProtoMessage,
    incoming: ProtoMessage,
) {
    for (name, value) in incoming.fields {
        match descriptor.get_field(&name) {
            Some(field) => merge_field(pool, descriptor, target, field, value),
            None => target.set(name, value),
        }
    }
}

fn nested_descriptor<'a>(
    pool: &'a DescriptorPool,
    field: &FieldDescriptor,
) -> Option<&'a MessageDescriptor> {
    match &field.field_type {
        ProtoType::Message(name) => pool.get_message(name),
        _ => None,
    }
}

/// Walk the decoded tree and report the first absent proto2 required field.
fn check_required(
    pool: &DescriptorPool,
    descriptor: &MessageDescriptor,
    message: &ProtoMessage,
) -> std::result::Result<(), DecodeError> {
    for field in descriptor.fields() {
        let Some(value) = message.get(&field.name) else {
            if field.is_required() {
                return Err(DecodeError::MissingRequired {
                    message: descriptor.name.clone(),
                    field: field.name.clone(),
                });
            }
            continue;
        };

        let nested = match (field.cardinality, nested_descriptor(pool, field)) {
            (Cardinality::Map, Some(entry)) => entry
                .map_value()
                .and_then(|value_field| nested_descriptor(pool, value_field)),
            (_, nested) => nested,
        };
        let Some(nested) = nested else {
            continue;
        };

        match value {
            ProtoFieldValue::Message(inner) => check_required(pool, nested, inner)?,
            ProtoFieldValue::Repeated(items) => {
                for item in items {
                    if let ProtoFieldValue::Message(inner) = item {
                        check_required(pool, nested, inner)?;
                    }
                }
            }
            ProtoFieldValue::Map(entries) => {
                for item in entries.values() {
                    if let ProtoFieldValue::Message(inner) = item {
                        check_required(pool, nested, inner)?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}
