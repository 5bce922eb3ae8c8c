//! Typed message → protobuf binary encoding.
//!
//! The encoding follows the protobuf wire format:
//! - Each field is encoded as (tag, value) pairs
//! - Tag = (field_number << 3) | wire_type
//! - Wire types: 0=varint, 1=64-bit, 2=length-delimited, 5=32-bit
//!
//! Fields are written in declaration order and map entries in key order, so
//! the same message always produces the same bytes.

use proto_types::{
    Cardinality, DescriptorPool, EncodeError, FieldDescriptor, MessageDescriptor, MessageSchema,
    Presence, ProtoFieldValue, ProtoMessage, ProtoType, Result, WireTag, WireType,
};
use protobuf::CodedOutputStream;
use tracing::trace;

/// Encode a message to protobuf binary format.
pub fn encode(schema: &MessageSchema, message: &ProtoMessage) -> Result<Vec<u8>> {
    let bytes = encode_message(schema.pool(), schema.descriptor(), message)?;
    trace!("Encoded {} as {} bytes", schema.name(), bytes.len());
    Ok(bytes)
}

fn encode_message(
    pool: &DescriptorPool,
    descriptor: &MessageDescriptor,
    message: &ProtoMessage,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut stream = CodedOutputStream::vec(&mut buffer);

        for field in descriptor.fields() {
            match message.get(&field.name) {
                Some(value) => encode_field(pool, &mut stream, field, value)?,
                None if field.is_required() => {
                    return Err(EncodeError::MissingRequired {
                        message: descriptor.name.clone(),
                        field: field.name.clone(),
                    }
                    .into());
                }
                None => {}
            }
        }

        stream.flush().map_err(io_error)?;
    }
    Ok(buffer)
}

fn encode_field(
    pool: &DescriptorPool,
    stream: &mut CodedOutputStream,
    field: &FieldDescriptor,
    value: &ProtoFieldValue,
) -> Result<()> {
    match field.cardinality {
        Cardinality::Repeated => {
            let ProtoFieldValue::Repeated(items) = value else {
                return Err(mismatch(&field.name, "repeated", value).into());
            };
            if items.is_empty() {
                return Ok(());
            }

            if field.packed && field.field_type.is_packable() {
                let mut run = Vec::new();
                {
                    let mut packed = CodedOutputStream::vec(&mut run);
                    for item in items {
                        write_value(pool, &mut packed, field, &field.field_type, item)?;
                    }
                    packed.flush().map_err(io_error)?;
                }
                write_tag(stream, field.number, WireType::LengthDelimited)?;
                stream.write_bytes_no_tag(&run).map_err(io_error)?;
            } else {
                for item in items {
                    write_tag(stream, field.number, field.field_type.wire_type())?;
                    write_value(pool, stream, field, &field.field_type, item)?;
                }
            }
        }
        Cardinality::Map => {
            let ProtoFieldValue::Map(entries) = value else {
                return Err(mismatch(&field.name, "map", value).into());
            };
            let entry = message_descriptor(pool, &field.field_type)?;
            let (Some(key_field), Some(value_field)) = (entry.map_key(), entry.map_value()) else {
                return Err(EncodeError::UnknownMessage(entry.name.clone()).into());
            };

            for (key, item) in entries {
                let key_value = key.to_value(&key_field.field_type).ok_or_else(|| {
                    EncodeError::TypeMismatch {
                        field: field.name.clone(),
                        expected: key_field.field_type.to_string(),
                        actual: "map key",
                    }
                })?;

                // Both halves of an entry are always written, zero or not.
                let mut body = Vec::new();
                {
                    let mut entry_stream = CodedOutputStream::vec(&mut body);
                    write_tag(&mut entry_stream, 1, key_field.field_type.wire_type())?;
                    write_value(pool, &mut entry_stream, field, &key_field.field_type, &key_value)?;
                    write_tag(&mut entry_stream, 2, value_field.field_type.wire_type())?;
                    write_value(pool, &mut entry_stream, field, &value_field.field_type, item)?;
                    entry_stream.flush().map_err(io_error)?;
                }
                write_tag(stream, field.number, WireType::LengthDelimited)?;
                stream.write_bytes_no_tag(&body).map_err(io_error)?;
            }
        }
        Cardinality::Optional | Cardinality::Required => {
            if field.presence == Presence::Implicit && value.is_default() {
                return Ok(());
            }
            write_tag(stream, field.number, field.field_type.wire_type())?;
            write_value(pool, stream, field, &field.field_type, value)?;
        }
    }
    Ok(())
}

fn write_tag(stream: &mut CodedOutputStream, number: u32, wire_type: WireType) -> Result<()> {
    stream
        .write_raw_varint32(WireTag::new(number, wire_type).encode())
        .map_err(io_error)?;
    Ok(())
}

/// Write one value without its tag.
fn write_value(
    pool: &DescriptorPool,
    stream: &mut CodedOutputStream,
    field: &FieldDescriptor,
    field_type: &ProtoType,
    value: &ProtoFieldValue,
) -> Result<()> {
    let written = match (field_type, value) {
        (ProtoType::Double, ProtoFieldValue::Double(v)) => stream.write_double_no_tag(*v),
        (ProtoType::Float, ProtoFieldValue::Float(v)) => stream.write_float_no_tag(*v),
        (ProtoType::Int32, ProtoFieldValue::Int32(v)) => stream.write_int32_no_tag(*v),
        (ProtoType::Sint32, ProtoFieldValue::Int32(v)) => stream.write_sint32_no_tag(*v),
        (ProtoType::Sfixed32, ProtoFieldValue::Int32(v)) => stream.write_sfixed32_no_tag(*v),
        (ProtoType::Int64, ProtoFieldValue::Int64(v)) => stream.write_int64_no_tag(*v),
        (ProtoType::Sint64, ProtoFieldValue::Int64(v)) => stream.write_sint64_no_tag(*v),
        (ProtoType::Sfixed64, ProtoFieldValue::Int64(v)) => stream.write_sfixed64_no_tag(*v),
        (ProtoType::Uint32, ProtoFieldValue::Uint32(v)) => stream.write_uint32_no_tag(*v),
        (ProtoType::Fixed32, ProtoFieldValue::Uint32(v)) => stream.write_fixed32_no_tag(*v),
        (ProtoType::Uint64, ProtoFieldValue::Uint64(v)) => stream.write_uint64_no_tag(*v),
        (ProtoType::Fixed64, ProtoFieldValue::Uint64(v)) => stream.write_fixed64_no_tag(*v),
        (ProtoType::Bool, ProtoFieldValue::Bool(v)) => stream.write_bool_no_tag(*v),
        (ProtoType::Enum(_), ProtoFieldValue::Enum(v)) => stream.write_enum_no_tag(*v),
        (ProtoType::String, ProtoFieldValue::String(v)) => stream.write_string_no_tag(v),
        (ProtoType::Bytes, ProtoFieldValue::Bytes(v)) => stream.write_bytes_no_tag(v),
        (ProtoType::Message(_), ProtoFieldValue::Message(inner)) => {
            let descriptor = message_descriptor(pool, field_type)?;
            let nested = encode_message(pool, descriptor, inner)?;
            stream.write_bytes_no_tag(&nested)
        }
        _ => return Err(mismatch(&field.name, &field_type.to_string(), value).into()),
    };
    written.map_err(io_error)?;
    Ok(())
}

fn message_descriptor<'a>(
    pool: &'a DescriptorPool,
    field_type: &ProtoType,
) -> Result<&'a MessageDescriptor> {
    match field_type {
        ProtoType::Message(name) => pool
            .get_message(name)
            .ok_or_else(|| EncodeError::UnknownMessage(name.clone()).into()),
        other => Err(EncodeError::UnknownMessage(other.to_string()).into()),
    }
}

fn mismatch(field: &str, expected: &str, value: &ProtoFieldValue) -> EncodeError {
    EncodeError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: value.kind_name(),
    }
}

fn io_error(e: protobuf::Error) -> EncodeError {
    EncodeError::Io(e.to_string())
}
