//! Forward conversion: JSON value → ProtoMessage.
//!
//! Every field present in the input is coerced to the variant matching its
//! declared type, so the wire encoder never sees ambiguous values.

use crate::{json_kind, MapperOptions};
use base64::Engine;
use proto_types::{
    Cardinality, DescriptorPool, EnumDescriptor, FieldDescriptor, MapKey, MessageDescriptor,
    MessageSchema, ProtoFieldValue, ProtoMessage, ProtoType, Result, SchemaError, ValueError,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// Map a JSON object onto the schema's message type.
pub fn to_typed(
    schema: &MessageSchema,
    value: &Value,
    options: &MapperOptions,
) -> Result<ProtoMessage> {
    map_message(schema.pool(), schema.descriptor(), value, options)
}

fn map_message(
    pool: &DescriptorPool,
    descriptor: &MessageDescriptor,
    value: &Value,
    options: &MapperOptions,
) -> Result<ProtoMessage> {
    let object = value.as_object().ok_or_else(|| ValueError::NotAnObject {
        message: descriptor.name.clone(),
        actual: json_kind(value),
    })?;

    let mut message = ProtoMessage::new(descriptor.name.clone());
    let mut oneofs_set: HashMap<usize, &str> = HashMap::new();

    for (key, raw) in object {
        let Some(field) = descriptor.get_field_by_any_name(key) else {
            if options.reject_unknown_fields {
                return Err(ValueError::UnknownField {
                    message: descriptor.name.clone(),
                    field: key.clone(),
                }
                .into());
            }
            trace!("Ignoring unknown field '{}' for {}", key, descriptor.name);
            continue;
        };

        // null means "not set"
        if raw.is_null() {
            continue;
        }

        if let Some(index) = field.oneof_index {
            if let Some(first) = oneofs_set.insert(index, field.name.as_str()) {
                if first != field.name {
                    return Err(ValueError::OneofConflict {
                        message: descriptor.name.clone(),
                        oneof: descriptor.oneofs.get(index).cloned().unwrap_or_default(),
                        first: first.to_string(),
                        second: field.name.clone(),
                    }
                    .into());
                }
            }
        }

        let value = map_field(pool, field, raw, options)?;
        message.set(field.name.clone(), value);
    }

    for field in descriptor.fields() {
        if field.is_required() && !message.has(&field.name) {
            return Err(ValueError::MissingRequired {
                message: descriptor.name.clone(),
                field: field.name.clone(),
            }
            .into());
        }
    }

    Ok(message)
}

fn map_field(
    pool: &DescriptorPool,
    field: &FieldDescriptor,
    raw: &Value,
    options: &MapperOptions,
) -> Result<ProtoFieldValue> {
    match field.cardinality {
        Cardinality::Repeated => {
            let items = raw.as_array().ok_or_else(|| ValueError::TypeMismatch {
                field: field.name.clone(),
                expected: format!("array of {}", field.field_type),
                actual: json_kind(raw),
            })?;
            let values = items
                .iter()
                .map(|item| -> Result<ProtoFieldValue> {
                    if item.is_null() {
                        return Err(ValueError::TypeMismatch {
                            field: field.name.clone(),
                            expected: field.field_type.to_string(),
                            actual: "null",
                        }
                        .into());
                    }
                    map_single(pool, &field.name, &field.field_type, item, options)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ProtoFieldValue::Repeated(values))
        }
        Cardinality::Map => map_entries(pool, field, raw, options),
        Cardinality::Optional | Cardinality::Required => {
            map_single(pool, &field.name, &field.field_type, raw, options)
        }
    }
}

fn map_entries(
    pool: &DescriptorPool,
    field: &FieldDescriptor,
    raw: &Value,
    options: &MapperOptions,
) -> Result<ProtoFieldValue> {
    let object = raw.as_object().ok_or_else(|| ValueError::TypeMismatch {
        field: field.name.clone(),
        expected: "object".to_string(),
        actual: json_kind(raw),
    })?;

    let entry = entry_descriptor(pool, field)?;
    let (Some(key_field), Some(value_field)) = (entry.map_key(), entry.map_value()) else {
        return Err(SchemaError::MessageNotFound(entry.name.clone()).into());
    };

    let mut entries = BTreeMap::new();
    for (key, value) in object {
        let key = parse_map_key(&field.name, &key_field.field_type, key)?;
        if value.is_null() {
            return Err(ValueError::TypeMismatch {
                field: field.name.clone(),
                expected: value_field.field_type.to_string(),
                actual: "null",
            }
            .into());
        }
        let value = map_single(pool, &field.name, &value_field.field_type, value, options)?;
        entries.insert(key, value);
    }

    Ok(ProtoFieldValue::Map(entries))
}

/// Entry record descriptor backing a map field.
pub(crate) fn entry_descriptor<'a>(
    pool: &'a DescriptorPool,
    field: &FieldDescriptor,
) -> Result<&'a MessageDescriptor> {
    match &field.field_type {
        ProtoType::Message(name) => pool
            .get_message(name)
            .ok_or_else(|| SchemaError::MessageNotFound(name.clone()).into()),
        other => Err(SchemaError::MessageNotFound(other.to_string()).into()),
    }
}

/// Map keys arrive as JSON object keys, so every key type is parsed from text.
fn parse_map_key(field: &str, key_type: &ProtoType, key: &str) -> Result<MapKey> {
    let invalid = |reason: &str| ValueError::InvalidMapKey {
        field: field.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let parsed = match key_type {
        ProtoType::String => MapKey::String(key.to_string()),
        ProtoType::Bool => match key {
            "true" => MapKey::Bool(true),
            "false" => MapKey::Bool(false),
            _ => return Err(invalid("expected true or false").into()),
        },
        ProtoType::Int32 | ProtoType::Sint32 | ProtoType::Sfixed32 => key
            .parse::<i32>()
            .map(|v| MapKey::Int(i64::from(v)))
            .map_err(|_| invalid("expected a 32-bit signed integer"))?,
        ProtoType::Int64 | ProtoType::Sint64 | ProtoType::Sfixed64 => key
            .parse::<i64>()
            .map(MapKey::Int)
            .map_err(|_| invalid("expected a 64-bit signed integer"))?,
        ProtoType::Uint32 | ProtoType::Fixed32 => key
            .parse::<u32>()
            .map(|v| MapKey::Uint(u64::from(v)))
            .map_err(|_| invalid("expected a 32-bit unsigned integer"))?,
        ProtoType::Uint64 | ProtoType::Fixed64 => key
            .parse::<u64>()
            .map(MapKey::Uint)
            .map_err(|_| invalid("expected a 64-bit unsigned integer"))?,
        other => return Err(invalid(&format!("{other} is not a valid map key type")).into()),
    };
    Ok(parsed)
}

fn map_single(
    pool: &DescriptorPool,
    field: &str,
    field_type: &ProtoType,
    raw: &Value,
    options: &MapperOptions,
) -> Result<ProtoFieldValue> {
    let mismatch = || ValueError::TypeMismatch {
        field: field.to_string(),
        expected: field_type.to_string(),
        actual: json_kind(raw),
    };

    let value = match field_type {
        ProtoType::Double => ProtoFieldValue::Double(parse_float(field, field_type, raw)?),
        ProtoType::Float => {
            let v = parse_float(field, field_type, raw)?;
            if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                return Err(out_of_range(field, field_type, v).into());
            }
            ProtoFieldValue::Float(v as f32)
        }
        ProtoType::Int32 | ProtoType::Sint32 | ProtoType::Sfixed32 => {
            let v = parse_integer(field, field_type, raw)?;
            ProtoFieldValue::Int32(
                i32::try_from(v).map_err(|_| out_of_range(field, field_type, v))?,
            )
        }
        ProtoType::Int64 | ProtoType::Sint64 | ProtoType::Sfixed64 => {
            let v = parse_integer(field, field_type, raw)?;
            ProtoFieldValue::Int64(
                i64::try_from(v).map_err(|_| out_of_range(field, field_type, v))?,
            )
        }
        ProtoType::Uint32 | ProtoType::Fixed32 => {
            let v = parse_integer(field, field_type, raw)?;
            ProtoFieldValue::Uint32(
                u32::try_from(v).map_err(|_| out_of_range(field, field_type, v))?,
            )
        }
        ProtoType::Uint64 | ProtoType::Fixed64 => {
            let v = parse_integer(field, field_type, raw)?;
            ProtoFieldValue::Uint64(
                u64::try_from(v).map_err(|_| out_of_range(field, field_type, v))?,
            )
        }
        ProtoType::Bool => ProtoFieldValue::Bool(raw.as_bool().ok_or_else(mismatch)?),
        ProtoType::String => {
            ProtoFieldValue::String(raw.as_str().ok_or_else(mismatch)?.to_string())
        }
        ProtoType::Bytes => ProtoFieldValue::Bytes(parse_bytes(field, raw)?),
        ProtoType::Enum(name) => {
            let descriptor = pool
                .get_enum(name)
                .ok_or_else(|| SchemaError::MessageNotFound(name.clone()))?;
            ProtoFieldValue::Enum(parse_enum(field, descriptor, raw)?)
        }
        ProtoType::Message(name) => {
            let descriptor = pool
                .get_message(name)
                .ok_or_else(|| SchemaError::MessageNotFound(name.clone()))?;
            ProtoFieldValue::Message(Box::new(map_message(pool, descriptor, raw, options)?))
        }
    };
    Ok(value)
}

fn out_of_range(field: &str, field_type: &ProtoType, value: impl ToString) -> ValueError {
    ValueError::OutOfRange {
        field: field.to_string(),
        field_type: field_type.to_string(),
        value: value.to_string(),
    }
}

/// Accept JSON integers, integral floats (`3.0`, `1e3`) and decimal strings.
fn parse_integer(field: &str, field_type: &ProtoType, raw: &Value) -> Result<i128> {
    let mismatch = |actual: &'static str| ValueError::TypeMismatch {
        field: field.to_string(),
        expected: field_type.to_string(),
        actual,
    };

    match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i128::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(i128::from(u))
            } else {
                let f = n.as_f64().ok_or_else(|| mismatch("number"))?;
                integral_from_f64(f).ok_or_else(|| mismatch("non-integral number").into())
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i128>() {
                return Ok(i);
            }
            let f = s
                .parse::<f64>()
                .map_err(|_| mismatch("non-numeric string"))?;
            integral_from_f64(f).ok_or_else(|| mismatch("non-integral number").into())
        }
        other => Err(mismatch(json_kind(other)).into()),
    }
}

fn integral_from_f64(f: f64) -> Option<i128> {
    // 2^127 bounds the i128 conversion; width checks happen later.
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1.7e38 {
        Some(f as i128)
    } else {
        None
    }
}

/// Accept JSON numbers, numeric strings and the non-finite spellings.
fn parse_float(field: &str, field_type: &ProtoType, raw: &Value) -> Result<f64> {
    let mismatch = |actual: &'static str| ValueError::TypeMismatch {
        field: field.to_string(),
        expected: field_type.to_string(),
        actual,
    };

    match raw {
        Value::Number(n) => n.as_f64().ok_or_else(|| mismatch("number").into()),
        Value::String(s) => match s.trim() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => other
                .parse::<f64>()
                .map_err(|_| mismatch("non-numeric string").into()),
        },
        other => Err(mismatch(json_kind(other)).into()),
    }
}

/// Bytes are a base64 string (standard or URL-safe, padding optional) or an
/// array of integers in `0..=255`.
fn parse_bytes(field: &str, raw: &Value) -> Result<Vec<u8>> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};

    let invalid = |reason: String| ValueError::InvalidBytes {
        field: field.to_string(),
        reason,
    };

    match raw {
        Value::String(s) => STANDARD
            .decode(s)
            .or_else(|_| STANDARD_NO_PAD.decode(s))
            .or_else(|_| URL_SAFE.decode(s))
            .or_else(|_| URL_SAFE_NO_PAD.decode(s))
            .map_err(|e| invalid(format!("invalid base64: {e}")).into()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| invalid(format!("{item} is not a byte")).into())
            })
            .collect(),
        other => Err(invalid(format!("expected base64 string or byte array, got {}", json_kind(other))).into()),
    }
}

/// Enums accept the symbolic name or the numeric value.
fn parse_enum(field: &str, descriptor: &EnumDescriptor, raw: &Value) -> Result<i32> {
    let unknown = |value: String| ValueError::UnknownEnumValue {
        field: field.to_string(),
        enum_name: descriptor.name.clone(),
        value,
    };

    match raw {
        Value::String(name) => descriptor
            .value_by_name(name)
            .map(|v| v.number)
            .ok_or_else(|| unknown(name.clone()).into()),
        Value::Number(_) => {
            let enum_type = ProtoType::Enum(descriptor.name.clone());
            let n = parse_integer(field, &enum_type, raw)?;
            let n = i32::try_from(n).map_err(|_| out_of_range(field, &enum_type, n))?;
            if descriptor.closed && descriptor.value_by_number(n).is_none() {
                return Err(unknown(n.to_string()).into());
            }
            Ok(n)
        }
        other => Err(ValueError::TypeMismatch {
            field: field.to_string(),
            expected: format!("enum:{}", descriptor.name),
            actual: json_kind(other),
        }
        .into()),
    }
}
