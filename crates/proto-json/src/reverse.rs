//! Reverse conversion: ProtoMessage → JSON value.

use crate::forward::entry_descriptor;
use base64::Engine;
use proto_types::{
    DescriptorPool, FieldDescriptor, MessageDescriptor, MessageSchema, ProtoFieldValue,
    ProtoMessage, ProtoType, Result, SchemaError, ValueError,
};
use serde_json::{Map, Number, Value};

/// Render a message as a JSON object keyed by proto field names.
///
/// Fields come out in declaration order; unset fields are omitted.
pub fn from_typed(schema: &MessageSchema, message: &ProtoMessage) -> Result<Value> {
    render_message(schema.pool(), schema.descriptor(), message)
}

fn render_message(
    pool: &DescriptorPool,
    descriptor: &MessageDescriptor,
    message: &ProtoMessage,
) -> Result<Value> {
    let mut object = Map::new();
    for field in descriptor.fields() {
        let Some(value) = message.get(&field.name) else {
            continue;
        };
        object.insert(field.name.clone(), render_field(pool, field, value)?);
    }
    Ok(Value::Object(object))
}

fn render_field(
    pool: &DescriptorPool,
    field: &FieldDescriptor,
    value: &ProtoFieldValue,
) -> Result<Value> {
    if field.is_repeated() {
        let ProtoFieldValue::Repeated(items) = value else {
            return Err(mismatch(&field.name, "repeated", value).into());
        };
        return items
            .iter()
            .map(|item| render_single(pool, &field.name, &field.field_type, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array);
    }

    if field.is_map() {
        let ProtoFieldValue::Map(entries) = value else {
            return Err(mismatch(&field.name, "map", value).into());
        };
        let entry = entry_descriptor(pool, field)?;
        let value_field = entry
            .map_value()
            .ok_or_else(|| SchemaError::MessageNotFound(entry.name.clone()))?;

        let mut object = Map::new();
        for (key, item) in entries {
            object.insert(
                key.to_string(),
                render_single(pool, &field.name, &value_field.field_type, item)?,
            );
        }
        return Ok(Value::Object(object));
    }

    render_single(pool, &field.name, &field.field_type, value)
}

fn render_single(
    pool: &DescriptorPool,
    field: &str,
    field_type: &ProtoType,
    value: &ProtoFieldValue,
) -> Result<Value> {
    if !value.matches_type(field_type) {
        return Err(mismatch(field, &field_type.to_string(), value).into());
    }

    let rendered = match value {
        ProtoFieldValue::Double(v) => render_float(*v),
        // Go through the shortest f32 representation so 1.1f32 renders as 1.1
        ProtoFieldValue::Float(v) => {
            if v.is_finite() {
                render_float(v.to_string().parse::<f64>().unwrap_or(f64::from(*v)))
            } else {
                render_float(f64::from(*v))
            }
        }
        ProtoFieldValue::Int32(v) => Value::from(*v),
        ProtoFieldValue::Int64(v) => Value::from(*v),
        ProtoFieldValue::Uint32(v) => Value::from(*v),
        ProtoFieldValue::Uint64(v) => Value::from(*v),
        ProtoFieldValue::Bool(v) => Value::Bool(*v),
        ProtoFieldValue::String(v) => Value::String(v.clone()),
        ProtoFieldValue::Bytes(v) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(v))
        }
        ProtoFieldValue::Enum(number) => {
            let ProtoType::Enum(name) = field_type else {
                return Err(mismatch(field, &field_type.to_string(), value).into());
            };
            match pool
                .get_enum(name)
                .and_then(|e| e.value_by_number(*number))
            {
                Some(v) => Value::String(v.name.clone()),
                None => Value::from(*number),
            }
        }
        ProtoFieldValue::Message(inner) => {
            let ProtoType::Message(name) = field_type else {
                return Err(mismatch(field, &field_type.to_string(), value).into());
            };
            let descriptor = pool
                .get_message(name)
                .ok_or_else(|| SchemaError::MessageNotFound(name.clone()))?;
            render_message(pool, descriptor, inner)?
        }
        ProtoFieldValue::Repeated(_) | ProtoFieldValue::Map(_) => {
            return Err(mismatch(field, &field_type.to_string(), value).into());
        }
    };
    Ok(rendered)
}

fn render_float(v: f64) -> Value {
    if v.is_nan() {
        Value::String("NaN".to_string())
    } else if v == f64::INFINITY {
        Value::String("Infinity".to_string())
    } else if v == f64::NEG_INFINITY {
        Value::String("-Infinity".to_string())
    } else {
        Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn mismatch(field: &str, expected: &str, value: &ProtoFieldValue) -> ValueError {
    ValueError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: value.kind_name(),
    }
}
