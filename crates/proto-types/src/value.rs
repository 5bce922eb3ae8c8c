//! Typed runtime representation of protobuf messages.
//!
//! A [`ProtoMessage`] is produced by the JSON mapper or the wire decoder and
//! consumed by the wire encoder or the reverse mapper. Every field value is
//! already coerced to the variant matching its declared [`ProtoType`], so the
//! wire layer never has to interpret loosely typed input.

use crate::descriptor::ProtoType;
use std::collections::{BTreeMap, HashMap};

/// Represents a field value in a protobuf message.
///
/// The sint/fixed/sfixed types share the variant of their width and
/// signedness; the field descriptor decides the wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtoFieldValue {
    Double(f64),
    Float(f32),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Enum(i32),
    Message(Box<ProtoMessage>),
    Repeated(Vec<ProtoFieldValue>),
    Map(BTreeMap<MapKey, ProtoFieldValue>),
}

impl ProtoFieldValue {
    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ProtoFieldValue::Double(_) => "double",
            ProtoFieldValue::Float(_) => "float",
            ProtoFieldValue::Int32(_) => "int32",
            ProtoFieldValue::Int64(_) => "int64",
            ProtoFieldValue::Uint32(_) => "uint32",
            ProtoFieldValue::Uint64(_) => "uint64",
            ProtoFieldValue::Bool(_) => "bool",
            ProtoFieldValue::String(_) => "string",
            ProtoFieldValue::Bytes(_) => "bytes",
            ProtoFieldValue::Enum(_) => "enum",
            ProtoFieldValue::Message(_) => "message",
            ProtoFieldValue::Repeated(_) => "repeated",
            ProtoFieldValue::Map(_) => "map",
        }
    }

    /// Zero value for a scalar or enum type. Messages have no zero value.
    pub fn default_for(field_type: &ProtoType) -> Option<Self> {
        Some(match field_type {
            ProtoType::Double => ProtoFieldValue::Double(0.0),
            ProtoType::Float => ProtoFieldValue::Float(0.0),
            ProtoType::Int32 | ProtoType::Sint32 | ProtoType::Sfixed32 => {
                ProtoFieldValue::Int32(0)
            }
            ProtoType::Int64 | ProtoType::Sint64 | ProtoType::Sfixed64 => {
                ProtoFieldValue::Int64(0)
            }
            ProtoType::Uint32 | ProtoType::Fixed32 => ProtoFieldValue::Uint32(0),
            ProtoType::Uint64 | ProtoType::Fixed64 => ProtoFieldValue::Uint64(0),
            ProtoType::Bool => ProtoFieldValue::Bool(false),
            ProtoType::String => ProtoFieldValue::String(String::new()),
            ProtoType::Bytes => ProtoFieldValue::Bytes(Vec::new()),
            ProtoType::Enum(_) => ProtoFieldValue::Enum(0),
            ProtoType::Message(_) => return None,
        })
    }

    /// Whether this is the zero/empty value of its type.
    ///
    /// Negative zero is not treated as zero, since its bit pattern differs.
    pub fn is_default(&self) -> bool {
        match self {
            ProtoFieldValue::Double(v) => v.to_bits() == 0,
            ProtoFieldValue::Float(v) => v.to_bits() == 0,
            ProtoFieldValue::Int32(v) => *v == 0,
            ProtoFieldValue::Int64(v) => *v == 0,
            ProtoFieldValue::Uint32(v) => *v == 0,
            ProtoFieldValue::Uint64(v) => *v == 0,
            ProtoFieldValue::Bool(v) => !*v,
            ProtoFieldValue::String(v) => v.is_empty(),
            ProtoFieldValue::Bytes(v) => v.is_empty(),
            ProtoFieldValue::Enum(v) => *v == 0,
            ProtoFieldValue::Message(_) => false,
            ProtoFieldValue::Repeated(v) => v.is_empty(),
            ProtoFieldValue::Map(v) => v.is_empty(),
        }
    }

    /// Whether this single (non-repeated) value fits the declared type.
    pub fn matches_type(&self, field_type: &ProtoType) -> bool {
        matches!(
            (field_type, self),
            (ProtoType::Double, ProtoFieldValue::Double(_))
                | (ProtoType::Float, ProtoFieldValue::Float(_))
                | (
                    ProtoType::Int32 | ProtoType::Sint32 | ProtoType::Sfixed32,
                    ProtoFieldValue::Int32(_)
                )
                | (
                    ProtoType::Int64 | ProtoType::Sint64 | ProtoType::Sfixed64,
                    ProtoFieldValue::Int64(_)
                )
                | (ProtoType::Uint32 | ProtoType::Fixed32, ProtoFieldValue::Uint32(_))
                | (ProtoType::Uint64 | ProtoType::Fixed64, ProtoFieldValue::Uint64(_))
                | (ProtoType::Bool, ProtoFieldValue::Bool(_))
                | (ProtoType::String, ProtoFieldValue::String(_))
                | (ProtoType::Bytes, ProtoFieldValue::Bytes(_))
                | (ProtoType::Enum(_), ProtoFieldValue::Enum(_))
                | (ProtoType::Message(_), ProtoFieldValue::Message(_))
        )
    }
}

/// Key of a map field entry.
///
/// Signed integer key types share `Int`, unsigned ones share `Uint`.
/// Keys are ordered so map entries encode deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(String),
}

impl std::fmt::Display for MapKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{b}"),
            MapKey::Int(i) => write!(f, "{i}"),
            MapKey::Uint(u) => write!(f, "{u}"),
            MapKey::String(s) => f.write_str(s),
        }
    }
}

impl MapKey {
    /// Convert a decoded key field value into a map key.
    pub fn from_value(value: ProtoFieldValue) -> Option<Self> {
        match value {
            ProtoFieldValue::Bool(b) => Some(MapKey::Bool(b)),
            ProtoFieldValue::Int32(i) => Some(MapKey::Int(i64::from(i))),
            ProtoFieldValue::Int64(i) => Some(MapKey::Int(i)),
            ProtoFieldValue::Uint32(u) => Some(MapKey::Uint(u64::from(u))),
            ProtoFieldValue::Uint64(u) => Some(MapKey::Uint(u)),
            ProtoFieldValue::String(s) => Some(MapKey::String(s)),
            _ => None,
        }
    }

    /// Convert back to a field value of the declared key type.
    ///
    /// Returns `None` when the key does not fit the type.
    pub fn to_value(&self, key_type: &ProtoType) -> Option<ProtoFieldValue> {
        match (key_type, self) {
            (ProtoType::Bool, MapKey::Bool(b)) => Some(ProtoFieldValue::Bool(*b)),
            (ProtoType::Int32 | ProtoType::Sint32 | ProtoType::Sfixed32, MapKey::Int(i)) => {
                i32::try_from(*i).ok().map(ProtoFieldValue::Int32)
            }
            (ProtoType::Int64 | ProtoType::Sint64 | ProtoType::Sfixed64, MapKey::Int(i)) => {
                Some(ProtoFieldValue::Int64(*i))
            }
            (ProtoType::Uint32 | ProtoType::Fixed32, MapKey::Uint(u)) => {
                u32::try_from(*u).ok().map(ProtoFieldValue::Uint32)
            }
            (ProtoType::Uint64 | ProtoType::Fixed64, MapKey::Uint(u)) => {
                Some(ProtoFieldValue::Uint64(*u))
            }
            (ProtoType::String, MapKey::String(s)) => Some(ProtoFieldValue::String(s.clone())),
            _ => None,
        }
    }
}

/// Represents one protobuf message instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtoMessage {
    /// Fully qualified message type name
    pub message_type: String,
    /// Field values by field name. Absent fields are unset.
    pub fields: HashMap<String, ProtoFieldValue>,
}

impl ProtoMessage {
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            fields: HashMap::new(),
        }
    }

    /// Builder-style setter, handy when constructing messages by hand.
    pub fn with(mut self, name: impl Into<String>, value: ProtoFieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ProtoFieldValue> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: ProtoFieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<ProtoFieldValue> {
        self.fields.remove(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_default() {
        assert!(ProtoFieldValue::Int32(0).is_default());
        assert!(ProtoFieldValue::String(String::new()).is_default());
        assert!(ProtoFieldValue::Bool(false).is_default());
        assert!(ProtoFieldValue::Double(0.0).is_default());
        assert!(!ProtoFieldValue::Double(-0.0).is_default());
        assert!(!ProtoFieldValue::Enum(1).is_default());
        assert!(!ProtoFieldValue::Message(Box::new(ProtoMessage::new("M"))).is_default());
    }

    #[test]
    fn test_default_for() {
        assert_eq!(
            ProtoFieldValue::default_for(&ProtoType::Sfixed64),
            Some(ProtoFieldValue::Int64(0))
        );
        assert_eq!(
            ProtoFieldValue::default_for(&ProtoType::Fixed32),
            Some(ProtoFieldValue::Uint32(0))
        );
        assert_eq!(
            ProtoFieldValue::default_for(&ProtoType::Message("M".to_string())),
            None
        );
    }

    #[test]
    fn test_matches_type() {
        assert!(ProtoFieldValue::Int32(1).matches_type(&ProtoType::Sint32));
        assert!(ProtoFieldValue::Uint64(1).matches_type(&ProtoType::Fixed64));
        assert!(!ProtoFieldValue::Int64(1).matches_type(&ProtoType::Int32));
        assert!(!ProtoFieldValue::String("a".to_string()).matches_type(&ProtoType::Bytes));
    }

    #[test]
    fn test_map_key_conversions() {
        let key = MapKey::from_value(ProtoFieldValue::Int32(-5)).unwrap();
        assert_eq!(key, MapKey::Int(-5));
        assert_eq!(
            key.to_value(&ProtoType::Sint32),
            Some(ProtoFieldValue::Int32(-5))
        );
        assert_eq!(MapKey::Int(i64::MAX).to_value(&ProtoType::Int32), None);
        assert_eq!(MapKey::Bool(true).to_value(&ProtoType::String), None);
        assert!(MapKey::from_value(ProtoFieldValue::Double(1.0)).is_none());
        assert_eq!(MapKey::Uint(7).to_string(), "7");
    }

    #[test]
    fn test_message_accessors() {
        let mut msg = ProtoMessage::new("pkg.Country")
            .with("name", ProtoFieldValue::String("A".to_string()));
        msg.set("code", ProtoFieldValue::Int32(1));

        assert_eq!(msg.len(), 2);
        assert!(msg.has("name"));
        assert_eq!(msg.get("code"), Some(&ProtoFieldValue::Int32(1)));
        assert_eq!(msg.remove("code"), Some(ProtoFieldValue::Int32(1)));
        assert!(!msg.has("code"));
    }
}
