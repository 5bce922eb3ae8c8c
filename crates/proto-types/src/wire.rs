//! Protobuf wire types and tags.

use crate::error::DecodeError;

/// Largest field number allowed by the protobuf language.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// The 3-bit category stored in the low bits of every tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl std::fmt::Display for WireType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length-delimited",
            WireType::StartGroup => "start-group",
            WireType::EndGroup => "end-group",
            WireType::Fixed32 => "fixed32",
        };
        f.write_str(name)
    }
}

impl WireType {
    /// Map the low three bits of a tag to a wire type.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

/// A `(field number, wire type)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireTag {
    pub field_number: u32,
    pub wire_type: WireType,
}

impl WireTag {
    pub fn new(field_number: u32, wire_type: WireType) -> Self {
        Self {
            field_number,
            wire_type,
        }
    }

    /// Tag value as written on the wire: `(field_number << 3) | wire_type`.
    pub fn encode(self) -> u32 {
        (self.field_number << 3) | self.wire_type.as_raw()
    }

    /// Split a raw tag varint into field number and wire type.
    pub fn decode(raw: u64) -> Result<Self, DecodeError> {
        if raw > u64::from(u32::MAX) {
            return Err(DecodeError::InvalidTag(raw));
        }
        let raw = raw as u32;
        let field_number = raw >> 3;
        if field_number == 0 {
            return Err(DecodeError::InvalidTag(u64::from(raw)));
        }
        let wire_type = WireType::from_raw(raw & 0x7).ok_or(DecodeError::InvalidTag(u64::from(raw)))?;
        Ok(Self {
            field_number,
            wire_type,
        })
    }
}
