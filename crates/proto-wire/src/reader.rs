//! Bounds-checked reads over a `CodedInputStream`.
//!
//! Every length-delimited payload is handed out as a sub-slice of the input,
//! so nested messages and packed runs are decoded by a fresh reader that
//! cannot run past the declared length.

use protobuf::CodedInputStream;
use proto_types::{DecodeError, WireTag, WireType};

pub(crate) struct WireReader<'a> {
    data: &'a [u8],
    stream: CodedInputStream<'a>,
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            stream: CodedInputStream::from_bytes(data),
        }
    }

    /// Bytes consumed so far.
    pub(crate) fn position(&self) -> usize {
        self.stream.pos() as usize
    }

    pub(crate) fn remaining(&self) -> u64 {
        (self.data.len() - self.position()) as u64
    }

    pub(crate) fn at_end(&mut self) -> Result<bool, DecodeError> {
        self.stream
            .eof()
            .map_err(|e| DecodeError::Malformed(e.to_string()))
    }

    pub(crate) fn read_tag(&mut self) -> Result<WireTag, DecodeError> {
        let raw = self.read_varint("tag", |s| s.read_raw_varint64())?;
        let tag = WireTag::decode(raw)?;
        if matches!(tag.wire_type, WireType::StartGroup | WireType::EndGroup) {
            return Err(DecodeError::UnsupportedGroup {
                field_number: tag.field_number,
            });
        }
        Ok(tag)
    }

    /// Run a varint read, telling a short buffer apart from an over-long varint.
    pub(crate) fn read_varint<T>(
        &mut self,
        what: &str,
        read: impl FnOnce(&mut CodedInputStream<'a>) -> Result<T, protobuf::Error>,
    ) -> Result<T, DecodeError> {
        let start = self.position();
        read(&mut self.stream).map_err(|e| {
            let rest = &self.data[start..];
            if rest.len() < 10 && rest.iter().all(|b| b & 0x80 != 0) {
                DecodeError::Truncated(what.to_string())
            } else {
                DecodeError::Malformed(format!("{what}: {e}"))
            }
        })
    }

    /// Run a fixed-width read after checking `width` bytes are available.
    pub(crate) fn read_fixed<T>(
        &mut self,
        width: u64,
        what: &str,
        read: impl FnOnce(&mut CodedInputStream<'a>) -> Result<T, protobuf::Error>,
    ) -> Result<T, DecodeError> {
        if self.remaining() < width {
            return Err(DecodeError::Truncated(what.to_string()));
        }
        read(&mut self.stream).map_err(|e| DecodeError::Malformed(format!("{what}: {e}")))
    }

    /// Read a varint length and return the payload it prefixes.
    pub(crate) fn read_length_delimited(
        &mut self,
        field_number: u32,
    ) -> Result<&'a [u8], DecodeError> {
        let declared = self.read_varint("length", |s| s.read_raw_varint64())?;
        let remaining = self.remaining();
        if declared > remaining {
            return Err(DecodeError::LengthOverrun {
                field_number,
                declared,
                remaining,
            });
        }
        self.take(declared)
    }

    /// Consume exactly `len` bytes, which the caller has bounds-checked.
    pub(crate) fn take(&mut self, len: u64) -> Result<&'a [u8], DecodeError> {
        let count = u32::try_from(len)
            .map_err(|_| DecodeError::Malformed(format!("length {len} exceeds 4 GiB")))?;
        let start = self.position();
        self.stream
            .skip_raw_bytes(count)
            .map_err(|_| DecodeError::Truncated("length-delimited payload".to_string()))?;
        let data = self.data;
        Ok(&data[start..start + count as usize])
    }

    /// Consume the payload of a field nobody asked for.
    pub(crate) fn skip(&mut self, tag: WireTag) -> Result<(), DecodeError> {
        match tag.wire_type {
            WireType::Varint => {
                self.read_varint("varint", |s| s.read_raw_varint64())?;
            }
            WireType::Fixed64 => {
                self.read_fixed(8, "fixed64", |s| s.read_raw_little_endian64())?;
            }
            WireType::Fixed32 => {
                self.read_fixed(4, "fixed32", |s| s.read_raw_little_endian32())?;
            }
            WireType::LengthDelimited => {
                self.read_length_delimited(tag.field_number)?;
            }
            WireType::StartGroup | WireType::EndGroup => {
                return Err(DecodeError::UnsupportedGroup {
                    field_number: tag.field_number,
                });
            }
        }
        Ok(())
    }
}
