//! Length-delimited framing: `varint(len(payload)) ++ payload`.

use crate::reader::WireReader;
use crate::{decode, encode};
use proto_types::{DecodeError, EncodeError, MessageSchema, ProtoMessage, Result};
use protobuf::CodedOutputStream;

/// Encode a message and prefix it with its length as a varint.
pub fn encode_delimited(schema: &MessageSchema, message: &ProtoMessage) -> Result<Vec<u8>> {
    let payload = encode(schema, message)?;
    let mut framed = Vec::with_capacity(payload.len() + 10);
    {
        let mut stream = CodedOutputStream::vec(&mut framed);
        stream
            .write_bytes_no_tag(&payload)
            .map_err(|e| EncodeError::Io(e.to_string()))?;
        stream
            .flush()
            .map_err(|e| EncodeError::Io(e.to_string()))?;
    }
    Ok(framed)
}

/// Decode the first frame in `data`. Bytes after the frame are ignored.
pub fn decode_delimited(schema: &MessageSchema, data: &[u8]) -> Result<ProtoMessage> {
    decode_delimited_prefix(schema, data).map(|(message, _)| message)
}

/// Decode the first frame in `data` and report how many bytes it occupied,
/// so callers can walk a buffer of consecutive frames.
pub fn decode_delimited_prefix(
    schema: &MessageSchema,
    data: &[u8],
) -> Result<(ProtoMessage, usize)> {
    let mut reader = WireReader::new(data);
    if reader.at_end()? {
        return Err(DecodeError::Truncated("length prefix".to_string()).into());
    }

    let declared = reader.read_varint("length prefix", |s| s.read_raw_varint64())?;
    let remaining = reader.remaining();
    if declared > remaining {
        return Err(DecodeError::Truncated(format!(
            "frame of {declared} bytes ({remaining} available)"
        ))
        .into());
    }

    let payload = reader.take(declared)?;
    let message = decode(schema, payload)?;
    Ok((message, reader.position()))
}
