//! Frame encoding/decoding
//!
//! The wire format is one tag byte followed by an opaque payload:
//!
//! ```text
//! +-----+------------------+
//! | tag | payload (0..n B) |
//! +-----+------------------+
//! ```
//!
//! The tag is positional, not value-excluded: payload bytes may take any
//! value, including bytes that collide with tag values. Each transport
//! message carries exactly one frame, so no length prefix is needed.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::geometry::Geometry;

/// Payload token sent in keepalive control frames
pub const KEEPALIVE_TOKEN: &str = "ping";

/// Tag byte identifying the logical channel of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    /// Raw terminal bytes (keystrokes or output to render), UTF-8
    Data = 0x02,
    /// Terminal geometry change, JSON `{"cols": n, "rows": n}`
    Resize = 0x03,
    /// Out-of-band signal such as the keepalive ping, never rendered
    Control = 0x04,
}

impl Tag {
    /// Convert to the wire byte
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Convert from a wire byte
    ///
    /// Returns None for bytes outside the fixed tag set. Callers must treat
    /// unknown tags as ignorable, not as errors.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x02 => Some(Self::Data),
            0x03 => Some(Self::Resize),
            0x04 => Some(Self::Control),
            _ => None,
        }
    }
}

/// One wire unit: a tag byte plus an opaque payload
///
/// The raw tag byte is preserved so that frames carrying tags outside the
/// known set still round-trip through decode and can be skipped upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw tag byte as seen on the wire
    pub tag: u8,
    /// Payload bytes, interpretation depends on the tag
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame with a known tag
    pub fn new(tag: Tag, payload: impl Into<Bytes>) -> Self {
        Self {
            tag: tag.as_u8(),
            payload: payload.into(),
        }
    }

    /// Terminal I/O frame carrying UTF-8 text
    pub fn data(text: &str) -> Self {
        Self::new(Tag::Data, Bytes::copy_from_slice(text.as_bytes()))
    }

    /// Geometry-change frame with a JSON payload
    pub fn resize(geometry: Geometry) -> Result<Self, ProtocolError> {
        let payload = serde_json::to_vec(&geometry)?;
        Ok(Self::new(Tag::Resize, payload))
    }

    /// Out-of-band control frame carrying a short text token
    pub fn control(token: &str) -> Self {
        Self::new(Tag::Control, Bytes::copy_from_slice(token.as_bytes()))
    }

    /// Encode into the wire representation
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + self.payload.len());
        buf.put_u8(self.tag);
        buf.extend_from_slice(&self.payload);
        buf.freeze()
    }

    /// Decode a wire message into a frame
    ///
    /// Fails with `MalformedFrame` on empty input (no tag byte present).
    /// The payload may be empty. Payload structure is never inspected here.
    pub fn decode(src: &[u8]) -> Result<Self, ProtocolError> {
        let (&tag, payload) = src.split_first().ok_or(ProtocolError::MalformedFrame)?;
        Ok(Self {
            tag,
            payload: Bytes::copy_from_slice(payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for tag in [Tag::Data, Tag::Resize, Tag::Control] {
            let byte = tag.as_u8();
            let recovered = Tag::from_u8(byte).unwrap();
            assert_eq!(recovered, tag);
        }
    }

    #[test]
    fn test_unknown_tag_byte() {
        assert_eq!(Tag::from_u8(0x00), None);
        assert_eq!(Tag::from_u8(0xFF), None);
    }

    #[test]
    fn test_frame_roundtrip() {
        let frame = Frame::data("ls -la\n");
        let wire = frame.encode();

        assert_eq!(wire[0], Tag::Data.as_u8());

        let decoded = Frame::decode(&wire).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_payload_may_contain_tag_bytes() {
        // Tag is positional; payload bytes equal to tag values are legal.
        let payload = vec![0x02, 0x03, 0x04, 0x00, 0xFF];
        let frame = Frame::new(Tag::Data, payload.clone());

        let decoded = Frame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let result = Frame::decode(&[]);
        assert!(matches!(result, Err(ProtocolError::MalformedFrame)));
    }

    #[test]
    fn test_unknown_tag_passes_through() {
        let decoded = Frame::decode(&[0x7F]).unwrap();
        assert_eq!(decoded.tag, 0x7F);
        assert!(decoded.payload.is_empty());
        assert_eq!(Tag::from_u8(decoded.tag), None);
    }

    #[test]
    fn test_empty_payload() {
        let frame = Frame::new(Tag::Control, Bytes::new());
        let wire = frame.encode();
        assert_eq!(wire.len(), 1);

        let decoded = Frame::decode(&wire).unwrap();
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_resize_frame_payload() {
        let frame = Frame::resize(Geometry::new(100, 40)).unwrap();
        assert_eq!(frame.tag, Tag::Resize.as_u8());
        assert_eq!(frame.payload.as_ref(), br#"{"cols":100,"rows":40}"#);
    }
}
