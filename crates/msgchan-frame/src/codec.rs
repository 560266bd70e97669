use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::message::Message;
use crate::text::TextCodec;

/// Marker opening every frame header.
pub const BEGIN: u8 = b'@';

/// Separator closing the header and splitting `CAT:NUM:MSG`.
pub const SEPARATOR: u8 = b':';

/// Default maximum body size: 16 MiB.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Configuration shared by the encoder and decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum body size in bytes, enforced on both directions.
    pub max_frame_len: usize,
    /// Text codec for message bodies.
    pub codec: TextCodec,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            codec: TextCodec::default(),
        }
    }
}

/// Check the category half of the send contract.
///
/// The category must be non-empty and free of `:`, otherwise the receiving
/// side would split the body differently than it was built.
///
/// Decoding is more lenient: [`parse_body`] accepts an empty category
/// (`:1:x`), so a message received with one cannot be sent back unchanged.
pub fn validate_category(category: &str) -> Result<()> {
    if category.is_empty() {
        return Err(FrameError::contract("category must not be empty"));
    }
    if category.contains(':') {
        return Err(FrameError::contract(format!(
            "category {category:?} must not contain ':'"
        )));
    }
    Ok(())
}

/// Encode one frame into `dst`.
///
/// Wire format:
/// ```text
/// @<decimal body length>:<category>:<serial>:<payload>
/// └──────── header ─────┘└──────────── body ─────────┘
/// ```
///
/// The length counts body bytes after text encoding. Returns the header
/// length so callers can write header and body separately. On error nothing
/// is appended to `dst`.
pub fn encode_frame(
    category: &str,
    serial: u64,
    payload: &str,
    config: &FrameConfig,
    dst: &mut BytesMut,
) -> Result<usize> {
    validate_category(category)?;

    let mut body = Vec::with_capacity(category.len() + payload.len() + 22);
    config.codec.encode_into(category, &mut body)?;
    body.push(SEPARATOR);
    body.extend_from_slice(serial.to_string().as_bytes());
    body.push(SEPARATOR);
    config.codec.encode_into(payload, &mut body)?;

    if body.len() > config.max_frame_len {
        return Err(FrameError::contract(format!(
            "message body of {} bytes exceeds the {} byte frame limit",
            body.len(),
            config.max_frame_len
        )));
    }

    let header = format!("@{}:", body.len());
    dst.reserve(header.len() + body.len());
    dst.put_slice(header.as_bytes());
    dst.put_slice(&body);
    Ok(header.len())
}

/// Encode a [`Message`] into a fresh buffer.
pub fn encode_message(message: &Message, config: &FrameConfig) -> Result<BytesMut> {
    let mut dst = BytesMut::new();
    encode_frame(
        message.category(),
        message.serial(),
        message.payload(),
        config,
        &mut dst,
    )?;
    Ok(dst)
}

/// Split a decoded body into `category:serial:payload`.
///
/// The payload is everything after the second separator and may itself
/// contain `:`.
pub fn parse_body(body: &str) -> Result<Message> {
    let bad = || FrameError::malformed("expecting CAT:NUM:MSG");

    let first = body.find(':').ok_or_else(bad)?;
    let second = body[first + 1..]
        .find(':')
        .map(|offset| first + 1 + offset)
        .ok_or_else(bad)?;
    if second < first + 2 {
        return Err(bad());
    }

    let digits = &body[first + 1..second];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FrameError::malformed("invalid serial number"));
    }
    let serial = digits
        .parse::<u64>()
        .map_err(|_| FrameError::malformed("invalid serial number"))?;

    Ok(Message::new(&body[..first], serial, &body[second + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(category: &str, serial: u64, payload: &str) -> Result<BytesMut> {
        let mut buf = BytesMut::new();
        encode_frame(category, serial, payload, &FrameConfig::default(), &mut buf)?;
        Ok(buf)
    }

    #[test]
    fn encodes_exact_bytes() {
        let buf = encode("CMD", 1, "go").unwrap();
        assert_eq!(buf.as_ref(), b"@8:CMD:1:go");
    }

    #[test]
    fn header_counts_encoded_bytes_not_chars() {
        let buf = encode("EVT", 2, "é").unwrap();
        // "EVT:2:" is 6 bytes, "é" is 2 in UTF-8.
        assert_eq!(buf.as_ref(), "@8:EVT:2:é".as_bytes());

        let config = FrameConfig {
            codec: TextCodec::Latin1,
            ..FrameConfig::default()
        };
        let mut latin = BytesMut::new();
        encode_frame("EVT", 2, "é", &config, &mut latin).unwrap();
        assert_eq!(latin.as_ref(), b"@7:EVT:2:\xE9");
    }

    #[test]
    fn returns_header_length() {
        let mut buf = BytesMut::new();
        let header =
            encode_frame("OK", 10, "done", &FrameConfig::default(), &mut buf).unwrap();
        assert_eq!(&buf[..header], b"@10:");
        assert_eq!(&buf[header..], b"OK:10:done");
    }

    #[test]
    fn empty_payload_is_allowed() {
        let buf = encode("EVT", 3, "").unwrap();
        assert_eq!(buf.as_ref(), b"@6:EVT:3:");
    }

    #[test]
    fn rejects_bad_categories_without_writing() {
        let mut buf = BytesMut::new();
        let config = FrameConfig::default();
        for category in ["", "A:B"] {
            let err = encode_frame(category, 1, "x", &config, &mut buf).unwrap_err();
            assert!(matches!(err, FrameError::Contract { .. }));
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn rejects_oversized_body_without_writing() {
        let config = FrameConfig {
            max_frame_len: 8,
            ..FrameConfig::default()
        };
        let mut buf = BytesMut::new();
        let err = encode_frame("CMD", 1, "too long", &config, &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::Contract { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn encode_message_matches_frame() {
        let msg = Message::new("ERR", 4, "boom");
        let buf = encode_message(&msg, &FrameConfig::default()).unwrap();
        assert_eq!(buf.as_ref(), b"@10:ERR:4:boom");
    }

    #[test]
    fn parses_body_with_colons_in_payload() {
        let msg = parse_body("OK:42:a:b:c").unwrap();
        assert_eq!(msg, Message::new("OK", 42, "a:b:c"));
    }

    #[test]
    fn parses_empty_payload() {
        let msg = parse_body("EVT:7:").unwrap();
        assert_eq!(msg, Message::new("EVT", 7, ""));
    }

    #[test]
    fn rejects_bodies_without_two_separators() {
        for body in ["", "CMD", "CMD:1", "CMD::x", "::"] {
            let err = parse_body(body).unwrap_err();
            assert!(
                matches!(err, FrameError::Malformed { reason } if reason == "expecting CAT:NUM:MSG"),
                "body {body:?}"
            );
        }
    }

    #[test]
    fn empty_category_decodes_but_cannot_be_sent() {
        let message = parse_body(":1:x").unwrap();
        assert_eq!(message, Message::new("", 1, "x"));

        let mut buf = BytesMut::new();
        let err = encode_message(&message, &FrameConfig::default()).unwrap_err();
        assert!(matches!(err, FrameError::Contract { .. }));
        assert!(encode_frame("", 1, "x", &FrameConfig::default(), &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn rejects_non_numeric_serials() {
        for body in ["CMD:x:go", "CMD:-1:go", "CMD:+1:go", "CMD:99999999999999999999:go"] {
            let err = parse_body(body).unwrap_err();
            assert!(
                matches!(err, FrameError::Malformed { reason } if reason == "invalid serial number"),
                "body {body:?}"
            );
        }
    }
}
