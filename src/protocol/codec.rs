//! Message encoding and decoding.
//!
//! The codec is stateless. It knows nothing about how messages are delimited
//! on the stream; see [`Framing`](super::Framing) for that.

use std::fmt;

use crate::core::constants::{DELIMITER, PONG_FLAG};
use crate::core::DecodeError;

/// A decoded `flag;payload` message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    /// Token identifying the message type (e.g. `a`, `b`, `pong`).
    pub flag: String,
    /// Everything after the first `;`. May be empty or contain `;`.
    pub payload: String,
}

impl Message {
    /// Create a message from its parts.
    pub fn new(flag: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            payload: payload.into(),
        }
    }

    /// Check if this is a heartbeat reply.
    pub fn is_pong(&self) -> bool {
        self.flag == PONG_FLAG
    }

    /// Encode this message to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        encode(&self.flag, &self.payload)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.flag, DELIMITER, self.payload)
    }
}

/// Encode `flag` and `payload` as `flag;payload` UTF-8 bytes.
///
/// No trailing delimiter is added.
pub fn encode(flag: &str, payload: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(flag.len() + 1 + payload.len());
    out.extend_from_slice(flag.as_bytes());
    out.push(DELIMITER as u8);
    out.extend_from_slice(payload.as_bytes());
    out
}

/// Decode one message from `bytes`.
///
/// Splits on the first `;` only, so the payload may itself contain `;`.
pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
    let (flag, payload) = text
        .split_once(DELIMITER)
        .ok_or_else(|| DecodeError::MissingDelimiter(text.to_string()))?;
    Ok(Message::new(flag, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode("a", "go"), b"a;go");
        assert_eq!(encode("b", ""), b"b;");
    }

    #[test]
    fn test_decode_empty_payload() {
        let msg = decode(b"a;").unwrap();
        assert_eq!(msg.flag, "a");
        assert_eq!(msg.payload, "");
    }

    #[test]
    fn test_decode_splits_on_first_delimiter() {
        let msg = decode(b"a;x;y;z").unwrap();
        assert_eq!(msg.flag, "a");
        assert_eq!(msg.payload, "x;y;z");
    }

    #[test]
    fn test_decode_pong() {
        let msg = decode(b"pong;100.050").unwrap();
        assert!(msg.is_pong());
        assert_eq!(msg.payload, "100.050");
    }

    #[test]
    fn test_decode_without_delimiter() {
        assert_eq!(
            decode(b"garbage"),
            Err(DecodeError::MissingDelimiter("garbage".into()))
        );
        // The bare heartbeat literal is not a flag;payload message either.
        assert!(decode(b"ping").is_err());
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode(b""), Err(DecodeError::Empty));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert_eq!(decode(&[0x61, 0x3b, 0xff, 0xfe]), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_message_display() {
        assert_eq!(Message::new("a", "1;2").to_string(), "a;1;2");
    }

    proptest! {
        #[test]
        fn prop_decode_recovers_encoded(flag in "[a-z]{1,8}", payload in "[ -~]{0,32}") {
            // The payload alphabet includes ';' so both halves of the law are covered.
            let msg = decode(&encode(&flag, &payload)).unwrap();
            prop_assert_eq!(msg.flag, flag);
            prop_assert_eq!(msg.payload, payload);
        }
    }
}
