//! RDP packet framing.
//!
//! Packets on the wire are `BYTE_LENGTH ":" JSON`, repeated, where
//! `BYTE_LENGTH` is the ASCII decimal byte length of the UTF-8 payload.
//!
//! ```text
//! 38:{"from":"root","type":"getRoot","x":1}
//! ```
//!
//! [`parse_next`] is a pure function: it never performs I/O and never
//! mutates the buffer. The caller drops `consumed` bytes from the front of
//! its buffer and calls it again until it returns
//! [`ParseOutcome::NeedMoreData`].

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::error::{Error, Result};

use super::RdpMessage;

// ============================================================================
// Constants
// ============================================================================

/// Separator between the length prefix and the payload.
const SEPARATOR: u8 = b':';

// ============================================================================
// ParseOutcome
// ============================================================================

/// Result of one [`parse_next`] call.
#[derive(Debug)]
pub enum ParseOutcome {
    /// The buffer does not hold a complete packet yet. Nothing consumed.
    NeedMoreData,

    /// One packet decoded.
    Message {
        /// Bytes to drop from the front of the buffer.
        consumed: usize,
        /// The decoded message.
        message: RdpMessage,
    },

    /// One packet was consumed but its payload is not a valid message.
    ///
    /// The stream stays in sync; parsing can continue.
    Malformed {
        /// Bytes to drop from the front of the buffer.
        consumed: usize,
        /// Non-fatal framing error.
        error: Error,
    },

    /// The length prefix is unparsable. The stream cannot be resynced.
    Fatal(Error),
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses the next packet from the front of `buffer`.
#[must_use]
pub fn parse_next(buffer: &[u8]) -> ParseOutcome {
    let Some(separator) = buffer.iter().position(|&b| b == SEPARATOR) else {
        return ParseOutcome::NeedMoreData;
    };

    let length = match parse_length(&buffer[..separator]) {
        Ok(length) => length,
        Err(error) => return ParseOutcome::Fatal(error),
    };

    let payload_start = separator + 1;
    if buffer.len() - payload_start < length {
        return ParseOutcome::NeedMoreData;
    }

    let consumed = payload_start + length;
    let payload = &buffer[payload_start..consumed];

    match serde_json::from_slice::<RdpMessage>(payload) {
        Ok(message) => ParseOutcome::Message { consumed, message },
        Err(e) => ParseOutcome::Malformed {
            consumed,
            error: Error::malformed_packet(e.to_string()),
        },
    }
}

/// Parses the ASCII decimal length prefix.
fn parse_length(prefix: &[u8]) -> Result<usize> {
    if prefix.is_empty() || !prefix.iter().all(u8::is_ascii_digit) {
        return Err(Error::fatal_framing(format!(
            "invalid length prefix {:?}",
            String::from_utf8_lossy(prefix)
        )));
    }

    // All ASCII digits, so the only failure left is overflow.
    std::str::from_utf8(prefix)
        .ok()
        .and_then(|digits| digits.parse::<usize>().ok())
        .ok_or_else(|| Error::fatal_framing("length prefix out of range"))
}

// ============================================================================
// Encoding
// ============================================================================

/// Serializes `value` as one length-prefixed packet.
///
/// # Errors
///
/// Returns [`Error::Json`] if `value` cannot be serialized.
pub fn encode_frame<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(value)?;
    let prefix = payload.len().to_string();

    let mut frame = Vec::with_capacity(prefix.len() + 1 + payload.len());
    frame.extend_from_slice(prefix.as_bytes());
    frame.push(SEPARATOR);
    frame.extend_from_slice(&payload);
    Ok(frame)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::{Value, json};

    /// Feeds `chunks` one by one into a growing buffer, collecting messages.
    fn feed(chunks: &[&[u8]]) -> (Vec<RdpMessage>, usize) {
        let mut buffer = Vec::new();
        let mut messages = Vec::new();
        let mut malformed = 0;

        for chunk in chunks {
            buffer.extend_from_slice(chunk);
            loop {
                match parse_next(&buffer) {
                    ParseOutcome::NeedMoreData => break,
                    ParseOutcome::Message { consumed, message } => {
                        buffer.drain(..consumed);
                        messages.push(message);
                    }
                    ParseOutcome::Malformed { consumed, .. } => {
                        buffer.drain(..consumed);
                        malformed += 1;
                    }
                    ParseOutcome::Fatal(e) => panic!("unexpected fatal error: {e}"),
                }
            }
        }

        (messages, malformed)
    }

    #[test]
    fn test_need_more_data_without_separator() {
        assert!(matches!(parse_next(b""), ParseOutcome::NeedMoreData));
        assert!(matches!(parse_next(b"123"), ParseOutcome::NeedMoreData));
    }

    #[test]
    fn test_need_more_data_for_partial_payload() {
        assert!(matches!(
            parse_next(br#"30:{"from":"root""#),
            ParseOutcome::NeedMoreData
        ));
    }

    #[test]
    fn test_single_message() {
        let frame = br#"29:{"from":"root","type":"test"}"#;

        match parse_next(frame) {
            ParseOutcome::Message { consumed, message } => {
                assert_eq!(consumed, frame.len());
                assert_eq!(message.message_type(), "test");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_leaves_trailing_bytes() {
        let mut buffer = br#"29:{"from":"root","type":"test"}"#.to_vec();
        buffer.extend_from_slice(b"5:{\"a\"");

        match parse_next(&buffer) {
            ParseOutcome::Message { consumed, .. } => assert_eq!(consumed, 32),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_multibyte_length_counts_bytes() {
        let frame = encode_frame(&json!({"from": "root", "type": "héllo→"})).expect("encode");
        let (messages, _) = feed(&[frame.as_slice()]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_type(), "héllo→");
    }

    #[test]
    fn test_invalid_length_is_fatal() {
        match parse_next(b"notanumber:{}") {
            ParseOutcome::Fatal(e) => assert!(e.is_fatal_framing()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_empty_length_is_fatal() {
        assert!(matches!(parse_next(b":{}"), ParseOutcome::Fatal(_)));
    }

    #[test]
    fn test_overflowing_length_is_fatal() {
        assert!(matches!(
            parse_next(b"99999999999999999999999999:{}"),
            ParseOutcome::Fatal(_)
        ));
    }

    #[test]
    fn test_malformed_json_is_not_fatal() {
        let mut stream = b"5:{bad}".to_vec();
        stream.extend_from_slice(br#"30:{"from":"root","type":"after"}"#);

        let (messages, malformed) = feed(&[stream.as_slice()]);
        assert_eq!(malformed, 1);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_type(), "after");
    }

    #[test]
    fn test_non_object_payload_is_not_fatal() {
        match parse_next(b"2:42") {
            ParseOutcome::Malformed { consumed, error } => {
                assert_eq!(consumed, 4);
                assert!(!error.is_fatal_framing());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_encode_frame_prefix() {
        let frame = encode_frame(&json!({"to": "root", "type": "getRoot"})).expect("encode");
        let text = String::from_utf8(frame).expect("utf8");
        assert_eq!(text, r#"30:{"to":"root","type":"getRoot"}"#);
    }

    #[test]
    fn test_round_trip() {
        let original = RdpMessage::new("actor1", "installTemporaryAddon")
            .with_field("addon", json!({"id": "ext@id", "actor": "actor2"}));

        let frame = encode_frame(&original).expect("encode");
        let (messages, _) = feed(&[frame.as_slice()]);
        assert_eq!(messages, vec![original]);
    }

    fn message_strategy() -> impl Strategy<Value = Value> {
        (
            "[a-z0-9.]{1,12}",
            "[a-zA-Z]{1,12}",
            prop::collection::btree_map("[a-z]{1,6}", "[ -~é→]{0,16}", 0..4),
        )
            .prop_map(|(from, ty, extra)| {
                let mut object = serde_json::Map::new();
                object.insert("from".into(), Value::String(from));
                object.insert("type".into(), Value::String(ty));
                for (k, v) in extra {
                    object.entry(k).or_insert(Value::String(v));
                }
                Value::Object(object)
            })
    }

    proptest! {
        #[test]
        fn test_incremental_feed_matches_single_chunk(
            values in prop::collection::vec(message_strategy(), 1..6),
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
        ) {
            let mut stream = Vec::new();
            for value in &values {
                stream.extend(encode_frame(value).expect("encode"));
            }

            let mut points: Vec<usize> = cuts.iter().map(|i| i.index(stream.len() + 1)).collect();
            points.sort_unstable();
            points.dedup();

            let mut chunks: Vec<&[u8]> = Vec::new();
            let mut start = 0;
            for point in points {
                chunks.push(&stream[start..point]);
                start = point;
            }
            chunks.push(&stream[start..]);

            let (whole, _) = feed(&[stream.as_slice()]);
            let (pieces, _) = feed(&chunks);

            prop_assert_eq!(whole.len(), values.len());
            prop_assert_eq!(pieces, whole);
        }
    }
}
