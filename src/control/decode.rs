//! Octal/UTF-8 decoder for `%output` payloads (component A).
//!
//! The multiplexer encodes non-printable bytes in its `%output` lines as
//! three-digit octal escapes (`\NNN`) and a handful of C-style single
//! character escapes. Decoding is byte-oriented: a multi-byte UTF-8
//! character may arrive as several adjacent `\NNN` groups, and decoding
//! each octal group independently then concatenating the raw bytes must
//! still reassemble into valid UTF-8 when the source was valid.

use crate::error::{CoreError, CoreResult};

/// Decode a single `%output` payload into raw bytes.
///
/// See module docs and spec §4.A for the escape grammar. Fails with
/// [`CoreError::MalformedEscape`] if a trailing backslash has no
/// following digit or letter.
pub fn decode(payload: &str) -> CoreResult<Vec<u8>> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let Some(&next) = bytes.get(i + 1) else {
            return Err(CoreError::MalformedEscape(
                "trailing backslash with no following character".to_string(),
            ));
        };

        if next.is_ascii_digit() {
            let digits = bytes.get(i + 1..i + 4).ok_or_else(|| {
                CoreError::MalformedEscape(format!(
                    "truncated octal escape at offset {i}"
                ))
            })?;
            if digits.len() < 3 || !digits.iter().all(u8::is_ascii_digit) {
                return Err(CoreError::MalformedEscape(format!(
                    "invalid octal escape at offset {i}"
                )));
            }
            let value = (digits[0] - b'0') as u32 * 64
                + (digits[1] - b'0') as u32 * 8
                + (digits[2] - b'0') as u32;
            if value > 255 {
                return Err(CoreError::MalformedEscape(format!(
                    "octal escape out of byte range at offset {i}"
                )));
            }
            out.push(value as u8);
            i += 4;
            continue;
        }

        let decoded = match next {
            b'r' => b'\r',
            b'n' => b'\n',
            b't' => b'\t',
            b'e' => 0x1b,
            b'\\' => b'\\',
            other if other.is_ascii_graphic() || other == b' ' => other,
            _ => {
                return Err(CoreError::MalformedEscape(format!(
                    "unrecognized escape '\\{}' at offset {i}",
                    next as char
                )))
            }
        };
        out.push(decoded);
        i += 2;
    }

    Ok(out)
}

/// Encode raw bytes into the octal escape form the decoder above accepts.
///
/// Printable ASCII passes through unchanged; everything else (including
/// backslash itself) is emitted as a three-digit octal escape. This is
/// the inverse operation used by the round-trip property tests; the
/// multiplexer itself is the only real producer of this format.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b == b'\\' {
            out.push_str("\\134");
        } else if b.is_ascii_graphic() || b == b' ' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{:03o}", b));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_printable_ascii() {
        assert_eq!(decode("hello world").unwrap(), b"hello world".to_vec());
    }

    #[test]
    fn decodes_octal_escape() {
        // \101 = 'A' = 65
        assert_eq!(decode("\\101").unwrap(), vec![65u8]);
    }

    #[test]
    fn decodes_c_style_escapes() {
        assert_eq!(decode("\\r\\n\\t\\e\\\\").unwrap(), vec![b'\r', b'\n', b'\t', 0x1b, b'\\']);
    }

    #[test]
    fn trailing_backslash_is_malformed() {
        assert!(matches!(decode("abc\\"), Err(CoreError::MalformedEscape(_))));
    }

    #[test]
    fn truncated_octal_is_malformed() {
        assert!(matches!(decode("\\12"), Err(CoreError::MalformedEscape(_))));
    }

    #[test]
    fn multi_byte_utf8_across_adjacent_octal_groups() {
        // "é" is 0xC3 0xA9 in UTF-8.
        let encoded = "\\303\\251";
        let decoded = decode(encoded).unwrap();
        assert_eq!(decoded, vec![0xC3, 0xA9]);
        assert_eq!(String::from_utf8(decoded).unwrap(), "é");
    }

    #[test]
    fn round_trip_arbitrary_bytes() {
        let original: Vec<u8> = (0u8..=255).collect();
        let encoded = encode(&original);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn round_trip_preserves_valid_utf8() {
        let text = "héllo wörld 日本語 🦀";
        let encoded = encode(text.as_bytes());
        let decoded = decode(&encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), text);
    }

    proptest::proptest! {
        #[test]
        fn prop_round_trip_any_bytes(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..256)) {
            let encoded = encode(&bytes);
            let decoded = decode(&encoded).unwrap();
            proptest::prop_assert_eq!(decoded, bytes);
        }

        #[test]
        fn prop_round_trip_valid_utf8(s in "\\PC*") {
            let encoded = encode(s.as_bytes());
            let decoded = decode(&encoded).unwrap();
            proptest::prop_assert_eq!(String::from_utf8(decoded).unwrap(), s);
        }
    }
}
