//! Generic CBOR encode/decode helpers used by [`crate::revision`].
//!
//! Encodes with the self-describing tag 55799 (`0xD9 0xD9 0xF7`) prepended so
//! a reader can identify the stream without external framing, and decodes
//! bytes with or without that tag.
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Self-describing CBOR tag 55799 bytes (RFC 8949 Section 3.4.6).
const SELF_DESCRIBING_TAG_BYTES: [u8; 3] = [0xD9, 0xD9, 0xF7];

/// Error produced by CBOR encoding and decoding operations.
#[derive(Debug)]
pub enum CborError {
    Encode(String),
    Decode(String),
}

impl std::fmt::Display for CborError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CborError::Encode(msg) => write!(f, "CBOR encode error: {msg}"),
            CborError::Decode(msg) => write!(f, "CBOR decode error: {msg}"),
        }
    }
}

impl std::error::Error for CborError {}

/// Encodes any serializable value to CBOR bytes, prefixed with the
/// self-describing tag.
pub fn encode_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, CborError> {
    let mut buf = Vec::from(SELF_DESCRIBING_TAG_BYTES);
    ciborium::into_writer(value, &mut buf).map_err(|e| CborError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Decodes CBOR bytes into `T`, accepting bytes with or without the
/// self-describing tag.
pub fn decode_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CborError> {
    let payload = if bytes.starts_with(&SELF_DESCRIBING_TAG_BYTES) {
        &bytes[3..]
    } else {
        bytes
    };
    ciborium::from_reader(payload).map_err(|e| CborError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
    struct Sample {
        a: String,
        b: u64,
    }

    #[test]
    fn encode_starts_with_self_describing_tag() {
        let bytes = encode_cbor(&Sample {
            a: "x".to_owned(),
            b: 1,
        })
        .expect("encode");
        assert!(bytes.starts_with(&SELF_DESCRIBING_TAG_BYTES));
    }

    #[test]
    fn round_trips_with_tag() {
        let sample = Sample {
            a: "x".to_owned(),
            b: 7,
        };
        let bytes = encode_cbor(&sample).expect("encode");
        let back: Sample = decode_cbor(&bytes).expect("decode");
        assert_eq!(sample, back);
    }

    #[test]
    fn decodes_bytes_without_tag() {
        let mut raw = Vec::new();
        ciborium::into_writer(
            &Sample {
                a: "y".to_owned(),
                b: 2,
            },
            &mut raw,
        )
        .expect("encode");
        let back: Sample = decode_cbor(&raw).expect("decode");
        assert_eq!(back.b, 2);
    }

    #[test]
    fn malformed_bytes_produce_decode_error() {
        let err = decode_cbor::<Sample>(&[0xff, 0x00]).expect_err("should fail");
        assert!(matches!(err, CborError::Decode(_)));
    }
}
