//! Validated newtype wrappers for header identifiers.
//!
//! Each newtype enforces its shape constraint at construction time. Once
//! constructed, the inner value is immutable (no `DerefMut`). `Deserialize`
//! impls re-run validation so invalid data cannot enter the type system from
//! an untrusted network header.
use std::fmt;
use std::ops::Deref;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Errors produced when constructing a validated newtype from invalid input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewtypeError {
    InvalidFormat {
        type_name: &'static str,
        expected: &'static str,
        got: String,
    },
}

impl fmt::Display for NewtypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat {
                type_name,
                expected,
                got,
            } => write!(f, "invalid {type_name}: expected {expected}, got {got:?}"),
        }
    }
}

impl std::error::Error for NewtypeError {}

/// Matches a safe KV-key-prefix identifier: ASCII letters, digits, `-`, `_`.
static PERSPECTIVE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap_or_else(|_| {
        // Never reached: the pattern above is a compile-time constant that is
        // always valid; the fallback only exists to satisfy the workspace's
        // ban on unwrap/expect.
        Regex::new("a^").unwrap_or_else(|_| unreachable!("regex engine broken"))
    })
});

/// Non-empty document identifier (`h.id`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(Vec<u8>);

impl DocId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&str> for DocId {
    type Error = NewtypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_from(s.as_bytes())
    }
}

impl TryFrom<&[u8]> for DocId {
    type Error = NewtypeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.is_empty() {
            Err(NewtypeError::InvalidFormat {
                type_name: "DocId",
                expected: "non-empty byte string",
                got: String::from_utf8_lossy(bytes).into_owned(),
            })
        } else {
            Ok(Self(bytes.to_vec()))
        }
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl Serialize for DocId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&String::from_utf8_lossy(&self.0))
    }
}

impl<'de> Deserialize<'de> for DocId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::try_from(s.as_str()).map_err(de::Error::custom)
    }
}

/// Opaque, non-empty version identifier (`h.v`), unique per `id` within a tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionId(String);

impl TryFrom<&str> for VersionId {
    type Error = NewtypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if s.is_empty() {
            Err(NewtypeError::InvalidFormat {
                type_name: "VersionId",
                expected: "non-empty string",
                got: s.to_owned(),
            })
        } else {
            Ok(Self(s.to_owned()))
        }
    }
}

impl VersionId {
    /// Generates a fresh version identifier: 128 random bits, base32-encoded
    /// (RFC 4648 alphabet, no padding), matching §4.3 step 5.
    pub fn generate() -> Result<Self, getrandom::Error> {
        let mut buf = [0u8; 16];
        getrandom::getrandom(&mut buf)?;
        Ok(Self(base32_encode(&buf)))
    }
}

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(5) * 8);
    let mut bits = 0u32;
    let mut bit_count = 0u32;
    for &byte in bytes {
        bits = (bits << 8) | u32::from(byte);
        bit_count += 8;
        while bit_count >= 5 {
            bit_count -= 5;
            let idx = ((bits >> bit_count) & 0x1f) as usize;
            out.push(BASE32_ALPHABET[idx] as char);
        }
    }
    if bit_count > 0 {
        let idx = ((bits << (5 - bit_count)) & 0x1f) as usize;
        out.push(BASE32_ALPHABET[idx] as char);
    }
    out
}

impl Deref for VersionId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for VersionId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VersionId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::try_from(s.as_str()).map_err(de::Error::custom)
    }
}

/// The name of a remote perspective; empty/absent in a header means "local".
///
/// When non-empty, must match `^[A-Za-z0-9_-]{1,64}$` so it is safe to embed
/// directly as a key-codec scope prefix (§4.1).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PerspectiveName(String);

impl TryFrom<&str> for PerspectiveName {
    type Error = NewtypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if PERSPECTIVE_NAME_RE.is_match(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(NewtypeError::InvalidFormat {
                type_name: "PerspectiveName",
                expected: "1-64 characters of [A-Za-z0-9_-]",
                got: s.to_owned(),
            })
        }
    }
}

impl Deref for PerspectiveName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PerspectiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
