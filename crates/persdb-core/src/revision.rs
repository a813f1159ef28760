//! The on-disk revision encoding: `u8 version_tag=1`, then a varint-prefixed
//! canonical header, then a varint-prefixed canonical body (§6).
//!
//! "Canonical" means a deterministic, attribute-sorted encoding so the same
//! logical header/body always produces identical bytes; `Header` and `Value`
//! map to `BTreeMap`-backed serde structures, so CBOR's natural key order
//! already gives us that property — see `crate::cbor` for the prefix and
//! serde plumbing this module drives.
use serde::{Deserialize, Serialize};

use crate::cbor::{CborError, decode_cbor, encode_cbor};
use crate::header::Header;
use crate::newtypes::{DocId, PerspectiveName, VersionId};
use crate::value::Body;

const VERSION_TAG: u8 = 1;

/// An immutable (header, body) pair as stored in a tree's `D` namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub header: Header,
    pub body: Body,
}

/// The serde-friendly mirror of [`Header`], used only at the encoding
/// boundary so the typed newtypes don't need to implement every serde trait
/// combination CBOR's self-describing mode wants.
#[derive(Serialize, Deserialize)]
struct WireHeader {
    id: String,
    v: String,
    pa: Vec<String>,
    pe: Option<String>,
    i: u64,
    d: bool,
    c: bool,
}

#[derive(Serialize, Deserialize)]
struct WireRevision {
    header: WireHeader,
    body: Body,
}

/// Encodes a [`Revision`] to the on-disk byte layout described in §6.
pub fn encode_revision(rev: &Revision) -> Result<Vec<u8>, CborError> {
    let wire = WireRevision {
        header: WireHeader {
            id: rev.header.id.to_string(),
            v: rev.header.v.to_string(),
            pa: rev.header.pa.iter().map(ToString::to_string).collect(),
            pe: rev.header.pe.as_ref().map(ToString::to_string),
            i: rev.header.i,
            d: rev.header.d,
            c: rev.header.c,
        },
        body: rev.body.clone(),
    };
    let payload = encode_cbor(&wire)?;
    let mut out = Vec::with_capacity(payload.len() + 1);
    out.push(VERSION_TAG);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decodes bytes produced by [`encode_revision`].
pub fn decode_revision(bytes: &[u8]) -> Result<Revision, CborError> {
    let (&tag, payload) = bytes
        .split_first()
        .ok_or_else(|| CborError::Decode("empty revision bytes".to_owned()))?;
    if tag != VERSION_TAG {
        return Err(CborError::Decode(format!(
            "unsupported revision version tag {tag}"
        )));
    }
    let wire: WireRevision = decode_cbor(payload)?;
    let id = DocId::try_from(wire.header.id.as_str())
        .map_err(|e| CborError::Decode(e.to_string()))?;
    let v = VersionId::try_from(wire.header.v.as_str())
        .map_err(|e| CborError::Decode(e.to_string()))?;
    let pa = wire
        .header
        .pa
        .iter()
        .map(|s| VersionId::try_from(s.as_str()).map_err(|e| CborError::Decode(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    let pe = wire
        .header
        .pe
        .as_deref()
        .map(PerspectiveName::try_from)
        .transpose()
        .map_err(|e| CborError::Decode(e.to_string()))?;

    Ok(Revision {
        header: Header {
            id,
            v,
            pa,
            pe,
            i: wire.header.i,
            d: wire.header.d,
            c: wire.header.c,
        },
        body: wire.body,
    })
}
