//! The per-revision header (C2): typed representation plus the untyped
//! validator run at network ingress and before every append.
use crate::error::PersDbError;
use crate::newtypes::{DocId, PerspectiveName, VersionId};
use crate::value::{Body, Value};

/// The six header fields named in §3: `id`, `v`, `pa`, `pe`, `i`, `d`, `c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: DocId,
    pub v: VersionId,
    pub pa: Vec<VersionId>,
    pub pe: Option<PerspectiveName>,
    pub i: u64,
    pub d: bool,
    pub c: bool,
}

/// Keys a candidate header map is allowed to carry. Anything else is a fatal
/// validation error, matching "No other keys allowed" in §4.2.
const ALLOWED_KEYS: &[&str] = &["id", "v", "pa", "pe", "i", "d", "c"];

/// Validates an untyped header map arriving from the network or a CLI
/// import, per §4.2. `id` is required; everything else is optional with the
/// shape named in the design. Returns `Ok(())` or a diagnostic error.
pub fn validate_candidate(candidate: &Body) -> Result<(), PersDbError> {
    for key in candidate.keys() {
        if !ALLOWED_KEYS.contains(&key.as_str()) {
            return Err(invalid(format!("unknown header key {key:?}")));
        }
    }

    let id = candidate.get("id").ok_or_else(|| invalid("missing id"))?;
    match id {
        Value::String(s) if !s.is_empty() => {}
        Value::Bytes(b) if !b.is_empty() => {}
        _ => return Err(invalid("id must be a non-empty string or byte string")),
    }

    if let Some(v) = candidate.get("v") {
        match v {
            Value::String(s) if !s.is_empty() => {}
            _ => return Err(invalid("v must be a non-empty string")),
        }
    }

    if let Some(pa) = candidate.get("pa") {
        let Value::Array(items) = pa else {
            return Err(invalid("pa must be an array of version strings"));
        };
        for item in items {
            if !matches!(item, Value::String(s) if !s.is_empty()) {
                return Err(invalid("pa entries must be non-empty strings"));
            }
        }
    }

    if let Some(pe) = candidate.get("pe") {
        if !matches!(pe, Value::String(_)) {
            return Err(invalid("pe must be a string"));
        }
    }

    if let Some(i) = candidate.get("i") {
        match i {
            Value::Integer(n) if *n >= 0 => {}
            _ => return Err(invalid("i must be a non-negative integer")),
        }
    }

    for key in ["d", "c"] {
        if let Some(flag) = candidate.get(key) {
            if !matches!(flag, Value::Bool(_)) {
                return Err(invalid(format!("{key} must be a boolean")));
            }
        }
    }

    Ok(())
}

fn invalid(reason: impl Into<String>) -> PersDbError {
    PersDbError::InvalidHeader {
        reason: reason.into(),
    }
}

impl Header {
    /// Builds a typed [`Header`] from a validated candidate map, assigning
    /// the insertion sequence number supplied by the tree. Callers must run
    /// [`validate_candidate`] first; this constructor re-validates the
    /// required field shapes but does not duplicate the full key-set check.
    pub fn from_candidate(candidate: &Body, assigned_i: u64) -> Result<Self, PersDbError> {
        validate_candidate(candidate)?;

        let id = match candidate.get("id") {
            Some(Value::String(s)) => DocId::try_from(s.as_str()),
            Some(Value::Bytes(b)) => DocId::try_from(b.as_slice()),
            _ => return Err(invalid("missing id")),
        }
        .map_err(|e| invalid(e.to_string()))?;

        let v = match candidate.get("v") {
            Some(Value::String(s)) => {
                VersionId::try_from(s.as_str()).map_err(|e| invalid(e.to_string()))?
            }
            _ => VersionId::generate().map_err(|e| invalid(format!("random source: {e}")))?,
        };

        let pa = match candidate.get("pa") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => {
                        VersionId::try_from(s.as_str()).map_err(|e| invalid(e.to_string()))
                    }
                    _ => Err(invalid("pa entries must be strings")),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        let pe = match candidate.get("pe") {
            Some(Value::String(s)) if !s.is_empty() => {
                Some(PerspectiveName::try_from(s.as_str()).map_err(|e| invalid(e.to_string()))?)
            }
            _ => None,
        };

        let d = matches!(candidate.get("d"), Some(Value::Bool(true)));
        let c = matches!(candidate.get("c"), Some(Value::Bool(true)));

        Ok(Header {
            id,
            v,
            pa,
            pe,
            i: assigned_i,
            d,
            c,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn map(pairs: Vec<(&str, Value)>) -> Body {
        pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    #[test]
    fn minimal_header_is_valid() {
        let h = map(vec![("id", Value::String("x".to_owned()))]);
        assert!(validate_candidate(&h).is_ok());
    }

    #[test]
    fn missing_id_is_rejected() {
        let h = map(vec![("v", Value::String("A".to_owned()))]);
        assert!(validate_candidate(&h).is_err());
    }

    #[test]
    fn empty_id_is_rejected() {
        let h = map(vec![("id", Value::String(String::new()))]);
        assert!(validate_candidate(&h).is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let h = map(vec![
            ("id", Value::String("x".to_owned())),
            ("bogus", Value::Bool(true)),
        ]);
        assert!(validate_candidate(&h).is_err());
    }

    #[test]
    fn non_boolean_d_is_rejected() {
        let h = map(vec![
            ("id", Value::String("x".to_owned())),
            ("d", Value::String("yes".to_owned())),
        ]);
        assert!(validate_candidate(&h).is_err());
    }

    #[test]
    fn negative_i_is_rejected() {
        let h = map(vec![
            ("id", Value::String("x".to_owned())),
            ("i", Value::Integer(-1)),
        ]);
        assert!(validate_candidate(&h).is_err());
    }

    #[test]
    fn pa_with_non_string_entry_is_rejected() {
        let h = map(vec![
            ("id", Value::String("x".to_owned())),
            ("pa", Value::Array(vec![Value::Integer(1)])),
        ]);
        assert!(validate_candidate(&h).is_err());
    }

    #[test]
    fn from_candidate_generates_version_when_absent() {
        let h = map(vec![("id", Value::String("x".to_owned()))]);
        let header = Header::from_candidate(&h, 1).expect("valid");
        assert!(!header.v.is_empty());
        assert_eq!(header.i, 1);
        assert!(header.pa.is_empty());
        assert!(!header.d);
        assert!(!header.c);
    }

    #[test]
    fn from_candidate_preserves_explicit_fields() {
        let h = map(vec![
            ("id", Value::String("x".to_owned())),
            ("v", Value::String("A".to_owned())),
            (
                "pa",
                Value::Array(vec![Value::String("root".to_owned())]),
            ),
            ("d", Value::Bool(true)),
        ]);
        let header = Header::from_candidate(&h, 5).expect("valid");
        assert_eq!(header.v.to_string(), "A");
        assert_eq!(header.pa.len(), 1);
        assert!(header.d);
    }
}
