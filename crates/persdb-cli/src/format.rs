//! JSON rendering helpers shared across subcommands.
use persdb_core::{Body, Header, Value};
use serde_json::{Map, json};

/// Converts the core [`Value`] tree into `serde_json::Value` for printing,
/// via the `From<Value> for serde_json::Value` conversion `persdb-core` ships.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    value.clone().into()
}

pub fn body_to_json(body: &Body) -> Map<String, serde_json::Value> {
    body.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect()
}

/// Renders a revision header as a compact JSON object, matching the field
/// set the `log` subcommand controls with `-a`/`-p`.
pub fn header_to_json(header: &Header, include_all: bool, include_perspective: bool) -> serde_json::Value {
    let mut out = Map::new();
    out.insert("id".to_owned(), json!(String::from_utf8_lossy(header.id.as_bytes())));
    out.insert("v".to_owned(), json!(header.v.to_string()));
    out.insert(
        "pa".to_owned(),
        json!(header.pa.iter().map(ToString::to_string).collect::<Vec<_>>()),
    );
    if include_all {
        out.insert("i".to_owned(), json!(header.i));
        out.insert("d".to_owned(), json!(header.d));
        out.insert("c".to_owned(), json!(header.c));
    }
    if include_perspective {
        out.insert(
            "pe".to_owned(),
            json!(header.pe.as_ref().map(ToString::to_string)),
        );
    }
    serde_json::Value::Object(out)
}
