//! `persdb merge` - three-way merge two revisions of one document (§6/§7).
//!
//! A conflict is surfaced as part of the printed JSON, not as a process
//! failure: only an actual I/O or lookup error produces a non-zero exit.
use persdb_core::{PersDbError, Value, VersionId};

use crate::db::Database;
use crate::error::CliError;
use crate::format::{body_to_json, header_to_json};

pub fn run(db: &Database, collection: &str, v1: &str, v2: &str, save: bool) -> Result<(), CliError> {
    let v1 = VersionId::try_from(v1).map_err(|e| CliError::Usage { reason: e.to_string() })?;
    let v2 = VersionId::try_from(v2).map_err(|e| CliError::Usage { reason: e.to_string() })?;

    match db.tree.merge(&v1, &v2) {
        Ok(revision) => {
            let mut out = serde_json::Map::new();
            out.insert("id".to_owned(), serde_json::json!(collection));
            out.insert("header".to_owned(), header_to_json(&revision.header, true, true));
            out.insert(
                "body".to_owned(),
                serde_json::Value::Object(body_to_json(&revision.body)),
            );
            out.insert("conflict".to_owned(), serde_json::Value::Null);

            if save {
                let header_fields = header_candidate(&revision.header);
                db.tree
                    .write(&persdb_core::Perspective::Local, &header_fields, &revision.body)
                    .map_err(CliError::from)?;
            }

            println!("{}", serde_json::Value::Object(out));
            Ok(())
        }
        Err(PersDbError::Conflict { attributes }) => {
            let out = serde_json::json!({
                "id": collection,
                "conflict": attributes,
            });
            println!("{out}");
            Ok(())
        }
        Err(e) => Err(CliError::from(e)),
    }
}

fn header_candidate(header: &persdb_core::Header) -> persdb_core::Body {
    let mut b = persdb_core::Body::new();
    b.insert(
        "id".to_owned(),
        Value::String(header.id.to_string()),
    );
    b.insert("v".to_owned(), Value::String(header.v.to_string()));
    b.insert(
        "pa".to_owned(),
        Value::Array(header.pa.iter().map(|p| Value::String(p.to_string())).collect()),
    );
    b
}
