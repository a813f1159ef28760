//! `persdb compare` - classify every id in one tree against another (§6).
use persdb_core::{AttrFilter, CompareEntry, MergeTree};

use crate::db;
use crate::error::CliError;

pub fn run(
    mt: &MergeTree,
    tree_a: &str,
    tree_b: Option<&str>,
    include_attrs: Vec<String>,
    exclude_attrs: Vec<String>,
) -> Result<(), CliError> {
    let t1 = db::resolve_tree(mt, tree_a)?;
    let t2 = db::resolve_tree(mt, tree_b.unwrap_or("local"))?;

    let filter = AttrFilter {
        include_attrs,
        exclude_attrs,
    };
    let entries = persdb_core::compare(t1, t2, &filter).map_err(CliError::from)?;

    let (mut missing, mut equal, mut inequal, mut multiple) = (0u64, 0u64, 0u64, 0u64);
    for entry in &entries {
        match entry {
            CompareEntry::Missing { .. } => missing += 1,
            CompareEntry::Equal { .. } => equal += 1,
            CompareEntry::Inequal { .. } => inequal += 1,
            CompareEntry::Multiple { .. } => multiple += 1,
        }
    }

    println!(
        "{}",
        serde_json::json!({
            "missing": missing,
            "equal": equal,
            "inequal": inequal,
            "multiple": multiple,
        })
    );

    Ok(())
}
