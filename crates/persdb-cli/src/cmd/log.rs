//! `persdb log` - print the local tree's revisions (§6).
use persdb_core::MergeTree;

use crate::error::CliError;
use crate::format::header_to_json;

pub fn run(
    mt: &MergeTree,
    sorted: bool,
    perspective: bool,
    all: bool,
    pe: Option<&str>,
    limit: Option<usize>,
) -> Result<(), CliError> {
    let mut revisions = mt
        .local_tree()
        .iterate_insertion_order(false, None, None)
        .map_err(CliError::from)?;

    if let Some(pe_filter) = pe {
        revisions.retain(|rev| rev.header.pe.as_ref().is_some_and(|p| (p as &str) == pe_filter));
    }

    if sorted {
        revisions.sort_by(|a, b| a.header.id.as_bytes().cmp(b.header.id.as_bytes()));
    }

    if let Some(n) = limit {
        revisions.truncate(n);
    }

    for rev in &revisions {
        let json = header_to_json(&rev.header, all, perspective);
        println!("{json}");
    }

    Ok(())
}
