//! Clap CLI definition: root struct and the five subcommands of §6.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// All top-level subcommands exposed by the `persdb` binary.
#[derive(Subcommand)]
pub enum Command {
    /// Print a tree's revisions in insertion order.
    Log {
        /// Path to the HJSON database config.
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
        /// Sort output by `id` rather than insertion order.
        #[arg(short = 's', long)]
        sorted: bool,
        /// Include each revision's perspective in the printed output.
        #[arg(short = 'p', long)]
        perspective: bool,
        /// Include every header field, not just `id`/`v`/`pa`.
        #[arg(short = 'a', long)]
        all: bool,
        /// Limit the log to revisions carrying this `pe` value.
        #[arg(long = "pe", value_name = "PERSPECTIVE")]
        pe: Option<String>,
        /// Print at most N revisions.
        #[arg(short = 'n', value_name = "N")]
        limit: Option<usize>,
    },

    /// Compare two perspectives' trees and report the classification counts.
    Compare {
        /// Path to the HJSON database config.
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
        /// Name of the first tree: `local`, `stage`, or a configured perspective.
        #[arg(short = 'a', value_name = "TREE_A")]
        tree_a: String,
        /// Name of the second tree (default: `local`).
        #[arg(short = 'b', value_name = "TREE_B")]
        tree_b: Option<String>,
        /// Restrict comparison to these attributes (repeatable).
        #[arg(long = "include-attrs", value_name = "ATTR")]
        include_attrs: Vec<String>,
        /// Exclude these attributes from comparison (repeatable).
        #[arg(long = "exclude-attrs", value_name = "ATTR")]
        exclude_attrs: Vec<String>,
    },

    /// Three-way merge two revisions and print the resulting body as JSON.
    Merge {
        /// Path to the HJSON database config.
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
        /// Document id being merged.
        #[arg(short = 'c', long = "collection", value_name = "ID")]
        collection: String,
        /// First version to merge.
        #[arg(value_name = "V1")]
        v1: String,
        /// Second version to merge.
        #[arg(value_name = "V2")]
        v2: String,
        /// Persist the merge result to the local tree instead of only printing it.
        #[arg(short = 's', long)]
        save: bool,
    },

    /// Register a new user in the configured credential file.
    Adduser {
        /// Username to register; prompted interactively if omitted.
        #[arg(value_name = "USERNAME")]
        username: Option<String>,
        /// Credential file to append to (default: `./credentials`).
        #[arg(long, value_name = "FILE")]
        write: Option<PathBuf>,
    },

    /// Decode an epoch timestamp, 10- or 13-digit, or the two-word legacy form.
    Timestamp {
        /// A 10-digit (seconds) or 13-digit (milliseconds) epoch value, or
        /// `low,high` for the legacy two-word encoding.
        #[arg(value_name = "TS")]
        value: String,
    },
}

/// Root CLI struct for the `persdb` binary.
#[derive(Parser)]
#[command(
    name = "persdb",
    version,
    about = "PerspectiveDB reference CLI",
    long_about = "Command-line tool for a PerspectiveDB MergeTree store: \
                  inspect, compare, and merge document revisions, and manage \
                  credentials for peer connections."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}
