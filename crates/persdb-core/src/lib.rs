#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod cbor;
pub mod compare;
pub mod diff;
pub mod error;
pub mod header;
pub mod keycodec;
pub mod kv;
pub mod merge;
pub mod mergetree;
pub mod newtypes;
pub mod revision;
pub mod selector;
pub mod stream;
pub mod tree;
pub mod value;

pub use cbor::{CborError, decode_cbor, encode_cbor};
pub use compare::{AttrFilter, CompareEntry, compare};
pub use diff::{ChangeTag, bodies_equal, diff};
pub use error::PersDbError;
pub use header::{Header, validate_candidate};
pub use keycodec::{KeyCodecError, Perspective, Tag};
pub use kv::{BatchOp, MemStore, OrderedStore, StoreError, WriteBatch};
pub use merge::{MergeOutcome, merge_bodies, merge_header};
pub use mergetree::MergeTree;
pub use newtypes::{DocId, NewtypeError, PerspectiveName, VersionId};
pub use revision::{Revision, decode_revision, encode_revision};
pub use selector::{Condition, Selector};
pub use stream::{ConcatStream, RevisionStream, StreamEvent};
pub use tree::{Tree, TreeStats};
pub use value::{Body, Value};

/// Returns the current version of the persdb-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
