//! Pure configuration engine: scope matching, content hashing, grouping
//! and ungrouping. Everything here is synchronous, CPU-bound and free of
//! shared state; all maps and sets are call-scoped.

pub mod grouping;
pub mod hasher;
pub mod matcher;
pub mod ungrouping;

pub use grouping::group_records;
pub use hasher::{content_hash, ContentHash};
pub use matcher::{bounded_records, is_bound, scope_is_bound};
pub use ungrouping::ungroup_records;
