//! Table-level transformations.

mod dedup;

pub use dedup::drop_duplicates;
