//! Small helpers shared across layers.
//!
//! - [`merge`] - Recursive merging of nested JSON mappings

pub mod merge;

pub use merge::{dict_update, dict_update_value};
