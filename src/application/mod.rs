//! Application layer: the projection and query-assist helpers.
//!
//! Every helper is a plain function over its inputs and a borrowed
//! [`crate::domain::registry::DomainRegistry`].
//!
//! # Available Helpers
//!
//! - [`filters::validate_filters`] - Filter allow-list enforcement
//! - [`projection::lookup_foreign_resource`] - Embeddable relation lookup
//! - [`projection::object_to_dict`] - Mapped object to JSON mapping
//! - [`sort::extract_sort_arg`] - `sort` parameter parsing

pub mod filters;
pub mod projection;
pub mod sort;

pub use filters::validate_filters;
pub use projection::{ForeignResource, lookup_foreign_resource, object_to_dict};
pub use sort::{Literal, SortArg, SortKey, SortSource, extract_sort_arg, parse_literal};
