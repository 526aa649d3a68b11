//! Domain layer: resource configuration and the ORM-facing abstractions.
//!
//! # Architecture
//!
//! - [`registry`] - Resources, schemas, allow-lists and bookkeeping field names
//! - [`mapped`] - Mapped objects, session-bound values and the in-memory [`mapped::Record`]
//! - [`filter`] - Filter clauses parsed from a `where` document
//!
//! # Design Principles
//!
//! - The registry is immutable once built and passed explicitly
//! - ORM rows are only seen through the [`mapped::MappedObject`] trait
//! - Helpers operating on these types live in [`crate::application`]

pub mod filter;
pub mod mapped;
pub mod registry;
