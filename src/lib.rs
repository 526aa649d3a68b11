//! # ORM Bridge
//!
//! Glue between a REST framework's resources and ORM-mapped objects.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Domain registry, mapped objects and filter clauses
//! - **Application Layer** ([`application`]) - Projection, filter validation and sort parsing
//! - **API Layer** ([`api`]) - Query parameters as received by the REST layer
//!
//! ## Features
//!
//! - Projection of mapped objects into JSON mappings with embedded relations
//! - Per-resource filter allow-lists
//! - `sort` parsing for both `name,-age` and literal syntax
//! - Deep merging of configuration documents
//!
//! ## Quick Start
//!
//! ```ignore
//! use orm_bridge::prelude::*;
//!
//! let registry = DomainRegistry::from_json_str(include_str!("domain.json"))?;
//! let person = Record::new().with("firstname", "George").with("_id", 1);
//!
//! let document = object_to_dict(&registry, &person, &["firstname"], "people");
//! let sort = extract_sort_arg("firstname,-lastname")?;
//! ```
//!
//! ## Configuration
//!
//! Bookkeeping field names are read from the registry document and can be
//! overridden from the environment. See [`config`].

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod utils;

pub use error::{Error, Result};

/// Commonly used types for external consumers.
pub mod prelude {
    pub use crate::api::ParsedRequest;
    pub use crate::application::{
        ForeignResource, SortArg, SortKey, SortSource, extract_sort_arg, lookup_foreign_resource,
        object_to_dict, validate_filters,
    };
    pub use crate::config::Settings;
    pub use crate::domain::filter::{CompareOp, FilterClause};
    pub use crate::domain::mapped::{Attribute, MappedObject, Record, SessionBound};
    pub use crate::domain::registry::{
        AllowedFilters, DataRelation, DomainRegistry, FieldDescriptor, ResourceDescriptor,
    };
    pub use crate::error::{Error, Result};
    pub use crate::utils::dict_update;
}
