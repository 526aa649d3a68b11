//! Request-facing types consumed from the REST layer.
//!
//! - [`request`] - Query parameters (`where`, `sort`, `projection`, paging)

pub mod request;

pub use request::ParsedRequest;
