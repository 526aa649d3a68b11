//! Query parameters of a resource read request.

use crate::application::sort::SortSource;
use crate::domain::filter::FilterClause;
use crate::domain::registry::DomainRegistry;
use crate::error::{Error, Result};

use serde::Deserialize;
use serde_json::Value;
use serde_with::{NoneAsEmptyString, serde_as};

/// Raw query parameters as received by the REST layer.
///
/// Empty parameters (`?sort=`) deserialize as absent.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedRequest {
    /// JSON `where` document, e.g. `{"number": {"$gt": 10}}`.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,

    /// `name,-age` or a literal such as `[("name", -1)]`.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub sort: Option<String>,

    /// JSON projection document, e.g. `{"firstname": 1, "lastname": 1}`.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub projection: Option<String>,
}

impl ParsedRequest {
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_where(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = Some(where_clause.into());
        self
    }

    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = Some(projection.into());
        self
    }

    /// Filter clauses of the `where` parameter, empty when absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWhere`] if the parameter is not a valid document.
    pub fn filter_clauses(&self) -> Result<Vec<FilterClause>> {
        match self.where_clause.as_deref() {
            None | Some("") => Ok(Vec::new()),
            Some(raw) => FilterClause::parse_where_str(raw),
        }
    }

    /// Fields to project for `resource`.
    ///
    /// Without a `projection` parameter every schema field is returned.
    /// Otherwise the fields whose value is truthy (`1` or `true`) are
    /// returned in document order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResource`] when no projection is given and
    /// `resource` is not declared, [`Error::Json`] for malformed JSON and
    /// [`Error::InvalidProjection`] when the document is not an object.
    pub fn projected_fields(&self, registry: &DomainRegistry, resource: &str) -> Result<Vec<String>> {
        let raw = match self.projection.as_deref() {
            None | Some("") => {
                let descriptor = registry.require_resource(resource)?;
                return Ok(descriptor.schema.keys().cloned().collect());
            }
            Some(raw) => raw,
        };

        let Value::Object(document) = serde_json::from_str::<Value>(raw)? else {
            return Err(Error::invalid_projection("expected a JSON object"));
        };

        Ok(document
            .into_iter()
            .filter(|(_, v)| matches!(v, Value::Bool(true)) || v.as_i64() == Some(1))
            .map(|(k, _)| k)
            .collect())
    }
}

impl SortSource for ParsedRequest {
    fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }
}
