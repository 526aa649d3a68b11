//! Domain registry describing every REST resource.
//!
//! The registry is built once (usually from a JSON document, see
//! [`crate::config::load_registry`]) and then only read. Helpers take it by
//! shared reference instead of reaching for global state.
//!
//! # Document format
//!
//! ```json
//! {
//!   "settings": { "id_field": "_id", "if_match": true },
//!   "domain": {
//!     "invoices": {
//!       "allowed_filters": ["number", "people"],
//!       "schema": {
//!         "number": { "type": "integer" },
//!         "people": {
//!           "type": "objectid",
//!           "data_relation": { "resource": "people", "embeddable": true }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```

use crate::config::Settings;
use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Marker that opens filtering to every field.
pub const WILDCARD: &str = "*";

/// Relation from a schema field to another resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRelation {
    pub resource: String,
    /// Whether clients may have the related record expanded inline.
    #[serde(default)]
    pub embeddable: bool,
    /// Field of the related resource the relation points at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Description of one schema field.
///
/// Only `type` and `data_relation` are interpreted; other validation rules
/// are kept verbatim in `rules`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_relation: Option<DataRelation>,
    #[serde(flatten)]
    pub rules: Map<String, Value>,
}

impl FieldDescriptor {
    pub fn typed(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    pub fn relation(resource: impl Into<String>, embeddable: bool) -> Self {
        Self {
            kind: Some("objectid".to_string()),
            data_relation: Some(DataRelation {
                resource: resource.into(),
                embeddable,
                field: None,
            }),
            rules: Map::new(),
        }
    }

    pub fn is_relation(&self) -> bool {
        self.data_relation.is_some()
    }
}

/// Fields a resource may be filtered on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum AllowedFilters {
    /// The `*` wildcard: any field.
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl AllowedFilters {
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from(fields.into_iter().map(Into::into).collect::<Vec<String>>())
    }

    pub fn allows(&self, field: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(fields) => fields.contains(field),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<Vec<String>> for AllowedFilters {
    fn from(fields: Vec<String>) -> Self {
        if fields.iter().any(|f| f == WILDCARD) {
            Self::All
        } else {
            Self::Only(fields.into_iter().collect())
        }
    }
}

impl From<AllowedFilters> for Vec<String> {
    fn from(allowed: AllowedFilters) -> Self {
        match allowed {
            AllowedFilters::All => vec![WILDCARD.to_string()],
            AllowedFilters::Only(fields) => fields.into_iter().collect(),
        }
    }
}

/// Configuration of a single resource.
///
/// Bookkeeping and identity field names left unset fall back to [`Settings`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceDescriptor {
    pub schema: BTreeMap<String, FieldDescriptor>,
    pub allowed_filters: AllowedFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,
}

impl ResourceDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.schema.insert(name.into(), descriptor);
        self
    }

    pub fn allowed_filters(mut self, allowed: AllowedFilters) -> Self {
        self.allowed_filters = allowed;
        self
    }

    pub fn id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = Some(id_field.into());
        self
    }

    /// Schema fields that carry no relation, sorted by name.
    pub fn leaf_fields(&self) -> Vec<String> {
        self.schema
            .iter()
            .filter(|(_, descriptor)| !descriptor.is_relation())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Effective bookkeeping field names for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bookkeeping<'a> {
    pub last_updated: &'a str,
    pub date_created: &'a str,
    /// `None` when if-match support is disabled.
    pub etag: Option<&'a str>,
}

impl<'a> Bookkeeping<'a> {
    pub fn iter(self) -> impl Iterator<Item = &'a str> {
        [Some(self.last_updated), Some(self.date_created), self.etag]
            .into_iter()
            .flatten()
    }
}

fn pick<'a>(own: Option<&'a Option<String>>, global: &'a str) -> &'a str {
    own.and_then(|v| v.as_deref()).unwrap_or(global)
}

/// Read-only registry of resources keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainRegistry {
    #[serde(default)]
    settings: Settings,
    #[serde(default, rename = "domain")]
    resources: BTreeMap<String, ResourceDescriptor>,
}

impl DomainRegistry {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            resources: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a resource.
    pub fn with_resource(mut self, name: impl Into<String>, descriptor: ResourceDescriptor) -> Self {
        self.resources.insert(name.into(), descriptor);
        self
    }

    pub fn from_value(document: Value) -> Result<Self> {
        Ok(serde_json::from_value(document)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(name)
    }

    /// Like [`Self::resource`] but an unknown name is an error.
    pub fn require_resource(&self, name: &str) -> Result<&ResourceDescriptor> {
        self.resource(name)
            .ok_or_else(|| Error::unknown_resource(name))
    }

    pub fn field(&self, resource: &str, field: &str) -> Option<&FieldDescriptor> {
        self.resource(resource)?.schema.get(field)
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Bookkeeping field names for `resource`, honouring per-resource overrides.
    ///
    /// Unknown resources get the global settings.
    pub fn bookkeeping(&self, resource: &str) -> Bookkeeping<'_> {
        let descriptor = self.resource(resource);
        Bookkeeping {
            last_updated: pick(
                descriptor.map(|d| &d.last_updated),
                &self.settings.last_updated,
            ),
            date_created: pick(
                descriptor.map(|d| &d.date_created),
                &self.settings.date_created,
            ),
            etag: self
                .settings
                .if_match
                .then(|| pick(descriptor.map(|d| &d.etag), &self.settings.etag)),
        }
    }

    /// Identity field of `resource`, or the global one.
    pub fn id_field(&self, resource: &str) -> &str {
        self.resource(resource)
            .and_then(|d| d.id_field.as_deref())
            .unwrap_or(&self.settings.id_field)
    }

    /// `(resource, field, target)` for every relation whose target resource is not declared.
    pub fn dangling_relations(&self) -> Vec<(String, String, String)> {
        self.resources
            .iter()
            .flat_map(|(resource, descriptor)| {
                descriptor.schema.iter().filter_map(move |(field, fd)| {
                    let relation = fd.data_relation.as_ref()?;
                    (!self.resources.contains_key(&relation.resource)).then(|| {
                        (
                            resource.clone(),
                            field.clone(),
                            relation.resource.clone(),
                        )
                    })
                })
            })
            .collect()
    }
}
