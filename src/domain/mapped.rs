//! Mapped objects: the ORM side of a projection.
//!
//! An ORM row is seen through [`MappedObject`], which hands out each named
//! attribute already classified as an [`Attribute`]. Values that are only
//! valid while the ORM session is open (association proxies and similar)
//! are wrapped in [`Attribute::Bound`] and must be detached before use.
//!
//! [`Record`] is an owned, in-memory implementation used when the row data
//! comes from JSON rather than from a live session.

use crate::domain::registry::DomainRegistry;
use crate::error::{Error, Result};

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An object whose attributes mirror a row of a relational schema.
#[cfg_attr(test, mockall::automock)]
pub trait MappedObject: Send + Sync {
    /// Reads an attribute.
    ///
    /// Returns `None` when the instance has no attribute with that name.
    fn attribute(&self, name: &str) -> Option<Attribute>;

    /// Primary key value stored under `id_field`.
    ///
    /// Returns `None` when the instance has no scalar attribute with that name.
    fn identity(&self, id_field: &str) -> Option<Value> {
        match self.attribute(id_field)?.detach() {
            Attribute::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

/// A value whose backing storage belongs to an ORM session.
///
/// Implementors copy themselves out so the result stays valid after the
/// session boundary closes.
pub trait SessionBound: Send + Sync {
    fn detach(&self) -> Attribute;
}

/// An attribute value, classified once when read.
pub enum Attribute {
    Scalar(Value),
    Related(Arc<dyn MappedObject>),
    RelatedList(Vec<Arc<dyn MappedObject>>),
    Bound(Box<dyn SessionBound>),
}

impl Attribute {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn related(object: impl MappedObject + 'static) -> Self {
        Self::Related(Arc::new(object))
    }

    pub fn related_list<I, T>(objects: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: MappedObject + 'static,
    {
        Self::RelatedList(
            objects
                .into_iter()
                .map(|o| Arc::new(o) as Arc<dyn MappedObject>)
                .collect(),
        )
    }

    pub fn bound(value: impl SessionBound + 'static) -> Self {
        Self::Bound(Box::new(value))
    }

    /// Detaches session-bound values until an owned classification remains.
    pub fn detach(self) -> Self {
        let mut current = self;
        while let Self::Bound(bound) = current {
            current = bound.detach();
        }
        current
    }
}

impl From<Value> for Attribute {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
            Self::Related(_) => f.write_str("Related(..)"),
            Self::RelatedList(items) => write!(f, "RelatedList(len={})", items.len()),
            Self::Bound(_) => f.write_str("Bound(..)"),
        }
    }
}

/// Stored value of a [`Record`] attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordField {
    Scalar(Value),
    Related(Arc<Record>),
    RelatedList(Vec<Arc<Record>>),
}

/// Owned mapped object backed by plain values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, RecordField>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .insert(name.into(), RecordField::Scalar(value.into()));
        self
    }

    pub fn with_related(mut self, name: impl Into<String>, related: Record) -> Self {
        self.fields
            .insert(name.into(), RecordField::Related(Arc::new(related)));
        self
    }

    pub fn with_related_list<I>(mut self, name: impl Into<String>, related: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        self.fields.insert(
            name.into(),
            RecordField::RelatedList(related.into_iter().map(Arc::new).collect()),
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&RecordField> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds a record for `resource` from a JSON object.
    ///
    /// Values under relation fields become related records: an object maps to
    /// a single related record, an array of objects to a related list. Any
    /// other value (a bare foreign key, for instance) stays scalar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] if `document` (or a nested related
    /// document) is not an object.
    pub fn from_json(registry: &DomainRegistry, resource: &str, document: &Value) -> Result<Self> {
        let Value::Object(map) = document else {
            return Err(Error::invalid_record(format!(
                "expected an object for resource '{resource}'"
            )));
        };
        Self::from_map(registry, resource, map)
    }

    fn from_map(registry: &DomainRegistry, resource: &str, map: &Map<String, Value>) -> Result<Self> {
        let mut record = Self::new();

        for (name, value) in map {
            let target = registry
                .field(resource, name)
                .and_then(|f| f.data_relation.as_ref())
                .map(|r| r.resource.as_str());

            let field = match (target, value) {
                (Some(target), Value::Object(nested)) => {
                    RecordField::Related(Arc::new(Self::from_map(registry, target, nested)?))
                }
                (Some(target), Value::Array(items)) if items.iter().all(Value::is_object) => {
                    let related = items
                        .iter()
                        .map(|item| Self::from_json(registry, target, item).map(Arc::new))
                        .collect::<Result<Vec<_>>>()?;
                    RecordField::RelatedList(related)
                }
                _ => RecordField::Scalar(value.clone()),
            };

            record.fields.insert(name.clone(), field);
        }

        Ok(record)
    }
}

impl MappedObject for Record {
    fn attribute(&self, name: &str) -> Option<Attribute> {
        let attribute = match self.fields.get(name)? {
            RecordField::Scalar(value) => Attribute::Scalar(value.clone()),
            RecordField::Related(related) => {
                Attribute::Related(Arc::clone(related) as Arc<dyn MappedObject>)
            }
            RecordField::RelatedList(items) => Attribute::RelatedList(
                items
                    .iter()
                    .map(|r| Arc::clone(r) as Arc<dyn MappedObject>)
                    .collect(),
            ),
        };
        Some(attribute)
    }
}
