//! Projection of mapped objects into plain JSON mappings.
//!
//! Embeddable relations (per the resource schema) are expanded into nested
//! mappings; any other relation is replaced by the identity of the related
//! record. Bookkeeping fields are always requested.

use crate::domain::mapped::{Attribute, MappedObject};
use crate::domain::registry::DomainRegistry;

use serde_json::{Map, Value};

/// Embedding information resolved for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignResource {
    /// Related resource, when the field is an embeddable relation.
    pub resource: Option<String>,
    /// Non-relational fields of the related resource.
    pub fields: Vec<String>,
}

impl ForeignResource {
    /// No relation information.
    pub fn none() -> Self {
        Self::default()
    }

    /// True when related records should be expanded inline.
    pub fn is_embeddable(&self) -> bool {
        self.resource.is_some() && !self.fields.is_empty()
    }
}

/// Resolves whether `field` of `resource` is an embeddable relation.
///
/// Unknown resources, unknown fields, plain fields and non-embeddable
/// relations all yield [`ForeignResource::none`]. The requested field list is
/// not consulted: only whole relations are embedded, never dotted sub-paths.
pub fn lookup_foreign_resource<S: AsRef<str>>(
    registry: &DomainRegistry,
    field: &str,
    _fields: &[S],
    resource: &str,
) -> ForeignResource {
    let Some(relation) = registry
        .field(resource, field)
        .and_then(|f| f.data_relation.as_ref())
    else {
        return ForeignResource::none();
    };

    if !relation.embeddable {
        return ForeignResource::none();
    }

    let Some(foreign) = registry.resource(&relation.resource) else {
        tracing::trace!(
            resource,
            field,
            target = %relation.resource,
            "Embeddable relation points at an unknown resource"
        );
        return ForeignResource::none();
    };

    ForeignResource {
        resource: Some(relation.resource.clone()),
        fields: foreign.leaf_fields(),
    }
}

/// Projects `object` into a mapping with one entry per requested field.
///
/// The last-updated and creation fields (and the etag field when if-match is
/// enabled) are appended to the request when missing. Fields the object does
/// not have are skipped. The caller's slice is left untouched.
pub fn object_to_dict<S: AsRef<str>>(
    registry: &DomainRegistry,
    object: &dyn MappedObject,
    fields: &[S],
    resource: &str,
) -> Map<String, Value> {
    let mut requested: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
    for bookkeeping in registry.bookkeeping(resource).iter() {
        if !requested.contains(&bookkeeping) {
            requested.push(bookkeeping);
        }
    }

    let mut result = Map::new();

    for field in &requested {
        let foreign = lookup_foreign_resource(registry, field, &requested, resource);

        let Some(attribute) = object.attribute(field) else {
            tracing::trace!(resource, field, "Requested field missing on instance, skipped");
            continue;
        };

        let id_field = related_id_field(registry, resource, field);
        match project_attribute(registry, attribute, &foreign, id_field) {
            Some(value) => {
                result.insert((*field).to_string(), value);
            }
            None => {
                tracing::debug!(
                    resource,
                    field,
                    id_field,
                    "Related instance has no identity, field skipped"
                );
            }
        }
    }

    result
}

/// Identity field used when a relation of `resource.field` is not embedded.
fn related_id_field<'a>(registry: &'a DomainRegistry, resource: &str, field: &str) -> &'a str {
    match registry
        .field(resource, field)
        .and_then(|f| f.data_relation.as_ref())
    {
        Some(relation) => relation
            .field
            .as_deref()
            .unwrap_or_else(|| registry.id_field(&relation.resource)),
        None => registry.settings().id_field.as_str(),
    }
}

fn project_attribute(
    registry: &DomainRegistry,
    attribute: Attribute,
    foreign: &ForeignResource,
    id_field: &str,
) -> Option<Value> {
    match attribute {
        Attribute::Scalar(value) => Some(value),
        Attribute::Related(related) => project_related(registry, related.as_ref(), foreign, id_field),
        Attribute::RelatedList(items) => items
            .iter()
            .map(|item| project_related(registry, item.as_ref(), foreign, id_field))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        Attribute::Bound(bound) => project_attribute(registry, bound.detach(), foreign, id_field),
    }
}

fn project_related(
    registry: &DomainRegistry,
    related: &dyn MappedObject,
    foreign: &ForeignResource,
    id_field: &str,
) -> Option<Value> {
    match &foreign.resource {
        Some(resource) if !foreign.fields.is_empty() => Some(Value::Object(object_to_dict(
            registry,
            related,
            &foreign.fields,
            resource,
        ))),
        _ => related.identity(id_field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::domain::mapped::{MockMappedObject, Record};
    use crate::domain::registry::{DataRelation, FieldDescriptor, ResourceDescriptor};
    use serde_json::json;

    fn registry() -> DomainRegistry {
        DomainRegistry::default()
            .with_resource(
                "invoices",
                ResourceDescriptor::new()
                    .field("number", FieldDescriptor::typed("integer"))
                    .field("people", FieldDescriptor::relation("people", true))
                    .field("vendor", FieldDescriptor::relation("vendors", true)),
            )
            .with_resource(
                "people",
                ResourceDescriptor::new()
                    .field("firstname", FieldDescriptor::typed("string"))
                    .field("lastname", FieldDescriptor::typed("string"))
                    .field("invoices", FieldDescriptor::relation("invoices", false)),
            )
    }

    #[test]
    fn test_lookup_embeddable_relation() {
        let foreign = lookup_foreign_resource(&registry(), "people", &["people"], "invoices");
        assert_eq!(foreign.resource.as_deref(), Some("people"));
        assert_eq!(foreign.fields, vec!["firstname", "lastname"]);
        assert!(foreign.is_embeddable());
    }

    #[test]
    fn test_lookup_misses_are_silent() {
        let registry = registry();
        let none = ForeignResource::none();
        let empty: [&str; 0] = [];

        assert_eq!(lookup_foreign_resource(&registry, "invoices", &empty, "people"), none);
        assert_eq!(lookup_foreign_resource(&registry, "number", &empty, "invoices"), none);
        assert_eq!(lookup_foreign_resource(&registry, "missing", &empty, "invoices"), none);
        assert_eq!(lookup_foreign_resource(&registry, "people", &empty, "unknown"), none);
        // embeddable but the target resource is not declared
        assert_eq!(lookup_foreign_resource(&registry, "vendor", &empty, "invoices"), none);
    }

    #[test]
    fn test_bookkeeping_fields_requested_once() {
        let mut object = MockMappedObject::new();
        object
            .expect_attribute()
            .withf(|name| name == "_updated")
            .times(1)
            .returning(|_| Some(Attribute::scalar("Tue, 02 Apr 2013 10:29:13 GMT")));
        object
            .expect_attribute()
            .withf(|name| name == "_created")
            .times(1)
            .returning(|_| Some(Attribute::scalar("Mon, 01 Apr 2013 10:29:13 GMT")));
        object
            .expect_attribute()
            .withf(|name| name == "_etag")
            .times(1)
            .returning(|_| None);
        object
            .expect_attribute()
            .withf(|name| name == "number")
            .times(1)
            .returning(|_| Some(Attribute::scalar(7)));

        let result = object_to_dict(&registry(), &object, &["number", "_updated"], "invoices");

        assert_eq!(
            Value::Object(result),
            json!({
                "number": 7,
                "_updated": "Tue, 02 Apr 2013 10:29:13 GMT",
                "_created": "Mon, 01 Apr 2013 10:29:13 GMT"
            })
        );
    }

    #[test]
    fn test_etag_not_requested_without_if_match() {
        let mut registry = registry();
        registry.set_settings(Settings {
            if_match: false,
            ..Settings::default()
        });

        let mut object = MockMappedObject::new();
        object
            .expect_attribute()
            .withf(|name| name == "_etag")
            .never();
        object.expect_attribute().returning(|_| None);

        assert!(object_to_dict(&registry, &object, &["number"], "invoices").is_empty());
    }

    #[test]
    fn test_related_without_identity_is_skipped() {
        let person = Record::new()
            .with("firstname", "George")
            .with_related_list("invoices", vec![Record::new().with("number", 2)]);

        let result = object_to_dict(&registry(), &person, &["firstname", "invoices"], "people");
        assert_eq!(Value::Object(result), json!({"firstname": "George"}));
    }

    #[test]
    fn test_relation_field_override_used_for_identity() {
        let registry = registry().with_resource(
            "roles",
            ResourceDescriptor::new().field(
                "owner",
                FieldDescriptor {
                    data_relation: Some(DataRelation {
                        resource: "people".to_string(),
                        embeddable: false,
                        field: Some("login".to_string()),
                    }),
                    ..FieldDescriptor::default()
                },
            ),
        );

        let role = Record::new().with_related("owner", Record::new().with("_id", 1).with("login", "gw"));
        let result = object_to_dict(&registry, &role, &["owner"], "roles");
        assert_eq!(result.get("owner"), Some(&json!("gw")));
    }
}
