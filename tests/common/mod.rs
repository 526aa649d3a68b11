#![allow(dead_code)]

use orm_bridge::domain::mapped::Record;
use orm_bridge::domain::registry::DomainRegistry;
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn domain_document() -> Value {
    json!({
        "settings": {
            "id_field": "_id",
            "if_match": true
        },
        "domain": {
            "people": {
                "allowed_filters": ["*"],
                "schema": {
                    "firstname": {"type": "string", "maxlength": 20},
                    "lastname": {"type": "string"},
                    "prog": {"type": "integer"},
                    "invoices": {
                        "type": "list",
                        "data_relation": {"resource": "invoices", "embeddable": false}
                    }
                }
            },
            "invoices": {
                "allowed_filters": ["number", "people"],
                "schema": {
                    "number": {"type": "integer"},
                    "people": {
                        "type": "objectid",
                        "data_relation": {"resource": "people", "embeddable": true}
                    }
                }
            },
            "roles": {
                "allowed_filters": [],
                "id_field": "role_id",
                "schema": {
                    "name": {"type": "string"},
                    "owner": {
                        "type": "objectid",
                        "data_relation": {"resource": "people", "field": "lastname"}
                    },
                    "vendor": {
                        "type": "objectid",
                        "data_relation": {"resource": "vendors", "embeddable": true}
                    }
                }
            }
        }
    })
}

pub fn registry() -> DomainRegistry {
    DomainRegistry::from_value(domain_document()).unwrap()
}

pub fn george() -> Record {
    Record::new()
        .with("_id", 1)
        .with("firstname", "George")
        .with("lastname", "Washington")
        .with("prog", 1)
        .with("_created", "Mon, 01 Apr 2013 10:29:13 GMT")
        .with("_updated", "Tue, 02 Apr 2013 10:29:13 GMT")
        .with("_etag", "7776cdb01f44354af8bfa4506a08f8e6")
}

pub fn invoice(number: i64, owner: Record) -> Record {
    Record::new()
        .with("_id", number * 100)
        .with("number", number)
        .with_related("people", owner)
        .with("_created", "Wed, 03 Apr 2013 10:29:13 GMT")
        .with("_updated", "Wed, 03 Apr 2013 10:29:13 GMT")
        .with("_etag", "e2a3bd8b0b6c4d65d0a09b2a79a8b2f1")
}

static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

/// Writes `document` to a fresh file under the system temp directory.
pub fn write_temp_json(name: &str, document: &Value) -> PathBuf {
    let n = NEXT_FILE.fetch_add(1, Ordering::SeqCst);
    let path = env::temp_dir().join(format!("orm-bridge-{}-{n}-{name}.json", std::process::id()));
    fs::write(&path, serde_json::to_string_pretty(document).unwrap()).unwrap();
    path
}
