mod common;

use orm_bridge::config::load_registry;
use orm_bridge::domain::registry::{AllowedFilters, Bookkeeping};
use orm_bridge::utils::dict_update;
use serde_json::json;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;

const SETTINGS_VARS: [&str; 5] = [
    "LAST_UPDATED",
    "DATE_CREATED",
    "ETAG",
    "ID_FIELD",
    "IF_MATCH",
];

fn clear_env() {
    // SAFETY: Tests touching the environment are run serially
    unsafe {
        for var in SETTINGS_VARS {
            env::remove_var(var);
        }
    }
}

#[test]
#[serial]
fn test_load_registry_from_file() {
    clear_env();
    let path = common::write_temp_json("domain", &common::domain_document());

    let registry = load_registry::<PathBuf>(&path, &[]).unwrap();

    assert_eq!(registry.len(), 3);
    assert_eq!(
        registry.resource_names().collect::<Vec<_>>(),
        vec!["invoices", "people", "roles"]
    );
    assert_eq!(
        registry.resource("invoices").unwrap().allowed_filters,
        AllowedFilters::only(["number", "people"])
    );
    assert_eq!(registry.id_field("roles"), "role_id");
    assert_eq!(registry.id_field("people"), "_id");
    // unknown validation rules are kept
    assert_eq!(
        registry.field("people", "firstname").unwrap().rules.get("maxlength"),
        Some(&json!(20))
    );

    fs::remove_file(path).ok();
}

#[test]
#[serial]
fn test_overrides_are_deep_merged_in_order() {
    clear_env();
    let base = common::write_temp_json("base", &common::domain_document());
    let first = common::write_temp_json(
        "first",
        &json!({
            "settings": {"etag": "_version"},
            "domain": {"people": {"allowed_filters": ["lastname"]}}
        }),
    );
    let second = common::write_temp_json(
        "second",
        &json!({"domain": {"people": {"allowed_filters": ["firstname"]}}}),
    );

    let registry = load_registry(&base, &[&first, &second]).unwrap();

    let people = registry.resource("people").unwrap();
    assert_eq!(people.allowed_filters, AllowedFilters::only(["firstname"]));
    // merged, not replaced
    assert_eq!(people.schema.len(), 4);
    assert_eq!(registry.settings().etag, "_version");
    assert_eq!(registry.settings().id_field, "_id");

    for path in [base, first, second] {
        fs::remove_file(path).ok();
    }
}

#[test]
#[serial]
fn test_environment_wins_over_document_settings() {
    clear_env();
    // SAFETY: Tests are run serially due to #[serial], so no concurrent access
    unsafe {
        env::set_var("LAST_UPDATED", "modified_at");
        env::set_var("IF_MATCH", "false");
    }
    let path = common::write_temp_json("env", &common::domain_document());

    let registry = load_registry::<PathBuf>(&path, &[]).unwrap();

    assert_eq!(
        registry.bookkeeping("people"),
        Bookkeeping {
            last_updated: "modified_at",
            date_created: "_created",
            etag: None,
        }
    );

    clear_env();
    fs::remove_file(path).ok();
}

#[test]
#[serial]
fn test_invalid_settings_are_rejected() {
    clear_env();
    // SAFETY: Tests are run serially
    unsafe {
        env::set_var("ETAG", "_updated");
    }
    let path = common::write_temp_json("dup", &common::domain_document());

    assert!(load_registry::<PathBuf>(&path, &[]).is_err());

    clear_env();
    fs::remove_file(path).ok();
}

#[test]
#[serial]
fn test_missing_or_malformed_files() {
    let missing = env::temp_dir().join("orm-bridge-does-not-exist.json");
    assert!(load_registry::<PathBuf>(&missing, &[]).is_err());

    let malformed = common::write_temp_json("malformed", &json!({"domain": {"people": {"schema": []}}}));
    assert!(load_registry::<PathBuf>(&malformed, &[]).is_err());

    fs::remove_file(malformed).ok();
}

#[test]
fn test_dict_update_on_settings_documents() {
    let mut settings = json!({"DOMAIN": {"people": {"item_title": "person"}}, "PAGINATION": true})
        .as_object()
        .cloned()
        .unwrap();
    let local = json!({"DOMAIN": {"people": {"url": "persons"}}, "PAGINATION": false})
        .as_object()
        .cloned()
        .unwrap();

    dict_update(&mut settings, &local);

    assert_eq!(
        serde_json::Value::Object(settings),
        json!({
            "DOMAIN": {"people": {"item_title": "person", "url": "persons"}},
            "PAGINATION": false
        })
    );
}
