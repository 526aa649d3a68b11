//! Bookkeeping settings and domain registry loading.
//!
//! Settings name the fields every projection carries (last-updated, creation
//! date, etag) plus the identity field used for non-embedded relations.
//! They can be given in the registry document itself or overridden from the
//! environment.
//!
//! ## Environment Variables
//!
//! - `LAST_UPDATED` - last-modified field name (default: `_updated`)
//! - `DATE_CREATED` - creation timestamp field name (default: `_created`)
//! - `ETAG` - etag field name (default: `_etag`)
//! - `ID_FIELD` - identity field of related records (default: `_id`)
//! - `IF_MATCH` - include the etag field in projections (default: `true`)

use crate::domain::registry::DomainRegistry;
use crate::utils::merge::dict_update_value;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_LAST_UPDATED: &str = "_updated";
pub const DEFAULT_DATE_CREATED: &str = "_created";
pub const DEFAULT_ETAG: &str = "_etag";
pub const DEFAULT_ID_FIELD: &str = "_id";

/// Process-wide settings shared by every resource in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub last_updated: String,
    pub date_created: String,
    pub etag: String,
    pub id_field: String,
    /// When false the etag field is not forced into projections.
    pub if_match: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_updated: DEFAULT_LAST_UPDATED.to_string(),
            date_created: DEFAULT_DATE_CREATED.to_string(),
            etag: DEFAULT_ETAG.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            if_match: true,
        }
    }
}

impl Settings {
    /// Loads settings from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies any environment overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("LAST_UPDATED") {
            self.last_updated = v;
        }
        if let Ok(v) = env::var("DATE_CREATED") {
            self.date_created = v;
        }
        if let Ok(v) = env::var("ETAG") {
            self.etag = v;
        }
        if let Ok(v) = env::var("ID_FIELD") {
            self.id_field = v;
        }
        if let Ok(v) = env::var("IF_MATCH") {
            self.if_match = v.eq_ignore_ascii_case("true") || v == "1";
        }
        self
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - any field name is empty
    /// - two bookkeeping fields share the same name
    pub fn validate(&self) -> Result<()> {
        for (var, value) in [
            ("LAST_UPDATED", &self.last_updated),
            ("DATE_CREATED", &self.date_created),
            ("ETAG", &self.etag),
            ("ID_FIELD", &self.id_field),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{var} must not be empty");
            }
        }

        if self.last_updated == self.date_created
            || self.last_updated == self.etag
            || self.date_created == self.etag
        {
            anyhow::bail!(
                "bookkeeping fields must be distinct, got '{}', '{}', '{}'",
                self.last_updated,
                self.date_created,
                self.etag
            );
        }

        Ok(())
    }

    /// Prints a settings summary.
    pub fn print_summary(&self) {
        tracing::info!("Settings loaded:");
        tracing::info!("  Last updated field: {}", self.last_updated);
        tracing::info!("  Date created field: {}", self.date_created);
        tracing::info!("  Etag field: {} (if-match: {})", self.etag, self.if_match);
        tracing::info!("  Id field: {}", self.id_field);
    }
}

/// Loads and validates settings from environment variables.
///
/// # Note
///
/// Expects `.env` to be already loaded (e.g. via `dotenvy::dotenv()`).
pub fn load_from_env() -> Result<Settings> {
    let settings = Settings::from_env();
    settings.validate()?;
    Ok(settings)
}

/// Reads a JSON document from disk.
pub fn read_json(path: &Path) -> Result<Value> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Loads a domain registry from `path`, deep-merging each override file over it in order.
///
/// Environment settings win over the `settings` section of the merged document.
///
/// # Errors
///
/// Returns an error if a file cannot be read or parsed, or if the resulting
/// settings fail validation.
pub fn load_registry<P: AsRef<Path>>(path: &Path, overrides: &[P]) -> Result<DomainRegistry> {
    let mut document = read_json(path)?;

    for override_path in overrides {
        let update = read_json(override_path.as_ref())?;
        dict_update_value(&mut document, &update);
        tracing::debug!(path = %override_path.as_ref().display(), "Applied registry override");
    }

    let mut registry = DomainRegistry::from_value(document)
        .with_context(|| format!("Invalid domain registry in {}", path.display()))?;

    let settings = registry.settings().clone().with_env_overrides();
    settings.validate()?;
    registry.set_settings(settings);

    for (resource, field, target) in registry.dangling_relations() {
        tracing::warn!(
            resource = %resource,
            field = %field,
            target = %target,
            "Relation points at an unknown resource; it will never be embedded"
        );
    }

    tracing::debug!(resources = registry.len(), "Domain registry loaded");
    Ok(registry)
}
