//! Filter allow-list enforcement.

use crate::domain::filter::FilterClause;
use crate::domain::registry::DomainRegistry;
use crate::error::Result;

/// Checks `clauses` against the allow-list of `resource`.
///
/// # Returns
///
/// - `Ok(None)` if every clause is allowed (always the case for a `*` allow-list)
/// - `Ok(Some(message))` naming the first clause whose field is not allowed;
///   later clauses are not inspected
///
/// # Errors
///
/// Returns [`crate::Error::UnknownResource`] if `resource` is not in the registry.
pub fn validate_filters(
    registry: &DomainRegistry,
    clauses: &[FilterClause],
    resource: &str,
) -> Result<Option<String>> {
    let allowed = &registry.require_resource(resource)?.allowed_filters;

    if allowed.is_wildcard() {
        return Ok(None);
    }

    let rejected = clauses.iter().find(|clause| !allowed.allows(&clause.field));

    Ok(rejected.map(|clause| {
        tracing::debug!(resource, field = %clause.field, "Filter rejected by allow-list");
        format!("filter on '{}' not allowed", clause.field)
    }))
}
