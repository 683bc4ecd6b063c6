//! Helpers shared by the entity services

use crate::domain::error::RegistryError;
use crate::domain::naming::prefix_when_owned;
use crate::domain::record::Record;
use crate::domain::repository::{ListOptions, Pagination, RecordRepository};

/// Resolve a single record by name or external id.
///
/// Exactly one of `name` and `external_id` must be supplied; `name` is the
/// storage name (scope-prefixed where the entity is owned). Zero matches
/// and more than one match both fail with NotFound.
pub(crate) async fn find_one(
    repo: &dyn RecordRepository,
    kind: &str,
    type_ids: Option<Vec<i32>>,
    name: Option<String>,
    external_id: Option<String>,
) -> Result<Record, RegistryError> {
    if name.is_some() == external_id.is_some() {
        return Err(RegistryError::bad_request(format!(
            "exactly one of name or externalId must be provided to look up a {}",
            kind
        )));
    }

    let mut options =
        ListOptions::new().with_pagination(Pagination::new().with_page_size(2));
    if let Some(type_ids) = type_ids {
        options = options.with_type_ids(type_ids);
    }
    if let Some(name) = name {
        options = options.with_name(name);
    }
    if let Some(external_id) = external_id {
        options = options.with_external_id(external_id);
    }

    let mut items = repo.list(options).await?.items;
    match items.len() {
        0 => Err(RegistryError::not_found(format!("no {} found", kind))),
        1 => Ok(items.remove(0)),
        _ => Err(RegistryError::not_found(format!(
            "multiple {} entities found",
            kind
        ))),
    }
}

/// Resolve a single owned record by (name, parent id) or by external id.
///
/// Owned entities store their names scope-prefixed, so a bare name can
/// never match; the valid parameter combinations are (name and parentId)
/// or externalId alone, and anything else is rejected up front.
pub(crate) async fn find_one_scoped(
    repo: &dyn RecordRepository,
    kind: &str,
    type_ids: Option<Vec<i32>>,
    name: Option<String>,
    parent_id: Option<&str>,
    external_id: Option<String>,
) -> Result<Record, RegistryError> {
    let storage_name = match (name, parent_id) {
        (Some(name), Some(parent)) if external_id.is_none() => {
            Some(prefix_when_owned(Some(parent), &name))
        }
        (None, _) if external_id.is_some() => None,
        _ => {
            return Err(RegistryError::bad_request(format!(
                "supply either (name and parentId), or externalId to look up a {}",
                kind
            )));
        }
    };
    find_one(repo, kind, type_ids, storage_name, external_id).await
}

/// Rewrite a repository name-uniqueness Conflict into the entity-level
/// message callers see.
pub(crate) fn remap_conflict(err: RegistryError, kind: &str, name: &str) -> RegistryError {
    if err.is_conflict() {
        RegistryError::conflict(format!("{} with name '{}' already exists", kind, name))
    } else {
        err
    }
}
