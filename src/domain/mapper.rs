//! Shared mapper plumbing
//!
//! The per-entity mappers live next to their entities
//! (`domain::*::mapper`); this module carries the helpers they share:
//! id parsing/formatting, merge-field selection, and typed property
//! accessors on the attribute record.

use crate::domain::error::RegistryError;
use crate::domain::value::{PropertyMap, PropertyValue};

/// Well-known system property keys
pub mod keys {
    pub const DESCRIPTION: &str = "description";
    pub const OWNER: &str = "owner";
    pub const AUTHOR: &str = "author";
    pub const STATE: &str = "state";
    pub const URI: &str = "uri";
    pub const REGISTERED_MODEL_ID: &str = "registered_model_id";
    pub const SERVING_ENVIRONMENT_ID: &str = "serving_environment_id";
    pub const MODEL_VERSION_ID: &str = "model_version_id";
    pub const EXPERIMENT_ID: &str = "experiment_id";
    pub const EXPERIMENT_RUN_ID: &str = "experiment_run_id";
    pub const RUNTIME: &str = "runtime";
    pub const DESIRED_STATE: &str = "desired_state";
    pub const LAST_KNOWN_STATE: &str = "last_known_state";
    pub const MODEL_FORMAT_NAME: &str = "model_format_name";
    pub const MODEL_FORMAT_VERSION: &str = "model_format_version";
    pub const STORAGE_KEY: &str = "storage_key";
    pub const STORAGE_PATH: &str = "storage_path";
    pub const DIGEST: &str = "digest";
    pub const SOURCE_TYPE: &str = "source_type";
    pub const SOURCE: &str = "source";
    pub const SCHEMA: &str = "schema";
    pub const PROFILE: &str = "profile";
    pub const VALUE: &str = "value";
    pub const TIMESTAMP: &str = "timestamp";
    pub const STEP: &str = "step";
    pub const PARAMETER_TYPE: &str = "parameter_type";
    pub const STATUS: &str = "status";
    pub const START_TIME_SINCE_EPOCH: &str = "start_time_since_epoch";
    pub const END_TIME_SINCE_EPOCH: &str = "end_time_since_epoch";
}

/// Parse a public numeric-string id into the repository id space.
pub fn parse_numeric_id(kind: &str, id: &str) -> Result<i32, RegistryError> {
    id.parse::<i32>().map_err(|_| {
        RegistryError::bad_request(format!("invalid {} id '{}': not a numeric identifier", kind, id))
    })
}

/// Format a repository id back into the public numeric-string form.
pub fn format_id(id: Option<i32>) -> Option<String> {
    id.map(|id| id.to_string())
}

/// Merge selection for an editable field: an unset incoming field keeps the
/// persisted value, a set one wins verbatim (explicit empty included).
pub fn merged<T: Clone>(incoming: &Option<T>, existing: &Option<T>) -> Option<T> {
    incoming.clone().or_else(|| existing.clone())
}

pub fn insert_string(map: &mut PropertyMap, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), PropertyValue::String(value.clone()));
    }
}

pub fn insert_int(map: &mut PropertyMap, key: &str, value: Option<i64>) {
    if let Some(value) = value {
        map.insert(key.to_string(), PropertyValue::Int(value));
    }
}

pub fn insert_double(map: &mut PropertyMap, key: &str, value: Option<f64>) {
    if let Some(value) = value {
        map.insert(key.to_string(), PropertyValue::Double(value));
    }
}

pub fn string_prop(map: &PropertyMap, key: &str) -> Option<String> {
    map.get(key).and_then(|v| v.as_str().map(str::to_string))
}

pub fn int_prop(map: &PropertyMap, key: &str) -> Option<i64> {
    map.get(key).and_then(PropertyValue::as_int)
}

pub fn double_prop(map: &PropertyMap, key: &str) -> Option<f64> {
    map.get(key).and_then(PropertyValue::as_double)
}

/// Epoch-millis integer to the public string form.
pub fn millis_string(ms: i64) -> String {
    ms.to_string()
}
