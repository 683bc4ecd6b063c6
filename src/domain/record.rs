//! Generic typed-attribute record
//!
//! Every entity is persisted as a [`Record`]: a named row with a type id,
//! system properties, and arbitrary typed custom properties. The repository
//! layer only understands this shape; the per-entity mappers translate
//! between it and the public entity types.

use serde::{Deserialize, Serialize};

use super::value::PropertyMap;

/// Persistence shape shared by every entity kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Server-assigned id; `None` until first save
    pub id: Option<i32>,
    /// Stable type id from [`TypeIds`]
    pub type_id: i32,
    /// Storage-unique name (scope-prefixed for owned entities)
    pub name: String,
    /// Optional caller-supplied external key
    pub external_id: Option<String>,
    /// Server-assigned creation time, epoch millis
    pub create_time_since_epoch: i64,
    /// Server-assigned last-update time, epoch millis
    pub last_update_time_since_epoch: i64,
    /// System properties (description, state, parent references, ...)
    pub properties: PropertyMap,
    /// Caller-supplied typed properties
    pub custom_properties: PropertyMap,
}

impl Record {
    pub fn new(type_id: i32, name: impl Into<String>) -> Self {
        Self {
            id: None,
            type_id,
            name: name.into(),
            external_id: None,
            create_time_since_epoch: 0,
            last_update_time_since_epoch: 0,
            properties: PropertyMap::new(),
            custom_properties: PropertyMap::new(),
        }
    }
}

/// Stable integer type ids, assigned once at startup and passed read-only
/// into mappers and services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeIds {
    pub registered_model: i32,
    pub model_version: i32,
    pub model_artifact: i32,
    pub doc_artifact: i32,
    pub dataset_artifact: i32,
    pub metric_artifact: i32,
    pub parameter_artifact: i32,
    pub metric_history: i32,
    pub serving_environment: i32,
    pub inference_service: i32,
    pub serve_model: i32,
    pub experiment: i32,
    pub experiment_run: i32,
}

impl TypeIds {
    /// Assign sequential ids in declaration order.
    pub fn assign() -> Self {
        let mut next = 0;
        let mut take = || {
            next += 1;
            next
        };
        Self {
            registered_model: take(),
            model_version: take(),
            model_artifact: take(),
            doc_artifact: take(),
            dataset_artifact: take(),
            metric_artifact: take(),
            parameter_artifact: take(),
            metric_history: take(),
            serving_environment: take(),
            inference_service: take(),
            serve_model: take(),
            experiment: take(),
            experiment_run: take(),
        }
    }
}

impl Default for TypeIds {
    fn default() -> Self {
        Self::assign()
    }
}
