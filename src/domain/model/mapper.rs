//! Registered model / model version mapping and merge rules

use crate::domain::error::RegistryError;
use crate::domain::mapper::{
    format_id, insert_int, insert_string, int_prop, keys, merged, millis_string, parse_numeric_id,
    string_prop,
};
use crate::domain::naming::strip_scope_prefix;
use crate::domain::record::Record;
use crate::domain::value::PropertyMap;

use super::entity::{ModelVersion, ModelVersionState, RegisteredModel, RegisteredModelState};

/// Merge a partial update onto the persisted model. Id, name and both
/// timestamps always come from the persisted side.
pub fn merge_registered_model(
    existing: &RegisteredModel,
    incoming: &RegisteredModel,
) -> RegisteredModel {
    RegisteredModel {
        id: existing.id.clone(),
        name: existing.name.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        owner: merged(&incoming.owner, &existing.owner),
        state: merged(&incoming.state, &existing.state),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

/// Merge a partial update onto the persisted version. The owning
/// registered model reference is additionally non-editable.
pub fn merge_model_version(existing: &ModelVersion, incoming: &ModelVersion) -> ModelVersion {
    ModelVersion {
        id: existing.id.clone(),
        name: existing.name.clone(),
        registered_model_id: existing.registered_model_id.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        author: merged(&incoming.author, &existing.author),
        state: merged(&incoming.state, &existing.state),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

pub fn registered_model_to_record(
    model: &RegisteredModel,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = model
        .id
        .as_deref()
        .map(|id| parse_numeric_id("registered model", id))
        .transpose()?;
    record.external_id = model.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &model.description);
    insert_string(&mut record.properties, keys::OWNER, &model.owner);
    insert_string(
        &mut record.properties,
        keys::STATE,
        &model.state.map(|s| s.as_str().to_string()),
    );
    record.custom_properties = model.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn registered_model_from_record(record: &Record) -> RegisteredModel {
    RegisteredModel {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        owner: string_prop(&record.properties, keys::OWNER),
        state: string_prop(&record.properties, keys::STATE)
            .and_then(|s| RegisteredModelState::parse(&s)),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}

pub fn model_version_to_record(
    version: &ModelVersion,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = version
        .id
        .as_deref()
        .map(|id| parse_numeric_id("model version", id))
        .transpose()?;
    record.external_id = version.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &version.description);
    insert_string(&mut record.properties, keys::AUTHOR, &version.author);
    insert_string(
        &mut record.properties,
        keys::STATE,
        &version.state.map(|s| s.as_str().to_string()),
    );
    let registered_model_id = version
        .registered_model_id
        .as_deref()
        .map(|id| parse_numeric_id("registered model", id))
        .transpose()?;
    insert_int(
        &mut record.properties,
        keys::REGISTERED_MODEL_ID,
        registered_model_id.map(i64::from),
    );
    record.custom_properties = version.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn model_version_from_record(record: &Record) -> ModelVersion {
    ModelVersion {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        registered_model_id: int_prop(&record.properties, keys::REGISTERED_MODEL_ID)
            .map(|id| id.to_string()),
        author: string_prop(&record.properties, keys::AUTHOR),
        state: string_prop(&record.properties, keys::STATE)
            .and_then(|s| ModelVersionState::parse(&s)),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}
