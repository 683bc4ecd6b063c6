//! Artifact mapping and merge rules
//!
//! The artifact type is non-editable: an update carrying a different
//! variant than the persisted artifact is rejected rather than merged.

use crate::domain::error::RegistryError;
use crate::domain::mapper::{
    double_prop, format_id, insert_double, insert_int, insert_string, int_prop, keys, merged,
    millis_string, parse_numeric_id, string_prop,
};
use crate::domain::naming::strip_scope_prefix;
use crate::domain::record::{Record, TypeIds};

use super::entity::{Artifact, ArtifactState, DataSet, DocArtifact, Metric, ModelArtifact, Parameter};

/// Merge a partial artifact update onto the persisted artifact.
pub fn merge_artifact(existing: &Artifact, incoming: &Artifact) -> Result<Artifact, RegistryError> {
    match (existing, incoming) {
        (Artifact::ModelArtifact(e), Artifact::ModelArtifact(i)) => {
            Ok(Artifact::ModelArtifact(merge_model_artifact(e, i)))
        }
        (Artifact::DocArtifact(e), Artifact::DocArtifact(i)) => {
            Ok(Artifact::DocArtifact(merge_doc_artifact(e, i)))
        }
        (Artifact::DataSet(e), Artifact::DataSet(i)) => Ok(Artifact::DataSet(merge_dataset(e, i))),
        (Artifact::Metric(e), Artifact::Metric(i)) => Ok(Artifact::Metric(merge_metric(e, i))),
        (Artifact::Parameter(e), Artifact::Parameter(i)) => {
            Ok(Artifact::Parameter(merge_parameter(e, i)))
        }
        (existing, incoming) => Err(RegistryError::bad_request(format!(
            "artifact type is not editable: persisted '{}', got '{}'",
            existing.artifact_type(),
            incoming.artifact_type()
        ))),
    }
}

pub fn merge_model_artifact(existing: &ModelArtifact, incoming: &ModelArtifact) -> ModelArtifact {
    ModelArtifact {
        id: existing.id.clone(),
        name: existing.name.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        uri: merged(&incoming.uri, &existing.uri),
        state: merged(&incoming.state, &existing.state),
        model_format_name: merged(&incoming.model_format_name, &existing.model_format_name),
        model_format_version: merged(&incoming.model_format_version, &existing.model_format_version),
        storage_key: merged(&incoming.storage_key, &existing.storage_key),
        storage_path: merged(&incoming.storage_path, &existing.storage_path),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

pub fn merge_doc_artifact(existing: &DocArtifact, incoming: &DocArtifact) -> DocArtifact {
    DocArtifact {
        id: existing.id.clone(),
        name: existing.name.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        uri: merged(&incoming.uri, &existing.uri),
        state: merged(&incoming.state, &existing.state),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

pub fn merge_dataset(existing: &DataSet, incoming: &DataSet) -> DataSet {
    DataSet {
        id: existing.id.clone(),
        name: existing.name.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        uri: merged(&incoming.uri, &existing.uri),
        state: merged(&incoming.state, &existing.state),
        digest: merged(&incoming.digest, &existing.digest),
        source_type: merged(&incoming.source_type, &existing.source_type),
        source: merged(&incoming.source, &existing.source),
        schema: merged(&incoming.schema, &existing.schema),
        profile: merged(&incoming.profile, &existing.profile),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

pub fn merge_metric(existing: &Metric, incoming: &Metric) -> Metric {
    Metric {
        id: existing.id.clone(),
        name: existing.name.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        state: merged(&incoming.state, &existing.state),
        value: merged(&incoming.value, &existing.value),
        timestamp: merged(&incoming.timestamp, &existing.timestamp),
        step: merged(&incoming.step, &existing.step),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

pub fn merge_parameter(existing: &Parameter, incoming: &Parameter) -> Parameter {
    Parameter {
        id: existing.id.clone(),
        name: existing.name.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        state: merged(&incoming.state, &existing.state),
        value: merged(&incoming.value, &existing.value),
        parameter_type: merged(&incoming.parameter_type, &existing.parameter_type),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

/// Convert an artifact to its persistence shape under its own type id.
pub fn artifact_to_record(
    artifact: &Artifact,
    type_ids: &TypeIds,
    storage_name: String,
) -> Result<Record, RegistryError> {
    match artifact {
        Artifact::ModelArtifact(a) => model_artifact_to_record(a, type_ids.model_artifact, storage_name),
        Artifact::DocArtifact(a) => doc_artifact_to_record(a, type_ids.doc_artifact, storage_name),
        Artifact::DataSet(a) => dataset_to_record(a, type_ids.dataset_artifact, storage_name),
        Artifact::Metric(a) => metric_to_record(a, type_ids.metric_artifact, storage_name),
        Artifact::Parameter(a) => parameter_to_record(a, type_ids.parameter_artifact, storage_name),
    }
}

/// Convert a persisted record back into the matching artifact variant.
/// Metric-history records come back as plain metrics: the internal kind
/// never leaks past the mapper.
pub fn artifact_from_record(record: &Record, type_ids: &TypeIds) -> Result<Artifact, RegistryError> {
    if record.type_id == type_ids.model_artifact {
        Ok(Artifact::ModelArtifact(model_artifact_from_record(record)))
    } else if record.type_id == type_ids.doc_artifact {
        Ok(Artifact::DocArtifact(doc_artifact_from_record(record)))
    } else if record.type_id == type_ids.dataset_artifact {
        Ok(Artifact::DataSet(dataset_from_record(record)))
    } else if record.type_id == type_ids.metric_artifact || record.type_id == type_ids.metric_history
    {
        Ok(Artifact::Metric(metric_from_record(record)))
    } else if record.type_id == type_ids.parameter_artifact {
        Ok(Artifact::Parameter(parameter_from_record(record)))
    } else {
        Err(RegistryError::internal(format!(
            "record {} has unknown artifact type id {}",
            record.name, record.type_id
        )))
    }
}

pub fn model_artifact_to_record(
    artifact: &ModelArtifact,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = artifact
        .id
        .as_deref()
        .map(|id| parse_numeric_id("model artifact", id))
        .transpose()?;
    record.external_id = artifact.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &artifact.description);
    insert_string(&mut record.properties, keys::URI, &artifact.uri);
    insert_string(
        &mut record.properties,
        keys::STATE,
        &artifact.state.map(|s| s.as_str().to_string()),
    );
    insert_string(&mut record.properties, keys::MODEL_FORMAT_NAME, &artifact.model_format_name);
    insert_string(
        &mut record.properties,
        keys::MODEL_FORMAT_VERSION,
        &artifact.model_format_version,
    );
    insert_string(&mut record.properties, keys::STORAGE_KEY, &artifact.storage_key);
    insert_string(&mut record.properties, keys::STORAGE_PATH, &artifact.storage_path);
    record.custom_properties = artifact.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn model_artifact_from_record(record: &Record) -> ModelArtifact {
    ModelArtifact {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        uri: string_prop(&record.properties, keys::URI),
        state: string_prop(&record.properties, keys::STATE).and_then(|s| ArtifactState::parse(&s)),
        model_format_name: string_prop(&record.properties, keys::MODEL_FORMAT_NAME),
        model_format_version: string_prop(&record.properties, keys::MODEL_FORMAT_VERSION),
        storage_key: string_prop(&record.properties, keys::STORAGE_KEY),
        storage_path: string_prop(&record.properties, keys::STORAGE_PATH),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}

pub fn doc_artifact_to_record(
    artifact: &DocArtifact,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = artifact
        .id
        .as_deref()
        .map(|id| parse_numeric_id("doc artifact", id))
        .transpose()?;
    record.external_id = artifact.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &artifact.description);
    insert_string(&mut record.properties, keys::URI, &artifact.uri);
    insert_string(
        &mut record.properties,
        keys::STATE,
        &artifact.state.map(|s| s.as_str().to_string()),
    );
    record.custom_properties = artifact.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn doc_artifact_from_record(record: &Record) -> DocArtifact {
    DocArtifact {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        uri: string_prop(&record.properties, keys::URI),
        state: string_prop(&record.properties, keys::STATE).and_then(|s| ArtifactState::parse(&s)),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}

pub fn dataset_to_record(
    artifact: &DataSet,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = artifact
        .id
        .as_deref()
        .map(|id| parse_numeric_id("dataset artifact", id))
        .transpose()?;
    record.external_id = artifact.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &artifact.description);
    insert_string(&mut record.properties, keys::URI, &artifact.uri);
    insert_string(
        &mut record.properties,
        keys::STATE,
        &artifact.state.map(|s| s.as_str().to_string()),
    );
    insert_string(&mut record.properties, keys::DIGEST, &artifact.digest);
    insert_string(&mut record.properties, keys::SOURCE_TYPE, &artifact.source_type);
    insert_string(&mut record.properties, keys::SOURCE, &artifact.source);
    insert_string(&mut record.properties, keys::SCHEMA, &artifact.schema);
    insert_string(&mut record.properties, keys::PROFILE, &artifact.profile);
    record.custom_properties = artifact.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn dataset_from_record(record: &Record) -> DataSet {
    DataSet {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        uri: string_prop(&record.properties, keys::URI),
        state: string_prop(&record.properties, keys::STATE).and_then(|s| ArtifactState::parse(&s)),
        digest: string_prop(&record.properties, keys::DIGEST),
        source_type: string_prop(&record.properties, keys::SOURCE_TYPE),
        source: string_prop(&record.properties, keys::SOURCE),
        schema: string_prop(&record.properties, keys::SCHEMA),
        profile: string_prop(&record.properties, keys::PROFILE),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}

pub fn metric_to_record(
    metric: &Metric,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = metric
        .id
        .as_deref()
        .map(|id| parse_numeric_id("metric", id))
        .transpose()?;
    record.external_id = metric.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &metric.description);
    insert_string(
        &mut record.properties,
        keys::STATE,
        &metric.state.map(|s| s.as_str().to_string()),
    );
    insert_double(&mut record.properties, keys::VALUE, metric.value);
    insert_string(&mut record.properties, keys::TIMESTAMP, &metric.timestamp);
    insert_int(&mut record.properties, keys::STEP, metric.step);
    record.custom_properties = metric.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn metric_from_record(record: &Record) -> Metric {
    Metric {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        state: string_prop(&record.properties, keys::STATE).and_then(|s| ArtifactState::parse(&s)),
        value: double_prop(&record.properties, keys::VALUE),
        timestamp: string_prop(&record.properties, keys::TIMESTAMP),
        step: int_prop(&record.properties, keys::STEP),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}

pub fn parameter_to_record(
    parameter: &Parameter,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = parameter
        .id
        .as_deref()
        .map(|id| parse_numeric_id("parameter", id))
        .transpose()?;
    record.external_id = parameter.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &parameter.description);
    insert_string(
        &mut record.properties,
        keys::STATE,
        &parameter.state.map(|s| s.as_str().to_string()),
    );
    insert_string(&mut record.properties, keys::VALUE, &parameter.value);
    insert_string(&mut record.properties, keys::PARAMETER_TYPE, &parameter.parameter_type);
    record.custom_properties = parameter.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn parameter_from_record(record: &Record) -> Parameter {
    Parameter {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        state: string_prop(&record.properties, keys::STATE).and_then(|s| ArtifactState::parse(&s)),
        value: string_prop(&record.properties, keys::VALUE),
        parameter_type: string_prop(&record.properties, keys::PARAMETER_TYPE),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}
