//! Serving entity mapping and merge rules

use crate::domain::error::RegistryError;
use crate::domain::mapper::{
    format_id, insert_int, insert_string, int_prop, keys, merged, millis_string, parse_numeric_id,
    string_prop,
};
use crate::domain::naming::strip_scope_prefix;
use crate::domain::record::Record;

use super::entity::{
    ExecutionState, InferenceService, InferenceServiceState, ServeModel, ServingEnvironment,
};

pub fn merge_serving_environment(
    existing: &ServingEnvironment,
    incoming: &ServingEnvironment,
) -> ServingEnvironment {
    ServingEnvironment {
        id: existing.id.clone(),
        name: existing.name.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

/// Merge an inference-service update. Both the serving environment and the
/// registered model references are non-editable; the pinned model version
/// stays a replaceable pointer.
pub fn merge_inference_service(
    existing: &InferenceService,
    incoming: &InferenceService,
) -> InferenceService {
    InferenceService {
        id: existing.id.clone(),
        name: existing.name.clone(),
        serving_environment_id: existing.serving_environment_id.clone(),
        registered_model_id: existing.registered_model_id.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        model_version_id: merged(&incoming.model_version_id, &existing.model_version_id),
        runtime: merged(&incoming.runtime, &existing.runtime),
        desired_state: merged(&incoming.desired_state, &existing.desired_state),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

pub fn merge_serve_model(existing: &ServeModel, incoming: &ServeModel) -> ServeModel {
    ServeModel {
        id: existing.id.clone(),
        name: existing.name.clone(),
        model_version_id: existing.model_version_id.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        last_known_state: merged(&incoming.last_known_state, &existing.last_known_state),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

pub fn serving_environment_to_record(
    environment: &ServingEnvironment,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = environment
        .id
        .as_deref()
        .map(|id| parse_numeric_id("serving environment", id))
        .transpose()?;
    record.external_id = environment.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &environment.description);
    record.custom_properties = environment.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn serving_environment_from_record(record: &Record) -> ServingEnvironment {
    ServingEnvironment {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}

pub fn inference_service_to_record(
    service: &InferenceService,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = service
        .id
        .as_deref()
        .map(|id| parse_numeric_id("inference service", id))
        .transpose()?;
    record.external_id = service.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &service.description);
    insert_string(&mut record.properties, keys::RUNTIME, &service.runtime);
    insert_string(
        &mut record.properties,
        keys::DESIRED_STATE,
        &service.desired_state.map(|s| s.as_str().to_string()),
    );
    insert_int(
        &mut record.properties,
        keys::SERVING_ENVIRONMENT_ID,
        service
            .serving_environment_id
            .as_deref()
            .map(|id| parse_numeric_id("serving environment", id))
            .transpose()?
            .map(i64::from),
    );
    insert_int(
        &mut record.properties,
        keys::REGISTERED_MODEL_ID,
        service
            .registered_model_id
            .as_deref()
            .map(|id| parse_numeric_id("registered model", id))
            .transpose()?
            .map(i64::from),
    );
    insert_int(
        &mut record.properties,
        keys::MODEL_VERSION_ID,
        service
            .model_version_id
            .as_deref()
            .map(|id| parse_numeric_id("model version", id))
            .transpose()?
            .map(i64::from),
    );
    record.custom_properties = service.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn inference_service_from_record(record: &Record) -> InferenceService {
    InferenceService {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        serving_environment_id: int_prop(&record.properties, keys::SERVING_ENVIRONMENT_ID)
            .map(|id| id.to_string()),
        registered_model_id: int_prop(&record.properties, keys::REGISTERED_MODEL_ID)
            .map(|id| id.to_string()),
        model_version_id: int_prop(&record.properties, keys::MODEL_VERSION_ID)
            .map(|id| id.to_string()),
        runtime: string_prop(&record.properties, keys::RUNTIME),
        desired_state: string_prop(&record.properties, keys::DESIRED_STATE)
            .and_then(|s| InferenceServiceState::parse(&s)),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}

pub fn serve_model_to_record(
    serve_model: &ServeModel,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = serve_model
        .id
        .as_deref()
        .map(|id| parse_numeric_id("serve model", id))
        .transpose()?;
    record.external_id = serve_model.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &serve_model.description);
    insert_string(
        &mut record.properties,
        keys::LAST_KNOWN_STATE,
        &serve_model.last_known_state.map(|s| s.as_str().to_string()),
    );
    insert_int(
        &mut record.properties,
        keys::MODEL_VERSION_ID,
        serve_model
            .model_version_id
            .as_deref()
            .map(|id| parse_numeric_id("model version", id))
            .transpose()?
            .map(i64::from),
    );
    record.custom_properties = serve_model.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn serve_model_from_record(record: &Record) -> ServeModel {
    ServeModel {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        model_version_id: int_prop(&record.properties, keys::MODEL_VERSION_ID)
            .map(|id| id.to_string()),
        last_known_state: string_prop(&record.properties, keys::LAST_KNOWN_STATE)
            .and_then(|s| ExecutionState::parse(&s)),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_inference_service_protects_references() {
        let existing = InferenceService {
            id: Some("4".to_string()),
            name: Some("svc".to_string()),
            serving_environment_id: Some("1".to_string()),
            registered_model_id: Some("2".to_string()),
            model_version_id: Some("10".to_string()),
            ..InferenceService::default()
        };
        let incoming = InferenceService {
            serving_environment_id: Some("9".to_string()),
            registered_model_id: Some("9".to_string()),
            model_version_id: Some("11".to_string()),
            runtime: Some("kserve".to_string()),
            ..InferenceService::default()
        };

        let merged = merge_inference_service(&existing, &incoming);
        assert_eq!(merged.serving_environment_id.as_deref(), Some("1"));
        assert_eq!(merged.registered_model_id.as_deref(), Some("2"));
        // the pinned version is editable
        assert_eq!(merged.model_version_id.as_deref(), Some("11"));
        assert_eq!(merged.runtime.as_deref(), Some("kserve"));
    }

    #[test]
    fn test_inference_service_record_round_trip() {
        let service = InferenceService {
            name: Some("svc".to_string()),
            serving_environment_id: Some("1".to_string()),
            registered_model_id: Some("2".to_string()),
            runtime: Some("triton".to_string()),
            desired_state: Some(InferenceServiceState::Deployed),
            ..InferenceService::default()
        };

        let record = inference_service_to_record(&service, 10, "1:svc".to_string()).unwrap();
        let back = inference_service_from_record(&record);
        assert_eq!(back.name.as_deref(), Some("svc"));
        assert_eq!(back.serving_environment_id.as_deref(), Some("1"));
        assert_eq!(back.registered_model_id.as_deref(), Some("2"));
        assert!(back.model_version_id.is_none());
        assert_eq!(back.desired_state, Some(InferenceServiceState::Deployed));
    }

    #[test]
    fn test_serve_model_merge_protects_version() {
        let existing = ServeModel {
            id: Some("3".to_string()),
            name: Some("run-1".to_string()),
            model_version_id: Some("5".to_string()),
            last_known_state: Some(ExecutionState::New),
            ..ServeModel::default()
        };
        let incoming = ServeModel {
            model_version_id: Some("6".to_string()),
            last_known_state: Some(ExecutionState::Running),
            ..ServeModel::default()
        };

        let merged = merge_serve_model(&existing, &incoming);
        assert_eq!(merged.model_version_id.as_deref(), Some("5"));
        assert_eq!(merged.last_known_state, Some(ExecutionState::Running));
    }
}
