//! Inference service service - deployment intents inside an environment

use std::sync::Arc;

use crate::domain::error::RegistryError;
use crate::domain::mapper::parse_numeric_id;
use crate::domain::model::{model_version_from_record, ModelVersion};
use crate::domain::naming::prefix_when_owned;
use crate::domain::record::TypeIds;
use crate::domain::repository::{
    ListOptions, Page, Pagination, RecordRepository, SortOrder,
};
use crate::domain::serving::{
    inference_service_from_record, inference_service_to_record, merge_inference_service,
    InferenceService,
};

use super::common::{find_one_scoped, remap_conflict};

const KIND: &str = "inference service";

/// Service for inference services: a deployment intent binding a
/// registered model into a serving environment.
#[derive(Debug, Clone)]
pub struct InferenceServiceService {
    repo: Arc<dyn RecordRepository>,
    environment_repo: Arc<dyn RecordRepository>,
    model_repo: Arc<dyn RecordRepository>,
    version_repo: Arc<dyn RecordRepository>,
    type_ids: TypeIds,
}

impl InferenceServiceService {
    pub fn new(
        repo: Arc<dyn RecordRepository>,
        environment_repo: Arc<dyn RecordRepository>,
        model_repo: Arc<dyn RecordRepository>,
        version_repo: Arc<dyn RecordRepository>,
        type_ids: TypeIds,
    ) -> Self {
        Self {
            repo,
            environment_repo,
            model_repo,
            version_repo,
            type_ids,
        }
    }

    /// Create an inference service inside a serving environment, or apply
    /// a partial update when an id is set. The environment and registered
    /// model references are non-editable; the served version pin is.
    pub async fn upsert_inference_service(
        &self,
        service: InferenceService,
    ) -> Result<InferenceService, RegistryError> {
        let (merged, storage_name, parent_id) = match &service.id {
            Some(id) => {
                let existing_record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
                let existing = inference_service_from_record(&existing_record);
                let parent_id = existing
                    .serving_environment_id
                    .as_deref()
                    .map(|id| parse_numeric_id("serving environment", id))
                    .transpose()?;
                (
                    merge_inference_service(&existing, &service),
                    existing_record.name,
                    parent_id,
                )
            }
            None => {
                let environment = service.serving_environment_id.clone().ok_or_else(|| {
                    RegistryError::bad_request(
                        "a serving environment id is required to create an inference service",
                    )
                })?;
                let environment_numeric = parse_numeric_id("serving environment", &environment)?;
                self.environment_repo.get_by_id(environment_numeric).await?;

                let model = service.registered_model_id.clone().ok_or_else(|| {
                    RegistryError::bad_request(
                        "a registered model id is required to create an inference service",
                    )
                })?;
                self.model_repo
                    .get_by_id(parse_numeric_id("registered model", &model)?)
                    .await?;

                let name = service.name.clone().ok_or_else(|| {
                    RegistryError::bad_request("inference service name is required")
                })?;
                (
                    service,
                    prefix_when_owned(Some(environment.as_str()), &name),
                    Some(environment_numeric),
                )
            }
        };

        let record =
            inference_service_to_record(&merged, self.type_ids.inference_service, storage_name)?;
        let saved = self.repo.save(record, parent_id).await.map_err(|e| {
            remap_conflict(e, KIND, merged.name.as_deref().unwrap_or_default())
        })?;
        tracing::debug!(id = ?saved.id, name = %saved.name, "upserted inference service");
        Ok(inference_service_from_record(&saved))
    }

    pub async fn get_inference_service_by_id(
        &self,
        id: &str,
    ) -> Result<InferenceService, RegistryError> {
        let record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
        Ok(inference_service_from_record(&record))
    }

    /// Look up by (name, serving environment id) or by external id.
    pub async fn get_inference_service_by_params(
        &self,
        name: Option<String>,
        serving_environment_id: Option<&str>,
        external_id: Option<String>,
    ) -> Result<InferenceService, RegistryError> {
        let record = find_one_scoped(
            self.repo.as_ref(),
            KIND,
            None,
            name,
            serving_environment_id,
            external_id,
        )
        .await?;
        Ok(inference_service_from_record(&record))
    }

    /// List inference services, optionally scoped to one environment
    /// and/or narrowed to one runtime.
    pub async fn get_inference_services(
        &self,
        serving_environment_id: Option<&str>,
        runtime: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<InferenceService>, RegistryError> {
        let mut options = ListOptions::new().with_pagination(pagination);
        if let Some(environment) = serving_environment_id {
            options = options
                .with_parent_resource_id(parse_numeric_id("serving environment", environment)?);
        }
        if let Some(runtime) = runtime {
            options = options.with_runtime(runtime);
        }
        let page = self.repo.list(options).await?;
        Ok(page.map(|record| inference_service_from_record(&record)))
    }

    /// Resolve the model version an inference service is serving: the
    /// pinned version when one is set, otherwise the most recently created
    /// version of the referenced registered model.
    pub async fn get_model_version_by_inference_service(
        &self,
        id: &str,
    ) -> Result<ModelVersion, RegistryError> {
        let service = self.get_inference_service_by_id(id).await?;

        if let Some(version_id) = &service.model_version_id {
            let record = self
                .version_repo
                .get_by_id(parse_numeric_id("model version", version_id)?)
                .await?;
            return Ok(model_version_from_record(&record));
        }

        let model_id = service.registered_model_id.as_deref().ok_or_else(|| {
            RegistryError::internal(format!(
                "inference service {} has no registered model reference",
                id
            ))
        })?;
        let page = self
            .version_repo
            .list(
                ListOptions::new()
                    .with_parent_resource_id(parse_numeric_id("registered model", model_id)?)
                    .with_pagination(
                        Pagination::new()
                            .with_page_size(1)
                            .with_order_by("CREATE_TIME")
                            .with_sort_order(SortOrder::Desc),
                    ),
            )
            .await?;
        page.items
            .first()
            .map(model_version_from_record)
            .ok_or_else(|| {
                RegistryError::not_found(format!(
                    "no model versions found for registered model {}",
                    model_id
                ))
            })
    }
}
