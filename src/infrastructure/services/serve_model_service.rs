//! Serve model service - execution records owned by an inference service

use std::sync::Arc;

use crate::domain::error::RegistryError;
use crate::domain::mapper::parse_numeric_id;
use crate::domain::naming::prefix_when_owned;
use crate::domain::record::TypeIds;
use crate::domain::repository::{ListOptions, Page, Pagination, RecordRepository};
use crate::domain::serving::{
    merge_serve_model, serve_model_from_record, serve_model_to_record, ServeModel,
};

use super::common::{find_one_scoped, remap_conflict};

const KIND: &str = "serve model";

/// Service for serve-model executions: one record per serving of a
/// concrete model version by an inference service.
#[derive(Debug, Clone)]
pub struct ServeModelService {
    repo: Arc<dyn RecordRepository>,
    inference_service_repo: Arc<dyn RecordRepository>,
    version_repo: Arc<dyn RecordRepository>,
    type_ids: TypeIds,
}

impl ServeModelService {
    pub fn new(
        repo: Arc<dyn RecordRepository>,
        inference_service_repo: Arc<dyn RecordRepository>,
        version_repo: Arc<dyn RecordRepository>,
        type_ids: TypeIds,
    ) -> Self {
        Self {
            repo,
            inference_service_repo,
            version_repo,
            type_ids,
        }
    }

    /// Create a serve-model record under an inference service, or apply a
    /// partial update when an id is set. The served version reference is
    /// non-editable.
    pub async fn upsert_serve_model(
        &self,
        serve_model: ServeModel,
        inference_service_id: &str,
    ) -> Result<ServeModel, RegistryError> {
        let parent = parse_numeric_id("inference service", inference_service_id)?;
        let (merged, storage_name, parent_id) = match &serve_model.id {
            Some(id) => {
                let existing_record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
                let existing = serve_model_from_record(&existing_record);
                (
                    merge_serve_model(&existing, &serve_model),
                    existing_record.name,
                    None,
                )
            }
            None => {
                self.inference_service_repo.get_by_id(parent).await?;
                let version = serve_model.model_version_id.clone().ok_or_else(|| {
                    RegistryError::bad_request(
                        "a model version id is required to create a serve model",
                    )
                })?;
                self.version_repo
                    .get_by_id(parse_numeric_id("model version", &version)?)
                    .await?;

                let name = serve_model.name.clone().ok_or_else(|| {
                    RegistryError::bad_request("serve model name is required")
                })?;
                (
                    serve_model,
                    prefix_when_owned(Some(inference_service_id), &name),
                    Some(parent),
                )
            }
        };

        let record = serve_model_to_record(&merged, self.type_ids.serve_model, storage_name)?;
        let saved = self.repo.save(record, parent_id).await.map_err(|e| {
            remap_conflict(e, KIND, merged.name.as_deref().unwrap_or_default())
        })?;
        tracing::debug!(id = ?saved.id, name = %saved.name, "upserted serve model");
        Ok(serve_model_from_record(&saved))
    }

    pub async fn get_serve_model_by_id(&self, id: &str) -> Result<ServeModel, RegistryError> {
        let record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
        Ok(serve_model_from_record(&record))
    }

    /// Look up by (name, inference service id) or by external id.
    pub async fn get_serve_model_by_params(
        &self,
        name: Option<String>,
        inference_service_id: Option<&str>,
        external_id: Option<String>,
    ) -> Result<ServeModel, RegistryError> {
        let record = find_one_scoped(
            self.repo.as_ref(),
            KIND,
            None,
            name,
            inference_service_id,
            external_id,
        )
        .await?;
        Ok(serve_model_from_record(&record))
    }

    /// List serve-model records, optionally scoped to one inference
    /// service.
    pub async fn get_serve_models(
        &self,
        inference_service_id: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<ServeModel>, RegistryError> {
        let mut options = ListOptions::new().with_pagination(pagination);
        if let Some(owner) = inference_service_id {
            options =
                options.with_parent_resource_id(parse_numeric_id("inference service", owner)?);
        }
        let page = self.repo.list(options).await?;
        Ok(page.map(|record| serve_model_from_record(&record)))
    }
}
