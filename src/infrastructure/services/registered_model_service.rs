//! Registered model service - upsert, lookup and listing of registered models

use std::sync::Arc;

use crate::domain::error::RegistryError;
use crate::domain::model::{
    merge_registered_model, registered_model_from_record, registered_model_to_record,
    RegisteredModel,
};
use crate::domain::record::TypeIds;
use crate::domain::repository::{ListOptions, Page, Pagination, RecordRepository};

use super::common::{find_one, remap_conflict};

const KIND: &str = "registered model";

/// Service for the registered model catalog
#[derive(Debug, Clone)]
pub struct RegisteredModelService {
    repo: Arc<dyn RecordRepository>,
    type_ids: TypeIds,
}

impl RegisteredModelService {
    pub fn new(repo: Arc<dyn RecordRepository>, type_ids: TypeIds) -> Self {
        Self { repo, type_ids }
    }

    /// Create a registered model, or apply a partial update when an id is
    /// set. On update, unset fields keep their persisted values and the
    /// name is non-editable.
    pub async fn upsert_registered_model(
        &self,
        model: RegisteredModel,
    ) -> Result<RegisteredModel, RegistryError> {
        let (merged, storage_name) = match &model.id {
            Some(id) => {
                let existing_record = self
                    .repo
                    .get_by_id(crate::domain::mapper::parse_numeric_id(KIND, id)?)
                    .await?;
                let existing = registered_model_from_record(&existing_record);
                (
                    merge_registered_model(&existing, &model),
                    existing_record.name,
                )
            }
            None => {
                let name = model.name.clone().ok_or_else(|| {
                    RegistryError::bad_request("registered model name is required")
                })?;
                (model, name)
            }
        };

        let record =
            registered_model_to_record(&merged, self.type_ids.registered_model, storage_name.clone())?;
        let saved = self
            .repo
            .save(record, None)
            .await
            .map_err(|e| remap_conflict(e, KIND, &storage_name))?;
        tracing::debug!(id = ?saved.id, name = %saved.name, "upserted registered model");
        Ok(registered_model_from_record(&saved))
    }

    pub async fn get_registered_model_by_id(
        &self,
        id: &str,
    ) -> Result<RegisteredModel, RegistryError> {
        let record = self
            .repo
            .get_by_id(crate::domain::mapper::parse_numeric_id(KIND, id)?)
            .await?;
        Ok(registered_model_from_record(&record))
    }

    /// Look up a registered model by name or external id (exactly one).
    pub async fn get_registered_model_by_params(
        &self,
        name: Option<String>,
        external_id: Option<String>,
    ) -> Result<RegisteredModel, RegistryError> {
        let record = find_one(self.repo.as_ref(), KIND, None, name, external_id).await?;
        Ok(registered_model_from_record(&record))
    }

    pub async fn get_registered_models(
        &self,
        pagination: Pagination,
    ) -> Result<Page<RegisteredModel>, RegistryError> {
        let page = self
            .repo
            .list(ListOptions::new().with_pagination(pagination))
            .await?;
        Ok(page.map(|record| registered_model_from_record(&record)))
    }
}
