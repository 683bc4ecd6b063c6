//! Model version service - versions owned by a registered model

use std::sync::Arc;

use crate::domain::error::RegistryError;
use crate::domain::mapper::parse_numeric_id;
use crate::domain::model::{
    merge_model_version, model_version_from_record, model_version_to_record, ModelVersion,
};
use crate::domain::naming::prefix_when_owned;
use crate::domain::record::TypeIds;
use crate::domain::repository::{ListOptions, Page, Pagination, RecordRepository};

use super::common::{find_one_scoped, remap_conflict};

const KIND: &str = "model version";

/// Service for model versions. Versions live in the scope of their owning
/// registered model; their storage name is prefixed with the owner id so
/// the same version name can exist under different models.
#[derive(Debug, Clone)]
pub struct ModelVersionService {
    repo: Arc<dyn RecordRepository>,
    model_repo: Arc<dyn RecordRepository>,
    type_ids: TypeIds,
}

impl ModelVersionService {
    pub fn new(
        repo: Arc<dyn RecordRepository>,
        model_repo: Arc<dyn RecordRepository>,
        type_ids: TypeIds,
    ) -> Self {
        Self {
            repo,
            model_repo,
            type_ids,
        }
    }

    /// Create a model version under a registered model, or apply a partial
    /// update when an id is set. The owner reference and the name are
    /// non-editable.
    pub async fn upsert_model_version(
        &self,
        version: ModelVersion,
        registered_model_id: Option<&str>,
    ) -> Result<ModelVersion, RegistryError> {
        let (merged, storage_name, parent_id) = match &version.id {
            Some(id) => {
                let existing_record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
                let existing = model_version_from_record(&existing_record);
                let parent_id = existing
                    .registered_model_id
                    .as_deref()
                    .map(|id| parse_numeric_id("registered model", id))
                    .transpose()?;
                let merged = merge_model_version(&existing, &version);
                // the storage name is always re-derived from the owner,
                // never taken from the request
                let storage_name = prefix_when_owned(
                    merged.registered_model_id.as_deref(),
                    merged.name.as_deref().unwrap_or_default(),
                );
                (merged, storage_name, parent_id)
            }
            None => {
                let owner = registered_model_id
                    .map(str::to_string)
                    .or_else(|| version.registered_model_id.clone())
                    .ok_or_else(|| {
                        RegistryError::bad_request(
                            "a registered model id is required to create a model version",
                        )
                    })?;
                let owner_numeric = parse_numeric_id("registered model", &owner)?;
                // the owner must exist before anything is written
                self.model_repo.get_by_id(owner_numeric).await?;

                let name = version.name.clone().ok_or_else(|| {
                    RegistryError::bad_request("model version name is required")
                })?;
                let mut version = version;
                version.registered_model_id = Some(owner.clone());
                (
                    version,
                    prefix_when_owned(Some(owner.as_str()), &name),
                    Some(owner_numeric),
                )
            }
        };

        let record = model_version_to_record(&merged, self.type_ids.model_version, storage_name)?;
        let saved = self.repo.save(record, parent_id).await.map_err(|e| {
            remap_conflict(e, KIND, merged.name.as_deref().unwrap_or_default())
        })?;
        tracing::debug!(id = ?saved.id, name = %saved.name, "upserted model version");
        Ok(model_version_from_record(&saved))
    }

    pub async fn get_model_version_by_id(&self, id: &str) -> Result<ModelVersion, RegistryError> {
        let record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
        Ok(model_version_from_record(&record))
    }

    /// Look up a version by (name, registered model id) or by external id.
    pub async fn get_model_version_by_params(
        &self,
        name: Option<String>,
        registered_model_id: Option<&str>,
        external_id: Option<String>,
    ) -> Result<ModelVersion, RegistryError> {
        let record = find_one_scoped(
            self.repo.as_ref(),
            KIND,
            None,
            name,
            registered_model_id,
            external_id,
        )
        .await?;
        Ok(model_version_from_record(&record))
    }

    /// List versions, optionally scoped to one registered model.
    pub async fn get_model_versions(
        &self,
        registered_model_id: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<ModelVersion>, RegistryError> {
        let mut options = ListOptions::new().with_pagination(pagination);
        if let Some(owner) = registered_model_id {
            options = options
                .with_parent_resource_id(parse_numeric_id("registered model", owner)?);
        }
        let page = self.repo.list(options).await?;
        Ok(page.map(|record| model_version_from_record(&record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RegisteredModel;
    use crate::infrastructure::in_memory::InMemoryRecordRepository;
    use crate::infrastructure::services::registered_model_service::RegisteredModelService;

    struct Fixture {
        models: RegisteredModelService,
        versions: ModelVersionService,
    }

    fn fixture() -> Fixture {
        let type_ids = TypeIds::assign();
        let model_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let version_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        Fixture {
            models: RegisteredModelService::new(model_repo.clone(), type_ids),
            versions: ModelVersionService::new(version_repo, model_repo, type_ids),
        }
    }

    async fn create_model(fixture: &Fixture, name: &str) -> String {
        fixture
            .models
            .upsert_registered_model(RegisteredModel::new(name))
            .await
            .unwrap()
            .id
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_version_under_model() {
        let fixture = fixture();
        let model_id = create_model(&fixture, "mnist").await;

        let created = fixture
            .versions
            .upsert_model_version(ModelVersion::new("v1.0"), Some(&model_id))
            .await
            .unwrap();
        assert!(created.id.is_some());
        // the scope prefix never leaks into the entity name
        assert_eq!(created.name.as_deref(), Some("v1.0"));
        assert_eq!(created.registered_model_id.as_deref(), Some(model_id.as_str()));
    }

    #[tokio::test]
    async fn test_create_version_under_missing_model_is_not_found() {
        let fixture = fixture();
        let err = fixture
            .versions
            .upsert_model_version(ModelVersion::new("v1.0"), Some("999"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_same_version_name_under_different_models() {
        let fixture = fixture();
        let first = create_model(&fixture, "mnist").await;
        let second = create_model(&fixture, "fraud").await;

        fixture
            .versions
            .upsert_model_version(ModelVersion::new("v1.0"), Some(&first))
            .await
            .unwrap();
        fixture
            .versions
            .upsert_model_version(ModelVersion::new("v1.0"), Some(&second))
            .await
            .unwrap();

        let err = fixture
            .versions
            .upsert_model_version(ModelVersion::new("v1.0"), Some(&first))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_update_cannot_move_version_to_another_model() {
        let fixture = fixture();
        let first = create_model(&fixture, "mnist").await;
        let second = create_model(&fixture, "fraud").await;

        let created = fixture
            .versions
            .upsert_model_version(ModelVersion::new("v1.0"), Some(&first))
            .await
            .unwrap();

        let mut update = ModelVersion::default();
        update.id = created.id.clone();
        update.registered_model_id = Some(second.clone());
        update.author = Some("alice".to_string());
        let updated = fixture
            .versions
            .upsert_model_version(update, None)
            .await
            .unwrap();

        assert_eq!(updated.registered_model_id.as_deref(), Some(first.as_str()));
        assert_eq!(updated.author.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_get_by_params_with_owner_scope() {
        let fixture = fixture();
        let first = create_model(&fixture, "mnist").await;
        let second = create_model(&fixture, "fraud").await;
        fixture
            .versions
            .upsert_model_version(ModelVersion::new("v1.0"), Some(&first))
            .await
            .unwrap();
        fixture
            .versions
            .upsert_model_version(ModelVersion::new("v1.0"), Some(&second))
            .await
            .unwrap();

        let version = fixture
            .versions
            .get_model_version_by_params(Some("v1.0".to_string()), Some(&second), None)
            .await
            .unwrap();
        assert_eq!(version.registered_model_id.as_deref(), Some(second.as_str()));

        // same name under a parent that has no such version
        let third = create_model(&fixture, "churn").await;
        let err = fixture
            .versions
            .get_model_version_by_params(Some("v1.0".to_string()), Some(&third), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_by_params_name_without_owner_is_bad_request() {
        let fixture = fixture();
        let model_id = create_model(&fixture, "mnist").await;
        fixture
            .versions
            .upsert_model_version(ModelVersion::new("v1.0"), Some(&model_id))
            .await
            .unwrap();

        let err = fixture
            .versions
            .get_model_version_by_params(Some("v1.0".to_string()), None, None)
            .await
            .unwrap_err();
        assert!(err.is_bad_request());
        assert!(err.to_string().contains("name and parentId"));
    }

    #[tokio::test]
    async fn test_list_scoped_to_model() {
        let fixture = fixture();
        let first = create_model(&fixture, "mnist").await;
        let second = create_model(&fixture, "fraud").await;
        for name in ["v1.0", "v1.1"] {
            fixture
                .versions
                .upsert_model_version(ModelVersion::new(name), Some(&first))
                .await
                .unwrap();
        }
        fixture
            .versions
            .upsert_model_version(ModelVersion::new("v1.0"), Some(&second))
            .await
            .unwrap();

        let page = fixture
            .versions
            .get_model_versions(Some(&first), Pagination::new())
            .await
            .unwrap();
        assert_eq!(page.size, 2);

        let all = fixture
            .versions
            .get_model_versions(None, Pagination::new())
            .await
            .unwrap();
        assert_eq!(all.size, 3);
    }
}
