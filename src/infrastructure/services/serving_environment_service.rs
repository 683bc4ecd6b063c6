//! Serving environment service

use std::sync::Arc;

use crate::domain::error::RegistryError;
use crate::domain::mapper::parse_numeric_id;
use crate::domain::record::TypeIds;
use crate::domain::repository::{ListOptions, Page, Pagination, RecordRepository};
use crate::domain::serving::{
    merge_serving_environment, serving_environment_from_record, serving_environment_to_record,
    ServingEnvironment,
};

use super::common::{find_one, remap_conflict};

const KIND: &str = "serving environment";

#[derive(Debug, Clone)]
pub struct ServingEnvironmentService {
    repo: Arc<dyn RecordRepository>,
    type_ids: TypeIds,
}

impl ServingEnvironmentService {
    pub fn new(repo: Arc<dyn RecordRepository>, type_ids: TypeIds) -> Self {
        Self { repo, type_ids }
    }

    pub async fn upsert_serving_environment(
        &self,
        environment: ServingEnvironment,
    ) -> Result<ServingEnvironment, RegistryError> {
        let (merged, storage_name) = match &environment.id {
            Some(id) => {
                let existing_record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
                let existing = serving_environment_from_record(&existing_record);
                (
                    merge_serving_environment(&existing, &environment),
                    existing_record.name,
                )
            }
            None => {
                let name = environment.name.clone().ok_or_else(|| {
                    RegistryError::bad_request("serving environment name is required")
                })?;
                (environment, name)
            }
        };

        let record = serving_environment_to_record(
            &merged,
            self.type_ids.serving_environment,
            storage_name.clone(),
        )?;
        let saved = self
            .repo
            .save(record, None)
            .await
            .map_err(|e| remap_conflict(e, KIND, &storage_name))?;
        tracing::debug!(id = ?saved.id, name = %saved.name, "upserted serving environment");
        Ok(serving_environment_from_record(&saved))
    }

    pub async fn get_serving_environment_by_id(
        &self,
        id: &str,
    ) -> Result<ServingEnvironment, RegistryError> {
        let record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
        Ok(serving_environment_from_record(&record))
    }

    pub async fn get_serving_environment_by_params(
        &self,
        name: Option<String>,
        external_id: Option<String>,
    ) -> Result<ServingEnvironment, RegistryError> {
        let record = find_one(self.repo.as_ref(), KIND, None, name, external_id).await?;
        Ok(serving_environment_from_record(&record))
    }

    pub async fn get_serving_environments(
        &self,
        pagination: Pagination,
    ) -> Result<Page<ServingEnvironment>, RegistryError> {
        let page = self
            .repo
            .list(ListOptions::new().with_pagination(pagination))
            .await?;
        Ok(page.map(|record| serving_environment_from_record(&record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryRecordRepository;

    fn service() -> ServingEnvironmentService {
        ServingEnvironmentService::new(
            Arc::new(InMemoryRecordRepository::new()),
            TypeIds::assign(),
        )
    }

    #[tokio::test]
    async fn test_create_get_list() {
        let service = service();
        let created = service
            .upsert_serving_environment(ServingEnvironment::new("prod"))
            .await
            .unwrap();

        let fetched = service
            .get_serving_environment_by_id(created.id.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(fetched.name.as_deref(), Some("prod"));

        let page = service
            .get_serving_environments(Pagination::new())
            .await
            .unwrap();
        assert_eq!(page.size, 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let service = service();
        service
            .upsert_serving_environment(ServingEnvironment::new("prod"))
            .await
            .unwrap();
        let err = service
            .upsert_serving_environment(ServingEnvironment::new("prod"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }
}
