//! Experiment service - tracking experiments that own runs

use std::sync::Arc;

use crate::domain::error::RegistryError;
use crate::domain::experiment::{
    experiment_from_record, experiment_to_record, merge_experiment, Experiment,
};
use crate::domain::mapper::parse_numeric_id;
use crate::domain::record::TypeIds;
use crate::domain::repository::{ListOptions, Page, Pagination, RecordRepository};

use super::common::{find_one, remap_conflict};

const KIND: &str = "experiment";

#[derive(Debug, Clone)]
pub struct ExperimentService {
    repo: Arc<dyn RecordRepository>,
    type_ids: TypeIds,
}

impl ExperimentService {
    pub fn new(repo: Arc<dyn RecordRepository>, type_ids: TypeIds) -> Self {
        Self { repo, type_ids }
    }

    pub async fn upsert_experiment(
        &self,
        experiment: Experiment,
    ) -> Result<Experiment, RegistryError> {
        let (merged, storage_name) = match &experiment.id {
            Some(id) => {
                let existing_record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
                let existing = experiment_from_record(&existing_record);
                (merge_experiment(&existing, &experiment), existing_record.name)
            }
            None => {
                let name = experiment
                    .name
                    .clone()
                    .ok_or_else(|| RegistryError::bad_request("experiment name is required"))?;
                (experiment, name)
            }
        };

        let record = experiment_to_record(&merged, self.type_ids.experiment, storage_name.clone())?;
        let saved = self
            .repo
            .save(record, None)
            .await
            .map_err(|e| remap_conflict(e, KIND, &storage_name))?;
        tracing::debug!(id = ?saved.id, name = %saved.name, "upserted experiment");
        Ok(experiment_from_record(&saved))
    }

    pub async fn get_experiment_by_id(&self, id: &str) -> Result<Experiment, RegistryError> {
        let record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
        Ok(experiment_from_record(&record))
    }

    pub async fn get_experiment_by_params(
        &self,
        name: Option<String>,
        external_id: Option<String>,
    ) -> Result<Experiment, RegistryError> {
        let record = find_one(self.repo.as_ref(), KIND, None, name, external_id).await?;
        Ok(experiment_from_record(&record))
    }

    pub async fn get_experiments(
        &self,
        pagination: Pagination,
    ) -> Result<Page<Experiment>, RegistryError> {
        let page = self
            .repo
            .list(ListOptions::new().with_pagination(pagination))
            .await?;
        Ok(page.map(|record| experiment_from_record(&record)))
    }
}
