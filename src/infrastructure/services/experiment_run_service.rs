//! Experiment run service - runs owned by an experiment

use std::sync::Arc;

use crate::domain::error::RegistryError;
use crate::domain::experiment::{
    experiment_run_from_record, experiment_run_to_record, merge_experiment_run, parse_epoch_millis,
    ExperimentRun,
};
use crate::domain::mapper::parse_numeric_id;
use crate::domain::naming::prefix_when_owned;
use crate::domain::record::TypeIds;
use crate::domain::repository::{ListOptions, Page, Pagination, RecordRepository};

use super::common::{find_one_scoped, remap_conflict};

const KIND: &str = "experiment run";

#[derive(Debug, Clone)]
pub struct ExperimentRunService {
    repo: Arc<dyn RecordRepository>,
    experiment_repo: Arc<dyn RecordRepository>,
    type_ids: TypeIds,
}

impl ExperimentRunService {
    pub fn new(
        repo: Arc<dyn RecordRepository>,
        experiment_repo: Arc<dyn RecordRepository>,
        type_ids: TypeIds,
    ) -> Self {
        Self {
            repo,
            experiment_repo,
            type_ids,
        }
    }

    /// Create a run under an experiment, or apply a partial update when an
    /// id is set. The owning experiment reference and the name are
    /// non-editable; when both are set, the end time must not precede the
    /// start time.
    pub async fn upsert_experiment_run(
        &self,
        run: ExperimentRun,
        experiment_id: Option<&str>,
    ) -> Result<ExperimentRun, RegistryError> {
        let (merged, storage_name, parent_id) = match &run.id {
            Some(id) => {
                let existing_record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
                let existing = experiment_run_from_record(&existing_record);
                let parent_id = existing
                    .experiment_id
                    .as_deref()
                    .map(|id| parse_numeric_id("experiment", id))
                    .transpose()?;
                (
                    merge_experiment_run(&existing, &run),
                    existing_record.name,
                    parent_id,
                )
            }
            None => {
                let owner = experiment_id
                    .map(str::to_string)
                    .or_else(|| run.experiment_id.clone())
                    .ok_or_else(|| {
                        RegistryError::bad_request(
                            "an experiment id is required to create an experiment run",
                        )
                    })?;
                let owner_numeric = parse_numeric_id("experiment", &owner)?;
                self.experiment_repo.get_by_id(owner_numeric).await?;

                let name = run.name.clone().ok_or_else(|| {
                    RegistryError::bad_request("experiment run name is required")
                })?;
                let mut run = run;
                run.experiment_id = Some(owner.clone());
                (
                    run,
                    prefix_when_owned(Some(owner.as_str()), &name),
                    Some(owner_numeric),
                )
            }
        };

        validate_run_window(&merged)?;

        let record = experiment_run_to_record(&merged, self.type_ids.experiment_run, storage_name)?;
        let saved = self.repo.save(record, parent_id).await.map_err(|e| {
            remap_conflict(e, KIND, merged.name.as_deref().unwrap_or_default())
        })?;
        tracing::debug!(id = ?saved.id, name = %saved.name, "upserted experiment run");
        Ok(experiment_run_from_record(&saved))
    }

    pub async fn get_experiment_run_by_id(&self, id: &str) -> Result<ExperimentRun, RegistryError> {
        let record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
        Ok(experiment_run_from_record(&record))
    }

    /// Look up a run by (name, experiment id) or by external id.
    pub async fn get_experiment_run_by_params(
        &self,
        name: Option<String>,
        experiment_id: Option<&str>,
        external_id: Option<String>,
    ) -> Result<ExperimentRun, RegistryError> {
        let record = find_one_scoped(
            self.repo.as_ref(),
            KIND,
            None,
            name,
            experiment_id,
            external_id,
        )
        .await?;
        Ok(experiment_run_from_record(&record))
    }

    /// List runs, optionally scoped to one experiment.
    pub async fn get_experiment_runs(
        &self,
        experiment_id: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<ExperimentRun>, RegistryError> {
        let mut options = ListOptions::new().with_pagination(pagination);
        if let Some(owner) = experiment_id {
            options = options.with_parent_resource_id(parse_numeric_id("experiment", owner)?);
        }
        let page = self.repo.list(options).await?;
        Ok(page.map(|record| experiment_run_from_record(&record)))
    }
}

fn validate_run_window(run: &ExperimentRun) -> Result<(), RegistryError> {
    if let (Some(start), Some(end)) = (
        run.start_time_since_epoch.as_deref(),
        run.end_time_since_epoch.as_deref(),
    ) {
        let start = parse_epoch_millis("startTimeSinceEpoch", start)?;
        let end = parse_epoch_millis("endTimeSinceEpoch", end)?;
        if end < start {
            return Err(RegistryError::bad_request(
                "endTimeSinceEpoch must not precede startTimeSinceEpoch",
            ));
        }
    }
    Ok(())
}
