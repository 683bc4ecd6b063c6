//! Artifact service - the artifact family plus the metric-history subsystem
//!
//! All artifact kinds share one repository; listings restrict by type id so
//! regular artifacts and metric-history records never mix. Metric history is
//! derived here: every metric written under an experiment run additionally
//! produces one immutable history record.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::artifact::{
    artifact_from_record, artifact_to_record, merge_artifact, metric_to_record, Artifact, Metric,
};
use crate::domain::error::RegistryError;
use crate::domain::mapper::{keys, parse_numeric_id};
use crate::domain::naming::{metric_history_name, prefix_when_owned, strip_history_suffix};
use crate::domain::record::TypeIds;
use crate::domain::repository::{ListOptions, Page, Pagination, RecordRepository};

use super::common::{find_one_scoped, remap_conflict};

const KIND: &str = "artifact";

/// Bound on timestamp bumps when a metric-history name is already taken
const MAX_HISTORY_NAME_ATTEMPTS: usize = 16;

/// Service for the artifact family (model artifacts, docs, datasets,
/// metrics, parameters) and the derived metric history.
#[derive(Debug, Clone)]
pub struct ArtifactService {
    repo: Arc<dyn RecordRepository>,
    version_repo: Arc<dyn RecordRepository>,
    run_repo: Arc<dyn RecordRepository>,
    type_ids: TypeIds,
}

impl ArtifactService {
    pub fn new(
        repo: Arc<dyn RecordRepository>,
        version_repo: Arc<dyn RecordRepository>,
        run_repo: Arc<dyn RecordRepository>,
        type_ids: TypeIds,
    ) -> Self {
        Self {
            repo,
            version_repo,
            run_repo,
            type_ids,
        }
    }

    /// Type ids of the externally visible artifact kinds. Metric-history
    /// records are excluded so they never surface in artifact listings.
    fn artifact_type_ids(&self) -> Vec<i32> {
        vec![
            self.type_ids.model_artifact,
            self.type_ids.doc_artifact,
            self.type_ids.dataset_artifact,
            self.type_ids.metric_artifact,
            self.type_ids.parameter_artifact,
        ]
    }

    /// Attribute an artifact to a model version.
    pub async fn upsert_model_version_artifact(
        &self,
        artifact: Artifact,
        model_version_id: &str,
    ) -> Result<Artifact, RegistryError> {
        let parent = parse_numeric_id("model version", model_version_id)?;
        self.version_repo.get_by_id(parent).await?;
        self.upsert_scoped(artifact, model_version_id, Some(parent))
            .await
    }

    /// Attribute an artifact to an experiment run. A metric write also
    /// produces one metric-history record; the insertion is part of the
    /// same logical call and its failure fails the whole upsert.
    pub async fn upsert_experiment_run_artifact(
        &self,
        artifact: Artifact,
        experiment_run_id: &str,
    ) -> Result<Artifact, RegistryError> {
        let parent = parse_numeric_id("experiment run", experiment_run_id)?;
        self.run_repo.get_by_id(parent).await?;
        let saved = self
            .upsert_scoped(artifact, experiment_run_id, Some(parent))
            .await?;
        if let Some(metric) = saved.as_metric() {
            self.insert_metric_history(metric, experiment_run_id, parent)
                .await?;
        }
        Ok(saved)
    }

    /// Create or update an artifact without an owning entity. A synthetic
    /// scope id keeps the stored name unique without reserving the bare
    /// display name.
    pub async fn upsert_artifact(&self, artifact: Artifact) -> Result<Artifact, RegistryError> {
        let scope = Uuid::new_v4().to_string();
        self.upsert_scoped(artifact, &scope, None).await
    }

    async fn upsert_scoped(
        &self,
        artifact: Artifact,
        scope_id: &str,
        parent: Option<i32>,
    ) -> Result<Artifact, RegistryError> {
        let (merged, storage_name, parent) = match artifact.id() {
            Some(id) => {
                let existing_record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
                let existing = artifact_from_record(&existing_record, &self.type_ids)?;
                (
                    merge_artifact(&existing, &artifact)?,
                    existing_record.name,
                    None,
                )
            }
            None => {
                let name = artifact
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                (
                    artifact,
                    prefix_when_owned(Some(scope_id), &name),
                    parent,
                )
            }
        };

        let record = artifact_to_record(&merged, &self.type_ids, storage_name)?;
        let saved = self.repo.save(record, parent).await.map_err(|e| {
            remap_conflict(e, KIND, merged.name().unwrap_or_default())
        })?;
        tracing::debug!(
            id = ?saved.id,
            name = %saved.name,
            artifact_type = merged.artifact_type(),
            "upserted artifact"
        );
        artifact_from_record(&saved, &self.type_ids)
    }

    pub async fn get_artifact_by_id(&self, id: &str) -> Result<Artifact, RegistryError> {
        let record = self.repo.get_by_id(parse_numeric_id(KIND, id)?).await?;
        artifact_from_record(&record, &self.type_ids)
    }

    /// Look up an artifact by (name, owning scope id) or by external id.
    pub async fn get_artifact_by_params(
        &self,
        name: Option<String>,
        scope_id: Option<&str>,
        external_id: Option<String>,
    ) -> Result<Artifact, RegistryError> {
        let record = find_one_scoped(
            self.repo.as_ref(),
            KIND,
            Some(self.artifact_type_ids()),
            name,
            scope_id,
            external_id,
        )
        .await?;
        artifact_from_record(&record, &self.type_ids)
    }

    /// List artifacts, optionally scoped to one owning entity (a model
    /// version or an experiment run).
    pub async fn get_artifacts(
        &self,
        scope_id: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<Artifact>, RegistryError> {
        let mut options = ListOptions::new()
            .with_pagination(pagination)
            .with_type_ids(self.artifact_type_ids());
        if let Some(scope) = scope_id {
            options = options.with_parent_resource_id(parse_numeric_id("scope", scope)?);
        }
        let page = self.repo.list(options).await?;
        self.map_artifact_page(page)
    }

    /// Materialize one immutable history record for a metric write.
    async fn insert_metric_history(
        &self,
        metric: &Metric,
        experiment_run_id: &str,
        parent: i32,
    ) -> Result<(), RegistryError> {
        let metric_name = metric.name.as_deref().unwrap_or_default();
        let mut timestamp = metric
            .last_update_time_since_epoch
            .clone()
            .or_else(|| metric.timestamp.clone())
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis().to_string());

        // two writes within the same millisecond would collide on the
        // timestamped name; bump until a free slot is found
        let mut last_err = None;
        for _ in 0..MAX_HISTORY_NAME_ATTEMPTS {
            let storage_name = metric_history_name(experiment_run_id, metric_name, &timestamp);
            let mut record =
                metric_to_record(metric, self.type_ids.metric_history, storage_name)?;
            // always an insert, never an update of an earlier history record
            record.id = None;
            record.external_id = None;
            record.custom_properties.remove(keys::EXPERIMENT_ID);
            record.custom_properties.remove(keys::EXPERIMENT_RUN_ID);

            match self.repo.save(record, Some(parent)).await {
                Ok(_) => {
                    tracing::debug!(
                        run = experiment_run_id,
                        metric = metric_name,
                        "recorded metric history"
                    );
                    return Ok(());
                }
                Err(err) if err.is_conflict() => {
                    let millis = timestamp
                        .parse::<i64>()
                        .unwrap_or_else(|_| chrono::Utc::now().timestamp_millis());
                    timestamp = (millis + 1).to_string();
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            RegistryError::internal("failed to allocate a metric history name")
        }))
    }

    /// Read back the history of metric writes under a run, optionally
    /// narrowed to one metric name and/or a comma-separated set of steps.
    pub async fn get_experiment_run_metric_history(
        &self,
        name: Option<&str>,
        step_ids: Option<&str>,
        experiment_run_id: &str,
        pagination: Pagination,
    ) -> Result<Page<Metric>, RegistryError> {
        let parent = parse_numeric_id("experiment run", experiment_run_id)?;
        self.run_repo.get_by_id(parent).await?;

        let mut clauses: Vec<String> = Vec::new();
        if let Some(step_ids) = step_ids {
            let steps: Vec<String> = step_ids
                .split(',')
                .map(|s| {
                    s.trim()
                        .parse::<i64>()
                        .map(|step| format!("{}.int_value = {}", keys::STEP, step))
                        .map_err(|_| {
                            RegistryError::bad_request(format!("invalid step id '{}'", s.trim()))
                        })
                })
                .collect::<Result<_, _>>()?;
            if !steps.is_empty() {
                clauses.push(format!("({})", steps.join(" OR ")));
            }
        }

        let mut pagination = pagination;
        if !clauses.is_empty() {
            let combined = match pagination.filter_query.take() {
                Some(existing) if !existing.trim().is_empty() => {
                    format!("({}) AND {}", existing, clauses.join(" AND "))
                }
                _ => clauses.join(" AND "),
            };
            pagination = pagination.with_filter_query(combined);
        }

        let mut options = ListOptions::new()
            .with_pagination(pagination)
            .with_parent_resource_id(parent)
            .with_type_ids(vec![self.type_ids.metric_history]);
        // the metric name narrows structurally on the stored name, never
        // through the filter grammar, so wildcard or quote characters in
        // the name carry no meaning
        let base = name.map(|n| prefix_when_owned(Some(experiment_run_id), n));
        if let Some(name) = name {
            options = options.with_name_prefix(metric_history_name(experiment_run_id, name, ""));
        }
        let page = self.repo.list(options).await?;

        let mut items = Vec::with_capacity(page.items.len());
        for record in &page.items {
            // the prefix match is loose when a metric name itself contains
            // the history separator; keep only exact logical-name matches
            if let Some(base) = &base {
                if strip_history_suffix(&record.name) != base.as_str() {
                    continue;
                }
            }
            let artifact = artifact_from_record(record, &self.type_ids)?;
            if let Artifact::Metric(mut metric) = artifact {
                // callers see the logical metric name, not the history key
                metric.name = metric
                    .name
                    .map(|n| strip_history_suffix(&n).to_string());
                items.push(metric);
            }
        }
        let size = items.len() as i32;
        Ok(Page {
            items,
            next_page_token: page.next_page_token,
            page_size: page.page_size,
            size,
        })
    }

    fn map_artifact_page(&self, page: Page<crate::domain::record::Record>) -> Result<Page<Artifact>, RegistryError> {
        let mut items = Vec::with_capacity(page.items.len());
        for record in &page.items {
            items.push(artifact_from_record(record, &self.type_ids)?);
        }
        Ok(Page {
            items,
            next_page_token: page.next_page_token,
            page_size: page.page_size,
            size: page.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::{DocArtifact, ModelArtifact};
    use crate::domain::experiment::{Experiment, ExperimentRun};
    use crate::domain::model::{ModelVersion, RegisteredModel};
    use crate::infrastructure::in_memory::InMemoryRecordRepository;
    use crate::infrastructure::services::experiment_run_service::ExperimentRunService;
    use crate::infrastructure::services::experiment_service::ExperimentService;
    use crate::infrastructure::services::model_version_service::ModelVersionService;
    use crate::infrastructure::services::registered_model_service::RegisteredModelService;

    struct Fixture {
        artifacts: ArtifactService,
        versions: ModelVersionService,
        runs: ExperimentRunService,
        experiments: ExperimentService,
        models: RegisteredModelService,
    }

    fn fixture() -> Fixture {
        let type_ids = TypeIds::assign();
        let model_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let version_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let experiment_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let run_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let artifact_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        Fixture {
            artifacts: ArtifactService::new(
                artifact_repo,
                version_repo.clone(),
                run_repo.clone(),
                type_ids,
            ),
            versions: ModelVersionService::new(version_repo, model_repo.clone(), type_ids),
            runs: ExperimentRunService::new(run_repo, experiment_repo.clone(), type_ids),
            experiments: ExperimentService::new(experiment_repo, type_ids),
            models: RegisteredModelService::new(model_repo, type_ids),
        }
    }

    async fn create_version(fixture: &Fixture) -> String {
        let model = fixture
            .models
            .upsert_registered_model(RegisteredModel::new("mnist"))
            .await
            .unwrap();
        fixture
            .versions
            .upsert_model_version(ModelVersion::new("v1.0"), model.id.as_deref())
            .await
            .unwrap()
            .id
            .unwrap()
    }

    async fn create_run(fixture: &Fixture) -> String {
        let experiment = fixture
            .experiments
            .upsert_experiment(Experiment::new("exp"))
            .await
            .unwrap();
        fixture
            .runs
            .upsert_experiment_run(ExperimentRun::new("run-1"), experiment.id.as_deref())
            .await
            .unwrap()
            .id
            .unwrap()
    }

    fn model_artifact(name: &str, uri: &str) -> Artifact {
        let mut artifact = ModelArtifact::default();
        artifact.name = Some(name.to_string());
        artifact.uri = Some(uri.to_string());
        Artifact::ModelArtifact(artifact)
    }

    fn metric(name: &str, value: f64, step: i64) -> Artifact {
        let mut metric = Metric::default();
        metric.name = Some(name.to_string());
        metric.value = Some(value);
        metric.step = Some(step);
        Artifact::Metric(metric)
    }

    #[tokio::test]
    async fn test_upsert_model_version_artifact() {
        let fixture = fixture();
        let version_id = create_version(&fixture).await;

        let created = fixture
            .artifacts
            .upsert_model_version_artifact(model_artifact("weights", "s3://b/w"), &version_id)
            .await
            .unwrap();
        assert!(created.id().is_some());
        assert_eq!(created.name(), Some("weights"));
    }

    #[tokio::test]
    async fn test_artifact_under_missing_version_is_not_found() {
        let fixture = fixture();
        let err = fixture
            .artifacts
            .upsert_model_version_artifact(model_artifact("weights", "s3://b/w"), "999")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_artifact_type_is_not_editable() {
        let fixture = fixture();
        let version_id = create_version(&fixture).await;
        let created = fixture
            .artifacts
            .upsert_model_version_artifact(model_artifact("weights", "s3://b/w"), &version_id)
            .await
            .unwrap();

        let mut doc = DocArtifact::default();
        doc.id = created.id().map(str::to_string);
        let err = fixture
            .artifacts
            .upsert_model_version_artifact(Artifact::DocArtifact(doc), &version_id)
            .await
            .unwrap_err();
        assert!(err.is_bad_request());
        assert!(err.to_string().contains("not editable"));
    }

    #[tokio::test]
    async fn test_unowned_artifact_does_not_reserve_display_name() {
        let fixture = fixture();
        let first = fixture
            .artifacts
            .upsert_artifact(model_artifact("weights", "s3://b/1"))
            .await
            .unwrap();
        let second = fixture
            .artifacts
            .upsert_artifact(model_artifact("weights", "s3://b/2"))
            .await
            .unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_unowned_artifact_without_name_gets_one() {
        let fixture = fixture();
        let created = fixture
            .artifacts
            .upsert_artifact(Artifact::ModelArtifact(ModelArtifact::default()))
            .await
            .unwrap();
        assert!(created.name().is_some_and(|n| !n.is_empty()));
    }

    #[tokio::test]
    async fn test_metric_upsert_under_run_records_history() {
        let fixture = fixture();
        let run_id = create_run(&fixture).await;

        fixture
            .artifacts
            .upsert_experiment_run_artifact(metric("accuracy", 0.91, 1), &run_id)
            .await
            .unwrap();

        let history = fixture
            .artifacts
            .get_experiment_run_metric_history(None, None, &run_id, Pagination::new())
            .await
            .unwrap();
        assert_eq!(history.size, 1);
        assert_eq!(history.items[0].name.as_deref(), Some("accuracy"));
        assert_eq!(history.items[0].value, Some(0.91));
    }

    #[tokio::test]
    async fn test_repeated_metric_writes_produce_distinct_history() {
        let fixture = fixture();
        let run_id = create_run(&fixture).await;

        let created = fixture
            .artifacts
            .upsert_experiment_run_artifact(metric("accuracy", 0.91, 1), &run_id)
            .await
            .unwrap();

        // no delay: even two writes inside the same millisecond must land
        // as two history records
        let mut update = Metric::default();
        update.id = created.id().map(str::to_string);
        update.value = Some(0.95);
        update.step = Some(2);
        fixture
            .artifacts
            .upsert_experiment_run_artifact(Artifact::Metric(update), &run_id)
            .await
            .unwrap();

        let history = fixture
            .artifacts
            .get_experiment_run_metric_history(
                Some("accuracy"),
                None,
                &run_id,
                Pagination::new(),
            )
            .await
            .unwrap();
        assert_eq!(history.size, 2);
        // every history item reports the logical name, suffix stripped
        assert!(history
            .items
            .iter()
            .all(|m| m.name.as_deref() == Some("accuracy")));
    }

    #[tokio::test]
    async fn test_metric_history_name_filter_is_exact() {
        let fixture = fixture();
        let run_id = create_run(&fixture).await;
        fixture
            .artifacts
            .upsert_experiment_run_artifact(metric("loss", 0.4, 1), &run_id)
            .await
            .unwrap();
        fixture
            .artifacts
            .upsert_experiment_run_artifact(metric("loss2", 0.7, 1), &run_id)
            .await
            .unwrap();

        let history = fixture
            .artifacts
            .get_experiment_run_metric_history(Some("loss"), None, &run_id, Pagination::new())
            .await
            .unwrap();
        assert_eq!(history.size, 1);
        assert_eq!(history.items[0].name.as_deref(), Some("loss"));
        assert_eq!(history.items[0].value, Some(0.4));

        // quote characters in the name are inert
        let quoted = fixture
            .artifacts
            .get_experiment_run_metric_history(Some("lo'ss"), None, &run_id, Pagination::new())
            .await
            .unwrap();
        assert_eq!(quoted.size, 0);
    }

    #[tokio::test]
    async fn test_metric_update_under_missing_run_is_not_found() {
        let fixture = fixture();
        let run_id = create_run(&fixture).await;
        let created = fixture
            .artifacts
            .upsert_experiment_run_artifact(metric("accuracy", 0.91, 1), &run_id)
            .await
            .unwrap();

        let mut update = Metric::default();
        update.id = created.id().map(str::to_string);
        update.value = Some(0.95);
        let err = fixture
            .artifacts
            .upsert_experiment_run_artifact(Artifact::Metric(update), "999")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        // the rejected update left no history behind
        let history = fixture
            .artifacts
            .get_experiment_run_metric_history(None, None, &run_id, Pagination::new())
            .await
            .unwrap();
        assert_eq!(history.size, 1);
    }

    #[tokio::test]
    async fn test_metric_history_step_filter() {
        let fixture = fixture();
        let run_id = create_run(&fixture).await;
        for step in [1, 2, 3] {
            fixture
                .artifacts
                .upsert_experiment_run_artifact(
                    metric(&format!("loss-{}", step), 0.5, step),
                    &run_id,
                )
                .await
                .unwrap();
        }

        let history = fixture
            .artifacts
            .get_experiment_run_metric_history(None, Some("1,3"), &run_id, Pagination::new())
            .await
            .unwrap();
        assert_eq!(history.size, 2);
        let steps: Vec<i64> = history.items.iter().filter_map(|m| m.step).collect();
        assert!(steps.contains(&1) && steps.contains(&3) && !steps.contains(&2));
    }

    #[tokio::test]
    async fn test_metric_history_invalid_step_ids() {
        let fixture = fixture();
        let run_id = create_run(&fixture).await;
        let err = fixture
            .artifacts
            .get_experiment_run_metric_history(None, Some("1,x"), &run_id, Pagination::new())
            .await
            .unwrap_err();
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn test_history_records_never_surface_in_artifact_listings() {
        let fixture = fixture();
        let run_id = create_run(&fixture).await;
        fixture
            .artifacts
            .upsert_experiment_run_artifact(metric("accuracy", 0.91, 1), &run_id)
            .await
            .unwrap();

        // one metric artifact, one shadow history record; only the
        // artifact is listed
        let page = fixture
            .artifacts
            .get_artifacts(Some(&run_id), Pagination::new())
            .await
            .unwrap();
        assert_eq!(page.size, 1);
        assert_eq!(page.items[0].artifact_type(), "metric");
    }

    #[tokio::test]
    async fn test_get_artifact_by_params() {
        let fixture = fixture();
        let version_id = create_version(&fixture).await;
        let mut artifact = ModelArtifact::default();
        artifact.name = Some("weights".to_string());
        artifact.external_id = Some("ext-9".to_string());
        fixture
            .artifacts
            .upsert_model_version_artifact(Artifact::ModelArtifact(artifact), &version_id)
            .await
            .unwrap();

        let by_name = fixture
            .artifacts
            .get_artifact_by_params(Some("weights".to_string()), Some(&version_id), None)
            .await
            .unwrap();
        assert_eq!(by_name.name(), Some("weights"));

        let by_external = fixture
            .artifacts
            .get_artifact_by_params(None, None, Some("ext-9".to_string()))
            .await
            .unwrap();
        assert_eq!(by_external.id(), by_name.id());
    }

    #[tokio::test]
    async fn test_get_artifact_by_params_name_requires_scope() {
        let fixture = fixture();
        let version_id = create_version(&fixture).await;
        fixture
            .artifacts
            .upsert_model_version_artifact(model_artifact("weights", "s3://b/w"), &version_id)
            .await
            .unwrap();

        let err = fixture
            .artifacts
            .get_artifact_by_params(Some("weights".to_string()), None, None)
            .await
            .unwrap_err();
        assert!(err.is_bad_request());
        assert!(err.to_string().contains("name and parentId"));
    }
}
