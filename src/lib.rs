//! Model registry
//!
//! A metadata registry for machine-learning artifacts: registered models
//! and their versions, the artifact family (model artifacts, docs,
//! datasets, metrics, parameters), serving environments with inference
//! services and serve-model executions, and experiments with runs and an
//! append-only metric history.
//!
//! Entities are persisted as generic typed-attribute records; per-entity
//! mappers reconcile partial updates against persisted state while
//! protecting non-editable fields. Child entities get a scope-prefixed
//! storage name so display names only need to be unique per owner.

pub mod domain;
pub mod infrastructure;

use std::sync::Arc;

use domain::{RecordRepository, TypeIds};
use infrastructure::{
    ArtifactService, ExperimentRunService, ExperimentService, InMemoryRecordRepository,
    InferenceServiceService, ModelVersionService, RegisteredModelService, ServeModelService,
    ServingEnvironmentService,
};

/// All entity services wired over a shared set of repositories.
#[derive(Debug, Clone)]
pub struct Registry {
    pub registered_models: RegisteredModelService,
    pub model_versions: ModelVersionService,
    pub artifacts: ArtifactService,
    pub serving_environments: ServingEnvironmentService,
    pub inference_services: InferenceServiceService,
    pub serve_models: ServeModelService,
    pub experiments: ExperimentService,
    pub experiment_runs: ExperimentRunService,
}

impl Registry {
    /// Wire every service over fresh in-memory repositories. One
    /// repository per entity kind; the artifact family (and its
    /// metric-history shadow records) shares one.
    pub fn new_in_memory() -> Self {
        let type_ids = TypeIds::assign();
        let model_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let version_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let artifact_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let environment_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let service_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let serve_model_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let experiment_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());
        let run_repo: Arc<dyn RecordRepository> = Arc::new(InMemoryRecordRepository::new());

        Self {
            registered_models: RegisteredModelService::new(model_repo.clone(), type_ids),
            model_versions: ModelVersionService::new(
                version_repo.clone(),
                model_repo.clone(),
                type_ids,
            ),
            artifacts: ArtifactService::new(
                artifact_repo,
                version_repo.clone(),
                run_repo.clone(),
                type_ids,
            ),
            serving_environments: ServingEnvironmentService::new(
                environment_repo.clone(),
                type_ids,
            ),
            inference_services: InferenceServiceService::new(
                service_repo.clone(),
                environment_repo,
                model_repo,
                version_repo.clone(),
                type_ids,
            ),
            serve_models: ServeModelService::new(
                serve_model_repo,
                service_repo,
                version_repo,
                type_ids,
            ),
            experiments: ExperimentService::new(experiment_repo.clone(), type_ids),
            experiment_runs: ExperimentRunService::new(run_repo, experiment_repo, type_ids),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new_in_memory()
    }
}
