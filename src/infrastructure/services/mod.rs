//! Entity services

mod artifact_service;
mod common;
mod experiment_run_service;
mod experiment_service;
mod inference_service_service;
mod model_version_service;
mod registered_model_service;
mod serve_model_service;
mod serving_environment_service;

pub use artifact_service::ArtifactService;
pub use experiment_run_service::ExperimentRunService;
pub use experiment_service::ExperimentService;
pub use inference_service_service::InferenceServiceService;
pub use model_version_service::ModelVersionService;
pub use registered_model_service::RegisteredModelService;
pub use serve_model_service::ServeModelService;
pub use serving_environment_service::ServingEnvironmentService;
