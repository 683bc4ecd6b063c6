//! Domain layer - entities, the attribute substrate, and the contracts
//! the services and repositories are built against

pub mod artifact;
pub mod error;
pub mod experiment;
pub mod filter;
pub mod mapper;
pub mod model;
pub mod naming;
pub mod record;
pub mod repository;
pub mod serving;
pub mod value;

pub use artifact::{Artifact, ArtifactState, DataSet, DocArtifact, Metric, ModelArtifact, Parameter};
pub use error::RegistryError;
pub use experiment::{Experiment, ExperimentRun, ExperimentRunStatus, ExperimentState};
pub use filter::parse_filter_query;
pub use model::{ModelVersion, ModelVersionState, RegisteredModel, RegisteredModelState};
pub use record::{Record, TypeIds};
pub use repository::{ListOptions, OrderBy, Page, Pagination, RecordRepository, SortOrder};
pub use serving::{
    ExecutionState, InferenceService, InferenceServiceState, ServeModel, ServingEnvironment,
};
pub use value::{PropertyMap, PropertyValue};
