//! Infrastructure: repository implementations, entity services, logging

pub mod in_memory;
pub mod logging;
pub mod services;

pub use in_memory::InMemoryRecordRepository;
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use services::{
    ArtifactService, ExperimentRunService, ExperimentService, InferenceServiceService,
    ModelVersionService, RegisteredModelService, ServeModelService, ServingEnvironmentService,
};
