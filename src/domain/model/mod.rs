//! Registered models and model versions

pub mod entity;
pub mod mapper;

pub use entity::{ModelVersion, ModelVersionState, RegisteredModel, RegisteredModelState};
pub use mapper::{
    merge_model_version, merge_registered_model, model_version_from_record,
    model_version_to_record, registered_model_from_record, registered_model_to_record,
};
