//! Serving environments, inference services and serve-model executions

pub mod entity;
pub mod mapper;

pub use entity::{
    ExecutionState, InferenceService, InferenceServiceState, ServeModel, ServingEnvironment,
};
pub use mapper::{
    inference_service_from_record, inference_service_to_record, merge_inference_service,
    merge_serve_model, merge_serving_environment, serve_model_from_record, serve_model_to_record,
    serving_environment_from_record, serving_environment_to_record,
};
