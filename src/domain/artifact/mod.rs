//! Artifacts: the five-variant tagged union and its mapping

pub mod entity;
pub mod mapper;

pub use entity::{Artifact, ArtifactState, DataSet, DocArtifact, Metric, ModelArtifact, Parameter};
pub use mapper::{artifact_from_record, artifact_to_record, merge_artifact, metric_to_record};
