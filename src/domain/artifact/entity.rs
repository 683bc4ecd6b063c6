//! Artifact entities
//!
//! An artifact is exactly one of five variants; the enum makes the
//! "one active case" invariant a type-level guarantee. Artifacts are
//! optionally owned by a model version or an experiment run.

use serde::{Deserialize, Serialize};

use crate::domain::value::PropertyMap;

/// Lifecycle state shared by all artifact kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactState {
    Unknown,
    Pending,
    Live,
    MarkedForDeletion,
    Deleted,
    Abandoned,
    Reference,
}

impl ArtifactState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Pending => "PENDING",
            Self::Live => "LIVE",
            Self::MarkedForDeletion => "MARKED_FOR_DELETION",
            Self::Deleted => "DELETED",
            Self::Abandoned => "ABANDONED",
            Self::Reference => "REFERENCE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNKNOWN" => Some(Self::Unknown),
            "PENDING" => Some(Self::Pending),
            "LIVE" => Some(Self::Live),
            "MARKED_FOR_DELETION" => Some(Self::MarkedForDeletion),
            "DELETED" => Some(Self::Deleted),
            "ABANDONED" => Some(Self::Abandoned),
            "REFERENCE" => Some(Self::Reference),
            _ => None,
        }
    }
}

/// A trained model binary or checkpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    pub uri: Option<String>,
    pub state: Option<ArtifactState>,
    pub model_format_name: Option<String>,
    pub model_format_version: Option<String>,
    pub storage_key: Option<String>,
    pub storage_path: Option<String>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

/// A documentation artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocArtifact {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    pub uri: Option<String>,
    pub state: Option<ArtifactState>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

/// A dataset reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    pub uri: Option<String>,
    pub state: Option<ArtifactState>,
    pub digest: Option<String>,
    pub source_type: Option<String>,
    pub source: Option<String>,
    pub schema: Option<String>,
    pub profile: Option<String>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

/// A scalar metric observation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    pub state: Option<ArtifactState>,
    pub value: Option<f64>,
    /// Epoch millis of the observation, as a string
    pub timestamp: Option<String>,
    pub step: Option<i64>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

/// A logged hyperparameter or run parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    pub state: Option<ArtifactState>,
    pub value: Option<String>,
    pub parameter_type: Option<String>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

/// Tagged artifact union
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Artifact {
    ModelArtifact(ModelArtifact),
    DocArtifact(DocArtifact),
    DataSet(DataSet),
    Metric(Metric),
    Parameter(Parameter),
}

impl Artifact {
    /// API-visible artifact type name; non-editable
    pub fn artifact_type(&self) -> &'static str {
        match self {
            Self::ModelArtifact(_) => "model-artifact",
            Self::DocArtifact(_) => "doc-artifact",
            Self::DataSet(_) => "dataset-artifact",
            Self::Metric(_) => "metric",
            Self::Parameter(_) => "parameter",
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::ModelArtifact(a) => a.id.as_deref(),
            Self::DocArtifact(a) => a.id.as_deref(),
            Self::DataSet(a) => a.id.as_deref(),
            Self::Metric(a) => a.id.as_deref(),
            Self::Parameter(a) => a.id.as_deref(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::ModelArtifact(a) => a.name.as_deref(),
            Self::DocArtifact(a) => a.name.as_deref(),
            Self::DataSet(a) => a.name.as_deref(),
            Self::Metric(a) => a.name.as_deref(),
            Self::Parameter(a) => a.name.as_deref(),
        }
    }

    pub fn as_metric(&self) -> Option<&Metric> {
        match self {
            Self::Metric(metric) => Some(metric),
            _ => None,
        }
    }
}
