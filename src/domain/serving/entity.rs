//! Serving entities: environments, inference services, serve-model runs

use serde::{Deserialize, Serialize};

use crate::domain::value::PropertyMap;

/// Desired state of an inference service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InferenceServiceState {
    Deployed,
    Undeployed,
}

impl InferenceServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployed => "DEPLOYED",
            Self::Undeployed => "UNDEPLOYED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DEPLOYED" => Some(Self::Deployed),
            "UNDEPLOYED" => Some(Self::Undeployed),
            _ => None,
        }
    }
}

/// Execution state of a serve-model run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionState {
    Unknown,
    New,
    Running,
    Complete,
    Failed,
    Cached,
    Canceled,
}

impl ExecutionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::New => "NEW",
            Self::Running => "RUNNING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
            Self::Cached => "CACHED",
            Self::Canceled => "CANCELED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNKNOWN" => Some(Self::Unknown),
            "NEW" => Some(Self::New),
            "RUNNING" => Some(Self::Running),
            "COMPLETE" => Some(Self::Complete),
            "FAILED" => Some(Self::Failed),
            "CACHED" => Some(Self::Cached),
            "CANCELED" => Some(Self::Canceled),
            _ => None,
        }
    }
}

/// A target environment models are served into
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServingEnvironment {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

impl ServingEnvironment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// An inference service deployed into a serving environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceService {
    pub id: Option<String>,
    /// Display name; unique within the owning serving environment
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    /// Owning environment; non-editable once the service exists
    pub serving_environment_id: Option<String>,
    /// Served model; non-editable once the service exists
    pub registered_model_id: Option<String>,
    /// Pinned version; editable, resolves to the latest version when unset
    pub model_version_id: Option<String>,
    pub runtime: Option<String>,
    pub desired_state: Option<InferenceServiceState>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

impl InferenceService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// One serve-model execution of a model version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServeModel {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    /// Served version; non-editable once the execution exists
    pub model_version_id: Option<String>,
    pub last_known_state: Option<ExecutionState>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

impl ServeModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}
