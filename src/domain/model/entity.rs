//! Registered model and model version entities
//!
//! Public entity shapes use per-field `Option`: an unset field is ignored
//! on update, while an explicitly set empty string is a real update.

use serde::{Deserialize, Serialize};

use crate::domain::value::PropertyMap;

/// Lifecycle state of a registered model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegisteredModelState {
    Live,
    Archived,
}

impl RegisteredModelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::Archived => "ARCHIVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LIVE" => Some(Self::Live),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Lifecycle state of a model version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelVersionState {
    Live,
    Archived,
}

impl ModelVersionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::Archived => "ARCHIVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LIVE" => Some(Self::Live),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// A registered model: the top-level container for model versions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisteredModel {
    /// Server-assigned numeric-string id; `None` signals create
    pub id: Option<String>,
    /// Display name; immutable after creation
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    pub owner: Option<String>,
    pub state: Option<RegisteredModelState>,
    /// Server-assigned, epoch millis as a string
    pub create_time_since_epoch: Option<String>,
    /// Server-assigned, epoch millis as a string
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

impl RegisteredModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A version of a registered model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub id: Option<String>,
    /// Display name; unique within the owning registered model
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    /// Owning registered model; non-editable once the version exists
    pub registered_model_id: Option<String>,
    pub author: Option<String>,
    pub state: Option<ModelVersionState>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

impl ModelVersion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        assert_eq!(
            RegisteredModelState::parse("ARCHIVED"),
            Some(RegisteredModelState::Archived)
        );
        assert_eq!(RegisteredModelState::Live.as_str(), "LIVE");
        assert_eq!(RegisteredModelState::parse("GONE"), None);
    }

    #[test]
    fn test_new_model_has_only_name() {
        let model = RegisteredModel::new("mnist");
        assert_eq!(model.name.as_deref(), Some("mnist"));
        assert!(model.id.is_none());
        assert!(model.custom_properties.is_none());
    }
}
