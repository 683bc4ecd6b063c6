//! Experiment lineage entities

use serde::{Deserialize, Serialize};

use crate::domain::value::PropertyMap;

/// Lifecycle state of an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExperimentState {
    Live,
    Archived,
}

impl ExperimentState {
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

/// Progress status of an experiment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExperimentRunStatus {
    Running,
    Finished,
    Failed,
    Killed,
}

impl ExperimentRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
            Self::Killed => "KILLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RUNNING" => Some(Self::Running),
            "FINISHED" => Some(Self::Finished),
            "FAILED" => Some(Self::Failed),
            "KILLED" => Some(Self::Killed),
            _ => None,
        }
    }
}

/// A top-level experiment container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    pub owner: Option<String>,
    pub state: Option<ExperimentState>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

impl Experiment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// One run of an experiment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRun {
    pub id: Option<String>,
    /// Display name; unique within the owning experiment
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_id: Option<String>,
    /// Owning experiment; non-editable once the run exists
    pub experiment_id: Option<String>,
    pub owner: Option<String>,
    pub status: Option<ExperimentRunStatus>,
    pub state: Option<ExperimentState>,
    /// Epoch millis as a string
    pub start_time_since_epoch: Option<String>,
    /// Epoch millis as a string; must not precede the start time
    pub end_time_since_epoch: Option<String>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
    pub custom_properties: Option<PropertyMap>,
}

impl ExperimentRun {
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
    fn test_run_status_round_trip() {
        for status in [
            ExperimentRunStatus::Running,
            ExperimentRunStatus::Finished,
            ExperimentRunStatus::Failed,
            ExperimentRunStatus::Killed,
        ] {
            assert_eq!(ExperimentRunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ExperimentRunStatus::parse("PAUSED"), None);
    }
}
