//! Experiments and experiment runs

pub mod entity;
pub mod mapper;

pub use entity::{Experiment, ExperimentRun, ExperimentRunStatus, ExperimentState};
pub use mapper::{
    experiment_from_record, experiment_run_from_record, experiment_run_to_record,
    experiment_to_record, merge_experiment, merge_experiment_run, parse_epoch_millis,
};
