//! Experiment lineage mapping and merge rules

use crate::domain::error::RegistryError;
use crate::domain::mapper::{
    format_id, insert_int, insert_string, int_prop, keys, merged, millis_string, parse_numeric_id,
    string_prop,
};
use crate::domain::naming::strip_scope_prefix;
use crate::domain::record::Record;

use super::entity::{Experiment, ExperimentRun, ExperimentRunStatus, ExperimentState};

pub fn merge_experiment(existing: &Experiment, incoming: &Experiment) -> Experiment {
    Experiment {
        id: existing.id.clone(),
        name: existing.name.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        owner: merged(&incoming.owner, &existing.owner),
        state: merged(&incoming.state, &existing.state),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

pub fn merge_experiment_run(existing: &ExperimentRun, incoming: &ExperimentRun) -> ExperimentRun {
    ExperimentRun {
        id: existing.id.clone(),
        name: existing.name.clone(),
        experiment_id: existing.experiment_id.clone(),
        create_time_since_epoch: existing.create_time_since_epoch.clone(),
        last_update_time_since_epoch: existing.last_update_time_since_epoch.clone(),
        description: merged(&incoming.description, &existing.description),
        external_id: merged(&incoming.external_id, &existing.external_id),
        owner: merged(&incoming.owner, &existing.owner),
        status: merged(&incoming.status, &existing.status),
        state: merged(&incoming.state, &existing.state),
        start_time_since_epoch: merged(
            &incoming.start_time_since_epoch,
            &existing.start_time_since_epoch,
        ),
        end_time_since_epoch: merged(&incoming.end_time_since_epoch, &existing.end_time_since_epoch),
        custom_properties: merged(&incoming.custom_properties, &existing.custom_properties),
    }
}

pub fn experiment_to_record(
    experiment: &Experiment,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = experiment
        .id
        .as_deref()
        .map(|id| parse_numeric_id("experiment", id))
        .transpose()?;
    record.external_id = experiment.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &experiment.description);
    insert_string(&mut record.properties, keys::OWNER, &experiment.owner);
    insert_string(
        &mut record.properties,
        keys::STATE,
        &experiment.state.map(|s| s.as_str().to_string()),
    );
    record.custom_properties = experiment.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn experiment_from_record(record: &Record) -> Experiment {
    Experiment {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        owner: string_prop(&record.properties, keys::OWNER),
        state: string_prop(&record.properties, keys::STATE).and_then(|s| ExperimentState::parse(&s)),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}

pub fn experiment_run_to_record(
    run: &ExperimentRun,
    type_id: i32,
    storage_name: String,
) -> Result<Record, RegistryError> {
    let mut record = Record::new(type_id, storage_name);
    record.id = run
        .id
        .as_deref()
        .map(|id| parse_numeric_id("experiment run", id))
        .transpose()?;
    record.external_id = run.external_id.clone();
    insert_string(&mut record.properties, keys::DESCRIPTION, &run.description);
    insert_string(&mut record.properties, keys::OWNER, &run.owner);
    insert_string(
        &mut record.properties,
        keys::STATUS,
        &run.status.map(|s| s.as_str().to_string()),
    );
    insert_string(
        &mut record.properties,
        keys::STATE,
        &run.state.map(|s| s.as_str().to_string()),
    );
    insert_int(
        &mut record.properties,
        keys::START_TIME_SINCE_EPOCH,
        run.start_time_since_epoch
            .as_deref()
            .map(|t| parse_epoch_millis("start time", t))
            .transpose()?,
    );
    insert_int(
        &mut record.properties,
        keys::END_TIME_SINCE_EPOCH,
        run.end_time_since_epoch
            .as_deref()
            .map(|t| parse_epoch_millis("end time", t))
            .transpose()?,
    );
    insert_int(
        &mut record.properties,
        keys::EXPERIMENT_ID,
        run.experiment_id
            .as_deref()
            .map(|id| parse_numeric_id("experiment", id))
            .transpose()?
            .map(i64::from),
    );
    record.custom_properties = run.custom_properties.clone().unwrap_or_default();
    Ok(record)
}

pub fn experiment_run_from_record(record: &Record) -> ExperimentRun {
    ExperimentRun {
        id: format_id(record.id),
        name: Some(strip_scope_prefix(&record.name).to_string()),
        description: string_prop(&record.properties, keys::DESCRIPTION),
        external_id: record.external_id.clone(),
        experiment_id: int_prop(&record.properties, keys::EXPERIMENT_ID).map(|id| id.to_string()),
        owner: string_prop(&record.properties, keys::OWNER),
        status: string_prop(&record.properties, keys::STATUS)
            .and_then(|s| ExperimentRunStatus::parse(&s)),
        state: string_prop(&record.properties, keys::STATE).and_then(|s| ExperimentState::parse(&s)),
        start_time_since_epoch: int_prop(&record.properties, keys::START_TIME_SINCE_EPOCH)
            .map(|t| t.to_string()),
        end_time_since_epoch: int_prop(&record.properties, keys::END_TIME_SINCE_EPOCH)
            .map(|t| t.to_string()),
        create_time_since_epoch: Some(millis_string(record.create_time_since_epoch)),
        last_update_time_since_epoch: Some(millis_string(record.last_update_time_since_epoch)),
        custom_properties: Some(record.custom_properties.clone()),
    }
}

/// Parse a caller-supplied epoch-millis string.
pub fn parse_epoch_millis(field: &str, value: &str) -> Result<i64, RegistryError> {
    value.parse::<i64>().map_err(|_| {
        RegistryError::bad_request(format!(
            "invalid {} '{}': not an integer epoch-millis value",
            field, value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_run_protects_experiment_reference() {
        let existing = ExperimentRun {
            id: Some("2".to_string()),
            name: Some("run-a".to_string()),
            experiment_id: Some("1".to_string()),
            start_time_since_epoch: Some("100".to_string()),
            ..ExperimentRun::default()
        };
        let incoming = ExperimentRun {
            experiment_id: Some("9".to_string()),
            end_time_since_epoch: Some("250".to_string()),
            status: Some(ExperimentRunStatus::Finished),
            ..ExperimentRun::default()
        };

        let merged = merge_experiment_run(&existing, &incoming);
        assert_eq!(merged.experiment_id.as_deref(), Some("1"));
        assert_eq!(merged.start_time_since_epoch.as_deref(), Some("100"));
        assert_eq!(merged.end_time_since_epoch.as_deref(), Some("250"));
        assert_eq!(merged.status, Some(ExperimentRunStatus::Finished));
    }

    #[test]
    fn test_run_record_round_trip() {
        let run = ExperimentRun {
            name: Some("run-a".to_string()),
            experiment_id: Some("1".to_string()),
            owner: Some("alice".to_string()),
            status: Some(ExperimentRunStatus::Running),
            start_time_since_epoch: Some("100".to_string()),
            end_time_since_epoch: Some("250".to_string()),
            ..ExperimentRun::default()
        };

        let record = experiment_run_to_record(&run, 13, "1:run-a".to_string()).unwrap();
        assert_eq!(int_prop(&record.properties, keys::START_TIME_SINCE_EPOCH), Some(100));

        let back = experiment_run_from_record(&record);
        assert_eq!(back.name.as_deref(), Some("run-a"));
        assert_eq!(back.experiment_id.as_deref(), Some("1"));
        assert_eq!(back.status, Some(ExperimentRunStatus::Running));
        assert_eq!(back.end_time_since_epoch.as_deref(), Some("250"));
    }

    #[test]
    fn test_bad_epoch_millis_is_bad_request() {
        let run = ExperimentRun {
            name: Some("run-a".to_string()),
            start_time_since_epoch: Some("yesterday".to_string()),
            ..ExperimentRun::default()
        };
        let err = experiment_run_to_record(&run, 13, "1:run-a".to_string()).unwrap_err();
        assert!(err.is_bad_request());
    }
}
