use super::*;
use crate::model::resource::ResourceStatus;

#[test]
fn never_reconciled_is_initial() {
    assert_eq!(
        classify_trigger(None, 1, 0, ResourceStatus::Pending),
        TriggerReason::Initial
    );
}

#[test]
fn spec_ahead_of_observed_is_spec_change() {
    let now = Some(chrono::Utc::now());
    assert_eq!(
        classify_trigger(now, 2, 1, ResourceStatus::Ready),
        TriggerReason::SpecChange
    );
}

#[test]
fn deleting_status_is_deletion() {
    let now = Some(chrono::Utc::now());
    assert_eq!(
        classify_trigger(now, 1, 1, ResourceStatus::Deleting),
        TriggerReason::Deletion
    );
}

#[test]
fn failed_status_is_retry() {
    let now = Some(chrono::Utc::now());
    assert_eq!(
        classify_trigger(now, 1, 1, ResourceStatus::Failed),
        TriggerReason::Retry
    );
}

#[test]
fn otherwise_scheduled() {
    let now = Some(chrono::Utc::now());
    assert_eq!(
        classify_trigger(now, 1, 1, ResourceStatus::Ready),
        TriggerReason::Scheduled
    );
}
