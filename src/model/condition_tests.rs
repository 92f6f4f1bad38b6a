use super::*;

#[test]
fn differs_ignores_transition_time() {
    let a = Condition::new(CONDITION_READY, ConditionStatus::True, "R", "m", 1);
    std::thread::sleep(std::time::Duration::from_millis(2));
    let b = Condition::new(CONDITION_READY, ConditionStatus::True, "R", "m", 1);
    assert!(!a.differs_from(&b));
}

#[test]
fn differs_on_status_change() {
    let a = Condition::new(CONDITION_READY, ConditionStatus::True, "R", "m", 1);
    let b = Condition::new(CONDITION_READY, ConditionStatus::False, "R", "m", 1);
    assert!(a.differs_from(&b));
}
