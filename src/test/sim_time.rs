use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(3), SimTime(3_000));
    assert_eq!(SimTime::from_millis(3), SimTime(3_000_000));
    assert_eq!(SimTime::from_secs(3), SimTime(3_000_000_000));
    assert_eq!(SimTime::ZERO, SimTime(0));
}

#[test]
fn sim_time_plus_saturates() {
    assert_eq!(SimTime(1).plus(SimTime(2)), SimTime(3));
    assert_eq!(SimTime(u64::MAX).plus(SimTime(1)), SimTime(u64::MAX));
}

#[test]
fn sim_time_as_secs() {
    assert_eq!(SimTime::from_secs(2).as_secs_f64(), 2.0);
    assert_eq!(SimTime::from_millis(1_500).as_secs_f64(), 1.5);
}
