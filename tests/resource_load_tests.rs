use chrono::NaiveDate;
use release_schedule::{
    AnalysisError, ResourceAllocation, WindowPolicy, compute_resource_load,
    compute_resource_load_with,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn half_time_over_three_days() {
    let allocations = vec![ResourceAllocation::new(1, "u1", 50, d(2024, 1, 1), d(2024, 1, 3))];
    let load = compute_resource_load(&allocations, d(2024, 1, 1), d(2024, 1, 3), "u1").unwrap();
    assert_eq!(load.daily_load.len(), 3);
    assert!(load.daily_load.values().all(|pct| *pct == 50));
    assert_eq!(load.average_load, 50.0);
    assert_eq!(load.max_load, 50);
    assert!(load.overallocated_days().is_empty());
}

#[test]
fn overlapping_allocations_are_summed_without_clamping() {
    let allocations = vec![
        ResourceAllocation::new(1, "u1", 60, d(2024, 1, 1), d(2024, 1, 1)),
        ResourceAllocation::new(2, "u1", 60, d(2024, 1, 1), d(2024, 1, 1)),
    ];
    let load = compute_resource_load(&allocations, d(2024, 1, 1), d(2024, 1, 1), "u1").unwrap();
    assert_eq!(load.daily_load[&d(2024, 1, 1)], 120);
    assert_eq!(load.max_load, 120);
    assert_eq!(load.overallocated_days(), vec![d(2024, 1, 1)]);
}

#[test]
fn no_allocations_yields_empty_load() {
    let load = compute_resource_load(&[], d(2024, 1, 1), d(2024, 1, 31), "u1").unwrap();
    assert!(load.daily_load.is_empty());
    assert_eq!(load.average_load, 0.0);
    assert_eq!(load.max_load, 0);
}

#[test]
fn other_users_and_disjoint_allocations_are_ignored() {
    let allocations = vec![
        ResourceAllocation::new(1, "u2", 80, d(2024, 1, 1), d(2024, 1, 3)),
        ResourceAllocation::new(2, "u1", 40, d(2024, 2, 1), d(2024, 2, 3)),
    ];
    let load = compute_resource_load(&allocations, d(2024, 1, 1), d(2024, 1, 3), "u1").unwrap();
    assert!(load.daily_load.is_empty());
}

#[test]
fn unclipped_counts_days_outside_the_window() {
    let allocations = vec![ResourceAllocation::new(1, "u1", 25, d(2024, 1, 1), d(2024, 1, 10))];
    let load = compute_resource_load(&allocations, d(2024, 1, 3), d(2024, 1, 5), "u1").unwrap();
    assert_eq!(load.daily_load.len(), 10);
    assert_eq!(load.daily_load.keys().next(), Some(&d(2024, 1, 1)));
}

#[test]
fn clipped_keeps_only_window_days() {
    let allocations = vec![ResourceAllocation::new(1, "u1", 25, d(2024, 1, 1), d(2024, 1, 10))];
    let load = compute_resource_load_with(
        &allocations,
        d(2024, 1, 3),
        d(2024, 1, 5),
        "u1",
        WindowPolicy::Clipped,
    )
    .unwrap();
    let days: Vec<_> = load.daily_load.keys().copied().collect();
    assert_eq!(days, vec![d(2024, 1, 3), d(2024, 1, 4), d(2024, 1, 5)]);
    assert_eq!(load.average_load, 25.0);
}

#[test]
fn inverted_window_is_invalid() {
    let err = compute_resource_load(&[], d(2024, 1, 5), d(2024, 1, 1), "u1").unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
}

#[test]
fn unvalidated_percentages_sum_without_wrapping() {
    let huge = u32::MAX / 2 + 1;
    let allocations = vec![
        ResourceAllocation::new(1, "u1", huge, d(2024, 1, 1), d(2024, 1, 1)),
        ResourceAllocation::new(2, "u1", huge, d(2024, 1, 1), d(2024, 1, 1)),
    ];
    let load = compute_resource_load(&allocations, d(2024, 1, 1), d(2024, 1, 1), "u1").unwrap();
    let expected = 2 * u64::from(huge);
    assert_eq!(load.daily_load[&d(2024, 1, 1)], expected);
    assert_eq!(load.max_load, expected);
    assert_eq!(load.average_load, expected as f64);
}
