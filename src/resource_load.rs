use crate::error::{AnalysisError, AnalysisResult};
use crate::resource::{DateRange, ResourceAllocation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    #[default]
    Unclipped,
    Clipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLoad {
    pub user_id: String,
    pub period: DateRange,
    /// Summed allocation percentage per day. Values above 100 mean over-allocation.
    pub daily_load: BTreeMap<NaiveDate, u64>,
    pub average_load: f64,
    pub max_load: u64,
}

impl ResourceLoad {
    pub fn overallocated_days(&self) -> Vec<NaiveDate> {
        self.daily_load
            .iter()
            .filter(|(_, load)| **load > 100)
            .map(|(day, _)| *day)
            .collect()
    }
}

pub fn compute_resource_load(
    allocations: &[ResourceAllocation],
    start_date: NaiveDate,
    end_date: NaiveDate,
    user_id: &str,
) -> AnalysisResult<ResourceLoad> {
    compute_resource_load_with(
        allocations,
        start_date,
        end_date,
        user_id,
        WindowPolicy::default(),
    )
}

pub fn compute_resource_load_with(
    allocations: &[ResourceAllocation],
    start_date: NaiveDate,
    end_date: NaiveDate,
    user_id: &str,
    policy: WindowPolicy,
) -> AnalysisResult<ResourceLoad> {
    if end_date < start_date {
        return Err(AnalysisError::invalid(format!(
            "end date {end_date} is before start date {start_date}"
        )));
    }
    let period = DateRange::new(start_date, end_date);

    let mut daily_load: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let matching = allocations
        .iter()
        .filter(|alloc| alloc.user_id == user_id && alloc.overlaps(start_date, end_date));
    for allocation in matching {
        for day in allocation.days() {
            if policy == WindowPolicy::Clipped && !period.contains(day) {
                continue;
            }
            *daily_load.entry(day).or_insert(0) += u64::from(allocation.allocation_percentage);
        }
    }

    let (average_load, max_load) = if daily_load.is_empty() {
        (0.0, 0)
    } else {
        let total: f64 = daily_load.values().map(|load| *load as f64).sum();
        let max = daily_load.values().copied().max().unwrap_or(0);
        (total / daily_load.len() as f64, max)
    };

    debug!(
        user_id,
        days = daily_load.len(),
        max_load,
        ?policy,
        "resource load computed"
    );
    Ok(ResourceLoad {
        user_id: user_id.to_string(),
        period,
        daily_load,
        average_load,
        max_load,
    })
}
