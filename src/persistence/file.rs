use super::{PersistenceError, PersistenceResult, PlanSnapshot};
use crate::resource::ResourceAllocation;
use crate::task::TaskId;
use crate::task_validation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

pub fn save_snapshot_to_json<P: AsRef<Path>>(
    snapshot: &PlanSnapshot,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<PlanSnapshot> {
    let file = File::open(path)?;
    let snapshot: PlanSnapshot = serde_json::from_reader(file)?;
    Ok(snapshot)
}

#[derive(Debug, Serialize, Deserialize)]
struct AllocationCsvRecord {
    task_id: TaskId,
    user_id: String,
    allocation_percentage: u32,
    start_date: String,
    end_date: String,
}

impl From<&ResourceAllocation> for AllocationCsvRecord {
    fn from(allocation: &ResourceAllocation) -> Self {
        Self {
            task_id: allocation.task_id,
            user_id: allocation.user_id.clone(),
            allocation_percentage: allocation.allocation_percentage,
            start_date: allocation.start_date.format("%Y-%m-%d").to_string(),
            end_date: allocation.end_date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl AllocationCsvRecord {
    fn into_allocation(self) -> PersistenceResult<ResourceAllocation> {
        let allocation = ResourceAllocation::new(
            self.task_id,
            self.user_id,
            self.allocation_percentage,
            parse_date(&self.start_date)?,
            parse_date(&self.end_date)?,
        );
        task_validation::validate_allocation(&allocation)?;
        Ok(allocation)
    }
}

fn parse_date(value: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| PersistenceError::InvalidData(format!("invalid date '{value}': {err}")))
}

/// Header: `task_id,user_id,allocation_percentage,start_date,end_date`.
pub fn save_allocations_to_csv<P: AsRef<Path>>(
    allocations: &[ResourceAllocation],
    path: P,
) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for allocation in allocations {
        writer.serialize(AllocationCsvRecord::from(allocation))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_allocations_from_csv<P: AsRef<Path>>(
    path: P,
) -> PersistenceResult<Vec<ResourceAllocation>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut allocations = Vec::new();
    for record in reader.deserialize::<AllocationCsvRecord>() {
        allocations.push(record?.into_allocation()?);
    }
    Ok(allocations)
}
