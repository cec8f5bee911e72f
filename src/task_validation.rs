use crate::error::AnalysisError;
use crate::resource::ResourceAllocation;
use crate::task::{Dependency, Task, TaskId};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TaskValidationError {
    message: String,
}

impl TaskValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<TaskValidationError> for AnalysisError {
    fn from(err: TaskValidationError) -> Self {
        AnalysisError::InvalidInput(err.message)
    }
}

pub fn validate_task(task: &Task) -> Result<(), TaskValidationError> {
    if let Some(hours) = task.duration_hours {
        if hours < 0 {
            return Err(TaskValidationError::new(format!(
                "task {} has negative duration {}",
                task.id, hours
            )));
        }
    }
    if task.duration().is_none() {
        return Err(TaskValidationError::new(format!(
            "task {} has out-of-range duration {} hours",
            task.id,
            task.declared_hours()
        )));
    }
    if let (Some(start), Some(end)) = (task.start_date, task.end_date) {
        if end < start {
            return Err(TaskValidationError::new(format!(
                "task {} ends ({end}) before it starts ({start})",
                task.id
            )));
        }
    }
    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), TaskValidationError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(TaskValidationError::new(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        validate_task(task)?;
    }
    Ok(())
}

pub fn validate_dependency(dependency: &Dependency) -> Result<(), TaskValidationError> {
    if dependency.source_task_id == dependency.target_task_id {
        return Err(TaskValidationError::new(format!(
            "task {} cannot depend on itself",
            dependency.source_task_id
        )));
    }
    if dependency.lag().is_none() {
        return Err(TaskValidationError::new(format!(
            "dependency {} -> {} has out-of-range lag {} days",
            dependency.source_task_id, dependency.target_task_id, dependency.lag_days
        )));
    }
    Ok(())
}

pub fn validate_dependencies(
    dependencies: &[Dependency],
    known: &HashSet<TaskId>,
) -> Result<(), TaskValidationError> {
    for dependency in dependencies {
        validate_dependency(dependency)?;
        for endpoint in [dependency.source_task_id, dependency.target_task_id] {
            if !known.contains(&endpoint) {
                return Err(TaskValidationError::new(format!(
                    "dependency {} -> {} references unknown task {}",
                    dependency.source_task_id, dependency.target_task_id, endpoint
                )));
            }
        }
    }
    Ok(())
}

pub fn validate_allocation(allocation: &ResourceAllocation) -> Result<(), TaskValidationError> {
    if allocation.user_id.trim().is_empty() {
        return Err(TaskValidationError::new(format!(
            "allocation on task {} requires a non-empty user_id",
            allocation.task_id
        )));
    }
    if allocation.allocation_percentage > 100 {
        return Err(TaskValidationError::new(format!(
            "allocation for '{}' on task {} has invalid percentage {} (must be between 0 and 100)",
            allocation.user_id, allocation.task_id, allocation.allocation_percentage
        )));
    }
    if allocation.end_date < allocation.start_date {
        return Err(TaskValidationError::new(format!(
            "allocation for '{}' on task {} ends before it starts",
            allocation.user_id, allocation.task_id
        )));
    }
    Ok(())
}
