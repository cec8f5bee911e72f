pub mod backward_pass;
pub mod forward_pass;

pub use backward_pass::BackwardPass;
pub use forward_pass::ForwardPass;

use crate::error::{AnalysisError, AnalysisResult};
use crate::task::{Task, TaskId};
use chrono::{Duration, NaiveDateTime};

/// `at + delta`, reporting chrono overflow as invalid input instead of panicking.
pub(crate) fn shift(at: NaiveDateTime, delta: Duration, task_id: TaskId) -> AnalysisResult<NaiveDateTime> {
    at.checked_add_signed(delta).ok_or_else(|| {
        AnalysisError::invalid(format!("date arithmetic overflow while scheduling task {task_id}"))
    })
}

pub(crate) fn duration_of(task: &Task) -> AnalysisResult<Duration> {
    task.duration().ok_or_else(|| {
        AnalysisError::invalid(format!(
            "task {} has out-of-range duration {} hours",
            task.id,
            task.declared_hours()
        ))
    })
}

pub(crate) fn offset(a: Duration, b: Duration, task_id: TaskId) -> AnalysisResult<Duration> {
    a.checked_sub(&b).ok_or_else(|| {
        AnalysisError::invalid(format!("duration overflow while scheduling task {task_id}"))
    })
}
