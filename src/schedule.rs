use crate::calculations::{BackwardPass, ForwardPass};
use crate::error::AnalysisResult;
use crate::graph::ScheduleDag;
use crate::task::{Dependency, Task, TaskId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task_id: TaskId,
    pub title: String,
    pub duration_hours: Option<i64>,
    pub earliest_start: NaiveDateTime,
    pub earliest_finish: NaiveDateTime,
    pub latest_start: NaiveDateTime,
    pub latest_finish: NaiveDateTime,
    pub slack_hours: f64,
    pub is_critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub subtask_id: TaskId,
    pub title: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub duration_hours: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CriticalPathReport {
    pub critical_path: Vec<TaskSummary>,
    /// Plain sum of critical task durations in hours. Parallel critical
    /// branches are each counted.
    pub total_duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub task_count: usize,
    pub critical_count: usize,
    pub critical_path: Vec<TaskId>,
    pub latest_finish: Option<NaiveDateTime>,
}

impl ScheduleSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        parts.push(format!("critical={}", self.critical_count));
        if let Some(date) = self.latest_finish {
            parts.push(format!("finish={}", date));
        }
        if !self.critical_path.is_empty() {
            let chain = self
                .critical_path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("->");
            parts.push(format!("crit_path={}", chain));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleAnalysis {
    pub tasks: Vec<ScheduledTask>,
}

impl ScheduleAnalysis {
    pub fn find(&self, task_id: TaskId) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|task| task.task_id == task_id)
    }

    pub fn critical_tasks(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.tasks.iter().filter(|task| task.is_critical)
    }

    pub fn critical_path(&self) -> CriticalPathReport {
        let critical_path: Vec<TaskSummary> = self
            .critical_tasks()
            .map(|task| TaskSummary {
                subtask_id: task.task_id,
                title: task.title.clone(),
                start_date: task.earliest_start,
                end_date: task.earliest_finish,
                duration_hours: task.duration_hours,
            })
            .collect();
        let total_duration = critical_path
            .iter()
            .map(|entry| entry.duration_hours.unwrap_or(0))
            .sum();
        CriticalPathReport {
            critical_path,
            total_duration,
        }
    }

    pub fn summary(&self) -> ScheduleSummary {
        let critical_path: Vec<TaskId> = self.critical_tasks().map(|task| task.task_id).collect();
        ScheduleSummary {
            task_count: self.tasks.len(),
            critical_count: critical_path.len(),
            critical_path,
            latest_finish: self.tasks.iter().map(|task| task.earliest_finish).max(),
        }
    }
}

pub struct Schedule<'a> {
    tasks: &'a [Task],
    dependencies: &'a [Dependency],
    plan_start: Option<NaiveDateTime>,
}

impl<'a> Schedule<'a> {
    pub fn new(tasks: &'a [Task], dependencies: &'a [Dependency]) -> Self {
        Self {
            tasks,
            dependencies,
            plan_start: None,
        }
    }

    pub fn with_plan_start(mut self, plan_start: NaiveDateTime) -> Self {
        self.plan_start = Some(plan_start);
        self
    }

    pub fn analyze(&self) -> AnalysisResult<ScheduleAnalysis> {
        if self.tasks.is_empty() {
            return Ok(ScheduleAnalysis::default());
        }

        let dag = ScheduleDag::build(self.tasks, self.dependencies)?;
        let order = dag.topological_positions(self.tasks)?;

        let earliest = ForwardPass::new(self.tasks, &dag)
            .with_plan_start(self.plan_start)
            .execute(&order)?;
        let latest = BackwardPass::new(self.tasks, &dag).execute(&order, &earliest)?;

        let tasks: Vec<ScheduledTask> = self
            .tasks
            .iter()
            .zip(earliest.iter().zip(latest.iter()))
            .map(|(task, (&(es, ef), &(ls, lf)))| ScheduledTask {
                task_id: task.id,
                title: task.title.clone(),
                duration_hours: task.duration_hours,
                earliest_start: es,
                earliest_finish: ef,
                latest_start: ls,
                latest_finish: lf,
                slack_hours: (ls - es).num_minutes() as f64 / 60.0,
                is_critical: es == ls && ef == lf,
            })
            .collect();

        debug!(
            tasks = tasks.len(),
            dependencies = self.dependencies.len(),
            critical = tasks.iter().filter(|task| task.is_critical).count(),
            "schedule analyzed"
        );
        Ok(ScheduleAnalysis { tasks })
    }

    pub fn critical_path(&self) -> AnalysisResult<CriticalPathReport> {
        Ok(self.analyze()?.critical_path())
    }
}

pub fn analyze_schedule(
    tasks: &[Task],
    dependencies: &[Dependency],
) -> AnalysisResult<ScheduleAnalysis> {
    Schedule::new(tasks, dependencies).analyze()
}

pub fn compute_critical_path(
    tasks: &[Task],
    dependencies: &[Dependency],
) -> AnalysisResult<CriticalPathReport> {
    Schedule::new(tasks, dependencies).critical_path()
}
