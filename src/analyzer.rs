use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::persistence::{PersistenceError, PlanStore};
use crate::plan::PlanId;
use crate::progress::{ReleaseProgress, compute_release_progress};
use crate::resource::DateRange;
use crate::resource_load::{ResourceLoad, WindowPolicy, compute_resource_load_with};
use crate::schedule::{CriticalPathReport, Schedule, ScheduleAnalysis};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub struct PlanAnalyzer<'a, S: PlanStore + ?Sized> {
    store: &'a S,
    config: AnalyzerConfig,
}

impl<'a, S: PlanStore + ?Sized> PlanAnalyzer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            config: AnalyzerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    #[instrument(skip(self))]
    pub fn schedule(&self, plan_id: PlanId) -> ServiceResult<ScheduleAnalysis> {
        let tasks = self.store.list_tasks_for_plan(plan_id)?;
        if tasks.is_empty() {
            debug!("plan has no tasks");
            return Ok(ScheduleAnalysis::default());
        }
        let dependencies = self.store.list_dependencies_for_plan(plan_id)?;
        let mut schedule = Schedule::new(&tasks, &dependencies);
        if let Some(plan) = self.store.get_plan(plan_id)? {
            schedule = schedule.with_plan_start(plan.start_date);
        }
        Ok(schedule.analyze()?)
    }

    pub fn critical_path(&self, plan_id: PlanId) -> ServiceResult<CriticalPathReport> {
        Ok(self.schedule(plan_id)?.critical_path())
    }

    #[instrument(skip(self))]
    pub fn progress(&self, plan_id: PlanId) -> ServiceResult<ReleaseProgress> {
        if self.store.get_plan(plan_id)?.is_none() {
            return Ok(ReleaseProgress::default());
        }
        let kits = self.store.list_kits(plan_id)?;
        Ok(compute_release_progress(&kits))
    }

    /// Uses the configured window policy unless `policy` overrides it.
    #[instrument(skip(self))]
    pub fn resource_load(
        &self,
        user_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        policy: Option<WindowPolicy>,
    ) -> ServiceResult<ResourceLoad> {
        if end_date < start_date {
            return Err(AnalysisError::invalid(format!(
                "end date {end_date} is before start date {start_date}"
            ))
            .into());
        }
        let allocations = self
            .store
            .list_allocations(Some(user_id), Some(DateRange::new(start_date, end_date)))?;
        let policy = policy.unwrap_or(self.config.window_policy);
        Ok(compute_resource_load_with(
            &allocations,
            start_date,
            end_date,
            user_id,
            policy,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryPlanStore;
    use crate::plan::{Kit, KitStatus, ReleasePlan};
    use crate::task::{Dependency, Task, parse_datetime};

    fn store() -> InMemoryPlanStore {
        let mut store = InMemoryPlanStore::new();
        store
            .insert_plan(ReleasePlan::new(
                1,
                "R1",
                parse_datetime("2024-01-01").unwrap(),
                parse_datetime("2024-02-01").unwrap(),
            ))
            .unwrap();
        store
            .insert_kit(Kit::new(1, 1, "Core").with_status(KitStatus::Done))
            .unwrap();
        store.insert_kit(Kit::new(2, 1, "UI")).unwrap();
        // No declared start: falls back to the plan start.
        store.insert_task(Task::new(1, "Build", 4).with_kit(1)).unwrap();
        store.insert_task(Task::new(2, "Ship", 2).with_kit(2)).unwrap();
        store.insert_dependency(Dependency::finish_to_start(1, 2)).unwrap();
        store
    }

    #[test]
    fn unknown_plan_yields_empty_results() {
        let store = store();
        let analyzer = PlanAnalyzer::new(&store);
        let report = analyzer.critical_path(42).unwrap();
        assert!(report.critical_path.is_empty());
        assert_eq!(report.total_duration, 0);
        assert_eq!(analyzer.progress(42).unwrap(), ReleaseProgress::default());
    }

    #[test]
    fn critical_path_uses_plan_start() {
        let store = store();
        let report = PlanAnalyzer::new(&store).critical_path(1).unwrap();
        let ids: Vec<_> = report.critical_path.iter().map(|t| t.subtask_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(report.total_duration, 6);
        assert_eq!(
            report.critical_path[0].start_date,
            parse_datetime("2024-01-01").unwrap()
        );
    }

    #[test]
    fn progress_counts_done_kits() {
        let store = store();
        assert_eq!(PlanAnalyzer::new(&store).progress(1).unwrap().progress_percentage, 50);
    }

    #[test]
    fn inverted_range_is_invalid_input() {
        let store = store();
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let err = PlanAnalyzer::new(&store)
            .resource_load("ana", d(5), d(1), None)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Analysis(AnalysisError::InvalidInput(_))));
    }
}
