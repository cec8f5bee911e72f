use crate::plan::{Kit, PlanId, ReleasePlan};
use crate::resource::{DateRange, ResourceAllocation};
use crate::task::{Dependency, Task, TaskId};
use crate::task_validation::TaskValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl From<TaskValidationError> for PersistenceError {
    fn from(value: TaskValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyDirection {
    Incoming,
    Outgoing,
    #[default]
    All,
}

impl DependencyDirection {
    pub fn matches(&self, dependency: &Dependency, task_id: TaskId) -> bool {
        match self {
            DependencyDirection::Incoming => dependency.target_task_id == task_id,
            DependencyDirection::Outgoing => dependency.source_task_id == task_id,
            DependencyDirection::All => {
                dependency.source_task_id == task_id || dependency.target_task_id == task_id
            }
        }
    }
}

pub trait PlanStore {
    fn get_plan(&self, plan_id: PlanId) -> PersistenceResult<Option<ReleasePlan>>;

    fn list_kits(&self, plan_id: PlanId) -> PersistenceResult<Vec<Kit>>;

    /// Tasks of every kit of the plan, kit order first, then insertion order.
    fn list_tasks_for_plan(&self, plan_id: PlanId) -> PersistenceResult<Vec<Task>>;

    fn list_dependencies(
        &self,
        task_id: TaskId,
        direction: DependencyDirection,
    ) -> PersistenceResult<Vec<Dependency>>;

    fn list_allocations(
        &self,
        user_id: Option<&str>,
        range: Option<DateRange>,
    ) -> PersistenceResult<Vec<ResourceAllocation>>;

    fn insert_plan(&mut self, plan: ReleasePlan) -> PersistenceResult<()>;
    fn insert_kit(&mut self, kit: Kit) -> PersistenceResult<()>;
    fn insert_task(&mut self, task: Task) -> PersistenceResult<()>;
    fn insert_dependency(&mut self, dependency: Dependency) -> PersistenceResult<()>;
    fn insert_allocation(&mut self, allocation: ResourceAllocation) -> PersistenceResult<()>;

    fn list_dependencies_for_plan(&self, plan_id: PlanId) -> PersistenceResult<Vec<Dependency>> {
        let tasks = self.list_tasks_for_plan(plan_id)?;
        let in_plan: HashSet<TaskId> = tasks.iter().map(|task| task.id).collect();
        let mut edges = Vec::new();
        for task in &tasks {
            for dependency in self.list_dependencies(task.id, DependencyDirection::Outgoing)? {
                if in_plan.contains(&dependency.target_task_id) {
                    edges.push(dependency);
                }
            }
        }
        Ok(edges)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    #[serde(default)]
    pub plans: Vec<ReleasePlan>,
    #[serde(default)]
    pub kits: Vec<Kit>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub allocations: Vec<ResourceAllocation>,
}

impl PlanSnapshot {
    pub fn load_into<S: PlanStore + ?Sized>(self, store: &mut S) -> PersistenceResult<()> {
        for plan in self.plans {
            store.insert_plan(plan)?;
        }
        for kit in self.kits {
            store.insert_kit(kit)?;
        }
        for task in self.tasks {
            store.insert_task(task)?;
        }
        for dependency in self.dependencies {
            store.insert_dependency(dependency)?;
        }
        for allocation in self.allocations {
            store.insert_allocation(allocation)?;
        }
        Ok(())
    }
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_allocations_from_csv, load_snapshot_from_json, save_allocations_to_csv,
    save_snapshot_to_json,
};
pub use memory::InMemoryPlanStore;
