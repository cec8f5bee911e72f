use super::{DependencyDirection, PersistenceError, PersistenceResult, PlanSnapshot, PlanStore};
use crate::plan::{Kit, PlanId, ReleasePlan};
use crate::resource::{DateRange, ResourceAllocation};
use crate::task::{Dependency, Task, TaskId};
use crate::task_validation;

#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanStore {
    plans: Vec<ReleasePlan>,
    kits: Vec<Kit>,
    tasks: Vec<Task>,
    dependencies: Vec<Dependency>,
    allocations: Vec<ResourceAllocation>,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: PlanSnapshot) -> PersistenceResult<Self> {
        let mut store = Self::new();
        snapshot.load_into(&mut store)?;
        Ok(store)
    }

    pub fn to_snapshot(&self) -> PlanSnapshot {
        PlanSnapshot {
            plans: self.plans.clone(),
            kits: self.kits.clone(),
            tasks: self.tasks.clone(),
            dependencies: self.dependencies.clone(),
            allocations: self.allocations.clone(),
        }
    }

    fn has_task(&self, task_id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id == task_id)
    }
}

impl PlanStore for InMemoryPlanStore {
    fn get_plan(&self, plan_id: PlanId) -> PersistenceResult<Option<ReleasePlan>> {
        Ok(self.plans.iter().find(|plan| plan.id == plan_id).cloned())
    }

    fn list_kits(&self, plan_id: PlanId) -> PersistenceResult<Vec<Kit>> {
        Ok(self
            .kits
            .iter()
            .filter(|kit| kit.release_plan_id == plan_id)
            .cloned()
            .collect())
    }

    fn list_tasks_for_plan(&self, plan_id: PlanId) -> PersistenceResult<Vec<Task>> {
        let mut tasks = Vec::new();
        for kit in self.kits.iter().filter(|kit| kit.release_plan_id == plan_id) {
            tasks.extend(
                self.tasks
                    .iter()
                    .filter(|task| task.kit_id == Some(kit.id))
                    .cloned(),
            );
        }
        Ok(tasks)
    }

    fn list_dependencies(
        &self,
        task_id: TaskId,
        direction: DependencyDirection,
    ) -> PersistenceResult<Vec<Dependency>> {
        Ok(self
            .dependencies
            .iter()
            .filter(|dep| direction.matches(dep, task_id))
            .cloned()
            .collect())
    }

    fn list_allocations(
        &self,
        user_id: Option<&str>,
        range: Option<DateRange>,
    ) -> PersistenceResult<Vec<ResourceAllocation>> {
        Ok(self
            .allocations
            .iter()
            .filter(|alloc| user_id.is_none_or(|user| alloc.user_id == user))
            .filter(|alloc| range.is_none_or(|r| alloc.overlaps(r.start, r.end)))
            .cloned()
            .collect())
    }

    fn insert_plan(&mut self, plan: ReleasePlan) -> PersistenceResult<()> {
        if plan.end_date < plan.start_date {
            return Err(PersistenceError::InvalidData(format!(
                "release plan {} ends before it starts",
                plan.id
            )));
        }
        if self.plans.iter().any(|existing| existing.id == plan.id) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate release plan id {}",
                plan.id
            )));
        }
        self.plans.push(plan);
        Ok(())
    }

    fn insert_kit(&mut self, kit: Kit) -> PersistenceResult<()> {
        if !self.plans.iter().any(|plan| plan.id == kit.release_plan_id) {
            return Err(PersistenceError::NotFound(format!(
                "release plan {}",
                kit.release_plan_id
            )));
        }
        if self.kits.iter().any(|existing| existing.id == kit.id) {
            return Err(PersistenceError::InvalidData(format!("duplicate kit id {}", kit.id)));
        }
        self.kits.push(kit);
        Ok(())
    }

    fn insert_task(&mut self, task: Task) -> PersistenceResult<()> {
        task_validation::validate_task(&task)?;
        if self.has_task(task.id) {
            return Err(PersistenceError::InvalidData(format!("duplicate task id {}", task.id)));
        }
        if let Some(kit_id) = task.kit_id {
            if !self.kits.iter().any(|kit| kit.id == kit_id) {
                return Err(PersistenceError::NotFound(format!("kit {kit_id}")));
            }
        }
        self.tasks.push(task);
        Ok(())
    }

    fn insert_dependency(&mut self, dependency: Dependency) -> PersistenceResult<()> {
        task_validation::validate_dependency(&dependency)?;
        for endpoint in [dependency.source_task_id, dependency.target_task_id] {
            if !self.has_task(endpoint) {
                return Err(PersistenceError::NotFound(format!("task {endpoint}")));
            }
        }
        self.dependencies.push(dependency);
        Ok(())
    }

    fn insert_allocation(&mut self, allocation: ResourceAllocation) -> PersistenceResult<()> {
        task_validation::validate_allocation(&allocation)?;
        if !self.has_task(allocation.task_id) {
            return Err(PersistenceError::NotFound(format!("task {}", allocation.task_id)));
        }
        self.allocations.push(allocation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::parse_datetime;
    use chrono::NaiveDate;

    fn seeded() -> InMemoryPlanStore {
        let mut store = InMemoryPlanStore::new();
        let start = parse_datetime("2024-01-01").unwrap();
        let end = parse_datetime("2024-03-01").unwrap();
        store.insert_plan(ReleasePlan::new(1, "R1", start, end)).unwrap();
        store.insert_kit(Kit::new(10, 1, "Backend")).unwrap();
        store.insert_kit(Kit::new(11, 1, "Frontend")).unwrap();
        store.insert_task(Task::new(3, "API", 8).with_kit(11)).unwrap();
        store.insert_task(Task::new(1, "Schema", 4).with_kit(10)).unwrap();
        store.insert_task(Task::new(2, "Service", 4).with_kit(10)).unwrap();
        store.insert_dependency(Dependency::finish_to_start(1, 2)).unwrap();
        store.insert_dependency(Dependency::finish_to_start(2, 3)).unwrap();
        store
    }

    #[test]
    fn tasks_follow_kit_order_then_insertion() {
        let store = seeded();
        let ids: Vec<TaskId> = store
            .list_tasks_for_plan(1)
            .unwrap()
            .into_iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(store.list_tasks_for_plan(99).unwrap().is_empty());
    }

    #[test]
    fn dependency_directions() {
        let store = seeded();
        assert_eq!(
            store.list_dependencies(2, DependencyDirection::Incoming).unwrap(),
            vec![Dependency::finish_to_start(1, 2)]
        );
        assert_eq!(
            store.list_dependencies(2, DependencyDirection::Outgoing).unwrap(),
            vec![Dependency::finish_to_start(2, 3)]
        );
        assert_eq!(store.list_dependencies(2, DependencyDirection::All).unwrap().len(), 2);
        assert_eq!(store.list_dependencies_for_plan(1).unwrap().len(), 2);
    }

    #[test]
    fn allocation_filters_by_user_and_overlap() {
        let mut store = seeded();
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        store
            .insert_allocation(ResourceAllocation::new(1, "ana", 50, d(1), d(5)))
            .unwrap();
        store
            .insert_allocation(ResourceAllocation::new(2, "ana", 50, d(20), d(25)))
            .unwrap();
        store
            .insert_allocation(ResourceAllocation::new(2, "raj", 50, d(1), d(5)))
            .unwrap();
        let hits = store
            .list_allocations(Some("ana"), Some(DateRange::new(d(4), d(10))))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task_id, 1);
        assert_eq!(store.list_allocations(None, None).unwrap().len(), 3);
    }

    #[test]
    fn rejects_orphans() {
        let mut store = seeded();
        assert!(matches!(
            store.insert_task(Task::new(9, "Orphan", 1).with_kit(77)),
            Err(PersistenceError::NotFound(_))
        ));
        assert!(matches!(
            store.insert_dependency(Dependency::finish_to_start(1, 42)),
            Err(PersistenceError::NotFound(_))
        ));
    }
}
