use super::{DependencyDirection, PersistenceError, PersistenceResult, PlanStore};
use crate::plan::{Kit, PlanId, ReleasePlan};
use crate::resource::{DateRange, ResourceAllocation};
use crate::task::{Dependency, DependencyType, Task, TaskId};
use crate::task_validation;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub struct SqlitePlanStore {
    connection: Mutex<Connection>,
}

impl SqlitePlanStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::with_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS release_plans (
                id INTEGER PRIMARY KEY,
                plan_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS kits (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id INTEGER NOT NULL UNIQUE,
                release_plan_id INTEGER NOT NULL REFERENCES release_plans(id),
                kit_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id INTEGER NOT NULL UNIQUE,
                kit_id INTEGER REFERENCES kits(id),
                task_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS task_dependencies (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                source_task_id INTEGER NOT NULL REFERENCES tasks(id),
                target_task_id INTEGER NOT NULL REFERENCES tasks(id),
                dependency_type TEXT NOT NULL,
                lag_days INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS resource_allocations (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id INTEGER NOT NULL REFERENCES tasks(id),
                user_id TEXT NOT NULL,
                allocation_percentage INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)
    }

    fn exists(conn: &Connection, sql: &str, id: i64) -> PersistenceResult<bool> {
        let found: Option<i64> = conn.query_row(sql, params![id], |row| row.get(0)).optional()?;
        Ok(found.is_some())
    }
}

fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_day(value: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| PersistenceError::InvalidData(format!("invalid stored date '{value}': {err}")))
}

impl PlanStore for SqlitePlanStore {
    fn get_plan(&self, plan_id: PlanId) -> PersistenceResult<Option<ReleasePlan>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT plan_json FROM release_plans WHERE id = ?1",
                params![plan_id],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|json| serde_json::from_str(&json).map_err(PersistenceError::from))
            .transpose()
    }

    fn list_kits(&self, plan_id: PlanId) -> PersistenceResult<Vec<Kit>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT kit_json FROM kits WHERE release_plan_id = ?1 ORDER BY seq ASC")?;
        let rows = stmt.query_map(params![plan_id], |row| row.get::<_, String>(0))?;
        let mut kits = Vec::new();
        for json in rows {
            kits.push(serde_json::from_str(&json?)?);
        }
        Ok(kits)
    }

    fn list_tasks_for_plan(&self, plan_id: PlanId) -> PersistenceResult<Vec<Task>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT t.task_json FROM tasks t
             JOIN kits k ON k.id = t.kit_id
             WHERE k.release_plan_id = ?1
             ORDER BY k.seq ASC, t.seq ASC",
        )?;
        let rows = stmt.query_map(params![plan_id], |row| row.get::<_, String>(0))?;
        let mut tasks = Vec::new();
        for json in rows {
            tasks.push(serde_json::from_str(&json?)?);
        }
        Ok(tasks)
    }

    fn list_dependencies(
        &self,
        task_id: TaskId,
        direction: DependencyDirection,
    ) -> PersistenceResult<Vec<Dependency>> {
        let filter = match direction {
            DependencyDirection::Incoming => "target_task_id = ?1",
            DependencyDirection::Outgoing => "source_task_id = ?1",
            DependencyDirection::All => "(source_task_id = ?1 OR target_task_id = ?1)",
        };
        let sql = format!(
            "SELECT source_task_id, target_task_id, dependency_type, lag_days
             FROM task_dependencies WHERE {filter} ORDER BY seq ASC"
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![task_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;
        let mut dependencies = Vec::new();
        for row in rows {
            let (source, target, kind, lag_days) = row?;
            let dependency_type: DependencyType =
                kind.parse().map_err(PersistenceError::InvalidData)?;
            dependencies.push(Dependency::new(source, target, dependency_type).with_lag(lag_days));
        }
        Ok(dependencies)
    }

    fn list_allocations(
        &self,
        user_id: Option<&str>,
        range: Option<DateRange>,
    ) -> PersistenceResult<Vec<ResourceAllocation>> {
        // ISO dates compare correctly as text.
        let range_start = range.map(|r| format_day(r.start));
        let range_end = range.map(|r| format_day(r.end));
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT task_id, user_id, allocation_percentage, start_date, end_date
             FROM resource_allocations
             WHERE (?1 IS NULL OR user_id = ?1)
               AND (?2 IS NULL OR end_date >= ?2)
               AND (?3 IS NULL OR start_date <= ?3)
             ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![user_id, range_start, range_end], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut allocations = Vec::new();
        for row in rows {
            let (task_id, user, pct, start, end) = row?;
            allocations.push(ResourceAllocation::new(
                task_id,
                user,
                pct,
                parse_day(&start)?,
                parse_day(&end)?,
            ));
        }
        Ok(allocations)
    }

    fn insert_plan(&mut self, plan: ReleasePlan) -> PersistenceResult<()> {
        if plan.end_date < plan.start_date {
            return Err(PersistenceError::InvalidData(format!(
                "release plan {} ends before it starts",
                plan.id
            )));
        }
        let json = serde_json::to_string(&plan)?;
        let conn = self.lock()?;
        if Self::exists(&conn, "SELECT id FROM release_plans WHERE id = ?1", plan.id)? {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate release plan id {}",
                plan.id
            )));
        }
        conn.execute(
            "INSERT INTO release_plans (id, plan_json) VALUES (?1, ?2)",
            params![plan.id, json],
        )?;
        debug!(plan_id = plan.id, "release plan stored");
        Ok(())
    }

    fn insert_kit(&mut self, kit: Kit) -> PersistenceResult<()> {
        let json = serde_json::to_string(&kit)?;
        let conn = self.lock()?;
        if !Self::exists(&conn, "SELECT id FROM release_plans WHERE id = ?1", kit.release_plan_id)? {
            return Err(PersistenceError::NotFound(format!(
                "release plan {}",
                kit.release_plan_id
            )));
        }
        if Self::exists(&conn, "SELECT id FROM kits WHERE id = ?1", kit.id)? {
            return Err(PersistenceError::InvalidData(format!("duplicate kit id {}", kit.id)));
        }
        conn.execute(
            "INSERT INTO kits (id, release_plan_id, kit_json) VALUES (?1, ?2, ?3)",
            params![kit.id, kit.release_plan_id, json],
        )?;
        Ok(())
    }

    fn insert_task(&mut self, task: Task) -> PersistenceResult<()> {
        task_validation::validate_task(&task)?;
        let json = serde_json::to_string(&task)?;
        let conn = self.lock()?;
        if Self::exists(&conn, "SELECT id FROM tasks WHERE id = ?1", task.id)? {
            return Err(PersistenceError::InvalidData(format!("duplicate task id {}", task.id)));
        }
        if let Some(kit_id) = task.kit_id {
            if !Self::exists(&conn, "SELECT id FROM kits WHERE id = ?1", kit_id)? {
                return Err(PersistenceError::NotFound(format!("kit {kit_id}")));
            }
        }
        conn.execute(
            "INSERT INTO tasks (id, kit_id, task_json) VALUES (?1, ?2, ?3)",
            params![task.id, task.kit_id, json],
        )?;
        Ok(())
    }

    fn insert_dependency(&mut self, dependency: Dependency) -> PersistenceResult<()> {
        task_validation::validate_dependency(&dependency)?;
        let conn = self.lock()?;
        for endpoint in [dependency.source_task_id, dependency.target_task_id] {
            if !Self::exists(&conn, "SELECT id FROM tasks WHERE id = ?1", endpoint)? {
                return Err(PersistenceError::NotFound(format!("task {endpoint}")));
            }
        }
        conn.execute(
            "INSERT INTO task_dependencies (source_task_id, target_task_id, dependency_type, lag_days)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                dependency.source_task_id,
                dependency.target_task_id,
                dependency.dependency_type.as_str(),
                dependency.lag_days
            ],
        )?;
        Ok(())
    }

    fn insert_allocation(&mut self, allocation: ResourceAllocation) -> PersistenceResult<()> {
        task_validation::validate_allocation(&allocation)?;
        let conn = self.lock()?;
        if !Self::exists(&conn, "SELECT id FROM tasks WHERE id = ?1", allocation.task_id)? {
            return Err(PersistenceError::NotFound(format!("task {}", allocation.task_id)));
        }
        conn.execute(
            "INSERT INTO resource_allocations
                (task_id, user_id, allocation_percentage, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                allocation.task_id,
                allocation.user_id,
                allocation.allocation_percentage,
                format_day(allocation.start_date),
                format_day(allocation.end_date)
            ],
        )?;
        Ok(())
    }
}
