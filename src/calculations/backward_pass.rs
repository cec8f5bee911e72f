use super::{duration_of, offset, shift};
use crate::error::{AnalysisError, AnalysisResult};
use crate::graph::ScheduleDag;
use crate::task::{DependencyType, Task};
use chrono::NaiveDateTime;
use petgraph::Direction;
use petgraph::visit::EdgeRef;

pub struct BackwardPass<'a> {
    tasks: &'a [Task],
    dag: &'a ScheduleDag,
}

impl<'a> BackwardPass<'a> {
    pub fn new(tasks: &'a [Task], dag: &'a ScheduleDag) -> Self {
        Self { tasks, dag }
    }

    /// Returns `(latest_start, latest_finish)` per task position. `order` is the
    /// forward topological order; it is walked in reverse.
    pub fn execute(
        &self,
        order: &[usize],
        earliest: &[(NaiveDateTime, NaiveDateTime)],
    ) -> AnalysisResult<Vec<(NaiveDateTime, NaiveDateTime)>> {
        let mut latest: Vec<Option<(NaiveDateTime, NaiveDateTime)>> = vec![None; self.tasks.len()];

        for &position in order.iter().rev() {
            let task = &self.tasks[position];
            let node_ix = self.dag.id_to_index[&task.id];
            let duration = duration_of(task)?;

            // Determine allowed late finish from successors' late dates
            let mut late_finish: Option<NaiveDateTime> = None;
            for edge in self.dag.graph.edges_directed(node_ix, Direction::Outgoing) {
                let target_pos = self.dag.graph[edge.target()];
                let Some((target_ls, target_lf)) = latest[target_pos] else {
                    continue;
                };
                let weight = edge.weight();
                let candidate = match weight.dependency_type {
                    DependencyType::FinishToStart => shift(target_ls, -weight.lag, task.id)?,
                    DependencyType::StartToStart => {
                        shift(target_ls, offset(duration, weight.lag, task.id)?, task.id)?
                    }
                    DependencyType::FinishToFinish => shift(target_lf, -weight.lag, task.id)?,
                    DependencyType::StartToFinish => {
                        shift(target_lf, offset(duration, weight.lag, task.id)?, task.id)?
                    }
                };
                late_finish = Some(match late_finish {
                    Some(current) if current <= candidate => current,
                    _ => candidate,
                });
            }

            let late_finish = match late_finish {
                Some(lf) => lf,
                None => task.end_date.unwrap_or(earliest[position].1),
            };
            let late_start = shift(late_finish, -duration, task.id)?;
            latest[position] = Some((late_start, late_finish));
        }

        latest
            .into_iter()
            .zip(self.tasks)
            .map(|(times, task)| {
                times.ok_or_else(|| {
                    AnalysisError::invalid(format!("task {} was not reached by the backward pass", task.id))
                })
            })
            .collect()
    }
}
