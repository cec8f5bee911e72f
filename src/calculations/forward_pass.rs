use super::{duration_of, offset, shift};
use crate::error::{AnalysisError, AnalysisResult};
use crate::graph::ScheduleDag;
use crate::task::{DependencyType, Task};
use chrono::NaiveDateTime;
use petgraph::Direction;
use petgraph::visit::EdgeRef;

pub struct ForwardPass<'a> {
    tasks: &'a [Task],
    dag: &'a ScheduleDag,
    plan_start: Option<NaiveDateTime>,
}

impl<'a> ForwardPass<'a> {
    pub fn new(tasks: &'a [Task], dag: &'a ScheduleDag) -> Self {
        Self {
            tasks,
            dag,
            plan_start: None,
        }
    }

    pub fn with_plan_start(mut self, plan_start: Option<NaiveDateTime>) -> Self {
        self.plan_start = plan_start;
        self
    }

    pub fn execute(&self, order: &[usize]) -> AnalysisResult<Vec<(NaiveDateTime, NaiveDateTime)>> {
        let mut earliest: Vec<Option<(NaiveDateTime, NaiveDateTime)>> = vec![None; self.tasks.len()];

        for &position in order {
            let task = &self.tasks[position];
            let node_ix = self.dag.id_to_index[&task.id];
            let duration = duration_of(task)?;

            let mut early_start: Option<NaiveDateTime> = None;
            for edge in self.dag.graph.edges_directed(node_ix, Direction::Incoming) {
                let source_pos = self.dag.graph[edge.source()];
                let Some((source_es, source_ef)) = earliest[source_pos] else {
                    continue;
                };
                let weight = edge.weight();
                let candidate = match weight.dependency_type {
                    DependencyType::FinishToStart => shift(source_ef, weight.lag, task.id)?,
                    DependencyType::StartToStart => shift(source_es, weight.lag, task.id)?,
                    DependencyType::FinishToFinish => {
                        shift(source_ef, offset(weight.lag, duration, task.id)?, task.id)?
                    }
                    DependencyType::StartToFinish => {
                        shift(source_es, offset(weight.lag, duration, task.id)?, task.id)?
                    }
                };
                early_start = Some(match early_start {
                    Some(current) if current >= candidate => current,
                    _ => candidate,
                });
            }

            let early_start = match early_start {
                Some(es) => es,
                None => task.start_date.or(self.plan_start).ok_or_else(|| {
                    AnalysisError::invalid(format!(
                        "task {} has no start date and no predecessors",
                        task.id
                    ))
                })?,
            };
            let early_finish = shift(early_start, duration, task.id)?;
            earliest[position] = Some((early_start, early_finish));
        }

        earliest
            .into_iter()
            .zip(self.tasks)
            .map(|(times, task)| {
                times.ok_or_else(|| {
                    AnalysisError::invalid(format!("task {} was not reached by the forward pass", task.id))
                })
            })
            .collect()
    }
}
