use crate::error::{AnalysisError, AnalysisResult};
use crate::task::{Dependency, DependencyType, Task, TaskId};
use crate::task_validation;
use chrono::Duration;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    pub dependency_type: DependencyType,
    pub lag: Duration,
}

pub struct ScheduleDag {
    pub graph: DiGraph<usize, DependencyEdge>,
    pub id_to_index: HashMap<TaskId, NodeIndex>,
}

impl ScheduleDag {
    pub fn build(tasks: &[Task], dependencies: &[Dependency]) -> AnalysisResult<Self> {
        task_validation::validate_task_collection(tasks)?;
        let known: HashSet<TaskId> = tasks.iter().map(|task| task.id).collect();
        task_validation::validate_dependencies(dependencies, &known)?;

        let mut graph: DiGraph<usize, DependencyEdge> =
            DiGraph::with_capacity(tasks.len(), dependencies.len());
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::with_capacity(tasks.len());

        // Add nodes first
        for (position, task) in tasks.iter().enumerate() {
            let node_ix = graph.add_node(position);
            id_to_index.insert(task.id, node_ix);
        }

        // Add edges: source -> target
        for dependency in dependencies {
            let u = id_to_index[&dependency.source_task_id];
            let v = id_to_index[&dependency.target_task_id];
            let lag = dependency.lag().ok_or_else(|| {
                AnalysisError::invalid(format!(
                    "lag of {} days is out of range",
                    dependency.lag_days
                ))
            })?;
            graph.add_edge(
                u,
                v,
                DependencyEdge {
                    dependency_type: dependency.dependency_type,
                    lag,
                },
            );
        }

        Ok(Self { graph, id_to_index })
    }

    pub fn topological_positions(&self, tasks: &[Task]) -> AnalysisResult<Vec<usize>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            let position = self.graph[cycle.node_id()];
            AnalysisError::CyclicDependency {
                task_id: tasks[position].id,
            }
        })?;
        Ok(order.into_iter().map(|node_ix| self.graph[node_ix]).collect())
    }
}
