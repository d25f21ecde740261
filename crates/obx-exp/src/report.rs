use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use obx_core::{ObxError, RunProvenance};

use crate::grid::RunTask;
use crate::merge::MergeReport;

/// State of one dispatched task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Task completed all repetitions.
    Complete,
    /// Task failed; the error is recorded alongside.
    Failed,
}

/// Execution status of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// State of the task.
    pub state: TaskState,
    /// Error captured when the task failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStatus {
    /// Status of a completed task.
    pub fn complete() -> Self {
        Self {
            state: TaskState::Complete,
            error: None,
        }
    }

    /// Status of a failed task, capturing the error string.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            state: TaskState::Failed,
            error: Some(error.into()),
        }
    }
}

/// Outcome of one grid point, reported after the dispatch barrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    /// The grid point.
    pub task: RunTask,
    /// Its execution status.
    pub status: TaskStatus,
}

impl TaskReport {
    /// Builds a report from a task's execution result.
    pub fn from_result(task: RunTask, result: Result<(), ObxError>) -> Self {
        let status = match result {
            Ok(()) => TaskStatus::complete(),
            Err(err) => TaskStatus::failed(err.to_string()),
        };
        Self { task, status }
    }
}

/// Aggregate report of one experiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Provenance metadata describing the run.
    pub provenance: RunProvenance,
    /// Per-task outcomes, in grid order.
    pub tasks: Vec<TaskReport>,
    /// Merge outcome, when output merging ran.
    pub merge: Option<MergeReport>,
    /// Path of the archive artifact, when archiving ran.
    pub archive: Option<PathBuf>,
}

impl ExperimentReport {
    /// Number of completed tasks.
    pub fn completed(&self) -> usize {
        self.tasks
            .iter()
            .filter(|report| report.status.state == TaskState::Complete)
            .count()
    }

    /// The failed tasks, in grid order.
    pub fn failed_tasks(&self) -> Vec<&TaskReport> {
        self.tasks
            .iter()
            .filter(|report| report.status.state == TaskState::Failed)
            .collect()
    }

    /// True when every task completed and merging (if any) was clean.
    pub fn is_success(&self) -> bool {
        self.failed_tasks().is_empty()
            && self.merge.as_ref().map(|m| m.is_clean()).unwrap_or(true)
    }
}

/// Builds report provenance for a plan hash.
pub(crate) fn run_provenance(plan_hash: String) -> RunProvenance {
    let mut tool_versions = BTreeMap::new();
    tool_versions.insert("obx-exp".to_string(), env!("CARGO_PKG_VERSION").to_string());
    RunProvenance {
        plan_hash,
        created_at: Utc::now().to_rfc3339(),
        tool_versions,
    }
}
