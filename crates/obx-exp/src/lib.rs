#![deny(missing_docs)]
#![doc = "Experiment orchestration and output consolidation for the OBX engine."]
//!
//! The engine enumerates a benchmark grid (function id × instance id ×
//! dimension), dispatches each grid point across a worker pool with full
//! per-task isolation, folds the per-session output shards into one
//! canonical folder after the dispatch barrier, and optionally archives the
//! result.

use obx_core::{ErrorInfo, ObxError};
use obx_problem::ProblemFactory;

mod algorithm;
mod archive;
mod config;
mod dispatch;
mod executor;
mod grid;
mod merge;
mod report;

pub use algorithm::Algorithm;
pub use archive::finalize;
pub use config::{ExperimentPlan, Workers};
pub use dispatch::run_tasks;
pub use executor::RunExecutor;
pub use grid::{GridIterator, RunTask};
pub use merge::{merge_output, MergeReport, ShardFailure};
pub use report::{ExperimentReport, TaskReport, TaskState, TaskStatus};

/// A validated, ready-to-run experiment: plan + algorithm + problem factory.
pub struct Experiment {
    plan: ExperimentPlan,
    algorithm: Box<dyn Algorithm>,
    factory: ProblemFactory,
}

impl std::fmt::Debug for Experiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Experiment")
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

impl Experiment {
    /// Validates the plan against the algorithm and builds the experiment.
    ///
    /// Fails fast, before any task executes, when the plan is structurally
    /// invalid or when a declared run/logged attribute is not exposed by the
    /// algorithm.
    pub fn new(
        plan: ExperimentPlan,
        algorithm: Box<dyn Algorithm>,
        factory: ProblemFactory,
    ) -> Result<Self, ObxError> {
        plan.validate()?;
        for name in plan.run_attributes.iter().chain(&plan.logged_attributes) {
            if algorithm.attribute(name).is_none() {
                return Err(ObxError::Config(
                    ErrorInfo::new("attr_missing", "algorithm does not expose attribute")
                        .with_context("attribute", name.clone()),
                ));
            }
        }
        if plan.merge_output && plan.canonical_root().is_dir() {
            tracing::warn!(
                root = %plan.canonical_root().display(),
                "output folder already exists; its contents will be merged with this experiment"
            );
        }
        Ok(Self {
            plan,
            algorithm,
            factory,
        })
    }

    /// The validated plan.
    pub fn plan(&self) -> &ExperimentPlan {
        &self.plan
    }

    /// Runs the whole grid, then consolidates and finalizes the output.
    ///
    /// Task failures are captured per grid point in the report and never
    /// halt sibling tasks; only configuration, dispatch-infrastructure and
    /// finalization errors abort the run itself.
    pub fn run(&self) -> Result<ExperimentReport, ObxError> {
        let plan_hash = self.plan.plan_hash()?;
        let tasks: Vec<RunTask> = GridIterator::from_plan(&self.plan).collect();
        let workers = self.plan.workers.resolve();
        tracing::info!(tasks = tasks.len(), workers, "dispatching experiment grid");

        let executor = RunExecutor::new(&self.plan, &self.factory, self.algorithm.as_ref());
        let task_reports = dispatch::run_tasks(&tasks, workers, |task| executor.execute(task))?;

        // The dispatcher has drained; from here on no worker is writing.
        let root = self.plan.canonical_root();
        let mut merge = None;
        let mut archive = None;
        if self.plan.logged {
            if self.plan.merge_output {
                merge = Some(merge::merge_output(&root)?);
            }
            if (self.plan.zip_output || self.plan.remove_data) && root.is_dir() {
                archive = archive::finalize(&root, self.plan.zip_output, self.plan.remove_data)?;
            }
        }

        Ok(ExperimentReport {
            provenance: report::run_provenance(plan_hash),
            tasks: task_reports,
            merge,
            archive,
        })
    }
}
