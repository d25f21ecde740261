use obx_core::{ErrorInfo, ObxError};
use obx_logger::{AttributeCell, FileLogger, Logger, SessionSpec};
use obx_problem::{Problem, ProblemFactory};

use crate::algorithm::Algorithm;
use crate::config::ExperimentPlan;
use crate::grid::RunTask;

/// Executes single grid points with full per-task isolation.
///
/// Every call to [`RunExecutor::execute`] forks its own algorithm copy,
/// constructs its own problem instance and, when logging is enabled, opens
/// its own logger session in a uniquely-owned directory. Nothing is shared
/// with sibling tasks, so concurrent calls need no locking.
pub struct RunExecutor<'a> {
    plan: &'a ExperimentPlan,
    factory: &'a ProblemFactory,
    prototype: &'a dyn Algorithm,
}

impl<'a> RunExecutor<'a> {
    /// Binds an executor to the experiment's read-only state.
    pub fn new(
        plan: &'a ExperimentPlan,
        factory: &'a ProblemFactory,
        prototype: &'a dyn Algorithm,
    ) -> Self {
        Self {
            plan,
            factory,
            prototype,
        }
    }

    /// Runs all repetitions of one grid point.
    ///
    /// The attached logger session is detached and closed on every exit
    /// path; a close failure after a successful run is reported, while a
    /// close failure after a run failure does not mask the original error.
    pub fn execute(&self, task: &RunTask) -> Result<(), ObxError> {
        let span = tracing::info_span!("task", fid = task.fid, iid = task.iid, dim = task.dim);
        let _enter = span.enter();

        let mut algorithm = self.prototype.fork();
        let mut problem = self
            .factory
            .create(self.plan.suite, task.fid, task.iid, task.dim)?;
        if self.plan.logged {
            let mut logger = FileLogger::create(&self.session_spec())?;
            logger.declare_experiment_attributes(&self.plan.experiment_attributes);
            logger.declare_run_attributes(&resolve_attributes(
                algorithm.as_ref(),
                &self.plan.run_attributes,
            )?);
            logger.declare_logged_attributes(&resolve_attributes(
                algorithm.as_ref(),
                &self.plan.logged_attributes,
            )?);
            problem.attach_logger(Box::new(logger))?;
        }

        let outcome = apply(algorithm.as_mut(), problem.as_mut(), self.plan.reps);
        if let Some(mut logger) = problem.detach_logger() {
            let closed = logger.close();
            if outcome.is_ok() {
                closed?;
            }
        }
        if let Err(err) = &outcome {
            tracing::warn!(error = %err, "task failed");
        }
        outcome
    }

    fn session_spec(&self) -> SessionSpec {
        SessionSpec {
            output_directory: self.plan.output_directory.clone(),
            folder_name: self.plan.folder_name.clone(),
            algorithm_name: self
                .plan
                .algorithm_name
                .clone()
                .unwrap_or_else(|| self.prototype.name().to_string()),
            algorithm_info: self.plan.algorithm_info.clone(),
            store_positions: self.plan.store_positions,
            triggers: self.plan.triggers.clone(),
        }
    }
}

/// The repetition loop: invoke the algorithm, then reset the problem,
/// exactly `reps` times. The algorithm persists across repetitions of one
/// task, so cross-repetition learning within a task is preserved.
fn apply(
    algorithm: &mut dyn Algorithm,
    problem: &mut dyn Problem,
    reps: u64,
) -> Result<(), ObxError> {
    for _ in 0..reps {
        algorithm.run(problem)?;
        problem.reset()?;
    }
    Ok(())
}

fn resolve_attributes(
    algorithm: &dyn Algorithm,
    names: &[String],
) -> Result<Vec<(String, AttributeCell)>, ObxError> {
    names
        .iter()
        .map(|name| {
            algorithm
                .attribute(name)
                .map(|cell| (name.clone(), cell))
                .ok_or_else(|| {
                    ObxError::Config(
                        ErrorInfo::new("attr_missing", "algorithm does not expose attribute")
                            .with_context("attribute", name.clone()),
                    )
                })
        })
        .collect()
}
