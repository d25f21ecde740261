use rayon::prelude::*;

use obx_core::{ErrorInfo, ObxError};

use crate::grid::RunTask;
use crate::report::TaskReport;

/// Fans tasks out across a fixed-size worker pool and blocks until every
/// task has completed or failed.
///
/// With one worker the tasks run sequentially on the caller's thread. With
/// more, a dedicated rayon pool executes them; workers share nothing beyond
/// the read-only state captured by `execute`. Either way the call is the
/// synchronization barrier the merge phase depends on: when it returns, no
/// worker is still writing.
///
/// A failing task never aborts its siblings; each outcome is captured in a
/// [`TaskReport`], returned in grid order regardless of completion order.
pub fn run_tasks<F>(
    tasks: &[RunTask],
    workers: usize,
    execute: F,
) -> Result<Vec<TaskReport>, ObxError>
where
    F: Fn(&RunTask) -> Result<(), ObxError> + Sync,
{
    if workers <= 1 {
        return Ok(tasks
            .iter()
            .map(|task| TaskReport::from_result(*task, execute(task)))
            .collect());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|err| {
            ObxError::Worker(
                ErrorInfo::new("thread_pool", "failed to build worker pool")
                    .with_context("workers", workers.to_string())
                    .with_hint(err.to_string()),
            )
        })?;
    // Indexed parallel iterators collect in input order, so reports keep
    // grid order without an explicit sort.
    let reports = pool.install(|| {
        tasks
            .par_iter()
            .map(|task| TaskReport::from_result(*task, execute(task)))
            .collect()
    });
    Ok(reports)
}
