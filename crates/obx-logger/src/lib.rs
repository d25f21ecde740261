#![deny(missing_docs)]
#![doc = "Measurement-logging boundary and on-disk layout for the OBX experiment engine."]

use std::collections::BTreeMap;

use obx_core::{ObxError, ProblemMeta};

mod attributes;
mod file;
pub mod layout;
mod triggers;

pub use attributes::AttributeCell;
pub use file::{FileLogger, SessionSpec};
pub use triggers::{TriggerPlan, TriggerSet};

/// One observed evaluation, reported by a problem to its attached session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement<'a> {
    /// Evaluation counter within the current run (1-based).
    pub evaluations: u64,
    /// Objective value of this evaluation.
    pub raw_y: f64,
    /// Best objective value seen so far in the current run.
    pub best_y: f64,
    /// Position that was evaluated.
    pub x: &'a [f64],
}

/// A measurement-logging session scoped to one task's execution.
///
/// Problems report every evaluation through [`Logger::log`]; the session
/// decides which measurements are recorded. [`Logger::reset`] marks a run
/// boundary and [`Logger::close`] flushes the session on every exit path.
pub trait Logger: Send {
    /// Declares experiment-level static attributes, identical across tasks.
    fn declare_experiment_attributes(&mut self, attributes: &BTreeMap<String, f64>);

    /// Declares attributes sampled once per run, at the run boundary.
    fn declare_run_attributes(&mut self, attributes: &[(String, AttributeCell)]);

    /// Declares attributes sampled at every recorded measurement.
    fn declare_logged_attributes(&mut self, attributes: &[(String, AttributeCell)]);

    /// Binds the session to a problem before its first evaluation.
    fn attach(&mut self, meta: &ProblemMeta) -> Result<(), ObxError>;

    /// Reports one evaluation.
    fn log(&mut self, measurement: &Measurement<'_>) -> Result<(), ObxError>;

    /// Marks a run boundary.
    fn reset(&mut self) -> Result<(), ObxError>;

    /// Flushes and finalizes the session.
    fn close(&mut self) -> Result<(), ObxError>;
}
