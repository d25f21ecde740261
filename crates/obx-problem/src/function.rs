use obx_core::{ErrorInfo, ObxError, ProblemMeta};
use obx_logger::{Logger, Measurement};

use crate::factory::Objective;
use crate::{EvalState, Problem};

/// A problem backed by an objective closure.
///
/// This is the canonical [`Problem`] implementation used for wrapped custom
/// functions; suites providing their own evaluation machinery implement the
/// trait directly.
pub struct FunctionProblem {
    meta: ProblemMeta,
    state: EvalState,
    objective: Objective,
    logger: Option<Box<dyn Logger>>,
}

impl std::fmt::Debug for FunctionProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionProblem")
            .field("meta", &self.meta)
            .field("state", &self.state)
            .field("logger_attached", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

impl FunctionProblem {
    /// Creates a fresh instance for the given identity and objective.
    pub fn new(meta: ProblemMeta, objective: Objective) -> Self {
        let state = EvalState::new(meta.direction);
        Self {
            meta,
            state,
            objective,
            logger: None,
        }
    }
}

impl Problem for FunctionProblem {
    fn meta(&self) -> &ProblemMeta {
        &self.meta
    }

    fn state(&self) -> &EvalState {
        &self.state
    }

    fn evaluate(&mut self, x: &[f64]) -> Result<f64, ObxError> {
        if x.len() as u64 != self.meta.dim {
            return Err(ObxError::DimensionConstraint(
                ErrorInfo::new("position_len", "position length does not match dimension")
                    .with_context("dim", self.meta.dim.to_string())
                    .with_context("len", x.len().to_string()),
            ));
        }
        let y = (self.objective)(x);
        self.state.record(y);
        if let Some(logger) = self.logger.as_mut() {
            logger.log(&Measurement {
                evaluations: self.state.evaluations,
                raw_y: y,
                best_y: self.state.best_y,
                x,
            })?;
        }
        Ok(y)
    }

    fn reset(&mut self) -> Result<(), ObxError> {
        self.state.reset();
        if let Some(logger) = self.logger.as_mut() {
            logger.reset()?;
        }
        Ok(())
    }

    fn attach_logger(&mut self, mut logger: Box<dyn Logger>) -> Result<(), ObxError> {
        logger.attach(&self.meta)?;
        self.logger = Some(logger);
        Ok(())
    }

    fn detach_logger(&mut self) -> Option<Box<dyn Logger>> {
        self.logger.take()
    }
}
