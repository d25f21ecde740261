#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use obx_core::{Direction, ErrorInfo, ObxError, ProblemMeta, SuiteKind};
use obx_exp::Algorithm;
use obx_logger::{AttributeCell, Logger, Measurement};
use obx_problem::{EvalState, Problem, ProblemFactory};

/// Observable lifecycle events recorded by the instrumented fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Created { fid: u64, iid: u64, dim: u64 },
    Invoked { fid: u64, solved: u64 },
    Reset { fid: u64 },
}

pub type Ledger = Arc<Mutex<Vec<Event>>>;

pub fn new_ledger() -> Ledger {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(ledger: &Ledger) -> Vec<Event> {
    ledger.lock().unwrap().clone()
}

/// Problem fixture recording constructions and resets in a shared ledger.
pub struct RecordingProblem {
    meta: ProblemMeta,
    state: EvalState,
    ledger: Ledger,
    logger: Option<Box<dyn Logger>>,
}

impl std::fmt::Debug for RecordingProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingProblem")
            .field("meta", &self.meta)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Problem for RecordingProblem {
    fn meta(&self) -> &ProblemMeta {
        &self.meta
    }

    fn state(&self) -> &EvalState {
        &self.state
    }

    fn evaluate(&mut self, x: &[f64]) -> Result<f64, ObxError> {
        let y = x.iter().map(|v| v * v).sum();
        self.state.record(y);
        if let Some(logger) = self.logger.as_mut() {
            logger.log(&Measurement {
                evaluations: self.state.evaluations(),
                raw_y: y,
                best_y: self.state.best_y(),
                x,
            })?;
        }
        Ok(y)
    }

    fn reset(&mut self) -> Result<(), ObxError> {
        self.ledger.lock().unwrap().push(Event::Reset {
            fid: self.meta.fid,
        });
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

/// Registers a recording problem for each fid in the real-valued base suite.
pub fn recording_factory(fids: &[u64], ledger: &Ledger) -> ProblemFactory {
    let mut factory = ProblemFactory::new();
    for &fid in fids {
        let ledger = ledger.clone();
        factory
            .register(
                SuiteKind::RealBase,
                fid,
                format!("Probe{fid}"),
                Arc::new(move |iid, dim| {
                    ledger.lock().unwrap().push(Event::Created { fid, iid, dim });
                    Ok(Box::new(RecordingProblem {
                        meta: ProblemMeta {
                            fid,
                            iid,
                            dim,
                            name: format!("Probe{fid}"),
                            suite: SuiteKind::RealBase,
                            direction: Direction::Minimize,
                        },
                        state: EvalState::new(Direction::Minimize),
                        ledger: ledger.clone(),
                        logger: None,
                    }) as Box<dyn Problem>)
                }),
            )
            .expect("register recording problem");
    }
    factory
}

/// Algorithm fixture with per-instance state, recording every invocation.
pub struct CountingAlgorithm {
    pub ledger: Ledger,
    pub solved: u64,
    /// When set, invocations on this fid fail after recording.
    pub fail_on: Option<u64>,
}

impl CountingAlgorithm {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            solved: 0,
            fail_on: None,
        }
    }
}

impl Algorithm for CountingAlgorithm {
    fn name(&self) -> &str {
        "counting"
    }

    fn run(&mut self, problem: &mut dyn Problem) -> Result<(), ObxError> {
        self.solved += 1;
        let fid = problem.meta().fid;
        let dim = problem.meta().dim as usize;
        problem.evaluate(&vec![1.0; dim])?;
        self.ledger.lock().unwrap().push(Event::Invoked {
            fid,
            solved: self.solved,
        });
        if self.fail_on == Some(fid) {
            return Err(ObxError::Worker(
                ErrorInfo::new("fixture_failure", "instructed to fail")
                    .with_context("fid", fid.to_string()),
            ));
        }
        Ok(())
    }

    fn fork(&self) -> Box<dyn Algorithm> {
        Box::new(Self {
            ledger: self.ledger.clone(),
            solved: self.solved,
            fail_on: self.fail_on,
        })
    }
}

/// Seeded random search exposing run and logged attributes through cells.
pub struct RandomSearch {
    pub budget: u64,
    pub seed: u64,
    evaluations_used: AttributeCell,
    best_seen: AttributeCell,
}

impl RandomSearch {
    pub fn new(budget: u64, seed: u64) -> Self {
        Self {
            budget,
            seed,
            evaluations_used: AttributeCell::new(0.0),
            best_seen: AttributeCell::new(f64::INFINITY),
        }
    }
}

impl Algorithm for RandomSearch {
    fn name(&self) -> &str {
        "random-search"
    }

    fn run(&mut self, problem: &mut dyn Problem) -> Result<(), ObxError> {
        let dim = problem.meta().dim as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);
        for evaluation in 0..self.budget {
            let x: Vec<f64> = (0..dim).map(|_| rng.gen_range(-5.0..5.0)).collect();
            problem.evaluate(&x)?;
            self.evaluations_used.set(evaluation as f64 + 1.0);
            self.best_seen.set(problem.state().best_y());
        }
        Ok(())
    }

    fn fork(&self) -> Box<dyn Algorithm> {
        Box::new(Self::new(self.budget, self.seed))
    }

    fn attribute(&self, name: &str) -> Option<AttributeCell> {
        match name {
            "evaluations_used" => Some(self.evaluations_used.clone()),
            "best_seen" => Some(self.best_seen.clone()),
            _ => None,
        }
    }
}

/// Registers a simple quadratic bowl under the given fid.
pub fn sphere_factory(fids: &[u64]) -> ProblemFactory {
    let mut factory = ProblemFactory::new();
    for &fid in fids {
        factory
            .register(
                SuiteKind::RealBase,
                fid,
                format!("Sphere{fid}"),
                Arc::new(move |iid, dim| {
                    Ok(Box::new(obx_problem::FunctionProblem::new(
                        ProblemMeta {
                            fid,
                            iid,
                            dim,
                            name: format!("Sphere{fid}"),
                            suite: SuiteKind::RealBase,
                            direction: Direction::Minimize,
                        },
                        Arc::new(|x: &[f64]| x.iter().map(|v| v * v).sum()),
                    )) as Box<dyn Problem>)
                }),
            )
            .expect("register sphere problem");
    }
    factory
}
