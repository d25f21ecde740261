use serde::{Deserialize, Serialize};

/// Family of benchmark problems an experiment draws from.
///
/// The two superset suites extend the corresponding base suites with
/// additional function ids; structural rules (such as dimension constraints)
/// may differ per suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SuiteKind {
    /// Base discrete-combinatorial suite.
    DiscreteBase,
    /// Superset of the discrete-combinatorial suite.
    DiscreteSuperset,
    /// Base real-valued suite.
    #[default]
    RealBase,
    /// Superset of the real-valued suite.
    RealSuperset,
}

impl SuiteKind {
    /// True for the discrete-combinatorial suites.
    pub fn is_discrete(&self) -> bool {
        matches!(self, SuiteKind::DiscreteBase | SuiteKind::DiscreteSuperset)
    }

    /// Returns the superset suite covering this one.
    pub fn superset(&self) -> SuiteKind {
        if self.is_discrete() {
            SuiteKind::DiscreteSuperset
        } else {
            SuiteKind::RealSuperset
        }
    }

    /// Returns the base suite this one extends (identity for base suites).
    pub fn base(&self) -> SuiteKind {
        if self.is_discrete() {
            SuiteKind::DiscreteBase
        } else {
            SuiteKind::RealBase
        }
    }

    /// Stable kebab-case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SuiteKind::DiscreteBase => "discrete-base",
            SuiteKind::DiscreteSuperset => "discrete-superset",
            SuiteKind::RealBase => "real-base",
            SuiteKind::RealSuperset => "real-superset",
        }
    }
}

/// Sense of the objective for a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Smaller objective values are better.
    #[default]
    Minimize,
    /// Larger objective values are better.
    Maximize,
}

impl Direction {
    /// True when `candidate` is strictly better than `incumbent`.
    pub fn improves(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Minimize => candidate < incumbent,
            Direction::Maximize => candidate > incumbent,
        }
    }

    /// The neutral starting incumbent every value improves upon.
    pub fn initial_best(&self) -> f64 {
        match self {
            Direction::Minimize => f64::INFINITY,
            Direction::Maximize => f64::NEG_INFINITY,
        }
    }
}

/// Identity of one benchmark problem configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemMeta {
    /// Function id within the suite.
    pub fid: u64,
    /// Instance id (translation/rotation variant) of the function.
    pub iid: u64,
    /// Number of decision variables.
    pub dim: u64,
    /// Human readable function name, used in output file names.
    pub name: String,
    /// Suite the problem belongs to.
    pub suite: SuiteKind,
    /// Objective sense of the problem.
    pub direction: Direction,
}
