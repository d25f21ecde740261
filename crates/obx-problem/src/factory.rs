use std::collections::BTreeMap;
use std::sync::Arc;

use obx_core::{Direction, ErrorInfo, ObxError, ProblemMeta, SuiteKind};

use crate::function::FunctionProblem;
use crate::Problem;

/// Objective closure shared by all instances of a wrapped function.
pub type Objective = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

type ProblemBuilder = Arc<dyn Fn(u64, u64) -> Result<Box<dyn Problem>, ObxError> + Send + Sync>;

/// Function ids assigned to wrapped custom functions start here, clear of the
/// id space benchmark suites use.
const CUSTOM_FID_START: u64 = 10_000;

/// Discrete-suite function ids whose dimension must be a perfect square.
const SQUARE_DIM_FIDS: [u64; 2] = [21, 23];

struct Registration {
    name: String,
    builder: ProblemBuilder,
}

/// Registry of problem constructors, polymorphic over suite kind.
///
/// The registry ships empty; benchmark suites and custom functions are
/// installed through [`ProblemFactory::register`] and
/// [`ProblemFactory::wrap_function`]. A superset suite resolves ids of its
/// base suite as well.
#[derive(Default)]
pub struct ProblemFactory {
    problems: BTreeMap<(SuiteKind, u64), Registration>,
}

impl ProblemFactory {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a builder for a (suite, fid) slot.
    pub fn register(
        &mut self,
        suite: SuiteKind,
        fid: u64,
        name: impl Into<String>,
        builder: ProblemBuilder,
    ) -> Result<(), ObxError> {
        let name = name.into();
        if self.problems.contains_key(&(suite, fid)) {
            return Err(ObxError::Config(
                ErrorInfo::new("fid_taken", "function id already registered for suite")
                    .with_context("fid", fid.to_string())
                    .with_context("suite", suite.as_str()),
            ));
        }
        self.problems.insert((suite, fid), Registration { name, builder });
        Ok(())
    }

    /// Wraps a custom objective as a problem of the given suite family.
    ///
    /// The function lands in the superset suite, under the next free custom
    /// function id, which is returned so callers can add it to their grid.
    pub fn wrap_function(
        &mut self,
        suite: SuiteKind,
        name: impl Into<String>,
        direction: Direction,
        objective: Objective,
    ) -> Result<u64, ObxError> {
        let suite = suite.superset();
        let fid = self.next_custom_fid(suite);
        let name = name.into();
        let display_name = name.clone();
        self.register(
            suite,
            fid,
            name,
            Arc::new(move |iid, dim| {
                Ok(Box::new(FunctionProblem::new(
                    ProblemMeta {
                        fid,
                        iid,
                        dim,
                        name: display_name.clone(),
                        suite,
                        direction,
                    },
                    objective.clone(),
                )) as Box<dyn Problem>)
            }),
        )?;
        Ok(fid)
    }

    /// Constructs a problem instance for one grid point.
    pub fn create(
        &self,
        suite: SuiteKind,
        fid: u64,
        iid: u64,
        dim: u64,
    ) -> Result<Box<dyn Problem>, ObxError> {
        check_dimension(suite, fid, dim)?;
        let registration = self
            .problems
            .get(&(suite, fid))
            .or_else(|| self.problems.get(&(suite.base(), fid)))
            .ok_or_else(|| {
                ObxError::UnknownProblem(
                    ErrorInfo::new("fid_unregistered", "function id not registered for suite")
                        .with_context("fid", fid.to_string())
                        .with_context("suite", suite.as_str()),
                )
            })?;
        (registration.builder)(iid, dim)
    }

    /// Name under which `fid` is registered, if any.
    pub fn name_of(&self, suite: SuiteKind, fid: u64) -> Option<&str> {
        self.problems
            .get(&(suite, fid))
            .or_else(|| self.problems.get(&(suite.base(), fid)))
            .map(|registration| registration.name.as_str())
    }

    fn next_custom_fid(&self, suite: SuiteKind) -> u64 {
        self.problems
            .range((suite, CUSTOM_FID_START)..(suite, u64::MAX))
            .map(|((_, fid), _)| fid + 1)
            .last()
            .unwrap_or(CUSTOM_FID_START)
    }
}

/// Validates suite-specific structural requirements on the dimension.
pub fn check_dimension(suite: SuiteKind, fid: u64, dim: u64) -> Result<(), ObxError> {
    if dim == 0 {
        return Err(ObxError::DimensionConstraint(
            ErrorInfo::new("dim_zero", "dimension must be positive").with_context("fid", fid.to_string()),
        ));
    }
    if suite.is_discrete() && SQUARE_DIM_FIDS.contains(&fid) && !is_perfect_square(dim) {
        return Err(ObxError::DimensionConstraint(
            ErrorInfo::new("square_dim", "function requires a perfect-square dimension")
                .with_context("fid", fid.to_string())
                .with_context("dim", dim.to_string())
                .with_hint("use 4, 9, 16, 25, ..."),
        ));
    }
    Ok(())
}

fn is_perfect_square(dim: u64) -> bool {
    let root = (dim as f64).sqrt().round() as u64;
    root * root == dim
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_one_max() -> (ProblemFactory, u64) {
        let mut factory = ProblemFactory::new();
        let fid = factory
            .wrap_function(
                SuiteKind::DiscreteBase,
                "OneMax",
                Direction::Maximize,
                Arc::new(|x: &[f64]| x.iter().filter(|&&v| v > 0.5).count() as f64),
            )
            .expect("wrap");
        (factory, fid)
    }

    #[test]
    fn wrapped_functions_land_in_the_superset() {
        let (factory, fid) = registry_with_one_max();
        assert!(fid >= CUSTOM_FID_START);
        assert!(factory.create(SuiteKind::DiscreteSuperset, fid, 1, 4).is_ok());
        assert!(factory.create(SuiteKind::DiscreteBase, fid, 1, 4).is_err());
        assert_eq!(factory.name_of(SuiteKind::DiscreteSuperset, fid), Some("OneMax"));
    }

    #[test]
    fn custom_fids_are_consecutive() {
        let (mut factory, first) = registry_with_one_max();
        let second = factory
            .wrap_function(
                SuiteKind::DiscreteSuperset,
                "LeadingOnes",
                Direction::Maximize,
                Arc::new(|x: &[f64]| x.iter().take_while(|&&v| v > 0.5).count() as f64),
            )
            .expect("wrap");
        assert_eq!(second, first + 1);
    }

    #[test]
    fn superset_resolves_base_registrations() {
        let mut factory = ProblemFactory::new();
        factory
            .register(
                SuiteKind::RealBase,
                1,
                "Sphere",
                Arc::new(|iid, dim| {
                    Ok(Box::new(FunctionProblem::new(
                        ProblemMeta {
                            fid: 1,
                            iid,
                            dim,
                            name: "Sphere".into(),
                            suite: SuiteKind::RealBase,
                            direction: Direction::Minimize,
                        },
                        Arc::new(|x: &[f64]| x.iter().map(|v| v * v).sum()),
                    )) as Box<dyn Problem>)
                }),
            )
            .expect("register");
        assert!(factory.create(SuiteKind::RealSuperset, 1, 1, 2).is_ok());
        assert!(factory.create(SuiteKind::RealBase, 1, 1, 2).is_ok());
    }

    #[test]
    fn unknown_fid_is_reported() {
        let factory = ProblemFactory::new();
        let err = factory.create(SuiteKind::RealBase, 7, 1, 2).unwrap_err();
        assert!(matches!(err, ObxError::UnknownProblem(_)));
        assert_eq!(err.info().context.get("fid").map(String::as_str), Some("7"));
    }

    #[test]
    fn discrete_square_dimension_rule() {
        let (factory, _) = registry_with_one_max();
        for fid in SQUARE_DIM_FIDS {
            let err = factory
                .create(SuiteKind::DiscreteSuperset, fid, 1, 5)
                .unwrap_err();
            assert!(matches!(err, ObxError::DimensionConstraint(_)));
        }
        // A perfect square passes the constraint and fails later only if the
        // fid is unregistered.
        let err = factory
            .create(SuiteKind::DiscreteSuperset, 21, 1, 9)
            .unwrap_err();
        assert!(matches!(err, ObxError::UnknownProblem(_)));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (mut factory, fid) = registry_with_one_max();
        let err = factory
            .register(
                SuiteKind::DiscreteSuperset,
                fid,
                "Clash",
                Arc::new(|_, _| unreachable!()),
            )
            .unwrap_err();
        assert!(matches!(err, ObxError::Config(_)));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let (factory, fid) = registry_with_one_max();
        let err = factory
            .create(SuiteKind::DiscreteSuperset, fid, 1, 0)
            .unwrap_err();
        assert!(matches!(err, ObxError::DimensionConstraint(_)));
    }
}
