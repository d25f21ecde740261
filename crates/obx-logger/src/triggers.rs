//! Trigger predicates deciding when a measurement is recorded.

use obx_core::Direction;
use serde::{Deserialize, Serialize};

/// Declarative trigger configuration carried by an experiment plan.
///
/// A measurement is recorded when any configured trigger fires. All fields
/// have serde defaults so partial plans parse; the zero value disables the
/// interval and time-range triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerPlan {
    /// Record every evaluation.
    #[serde(default)]
    pub always: bool,
    /// Record whenever the best objective value strictly improves.
    #[serde(default = "TriggerPlan::default_on_improvement")]
    pub on_improvement: bool,
    /// Record every n-th evaluation (0 disables).
    #[serde(default)]
    pub on_interval: u64,
    /// Record n log-spaced points per power-of-base evaluation range
    /// (0 disables).
    #[serde(default)]
    pub per_time_range: u64,
    /// Base of the ranges used by `per_time_range`.
    #[serde(default = "TriggerPlan::default_exp_base")]
    pub range_exp_base: u64,
    /// Record at these evaluation counts, scaled by successive powers of
    /// `time_points_exp_base`.
    #[serde(default)]
    pub at_time_points: Vec<u64>,
    /// Base scaling the fixed time points.
    #[serde(default = "TriggerPlan::default_exp_base")]
    pub time_points_exp_base: u64,
}

impl TriggerPlan {
    const fn default_on_improvement() -> bool {
        true
    }

    const fn default_exp_base() -> u64 {
        10
    }
}

impl Default for TriggerPlan {
    fn default() -> Self {
        Self {
            always: false,
            on_improvement: Self::default_on_improvement(),
            on_interval: 0,
            per_time_range: 0,
            range_exp_base: Self::default_exp_base(),
            at_time_points: Vec::new(),
            time_points_exp_base: Self::default_exp_base(),
        }
    }
}

/// Evaluated form of a [`TriggerPlan`], scoped to one run.
///
/// The improvement trigger keeps its own incumbent so it re-arms on
/// [`TriggerSet::reset`] at run boundaries.
#[derive(Debug, Clone)]
pub struct TriggerSet {
    plan: TriggerPlan,
    direction: Direction,
    incumbent: f64,
}

impl TriggerSet {
    /// Builds a trigger set for the given objective sense.
    pub fn new(plan: TriggerPlan, direction: Direction) -> Self {
        let incumbent = direction.initial_best();
        Self {
            plan,
            direction,
            incumbent,
        }
    }

    /// Decides whether the measurement at `evaluations` with objective `y`
    /// should be recorded. Updates improvement state.
    pub fn should_log(&mut self, evaluations: u64, y: f64) -> bool {
        let mut fire = self.plan.always;
        if self.plan.on_interval > 0 && evaluations % self.plan.on_interval == 0 {
            fire = true;
        }
        if self.direction.improves(y, self.incumbent) {
            self.incumbent = y;
            if self.plan.on_improvement {
                fire = true;
            }
        }
        if !self.plan.at_time_points.is_empty() && self.matches_time_point(evaluations) {
            fire = true;
        }
        if self.plan.per_time_range > 0 && self.matches_time_range(evaluations) {
            fire = true;
        }
        fire
    }

    /// Re-arms run-scoped trigger state at a run boundary.
    pub fn reset(&mut self) {
        self.incumbent = self.direction.initial_best();
    }

    fn matches_time_point(&self, evaluations: u64) -> bool {
        let base = self.plan.time_points_exp_base.max(1);
        for &point in &self.plan.at_time_points {
            if point == 0 {
                continue;
            }
            let mut scaled = point;
            loop {
                if scaled == evaluations {
                    return true;
                }
                if base == 1 || scaled > evaluations {
                    break;
                }
                match scaled.checked_mul(base) {
                    Some(next) => scaled = next,
                    None => break,
                }
            }
        }
        false
    }

    fn matches_time_range(&self, evaluations: u64) -> bool {
        if evaluations == 0 {
            return false;
        }
        let base = self.plan.range_exp_base.max(2);
        let count = self.plan.per_time_range;
        // Largest power of base not exceeding the evaluation count, in
        // integer math; float logarithms misplace exact powers.
        let mut lo: u64 = 1;
        while let Some(next) = lo.checked_mul(base) {
            if next > evaluations {
                break;
            }
            lo = next;
        }
        let base = base as f64;
        let lo = lo as f64;
        (0..count).any(|i| (lo * base.powf(i as f64 / count as f64)).round() as u64 == evaluations)
    }
}
