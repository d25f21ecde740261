use obx_core::ObxError;
use obx_logger::AttributeCell;
use obx_problem::Problem;

/// An optimization algorithm driven by the experiment engine.
///
/// The engine never inspects an algorithm structurally; its whole surface is
/// one invoke operation, an explicit copy operation, and a finite map from
/// attribute names to shared cells. [`Algorithm::fork`] must return a fully
/// independent copy: mutations made while solving one task are never visible
/// to another task's copy.
pub trait Algorithm: Send + Sync {
    /// Name recorded in output headers when the plan does not override it.
    fn name(&self) -> &str {
        "algorithm"
    }

    /// Solves one problem, driving evaluation internally.
    fn run(&mut self, problem: &mut dyn Problem) -> Result<(), ObxError>;

    /// Creates a fresh, fully independent copy for one task.
    fn fork(&self) -> Box<dyn Algorithm>;

    /// Resolves a declared attribute name to its shared cell.
    ///
    /// Returning `None` means the algorithm does not expose the attribute;
    /// plans declaring it are rejected at experiment construction.
    fn attribute(&self, _name: &str) -> Option<AttributeCell> {
        None
    }
}
