use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use serde::{Deserialize, Serialize};

use obx_core::serde::{from_yaml_slice, to_yaml_string};
use obx_core::{stable_hash_string, ErrorInfo, ObxError, SuiteKind};
use obx_logger::TriggerPlan;

/// Worker-pool sizing for the dispatch phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Workers {
    /// Use all available hardware parallelism.
    Auto,
    /// Use exactly this many workers; 1 means sequential execution.
    Fixed(usize),
}

impl Default for Workers {
    fn default() -> Self {
        Workers::Fixed(1)
    }
}

impl Workers {
    /// Resolves the sentinel to a concrete worker count.
    pub fn resolve(&self) -> usize {
        match self {
            Workers::Auto => thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            Workers::Fixed(count) => (*count).max(1),
        }
    }
}

/// Immutable description of one experiment: the benchmark grid, execution
/// options and output handling. Loadable from YAML; all optional fields have
/// serde defaults so partial plans parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentPlan {
    /// Function ids to evaluate.
    pub fids: Vec<u64>,
    /// Instance ids to evaluate.
    pub iids: Vec<u64>,
    /// Dimensions to evaluate.
    pub dims: Vec<u64>,
    /// Independent repetitions per grid point.
    #[serde(default = "ExperimentPlan::default_reps")]
    pub reps: u64,
    /// Suite the function ids belong to.
    #[serde(default)]
    pub suite: SuiteKind,
    /// Worker-pool sizing.
    #[serde(default)]
    pub workers: Workers,
    /// Whether runs are measured by a logger session.
    #[serde(default = "ExperimentPlan::default_true")]
    pub logged: bool,
    /// Root directory the output folder is created under.
    #[serde(default = "ExperimentPlan::default_output_directory")]
    pub output_directory: PathBuf,
    /// Name of the canonical output folder.
    #[serde(default = "ExperimentPlan::default_folder_name")]
    pub folder_name: String,
    /// Algorithm name recorded in output headers; defaults to the
    /// algorithm's own name.
    #[serde(default)]
    pub algorithm_name: Option<String>,
    /// Free-form algorithm description recorded in output headers.
    #[serde(default)]
    pub algorithm_info: String,
    /// Whether data rows include evaluated positions.
    #[serde(default)]
    pub store_positions: bool,
    /// Trigger configuration for the logger sessions.
    #[serde(default)]
    pub triggers: TriggerPlan,
    /// Static name/value pairs recorded once per experiment.
    #[serde(default)]
    pub experiment_attributes: BTreeMap<String, f64>,
    /// Algorithm attributes sampled once per run.
    #[serde(default)]
    pub run_attributes: Vec<String>,
    /// Algorithm attributes sampled at every recorded measurement.
    #[serde(default)]
    pub logged_attributes: Vec<String>,
    /// Fold sibling output shards into the canonical folder after the run.
    #[serde(default = "ExperimentPlan::default_true")]
    pub merge_output: bool,
    /// Produce a `.zip` archive of the canonical folder.
    #[serde(default = "ExperimentPlan::default_true")]
    pub zip_output: bool,
    /// Remove the canonical folder after archiving.
    #[serde(default)]
    pub remove_data: bool,
}

impl ExperimentPlan {
    const fn default_reps() -> u64 {
        1
    }

    const fn default_true() -> bool {
        true
    }

    fn default_output_directory() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_folder_name() -> String {
        "obx_data".to_string()
    }

    /// Creates a plan over the given grid with default options.
    pub fn new(fids: Vec<u64>, iids: Vec<u64>, dims: Vec<u64>) -> Self {
        Self {
            fids,
            iids,
            dims,
            reps: Self::default_reps(),
            suite: SuiteKind::default(),
            workers: Workers::default(),
            logged: true,
            output_directory: Self::default_output_directory(),
            folder_name: Self::default_folder_name(),
            algorithm_name: None,
            algorithm_info: String::new(),
            store_positions: false,
            triggers: TriggerPlan::default(),
            experiment_attributes: BTreeMap::new(),
            run_attributes: Vec::new(),
            logged_attributes: Vec::new(),
            merge_output: true,
            zip_output: true,
            remove_data: false,
        }
    }

    /// The canonical output folder all shards are folded into.
    pub fn canonical_root(&self) -> PathBuf {
        self.output_directory.join(&self.folder_name)
    }

    /// Stable hash of the plan, recorded in report provenance.
    pub fn plan_hash(&self) -> Result<String, ObxError> {
        stable_hash_string(self)
    }

    /// Checks structural plan invariants.
    pub fn validate(&self) -> Result<(), ObxError> {
        for (list, field) in [(&self.fids, "fids"), (&self.iids, "iids"), (&self.dims, "dims")] {
            if list.is_empty() {
                return Err(ObxError::Config(
                    ErrorInfo::new("grid_empty", "grid list must not be empty")
                        .with_context("field", field),
                ));
            }
        }
        if self.reps == 0 {
            return Err(ObxError::Config(ErrorInfo::new(
                "reps_zero",
                "at least one repetition is required",
            )));
        }
        if self.folder_name.is_empty() {
            return Err(ObxError::Config(ErrorInfo::new(
                "folder_name_empty",
                "output folder name must not be empty",
            )));
        }
        Ok(())
    }

    /// Loads a plan from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ObxError> {
        let bytes = fs::read(path).map_err(|err| ObxError::io("plan_read", path.display(), err))?;
        let plan: Self = from_yaml_slice(&bytes)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Saves the plan as YAML.
    pub fn save(&self, path: &Path) -> Result<(), ObxError> {
        let text = to_yaml_string(self)?;
        fs::write(path, text).map_err(|err| ObxError::io("plan_write", path.display(), err))
    }
}
