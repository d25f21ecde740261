//! Provenance descriptors attached to experiment reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provenance information attached to every experiment report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Canonical hash of the plan that produced the data.
    pub plan_hash: String,
    /// ISO-8601 timestamp recording when the report was generated.
    pub created_at: String,
    /// Version map for the crates involved in the run.
    pub tool_versions: BTreeMap<String, String>,
}
