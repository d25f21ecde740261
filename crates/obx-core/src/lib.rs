#![deny(missing_docs)]
#![doc = "Core types, errors and canonical serialization for the OBX experiment engine."]

pub mod errors;
pub mod hash;
pub mod provenance;
pub mod serde;
mod types;

pub use errors::{ErrorInfo, ObxError};
pub use hash::stable_hash_string;
pub use provenance::RunProvenance;
pub use types::{Direction, ProblemMeta, SuiteKind};
