//! Filter policy errors.

use thiserror::Error;

/// Error building or resolving a filter policy.
///
/// Both variants are raised before any session is opened: policies are validated at
/// construction, names at resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Malformed policy configuration (non-positive count, unknown match mode, malformed entry).
    #[error("invalid filter policy: {0}")]
    InvalidPolicy(String),

    /// No policy is registered in the catalog under the name.
    #[error("unknown filter policy: {0}")]
    UnknownPolicy(String),
}
