//! Tool registry errors.

use thiserror::Error;

/// Error returned by [`ToolRegistry`](super::ToolRegistry) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A descriptor with the same name is already registered.
    #[error("tool already registered: {0}")]
    DuplicateName(String),

    /// No descriptor is registered under the name.
    #[error("tool not found: {0}")]
    NotFound(String),
}
