//! Filtered registry: the tool set visible to one request.
//!
//! Combines the [`ToolRegistry`] with a [`PolicyCatalog`]. This is the single point the
//! orchestration collaborator calls before binding tools; it has no side effects and can
//! be called repeatedly with different policies (e.g. to preview a set without running).

use std::sync::Arc;

use super::{FilterPolicy, PolicyCatalog, PolicyError};
use crate::tool::{ToolDescriptor, ToolRegistry};

/// Policy named in the catalog, or one already constructed by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyRef {
    Named(String),
    Policy(FilterPolicy),
}

impl From<&str> for PolicyRef {
    fn from(name: &str) -> Self {
        PolicyRef::Named(name.to_string())
    }
}

impl From<FilterPolicy> for PolicyRef {
    fn from(policy: FilterPolicy) -> Self {
        PolicyRef::Policy(policy)
    }
}

/// Registry + catalog, with an optional default policy for requests that name none.
#[derive(Clone, Debug)]
pub struct FilteredRegistry {
    registry: Arc<ToolRegistry>,
    catalog: Arc<PolicyCatalog>,
    default_policy: Option<String>,
}

impl FilteredRegistry {
    /// Creates a filtered registry with no default policy.
    pub fn new(registry: Arc<ToolRegistry>, catalog: Arc<PolicyCatalog>) -> Self {
        Self {
            registry,
            catalog,
            default_policy: None,
        }
    }

    /// Sets the policy applied when a request names none.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::UnknownPolicy` if `name` is not in the catalog, so a bad
    /// default surfaces at startup.
    pub fn with_default_policy(mut self, name: impl Into<String>) -> Result<Self, PolicyError> {
        let name = name.into();
        self.catalog.get(&name)?;
        self.default_policy = Some(name);
        Ok(self)
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn catalog(&self) -> &Arc<PolicyCatalog> {
        &self.catalog
    }

    pub fn default_policy(&self) -> Option<&str> {
        self.default_policy.as_deref()
    }

    /// Applies `policy` to the full `registry.list()`.
    pub fn resolve(&self, policy: &PolicyRef) -> Result<Vec<ToolDescriptor>, PolicyError> {
        let tools = self.registry.list();
        match policy {
            PolicyRef::Named(name) => Ok(self.catalog.get(name)?.apply(&tools)),
            PolicyRef::Policy(p) => Ok(p.apply(&tools)),
        }
    }

    /// Effective policy for a request: the `tool_tags` shorthand as an any-match tag filter
    /// first, then the named strategy, or the default policy when none is named.
    pub fn request_policy(
        &self,
        filter_strategy: Option<&str>,
        tool_tags: &[String],
    ) -> Result<FilterPolicy, PolicyError> {
        let mut stages = Vec::new();
        if !tool_tags.is_empty() {
            stages.push(FilterPolicy::tag_any(tool_tags.iter().cloned()));
        }
        if let Some(name) = filter_strategy.or(self.default_policy.as_deref()) {
            stages.push((*self.catalog.get(name)?).clone());
        }
        Ok(FilterPolicy::Composite(stages))
    }

    /// Tool set for a request (see [`request_policy`](Self::request_policy)).
    pub fn resolve_request(
        &self,
        filter_strategy: Option<&str>,
        tool_tags: &[String],
    ) -> Result<Vec<ToolDescriptor>, PolicyError> {
        let policy = self.request_policy(filter_strategy, tool_tags)?;
        self.resolve(&PolicyRef::Policy(policy))
    }
}
