//! Named policy catalog.
//!
//! Built once at startup with the default policies (`threshold_5`, `threshold_10`,
//! `priority`) plus any configured ones, then shared read-mostly. Registration takes the
//! write lock for the map insert only.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use super::{FilterPolicy, NamedPolicySpec, PolicyError, PolicySpec};

pub const POLICY_THRESHOLD_5: &str = "threshold_5";
pub const POLICY_THRESHOLD_10: &str = "threshold_10";
pub const POLICY_PRIORITY: &str = "priority";

/// Catalog of named filter policies.
#[derive(Debug)]
pub struct PolicyCatalog {
    policies: RwLock<HashMap<String, Arc<FilterPolicy>>>,
}

impl Default for PolicyCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

const fn count(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(n) => n,
        None => panic!("default policy count must be non-zero"),
    }
}

const FIVE: NonZeroUsize = count(5);
const TEN: NonZeroUsize = count(10);

fn default_policies() -> HashMap<String, Arc<FilterPolicy>> {
    let mut m = HashMap::new();
    m.insert(
        POLICY_THRESHOLD_5.to_string(),
        Arc::new(FilterPolicy::Threshold(FIVE)),
    );
    m.insert(
        POLICY_THRESHOLD_10.to_string(),
        Arc::new(FilterPolicy::Threshold(TEN)),
    );
    m.insert(
        POLICY_PRIORITY.to_string(),
        Arc::new(FilterPolicy::PriorityTop(FIVE)),
    );
    m
}

impl PolicyCatalog {
    /// Catalog holding only the default policies.
    pub fn with_defaults() -> Self {
        Self {
            policies: RwLock::new(default_policies()),
        }
    }

    /// Catalog with no policies at all.
    pub fn empty() -> Self {
        Self {
            policies: RwLock::new(HashMap::new()),
        }
    }

    /// Registers (or replaces) the policy under `name`.
    pub fn register(&self, name: impl Into<String>, policy: FilterPolicy) {
        let name = name.into();
        self.policies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(policy));
    }

    /// Looks up a policy by name.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::UnknownPolicy` if nothing is registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<FilterPolicy>, PolicyError> {
        self.policies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| PolicyError::UnknownPolicy(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .policies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Builds a composite of the named policies, in the given order, optionally
    /// registering it as `register_as`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::UnknownPolicy` for the first name not in the catalog; nothing
    /// is registered in that case.
    pub fn compose(
        &self,
        names: &[&str],
        register_as: Option<&str>,
    ) -> Result<FilterPolicy, PolicyError> {
        let members = names
            .iter()
            .map(|n| self.get(n).map(|p| (*p).clone()))
            .collect::<Result<Vec<_>, _>>()?;
        let composite = FilterPolicy::Composite(members);
        if let Some(name) = register_as {
            self.register(name, composite.clone());
        }
        Ok(composite)
    }

    /// Builds a validated policy from its serializable form. `named` references are
    /// resolved against this catalog and inlined.
    pub fn build(&self, spec: &PolicySpec) -> Result<FilterPolicy, PolicyError> {
        match spec {
            PolicySpec::Threshold { max_count } => FilterPolicy::threshold(*max_count),
            PolicySpec::PriorityTop { max_count } => FilterPolicy::priority_top(*max_count),
            PolicySpec::TagMatch { tags, mode } => FilterPolicy::tag_match(tags.clone(), mode),
            PolicySpec::TagExclude { tags } => Ok(FilterPolicy::tag_exclude(tags.clone())),
            PolicySpec::Composite { policies } => policies
                .iter()
                .map(|p| self.build(p))
                .collect::<Result<Vec<_>, _>>()
                .map(FilterPolicy::Composite),
            PolicySpec::Named { name } => self.get(name).map(|p| (*p).clone()),
        }
    }

    /// Builds and registers each entry in order; later entries may reference earlier ones.
    /// Stops at the first invalid entry.
    pub fn register_specs(&self, entries: &[NamedPolicySpec]) -> Result<(), PolicyError> {
        for entry in entries {
            let policy = self.build(&entry.policy)?;
            self.register(entry.name.clone(), policy);
        }
        Ok(())
    }

    /// Reads a JSON array of `{ "name": .., "policy": {..} }` entries from `path` and
    /// registers them.
    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<(), PolicyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PolicyError::InvalidPolicy(format!("read {}: {}", path.display(), e))
        })?;
        let entries: Vec<NamedPolicySpec> = serde_json::from_str(&text).map_err(|e| {
            PolicyError::InvalidPolicy(format!("parse {}: {}", path.display(), e))
        })?;
        self.register_specs(&entries)
    }

    /// Drops every registered policy and restores the defaults.
    pub fn reset(&self) {
        *self.policies.write().unwrap_or_else(PoisonError::into_inner) = default_policies();
    }
}
