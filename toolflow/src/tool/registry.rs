//! In-memory tool registry: name → descriptor, kept in registration order.
//!
//! Constructed once at startup and shared by `Arc`. A single `RwLock` guards the map for
//! the duration of a mutation only; readers get cloned snapshots so no lock is held while
//! a request is processed.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{RegistryError, ToolDescriptor};
use crate::logging;

/// Registry of tool descriptors with unique names.
///
/// `list()` returns descriptors in registration order; unregistering and registering again
/// moves a tool to the end.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: RwLock<Vec<ToolDescriptor>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-filled with `tools`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateName` if two descriptors share a name.
    pub fn with_tools(tools: impl IntoIterator<Item = ToolDescriptor>) -> Result<Self, RegistryError> {
        let registry = Self::new();
        registry.register_all(tools)?;
        Ok(registry)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<ToolDescriptor>> {
        // The vec is never left half-updated, so a poisoned lock still holds valid data.
        self.tools.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ToolDescriptor>> {
        self.tools.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `descriptor`; it is visible to subsequent `get` / `list` calls.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateName` if the name is taken; the registry is unchanged.
    pub fn register(&self, descriptor: ToolDescriptor) -> Result<(), RegistryError> {
        let mut tools = self.write();
        if tools.iter().any(|t| t.name == descriptor.name) {
            return Err(RegistryError::DuplicateName(descriptor.name));
        }
        logging::log_tool_registered(&descriptor.name);
        tools.push(descriptor);
        Ok(())
    }

    /// Registers each descriptor in order, stopping at the first duplicate.
    /// Descriptors registered before the failure stay registered.
    pub fn register_all(
        &self,
        descriptors: impl IntoIterator<Item = ToolDescriptor>,
    ) -> Result<(), RegistryError> {
        for d in descriptors {
            self.register(d)?;
        }
        Ok(())
    }

    /// Returns a copy of the descriptor registered under `name`.
    pub fn get(&self, name: &str) -> Result<ToolDescriptor, RegistryError> {
        self.read()
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Snapshot of all descriptors in registration order.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.read().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.read().iter().map(|t| t.name.clone()).collect()
    }

    /// Removes and returns the descriptor registered under `name`.
    pub fn unregister(&self, name: &str) -> Result<ToolDescriptor, RegistryError> {
        let mut tools = self.write();
        let idx = tools
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        logging::log_tool_unregistered(name);
        Ok(tools.remove(idx))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().iter().any(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, format!("{} tool", name))
    }

    /// **Scenario**: after register(d), get(d.name) == d and d is in list().
    #[test]
    fn register_then_get_and_list() {
        let registry = ToolRegistry::new();
        let d = tool("a").with_priority(3).with_tags(["x"]);
        registry.register(d.clone()).expect("register");
        assert_eq!(registry.get("a").expect("get"), d);
        assert!(registry.list().contains(&d));
        assert_eq!(registry.len(), 1);
    }

    /// **Scenario**: duplicate name fails and list() is unchanged.
    #[test]
    fn duplicate_register_fails_without_side_effects() {
        let registry = ToolRegistry::new();
        registry.register(tool("a")).expect("first");
        let before = registry.list();

        let err = registry
            .register(tool("a").with_priority(9))
            .expect_err("duplicate must fail");

        assert_eq!(err, RegistryError::DuplicateName("a".into()));
        assert_eq!(registry.list(), before);
    }

    /// **Scenario**: list() keeps registration order.
    #[test]
    fn list_preserves_registration_order() {
        let registry = ToolRegistry::new();
        for n in ["c", "a", "b"] {
            registry.register(tool(n)).unwrap();
        }
        assert_eq!(registry.names(), vec!["c", "a", "b"]);
    }

    /// **Scenario**: get and unregister of an unknown name fail with NotFound.
    #[test]
    fn unknown_name_is_not_found() {
        let registry = ToolRegistry::new();
        assert_eq!(
            registry.get("nope").unwrap_err(),
            RegistryError::NotFound("nope".into())
        );
        assert_eq!(
            registry.unregister("nope").unwrap_err(),
            RegistryError::NotFound("nope".into())
        );
    }

    /// **Scenario**: unregister removes the tool and frees the name for re-registration.
    #[test]
    fn unregister_frees_name() {
        let registry = ToolRegistry::with_tools([tool("a"), tool("b")]).unwrap();
        let removed = registry.unregister("a").expect("unregister");
        assert_eq!(removed.name, "a");
        assert!(!registry.contains("a"));
        registry.register(tool("a")).expect("re-register");
        assert_eq!(registry.names(), vec!["b", "a"]);
    }

    /// **Scenario**: register_all stops at the first duplicate and keeps earlier tools.
    #[test]
    fn register_all_stops_at_duplicate() {
        let registry = ToolRegistry::new();
        let err = registry
            .register_all([tool("a"), tool("b"), tool("a"), tool("c")])
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("a".into()));
        assert_eq!(registry.names(), vec!["a", "b"]);
    }
}
