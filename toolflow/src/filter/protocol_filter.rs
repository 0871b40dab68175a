//! Protocol filter strategies: which transports a deployment exposes.

use std::collections::{BTreeSet, HashMap};

use crate::protocol::ProtocolKind;

use super::PolicyError;

/// Predicate over protocol kinds.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ProtocolFilter {
    #[default]
    AllowAll,
    DenyAll,
    /// Only the listed protocols.
    Allow(BTreeSet<ProtocolKind>),
    /// Every protocol except the listed ones.
    Block(BTreeSet<ProtocolKind>),
    /// Allowed only if every member allows it.
    All(Vec<ProtocolFilter>),
}

impl ProtocolFilter {
    pub fn allows(&self, kind: ProtocolKind) -> bool {
        match self {
            ProtocolFilter::AllowAll => true,
            ProtocolFilter::DenyAll => false,
            ProtocolFilter::Allow(set) => set.contains(&kind),
            ProtocolFilter::Block(set) => !set.contains(&kind),
            ProtocolFilter::All(filters) => filters.iter().all(|f| f.allows(kind)),
        }
    }

    /// Named strategies: `allow_all`, `deny_all`, `http_only`, `sse_only`, `websocket_only`.
    pub fn defaults() -> HashMap<&'static str, ProtocolFilter> {
        let only = |k| ProtocolFilter::Allow(BTreeSet::from([k]));
        HashMap::from([
            ("allow_all", ProtocolFilter::AllowAll),
            ("deny_all", ProtocolFilter::DenyAll),
            ("http_only", only(ProtocolKind::Http)),
            ("sse_only", only(ProtocolKind::Sse)),
            ("websocket_only", only(ProtocolKind::WebSocket)),
        ])
    }

    /// Looks up one of the [`defaults`](Self::defaults) by name.
    pub fn named(name: &str) -> Result<ProtocolFilter, PolicyError> {
        Self::defaults()
            .remove(name)
            .ok_or_else(|| PolicyError::UnknownPolicy(name.to_string()))
    }

    /// Names of the built-in strategies, sorted.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Self::defaults().into_keys().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_and_block() {
        let allow = ProtocolFilter::Allow(BTreeSet::from([ProtocolKind::Sse]));
        assert!(allow.allows(ProtocolKind::Sse));
        assert!(!allow.allows(ProtocolKind::Http));

        let block = ProtocolFilter::Block(BTreeSet::from([ProtocolKind::WebSocket]));
        assert!(block.allows(ProtocolKind::Http));
        assert!(!block.allows(ProtocolKind::WebSocket));
    }

    /// **Scenario**: All requires every member to allow.
    #[test]
    fn all_requires_every_member() {
        let f = ProtocolFilter::All(vec![
            ProtocolFilter::Block(BTreeSet::from([ProtocolKind::Http])),
            ProtocolFilter::Allow(BTreeSet::from([ProtocolKind::Http, ProtocolKind::Sse])),
        ]);
        assert!(f.allows(ProtocolKind::Sse));
        assert!(!f.allows(ProtocolKind::Http));
        assert!(!f.allows(ProtocolKind::WebSocket));
    }

    #[test]
    fn named_defaults() {
        assert!(ProtocolFilter::named("http_only")
            .unwrap()
            .allows(ProtocolKind::Http));
        assert!(!ProtocolFilter::named("deny_all")
            .unwrap()
            .allows(ProtocolKind::Sse));
        assert_eq!(
            ProtocolFilter::named("nope").unwrap_err(),
            PolicyError::UnknownPolicy("nope".into())
        );
        assert_eq!(ProtocolFilter::names().len(), 5);
    }
}
