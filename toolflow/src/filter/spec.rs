//! Serializable policy configuration, as read from a catalog file or request body.
//!
//! A [`PolicySpec`] is turned into a [`FilterPolicy`](super::FilterPolicy) by
//! [`PolicyCatalog::build`](super::PolicyCatalog::build), which validates counts and modes
//! and resolves `named` references.

use serde::{Deserialize, Serialize};

fn default_mode() -> String {
    "any".to_string()
}

/// Policy description in JSON form, tagged by `type`.
///
/// ```json
/// { "type": "composite", "policies": [
///     { "type": "tag_match", "tags": ["math"], "mode": "any" },
///     { "type": "named", "name": "threshold_5" }
/// ] }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicySpec {
    Threshold {
        max_count: i64,
    },
    TagMatch {
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default = "default_mode")]
        mode: String,
    },
    TagExclude {
        #[serde(default)]
        tags: Vec<String>,
    },
    PriorityTop {
        max_count: i64,
    },
    Composite {
        policies: Vec<PolicySpec>,
    },
    /// Reference to a policy already in the catalog.
    Named {
        name: String,
    },
}

/// One entry of a policy catalog file: a name and the policy it stands for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPolicySpec {
    pub name: String,
    pub policy: PolicySpec,
}
