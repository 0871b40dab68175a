//! Tool filter policies, the policy catalog and the filtered registry.
//!
//! - [`FilterPolicy`]: Threshold, TagMatch, TagExclude, PriorityTop, Composite.
//! - [`PolicyCatalog`]: named policies, built at startup and shared.
//! - [`FilteredRegistry`]: registry + catalog → tool set for one request.
//! - [`ProtocolFilter`]: which transports are exposed.

mod catalog;
mod error;
mod filtered_registry;
mod policy;
mod protocol_filter;
mod spec;

pub use catalog::{PolicyCatalog, POLICY_PRIORITY, POLICY_THRESHOLD_10, POLICY_THRESHOLD_5};
pub use error::PolicyError;
pub use filtered_registry::{FilteredRegistry, PolicyRef};
pub use policy::{FilterPolicy, MatchMode};
pub use protocol_filter::ProtocolFilter;
pub use spec::{NamedPolicySpec, PolicySpec};
