//! Tool descriptors and the in-memory tool registry.
//!
//! A [`ToolDescriptor`] is metadata only: the tool's business logic lives in the
//! orchestration collaborator. [`ToolRegistry`] owns descriptors for its lifetime and
//! is shared across requests by `Arc`.

mod builtin;
mod descriptor;
mod error;
mod registry;

pub use builtin::{demo_tools, TOOL_CALCULATOR, TOOL_WEATHER, TOOL_WEB_SEARCH};
pub use descriptor::{ParamType, ToolDescriptor, ToolParameter};
pub use error::RegistryError;
pub use registry::ToolRegistry;
