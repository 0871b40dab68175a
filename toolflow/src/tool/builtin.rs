//! Built-in demo tool descriptors registered when no tool catalog is configured.
//!
//! Metadata only; executing these tools is the orchestration collaborator's job.

use super::{ParamType, ToolDescriptor, ToolParameter};

pub const TOOL_WEATHER: &str = "weather";
pub const TOOL_CALCULATOR: &str = "calculator";
pub const TOOL_WEB_SEARCH: &str = "web_search";

/// Descriptors for the weather, calculator and web_search demo tools.
pub fn demo_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            TOOL_WEATHER,
            "Provides current weather information for a specified city",
        )
        .with_tags(["weather", "data", "forecast"])
        .with_priority(5)
        .with_parameter(ToolParameter::required(
            "city",
            ParamType::String,
            "Name of the city to get weather information for",
        )),
        ToolDescriptor::new(
            TOOL_CALCULATOR,
            "Performs basic mathematical operations (+, -, *, /, ^, sqrt)",
        )
        .with_tags(["math", "calculation"])
        .with_priority(5)
        .with_parameter(ToolParameter::required(
            "expression",
            ParamType::String,
            "Mathematical expression to evaluate (e.g., '2 + 3 * 4')",
        )),
        ToolDescriptor::new(TOOL_WEB_SEARCH, "Searches the web for information")
            .with_tags(["search", "web"])
            .with_priority(3)
            .with_parameter(ToolParameter::required("query", ParamType::String, "Search query"))
            .with_parameter(ToolParameter::optional(
                "max_results",
                ParamType::Integer,
                "Maximum number of results to return (default: 5)",
            )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolRegistry;

    /// **Scenario**: demo tools have unique names and register cleanly.
    #[test]
    fn demo_tools_register_without_duplicates() {
        let registry = ToolRegistry::with_tools(demo_tools()).expect("unique names");
        assert_eq!(
            registry.names(),
            vec![TOOL_WEATHER, TOOL_CALCULATOR, TOOL_WEB_SEARCH]
        );
    }
}
