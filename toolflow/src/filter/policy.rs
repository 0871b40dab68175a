//! Filter policies: pure functions narrowing a tool sequence.
//!
//! Policies only remove or reorder tools, never introduce one. `Composite` applies its
//! members in list order and that order is part of its meaning: `PriorityTop(5)` then a
//! tag match is not the same policy as the reverse.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use super::PolicyError;
use crate::logging;
use crate::tool::ToolDescriptor;

/// How a tag match compares the policy's tags with a tool's tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MatchMode {
    /// At least one policy tag is on the tool.
    #[default]
    Any,
    /// Every policy tag is on the tool.
    All,
}

impl FromStr for MatchMode {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "all" => Ok(Self::All),
            _ => Err(PolicyError::InvalidPolicy(format!(
                "unknown match mode: {} (use any or all)",
                s
            ))),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Any => f.write_str("any"),
            MatchMode::All => f.write_str("all"),
        }
    }
}

/// A composable rule mapping a tool sequence to a (possibly smaller) tool sequence.
///
/// Build through the validating constructors ([`FilterPolicy::threshold`],
/// [`FilterPolicy::priority_top`], [`FilterPolicy::tag_match`]) so misconfiguration fails
/// at startup, not mid-request. Stateless; share freely across requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterPolicy {
    /// First `n` tools, input order preserved.
    Threshold(NonZeroUsize),
    /// Tools whose tags match `tags` under `mode`. An empty tag set matches every tool.
    TagMatch {
        tags: BTreeSet<String>,
        mode: MatchMode,
    },
    /// Tools carrying none of `tags`. An empty tag set removes nothing.
    TagExclude { tags: BTreeSet<String> },
    /// Top `n` tools by priority descending; ties keep input order.
    PriorityTop(NonZeroUsize),
    /// Members applied in order, each one's output feeding the next.
    Composite(Vec<FilterPolicy>),
}

fn positive_count(kind: &str, n: i64) -> Result<NonZeroUsize, PolicyError> {
    usize::try_from(n)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            PolicyError::InvalidPolicy(format!("{} max_count must be positive, got {}", kind, n))
        })
}

impl FilterPolicy {
    /// Threshold policy keeping at most `n` tools.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidPolicy` when `n <= 0`.
    pub fn threshold(n: i64) -> Result<Self, PolicyError> {
        positive_count("threshold", n).map(Self::Threshold)
    }

    /// Priority policy keeping the `n` highest-priority tools.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidPolicy` when `n <= 0`.
    pub fn priority_top(n: i64) -> Result<Self, PolicyError> {
        positive_count("priority_top", n).map(Self::PriorityTop)
    }

    /// Tag match with a mode given as text (`any` / `all`).
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidPolicy` for an unknown mode.
    pub fn tag_match<I, S>(tags: I, mode: &str) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::TagMatch {
            tags: tags.into_iter().map(Into::into).collect(),
            mode: mode.parse()?,
        })
    }

    /// Tag match that keeps tools carrying any of `tags`.
    pub fn tag_any<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::TagMatch {
            tags: tags.into_iter().map(Into::into).collect(),
            mode: MatchMode::Any,
        }
    }

    pub fn tag_exclude<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::TagExclude {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn composite(policies: Vec<FilterPolicy>) -> Self {
        Self::Composite(policies)
    }

    /// Applies the policy to `tools`, returning the kept tools.
    pub fn apply(&self, tools: &[ToolDescriptor]) -> Vec<ToolDescriptor> {
        let out = match self {
            FilterPolicy::Threshold(n) => tools.iter().take(n.get()).cloned().collect(),
            FilterPolicy::TagMatch { tags, mode } => {
                if tags.is_empty() {
                    tools.to_vec()
                } else {
                    tools
                        .iter()
                        .filter(|t| match mode {
                            MatchMode::Any => tags.iter().any(|tag| t.has_tag(tag)),
                            MatchMode::All => tags.iter().all(|tag| t.has_tag(tag)),
                        })
                        .cloned()
                        .collect()
                }
            }
            FilterPolicy::TagExclude { tags } => tools
                .iter()
                .filter(|t| !tags.iter().any(|tag| t.has_tag(tag)))
                .cloned()
                .collect(),
            FilterPolicy::PriorityTop(n) => {
                let mut sorted: Vec<&ToolDescriptor> = tools.iter().collect();
                // sort_by is stable: equal priorities keep input order.
                sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
                sorted.into_iter().take(n.get()).cloned().collect()
            }
            FilterPolicy::Composite(policies) => {
                let mut current = tools.to_vec();
                for p in policies {
                    current = p.apply(&current);
                }
                current
            }
        };
        logging::log_policy_applied(&self.to_string(), tools.len(), out.len());
        out
    }
}

impl fmt::Display for FilterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterPolicy::Threshold(n) => write!(f, "threshold({})", n),
            FilterPolicy::TagMatch { tags, mode } => {
                let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
                write!(f, "tag_match[{}]({})", mode, tags.join(","))
            }
            FilterPolicy::TagExclude { tags } => {
                let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
                write!(f, "tag_exclude({})", tags.join(","))
            }
            FilterPolicy::PriorityTop(n) => write!(f, "priority_top({})", n),
            FilterPolicy::Composite(policies) => {
                let parts: Vec<String> = policies.iter().map(ToString::to_string).collect();
                write!(f, "composite[{}]", parts.join(" -> "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str, priority: i64, tags: &[&str]) -> ToolDescriptor {
        ToolDescriptor::new(name, "")
            .with_priority(priority)
            .with_tags(tags.iter().copied())
    }

    fn names(tools: &[ToolDescriptor]) -> Vec<&str> {
        tools.iter().map(|t| t.name.as_str()).collect()
    }

    fn sample() -> Vec<ToolDescriptor> {
        vec![
            tool("a", 1, &["x"]),
            tool("b", 5, &["y"]),
            tool("c", 5, &["x", "y"]),
            tool("d", 3, &[]),
        ]
    }

    /// **Scenario**: Threshold(n) equals tools[:n] with length min(n, len).
    #[test]
    fn threshold_takes_prefix() {
        let tools = sample();
        for n in 1..=6 {
            let out = FilterPolicy::threshold(n).unwrap().apply(&tools);
            let k = (n as usize).min(tools.len());
            assert_eq!(out.len(), k);
            assert_eq!(out, tools[..k].to_vec());
        }
    }

    /// **Scenario**: Threshold rejects zero and negative counts at construction.
    #[test]
    fn threshold_rejects_non_positive() {
        assert!(matches!(
            FilterPolicy::threshold(0),
            Err(PolicyError::InvalidPolicy(_))
        ));
        assert!(matches!(
            FilterPolicy::threshold(-3),
            Err(PolicyError::InvalidPolicy(_))
        ));
        assert!(matches!(
            FilterPolicy::priority_top(0),
            Err(PolicyError::InvalidPolicy(_))
        ));
    }

    /// **Scenario**: an empty tag set matches everything (permissive default, pinned).
    #[test]
    fn tag_match_empty_tags_is_identity() {
        let tools = sample();
        let any = FilterPolicy::tag_match(Vec::<String>::new(), "any").unwrap();
        let all = FilterPolicy::tag_match(Vec::<String>::new(), "all").unwrap();
        assert_eq!(any.apply(&tools), tools);
        assert_eq!(all.apply(&tools), tools);
    }

    /// **Scenario**: any keeps tools with at least one tag; all requires every tag.
    #[test]
    fn tag_match_any_and_all() {
        let tools = sample();
        let any = FilterPolicy::tag_match(["x", "y"], "any").unwrap();
        assert_eq!(names(&any.apply(&tools)), vec!["a", "b", "c"]);
        let all = FilterPolicy::tag_match(["x", "y"], "ALL").unwrap();
        assert_eq!(names(&all.apply(&tools)), vec!["c"]);
    }

    /// **Scenario**: unknown match mode fails at construction.
    #[test]
    fn tag_match_unknown_mode_is_invalid() {
        let err = FilterPolicy::tag_match(["x"], "some").unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPolicy(ref m) if m.contains("some")));
    }

    /// **Scenario**: TagExclude drops tools carrying any excluded tag.
    #[test]
    fn tag_exclude_drops_tagged_tools() {
        let tools = sample();
        let out = FilterPolicy::tag_exclude(["y"]).apply(&tools);
        assert_eq!(names(&out), vec!["a", "d"]);
        assert_eq!(FilterPolicy::tag_exclude(Vec::<String>::new()).apply(&tools), tools);
    }

    /// **Scenario**: PriorityTop sorts descending, keeps input order on ties, truncates.
    #[test]
    fn priority_top_is_stable_descending() {
        let tools = sample();
        let out = FilterPolicy::priority_top(3).unwrap().apply(&tools);
        assert_eq!(names(&out), vec!["b", "c", "d"]);
        let all = FilterPolicy::priority_top(10).unwrap().apply(&tools);
        assert_eq!(names(&all), vec!["b", "c", "d", "a"]);
    }

    /// **Scenario**: Composite([A, B]) == B.apply(A.apply(tools)), and order matters.
    #[test]
    fn composite_pipes_in_order() {
        let tools = sample();
        let a = FilterPolicy::priority_top(1).unwrap();
        let b = FilterPolicy::tag_any(["x"]);
        let ab = FilterPolicy::composite(vec![a.clone(), b.clone()]);
        let ba = FilterPolicy::composite(vec![b.clone(), a.clone()]);

        assert_eq!(ab.apply(&tools), b.apply(&a.apply(&tools)));
        assert_eq!(ba.apply(&tools), a.apply(&b.apply(&tools)));
        assert!(ab.apply(&tools).is_empty());
        assert_eq!(names(&ba.apply(&tools)), vec!["c"]);
    }

    /// **Scenario**: no policy introduces a tool absent from its input.
    #[test]
    fn policies_never_introduce_tools() {
        let tools = sample();
        let policies = vec![
            FilterPolicy::threshold(2).unwrap(),
            FilterPolicy::tag_any(["y"]),
            FilterPolicy::tag_exclude(["x"]),
            FilterPolicy::priority_top(2).unwrap(),
            FilterPolicy::composite(vec![]),
        ];
        for p in &policies {
            for t in p.apply(&tools) {
                assert!(tools.contains(&t), "{} introduced {}", p, t.name);
            }
        }
    }

    #[test]
    fn display_labels() {
        let p = FilterPolicy::composite(vec![
            FilterPolicy::tag_any(["x"]),
            FilterPolicy::threshold(5).unwrap(),
        ]);
        assert_eq!(p.to_string(), "composite[tag_match[any](x) -> threshold(5)]");
    }
}
