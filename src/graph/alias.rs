//! Path alias resolution.
//!
//! A small lookup table loaded once per project from the project's path
//! mapping config (tsconfig/jsconfig `paths`). Ordering matters: the first
//! matching prefix wins, and the loader is responsible for putting longer,
//! more specific prefixes first.

use serde::{Deserialize, Serialize};

/// One `prefix -> base` mapping, both with any trailing `*` stripped,
/// e.g. `"@/" -> "src/"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    pub prefix: String,
    pub base: String,
}

/// Ordered alias rules; first prefix match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTable {
    rules: Vec<AliasRule>,
}

impl AliasTable {
    pub fn new(rules: Vec<AliasRule>) -> Self {
        Self { rules }
    }

    /// Build from `pattern -> base` pairs as written in config
    /// (`"@/*" -> "src/*"`). Trailing `*` markers are stripped; order is
    /// preserved.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let rules = pairs
            .into_iter()
            .map(|(pattern, base)| AliasRule {
                prefix: pattern.as_ref().trim_end_matches('*').to_string(),
                base: base.as_ref().trim_end_matches('*').to_string(),
            })
            .collect();
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite `specifier` through the first matching rule, or `None` when
    /// no prefix matches. The rewritten value is project-root-relative.
    pub fn resolve(&self, specifier: &str) -> Option<String> {
        for rule in &self.rules {
            if let Some(rest) = specifier.strip_prefix(rule.prefix.as_str()) {
                return Some(format!("{}{}", rule.base, rest));
            }
        }
        None
    }
}
