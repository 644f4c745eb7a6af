//! Resource pattern matching for the default policy evaluator.
//!
//! Patterns support glob wildcards: `*` matches any run of characters
//! (including none), `?` exactly one. Anything else matches literally,
//! case-sensitive.

use std::collections::HashMap;

use warden_contracts::policy::PolicyResource;
use warden_contracts::request::AccessResource;

/// Match `value` against a glob `pattern`.
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let value: Vec<char> = value.chars().collect();

    let mut p = 0;
    let mut v = 0;
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while v < value.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == value[v]) {
            p += 1;
            v += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            // Tentatively match `*` against nothing; remember where to
            // widen it if the rest of the pattern fails.
            star = Some(p);
            mark = v;
            p += 1;
        } else if let Some(star_pos) = star {
            p = star_pos + 1;
            mark += 1;
            v = mark;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }

    p == pattern.len()
}

/// The compiled resource-match side of one policy.
#[derive(Debug, Clone)]
pub struct ResourceMatcher {
    resources: HashMap<String, PolicyResource>,
}

impl ResourceMatcher {
    pub fn new(resources: HashMap<String, PolicyResource>) -> Self {
        Self { resources }
    }

    /// True when every dimension the policy specifies accepts the request
    /// resource's value for that dimension.
    ///
    /// A dimension the policy does not mention matches anything; a
    /// dimension the request does not carry matches only a `*` pattern.
    pub fn matches(&self, resource: &AccessResource) -> bool {
        self.resources.iter().all(|(dimension, patterns)| {
            let value = resource.value(dimension).unwrap_or("");
            patterns
                .values
                .iter()
                .any(|pattern| wildcard_match(pattern, value))
        })
    }

    /// True iff the policy covers exactly `resource` and nothing broader:
    /// identical dimension sets, and every dimension holds a single
    /// wildcard-free value equal to the request's.
    pub fn is_exact_match(&self, resource: &AccessResource) -> bool {
        if self.resources.len() != resource.as_map().len() {
            return false;
        }

        self.resources.iter().all(|(dimension, patterns)| {
            let Some(value) = resource.value(dimension) else {
                return false;
            };
            match patterns.values.as_slice() {
                [single] => single == value && !single.contains(['*', '?']),
                _ => false,
            }
        })
    }

    /// Match against another policy's resource specification: every
    /// dimension this policy specifies must be present in `resources` with
    /// all of its values accepted by this policy's patterns.
    pub fn matches_policy_resources(&self, resources: &HashMap<String, PolicyResource>) -> bool {
        self.resources.iter().all(|(dimension, patterns)| {
            let Some(given) = resources.get(dimension) else {
                return false;
            };
            given.values.iter().all(|value| {
                patterns
                    .values
                    .iter()
                    .any(|pattern| wildcard_match(pattern, value))
            })
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
