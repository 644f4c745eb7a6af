//! Policy model, service definition, and engine options.
//!
//! These types form the `ServicePolicies` snapshot a policy fetcher hands to
//! the engine. They are plain serde data: the engine never mutates them
//! after construction, and evaluator implementations decide what the
//! patterns mean.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_audit_cache_size() -> usize {
    1024
}

/// The match patterns a policy declares for one resource dimension.
///
/// Pattern syntax is owned by the evaluator; the default evaluator supports
/// glob wildcards (`*` matches any run of characters, `?` exactly one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResource {
    pub values: Vec<String>,
}

impl PolicyResource {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// One grant (or denial) inside a policy: who it applies to and which
/// access types it covers.
///
/// A user matches when named in `users` or when any of their groups is in
/// `groups`; the group name `"public"` matches every user. `"*"` in
/// `accesses` matches any access type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyItem {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub accesses: Vec<String>,
}

/// A single authorization policy.
///
/// `resources` keys the policy to what it covers; `allow_items` and
/// `deny_items` say who may (or may not) do what. Within one policy a
/// matching deny item always wins over a matching allow item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Stable identifier, surfaced in results and audit records.
    pub id: i64,
    pub name: String,
    /// Disabled policies are skipped at repository construction.
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    /// Whether a decision caused by this policy must be audited.
    #[serde(default = "default_true")]
    pub is_audit_enabled: bool,
    /// Evaluation-order band: higher priorities are consulted first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub resources: HashMap<String, PolicyResource>,
    #[serde(default)]
    pub allow_items: Vec<PolicyItem>,
    #[serde(default)]
    pub deny_items: Vec<PolicyItem>,
}

impl Policy {
    /// True when the policy carries any deny item.
    ///
    /// Repositories order deny-carrying policies ahead of allow-only ones
    /// within a priority band.
    pub fn has_deny(&self) -> bool {
        !self.deny_items.is_empty()
    }
}

/// What a service component looks like to the engine: its name, the
/// resource dimensions its policies may key on, and the access types its
/// policies may grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDef {
    pub name: String,
    #[serde(default)]
    pub resource_dimensions: Vec<String>,
    #[serde(default)]
    pub access_types: Vec<String>,
}

/// The tag-policy half of a snapshot: policies keyed on tag names rather
/// than resource descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPolicies {
    pub service_name: String,
    /// Required whenever `policies` is non-empty.
    pub service_def: Option<ServiceDef>,
    #[serde(default)]
    pub policies: Vec<Policy>,
}

/// A complete policy snapshot for one service, as built by a policy
/// fetcher. The engine is constructed from exactly one snapshot and never
/// sees updates; hosts swap whole engines instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePolicies {
    pub service_name: String,
    pub service_def: ServiceDef,
    #[serde(default)]
    pub policy_version: i64,
    #[serde(default)]
    pub policies: Vec<Policy>,
    pub tag_policies: Option<TagPolicies>,
}

/// Engine construction options.
///
/// Unknown keys in a serialized options document are ignored, so hosts can
/// carry one options blob across engine versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEngineOptions {
    /// Skip building the tag repository even when the snapshot carries tag
    /// policies.
    #[serde(default)]
    pub disable_tag_policy_evaluation: bool,
    /// Bound on the per-repository audit cache. `0` disables the cache;
    /// decisions are unaffected either way.
    #[serde(default = "default_audit_cache_size")]
    pub audit_cache_size: usize,
}

impl Default for PolicyEngineOptions {
    fn default() -> Self {
        Self {
            disable_tag_policy_evaluation: false,
            audit_cache_size: default_audit_cache_size(),
        }
    }
}
