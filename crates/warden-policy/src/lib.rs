//! # warden-policy
//!
//! The default policy evaluator for the warden engine, plus TOML snapshot
//! loading.
//!
//! ## Overview
//!
//! [`DefaultPolicyEvaluator`] compiles one `Policy` into glob resource
//! matching and user/group/access item matching. Deny items win over allow
//! items within a policy; ordering across policies is the repository's
//! concern. [`loader`] turns a TOML document into a `ServicePolicies`
//! snapshot and wires an engine over the default evaluator.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use warden_policy::loader;
//!
//! let snapshot = loader::load_service_policies(Path::new("policies/datastore.toml"))?;
//! let engine = loader::build_policy_engine(&snapshot, &Default::default())?;
//! ```

pub mod evaluator;
pub mod loader;
pub mod matcher;

pub use evaluator::{DefaultEvaluatorFactory, DefaultPolicyEvaluator, GROUP_PUBLIC};
pub use loader::{build_policy_engine, load_service_policies, load_service_policies_str};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use warden_contracts::{
        error::WardenError,
        policy::PolicyEngineOptions,
        request::{AccessRequest, AccessResource, ContextValue, ResourceTag, CONTEXT_TAGS},
    };

    use crate::loader::{build_policy_engine, load_service_policies_str};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// A snapshot with resource policies for a datastore service and a tag
    /// policy denying everyone `select` on PII-tagged resources.
    const SNAPSHOT: &str = r#"
        service_name = "datastore"
        policy_version = 12

        [service_def]
        name = "datastore"
        resource_dimensions = ["database", "table"]
        access_types = ["select", "update"]

        [[policies]]
        id = 1
        name = "sales-read"
        [policies.resources.database]
        values = ["sales"]
        [policies.resources.table]
        values = ["*"]
        [[policies.allow_items]]
        users = ["alice"]
        groups = ["analysts"]
        accesses = ["select"]

        [[policies]]
        id = 2
        name = "temp-tables"
        [policies.resources.database]
        values = ["sales"]
        [policies.resources.table]
        values = ["tmp_*"]
        [[policies.deny_items]]
        groups = ["public"]
        accesses = ["*"]

        [tag_policies]
        service_name = "tagging"

        [tag_policies.service_def]
        name = "tagging"
        resource_dimensions = ["tag"]
        access_types = ["datastore:select", "datastore:update"]

        [[tag_policies.policies]]
        id = 100
        name = "pii-read-deny"
        [tag_policies.policies.resources.tag]
        values = ["PII"]
        [[tag_policies.policies.deny_items]]
        groups = ["public"]
        accesses = ["datastore:select"]
    "#;

    fn request(user: &str, groups: &[&str], table: &str, access_type: &str) -> AccessRequest {
        let mut req = AccessRequest::new(
            AccessResource::new()
                .with_value("database", "sales")
                .with_value("table", table),
            user,
            access_type,
        );
        req.user_groups = groups.iter().map(|s| s.to_string()).collect();
        req
    }

    fn tag(request: &AccessRequest, names: &[&str]) {
        request.set_context_value(
            CONTEXT_TAGS,
            ContextValue::Tags(names.iter().map(|n| ResourceTag::new(*n)).collect()),
        );
    }

    // ── End-to-end over the default evaluator ─────────────────────────────────

    #[test]
    fn snapshot_round_trips_through_toml() {
        let snapshot = load_service_policies_str(SNAPSHOT).unwrap();

        assert_eq!(snapshot.service_name, "datastore");
        assert_eq!(snapshot.policy_version, 12);
        assert_eq!(snapshot.policies.len(), 2);

        let tag_policies = snapshot.tag_policies.as_ref().unwrap();
        assert_eq!(tag_policies.service_name, "tagging");
        assert_eq!(tag_policies.policies.len(), 1);
        // Defaults fill in what the TOML leaves out.
        assert!(snapshot.policies[0].is_enabled);
        assert!(snapshot.policies[0].is_audit_enabled);
        assert_eq!(snapshot.policies[0].priority, 0);
    }

    #[test]
    fn untagged_read_is_allowed_by_resource_policy() {
        let snapshot = load_service_policies_str(SNAPSHOT).unwrap();
        let engine = build_policy_engine(&snapshot, &PolicyEngineOptions::default()).unwrap();

        let req = request("alice", &[], "orders", "select");
        tag(&req, &[]);
        let result = engine.is_access_allowed(&req, None);

        assert!(result.is_allowed);
        assert_eq!(result.policy_id, Some(1));
        assert!(result.is_audited);
    }

    #[test]
    fn pii_tag_denies_the_same_read() {
        let snapshot = load_service_policies_str(SNAPSHOT).unwrap();
        let engine = build_policy_engine(&snapshot, &PolicyEngineOptions::default()).unwrap();

        let req = request("alice", &[], "orders", "select");
        tag(&req, &["PII"]);
        let result = engine.is_access_allowed(&req, None);

        assert!(!result.is_allowed);
        assert!(result.is_access_determined);
        assert_eq!(result.policy_id, Some(100));
        assert!(result.is_audited);
    }

    #[test]
    fn pii_tag_does_not_block_updates() {
        // The tag policy only covers "datastore:select"; an update falls
        // through to the resource stage, where no policy allows it either.
        let snapshot = load_service_policies_str(SNAPSHOT).unwrap();
        let engine = build_policy_engine(&snapshot, &PolicyEngineOptions::default()).unwrap();

        let req = request("alice", &[], "orders", "update");
        tag(&req, &["PII"]);
        let result = engine.is_access_allowed(&req, None);

        assert!(!result.is_allowed);
        assert_ne!(result.policy_id, Some(100));
    }

    #[test]
    fn deny_first_ordering_blocks_temp_tables_for_everyone() {
        // Policy 2 (deny, tmp_*) is ordered ahead of policy 1 (allow, *)
        // within the same priority band, so the deny decides first.
        let snapshot = load_service_policies_str(SNAPSHOT).unwrap();
        let engine = build_policy_engine(&snapshot, &PolicyEngineOptions::default()).unwrap();

        let req = request("alice", &["analysts"], "tmp_scratch", "select");
        let result = engine.is_access_allowed(&req, None);

        assert!(!result.is_allowed);
        assert!(result.is_access_determined);
        assert_eq!(result.policy_id, Some(2));
    }

    #[test]
    fn group_membership_grants_access() {
        let snapshot = load_service_policies_str(SNAPSHOT).unwrap();
        let engine = build_policy_engine(&snapshot, &PolicyEngineOptions::default()).unwrap();

        let req = request("dave", &["analysts"], "orders", "select");
        assert!(engine.is_access_allowed(&req, None).is_allowed);

        let req = request("dave", &["finance"], "orders", "select");
        let result = engine.is_access_allowed(&req, None);
        assert!(!result.is_allowed);
        assert!(!result.is_access_determined);
    }

    #[test]
    fn allowed_policies_query_uses_the_default_evaluator() {
        let snapshot = load_service_policies_str(SNAPSHOT).unwrap();
        let engine = build_policy_engine(&snapshot, &PolicyEngineOptions::default()).unwrap();

        let groups: HashSet<String> = HashSet::new();
        let allowed: Vec<i64> = engine
            .allowed_policies("alice", &groups, "select")
            .iter()
            .map(|p| p.id)
            .collect();

        // A policy is listed when some evaluator allows the user access to
        // its resource footprint. The sales-read policy (table "*") covers
        // the temp-tables footprint too, so both are listed — in evaluator
        // order, deny-carrying policy 2 first.
        assert_eq!(allowed, vec![2, 1]);

        // Nobody grants mallory anything.
        let for_mallory = engine.allowed_policies("mallory", &groups, "select");
        assert!(for_mallory.is_empty());
    }

    #[test]
    fn exact_match_policy_query() {
        let toml = r#"
            service_name = "datastore"

            [service_def]
            name = "datastore"

            [[policies]]
            id = 7
            name = "orders-exact"
            [policies.resources.database]
            values = ["sales"]
            [policies.resources.table]
            values = ["orders"]
        "#;

        let snapshot = load_service_policies_str(toml).unwrap();
        let engine = build_policy_engine(&snapshot, &PolicyEngineOptions::default()).unwrap();

        let resource = AccessResource::new()
            .with_value("database", "sales")
            .with_value("table", "orders");
        assert_eq!(engine.exact_match_policy(&resource).unwrap().id, 7);

        let other = AccessResource::new().with_value("database", "sales");
        assert!(engine.exact_match_policy(&other).is_none());
    }

    #[test]
    fn direct_resource_predicate_ignores_tags() {
        let snapshot = load_service_policies_str(SNAPSHOT).unwrap();
        let engine = build_policy_engine(&snapshot, &PolicyEngineOptions::default()).unwrap();

        let resource = AccessResource::new()
            .with_value("database", "sales")
            .with_value("table", "orders");
        let groups = HashSet::new();

        // The predicate consults resource policies only — no tag stage.
        assert!(engine.is_access_allowed_for_resource(&resource, "alice", &groups, "select"));
        assert!(!engine.is_access_allowed_for_resource(&resource, "mallory", &groups, "select"));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let result = load_service_policies_str("this is not toml ][[[");

        match result {
            Err(WardenError::ConfigError { reason }) => {
                assert!(
                    reason.contains("failed to parse policy snapshot TOML"),
                    "unexpected reason: {reason}"
                );
            }
            other => panic!("expected ConfigError, got {:?}", other.map(|_| ())),
        }
    }
}
