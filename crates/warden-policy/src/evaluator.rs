//! The default policy evaluator.
//!
//! One evaluator wraps one `Policy`. Evaluation order across policies is
//! the repository's concern; within a policy, a matching deny item always
//! wins over a matching allow item.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use warden_contracts::{
    error::WardenResult,
    policy::{Policy, PolicyItem, PolicyResource, ServiceDef},
    request::{AccessRequest, AccessResource},
    result::AccessResult,
};
use warden_core::traits::{PolicyEvaluator, PolicyEvaluatorFactory};

use crate::matcher::ResourceMatcher;

/// The group name that matches every user.
pub const GROUP_PUBLIC: &str = "public";

/// Evaluates a single policy: glob resource matching plus user/group/access
/// item matching.
pub struct DefaultPolicyEvaluator {
    policy: Policy,
    matcher: ResourceMatcher,
}

impl DefaultPolicyEvaluator {
    pub fn new(policy: Policy) -> Self {
        let matcher = ResourceMatcher::new(policy.resources.clone());
        Self { policy, matcher }
    }

    fn item_matches(
        item: &PolicyItem,
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> bool {
        let user_matches = item.users.iter().any(|u| u == user)
            || item
                .groups
                .iter()
                .any(|group| group == GROUP_PUBLIC || user_groups.contains(group));
        if !user_matches {
            return false;
        }

        item.accesses
            .iter()
            .any(|access| access == "*" || access == access_type)
    }

    fn some_item_matches(
        items: &[PolicyItem],
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> bool {
        items
            .iter()
            .any(|item| Self::item_matches(item, user, user_groups, access_type))
    }
}

impl PolicyEvaluator for DefaultPolicyEvaluator {
    /// Update `result` if this policy's resource patterns match the request.
    ///
    /// Audit is determined (true) when the policy matches and has audit
    /// enabled; a matching audit-disabled policy says nothing about audit,
    /// leaving the flag open for later policies. Access is decided by the
    /// first matching item, deny items consulted first.
    fn evaluate(&self, request: &AccessRequest, result: &mut AccessResult) -> WardenResult<()> {
        if result.is_access_determined && result.is_audited_determined {
            return Ok(());
        }

        if !self.matcher.matches(&request.resource) {
            return Ok(());
        }

        debug!(
            policy_id = self.policy.id,
            user = %request.user,
            resource = %result.resource,
            "policy resource matched"
        );

        if !result.is_audited_determined && self.policy.is_audit_enabled {
            result.mark_audited(true);
        }

        if !result.is_access_determined {
            if Self::some_item_matches(
                &self.policy.deny_items,
                &request.user,
                &request.user_groups,
                &request.access_type,
            ) {
                result.deny(
                    self.policy.id,
                    format!("denied by policy '{}'", self.policy.name),
                );
            } else if Self::some_item_matches(
                &self.policy.allow_items,
                &request.user,
                &request.user_groups,
                &request.access_type,
            ) {
                result.allow(
                    self.policy.id,
                    format!("allowed by policy '{}'", self.policy.name),
                );
            }
        }

        Ok(())
    }

    fn is_access_allowed(
        &self,
        resource: &AccessResource,
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> bool {
        self.matcher.matches(resource)
            && Self::some_item_matches(&self.policy.allow_items, user, user_groups, access_type)
            && !Self::some_item_matches(&self.policy.deny_items, user, user_groups, access_type)
    }

    fn is_access_allowed_for_resources(
        &self,
        resources: &HashMap<String, PolicyResource>,
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> bool {
        self.matcher.matches_policy_resources(resources)
            && Self::some_item_matches(&self.policy.allow_items, user, user_groups, access_type)
            && !Self::some_item_matches(&self.policy.deny_items, user, user_groups, access_type)
    }

    fn is_single_and_exact_match(&self, resource: &AccessResource) -> bool {
        self.matcher.is_exact_match(resource)
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }
}

/// Builds a [`DefaultPolicyEvaluator`] per policy.
pub struct DefaultEvaluatorFactory;

impl PolicyEvaluatorFactory for DefaultEvaluatorFactory {
    fn build_evaluator(
        &self,
        policy: &Policy,
        _service_def: &ServiceDef,
    ) -> WardenResult<Arc<dyn PolicyEvaluator>> {
        Ok(Arc::new(DefaultPolicyEvaluator::new(policy.clone())))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    use warden_contracts::{
        policy::{Policy, PolicyItem, PolicyResource, ServiceDef},
        request::{AccessRequest, AccessResource},
        result::AccessResult,
    };
    use warden_core::traits::PolicyEvaluator;

    use super::DefaultPolicyEvaluator;

    fn service_def() -> Arc<ServiceDef> {
        Arc::new(ServiceDef {
            name: "datastore".to_string(),
            resource_dimensions: vec!["database".to_string()],
            access_types: vec!["select".to_string(), "update".to_string()],
        })
    }

    fn item(users: &[&str], groups: &[&str], accesses: &[&str]) -> PolicyItem {
        PolicyItem {
            users: users.iter().map(|s| s.to_string()).collect(),
            groups: groups.iter().map(|s| s.to_string()).collect(),
            accesses: accesses.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn sales_policy(allow: Vec<PolicyItem>, deny: Vec<PolicyItem>) -> Policy {
        let mut resources = HashMap::new();
        resources.insert("database".to_string(), PolicyResource::new(["sales"]));
        Policy {
            id: 1,
            name: "sales-access".to_string(),
            is_enabled: true,
            is_audit_enabled: true,
            priority: 0,
            resources,
            allow_items: allow,
            deny_items: deny,
        }
    }

    fn request(user: &str, groups: &[&str], access_type: &str) -> AccessRequest {
        let mut req = AccessRequest::new(
            AccessResource::new().with_value("database", "sales"),
            user,
            access_type,
        );
        req.user_groups = groups.iter().map(|s| s.to_string()).collect();
        req
    }

    fn evaluate(evaluator: &DefaultPolicyEvaluator, req: &AccessRequest) -> AccessResult {
        let mut result = AccessResult::new("datastore", service_def(), req);
        evaluator.evaluate(req, &mut result).unwrap();
        result
    }

    #[test]
    fn allow_item_grants_access_and_audit() {
        let evaluator = DefaultPolicyEvaluator::new(sales_policy(
            vec![item(&["alice"], &[], &["select"])],
            vec![],
        ));

        let result = evaluate(&evaluator, &request("alice", &[], "select"));
        assert!(result.is_allowed);
        assert!(result.is_access_determined);
        assert_eq!(result.policy_id, Some(1));
        assert!(result.is_audited);
        assert!(result.is_audited_determined);
    }

    #[test]
    fn deny_item_wins_over_allow_item() {
        let evaluator = DefaultPolicyEvaluator::new(sales_policy(
            vec![item(&["alice"], &[], &["select"])],
            vec![item(&[], &["contractors"], &["select"])],
        ));

        // alice is also a contractor: the deny item must win.
        let result = evaluate(&evaluator, &request("alice", &["contractors"], "select"));
        assert!(!result.is_allowed);
        assert!(result.is_access_determined);
        assert!(result.reason.as_deref().unwrap().contains("denied by policy"));
    }

    #[test]
    fn public_group_matches_every_user() {
        let evaluator = DefaultPolicyEvaluator::new(sales_policy(
            vec![item(&[], &["public"], &["select"])],
            vec![],
        ));

        let result = evaluate(&evaluator, &request("mallory", &[], "select"));
        assert!(result.is_allowed);
    }

    #[test]
    fn wildcard_access_matches_any_access_type() {
        let evaluator = DefaultPolicyEvaluator::new(sales_policy(
            vec![item(&["alice"], &[], &["*"])],
            vec![],
        ));

        assert!(evaluate(&evaluator, &request("alice", &[], "update")).is_allowed);
    }

    #[test]
    fn unmatched_user_leaves_access_undetermined_but_audited() {
        let evaluator = DefaultPolicyEvaluator::new(sales_policy(
            vec![item(&["alice"], &[], &["select"])],
            vec![],
        ));

        // The resource matched, so audit is determined; nothing decides
        // access for bob — a later policy still can.
        let result = evaluate(&evaluator, &request("bob", &[], "select"));
        assert!(!result.is_access_determined);
        assert!(result.is_audited);
        assert!(result.is_audited_determined);
    }

    #[test]
    fn unmatched_resource_touches_nothing() {
        let evaluator = DefaultPolicyEvaluator::new(sales_policy(
            vec![item(&["alice"], &[], &["select"])],
            vec![],
        ));

        let req = AccessRequest::new(
            AccessResource::new().with_value("database", "hr"),
            "alice",
            "select",
        );
        let mut result = AccessResult::new("datastore", service_def(), &req);
        evaluator.evaluate(&req, &mut result).unwrap();

        assert!(!result.is_access_determined);
        assert!(!result.is_audited_determined);
    }

    #[test]
    fn audit_disabled_policy_says_nothing_about_audit() {
        let mut policy = sales_policy(vec![item(&["alice"], &[], &["select"])], vec![]);
        policy.is_audit_enabled = false;
        let evaluator = DefaultPolicyEvaluator::new(policy);

        let result = evaluate(&evaluator, &request("alice", &[], "select"));
        assert!(result.is_allowed);
        assert!(!result.is_audited_determined, "audit must stay open for later policies");
    }

    #[test]
    fn fully_determined_result_is_left_alone() {
        let evaluator = DefaultPolicyEvaluator::new(sales_policy(
            vec![item(&["alice"], &[], &["select"])],
            vec![],
        ));

        let req = request("alice", &[], "select");
        let mut result = AccessResult::new("datastore", service_def(), &req);
        result.deny(99, "decided earlier");
        result.mark_audited(false);

        evaluator.evaluate(&req, &mut result).unwrap();

        assert!(!result.is_allowed);
        assert_eq!(result.policy_id, Some(99));
        assert!(!result.is_audited);
    }

    #[test]
    fn direct_predicate_respects_deny_items() {
        let evaluator = DefaultPolicyEvaluator::new(sales_policy(
            vec![item(&["alice"], &[], &["select"])],
            vec![item(&["alice"], &[], &["select"])],
        ));

        let resource = AccessResource::new().with_value("database", "sales");
        let groups = HashSet::new();
        assert!(!evaluator.is_access_allowed(&resource, "alice", &groups, "select"));
    }
}
