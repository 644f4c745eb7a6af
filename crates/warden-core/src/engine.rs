//! The policy decision engine: context enrichment, two-stage evaluation,
//! verdict combination, and audit finalization.
//!
//! One engine is built from one `ServicePolicies` snapshot and is immutable
//! thereafter. The decision pipeline for a request:
//!
//!   enrich → tag stage (deny overrides allow across tags)
//!          → resource stage (evaluators in order, audit cache)
//!          → result processor (audit side effect)
//!
//! A determined tag-stage verdict wins outright and the resource stage is
//! never consulted. Within the resource stage, evaluation stops as soon as
//! both the access decision and the audit decision are determined.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use warden_contracts::{
    error::{WardenError, WardenResult},
    policy::{Policy, PolicyEngineOptions, PolicyResource, ServiceDef, ServicePolicies},
    request::{AccessRequest, AccessResource},
    result::{AccessResult, TagAuditEvent},
};

use crate::repository::PolicyRepository;
use crate::tag::tag_access_request;
use crate::traits::{AccessResultProcessor, ContextEnricher, PolicyEvaluatorFactory};

/// The top-level decision engine for one service.
///
/// Owns exactly two repositories — resource policies, and optionally tag
/// policies — plus the combined enricher list (tag enrichers first, so
/// resource enrichers may observe tags). Repositories are not shared
/// across engines; on a policy update the host builds a new engine and
/// swaps it atomically.
pub struct PolicyEngine {
    resource_repository: PolicyRepository,
    tag_repository: Option<PolicyRepository>,
    context_enrichers: Vec<Arc<dyn ContextEnricher>>,
}

impl PolicyEngine {
    /// Build an engine with no context enrichers.
    pub fn new(
        service_policies: &ServicePolicies,
        options: &PolicyEngineOptions,
        factory: &dyn PolicyEvaluatorFactory,
    ) -> WardenResult<Self> {
        Self::with_enrichers(service_policies, options, factory, Vec::new(), Vec::new())
    }

    /// Build an engine from a policy snapshot.
    ///
    /// The tag repository is built only when the snapshot carries a
    /// non-empty tag policy list and `options.disable_tag_policy_evaluation`
    /// is false. A non-empty tag policy list with a blank tag service name
    /// or a missing tag service definition is a `ConfigError`: construction
    /// fails and no engine is returned.
    pub fn with_enrichers(
        service_policies: &ServicePolicies,
        options: &PolicyEngineOptions,
        factory: &dyn PolicyEvaluatorFactory,
        resource_enrichers: Vec<Arc<dyn ContextEnricher>>,
        tag_enrichers: Vec<Arc<dyn ContextEnricher>>,
    ) -> WardenResult<Self> {
        let service_def = Arc::new(service_policies.service_def.clone());

        let resource_repository = PolicyRepository::new(
            &service_policies.service_name,
            Arc::clone(&service_def),
            service_policies.policy_version,
            &service_policies.policies,
            resource_enrichers,
            factory,
            options,
        )?;

        let tag_repository = match &service_policies.tag_policies {
            Some(tag_policies)
                if !options.disable_tag_policy_evaluation && !tag_policies.policies.is_empty() =>
            {
                if tag_policies.service_name.is_empty() {
                    return Err(WardenError::ConfigError {
                        reason: "tag policies present without a tag service name".to_string(),
                    });
                }
                let tag_service_def =
                    tag_policies.service_def.clone().ok_or_else(|| WardenError::ConfigError {
                        reason: format!(
                            "tag policies for tag-service '{}' present without a service definition",
                            tag_policies.service_name
                        ),
                    })?;

                debug!(
                    service = %service_policies.service_name,
                    tag_service = %tag_policies.service_name,
                    "building tag policy repository"
                );

                Some(PolicyRepository::new(
                    &tag_policies.service_name,
                    Arc::new(tag_service_def),
                    service_policies.policy_version,
                    &tag_policies.policies,
                    tag_enrichers,
                    factory,
                    options,
                )?)
            }
            _ => {
                debug!(
                    service = %service_policies.service_name,
                    "no tag policy repository for this service"
                );
                None
            }
        };

        // Tag enrichers run first so resource enrichers may observe tags.
        let mut context_enrichers = Vec::new();
        if let Some(tag_repository) = &tag_repository {
            context_enrichers.extend(tag_repository.context_enrichers().iter().cloned());
        }
        context_enrichers.extend(resource_repository.context_enrichers().iter().cloned());

        Ok(Self {
            resource_repository,
            tag_repository,
            context_enrichers,
        })
    }

    pub fn service_name(&self) -> &str {
        self.resource_repository.service_name()
    }

    pub fn service_def(&self) -> &Arc<ServiceDef> {
        self.resource_repository.service_def()
    }

    pub fn policy_version(&self) -> i64 {
        self.resource_repository.policy_version()
    }

    /// A fresh, undetermined result for `request`, seeded with this
    /// engine's service name and definition.
    pub fn create_access_result(&self, request: &AccessRequest) -> AccessResult {
        AccessResult::new(
            self.service_name(),
            Arc::clone(self.resource_repository.service_def()),
            request,
        )
    }

    /// Run every context enricher against `request`, in order.
    ///
    /// Enrichers mutate the request's context map in place. A failing
    /// enricher is logged and skipped — it never aborts the chain.
    pub fn enrich_context(&self, request: &AccessRequest) {
        for enricher in &self.context_enrichers {
            if let Err(error) = enricher.enrich(request) {
                warn!(
                    enricher = enricher.name(),
                    %error,
                    "context enricher failed; continuing with remaining enrichers"
                );
            }
        }
    }

    /// Batch enrichment: each enricher runs over the whole batch before the
    /// next enricher starts.
    pub fn enrich_context_all(&self, requests: &[AccessRequest]) {
        for enricher in &self.context_enrichers {
            for request in requests {
                if let Err(error) = enricher.enrich(request) {
                    warn!(
                        enricher = enricher.name(),
                        %error,
                        "context enricher failed; continuing"
                    );
                }
            }
        }
    }

    /// Decide one access request.
    ///
    /// When `processor` is given it is invoked with the finished result; a
    /// processor failure is logged and dropped — the decision is returned
    /// to the caller regardless.
    pub fn is_access_allowed(
        &self,
        request: &AccessRequest,
        processor: Option<&dyn AccessResultProcessor>,
    ) -> AccessResult {
        let result = self.decide_access(request);

        if let Some(processor) = processor {
            if let Err(error) = processor.process_result(&result) {
                warn!(%error, "result processor failed; decision unaffected");
            }
        }

        result
    }

    /// Decide a batch of requests. The processor, if given, is invoked once
    /// with the full collection.
    pub fn is_access_allowed_all(
        &self,
        requests: &[AccessRequest],
        processor: Option<&dyn AccessResultProcessor>,
    ) -> Vec<AccessResult> {
        let results: Vec<AccessResult> =
            requests.iter().map(|request| self.decide_access(request)).collect();

        if let Some(processor) = processor {
            if let Err(error) = processor.process_results(&results) {
                warn!(%error, "result processor failed; decisions unaffected");
            }
        }

        results
    }

    /// Short-circuiting any: does some resource policy allow `user` the
    /// given `access_type` on `resource`?
    ///
    /// Consults resource evaluators only — no tag policies, no audit state.
    pub fn is_access_allowed_for_resource(
        &self,
        resource: &AccessResource,
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> bool {
        self.resource_repository
            .evaluators()
            .iter()
            .any(|evaluator| evaluator.is_access_allowed(resource, user, user_groups, access_type))
    }

    /// Variant of [`is_access_allowed_for_resource`](Self::is_access_allowed_for_resource)
    /// matched against a policy's resource specification.
    pub fn is_access_allowed_for_resources(
        &self,
        resources: &HashMap<String, PolicyResource>,
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> bool {
        self.resource_repository.evaluators().iter().any(|evaluator| {
            evaluator.is_access_allowed_for_resources(resources, user, user_groups, access_type)
        })
    }

    /// The first policy whose evaluator covers exactly `resource` and
    /// nothing broader, if any.
    pub fn exact_match_policy(&self, resource: &AccessResource) -> Option<&Policy> {
        self.resource_repository
            .evaluators()
            .iter()
            .find(|evaluator| evaluator.is_single_and_exact_match(resource))
            .map(|evaluator| evaluator.policy())
    }

    /// Every resource policy that would allow `user` the given access type
    /// on its own resource specification, in evaluator order.
    pub fn allowed_policies(
        &self,
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> Vec<&Policy> {
        let mut allowed = Vec::new();

        for evaluator in self.resource_repository.evaluators() {
            let policy = evaluator.policy();
            if self.is_access_allowed_for_resources(&policy.resources, user, user_groups, access_type)
            {
                allowed.push(policy);
            }
        }

        allowed
    }

    // ── Decision pipeline ────────────────────────────────────────────────────

    /// The core two-stage decision: tag policies first, then resource
    /// policies with audit caching.
    fn decide_access(&self, request: &AccessRequest) -> AccessResult {
        let mut result = self.create_access_result(request);

        if self.tag_repository.is_some() {
            let tag_result = self.evaluate_tag_policies(request);

            if tag_result.is_access_determined {
                debug!(
                    user = %request.user,
                    allowed = tag_result.is_allowed,
                    policy_id = ?tag_result.policy_id,
                    "tag policies determined access; resource stage skipped"
                );
                return tag_result;
            }

            // A determined audit flag from the tag stage is authoritative
            // even when access is not.
            if tag_result.is_audited_determined {
                result.is_audited = tag_result.is_audited;
                result.is_audited_determined = true;
            }
        }

        // The audit cache is keyed by resource fingerprint; a tag-derived
        // audit determination must neither be overwritten by it nor stored
        // into it.
        let consult_cache = !result.is_audited_determined;
        let found_in_cache = consult_cache
            && self
                .resource_repository
                .set_audit_enabled_from_cache(request, &mut result);

        for evaluator in self.resource_repository.evaluators() {
            let snapshot = result.clone();
            if let Err(error) = evaluator.evaluate(request, &mut result) {
                warn!(
                    policy_id = evaluator.policy().id,
                    %error,
                    "policy evaluator failed; treated as no determination"
                );
                result = snapshot;
                continue;
            }

            if result.is_access_determined && result.is_audited_determined {
                break;
            }
        }

        if consult_cache && !found_in_cache {
            self.resource_repository.store_audit_enabled_in_cache(request, &result);
        }

        result
    }

    /// Evaluate tag policies for every tag in the request's context and
    /// combine the per-tag verdicts into one stage result.
    ///
    /// Returns an undetermined result when there is no tag repository, no
    /// tag list in the context, or no tag produced a determination.
    fn evaluate_tag_policies(&self, request: &AccessRequest) -> AccessResult {
        let mut result = self.create_access_result(request);

        let Some(tag_repository) = &self.tag_repository else {
            return result;
        };
        let Some(tags) = request.tags() else {
            debug!(user = %request.user, "no tags in request context");
            return result;
        };

        let evaluators = tag_repository.evaluators();
        if evaluators.is_empty() {
            return result;
        }

        let mut some_tag_denied = false;
        let mut some_tag_allowed = false;
        let mut some_tag_required_audit = false;
        let mut allowed_result = self.create_access_result(request);
        let mut denied_result = self.create_access_result(request);
        let mut tag_audit_events: Vec<TagAuditEvent> = Vec::new();

        let component_name = &self.service_def().name;

        for tag in &tags {
            debug!(tag = %tag.name, "evaluating tag policies");

            let tag_request = tag_access_request(tag, component_name, request);
            let mut tag_result = self.create_access_result(&tag_request);

            for evaluator in evaluators {
                let snapshot = tag_result.clone();
                if let Err(error) = evaluator.evaluate(&tag_request, &mut tag_result) {
                    warn!(
                        policy_id = evaluator.policy().id,
                        tag = %tag.name,
                        %error,
                        "tag policy evaluator failed; treated as no determination"
                    );
                    tag_result = snapshot;
                    continue;
                }

                // A final decider ends this tag's loop even when the result
                // is still undetermined.
                if evaluator.is_final_decider()
                    || (tag_result.is_access_determined && tag_result.is_audited_determined)
                {
                    debug!(
                        tag = %tag.name,
                        policy_id = ?tag_result.policy_id,
                        allowed = tag_result.is_allowed,
                        "concluding evaluation for tag"
                    );
                    break;
                }
            }

            if tag_result.is_audited_determined {
                some_tag_required_audit = true;

                if tag_result.is_access_determined {
                    tag_audit_events.push(TagAuditEvent::new(&tag.name, tag_result.clone()));
                }
            }

            if tag_result.is_access_determined {
                if tag_result.is_allowed {
                    some_tag_allowed = true;
                    allowed_result.copy_decision_from(&tag_result);
                } else {
                    some_tag_denied = true;
                    denied_result.copy_decision_from(&tag_result);
                }
            }
        }

        // Deny overrides allow across tags, regardless of tag order.
        if some_tag_denied {
            result.copy_decision_from(&denied_result);
        } else if some_tag_allowed {
            result.copy_decision_from(&allowed_result);
        }

        if some_tag_required_audit {
            debug!(user = %request.user, "at least one tag policy determined audit");
            result.mark_audited(true);

            TagAuditEvent::reduce(&mut tag_audit_events, some_tag_denied);
            result.tag_audit_events = tag_audit_events;
        }

        result
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
