//! Core trait definitions for the warden decision pipeline.
//!
//! These four traits are the engine's seams with its collaborators:
//!
//! - `PolicyEvaluator`        — opaque per-policy decider
//! - `PolicyEvaluatorFactory` — builds evaluators from policy descriptors
//! - `ContextEnricher`        — attaches derived facts to a request's context
//! - `AccessResultProcessor`  — audit side effect invoked after decisions
//!
//! The engine treats every evaluator as an opaque predicate with the
//! contract below; it never inspects how a policy matches.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use warden_contracts::{
    error::WardenResult,
    policy::{Policy, PolicyResource, ServiceDef},
    request::{AccessRequest, AccessResource},
    result::AccessResult,
};

/// One policy, compiled for evaluation.
///
/// Implementations are supplied externally (warden-policy ships the
/// default). They must be deterministic and fast — the engine runs them on
/// the hot path, many requests concurrently.
pub trait PolicyEvaluator: Send + Sync {
    /// Evaluate `request` against this policy, updating `result` if the
    /// policy matches.
    ///
    /// May set `is_allowed`, `is_access_determined`, `is_audited`,
    /// `is_audited_determined`, `policy_id`, and `reason`. Must leave fields
    /// it has nothing to say about untouched — in particular it must never
    /// un-determine a previously determined field.
    ///
    /// An `Err` is contained by the engine: the evaluator is treated as
    /// having produced no determination and evaluation continues.
    fn evaluate(&self, request: &AccessRequest, result: &mut AccessResult) -> WardenResult<()>;

    /// Direct predicate: would this policy allow `user` (with `user_groups`)
    /// the given `access_type` on `resource`?
    ///
    /// Used by the "which policies allow X" queries; does not touch audit
    /// state.
    fn is_access_allowed(
        &self,
        resource: &AccessResource,
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> bool;

    /// Like [`is_access_allowed`](Self::is_access_allowed), but matched
    /// against another policy's resource specification instead of a concrete
    /// resource.
    fn is_access_allowed_for_resources(
        &self,
        resources: &HashMap<String, PolicyResource>,
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> bool;

    /// True iff this policy covers exactly `resource` and nothing broader.
    fn is_single_and_exact_match(&self, resource: &AccessResource) -> bool;

    /// True when this evaluator always terminates a per-tag evaluation loop
    /// after it runs, regardless of outcome.
    fn is_final_decider(&self) -> bool {
        false
    }

    /// The underlying policy descriptor.
    fn policy(&self) -> &Policy;
}

/// Builds a [`PolicyEvaluator`] for each policy in a snapshot.
///
/// This is the seam that keeps evaluator internals out of the engine: the
/// repository walks the snapshot's policies and asks the factory for a
/// compiled evaluator per enabled policy.
pub trait PolicyEvaluatorFactory: Send + Sync {
    fn build_evaluator(
        &self,
        policy: &Policy,
        service_def: &ServiceDef,
    ) -> WardenResult<Arc<dyn PolicyEvaluator>>;
}

/// Attaches derived facts to a request's context before evaluation.
///
/// Tag enrichers attach the resource's tag list under
/// [`CONTEXT_TAGS`](warden_contracts::request::CONTEXT_TAGS); other
/// enrichers may attach whatever evaluators need. Enrichers are expected to
/// be total — a failure is logged and the chain continues.
pub trait ContextEnricher: Send + Sync {
    /// Name used in log messages when this enricher fails.
    fn name(&self) -> &str;

    fn enrich(&self, request: &AccessRequest) -> WardenResult<()>;
}

/// Audit side effect invoked after decisions.
///
/// Processor failures are caught and dropped by the engine: a decision is
/// never rolled back because its audit sink failed.
pub trait AccessResultProcessor: Send + Sync {
    fn process_result(&self, result: &AccessResult) -> WardenResult<()>;

    /// Batch form; invoked once with the full collection.
    fn process_results(&self, results: &[AccessResult]) -> WardenResult<()> {
        for result in results {
            self.process_result(result)?;
        }
        Ok(())
    }
}
