//! The access-result accumulator and per-tag audit events.
//!
//! An `AccessResult` is filled in incrementally by policy evaluators. Two
//! orthogonal "determined" flags drive the engine's short-circuiting:
//! `is_access_determined` (some evaluator produced a definitive allow or
//! deny) and `is_audited_determined` (the audit flag is known to be correct
//! for this request). Either may become true before the other.

use std::sync::Arc;

use crate::policy::ServiceDef;
use crate::request::AccessRequest;

/// The outcome of evaluating one access request.
///
/// Defaults to "undetermined, not allowed": a request no policy speaks to
/// is denied by default, but `is_access_determined` stays false so callers
/// can distinguish an explicit deny from the absence of a decision.
#[derive(Debug, Clone)]
pub struct AccessResult {
    /// The service this decision was made for.
    pub service_name: String,
    /// The service definition the deciding engine was built with.
    pub service_def: Arc<ServiceDef>,
    /// The requesting user, copied from the request for audit sinks.
    pub user: String,
    /// Canonical fingerprint of the evaluated resource.
    pub resource: String,
    /// The access type that was evaluated.
    pub access_type: String,

    /// Whether access is allowed. Meaningful once `is_access_determined`.
    pub is_allowed: bool,
    /// True once any evaluator produced a definitive allow or deny.
    pub is_access_determined: bool,
    /// Whether this decision must be audited.
    pub is_audited: bool,
    /// True once the audit flag is known to be correct for this request.
    pub is_audited_determined: bool,
    /// The policy that caused the decision, if any.
    pub policy_id: Option<i64>,
    /// Opaque diagnostic string from the deciding evaluator.
    pub reason: Option<String>,

    /// Per-tag audit events surviving reduction, attached by the tag stage.
    ///
    /// Populated only when the tag stage determined both access and audit
    /// for at least one tag. Decision fields never depend on this list; it
    /// exists so hosts can collect tag-level audit detail.
    pub tag_audit_events: Vec<TagAuditEvent>,
}

impl AccessResult {
    /// A fresh, undetermined result for `request`, seeded with the deciding
    /// engine's service name and definition.
    pub fn new(
        service_name: impl Into<String>,
        service_def: Arc<ServiceDef>,
        request: &AccessRequest,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            service_def,
            user: request.user.clone(),
            resource: request.resource.fingerprint(),
            access_type: request.access_type.clone(),
            is_allowed: false,
            is_access_determined: false,
            is_audited: false,
            is_audited_determined: false,
            policy_id: None,
            reason: None,
            tag_audit_events: Vec::new(),
        }
    }

    /// Record a definitive allow from the given policy.
    pub fn allow(&mut self, policy_id: i64, reason: impl Into<String>) {
        self.is_allowed = true;
        self.is_access_determined = true;
        self.policy_id = Some(policy_id);
        self.reason = Some(reason.into());
    }

    /// Record a definitive deny from the given policy.
    pub fn deny(&mut self, policy_id: i64, reason: impl Into<String>) {
        self.is_allowed = false;
        self.is_access_determined = true;
        self.policy_id = Some(policy_id);
        self.reason = Some(reason.into());
    }

    /// Record a definitive audit decision.
    pub fn mark_audited(&mut self, audited: bool) {
        self.is_audited = audited;
        self.is_audited_determined = true;
    }

    /// Copy the six decision fields from `other`: `is_allowed`,
    /// `is_access_determined`, `is_audited`, `is_audited_determined`,
    /// `policy_id`, `reason`.
    ///
    /// Everything else — service identity, request identity, tag audit
    /// events — is deliberately left untouched.
    pub fn copy_decision_from(&mut self, other: &AccessResult) {
        self.is_allowed = other.is_allowed;
        self.is_access_determined = other.is_access_determined;
        self.is_audited = other.is_audited;
        self.is_audited_determined = other.is_audited_determined;
        self.policy_id = other.policy_id;
        self.reason = other.reason.clone();
    }
}

/// A per-tag audit record: the tag's name plus a snapshot of the result its
/// evaluators produced.
///
/// Collected during the tag stage for every tag whose evaluation determined
/// both audit and access, then pruned by [`TagAuditEvent::reduce`] against
/// the combined verdict.
#[derive(Debug, Clone)]
pub struct TagAuditEvent {
    pub tag_name: String,
    pub result: AccessResult,
}

impl TagAuditEvent {
    pub fn new(tag_name: impl Into<String>, result: AccessResult) -> Self {
        Self {
            tag_name: tag_name.into(),
            result,
        }
    }

    /// Prune `events` in place against the combined tag verdict.
    ///
    /// When `denied_access` is true, every event whose result is an allow is
    /// dropped: the final verdict is a deny, and allow-events from other
    /// tags would be misleading in the audit trail. When false, the list is
    /// left unchanged.
    pub fn reduce(events: &mut Vec<TagAuditEvent>, denied_access: bool) {
        if denied_access {
            events.retain(|event| !event.result.is_allowed);
        }
    }
}
