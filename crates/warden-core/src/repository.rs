//! Policy repository: the ordered evaluator list for one policy family,
//! its context enrichers, and the per-resource audit cache.
//!
//! A repository is immutable after construction except for the audit cache,
//! which is an advisory, Mutex-guarded LRU map from resource fingerprint to
//! a remembered audit determination. A disabled or cold cache never changes
//! a decision — only how fast audit determination converges.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tracing::debug;

use warden_contracts::{
    error::WardenResult,
    policy::{Policy, PolicyEngineOptions, ServiceDef},
    request::AccessRequest,
    result::AccessResult,
};

use crate::traits::{ContextEnricher, PolicyEvaluator, PolicyEvaluatorFactory};

/// Remembered audit determination for one resource fingerprint.
///
/// Only determined pairs are ever stored, so a hit can be copied into a
/// result verbatim.
#[derive(Debug, Clone, Copy)]
struct AuditCacheEntry {
    is_audited: bool,
    is_audited_determined: bool,
}

/// Holds the compiled evaluators for one policy family (resource or tag),
/// in evaluation order.
pub struct PolicyRepository {
    service_name: String,
    service_def: Arc<ServiceDef>,
    policy_version: i64,
    evaluators: Vec<Arc<dyn PolicyEvaluator>>,
    context_enrichers: Vec<Arc<dyn ContextEnricher>>,
    audit_cache: Option<Mutex<LruCache<String, AuditCacheEntry>>>,
}

impl PolicyRepository {
    /// Compile `policies` into an ordered evaluator list.
    ///
    /// Disabled policies are skipped. The remaining evaluators are ordered
    /// once, for the repository's lifetime: higher `priority` first, and
    /// within a priority band policies carrying deny items ahead of
    /// allow-only ones. The sort is stable, so snapshot order breaks ties.
    ///
    /// `options.audit_cache_size == 0` disables the audit cache.
    pub fn new(
        service_name: impl Into<String>,
        service_def: Arc<ServiceDef>,
        policy_version: i64,
        policies: &[Policy],
        context_enrichers: Vec<Arc<dyn ContextEnricher>>,
        factory: &dyn PolicyEvaluatorFactory,
        options: &PolicyEngineOptions,
    ) -> WardenResult<Self> {
        let service_name = service_name.into();

        let mut evaluators = Vec::with_capacity(policies.len());
        for policy in policies {
            if !policy.is_enabled {
                debug!(
                    service = %service_name,
                    policy_id = policy.id,
                    "skipping disabled policy"
                );
                continue;
            }
            evaluators.push(factory.build_evaluator(policy, &service_def)?);
        }

        evaluators.sort_by_key(|evaluator| {
            let policy = evaluator.policy();
            (std::cmp::Reverse(policy.priority), !policy.has_deny())
        });

        let audit_cache = NonZeroUsize::new(options.audit_cache_size)
            .map(|size| Mutex::new(LruCache::new(size)));

        debug!(
            service = %service_name,
            policy_version,
            evaluator_count = evaluators.len(),
            "policy repository built"
        );

        Ok(Self {
            service_name,
            service_def,
            policy_version,
            evaluators,
            context_enrichers,
            audit_cache,
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_def(&self) -> &Arc<ServiceDef> {
        &self.service_def
    }

    pub fn policy_version(&self) -> i64 {
        self.policy_version
    }

    /// The compiled evaluators, in evaluation order.
    pub fn evaluators(&self) -> &[Arc<dyn PolicyEvaluator>] {
        &self.evaluators
    }

    pub fn context_enrichers(&self) -> &[Arc<dyn ContextEnricher>] {
        &self.context_enrichers
    }

    /// Copy a remembered audit determination for this request's resource
    /// into `result`, if one is cached. Returns whether it was a hit.
    pub fn set_audit_enabled_from_cache(
        &self,
        request: &AccessRequest,
        result: &mut AccessResult,
    ) -> bool {
        let Some(cache) = &self.audit_cache else {
            return false;
        };

        let fingerprint = request.resource.fingerprint();
        let mut cache = cache.lock().expect("audit cache lock poisoned");

        match cache.get(&fingerprint) {
            Some(entry) => {
                result.is_audited = entry.is_audited;
                result.is_audited_determined = entry.is_audited_determined;
                true
            }
            None => false,
        }
    }

    /// Remember this request's audit determination, keyed by its resource
    /// fingerprint. Undetermined results are never stored.
    pub fn store_audit_enabled_in_cache(&self, request: &AccessRequest, result: &AccessResult) {
        if !result.is_audited_determined {
            return;
        }

        let Some(cache) = &self.audit_cache else {
            return;
        };

        let fingerprint = request.resource.fingerprint();
        let entry = AuditCacheEntry {
            is_audited: result.is_audited,
            is_audited_determined: result.is_audited_determined,
        };

        let mut cache = cache.lock().expect("audit cache lock poisoned");
        cache.put(fingerprint, entry);
    }

    #[cfg(test)]
    pub(crate) fn audit_cache_len(&self) -> usize {
        self.audit_cache
            .as_ref()
            .map(|cache| cache.lock().expect("audit cache lock poisoned").len())
            .unwrap_or(0)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
