//! Loading policy snapshots and building engines from them.
//!
//! A `ServicePolicies` snapshot is normally handed over by a policy
//! fetcher; for file-driven deployments and tests it can also be declared
//! in TOML and loaded here.

use std::path::Path;

use warden_contracts::{
    error::{WardenError, WardenResult},
    policy::{PolicyEngineOptions, ServicePolicies},
};
use warden_core::PolicyEngine;

use crate::evaluator::DefaultEvaluatorFactory;

/// Parse `s` as a TOML policy snapshot.
///
/// Returns `WardenError::ConfigError` if the TOML is malformed or does not
/// match the `ServicePolicies` schema.
pub fn load_service_policies_str(s: &str) -> WardenResult<ServicePolicies> {
    toml::from_str(s).map_err(|e| WardenError::ConfigError {
        reason: format!("failed to parse policy snapshot TOML: {}", e),
    })
}

/// Read the file at `path` and parse it as a TOML policy snapshot.
pub fn load_service_policies(path: &Path) -> WardenResult<ServicePolicies> {
    let contents = std::fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
        reason: format!("failed to read policy snapshot '{}': {}", path.display(), e),
    })?;
    load_service_policies_str(&contents)
}

/// Build a [`PolicyEngine`] over the default evaluator, with no context
/// enrichers.
///
/// Hosts that need enrichers call `PolicyEngine::with_enrichers` directly,
/// passing [`DefaultEvaluatorFactory`].
pub fn build_policy_engine(
    service_policies: &ServicePolicies,
    options: &PolicyEngineOptions,
) -> WardenResult<PolicyEngine> {
    PolicyEngine::new(service_policies, options, &DefaultEvaluatorFactory)
}
