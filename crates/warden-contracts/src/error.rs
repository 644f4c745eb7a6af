//! Error types for the warden authorization engine.
//!
//! All fallible operations across the warden crates return `WardenResult<T>`.
//! Only configuration errors abort anything: evaluator, enricher, and
//! processor failures are contained by the engine so that one broken policy
//! or sink cannot deny service.

use thiserror::Error;

/// The unified error type for the warden crates.
#[derive(Debug, Error)]
pub enum WardenError {
    /// A `ServicePolicies` snapshot is malformed (e.g. tag policies present
    /// without a tag service definition). Fails engine construction; no
    /// partially-built engine is ever returned.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A policy evaluator failed while evaluating a request.
    ///
    /// The engine logs this and treats the evaluator as having produced no
    /// determination; evaluation continues with the next evaluator.
    #[error("policy evaluator failed (policy_id={policy_id:?}): {reason}")]
    EvaluatorError { policy_id: Option<i64>, reason: String },

    /// A context enricher failed. The engine logs this and runs the
    /// remaining enrichers.
    #[error("context enricher '{enricher}' failed: {reason}")]
    EnricherError { enricher: String, reason: String },

    /// An access-result processor (audit sink) failed.
    ///
    /// Caught and dropped by the engine: a decision is never rolled back by
    /// an audit failure.
    #[error("result processor failed: {reason}")]
    ProcessorError { reason: String },
}

/// Convenience alias used throughout the warden crates.
pub type WardenResult<T> = Result<T, WardenError>;
