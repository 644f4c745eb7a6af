//! The audit record type written by result processors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_contracts::result::AccessResult;

/// A flattened snapshot of one audited access decision.
///
/// Plain serde data, so sinks can ship it anywhere — a log line, a file, a
/// message queue — without dragging engine types along.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub service_name: String,
    pub user: String,
    /// Canonical fingerprint of the evaluated resource.
    pub resource: String,
    pub access_type: String,
    pub is_allowed: bool,
    pub is_access_determined: bool,
    pub policy_id: Option<i64>,
    pub reason: Option<String>,
    /// Wall-clock time (UTC) the record was created.
    pub recorded_at: DateTime<Utc>,
}

impl DecisionRecord {
    /// Snapshot `result` into a record, stamped with the current time.
    pub fn from_result(result: &AccessResult) -> Self {
        Self {
            service_name: result.service_name.clone(),
            user: result.user.clone(),
            resource: result.resource.clone(),
            access_type: result.access_type.clone(),
            is_allowed: result.is_allowed,
            is_access_determined: result.is_access_determined,
            policy_id: result.policy_id,
            reason: result.reason.clone(),
            recorded_at: Utc::now(),
        }
    }
}
