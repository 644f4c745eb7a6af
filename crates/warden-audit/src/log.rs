//! A result processor that writes audited decisions to the `tracing` log.

use tracing::{info, warn};

use warden_contracts::{error::WardenResult, result::AccessResult};
use warden_core::traits::AccessResultProcessor;

/// Logs every audited decision: allows at `info`, denies and undetermined
/// (deny-by-default) outcomes at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingResultProcessor;

impl AccessResultProcessor for TracingResultProcessor {
    fn process_result(&self, result: &AccessResult) -> WardenResult<()> {
        if !result.is_audited {
            return Ok(());
        }

        if result.is_access_determined && result.is_allowed {
            info!(
                service = %result.service_name,
                user = %result.user,
                resource = %result.resource,
                access_type = %result.access_type,
                policy_id = ?result.policy_id,
                "access allowed"
            );
        } else {
            warn!(
                service = %result.service_name,
                user = %result.user,
                resource = %result.resource,
                access_type = %result.access_type,
                policy_id = ?result.policy_id,
                determined = result.is_access_determined,
                "access denied"
            );
        }

        Ok(())
    }
}
