//! # warden-audit
//!
//! Audit sinks for the warden engine: implementations of
//! `AccessResultProcessor` that record decisions the engine marks as
//! audited.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_audit::InMemoryResultProcessor;
//!
//! let sink = InMemoryResultProcessor::new();
//! let result = engine.is_access_allowed(&request, Some(&sink));
//! for record in sink.records() {
//!     println!("{} -> {}", record.user, record.is_allowed);
//! }
//! ```
//!
//! Processor failures never affect decisions: the engine catches and drops
//! them.

pub mod log;
pub mod memory;
pub mod record;

pub use log::TracingResultProcessor;
pub use memory::InMemoryResultProcessor;
pub use record::DecisionRecord;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use warden_contracts::{
        policy::ServiceDef,
        request::{AccessRequest, AccessResource},
        result::AccessResult,
    };
    use warden_core::traits::AccessResultProcessor;

    use super::{InMemoryResultProcessor, TracingResultProcessor};

    fn result(user: &str, audited: bool, allowed: Option<bool>) -> AccessResult {
        let request = AccessRequest::new(
            AccessResource::new().with_value("database", "sales"),
            user,
            "select",
        );
        let service_def = Arc::new(ServiceDef {
            name: "datastore".to_string(),
            resource_dimensions: vec!["database".to_string()],
            access_types: vec!["select".to_string()],
        });

        let mut result = AccessResult::new("datastore", service_def, &request);
        if audited {
            result.mark_audited(true);
        }
        match allowed {
            Some(true) => result.allow(1, "allowed by policy 'sales-read'"),
            Some(false) => result.deny(2, "denied by policy 'temp-tables'"),
            None => {}
        }
        result
    }

    #[test]
    fn records_only_audited_results() {
        let sink = InMemoryResultProcessor::new();

        sink.process_result(&result("alice", true, Some(true))).unwrap();
        sink.process_result(&result("bob", false, Some(false))).unwrap();
        sink.process_result(&result("carol", true, None)).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user, "alice");
        assert!(records[0].is_allowed);
        assert_eq!(records[1].user, "carol");
        assert!(!records[1].is_access_determined);
    }

    #[test]
    fn record_carries_decision_detail() {
        let sink = InMemoryResultProcessor::new();
        sink.process_result(&result("alice", true, Some(false))).unwrap();

        let records = sink.records();
        assert_eq!(records[0].service_name, "datastore");
        assert_eq!(records[0].resource, "database=sales");
        assert_eq!(records[0].access_type, "select");
        assert_eq!(records[0].policy_id, Some(2));
        assert!(records[0].reason.as_deref().unwrap().contains("temp-tables"));
    }

    #[test]
    fn batch_processing_uses_the_per_result_path() {
        let sink = InMemoryResultProcessor::new();
        let results = vec![
            result("alice", true, Some(true)),
            result("bob", false, None),
            result("carol", true, Some(false)),
        ];

        sink.process_results(&results).unwrap();
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn clones_share_the_record_store() {
        let sink = InMemoryResultProcessor::new();
        let view = sink.clone();

        sink.process_result(&result("alice", true, Some(true))).unwrap();
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn tracing_processor_accepts_every_outcome() {
        let sink = TracingResultProcessor;
        sink.process_result(&result("alice", true, Some(true))).unwrap();
        sink.process_result(&result("bob", true, Some(false))).unwrap();
        sink.process_result(&result("carol", true, None)).unwrap();
        sink.process_result(&result("dave", false, Some(true))).unwrap();
    }
}
