//! In-memory implementation of `AccessResultProcessor`.
//!
//! `InMemoryResultProcessor` is the reference audit sink: it appends a
//! `DecisionRecord` for every result the engine marks as audited, behind a
//! `Mutex` so the engine may drive it from many request threads at once.
//! Results whose `is_audited` flag is false are not recorded — the audit
//! flag is precisely the engine telling sinks what to keep.

use std::sync::{Arc, Mutex};

use warden_contracts::{
    error::{WardenError, WardenResult},
    result::AccessResult,
};
use warden_core::traits::AccessResultProcessor;

use crate::record::DecisionRecord;

/// An in-memory, append-only audit sink.
///
/// # Thread safety
///
/// `process_result` acquires a `Mutex` internally. Clones share the same
/// underlying record store.
#[derive(Clone, Default)]
pub struct InMemoryResultProcessor {
    records: Arc<Mutex<Vec<DecisionRecord>>>,
}

impl InMemoryResultProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of all records written so far, in append order.
    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records
            .lock()
            .expect("audit record lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("audit record lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AccessResultProcessor for InMemoryResultProcessor {
    /// Append one record when the result is audited; drop it otherwise.
    fn process_result(&self, result: &AccessResult) -> WardenResult<()> {
        if !result.is_audited {
            return Ok(());
        }

        let mut records = self
            .records
            .lock()
            .map_err(|e| WardenError::ProcessorError {
                reason: format!("audit record lock poisoned: {}", e),
            })?;
        records.push(DecisionRecord::from_result(result));

        Ok(())
    }
}
