//! In-memory transport that records every call
//!
//! 네트워크 없이 쓰기 경로를 검증하기 위한 테스트 더블입니다.
//! 호출 형태(단일/배치, consistency, logged, prepared 여부)를 그대로 기록하고,
//! `fail_next`로 전송 실패를 주입할 수 있습니다.

use super::{BatchExecuteOptions, BatchStatement, ExecuteOptions, PreparedStatement, QueryResult, Transport};
use crate::error::{CqxError, CqxResult};
use crate::value::CqlValue;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Shape of one recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Prepare {
        cql: String,
    },
    Statement {
        cql: String,
        bound_values: Vec<CqlValue>,
        options: ExecuteOptions,
    },
    Batch {
        statements: Vec<BatchStatement>,
        options: BatchExecuteOptions,
    },
}

/// Transport test double
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    next_id: AtomicU64,
    prepare_count: AtomicUsize,
    pending_failures: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` execute calls (statement or batch) fail
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// All recorded calls, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Recorded execute calls, excluding prepares
    pub fn executions(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| !matches!(call, RecordedCall::Prepare { .. }))
            .cloned()
            .collect()
    }

    /// Number of `prepare` calls received
    pub fn prepare_count(&self) -> usize {
        self.prepare_count.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
        self.prepare_count.store(0, Ordering::SeqCst);
    }

    fn take_failure(&self) -> CqxResult<()> {
        let consumed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match consumed {
            Ok(_) => Err(CqxError::Transport("injected failure".to_string())),
            Err(_) => Ok(()),
        }
    }
}

impl Transport for RecordingTransport {
    fn prepare(&self, cql: &str) -> CqxResult<PreparedStatement> {
        if cql.trim().is_empty() {
            return Err(CqxError::Prepare {
                cql: cql.to_string(),
                message: "empty statement".to_string(),
            });
        }
        self.prepare_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(RecordedCall::Prepare {
            cql: cql.to_string(),
        });
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(PreparedStatement::new(id.to_be_bytes().to_vec(), cql))
    }

    fn execute_statement(
        &self,
        cql: &str,
        bound_values: &[CqlValue],
        options: &ExecuteOptions,
    ) -> CqxResult<QueryResult> {
        self.take_failure()?;
        self.calls.lock().push(RecordedCall::Statement {
            cql: cql.to_string(),
            bound_values: bound_values.to_vec(),
            options: options.clone(),
        });
        Ok(QueryResult::default())
    }

    fn execute_batch(
        &self,
        statements: &[BatchStatement],
        options: &BatchExecuteOptions,
    ) -> CqxResult<QueryResult> {
        self.take_failure()?;
        self.calls.lock().push(RecordedCall::Batch {
            statements: statements.to_vec(),
            options: *options,
        });
        Ok(QueryResult::default())
    }
}
