//! Network collaborator
//!
//! 클러스터와의 연결, 와이어 프로토콜, 재시도, 로드 밸런싱은 모두 이 트레이트의
//! 구현체가 담당합니다. 이 크레이트는 쿼리 텍스트와 바인드 값만 넘깁니다.

pub mod recording;

pub use recording::{RecordedCall, RecordingTransport};

use crate::consistency::Consistency;
use crate::error::CqxResult;
use crate::statement::Statement;
use crate::value::CqlValue;
use std::sync::Arc;

/// Opaque server-side handle for a prepared query text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreparedStatement {
    /// Server-assigned statement id
    pub id: Vec<u8>,
    /// Text the statement was prepared from
    pub cql: String,
}

impl PreparedStatement {
    pub fn new(id: impl Into<Vec<u8>>, cql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cql: cql.into(),
        }
    }
}

/// Options for a single-statement execute
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteOptions {
    pub consistency: Consistency,
    /// Execute through this prepared handle instead of sending raw text
    pub prepared: Option<Arc<PreparedStatement>>,
}

/// One entry of a batch execute
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatement {
    pub statement: Statement,
    pub prepared: Option<Arc<PreparedStatement>>,
}

/// Options for a batch execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecuteOptions {
    pub consistency: Consistency,
    /// Request all-or-nothing application
    pub logged: bool,
}

/// Result of a write; writes carry no rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// `[applied]` flag for conditional writes, when the server reports one
    pub applied: Option<bool>,
}

/// Client capability consumed by the write path.
///
/// Implementations must be safe to share across threads; every method may block
/// on network I/O.
pub trait Transport: Send + Sync {
    /// Prepares `cql`; fails if the text is not valid for the wire dialect
    fn prepare(&self, cql: &str) -> CqxResult<PreparedStatement>;

    /// Executes one statement
    ///
    /// `bound_values` match the placeholders of `cql` in count. For `INSERT`
    /// with TTL or timestamp they are ordered `[timestamp, ttl, row...]` while the
    /// `USING TIMESTAMP ? AND TTL ?` placeholders follow `VALUES (...)`; an
    /// implementation binding by position rotates those leading values to the end.
    /// The same holds for `INSERT` entries of [`Transport::execute_batch`].
    fn execute_statement(
        &self,
        cql: &str,
        bound_values: &[CqlValue],
        options: &ExecuteOptions,
    ) -> CqxResult<QueryResult>;

    /// Executes all statements in one network operation
    fn execute_batch(
        &self,
        statements: &[BatchStatement],
        options: &BatchExecuteOptions,
    ) -> CqxResult<QueryResult>;
}
