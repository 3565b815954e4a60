//! Prepared Statement Cache
//!
//! 키스페이스 단위로 쿼리 텍스트 → prepared handle을 캐싱합니다.
//! 같은 텍스트에 대해 transport `prepare`는 한 번만 호출됩니다.
//!
//! # 동시성
//!
//! 조회와 삽입은 `DashMap` 샤드 락으로 보호되지만, 네트워크 호출(`prepare`) 동안에는
//! 락을 잡지 않습니다. 따라서 같은 새 텍스트를 동시에 요청한 두 호출자가 모두
//! `prepare`를 호출할 수 있고, 마지막에 저장한 handle이 남습니다 (at-least-once).

use crate::error::CqxResult;
use crate::transport::{PreparedStatement, Transport};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

/// Text-keyed cache of prepared handles
pub struct PreparedStatementCache {
    transport: Arc<dyn Transport>,
    statements: DashMap<String, Arc<PreparedStatement>, RandomState>,
}

impl PreparedStatementCache {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            statements: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Returns the handle for `cql`, preparing it on first use.
    ///
    /// Transport errors propagate and leave the cache unchanged.
    pub fn prepared(&self, cql: &str) -> CqxResult<Arc<PreparedStatement>> {
        if let Some(handle) = self.statements.get(cql) {
            trace!(cql, "prepared statement cache hit");
            return Ok(Arc::clone(handle.value()));
        }

        trace!(cql, "prepared statement cache miss");
        let handle = Arc::new(self.transport.prepare(cql)?);
        self.statements.insert(cql.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Cached handle for `cql`, without preparing
    pub fn get(&self, cql: &str) -> Option<Arc<PreparedStatement>> {
        self.statements.get(cql).map(|handle| Arc::clone(handle.value()))
    }

    /// Discards every handle, e.g. after a schema change made them stale
    pub fn reset(&self) {
        self.statements.clear();
    }

    pub fn size(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl std::fmt::Debug for PreparedStatementCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatementCache")
            .field("size", &self.size())
            .finish()
    }
}
