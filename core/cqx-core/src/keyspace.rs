//! Entry point of the write path
//!
//! 하나의 transport 연결과 키스페이스 설정, prepared statement 캐시를 소유합니다.
//! Writer와 Batch는 모두 `Keyspace`를 빌려서 생성되며, 열린 배치는 암묵적인 전역
//! 상태가 아니라 호출자가 명시적으로 넘깁니다.
//!
//! # 예제
//!
//! ```rust
//! use cqx_core::{BatchOptions, Keyspace, KeyspaceConfig, UpsertOptions, Writer};
//! use cqx_core::transport::RecordingTransport;
//! use std::sync::Arc;
//!
//! # fn main() -> cqx_core::CqxResult<()> {
//! let transport = Arc::new(RecordingTransport::new());
//! let keyspace = Keyspace::new(transport.clone(), KeyspaceConfig::default());
//!
//! keyspace.batch(BatchOptions::new().with_unlogged(true), |batch| {
//!     let posts = keyspace.table("posts");
//!     posts.inserter().column("id", 1).column("title", "a").execute_in(batch, UpsertOptions::new())?;
//!     posts.inserter().column("id", 2).column("title", "b").execute_in(batch, UpsertOptions::new())
//! })?;
//!
//! assert_eq!(transport.executions().len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::batch::Batch;
use crate::config::KeyspaceConfig;
use crate::consistency::Consistency;
use crate::error::{CqxError, CqxResult};
use crate::options::{BatchOptions, WriteOptions};
use crate::prepared::PreparedStatementCache;
use crate::statement::Statement;
use crate::transport::{BatchExecuteOptions, BatchStatement, ExecuteOptions, QueryResult, Transport};
use crate::writer::Table;
use std::sync::Arc;
use tracing::debug;

/// Client handle for one keyspace
pub struct Keyspace {
    transport: Arc<dyn Transport>,
    config: KeyspaceConfig,
    prepared_statements: PreparedStatementCache,
}

impl Keyspace {
    pub fn new(transport: Arc<dyn Transport>, config: KeyspaceConfig) -> Self {
        let prepared_statements = PreparedStatementCache::new(Arc::clone(&transport));
        Self {
            transport,
            config,
            prepared_statements,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    pub fn config(&self) -> &KeyspaceConfig {
        &self.config
    }

    pub fn default_consistency(&self) -> Consistency {
        self.config.default_consistency
    }

    pub fn prepared_statements(&self) -> &PreparedStatementCache {
        &self.prepared_statements
    }

    /// Write target for `table`
    pub fn table(&self, table: impl Into<String>) -> Table<'_> {
        Table::new(self, table.into())
    }

    /// Opens a batch; the caller must `apply` it.
    pub fn begin_batch(&self, options: BatchOptions) -> CqxResult<Batch<'_>> {
        Batch::new(self, options)
    }

    /// Runs `f` against a fresh batch and applies it once `f` succeeds.
    ///
    /// An error from `f` propagates without flushing; the queued statements are
    /// discarded with the batch. A failed flush returns
    /// [`CqxError::BatchNotApplied`] carrying the unsent statements, which can be
    /// queued into a new batch to retry.
    pub fn batch<T, F>(&self, options: BatchOptions, f: F) -> CqxResult<T>
    where
        F: FnOnce(&mut Batch<'_>) -> CqxResult<T>,
    {
        let mut batch = self.begin_batch(options)?;
        let value = f(&mut batch)?;
        if let Err(source) = batch.apply() {
            return Err(CqxError::BatchNotApplied {
                source: Box::new(source),
                unsent: batch.take_statements(),
            });
        }
        Ok(value)
    }

    /// Executes one statement with keyspace defaults
    pub fn execute(&self, statement: &Statement) -> CqxResult<QueryResult> {
        self.execute_with_options(statement, WriteOptions::default())
    }

    /// Executes one statement directly, outside any batch
    pub fn execute_with_options(
        &self,
        statement: &Statement,
        options: WriteOptions,
    ) -> CqxResult<QueryResult> {
        let consistency = options.consistency.unwrap_or(self.config.default_consistency);
        let prepared = options.prepared.unwrap_or(self.config.prepared);
        debug!(
            cql = statement.cql(),
            values = statement.bound_values().len(),
            %consistency,
            prepared,
            "executing statement"
        );

        let handle = if prepared {
            Some(self.prepared_statements.prepared(statement.cql())?)
        } else {
            None
        };
        self.transport.execute_statement(
            statement.cql(),
            statement.bound_values(),
            &ExecuteOptions {
                consistency,
                prepared: handle,
            },
        )
    }

    /// Sends all `statements` in one batch call
    pub fn execute_batch(
        &self,
        statements: &[Statement],
        options: BatchExecuteOptions,
        prepared: bool,
    ) -> CqxResult<QueryResult> {
        debug!(
            statements = statements.len(),
            consistency = %options.consistency,
            logged = options.logged,
            prepared,
            "executing batch"
        );

        let entries = statements
            .iter()
            .map(|statement| {
                let handle = if prepared {
                    Some(self.prepared_statements.prepared(statement.cql())?)
                } else {
                    None
                };
                Ok(BatchStatement {
                    statement: statement.clone(),
                    prepared: handle,
                })
            })
            .collect::<CqxResult<Vec<_>>>()?;
        self.transport.execute_batch(&entries, &options)
    }
}

impl std::fmt::Debug for Keyspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyspace")
            .field("config", &self.config)
            .field("prepared_statements", &self.prepared_statements)
            .finish()
    }
}
