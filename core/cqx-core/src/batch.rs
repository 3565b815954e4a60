//! Batch — 여러 쓰기 문장을 한 번의 네트워크 호출로 전송
//!
//! # 상태
//!
//! ```text
//! Empty ──execute──▶ Accumulating ──apply (성공)──▶ Empty
//!                        │  ▲
//!                        └──┘ apply 실패: 큐 유지, 콜백 미실행
//! ```
//!
//! - 배치의 consistency는 생성 시 고정되며, 다른 consistency를 요구하는 문장은 거부됩니다.
//! - 문장이 1개면 단일 실행 경로, 2개 이상이면 배치 실행 경로로 전송합니다.
//! - `auto_apply`가 설정되면 큐 길이가 임계값에 도달하는 즉시 flush합니다.

use crate::consistency::Consistency;
use crate::error::{CqxError, CqxResult};
use crate::keyspace::Keyspace;
use crate::options::{BatchOptions, WriteOptions};
use crate::statement::Statement;
use crate::transport::BatchExecuteOptions;
use tracing::{instrument, trace, warn};

/// Zero-argument hook run after a successful flush
pub type CompletionHook = Box<dyn FnOnce() + Send>;

/// Client-side queue of write statements
pub struct Batch<'k> {
    keyspace: &'k Keyspace,
    auto_apply: Option<usize>,
    logged: bool,
    prepared: bool,
    consistency: Consistency,
    statements: Vec<Statement>,
    on_complete_hooks: Vec<CompletionHook>,
}

impl<'k> Batch<'k> {
    pub(crate) fn new(keyspace: &'k Keyspace, options: BatchOptions) -> CqxResult<Self> {
        options.validate()?;
        Ok(Self {
            keyspace,
            auto_apply: options.auto_apply,
            logged: !options.unlogged,
            prepared: options.prepared.unwrap_or(keyspace.config().prepared),
            consistency: options
                .consistency
                .unwrap_or_else(|| keyspace.default_consistency()),
            statements: Vec::new(),
            on_complete_hooks: Vec::new(),
        })
    }

    /// Queues a statement, flushing if the auto-apply threshold is reached.
    pub fn execute(&mut self, statement: Statement) -> CqxResult<()> {
        trace!(cql = statement.cql(), queued = self.statements.len() + 1, "batching statement");
        self.statements.push(statement);
        if let Some(threshold) = self.auto_apply
            && self.statements.len() >= threshold
        {
            self.apply()?;
        }
        Ok(())
    }

    /// Queues a statement after checking its consistency.
    ///
    /// `None` inherits the batch's consistency. A different level is rejected and
    /// the queue is left untouched.
    pub fn execute_with_consistency(
        &mut self,
        statement: Statement,
        consistency: Option<Consistency>,
    ) -> CqxResult<()> {
        self.check_consistency(consistency)?;
        self.execute(statement)
    }

    /// Like [`Batch::execute_with_consistency`], reading the level from `options`.
    ///
    /// The per-statement `prepared` flag is ignored; the batch decides.
    pub fn execute_with_options(&mut self, statement: Statement, options: WriteOptions) -> CqxResult<()> {
        self.execute_with_consistency(statement, options.consistency)
    }

    /// Sends every queued statement.
    ///
    /// No-op when empty. On success runs the completion hooks in registration
    /// order and resets the batch; on failure nothing is cleared, so the same
    /// flush can be retried.
    #[instrument(skip(self), fields(statements = self.statements.len(), logged = self.logged))]
    pub fn apply(&mut self) -> CqxResult<()> {
        let result = match self.statements.as_slice() {
            [] => return Ok(()),
            [statement] => self
                .keyspace
                .execute_with_options(
                    statement,
                    WriteOptions {
                        consistency: Some(self.consistency),
                        prepared: Some(self.prepared),
                    },
                )
                .map(|_| ()),
            statements => self
                .keyspace
                .execute_batch(
                    statements,
                    BatchExecuteOptions {
                        consistency: self.consistency,
                        logged: self.logged,
                    },
                    self.prepared,
                )
                .map(|_| ()),
        };

        if let Err(err) = result {
            warn!(error = %err, queued = self.statements.len(), "batch flush failed");
            return Err(err);
        }

        for hook in self.on_complete_hooks.drain(..) {
            hook();
        }
        self.statements.clear();
        Ok(())
    }

    /// Removes the queued statements without sending them; hooks are dropped
    pub(crate) fn take_statements(&mut self) -> Vec<Statement> {
        self.on_complete_hooks.clear();
        std::mem::take(&mut self.statements)
    }

    /// Registers a hook for the next successful flush
    pub fn on_complete<F>(&mut self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_complete_hooks.push(Box::new(hook));
    }

    pub fn is_logged(&self) -> bool {
        self.logged
    }

    pub fn is_unlogged(&self) -> bool {
        !self.logged
    }

    pub fn consistency(&self) -> Consistency {
        self.consistency
    }

    pub fn keyspace(&self) -> &'k Keyspace {
        self.keyspace
    }

    /// Queued statement count
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    fn check_consistency(&self, requested: Option<Consistency>) -> CqxResult<()> {
        match requested {
            Some(requested) if requested != self.consistency => {
                warn!(%requested, batch = %self.consistency, "consistency conflict in batch");
                Err(CqxError::ConsistencyConflict {
                    requested,
                    batch: self.consistency,
                })
            }
            _ => Ok(()),
        }
    }
}

impl Drop for Batch<'_> {
    fn drop(&mut self) {
        if !self.statements.is_empty() {
            warn!(
                discarded = self.statements.len(),
                "batch dropped with unapplied statements"
            );
        }
    }
}

impl std::fmt::Debug for Batch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("consistency", &self.consistency)
            .field("logged", &self.logged)
            .field("prepared", &self.prepared)
            .field("auto_apply", &self.auto_apply)
            .field("statements", &self.statements.len())
            .field("on_complete_hooks", &self.on_complete_hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyspaceConfig;
    use crate::transport::{RecordedCall, RecordingTransport};
    use crate::value::CqlValue;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn keyspace() -> (Arc<RecordingTransport>, Keyspace) {
        let transport = Arc::new(RecordingTransport::new());
        let keyspace = Keyspace::new(
            transport.clone(),
            KeyspaceConfig::new().with_default_consistency(Consistency::Quorum),
        );
        (transport, keyspace)
    }

    fn insert(id: i32) -> Statement {
        Statement::with_values("INSERT INTO posts (id) VALUES (?)", vec![CqlValue::Int(id)])
    }

    #[test]
    fn test_defaults_from_keyspace() {
        let (_transport, keyspace) = keyspace();
        let batch = keyspace.begin_batch(BatchOptions::new()).unwrap();
        assert_eq!(batch.consistency(), Consistency::Quorum);
        assert!(batch.is_logged());
        assert!(!batch.is_unlogged());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_unlogged_flag() {
        let (_transport, keyspace) = keyspace();
        let batch = keyspace
            .begin_batch(BatchOptions::new().with_unlogged(true))
            .unwrap();
        assert!(batch.is_unlogged());
        assert!(!batch.is_logged());
    }

    #[test]
    fn test_apply_on_empty_batch_is_noop() {
        let (transport, keyspace) = keyspace();
        let mut batch = keyspace.begin_batch(BatchOptions::new()).unwrap();
        batch.apply().unwrap();
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_single_statement_uses_direct_path() {
        let (transport, keyspace) = keyspace();
        let mut batch = keyspace.begin_batch(BatchOptions::new()).unwrap();
        batch.execute(insert(1)).unwrap();
        batch.apply().unwrap();

        let calls = transport.executions();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            RecordedCall::Statement { options, .. } => {
                assert_eq!(options.consistency, Consistency::Quorum)
            }
            other => panic!("expected single statement, got {other:?}"),
        }
        assert!(batch.is_empty());
    }

    #[test]
    fn test_multiple_statements_use_batch_path() {
        let (transport, keyspace) = keyspace();
        let mut batch = keyspace
            .begin_batch(
                BatchOptions::new()
                    .with_unlogged(true)
                    .with_consistency(Consistency::One),
            )
            .unwrap();
        batch.execute(insert(1)).unwrap();
        batch.execute(insert(2)).unwrap();
        batch.apply().unwrap();

        let calls = transport.executions();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            RecordedCall::Batch { statements, options } => {
                assert_eq!(statements.len(), 2);
                assert_eq!(statements[0].statement, insert(1));
                assert_eq!(statements[1].statement, insert(2));
                assert!(!options.logged);
                assert_eq!(options.consistency, Consistency::One);
            }
            other => panic!("expected batch, got {other:?}"),
        }
    }

    #[test]
    fn test_consistency_conflict_leaves_queue_unchanged() {
        let (_transport, keyspace) = keyspace();
        let mut batch = keyspace.begin_batch(BatchOptions::new()).unwrap();
        batch.execute(insert(1)).unwrap();

        let err = batch
            .execute_with_consistency(insert(2), Some(Consistency::One))
            .unwrap_err();
        assert!(matches!(
            err,
            CqxError::ConsistencyConflict {
                requested: Consistency::One,
                batch: Consistency::Quorum,
            }
        ));
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_matching_or_absent_consistency_is_accepted() {
        let (_transport, keyspace) = keyspace();
        let mut batch = keyspace.begin_batch(BatchOptions::new()).unwrap();
        batch
            .execute_with_consistency(insert(1), Some(Consistency::Quorum))
            .unwrap();
        batch.execute_with_consistency(insert(2), None).unwrap();
        batch
            .execute_with_options(insert(3), WriteOptions::default())
            .unwrap();
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_execute_with_options_checks_consistency() {
        let (_transport, keyspace) = keyspace();
        let mut batch = keyspace.begin_batch(BatchOptions::new()).unwrap();
        let result = batch.execute_with_options(
            insert(1),
            WriteOptions {
                consistency: Some(Consistency::All),
                prepared: None,
            },
        );
        assert!(result.is_err());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_auto_apply_flushes_at_threshold() {
        let (transport, keyspace) = keyspace();
        let mut batch = keyspace
            .begin_batch(BatchOptions::new().with_auto_apply(3))
            .unwrap();
        batch.execute(insert(1)).unwrap();
        batch.execute(insert(2)).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(transport.executions().is_empty());

        batch.execute(insert(3)).unwrap();
        assert_eq!(batch.len(), 0);
        assert_eq!(transport.executions().len(), 1);
    }

    #[test]
    fn test_auto_apply_of_one_sends_each_statement() {
        let (transport, keyspace) = keyspace();
        let mut batch = keyspace
            .begin_batch(BatchOptions::new().with_auto_apply(1))
            .unwrap();
        batch.execute(insert(1)).unwrap();
        batch.execute(insert(2)).unwrap();
        let calls = transport.executions();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| matches!(c, RecordedCall::Statement { .. })));
    }

    #[test]
    fn test_hooks_run_in_order_once() {
        let (_transport, keyspace) = keyspace();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut batch = keyspace.begin_batch(BatchOptions::new()).unwrap();
        for i in 0..3 {
            let order = Arc::clone(&order);
            batch.on_complete(move || order.lock().push(i));
        }
        batch.execute(insert(1)).unwrap();
        batch.apply().unwrap();
        assert_eq!(*order.lock(), vec![0, 1, 2]);

        // hooks were consumed by the first flush
        batch.execute(insert(2)).unwrap();
        batch.apply().unwrap();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_failed_flush_keeps_queue_and_skips_hooks() {
        let (transport, keyspace) = keyspace();
        let fired = Arc::new(AtomicUsize::new(0));
        let mut batch = keyspace.begin_batch(BatchOptions::new()).unwrap();
        let counter = Arc::clone(&fired);
        batch.on_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        batch.execute(insert(1)).unwrap();
        batch.execute(insert(2)).unwrap();

        transport.fail_next(1);
        let err = batch.apply().unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(batch.len(), 2);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        batch.apply().unwrap();
        assert_eq!(batch.len(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let (_transport, keyspace) = keyspace();
        let err = keyspace
            .begin_batch(BatchOptions::new().with_auto_apply(0))
            .unwrap_err();
        assert!(matches!(err, CqxError::InvalidOption(_)));
    }

    #[test]
    fn test_prepared_batch_passes_handles() {
        let (transport, keyspace) = keyspace();
        let mut batch = keyspace
            .begin_batch(BatchOptions::new().with_prepared(true))
            .unwrap();
        batch.execute(insert(1)).unwrap();
        batch.execute(insert(2)).unwrap();
        batch.apply().unwrap();

        assert_eq!(transport.prepare_count(), 1);
        assert_eq!(keyspace.prepared_statements().size(), 1);
    }
}
