//! Writers — 단일 행 변경을 CQL 문장으로 만들어 실행
//!
//! - [`Inserter`] — `INSERT INTO ... VALUES ...`
//! - [`Updater`] — `UPDATE ... SET ... WHERE ...`
//! - [`Deleter`] — `DELETE ... FROM ... WHERE ...`
//!
//! 모든 writer는 [`Table`]에서 생성되고, [`Writer::execute`]로 바로 실행하거나
//! [`Writer::execute_in`]으로 열린 배치에 넣습니다.

pub mod deleter;
pub mod inserter;
pub mod updater;

pub use deleter::Deleter;
pub use inserter::Inserter;
pub use updater::Updater;

use crate::batch::Batch;
use crate::consistency::Consistency;
use crate::encoder::ColumnValue;
use crate::error::{CqxError, CqxResult};
use crate::keyspace::Keyspace;
use crate::options::{UpsertOptions, WriteOptions};
use crate::statement::{Statement, validate_identifier};
use crate::value::{CqlValue, IntoCqlValue};
use ahash::RandomState;
use std::collections::HashMap;

/// Write target: one table of one keyspace
#[derive(Debug, Clone)]
pub struct Table<'k> {
    keyspace: &'k Keyspace,
    name: String,
    consistency: Option<Consistency>,
    prepared: Option<bool>,
}

impl<'k> Table<'k> {
    pub(crate) fn new(keyspace: &'k Keyspace, name: String) -> Self {
        Self {
            keyspace,
            name,
            consistency: None,
            prepared: None,
        }
    }

    /// Consistency for writes through this handle, unless a write overrides it
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    /// Prepared flag for writes through this handle, unless a write overrides it
    pub fn prepared(mut self, prepared: bool) -> Self {
        self.prepared = Some(prepared);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table name qualified with the keyspace name, when configured.
    ///
    /// Each dot-separated part must be a valid identifier.
    pub fn qualified_name(&self) -> CqxResult<String> {
        let qualified = self.keyspace.config().qualify(&self.name);
        let context = format!("Table::qualified_name({})", self.name);
        for part in qualified.split('.') {
            validate_identifier(part, &context)?;
        }
        Ok(qualified)
    }

    pub fn keyspace(&self) -> &'k Keyspace {
        self.keyspace
    }

    pub fn inserter(&self) -> Inserter<'k> {
        Inserter::new(self.clone())
    }

    pub fn updater(&self) -> Updater<'k> {
        Updater::new(self.clone())
    }

    pub fn deleter(&self) -> Deleter<'k> {
        Deleter::new(self.clone())
    }

    /// Per-write options, falling back to this table's overrides
    fn resolve(&self, options: &UpsertOptions) -> WriteOptions {
        let requested = options.write_options();
        WriteOptions {
            consistency: requested.consistency.or(self.consistency),
            prepared: requested.prepared.or(self.prepared),
        }
    }
}

/// Common behaviour of the writer family
pub trait Writer {
    /// Target table
    fn table(&self) -> &Table<'_>;

    /// Builds the statement without sending it
    fn statement(&self, options: &UpsertOptions) -> CqxResult<Statement>;

    /// Executes directly through the keyspace
    fn execute(&self, options: UpsertOptions) -> CqxResult<()> {
        let statement = self.statement(&options)?;
        let table = self.table();
        table
            .keyspace
            .execute_with_options(&statement, table.resolve(&options))?;
        Ok(())
    }

    /// Queues into `batch`; the write's consistency must agree with the batch
    fn execute_in(&self, batch: &mut Batch<'_>, options: UpsertOptions) -> CqxResult<()> {
        let statement = self.statement(&options)?;
        batch.execute_with_options(statement, self.table().resolve(&options))
    }
}

/// Insertion-ordered column map, last value wins per column
#[derive(Debug, Clone)]
pub(crate) struct Columns<V> {
    entries: Vec<(String, V)>,
    positions: HashMap<String, usize, RandomState>,
}

impl<V> Default for Columns<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::default(),
        }
    }
}

impl<V> Columns<V> {
    pub(crate) fn merge(&mut self, column: String, value: V) {
        match self.positions.get(&column) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.positions.insert(column.clone(), self.entries.len());
                self.entries.push((column, value));
            }
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Equality restrictions of a `WHERE` clause
pub(crate) type Restrictions = Columns<CqlValue>;

impl Restrictions {
    /// ` WHERE a = ? AND b = ?` and its values; errors when empty
    pub(crate) fn where_clause(&self, context: &str) -> CqxResult<(String, Vec<CqlValue>)> {
        if self.is_empty() {
            return Err(CqxError::InvalidOperation {
                message: "row restriction required".to_string(),
                context: context.to_string(),
            });
        }
        let mut conditions = Vec::with_capacity(self.len());
        for (column, _) in self.iter() {
            validate_identifier(column, context)?;
            conditions.push(format!("{column} = ?"));
        }
        let values = self.iter().map(|(_, value)| value.clone()).collect();
        Ok((format!(" WHERE {}", conditions.join(" AND ")), values))
    }

    pub(crate) fn restrict(&mut self, column: impl Into<String>, value: impl IntoCqlValue) {
        self.merge(column.into(), value.into_cql());
    }
}

pub(crate) type Row = Columns<ColumnValue>;
