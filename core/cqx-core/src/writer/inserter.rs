//! Inserter — `INSERT` 문장
//!
//! 같은 인스턴스에 여러 번 `insert`하면 컬럼 맵이 병합됩니다 (컬럼별 마지막 값 우선).
//! 바인드 값 순서는 `[timestamp, ttl, 행 값...]`입니다.

use super::{Row, Table, Writer};
use crate::encoder::{ColumnValue, EncodeTarget, encode};
use crate::error::{CqxError, CqxResult};
use crate::options::UpsertOptions;
use crate::statement::Statement;

/// Builds and runs one `INSERT`
///
/// With TTL or timestamp set, the `USING` placeholders come last in the text
/// while their values come first in [`Statement::bound_values`]. Transports
/// binding strictly by position must move the leading using values to the end.
#[derive(Debug, Clone)]
pub struct Inserter<'k> {
    table: Table<'k>,
    row: Row,
}

impl<'k> Inserter<'k> {
    pub(crate) fn new(table: Table<'k>) -> Self {
        Self {
            table,
            row: Row::default(),
        }
    }

    /// Merges `data` into the row
    pub fn insert<I, K, V>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ColumnValue>,
    {
        for (column, value) in data {
            self.row.merge(column.into(), value.into());
        }
        self
    }

    /// Merges a single column
    pub fn column(&mut self, column: impl Into<String>, value: impl Into<ColumnValue>) -> &mut Self {
        self.row.merge(column.into(), value.into());
        self
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.row.iter().map(|(name, _)| name).collect()
    }
}

impl Writer for Inserter<'_> {
    fn table(&self) -> &Table<'_> {
        &self.table
    }

    fn statement(&self, options: &UpsertOptions) -> CqxResult<Statement> {
        if self.row.is_empty() {
            return Err(CqxError::InvalidOperation {
                message: "no columns to insert".to_string(),
                context: format!("Inserter::statement({})", self.table.name()),
            });
        }
        options.validate()?;

        let mut columns = Vec::with_capacity(self.row.len());
        let mut fragments = Vec::with_capacity(self.row.len());
        let mut values = Vec::with_capacity(self.row.len());
        for (column, value) in self.row.iter() {
            let encoded = encode(column, value, EncodeTarget::Values)?;
            columns.push(column);
            fragments.push(encoded.fragment);
            values.extend(encoded.values);
        }

        let table = self.table.qualified_name()?;
        let (using, using_values) = options.using_clause();
        let mut statement = Statement::new();
        statement
            .append(&format!("INSERT INTO {table}"), [])
            .append(
                &format!(" ({}) VALUES ({})", columns.join(", "), fragments.join(", ")),
                values,
            )
            .append(&using, []);
        statement.prepend_values(using_values);
        Ok(statement)
    }
}
