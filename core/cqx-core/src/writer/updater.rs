//! `UPDATE` 문장
//!
//! SET 절은 컬럼 연산([`ColumnValue`])과 원소 단위 대입(`col[?] = ?`)을 등록 순서대로
//! 나열합니다. 바인드 값 순서는 `[timestamp, ttl, SET 값..., WHERE 값...]`으로
//! 문장 텍스트의 플레이스홀더 순서와 정확히 일치합니다.

use super::{Restrictions, Table, Writer};
use crate::encoder::{Collection, ColumnValue, EncodeTarget, encode};
use crate::error::{CqxError, CqxResult};
use crate::options::UpsertOptions;
use crate::statement::{Statement, validate_identifier};
use crate::value::{CqlValue, IntoCqlValue};

#[derive(Debug, Clone, PartialEq)]
enum Assignment {
    Column(ColumnValue),
    Element { key: CqlValue, value: CqlValue },
}

/// Builds and runs one `UPDATE`
#[derive(Debug, Clone)]
pub struct Updater<'k> {
    table: Table<'k>,
    assignments: Vec<(String, Assignment)>,
    restrictions: Restrictions,
}

impl<'k> Updater<'k> {
    pub(crate) fn new(table: Table<'k>) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            restrictions: Restrictions::default(),
        }
    }

    /// Sets a column; a [`Collection`] replaces the whole collection
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<ColumnValue>) -> &mut Self {
        self.assign(column.into(), Assignment::Column(value.into()))
    }

    /// Merges every `(column, value)` pair, last value wins
    pub fn update<I, K, V>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ColumnValue>,
    {
        for (column, value) in data {
            self.set(column, value);
        }
        self
    }

    pub fn increment(&mut self, column: impl Into<String>, delta: i64) -> &mut Self {
        self.set(column, ColumnValue::Counter(delta))
    }

    pub fn decrement(&mut self, column: impl Into<String>, delta: i64) -> &mut Self {
        self.set(column, ColumnValue::Counter(delta.saturating_neg()))
    }

    pub fn append(&mut self, column: impl Into<String>, elements: Collection) -> &mut Self {
        self.set(column, ColumnValue::Append(elements))
    }

    /// List only
    pub fn prepend(&mut self, column: impl Into<String>, elements: Collection) -> &mut Self {
        self.set(column, ColumnValue::Prepend(elements))
    }

    /// Removes elements; for a map, the keys of `elements`
    pub fn remove(&mut self, column: impl Into<String>, elements: Collection) -> &mut Self {
        self.set(column, ColumnValue::Remove(elements))
    }

    pub fn replace(&mut self, column: impl Into<String>, collection: Collection) -> &mut Self {
        self.set(column, ColumnValue::Replace(collection))
    }

    /// `column[key] = value` for a list index or map key
    pub fn set_element(
        &mut self,
        column: impl Into<String>,
        key: impl IntoCqlValue,
        value: impl IntoCqlValue,
    ) -> &mut Self {
        self.assign(
            column.into(),
            Assignment::Element {
                key: key.into_cql(),
                value: value.into_cql(),
            },
        )
    }

    /// Adds a `column = ?` restriction to the WHERE clause
    pub fn filter(&mut self, column: impl Into<String>, value: impl IntoCqlValue) -> &mut Self {
        self.restrictions.restrict(column, value);
        self
    }

    fn assign(&mut self, column: String, assignment: Assignment) -> &mut Self {
        let existing = self.assignments.iter_mut().find(|(name, current)| {
            *name == column
                && match (current, &assignment) {
                    (Assignment::Column(_), Assignment::Column(_)) => true,
                    (Assignment::Element { key: a, .. }, Assignment::Element { key: b, .. }) => a == b,
                    _ => false,
                }
        });
        match existing {
            Some((_, current)) => *current = assignment,
            None => self.assignments.push((column, assignment)),
        }
        self
    }
}

impl Writer for Updater<'_> {
    fn table(&self) -> &Table<'_> {
        &self.table
    }

    fn statement(&self, options: &UpsertOptions) -> CqxResult<Statement> {
        let context = format!("Updater::statement({})", self.table.name());
        if self.assignments.is_empty() {
            return Err(CqxError::InvalidOperation {
                message: "no columns to update".to_string(),
                context,
            });
        }
        options.validate()?;
        let (restriction, restriction_values) = self.restrictions.where_clause(&context)?;

        let mut fragments = Vec::with_capacity(self.assignments.len());
        let mut values = Vec::with_capacity(self.assignments.len());
        for (column, assignment) in &self.assignments {
            match assignment {
                Assignment::Column(value) => {
                    let encoded = encode(column, value, EncodeTarget::Assignment)?;
                    fragments.push(encoded.fragment);
                    values.extend(encoded.values);
                }
                Assignment::Element { key, value } => {
                    validate_identifier(column, &context)?;
                    fragments.push(format!("{column}[?] = ?"));
                    values.push(key.clone());
                    values.push(value.clone());
                }
            }
        }

        let table = self.table.qualified_name()?;
        let (using, using_values) = options.using_clause();
        let mut statement = Statement::new();
        statement
            .append(&format!("UPDATE {table}{using}"), using_values)
            .append(&format!(" SET {}", fragments.join(", ")), values)
            .append(&restriction, restriction_values);
        Ok(statement)
    }
}
