//! `DELETE` 문장
//!
//! 대상이 없으면 행 전체를 삭제합니다. 삭제에는 TTL이 의미가 없으므로 거부하고,
//! timestamp만 `USING TIMESTAMP ?`로 씁니다.

use super::{Restrictions, Table, Writer};
use crate::error::{CqxError, CqxResult};
use crate::options::UpsertOptions;
use crate::statement::{Statement, validate_identifier};
use crate::value::{CqlValue, IntoCqlValue, micros_since_epoch};

#[derive(Debug, Clone, PartialEq)]
enum Target {
    Column(String),
    Element { column: String, key: CqlValue },
}

/// Builds and runs one `DELETE`
#[derive(Debug, Clone)]
pub struct Deleter<'k> {
    table: Table<'k>,
    targets: Vec<Target>,
    restrictions: Restrictions,
}

impl<'k> Deleter<'k> {
    pub(crate) fn new(table: Table<'k>) -> Self {
        Self {
            table,
            targets: Vec::new(),
            restrictions: Restrictions::default(),
        }
    }

    /// Deletes only these columns instead of the whole row
    pub fn columns<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        for column in columns {
            self.target(Target::Column(column.into()));
        }
        self
    }

    /// Deletes one list index or map key
    pub fn element(&mut self, column: impl Into<String>, key: impl IntoCqlValue) -> &mut Self {
        self.target(Target::Element {
            column: column.into(),
            key: key.into_cql(),
        })
    }

    pub fn filter(&mut self, column: impl Into<String>, value: impl IntoCqlValue) -> &mut Self {
        self.restrictions.restrict(column, value);
        self
    }

    fn target(&mut self, target: Target) -> &mut Self {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
        self
    }
}

impl Writer for Deleter<'_> {
    fn table(&self) -> &Table<'_> {
        &self.table
    }

    fn statement(&self, options: &UpsertOptions) -> CqxResult<Statement> {
        if options.ttl.is_some() {
            return Err(CqxError::InvalidOption(
                "ttl is not supported on delete".to_string(),
            ));
        }
        let context = format!("Deleter::statement({})", self.table.name());
        let (restriction, restriction_values) = self.restrictions.where_clause(&context)?;

        let mut fragments = Vec::with_capacity(self.targets.len());
        let mut keys = Vec::new();
        for target in &self.targets {
            match target {
                Target::Column(column) => {
                    validate_identifier(column, &context)?;
                    fragments.push(column.clone());
                }
                Target::Element { column, key } => {
                    validate_identifier(column, &context)?;
                    fragments.push(format!("{column}[?]"));
                    keys.push(key.clone());
                }
            }
        }

        let table = self.table.qualified_name()?;
        let mut statement = Statement::new();
        statement.append("DELETE", []);
        if !fragments.is_empty() {
            statement.append(&format!(" {}", fragments.join(", ")), keys);
        }
        statement.append(&format!(" FROM {table}"), []);
        if let Some(timestamp) = options.timestamp {
            statement.append(
                " USING TIMESTAMP ?",
                [CqlValue::BigInt(micros_since_epoch(timestamp))],
            );
        }
        statement.append(&restriction, restriction_values);
        Ok(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyspaceConfig;
    use crate::consistency::Consistency;
    use crate::keyspace::Keyspace;
    use crate::options::BatchOptions;
    use crate::transport::RecordingTransport;
    use std::sync::Arc;
    use std::time::{Duration, UNIX_EPOCH};

    fn keyspace() -> (Arc<RecordingTransport>, Keyspace) {
        let transport = Arc::new(RecordingTransport::new());
        let keyspace = Keyspace::new(transport.clone(), KeyspaceConfig::default());
        (transport, keyspace)
    }

    #[test]
    fn test_delete_whole_row() {
        let (_transport, keyspace) = keyspace();
        let mut deleter = keyspace.table("posts").deleter();
        deleter.filter("id", 1);

        let statement = deleter.statement(&UpsertOptions::new()).unwrap();
        assert_eq!(statement.cql(), "DELETE FROM posts WHERE id = ?");
        assert_eq!(statement.bound_values(), &[CqlValue::Int(1)]);
    }

    #[test]
    fn test_delete_columns_and_elements() {
        let (_transport, keyspace) = keyspace();
        let mut deleter = keyspace.table("posts").deleter();
        deleter
            .columns(["title", "body", "title"])
            .element("scores", "alice")
            .filter("id", 1);

        let statement = deleter
            .statement(&UpsertOptions::new().with_timestamp(UNIX_EPOCH + Duration::from_micros(42)))
            .unwrap();
        assert_eq!(
            statement.cql(),
            "DELETE title, body, scores[?] FROM posts USING TIMESTAMP ? WHERE id = ?"
        );
        assert_eq!(
            statement.bound_values(),
            &[
                CqlValue::Text("alice".to_string()),
                CqlValue::BigInt(42),
                CqlValue::Int(1),
            ]
        );
        assert_eq!(statement.placeholder_count(), statement.bound_values().len());
    }

    #[test]
    fn test_hostile_target_is_rejected() {
        let (_transport, keyspace) = keyspace();
        let mut deleter = keyspace.table("posts").deleter();
        deleter.columns(["title FROM posts; --"]).filter("id", 1);
        assert!(matches!(
            deleter.statement(&UpsertOptions::new()),
            Err(CqxError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_ttl_is_rejected() {
        let (_transport, keyspace) = keyspace();
        let mut deleter = keyspace.table("posts").deleter();
        deleter.filter("id", 1);

        let err = deleter
            .statement(&UpsertOptions::new().with_ttl(10))
            .unwrap_err();
        assert!(matches!(err, CqxError::InvalidOption(_)));
    }

    #[test]
    fn test_restriction_required() {
        let (transport, keyspace) = keyspace();
        let err = keyspace
            .table("posts")
            .deleter()
            .columns(["title"])
            .execute(UpsertOptions::new())
            .unwrap_err();
        assert!(matches!(err, CqxError::InvalidOperation { .. }));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_delete_joins_batch() {
        let (transport, keyspace) = keyspace();
        let mut batch = keyspace
            .begin_batch(BatchOptions::new().with_consistency(Consistency::All))
            .unwrap();
        let posts = keyspace.table("posts").consistency(Consistency::All);
        posts
            .deleter()
            .filter("id", 1)
            .execute_in(&mut batch, UpsertOptions::new())
            .unwrap();
        posts
            .deleter()
            .filter("id", 2)
            .execute_in(&mut batch, UpsertOptions::new())
            .unwrap();

        assert_eq!(batch.len(), 2);
        batch.apply().unwrap();
        assert_eq!(transport.executions().len(), 1);
    }
}
