//! Value Encoder — 컬럼 값 → (CQL 조각, 바인드 값)
//!
//! 값의 런타임 형태를 추측하지 않고, 명시적인 태그([`ColumnValue`])로
//! 인코딩 방식을 결정합니다. 하나의 컬럼마다 한 번 호출되며 부수 효과가 없습니다.
//!
//! | 태그 | VALUES 위치 | SET 위치 |
//! |---|---|---|
//! | `Plain` | `?` | `col = ?` |
//! | `Counter` | 오류 | `col = col + ?` / `col = col - ?` |
//! | `Replace` | 컬렉션 리터럴 | `col = <literal>` |
//! | `Append` | 오류 | `col = col + <literal>` |
//! | `Prepend` | 오류 | `col = <literal> + col` (list 전용) |
//! | `Remove` | 오류 | `col = col - <literal>` (map은 키 집합) |

use crate::error::{CqxError, CqxResult};
use crate::statement::validate_identifier;
use crate::value::{CqlValue, IntoCqlValue};
use smallvec::SmallVec;

/// Collection payload for collection-typed column operations
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    List(Vec<CqlValue>),
    Set(Vec<CqlValue>),
    Map(Vec<(CqlValue, CqlValue)>),
}

impl Collection {
    pub fn list<T: IntoCqlValue>(items: impl IntoIterator<Item = T>) -> Self {
        Collection::List(items.into_iter().map(IntoCqlValue::into_cql).collect())
    }

    pub fn set<T: IntoCqlValue>(items: impl IntoIterator<Item = T>) -> Self {
        Collection::Set(items.into_iter().map(IntoCqlValue::into_cql).collect())
    }

    pub fn map<K: IntoCqlValue, V: IntoCqlValue>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Collection::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into_cql(), v.into_cql()))
                .collect(),
        )
    }

    fn kind(&self) -> &'static str {
        match self {
            Collection::List(_) => "list",
            Collection::Set(_) => "set",
            Collection::Map(_) => "map",
        }
    }
}

/// Tagged description of what a mutation does to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// Write the value as-is
    Plain(CqlValue),
    /// Counter delta; negative values decrement
    Counter(i64),
    /// Add elements to a list (at the end), set or map
    Append(Collection),
    /// Add elements to the front of a list
    Prepend(Collection),
    /// Remove elements from a list or set, or keys from a map
    Remove(Collection),
    /// Overwrite the whole collection
    Replace(Collection),
}

impl ColumnValue {
    pub fn plain(value: impl IntoCqlValue) -> Self {
        ColumnValue::Plain(value.into_cql())
    }

    fn tag(&self) -> &'static str {
        match self {
            ColumnValue::Plain(_) => "plain",
            ColumnValue::Counter(_) => "counter",
            ColumnValue::Append(_) => "append",
            ColumnValue::Prepend(_) => "prepend",
            ColumnValue::Remove(_) => "remove",
            ColumnValue::Replace(_) => "replace",
        }
    }
}

impl<T: IntoCqlValue> From<T> for ColumnValue {
    fn from(value: T) -> Self {
        ColumnValue::Plain(value.into_cql())
    }
}

impl From<Collection> for ColumnValue {
    fn from(value: Collection) -> Self {
        ColumnValue::Replace(value)
    }
}

/// Where the encoded fragment will be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeTarget {
    /// Entry of an `INSERT ... VALUES (...)` list
    Values,
    /// Entry of an `UPDATE ... SET` clause
    Assignment,
}

/// One encoded column: the fragment and the values for its placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub fragment: String,
    pub values: SmallVec<[CqlValue; 2]>,
}

impl Encoded {
    fn new(fragment: String, values: SmallVec<[CqlValue; 2]>) -> Self {
        Self { fragment, values }
    }
}

/// Encodes one column for the given statement position.
///
/// `column` is written into the fragment, so it must be a valid identifier.
pub fn encode(column: &str, value: &ColumnValue, target: EncodeTarget) -> CqxResult<Encoded> {
    if validate_identifier(column, "encode").is_err() {
        return Err(encoding_error(column, "not a valid identifier".to_string()));
    }
    match (target, value) {
        (EncodeTarget::Values, ColumnValue::Plain(v)) => {
            Ok(Encoded::new("?".to_string(), smallvec::smallvec![v.clone()]))
        }
        (EncodeTarget::Values, ColumnValue::Replace(collection)) => {
            let (literal, values) = literal(collection);
            Ok(Encoded::new(literal, values))
        }
        (EncodeTarget::Values, other) => Err(encoding_error(
            column,
            format!("{} operation is only valid in an update assignment", other.tag()),
        )),

        (EncodeTarget::Assignment, ColumnValue::Plain(v)) => Ok(Encoded::new(
            format!("{column} = ?"),
            smallvec::smallvec![v.clone()],
        )),
        (EncodeTarget::Assignment, ColumnValue::Counter(delta)) => {
            let sign = if *delta < 0 { '-' } else { '+' };
            // i64::MIN has no positive counterpart; saturate the magnitude
            let magnitude = delta.checked_abs().unwrap_or(i64::MAX);
            Ok(Encoded::new(
                format!("{column} = {column} {sign} ?"),
                smallvec::smallvec![CqlValue::Counter(magnitude)],
            ))
        }
        (EncodeTarget::Assignment, ColumnValue::Replace(collection)) => {
            let (literal, values) = literal(collection);
            Ok(Encoded::new(format!("{column} = {literal}"), values))
        }
        (EncodeTarget::Assignment, ColumnValue::Append(collection)) => {
            let (literal, values) = literal(collection);
            Ok(Encoded::new(format!("{column} = {column} + {literal}"), values))
        }
        (EncodeTarget::Assignment, ColumnValue::Prepend(collection)) => match collection {
            Collection::List(_) => {
                let (literal, values) = literal(collection);
                Ok(Encoded::new(format!("{column} = {literal} + {column}"), values))
            }
            other => Err(encoding_error(
                column,
                format!("prepend requires a list, got {}", other.kind()),
            )),
        },
        (EncodeTarget::Assignment, ColumnValue::Remove(collection)) => {
            let (literal, values) = match collection {
                // map removal subtracts a set of keys
                Collection::Map(entries) => literal(&Collection::Set(
                    entries.iter().map(|(k, _)| k.clone()).collect(),
                )),
                _ => literal(collection),
            };
            Ok(Encoded::new(format!("{column} = {column} - {literal}"), values))
        }
    }
}

/// Collection literal with one placeholder per element (two per map entry).
fn literal(collection: &Collection) -> (String, SmallVec<[CqlValue; 2]>) {
    match collection {
        Collection::List(items) => (
            format!("[{}]", placeholders(items.len(), "?")),
            items.iter().cloned().collect(),
        ),
        Collection::Set(items) => (
            format!("{{{}}}", placeholders(items.len(), "?")),
            items.iter().cloned().collect(),
        ),
        Collection::Map(entries) => (
            format!("{{{}}}", placeholders(entries.len(), "?: ?")),
            entries
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect(),
        ),
    }
}

fn placeholders(count: usize, unit: &str) -> String {
    vec![unit; count].join(", ")
}

fn encoding_error(column: &str, message: String) -> CqxError {
    CqxError::Encoding {
        column: column.to_string(),
        message,
    }
}
