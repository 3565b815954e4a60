//! Query text plus positional bind values
//!
//! Fragments are appended left to right; bind values follow the same order.
//! The placeholder/bind-value agreement is kept by the writers that build
//! statements, not checked here.

use crate::error::{CqxError, CqxResult};
use crate::value::CqlValue;

/// Append-only accumulator of CQL text and bind values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    cql: String,
    bound_values: Vec<CqlValue>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statement from finished text and values
    pub fn with_values(cql: impl Into<String>, bound_values: Vec<CqlValue>) -> Self {
        Self {
            cql: cql.into(),
            bound_values,
        }
    }

    /// Concatenates `fragment` and appends `values` in order.
    pub fn append<I>(&mut self, fragment: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = CqlValue>,
    {
        self.cql.push_str(fragment);
        self.bound_values.extend(values);
        self
    }

    /// Inserts values at the front of the bind sequence, keeping their order.
    pub(crate) fn prepend_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = CqlValue>,
    {
        let tail = std::mem::take(&mut self.bound_values);
        self.bound_values.extend(values);
        self.bound_values.extend(tail);
    }

    pub fn cql(&self) -> &str {
        &self.cql
    }

    pub fn bound_values(&self) -> &[CqlValue] {
        &self.bound_values
    }

    pub fn into_parts(self) -> (String, Vec<CqlValue>) {
        (self.cql, self.bound_values)
    }

    /// Number of `?` placeholders outside single-quoted literals.
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.cql)
    }
}

/// `?` 개수 (작은따옴표 리터럴과 큰따옴표 식별자 내부 제외, 이중 따옴표 이스케이프 처리)
pub fn count_placeholders(cql: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut count = 0;
    for ch in cql.chars() {
        match (quote, ch) {
            // an escaped quote closes and reopens, leaving the state unchanged
            (None, '\'' | '"') => quote = Some(ch),
            (Some(open), _) if ch == open => quote = None,
            (None, '?') => count += 1,
            _ => {}
        }
    }
    count
}

/// Checks that `name` can be written into query text as-is.
///
/// Accepts an unquoted identifier (`[A-Za-z_][A-Za-z0-9_]*`) or a double-quoted
/// one whose inner quotes are doubled (`"Post ""Title"""`).
pub fn validate_identifier(name: &str, context: &str) -> CqxResult<()> {
    if is_unquoted_identifier(name) || is_quoted_identifier(name) {
        return Ok(());
    }
    Err(CqxError::InvalidOperation {
        message: format!("invalid identifier '{name}'"),
        context: context.to_string(),
    })
}

fn is_unquoted_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_quoted_identifier(name: &str) -> bool {
    let Some(inner) = name
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return false;
    };
    !inner.is_empty() && inner.replace("\"\"", "").chars().all(|c| c != '"')
}
