//! Option sets for batches and writes
//!
//! 키워드 옵션 해시 대신 고정된 구조체를 사용합니다. JSON 등 외부 입력에서 만들 때는
//! `from_json`이 알 수 없는 필드를 거부합니다.

use crate::consistency::Consistency;
use crate::error::{CqxError, CqxResult};
use crate::value::{CqlValue, micros_since_epoch};
use serde::{Deserialize, Deserializer};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Largest TTL the server accepts (20 years)
pub const MAX_TTL_SECONDS: u32 = 630_720_000;

/// Options for opening a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchOptions {
    /// Flush automatically once this many statements are queued
    #[serde(default)]
    pub auto_apply: Option<usize>,
    /// Skip the batch log: no atomicity, better throughput
    #[serde(default)]
    pub unlogged: bool,
    /// Consistency for the whole batch (keyspace default when absent)
    #[serde(default)]
    pub consistency: Option<Consistency>,
    /// Send statements through prepared handles (keyspace default when absent)
    #[serde(default)]
    pub prepared: Option<bool>,
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_apply(mut self, threshold: usize) -> Self {
        self.auto_apply = Some(threshold);
        self
    }

    pub fn with_unlogged(mut self, unlogged: bool) -> Self {
        self.unlogged = unlogged;
        self
    }

    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    pub fn with_prepared(mut self, prepared: bool) -> Self {
        self.prepared = Some(prepared);
        self
    }

    /// Parses and validates; unknown fields are rejected
    pub fn from_json(json: &str) -> CqxResult<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| CqxError::InvalidOption(format!("batch options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> CqxResult<()> {
        if self.auto_apply == Some(0) {
            return Err(CqxError::InvalidOption(
                "auto_apply must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options for one write (insert, update or delete)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpsertOptions {
    /// Time-to-live in seconds
    #[serde(default)]
    pub ttl: Option<u32>,
    /// Write timestamp; JSON input gives microseconds since the epoch
    #[serde(default, deserialize_with = "deserialize_micros")]
    pub timestamp: Option<SystemTime>,
    /// Must match the enclosing batch's consistency when batched
    #[serde(default)]
    pub consistency: Option<Consistency>,
    #[serde(default)]
    pub prepared: Option<bool>,
}

impl UpsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, seconds: u32) -> Self {
        self.ttl = Some(seconds);
        self
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    pub fn with_prepared(mut self, prepared: bool) -> Self {
        self.prepared = Some(prepared);
        self
    }

    /// Parses and validates; unknown fields are rejected
    pub fn from_json(json: &str) -> CqxResult<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| CqxError::InvalidOption(format!("upsert options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> CqxResult<()> {
        if let Some(ttl) = self.ttl
            && ttl > MAX_TTL_SECONDS
        {
            return Err(CqxError::InvalidOption(format!(
                "ttl {ttl} exceeds the maximum of {MAX_TTL_SECONDS} seconds"
            )));
        }
        Ok(())
    }

    /// `USING` clause and its bind values, timestamp first.
    ///
    /// Returns an empty clause when neither TTL nor timestamp is set.
    pub fn using_clause(&self) -> (String, Vec<CqlValue>) {
        let mut parts = Vec::with_capacity(2);
        let mut values = Vec::with_capacity(2);
        if let Some(timestamp) = self.timestamp {
            parts.push("TIMESTAMP ?");
            values.push(CqlValue::BigInt(micros_since_epoch(timestamp)));
        }
        if let Some(ttl) = self.ttl {
            parts.push("TTL ?");
            // validated against MAX_TTL_SECONDS, which fits in an int
            values.push(CqlValue::Int(ttl as i32));
        }
        if parts.is_empty() {
            return (String::new(), values);
        }
        (format!(" USING {}", parts.join(" AND ")), values)
    }

    pub(crate) fn write_options(&self) -> WriteOptions {
        WriteOptions {
            consistency: self.consistency,
            prepared: self.prepared,
        }
    }
}

/// Per-statement execution options after writer-level resolution.
///
/// `None` fields inherit from the batch or keyspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub consistency: Option<Consistency>,
    pub prepared: Option<bool>,
}

fn deserialize_micros<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let micros = Option::<i64>::deserialize(deserializer)?;
    Ok(micros.map(|m| {
        if m >= 0 {
            UNIX_EPOCH + Duration::from_micros(m as u64)
        } else {
            UNIX_EPOCH - Duration::from_micros(m.unsigned_abs())
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_options_from_json() {
        let options =
            BatchOptions::from_json(r#"{"auto_apply": 10, "unlogged": true, "consistency": "one"}"#)
                .unwrap();
        assert_eq!(options.auto_apply, Some(10));
        assert!(options.unlogged);
        assert_eq!(options.consistency, Some(Consistency::One));
        assert_eq!(options.prepared, None);
    }

    #[test]
    fn test_batch_options_reject_unknown_fields() {
        let err = BatchOptions::from_json(r#"{"auto_flush": 10}"#).unwrap_err();
        assert!(matches!(err, CqxError::InvalidOption(_)));
    }

    #[test]
    fn test_batch_options_reject_zero_auto_apply() {
        assert!(BatchOptions::from_json(r#"{"auto_apply": 0}"#).is_err());
        assert!(BatchOptions::new().with_auto_apply(0).validate().is_err());
    }

    #[test]
    fn test_upsert_options_reject_unknown_fields() {
        let err = UpsertOptions::from_json(r#"{"ttl": 5, "if_not_exists": true}"#).unwrap_err();
        assert!(err.to_string().contains("if_not_exists"));
    }

    #[test]
    fn test_upsert_options_timestamp_from_micros() {
        let options = UpsertOptions::from_json(r#"{"timestamp": 1500000}"#).unwrap();
        assert_eq!(
            options.timestamp,
            Some(UNIX_EPOCH + Duration::from_micros(1_500_000))
        );
    }

    #[test]
    fn test_upsert_options_reject_oversized_ttl() {
        let err = UpsertOptions::new()
            .with_ttl(MAX_TTL_SECONDS + 1)
            .validate()
            .unwrap_err();
        assert!(matches!(err, CqxError::InvalidOption(_)));
    }

    #[test]
    fn test_using_clause_empty() {
        let (clause, values) = UpsertOptions::new().using_clause();
        assert!(clause.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn test_using_clause_timestamp_before_ttl() {
        let options = UpsertOptions::new()
            .with_ttl(60)
            .with_timestamp(UNIX_EPOCH + Duration::from_secs(2));
        let (clause, values) = options.using_clause();
        assert_eq!(clause, " USING TIMESTAMP ? AND TTL ?");
        assert_eq!(values, vec![CqlValue::BigInt(2_000_000), CqlValue::Int(60)]);
    }

    #[test]
    fn test_using_clause_ttl_only() {
        let (clause, values) = UpsertOptions::new().with_ttl(30).using_clause();
        assert_eq!(clause, " USING TTL ?");
        assert_eq!(values, vec![CqlValue::Int(30)]);
    }
}
