//! Bind values
//!
//! 쿼리 placeholder(`?`)에 위치 기반으로 바인딩되는 CQL 값.
//! 스키마 검증은 하지 않으며, 호출자가 이미 타입이 정해진 값을 넘긴다고 가정합니다.

use std::time::{SystemTime, UNIX_EPOCH};

/// Positional bind value
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    Null,
    Boolean(bool),
    /// 32-bit `int`
    Int(i32),
    /// 64-bit `bigint`
    BigInt(i64),
    /// `counter` delta magnitude
    Counter(i64),
    Double(f64),
    Text(String),
    Blob(Vec<u8>),
    /// Microseconds since the Unix epoch
    Timestamp(i64),
    Uuid([u8; 16]),
    List(Vec<CqlValue>),
    Set(Vec<CqlValue>),
    Map(Vec<(CqlValue, CqlValue)>),
}

impl CqlValue {
    /// CQL 타입 이름 (에러 메시지용)
    pub fn type_name(&self) -> &'static str {
        match self {
            CqlValue::Null => "null",
            CqlValue::Boolean(_) => "boolean",
            CqlValue::Int(_) => "int",
            CqlValue::BigInt(_) => "bigint",
            CqlValue::Counter(_) => "counter",
            CqlValue::Double(_) => "double",
            CqlValue::Text(_) => "text",
            CqlValue::Blob(_) => "blob",
            CqlValue::Timestamp(_) => "timestamp",
            CqlValue::Uuid(_) => "uuid",
            CqlValue::List(_) => "list",
            CqlValue::Set(_) => "set",
            CqlValue::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }
}

/// Converts a wall-clock instant to microseconds since the epoch.
///
/// Instants before the epoch come out negative, as the wire format expects.
/// Values outside the `i64` range saturate.
pub fn micros_since_epoch(instant: SystemTime) -> i64 {
    match instant.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_micros()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_micros())
            .unwrap_or(i64::MAX)
            .saturating_neg(),
    }
}

/// 바인드 값 변환 트레이트
pub trait IntoCqlValue {
    fn into_cql(self) -> CqlValue;
}

impl IntoCqlValue for CqlValue {
    fn into_cql(self) -> CqlValue {
        self
    }
}

impl IntoCqlValue for bool {
    fn into_cql(self) -> CqlValue {
        CqlValue::Boolean(self)
    }
}

impl IntoCqlValue for i32 {
    fn into_cql(self) -> CqlValue {
        CqlValue::Int(self)
    }
}

impl IntoCqlValue for i64 {
    fn into_cql(self) -> CqlValue {
        CqlValue::BigInt(self)
    }
}

impl IntoCqlValue for f64 {
    fn into_cql(self) -> CqlValue {
        CqlValue::Double(self)
    }
}

impl IntoCqlValue for String {
    fn into_cql(self) -> CqlValue {
        CqlValue::Text(self)
    }
}

impl IntoCqlValue for &str {
    fn into_cql(self) -> CqlValue {
        CqlValue::Text(self.to_string())
    }
}

impl IntoCqlValue for Vec<u8> {
    fn into_cql(self) -> CqlValue {
        CqlValue::Blob(self)
    }
}

impl IntoCqlValue for SystemTime {
    fn into_cql(self) -> CqlValue {
        CqlValue::Timestamp(micros_since_epoch(self))
    }
}

impl<T: IntoCqlValue> IntoCqlValue for Option<T> {
    fn into_cql(self) -> CqlValue {
        match self {
            Some(value) => value.into_cql(),
            None => CqlValue::Null,
        }
    }
}
