//! Keyspace configuration
//!
//! 기본값 → JSON 파일 → 환경 변수 순서로 덮어씁니다.
//!
//! # Environment Variables
//! - `CQX_KEYSPACE` - keyspace name
//! - `CQX_CONSISTENCY` - default consistency (`quorum`, `LOCAL_ONE`, ...)
//! - `CQX_PREPARED` - `true`/`1` to prepare statements by default

use crate::consistency::Consistency;
use crate::error::{CqxError, CqxResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const ENV_KEYSPACE: &str = "CQX_KEYSPACE";
pub const ENV_CONSISTENCY: &str = "CQX_CONSISTENCY";
pub const ENV_PREPARED: &str = "CQX_PREPARED";

/// Settings shared by every writer and batch of one keyspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct KeyspaceConfig {
    /// Keyspace name, used to qualify table names
    pub name: Option<String>,
    /// Consistency used when neither the write nor the batch names one
    pub default_consistency: Consistency,
    /// Whether statements go through prepared handles by default
    pub prepared: bool,
}

impl Default for KeyspaceConfig {
    fn default() -> Self {
        Self {
            name: None,
            default_consistency: Consistency::Quorum,
            prepared: false,
        }
    }
}

impl KeyspaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_default_consistency(mut self, consistency: Consistency) -> Self {
        self.default_consistency = consistency;
        self
    }

    pub fn with_prepared(mut self, prepared: bool) -> Self {
        self.prepared = prepared;
        self
    }

    /// 알 수 없는 필드는 거부
    pub fn from_json(json: &str) -> CqxResult<Self> {
        serde_json::from_str(json).map_err(|e| CqxError::Config(e.to_string()))
    }

    /// 파일에서 로드
    pub fn load_from_file(path: &Path) -> CqxResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// 파일에 저장
    pub fn save_to_file(&self, path: &Path) -> CqxResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }

    /// 환경 변수로 덮어쓰기
    pub fn apply_env(self) -> CqxResult<Self> {
        self.apply_vars(|key| env::var(key).ok())
    }

    fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> CqxResult<Self> {
        if let Some(name) = lookup(ENV_KEYSPACE) {
            self.name = Some(name);
        }
        if let Some(level) = lookup(ENV_CONSISTENCY) {
            self.default_consistency = level
                .parse()
                .map_err(|_| CqxError::Config(format!("{ENV_CONSISTENCY}: unknown level '{level}'")))?;
        }
        if let Some(value) = lookup(ENV_PREPARED) {
            self.prepared = value.to_lowercase() == "true" || value == "1";
        }
        Ok(self)
    }

    /// Qualifies `table` with the keyspace name when one is configured
    pub fn qualify(&self, table: &str) -> String {
        match &self.name {
            Some(keyspace) if !table.contains('.') => format!("{keyspace}.{table}"),
            _ => table.to_string(),
        }
    }
}
