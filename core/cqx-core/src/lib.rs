//! # CQX — Column-Store Write Path
//!
//! CQX는 컬럼 스토어 클라이언트의 쓰기 경로입니다. 행 변경을 파라미터화된 CQL 문장으로
//! 만들고, 여러 변경을 하나의 배치로 묶어 한 번의 네트워크 호출로 보내며,
//! prepared statement 핸들을 키스페이스 단위로 캐시합니다.
//!
//! ## 주요 특징
//!
//! - **안전한 문장 생성**: 모든 값은 `?` 플레이스홀더와 위치 바인드 값으로 전달
//! - **명시적 인코딩**: 카운터, 컬렉션 append/prepend/remove/replace를 태그로 구분
//! - **배치**: logged/unlogged, 자동 flush 임계값, 완료 콜백, 단일 consistency 강제
//! - **Prepared Statement 캐시**: 텍스트 키 기반, 동시 접근 안전
//!
//! ## 빠른 시작
//!
//! ```rust
//! use cqx_core::{Collection, Keyspace, KeyspaceConfig, UpsertOptions, Writer};
//! use cqx_core::transport::RecordingTransport;
//! use std::sync::Arc;
//!
//! # fn main() -> cqx_core::CqxResult<()> {
//! let transport = Arc::new(RecordingTransport::new());
//! let keyspace = Keyspace::new(transport.clone(), KeyspaceConfig::new().with_name("blog"));
//! let posts = keyspace.table("posts");
//!
//! // 바로 실행
//! posts
//!     .inserter()
//!     .column("id", 1)
//!     .column("tags", Collection::set(["rust"]))
//!     .execute(UpsertOptions::new().with_ttl(3600))?;
//!
//! // 컬렉션 갱신
//! posts
//!     .updater()
//!     .append("tags", Collection::set(["cql"]))
//!     .filter("id", 1)
//!     .execute(UpsertOptions::new())?;
//!
//! assert_eq!(transport.executions().len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## 실행 흐름
//!
//! ```text
//! Writer → encoder → Statement ─┬─▶ Keyspace::execute_with_options → Transport
//!                               └─▶ Batch::execute ─ apply ─▶ Transport (1개: 단일, 2개 이상: 배치)
//! ```
//!
//! ## 모듈 구조
//!
//! - [`statement`] — CQL 텍스트 + 바인드 값
//! - [`encoder`] — 컬럼 값 인코딩
//! - [`writer`] — [`Inserter`], [`Updater`], [`Deleter`]
//! - [`batch`] — [`Batch`]
//! - [`prepared`] — [`PreparedStatementCache`]
//! - [`keyspace`] — [`Keyspace`]
//! - [`transport`] — 네트워크 계층 추상화와 테스트용 기록 구현

pub mod batch;
pub mod config;
pub mod consistency;
pub mod encoder;
pub mod error;
pub mod keyspace;
pub mod options;
pub mod prepared;
pub mod statement;
pub mod transport;
pub mod value;
pub mod writer;

// Logging utilities
pub mod logging;

// Re-export commonly used types
pub use batch::Batch;
pub use config::KeyspaceConfig;
pub use consistency::Consistency;
pub use encoder::{Collection, ColumnValue};
pub use error::{CqxError, CqxResult};
pub use keyspace::Keyspace;
pub use options::{BatchOptions, UpsertOptions, WriteOptions};
pub use prepared::PreparedStatementCache;
pub use statement::Statement;
pub use value::{CqlValue, IntoCqlValue};
pub use writer::{Deleter, Inserter, Table, Updater, Writer};
